use gloo::net::http::Request;
use shared::AvailabilityPayload;

/// Client for the availability submission endpoint.
#[derive(Clone)]
pub struct ApiClient {
    submit_url: String,
}

impl ApiClient {
    pub fn new(submit_url: String) -> Self {
        Self { submit_url }
    }

    /// POST the payload as JSON. On success returns the response's final URL
    /// (after any server redirect) so the caller can navigate there; any
    /// other status or a network failure is an error and leaves page state
    /// untouched so the user can resubmit.
    pub async fn submit_availability(
        &self,
        payload: &AvailabilityPayload,
    ) -> Result<String, String> {
        match Request::post(&self.submit_url)
            .json(payload)
            .map_err(|e| format!("Failed to serialize request: {}", e))?
            .send()
            .await
        {
            Ok(response) => {
                if response.ok() {
                    Ok(response.url())
                } else {
                    Err(format!(
                        "Submission failed with status {}",
                        response.status()
                    ))
                }
            }
            Err(e) => Err(format!("Network error: {}", e)),
        }
    }
}
