use crate::services::logging::Logger;

/// Navigate the browser to `url`, replacing the current page.
pub fn navigate_to(url: &str) {
    if let Some(window) = web_sys::window() {
        if window.location().set_href(url).is_err() {
            Logger::error_with_component("navigation", &format!("Failed to navigate to {}", url));
        }
    }
}
