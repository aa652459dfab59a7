use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use wasm_bindgen::JsValue;
use web_sys::window;

use shared::{DayMarkers, ExistingAvailability};

use crate::services::date_utils;
use crate::services::logging::Logger;

/// Which grid the page hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridVariant {
    Month,
    Week,
}

/// Static page settings injected by the server as `window.pageConfig`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageConfig {
    /// Member the submission is recorded for.
    pub name: String,
    /// Submission endpoint.
    pub action: String,
    /// Where race-marked cells navigate to.
    pub races_url: String,
    /// `"month"` or `"week"`.
    pub view: String,
    /// Selectable week starts (`DD/MM/YYYY`), week view only.
    pub week_starts: Vec<String>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            action: "/availability".to_string(),
            races_url: "/races".to_string(),
            view: "month".to_string(),
            week_starts: Vec::new(),
        }
    }
}

/// Server data injected into the page at load time. Every global is
/// optional: anything missing or malformed falls back to its default, so a
/// bare page still renders an all-available grid.
#[derive(Debug, Clone, PartialEq)]
pub struct PageBootstrap {
    pub config: PageConfig,
    pub existing: ExistingAvailability,
    pub markers: DayMarkers,
    pub notes: BTreeMap<String, String>,
}

impl PageBootstrap {
    pub fn load() -> Self {
        let existing = match read_global::<ExistingAvailability>("existingData") {
            Some(existing) => existing,
            None => {
                Logger::warn_with_component(
                    "bootstrap",
                    "No saved availability found, defaulting to available",
                );
                ExistingAvailability::default()
            }
        };
        let race_days = read_global::<BTreeMap<String, String>>("raceDays").unwrap_or_default();
        let event_days = read_global::<BTreeMap<String, String>>("eventDays").unwrap_or_default();
        let notes = read_global::<BTreeMap<String, String>>("userNotes").unwrap_or_default();
        let config = read_global::<PageConfig>("pageConfig").unwrap_or_default();

        Self {
            config,
            existing,
            markers: DayMarkers {
                race_days,
                event_days,
            },
            notes,
        }
    }

    pub fn variant(&self) -> GridVariant {
        if self.config.view == "week" {
            GridVariant::Week
        } else {
            GridVariant::Month
        }
    }

    /// First parseable entry of the configured week starts.
    pub fn initial_week_start(&self) -> Option<NaiveDate> {
        self.config
            .week_starts
            .iter()
            .find_map(|value| date_utils::parse_week_start(value))
    }
}

/// Reads a JSON-shaped global off `window`. Missing and malformed values
/// both come back as `None`; malformed ones are logged first.
fn read_global<T: DeserializeOwned>(name: &str) -> Option<T> {
    match try_read_global(name) {
        Ok(value) => value,
        Err(error) => {
            Logger::warn_with_component(
                "bootstrap",
                &format!("Ignoring malformed page data `{}`: {:#}", name, error),
            );
            None
        }
    }
}

fn try_read_global<T: DeserializeOwned>(name: &str) -> anyhow::Result<Option<T>> {
    let window = window().expect("should have window");
    let value = js_sys::Reflect::get(&window, &JsValue::from_str(name))
        .map_err(|_| anyhow!("window.{} is not accessible", name))?;
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    let json = js_sys::JSON::stringify(&value)
        .map_err(|_| anyhow!("window.{} cannot be serialized", name))?;
    let json = String::from(json);
    let parsed = serde_json::from_str(&json)
        .with_context(|| format!("window.{} has an unexpected shape", name))?;
    Ok(Some(parsed))
}
