//! Session construction options.

use serde::{Deserialize, Serialize};

/// Options for creating a session.
///
/// Field names follow the script-facing JSON shape, so the same object a
/// binding receives can be deserialized directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOptions {
    /// Connection target.
    pub url: String,
    /// Optional human label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Wallclock update cadence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallclock_update_period_millis: Option<u32>,
}

impl SessionOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: None,
            wallclock_update_period_millis: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_wallclock_update_period_millis(mut self, millis: u32) -> Self {
        self.wallclock_update_period_millis = Some(millis);
        self
    }

    /// Parse options from JSON; `url` is required.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
