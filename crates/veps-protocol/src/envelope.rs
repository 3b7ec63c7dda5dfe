use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Standard envelope for every VEPS response.
///
/// `timestamp` is always present (ISO-8601 UTC); the remaining optional
/// fields are omitted from the wire form when unset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl Envelope {
    /// A success envelope with a human-readable message.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            event_id: None,
            data: None,
            error: None,
            timestamp: Utc::now(),
            duration: None,
        }
    }

    /// A failure envelope with an error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            event_id: None,
            data: None,
            error: Some(error.into()),
            timestamp: Utc::now(),
            duration: None,
        }
    }

    pub fn with_event_id(mut self, event_id: impl ToString) -> Self {
        self.event_id = Some(event_id.to_string());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_duration(mut self, duration: std::time::Duration) -> Self {
        self.duration = Some(format!("{duration:?}"));
        self
    }
}
