use serde::{Deserialize, Serialize};

/// Action names the web page and console front end emit. The wire
/// format treats actions as an open set; these are the recognized ones.
pub mod actions {
    pub const OPEN: &str = "open";
    pub const PREVIOUS: &str = "previous";
    pub const PLAY: &str = "play";
    pub const PAUSE: &str = "pause";
    pub const NEXT: &str = "next";
    pub const VOLUME_DOWN: &str = "volumeDown";
    pub const VOLUME_UP: &str = "volumeUp";
    pub const VOLUME: &str = "volume";
}

/// A single user intent sent to the server as one JSON text frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub action: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
}

impl Command {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            value: String::new(),
        }
    }

    pub fn with_value(action: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            value: value.into(),
        }
    }
}

/// Server reply frame. The client interprets only `error`; any other
/// shape decodes with both fields empty and is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServerResponse {
    pub fn status(message: impl Into<String>) -> Self {
        Self {
            status: Some(message.into()),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: None,
            error: Some(message.into()),
        }
    }
}
