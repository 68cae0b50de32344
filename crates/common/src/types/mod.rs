use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    pub status: String,
    pub timestamp: String,
}

impl Health {
    pub fn healthy() -> Self {
        Self { status: "healthy".to_string(), timestamp: chrono::Utc::now().to_rfc3339() }
    }
}

/// Plain acknowledgement body, e.g. `{"message": "logged out successfully"}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
