use crate::environment::TransportError;

/// Every way a transit query can fail.
///
/// The `Display` text is what the assistant sees in the `error` payload.
#[derive(Debug, thiserror::Error)]
pub enum TransitError {
    #[error("Google Routes API key not configured")]
    MissingApiKey,

    #[error("Origin location (latitude/longitude) not configured")]
    MissingOrigin,

    #[error("Routes API error: {status}")]
    Api { status: u16 },

    #[error("Error getting route: {0}")]
    Transport(#[from] TransportError),

    #[error("Error getting route: {0}")]
    MalformedResponse(String),

    #[error("Error getting route: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TransitError {
    /// Operator setup problems, as opposed to runtime failures.
    pub fn is_config(&self) -> bool {
        matches!(self, TransitError::MissingApiKey | TransitError::MissingOrigin)
    }

    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.to_string() })
    }
}

pub type Result<T> = std::result::Result<T, TransitError>;
