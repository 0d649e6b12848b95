use thiserror::Error;

#[derive(Debug, Error)]
pub enum CardMixError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Data source unavailable: {message} (hint: {hint})")]
    DataSource { message: String, hint: String },

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CardMixError {
    /// Connectivity failure against the warehouse, with the standard
    /// remediation hint shown to the user.
    pub fn data_source(message: impl Into<String>) -> Self {
        CardMixError::DataSource {
            message: message.into(),
            hint: "check warehouse credentials and network access, then reload".into(),
        }
    }
}

impl From<serde_json::Error> for CardMixError {
    fn from(e: serde_json::Error) -> Self {
        CardMixError::SerializationError(e.to_string())
    }
}
