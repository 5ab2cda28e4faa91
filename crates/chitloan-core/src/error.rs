use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChitLoanError {
    #[error("Invalid input: {field} — {reason}")]
    Validation { field: String, reason: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: u64 },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ChitLoanError {
    pub(crate) fn validation(field: &str, reason: impl Into<String>) -> Self {
        ChitLoanError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ChitLoanError {
    fn from(e: serde_json::Error) -> Self {
        ChitLoanError::SerializationError(e.to_string())
    }
}
