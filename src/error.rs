use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("computation failed: {0}")]
    Computation(String),
}

impl PredictorError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}
