use crate::core_types::AgentId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReplanError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Data Validation Error: {0}")]
    Validation(String),

    #[error("Evaluation failed for agent {agent}: {message}")]
    Evaluation { agent: AgentId, message: String },
}

impl ReplanError {
    pub fn config(msg: impl Into<String>) -> Self {
        ReplanError::Config(msg.into())
    }

    pub fn is_config(&self) -> bool {
        matches!(self, ReplanError::Config(_))
    }
}

impl From<strum::ParseError> for ReplanError {
    fn from(e: strum::ParseError) -> Self {
        ReplanError::Config(e.to_string())
    }
}

pub type RpResult<T> = Result<T, ReplanError>;
