use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum TimerError {
    #[error("invalid operation name: {0}")]
    InvalidOperationName(String),

    #[error("failed to write report: {0}")]
    Io(String),
}

impl From<std::io::Error> for TimerError {
    fn from(err: std::io::Error) -> Self {
        TimerError::Io(err.to_string())
    }
}
