//! Pipeline error types

use std::time::Duration;

use chess_core::GameError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Configuration error: {0}")]
    Config(&'static str),

    #[error("Oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("Oracle did not answer within {0:?}")]
    OracleTimeout(Duration),

    #[error("Malformed oracle reply: {0}")]
    MalformedReply(String),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error("Analysis cancelled before completion")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
