//! Error types

use thiserror::Error;

/// Errors raised while wiring page behavior
#[derive(Error, Debug)]
pub enum Error {
    #[error("Trusted types policy error: {0}")]
    TrustPolicy(String),

    #[error("DOM operation failed: {0}")]
    Dom(String),

    #[error("Invalid page configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
