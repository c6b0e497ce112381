use thiserror::Error;

use crate::network::NetworkError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
    #[error("runtime error: {0}")]
    Runtime(String),
    #[error("failed to set up translator: {0}")]
    Translator(#[from] NetworkError),
}
