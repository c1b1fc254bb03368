use thiserror::Error;

use crate::core::config::ConfigError;
use crate::engine::PricingError;
use crate::quote::QuoteError;
use crate::schema::FamilyFileError;

#[derive(Error, Debug)]
pub enum QuoteAppError {
    #[error("Product family error: {0}")]
    Family(#[from] FamilyFileError),

    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    #[error("Quote error: {0}")]
    Quote(#[from] QuoteError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, QuoteAppError>;
