pub mod config;
pub mod error;

pub use config::{ConfigError, EngineConfig};
pub use error::{QuoteAppError, Result};
