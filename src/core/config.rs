//! Engine configuration with documented constants
//!
//! Rates and BOM conventions shared by every quote. Loaded from TOML; any
//! key left out keeps its default.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::bom::BomVocabulary;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for the pricing engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === MONEY ===
    /// VAT rate as a fraction
    ///
    /// 0.20 is the Austrian standard rate the price sheets are written for.
    pub tax_rate: f64,

    /// Hourly labor rate per worker
    ///
    /// Seeds [`Adjustments::labor_rate`](crate::quote::Adjustments::labor_rate);
    /// individual quotes may override it.
    pub labor_rate: f64,

    /// Workers on site when a quote does not say otherwise
    pub workers: u32,

    // === ITEMS ===
    /// Quantity of a newly added line item
    pub default_quantity: f64,

    // === BOM ===
    /// Variable names that trigger the built-in material rules
    pub bom: BomVocabulary,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tax_rate: 0.20,
            labor_rate: 65.0,
            workers: 1,
            default_quantity: 1.0,
            bom: BomVocabulary::default(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.tax_rate) {
            return Err(ConfigError::Invalid(format!(
                "tax_rate ({}) must be a fraction between 0 and 1",
                self.tax_rate
            )));
        }

        if !(self.labor_rate > 0.0 && self.labor_rate.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "labor_rate ({}) must be positive",
                self.labor_rate
            )));
        }

        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }

        if !(self.default_quantity >= 0.0 && self.default_quantity.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "default_quantity ({}) must not be negative",
                self.default_quantity
            )));
        }

        // BOM fallbacks feed divisions and multiplications
        if self.bom.default_riser_height <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "bom.default_riser_height ({}) must be positive",
                self.bom.default_riser_height
            )));
        }
        if self.bom.default_bags_per_post < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "bom.default_bags_per_post ({}) must not be negative",
                self.bom.default_bags_per_post
            )));
        }

        Ok(())
    }
}
