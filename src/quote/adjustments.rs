//! Global adjustment parameters of a quote

use serde::{Deserialize, Serialize};

use crate::core::config::EngineConfig;

/// Quote-wide parameters folded in by [`aggregate`](super::aggregate)
///
/// Percentages are plain numbers (`10.0` = 10 %); `tax_rate` is a fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Adjustments {
    pub labor_hours: f64,
    /// Hourly rate per worker
    pub labor_rate: f64,
    pub workers: u32,
    /// Flat crane / equipment fee
    pub equipment_fee: f64,
    /// Risk surcharge on the marked-up subtotal
    pub surcharge_percent: f64,
    /// When false the surcharge is folded into the labor line
    pub surcharge_visible: bool,
    /// Hidden markup on every unit price and flat cost
    pub markup_percent: f64,
    /// Visible discount, itemized as a negative line
    pub discount_percent: f64,
    /// Informational only, never subtracted from the gross total
    pub early_payment_percent: f64,
    pub tax_rate: f64,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl Adjustments {
    /// Neutral adjustments using the configured rates
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            labor_hours: 0.0,
            labor_rate: config.labor_rate,
            workers: config.workers,
            equipment_fee: 0.0,
            surcharge_percent: 0.0,
            surcharge_visible: true,
            markup_percent: 0.0,
            discount_percent: 0.0,
            early_payment_percent: 0.0,
            tax_rate: config.tax_rate,
        }
    }

    /// Clamp every percentage to [0, 100], the tax rate to [0, 1] and every
    /// amount to >= 0.
    ///
    /// Input-side helper; the aggregator takes its parameters as given.
    pub fn clamped(&self) -> Self {
        Self {
            labor_hours: non_negative(self.labor_hours),
            labor_rate: non_negative(self.labor_rate),
            workers: self.workers,
            equipment_fee: non_negative(self.equipment_fee),
            surcharge_percent: percent(self.surcharge_percent),
            surcharge_visible: self.surcharge_visible,
            markup_percent: percent(self.markup_percent),
            discount_percent: percent(self.discount_percent),
            early_payment_percent: percent(self.early_payment_percent),
            tax_rate: fraction(self.tax_rate),
        }
    }
}

fn percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

fn fraction(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_come_from_config() {
        let adj = Adjustments::default();
        assert_eq!(adj.tax_rate, 0.2);
        assert_eq!(adj.labor_rate, 65.0);
        assert_eq!(adj.workers, 1);
        assert!(adj.surcharge_visible);
    }

    #[test]
    fn test_clamped() {
        let adj = Adjustments {
            markup_percent: 150.0,
            discount_percent: -5.0,
            surcharge_percent: f64::NAN,
            labor_hours: -2.0,
            tax_rate: 1.5,
            ..Adjustments::default()
        }
        .clamped();

        assert_eq!(adj.markup_percent, 100.0);
        assert_eq!(adj.discount_percent, 0.0);
        assert_eq!(adj.surcharge_percent, 0.0);
        assert_eq!(adj.labor_hours, 0.0);
        assert_eq!(adj.tax_rate, 1.0);
    }
}
