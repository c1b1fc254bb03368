//! Line items - one priced, quantified entry in a quote

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::money::round_cents;
use crate::bom::BomLine;

/// Unique identifier for line items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineItemId(pub Uuid);

impl LineItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LineItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LineItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of one "add to quote" action
///
/// Immutable apart from `quantity`; [`LineItem::set_quantity`] keeps
/// `extended_price` in step with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub title: String,
    pub option_summary: String,
    /// Unmarked unit price, in cents
    pub unit_price: f64,
    pub quantity: f64,
    /// `unit_price × quantity`, in cents
    pub extended_price: f64,
    /// e.g. 10 (m) for a railing; used for the price-per-unit annotation
    pub reference_quantity: Option<f64>,
    pub reference_unit: Option<String>,
    pub bom_lines: Vec<BomLine>,
    /// Input problems that were degraded to zero during evaluation
    pub warnings: Vec<String>,
}

impl LineItem {
    pub fn new(
        title: impl Into<String>,
        option_summary: impl Into<String>,
        unit_price: f64,
        quantity: f64,
    ) -> Self {
        let unit_price = round_cents(unit_price);
        Self {
            id: LineItemId::new(),
            title: title.into(),
            option_summary: option_summary.into(),
            unit_price,
            quantity,
            extended_price: round_cents(unit_price * quantity),
            reference_quantity: None,
            reference_unit: None,
            bom_lines: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn with_reference(mut self, quantity: Option<f64>, unit: Option<String>) -> Self {
        self.reference_quantity = quantity;
        self.reference_unit = unit;
        self
    }

    pub fn with_bom(mut self, lines: Vec<BomLine>) -> Self {
        self.bom_lines = lines;
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn set_quantity(&mut self, quantity: f64) {
        self.quantity = quantity;
        self.extended_price = round_cents(self.unit_price * quantity);
    }

    /// Unit price divided by the reference quantity, if there is a usable one
    pub fn price_per_reference_unit(&self) -> Option<f64> {
        per_reference_unit(self.unit_price, self.reference_quantity)
    }
}

/// Quantities must be finite and not negative
pub fn is_valid_quantity(quantity: f64) -> bool {
    quantity.is_finite() && quantity >= 0.0
}

pub(crate) fn per_reference_unit(price: f64, reference: Option<f64>) -> Option<f64> {
    reference
        .filter(|r| r.is_finite() && *r > 0.0)
        .map(|r| round_cents(price / r))
}
