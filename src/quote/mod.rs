//! Quote collection and final aggregation

pub mod adjustments;
pub mod aggregate;
pub mod line_item;
pub mod money;

pub use adjustments::Adjustments;
pub use aggregate::{
    aggregate, AdjustmentKind, AdjustmentLine, EarlyPayment, InternalBreakdown, QuotedLine,
    Quotation,
};
pub use line_item::{is_valid_quantity, LineItem, LineItemId};
pub use money::round_cents;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuoteError {
    #[error("no line item with id {0}")]
    UnknownLineItem(LineItemId),
    #[error("quantity must be a finite number >= 0, got {0}")]
    InvalidQuantity(f64),
}

/// Line items of one session plus the quote-wide adjustments
///
/// Owned by exactly one session; never shared.
#[derive(Debug, Clone, Default)]
pub struct Quote {
    items: Vec<LineItem>,
    pub adjustments: Adjustments,
}

impl Quote {
    pub fn new(adjustments: Adjustments) -> Self {
        Self {
            items: Vec::new(),
            adjustments,
        }
    }

    /// Append an item, returning its id
    pub fn add(&mut self, item: LineItem) -> LineItemId {
        let id = item.id;
        tracing::debug!(%id, title = %item.title, "line item added");
        self.items.push(item);
        id
    }

    pub fn remove(&mut self, id: LineItemId) -> Result<LineItem, QuoteError> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(QuoteError::UnknownLineItem(id))?;
        Ok(self.items.remove(index))
    }

    pub fn set_quantity(&mut self, id: LineItemId, quantity: f64) -> Result<(), QuoteError> {
        if !is_valid_quantity(quantity) {
            return Err(QuoteError::InvalidQuantity(quantity));
        }
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(QuoteError::UnknownLineItem(id))?;
        item.set_quantity(quantity);
        Ok(())
    }

    pub fn get(&self, id: LineItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn aggregate(&self) -> Quotation {
        aggregate(&self.items, &self.adjustments)
    }
}
