//! Quote aggregation
//!
//! A pure reduction of line items plus [`Adjustments`] into a [`Quotation`].
//! The stages run in a fixed order and every stage result is rounded to
//! cents before the next stage sees it:
//!
//! 1. items subtotal
//! 2. labor and equipment
//! 3. hidden markup (per unit price and per flat cost)
//! 4. risk surcharge, itemized or folded into labor
//! 5. visible discount
//! 6. tax
//! 7. gross total

use serde::Serialize;

use super::adjustments::Adjustments;
use super::line_item::{per_reference_unit, LineItem, LineItemId};
use super::money::{percent_of, round_cents};
use crate::bom::BomLine;

/// A line item as presented to the client, markup applied
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotedLine {
    pub id: LineItemId,
    pub title: String,
    pub option_summary: String,
    pub quantity: f64,
    /// Marked-up unit price; `unit_price × quantity == extended_price`
    pub unit_price: f64,
    pub extended_price: f64,
    /// Unit price before markup
    pub base_unit_price: f64,
    pub reference_quantity: Option<f64>,
    pub reference_unit: Option<String>,
    pub price_per_reference_unit: Option<f64>,
    pub base_price_per_reference_unit: Option<f64>,
    pub bom_lines: Vec<BomLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AdjustmentKind {
    Labor,
    Equipment,
    Surcharge,
    Discount,
}

/// An itemized adjustment below the item lines
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdjustmentLine {
    pub kind: AdjustmentKind,
    pub label: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    /// Signed; discounts are negative
    pub amount: f64,
}

/// "Payable if paid early" figure; never part of the gross total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EarlyPayment {
    pub percent: f64,
    pub deduction: f64,
    pub payable: f64,
}

/// True, unmarked values for the internal document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InternalBreakdown {
    pub items_subtotal: f64,
    pub labor: f64,
    pub equipment: f64,
    pub subtotal_with_labor: f64,
    pub markup_percent: f64,
    pub markup_amount: f64,
    /// Always shown separately, visible to the client or not
    pub surcharge: f64,
    pub surcharge_visible: bool,
    pub discount: f64,
    pub net_total: f64,
    pub tax: f64,
    pub gross_total: f64,
}

/// Fully aggregated, tax-inclusive quote
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quotation {
    pub lines: Vec<QuotedLine>,
    pub adjustments: Vec<AdjustmentLine>,
    /// Sum of unmarked line totals
    pub items_subtotal: f64,
    /// Items plus unmarked labor and equipment
    pub subtotal_with_labor: f64,
    /// Sum of the displayed, marked-up amounts
    pub marked_subtotal: f64,
    pub surcharge: f64,
    pub discount: f64,
    pub net_total: f64,
    pub tax_rate: f64,
    pub tax: f64,
    pub gross_total: f64,
    pub early_payment: Option<EarlyPayment>,
    pub internal: InternalBreakdown,
}

impl Quotation {
    /// The client-visible surcharge line, if any
    pub fn surcharge_line(&self) -> Option<&AdjustmentLine> {
        self.adjustment(AdjustmentKind::Surcharge)
    }

    pub fn labor_line(&self) -> Option<&AdjustmentLine> {
        self.adjustment(AdjustmentKind::Labor)
    }

    pub fn adjustment(&self, kind: AdjustmentKind) -> Option<&AdjustmentLine> {
        self.adjustments.iter().find(|a| a.kind == kind)
    }
}

/// Reduce `items` and `adjustments` into a quotation.
///
/// Percentages are used as given; clamp them with
/// [`Adjustments::clamped`] first.
pub fn aggregate(items: &[LineItem], adjustments: &Adjustments) -> Quotation {
    // 1. items
    let items_subtotal = round_cents(items.iter().map(|i| i.extended_price).sum());

    // 2. flat costs
    let labor = round_cents(
        adjustments.labor_hours * adjustments.labor_rate * f64::from(adjustments.workers),
    );
    let equipment = round_cents(adjustments.equipment_fee);
    let subtotal_with_labor = round_cents(items_subtotal + labor + equipment);

    // 3. markup
    let factor = 1.0 + adjustments.markup_percent / 100.0;
    let lines: Vec<QuotedLine> = items.iter().map(|item| quoted_line(item, factor)).collect();
    let marked_labor = round_cents(labor * factor);
    let marked_equipment = round_cents(equipment * factor);
    let marked_subtotal = round_cents(
        lines.iter().map(|l| l.extended_price).sum::<f64>() + marked_labor + marked_equipment,
    );

    // 4. surcharge
    let surcharge = percent_of(marked_subtotal, adjustments.surcharge_percent);
    let with_surcharge = round_cents(marked_subtotal + surcharge);

    // 5. discount
    let discount = percent_of(with_surcharge, adjustments.discount_percent);
    let net_total = round_cents(with_surcharge - discount);

    // 6. + 7. tax
    let tax = round_cents(net_total * adjustments.tax_rate);
    let gross_total = round_cents(net_total + tax);

    tracing::debug!(
        items_subtotal,
        subtotal_with_labor,
        marked_subtotal,
        surcharge,
        discount,
        net_total,
        tax,
        gross_total,
        "quote aggregated"
    );

    let adjustment_lines = adjustment_lines(
        adjustments,
        marked_labor,
        marked_equipment,
        surcharge,
        discount,
    );

    let early_payment = (adjustments.early_payment_percent > 0.0).then(|| {
        let deduction = percent_of(gross_total, adjustments.early_payment_percent);
        EarlyPayment {
            percent: adjustments.early_payment_percent,
            deduction,
            payable: round_cents(gross_total - deduction),
        }
    });

    Quotation {
        lines,
        adjustments: adjustment_lines,
        items_subtotal,
        subtotal_with_labor,
        marked_subtotal,
        surcharge,
        discount,
        net_total,
        tax_rate: adjustments.tax_rate,
        tax,
        gross_total,
        early_payment,
        internal: InternalBreakdown {
            items_subtotal,
            labor,
            equipment,
            subtotal_with_labor,
            markup_percent: adjustments.markup_percent,
            markup_amount: round_cents(marked_subtotal - subtotal_with_labor),
            surcharge,
            surcharge_visible: adjustments.surcharge_visible,
            discount,
            net_total,
            tax,
            gross_total,
        },
    }
}

fn quoted_line(item: &LineItem, factor: f64) -> QuotedLine {
    let unit_price = round_cents(item.unit_price * factor);
    QuotedLine {
        id: item.id,
        title: item.title.clone(),
        option_summary: item.option_summary.clone(),
        quantity: item.quantity,
        unit_price,
        extended_price: round_cents(unit_price * item.quantity),
        base_unit_price: item.unit_price,
        reference_quantity: item.reference_quantity,
        reference_unit: item.reference_unit.clone(),
        price_per_reference_unit: per_reference_unit(unit_price, item.reference_quantity),
        base_price_per_reference_unit: item.price_per_reference_unit(),
        bom_lines: item.bom_lines.clone(),
    }
}

fn adjustment_lines(
    adjustments: &Adjustments,
    marked_labor: f64,
    marked_equipment: f64,
    surcharge: f64,
    discount: f64,
) -> Vec<AdjustmentLine> {
    let mut lines = Vec::new();

    let labor_amount = if adjustments.surcharge_visible {
        marked_labor
    } else {
        round_cents(marked_labor + surcharge)
    };
    if labor_amount != 0.0 {
        lines.push(AdjustmentLine {
            kind: AdjustmentKind::Labor,
            label: format!("Labor ({} worker(s))", adjustments.workers),
            quantity: Some(adjustments.labor_hours),
            unit: Some("h".to_string()),
            amount: labor_amount,
        });
    }

    if marked_equipment != 0.0 {
        lines.push(AdjustmentLine {
            kind: AdjustmentKind::Equipment,
            label: "Crane / equipment".to_string(),
            quantity: None,
            unit: None,
            amount: marked_equipment,
        });
    }

    if adjustments.surcharge_visible && surcharge != 0.0 {
        lines.push(AdjustmentLine {
            kind: AdjustmentKind::Surcharge,
            label: format!("Risk surcharge ({}%)", adjustments.surcharge_percent),
            quantity: None,
            unit: None,
            amount: surcharge,
        });
    }

    if discount != 0.0 {
        lines.push(AdjustmentLine {
            kind: AdjustmentKind::Discount,
            label: format!("Discount ({}%)", adjustments.discount_percent),
            quantity: None,
            unit: None,
            amount: -discount,
        });
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neutral() -> Adjustments {
        Adjustments {
            tax_rate: 0.0,
            ..Adjustments::default()
        }
    }

    #[test]
    fn test_markup_discount_tax_sequence() {
        let items = vec![LineItem::new("Geländer", "", 100.0, 1.0)];
        let adj = Adjustments {
            markup_percent: 10.0,
            discount_percent: 20.0,
            tax_rate: 0.2,
            ..Adjustments::default()
        };
        let q = aggregate(&items, &adj);

        assert_eq!(q.lines[0].unit_price, 110.0);
        assert_eq!(q.lines[0].base_unit_price, 100.0);
        assert_eq!(q.marked_subtotal, 110.0);
        assert_eq!(q.discount, 22.0);
        assert_eq!(q.net_total, 88.0);
        assert_eq!(q.tax, 17.6);
        assert_eq!(q.gross_total, 105.6);
        assert_eq!(q.adjustment(AdjustmentKind::Discount).map(|a| a.amount), Some(-22.0));
    }

    #[test]
    fn test_discount_is_taken_from_marked_up_subtotal() {
        let items = vec![LineItem::new("Geländer", "", 100.0, 1.0)];
        let with_markup = aggregate(
            &items,
            &Adjustments {
                markup_percent: 10.0,
                discount_percent: 20.0,
                ..neutral()
            },
        );
        // Discount applied to the unmarked price would be 20.0
        assert_ne!(with_markup.discount, percent_of(100.0, 20.0));
    }

    #[test]
    fn test_marked_lines_stay_consistent() {
        let items = vec![
            LineItem::new("A", "", 33.33, 3.0),
            LineItem::new("B", "", 19.99, 7.0),
        ];
        let q = aggregate(
            &items,
            &Adjustments {
                markup_percent: 17.0,
                ..neutral()
            },
        );

        for line in &q.lines {
            assert_eq!(line.extended_price, round_cents(line.unit_price * line.quantity));
        }
        let displayed: f64 = q.lines.iter().map(|l| l.extended_price).sum();
        assert_eq!(q.marked_subtotal, round_cents(displayed));
    }

    #[test]
    fn test_hidden_surcharge_folds_into_labor() {
        let items = vec![LineItem::new("Treppe", "", 1000.0, 1.0)];
        let adj = Adjustments {
            labor_hours: 2.0,
            labor_rate: 65.0,
            workers: 1,
            surcharge_percent: 15.0,
            surcharge_visible: false,
            ..neutral()
        };
        let q = aggregate(&items, &adj);

        assert!(q.surcharge_line().is_none());
        assert_eq!(q.surcharge, 169.5);
        assert_eq!(q.labor_line().map(|l| l.amount), Some(130.0 + 169.5));
        assert_eq!(q.net_total, 1299.5);
        assert_eq!(q.internal.labor, 130.0);
        assert_eq!(q.internal.surcharge, 169.5);
        assert!(!q.internal.surcharge_visible);

        let itemized: f64 = q.lines.iter().map(|l| l.extended_price).sum::<f64>()
            + q.adjustments.iter().map(|a| a.amount).sum::<f64>();
        assert_eq!(round_cents(itemized), q.net_total);
    }

    #[test]
    fn test_visible_surcharge_is_itemized() {
        let items = vec![LineItem::new("Treppe", "", 1000.0, 1.0)];
        let adj = Adjustments {
            labor_hours: 2.0,
            surcharge_percent: 15.0,
            surcharge_visible: true,
            ..neutral()
        };
        let q = aggregate(&items, &adj);

        assert_eq!(q.surcharge_line().map(|l| l.amount), Some(169.5));
        assert_eq!(q.labor_line().map(|l| l.amount), Some(130.0));
    }

    #[test]
    fn test_labor_workers_and_equipment() {
        let adj = Adjustments {
            labor_hours: 4.0,
            labor_rate: 65.0,
            workers: 2,
            equipment_fee: 250.0,
            markup_percent: 10.0,
            ..neutral()
        };
        let q = aggregate(&[LineItem::new("Vordach", "", 1000.0, 1.0)], &adj);

        assert_eq!(q.internal.labor, 520.0);
        assert_eq!(q.subtotal_with_labor, 1770.0);
        assert_eq!(q.labor_line().map(|l| l.amount), Some(572.0));
        assert_eq!(q.adjustment(AdjustmentKind::Equipment).map(|l| l.amount), Some(275.0));
        assert_eq!(q.marked_subtotal, 1947.0);
        assert_eq!(q.internal.markup_amount, 177.0);
    }

    #[test]
    fn test_early_payment_is_informational() {
        let adj = Adjustments {
            early_payment_percent: 2.0,
            tax_rate: 0.2,
            ..Adjustments::default()
        };
        let q = aggregate(&[LineItem::new("Zaun", "", 1000.0, 1.0)], &adj);

        assert_eq!(q.gross_total, 1200.0);
        let early = q.early_payment.unwrap();
        assert_eq!(early.deduction, 24.0);
        assert_eq!(early.payable, 1176.0);
    }

    #[test]
    fn test_empty_quote() {
        let q = aggregate(&[], &Adjustments::default());
        assert!(q.lines.is_empty());
        assert!(q.adjustments.is_empty());
        assert_eq!(q.gross_total, 0.0);
        assert!(q.early_payment.is_none());
    }

    #[test]
    fn test_price_per_reference_unit_before_and_after_markup() {
        let item = LineItem::new("Geländer", "", 1000.0, 1.0)
            .with_reference(Some(10.0), Some("m".into()));
        let q = aggregate(
            &[item],
            &Adjustments {
                markup_percent: 10.0,
                ..neutral()
            },
        );
        assert_eq!(q.lines[0].base_price_per_reference_unit, Some(100.0));
        assert_eq!(q.lines[0].price_per_reference_unit, Some(110.0));
    }
}
