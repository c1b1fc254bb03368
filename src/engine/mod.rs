//! Evaluation pass: schema + user input -> priced line item
//!
//! Declarations are bound into a fresh [`Environment`] strictly in schema
//! order. Any failure aborts pricing of this one item and names the
//! declaration that caused it.

pub mod inputs;

pub use inputs::{InputValue, Inputs};

use serde::Serialize;
use thiserror::Error;

use crate::bom::BomDeriver;
use crate::expression::{self, Environment, Expr, ExprError};
use crate::quote::{is_valid_quantity, LineItem};
use crate::schema::{
    parse_number, ChoiceOption, Declaration, DeclarationKind, ParseWarning, ProductFamily, Schema,
};

/// Why an item could not be priced
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    /// A Derived / Price formula failed
    #[error("row {row} '{label}' ({variable}): {source}")]
    Declaration {
        row: usize,
        variable: String,
        label: String,
        source: ExprError,
    },
    #[error("no value given for '{variable}' and no default declared")]
    MissingInput { variable: String },
    #[error("'{option}' is not an option of '{variable}'")]
    UnknownOption { variable: String, option: String },
    #[error("input for '{variable}' does not fit its {kind} declaration")]
    InputMismatch {
        variable: String,
        kind: DeclarationKind,
    },
    #[error("schema has no Price declaration")]
    NoPriceDeclaration,
    #[error("quantity must be a finite number >= 0, got {0}")]
    InvalidQuantity(f64),
}

/// Unreadable number input that was replaced by zero
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputWarning {
    pub variable: String,
    pub warning: ParseWarning,
}

/// Result of one evaluation pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub environment: Environment,
    /// Value of the last Price declaration
    pub unit_price: f64,
    /// `Label: option` for every Choice / MultiChoice, in schema order
    pub option_summary: Vec<String>,
    pub warnings: Vec<InputWarning>,
}

/// Bind every declaration of `schema` in order
pub fn evaluate(schema: &Schema, inputs: &Inputs) -> Result<Evaluation, PricingError> {
    let mut env = Environment::new();
    let mut option_summary = Vec::new();
    let mut warnings = Vec::new();
    let mut unit_price = None;

    for decl in schema.declarations() {
        let input = inputs.get(&decl.variable);
        let value = match decl.kind {
            DeclarationKind::Number => number_value(decl, input, &mut warnings)?,
            DeclarationKind::Choice => {
                let option = choice_value(decl, input)?;
                option_summary.push(format!("{}: {}", display_label(decl), option.label));
                option.value
            }
            DeclarationKind::MultiChoice => {
                let selected = multi_choice_values(decl, input)?;
                if !selected.is_empty() {
                    let labels: Vec<&str> = selected.iter().map(|o| o.label.as_str()).collect();
                    option_summary.push(format!("{}: {}", display_label(decl), labels.join(", ")));
                }
                selected.iter().map(|o| o.value).sum::<f64>()
            }
            DeclarationKind::Derived | DeclarationKind::Price => formula_value(schema, decl, &env)?,
        };

        tracing::debug!(row = decl.row, variable = %decl.variable, value, "bound");
        env.insert(decl.variable.clone(), value);
        if decl.kind == DeclarationKind::Price {
            unit_price = Some(value);
        }
    }

    let unit_price = unit_price.ok_or(PricingError::NoPriceDeclaration)?;

    Ok(Evaluation {
        environment: env,
        unit_price,
        option_summary,
        warnings,
    })
}

/// Evaluate, derive the BOM and assemble a line item
pub fn price_item(
    family: &ProductFamily,
    inputs: &Inputs,
    quantity: f64,
    deriver: &BomDeriver,
) -> Result<LineItem, PricingError> {
    if !is_valid_quantity(quantity) {
        return Err(PricingError::InvalidQuantity(quantity));
    }
    let evaluation = evaluate(&family.schema, inputs)?;
    let bom_lines = deriver.derive(family, &evaluation.environment);

    let reference_quantity = family
        .meta
        .reference_variable
        .as_deref()
        .and_then(|name| evaluation.environment.get(name));

    let item = LineItem::new(
        family.meta.title.clone(),
        evaluation.option_summary.join("; "),
        evaluation.unit_price,
        quantity,
    )
    .with_reference(reference_quantity, family.meta.reference_unit.clone())
    .with_bom(bom_lines)
    .with_warnings(
        evaluation
            .warnings
            .iter()
            .map(|w| format!("{}: {}", w.variable, w.warning))
            .collect(),
    );

    tracing::info!(
        family = %family.meta.id,
        unit_price = item.unit_price,
        quantity = item.quantity,
        "item priced"
    );
    Ok(item)
}

/// A formula reference that cannot be satisfied in schema order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderingIssue {
    pub row: usize,
    pub variable: String,
    pub reference: String,
    /// Row that declares `reference`, if any row does
    pub declared_at: Option<usize>,
}

/// Statically list every reference to a variable that is not declared by
/// an earlier row. Formulas that do not parse are left to [`evaluate`].
pub fn ordering_issues(schema: &Schema) -> Vec<OrderingIssue> {
    let mut issues = Vec::new();

    for (index, decl) in schema.declarations().iter().enumerate() {
        let Some(formula) = decl.formula.as_deref() else {
            continue;
        };
        let Ok(expr) = Expr::parse(formula.trim()) else {
            continue;
        };
        for reference in expr.variables() {
            let position = schema.position(&reference);
            if position.is_some_and(|p| p < index) {
                continue;
            }
            issues.push(OrderingIssue {
                row: decl.row,
                variable: decl.variable.clone(),
                declared_at: schema.get(&reference).map(|d| d.row),
                reference,
            });
        }
    }

    issues
}

fn display_label(decl: &Declaration) -> &str {
    if decl.label.is_empty() {
        &decl.variable
    } else {
        &decl.label
    }
}

fn number_value(
    decl: &Declaration,
    input: Option<&InputValue>,
    warnings: &mut Vec<InputWarning>,
) -> Result<f64, PricingError> {
    let missing = || {
        decl.default.ok_or_else(|| PricingError::MissingInput {
            variable: decl.variable.clone(),
        })
    };

    match input {
        None => missing(),
        Some(InputValue::Text(text)) if text.trim().is_empty() => missing(),
        Some(InputValue::Number(value)) if value.is_finite() => Ok(*value),
        Some(InputValue::Number(value)) => {
            warnings.push(InputWarning {
                variable: decl.variable.clone(),
                warning: ParseWarning {
                    text: value.to_string(),
                },
            });
            Ok(0.0)
        }
        Some(InputValue::Text(text)) => {
            let (value, warning) = parse_number(text);
            if let Some(warning) = warning {
                warnings.push(InputWarning {
                    variable: decl.variable.clone(),
                    warning,
                });
            }
            Ok(value)
        }
        Some(InputValue::Choices(_)) => Err(PricingError::InputMismatch {
            variable: decl.variable.clone(),
            kind: decl.kind,
        }),
    }
}

fn find_option<'a>(decl: &'a Declaration, label: &str) -> Result<&'a ChoiceOption, PricingError> {
    decl.option(label).ok_or_else(|| PricingError::UnknownOption {
        variable: decl.variable.clone(),
        option: label.to_string(),
    })
}

/// The selected option, or the first one when nothing was selected
fn choice_value<'a>(
    decl: &'a Declaration,
    input: Option<&InputValue>,
) -> Result<&'a ChoiceOption, PricingError> {
    match input {
        None => decl.options.first().ok_or_else(|| PricingError::MissingInput {
            variable: decl.variable.clone(),
        }),
        Some(InputValue::Text(label)) => find_option(decl, label),
        Some(InputValue::Choices(labels)) if labels.len() == 1 => find_option(decl, &labels[0]),
        Some(_) => Err(PricingError::InputMismatch {
            variable: decl.variable.clone(),
            kind: decl.kind,
        }),
    }
}

fn multi_choice_values<'a>(
    decl: &'a Declaration,
    input: Option<&InputValue>,
) -> Result<Vec<&'a ChoiceOption>, PricingError> {
    match input {
        None => Ok(Vec::new()),
        Some(InputValue::Text(label)) if label.trim().is_empty() => Ok(Vec::new()),
        Some(InputValue::Text(label)) => Ok(vec![find_option(decl, label)?]),
        Some(InputValue::Choices(labels)) => labels.iter().map(|l| find_option(decl, l)).collect(),
        Some(InputValue::Number(_)) => Err(PricingError::InputMismatch {
            variable: decl.variable.clone(),
            kind: decl.kind,
        }),
    }
}

fn formula_value(
    schema: &Schema,
    decl: &Declaration,
    env: &Environment,
) -> Result<f64, PricingError> {
    let formula = decl.formula.as_deref().unwrap_or_default();

    expression::evaluate(formula, env).map_err(|source| {
        if let ExprError::UndefinedVariable(name) = &source {
            if let Some(later) = schema.get(name) {
                tracing::warn!(
                    "row {} references '{}' which is only declared in row {}",
                    decl.row,
                    name,
                    later.row
                );
            }
        }
        PricingError::Declaration {
            row: decl.row,
            variable: decl.variable.clone(),
            label: decl.label.clone(),
            source,
        }
    })
}
