//! Bill-of-materials derivation
//!
//! Material quantities are advisory annotations layered on top of the
//! pricing schema. Each rule is a pure function of the environment keyed on
//! which variables are bound; a rule whose triggers are absent emits nothing,
//! and a rule that cannot produce a sound number is skipped with a warning.

pub mod rules;
pub mod vocabulary;

pub use rules::{CornerRule, GlassRule, MountingRule, PostRule, RailRule, RoofRule, StepRule};
pub use vocabulary::BomVocabulary;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::expression::{self, Environment};
use crate::schema::{BomRowDef, ProductFamily};

/// One derived material annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomLine {
    pub text: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

impl BomLine {
    pub fn new(text: impl Into<String>, quantity: f64, unit: &str) -> Self {
        Self {
            text: text.into(),
            quantity: Some(quantity),
            unit: Some(unit.to_string()),
        }
    }

    pub fn note(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quantity: None,
            unit: None,
        }
    }
}

impl fmt::Display for BomLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.quantity, &self.unit) {
            (Some(q), Some(unit)) => write!(f, "{}: {} {}", self.text, q, unit),
            (Some(q), None) => write!(f, "{}: {}", self.text, q),
            _ => f.write_str(&self.text),
        }
    }
}

/// A rule that could not derive a sound quantity
#[derive(Debug, Clone, PartialEq, Error)]
#[error("BOM rule '{rule}' skipped: {reason}")]
pub struct BomSkip {
    pub rule: String,
    pub reason: String,
}

impl BomSkip {
    pub fn new(rule: &str, reason: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            reason: reason.into(),
        }
    }
}

/// Read-only inputs handed to every rule
pub struct RuleContext<'a> {
    pub env: &'a Environment,
    pub vocab: &'a BomVocabulary,
}

impl RuleContext<'_> {
    /// Value of the first bound alias
    pub fn lookup(&self, aliases: &[String]) -> Option<f64> {
        self.env.first_of(aliases).map(|(_, value)| value)
    }
}

/// A single material heuristic
pub trait BomRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Lines for this rule; `Ok(vec![])` when the triggers are absent
    fn derive(&self, ctx: &RuleContext<'_>) -> Result<Vec<BomLine>, BomSkip>;
}

/// Runs the configured rules, then the family's own BOM rows
pub struct BomDeriver {
    vocab: BomVocabulary,
    rules: Vec<Box<dyn BomRule>>,
}

impl BomDeriver {
    /// A deriver without rules
    pub fn new(vocab: BomVocabulary) -> Self {
        Self {
            vocab,
            rules: Vec::new(),
        }
    }

    /// All built-in rules, in output order
    pub fn standard(vocab: BomVocabulary) -> Self {
        Self::new(vocab)
            .with_rule(PostRule)
            .with_rule(MountingRule)
            .with_rule(CornerRule)
            .with_rule(RailRule)
            .with_rule(GlassRule)
            .with_rule(RoofRule)
            .with_rule(StepRule)
    }

    pub fn with_rule(mut self, rule: impl BomRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn vocabulary(&self) -> &BomVocabulary {
        &self.vocab
    }

    /// Derive the material list for one evaluated item
    pub fn derive(&self, family: &ProductFamily, env: &Environment) -> Vec<BomLine> {
        let ctx = RuleContext {
            env,
            vocab: &self.vocab,
        };
        let mut lines = Vec::new();

        for rule in &self.rules {
            match rule.derive(&ctx) {
                Ok(mut derived) => lines.append(&mut derived),
                Err(skip) => tracing::warn!(family = %family.meta.id, "{}", skip),
            }
        }

        for row in &family.bom_rows {
            match custom_line(row, env) {
                Ok(Some(line)) => lines.push(line),
                Ok(None) => {}
                Err(skip) => tracing::warn!(family = %family.meta.id, "{}", skip),
            }
        }

        lines
    }
}

/// Evaluate a family BOM row; zero quantities are left out
fn custom_line(row: &BomRowDef, env: &Environment) -> Result<Option<BomLine>, BomSkip> {
    if row.quantity.trim().is_empty() {
        return Ok(Some(BomLine::note(row.text.clone())));
    }

    let quantity = expression::evaluate(&row.quantity, env)
        .map_err(|e| BomSkip::new(&row.text, e.to_string()))?;
    if quantity == 0.0 {
        return Ok(None);
    }

    Ok(Some(BomLine {
        text: row.text.clone(),
        quantity: Some(quantity),
        unit: row.unit.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FamilyMeta, Schema};

    fn family(bom_rows: Vec<BomRowDef>) -> ProductFamily {
        ProductFamily::new(
            FamilyMeta {
                id: "test".into(),
                title: "Test".into(),
                reference_variable: None,
                reference_unit: None,
            },
            Schema::default(),
        )
        .with_bom_rows(bom_rows)
    }

    fn env(pairs: &[(&str, f64)]) -> Environment {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_posts_and_brackets() {
        let deriver = BomDeriver::standard(BomVocabulary::default());
        let environment = env(&[("laenge", 10.0), ("steher_abstand", 2.5)]);
        let lines = deriver.derive(&family(vec![]), &environment);

        assert_eq!(
            lines,
            vec![
                BomLine::new("Posts", 5.0, "pcs"),
                BomLine::new("Surface-mount brackets", 5.0, "pcs"),
            ]
        );
    }

    #[test]
    fn test_empty_environment_derives_nothing() {
        let deriver = BomDeriver::standard(BomVocabulary::default());
        assert!(deriver.derive(&family(vec![]), &Environment::new()).is_empty());
    }

    #[test]
    fn test_zero_spacing_skips_only_that_rule() {
        let deriver = BomDeriver::standard(BomVocabulary::default());
        let lines = deriver.derive(
            &family(vec![]),
            &env(&[("laenge", 10.0), ("steher_abstand", 0.0), ("ecken", 2.0)]),
        );
        assert_eq!(lines, vec![BomLine::new("Corner connectors", 2.0, "pcs")]);
    }

    #[test]
    fn test_derive_does_not_touch_environment() {
        let deriver = BomDeriver::standard(BomVocabulary::default());
        let env = env(&[("laenge", 10.0), ("steher_abstand", 2.5), ("einbetonieren", 1.0)]);
        let before = env.clone();
        let _ = deriver.derive(&family(vec![]), &env);
        assert_eq!(env, before);
    }

    #[test]
    fn test_custom_rows() {
        let deriver = BomDeriver::new(BomVocabulary::default());
        let rows = vec![
            BomRowDef {
                text: "Pfostenkappen".into(),
                quantity: "steher_anzahl".into(),
                unit: Some("Stk".into()),
            },
            BomRowDef {
                text: "Blumenkästen".into(),
                quantity: "blumenkasten".into(),
                unit: Some("Stk".into()),
            },
            BomRowDef {
                text: "Montagehinweis beachten".into(),
                quantity: String::new(),
                unit: None,
            },
            BomRowDef {
                text: "Kaputt".into(),
                quantity: "steher_anzahl / 0".into(),
                unit: None,
            },
        ];
        let lines = deriver.derive(
            &family(rows),
            &env(&[("steher_anzahl", 9.0), ("blumenkasten", 0.0)]),
        );

        assert_eq!(
            lines,
            vec![
                BomLine::new("Pfostenkappen", 9.0, "Stk"),
                BomLine::note("Montagehinweis beachten"),
            ]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(BomLine::new("Posts", 5.0, "pcs").to_string(), "Posts: 5 pcs");
        assert_eq!(BomLine::note("Hinweis").to_string(), "Hinweis");
    }
}
