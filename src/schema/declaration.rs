//! Schema declarations - one configuration row each
//!
//! Rows arrive as untyped text (`kind, label, variable, options, formula`)
//! from a spreadsheet-like source and are turned into typed declarations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::value::try_parse_number;

/// How a declaration obtains its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclarationKind {
    /// Free numeric input, optionally with a default
    Number,
    /// Exactly one labelled option
    Choice,
    /// Any subset of labelled options, values summed
    MultiChoice,
    /// Intermediate formula
    Derived,
    /// Formula whose value is the item price
    Price,
}

impl DeclarationKind {
    pub fn has_options(self) -> bool {
        matches!(self, DeclarationKind::Choice | DeclarationKind::MultiChoice)
    }

    pub fn has_formula(self) -> bool {
        matches!(self, DeclarationKind::Derived | DeclarationKind::Price)
    }
}

impl FromStr for DeclarationKind {
    type Err = String;

    /// Accepts the English names and the German column values used in the
    /// price sheets, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "number" | "zahl" | "eingabe" => Ok(DeclarationKind::Number),
            "choice" | "auswahl" => Ok(DeclarationKind::Choice),
            "multichoice" | "mehrfachauswahl" => Ok(DeclarationKind::MultiChoice),
            "derived" | "berechnung" | "formel" => Ok(DeclarationKind::Derived),
            "price" | "preis" | "endpreis" => Ok(DeclarationKind::Price),
            _ => Err(s.trim().to_string()),
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeclarationKind::Number => "Number",
            DeclarationKind::Choice => "Choice",
            DeclarationKind::MultiChoice => "MultiChoice",
            DeclarationKind::Derived => "Derived",
            DeclarationKind::Price => "Price",
        };
        f.write_str(name)
    }
}

/// One labelled option of a Choice / MultiChoice declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub label: String,
    pub value: f64,
}

/// Raw configuration row as stored by the schema source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaRow {
    pub kind: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub variable: String,
    #[serde(default)]
    pub options: String,
    #[serde(default)]
    pub formula: String,
}

impl SchemaRow {
    pub fn new(kind: &str, label: &str, variable: &str, options: &str, formula: &str) -> Self {
        Self {
            kind: kind.to_string(),
            label: label.to_string(),
            variable: variable.to_string(),
            options: options.to_string(),
            formula: formula.to_string(),
        }
    }
}

/// A validated declaration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration {
    /// 1-based row number in the source, for error reporting
    pub row: usize,
    pub kind: DeclarationKind,
    pub label: String,
    pub variable: String,
    /// Choice / MultiChoice options in source order
    pub options: Vec<ChoiceOption>,
    /// Number default
    pub default: Option<f64>,
    /// Derived / Price formula
    pub formula: Option<String>,
}

impl Declaration {
    /// Look up an option by its label (exact match first, then trimmed and
    /// case-insensitive)
    pub fn option(&self, label: &str) -> Option<&ChoiceOption> {
        self.options.iter().find(|o| o.label == label).or_else(|| {
            let wanted = label.trim().to_lowercase();
            self.options
                .iter()
                .find(|o| o.label.to_lowercase() == wanted)
        })
    }
}

/// Parse an options cell: `Label=1,5; Other: 2` or one entry per line.
///
/// Each entry is split at its last `=` (or `:` when there is no `=`), so
/// labels may contain the other separator. Returns `None` when any entry
/// is malformed or no entry is present.
pub fn parse_options(text: &str) -> Option<Vec<ChoiceOption>> {
    let mut options = Vec::new();

    for entry in text.split([';', '\n']) {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (label, value) = entry.rsplit_once('=').or_else(|| entry.rsplit_once(':'))?;
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        let value = try_parse_number(value).ok()?;
        options.push(ChoiceOption {
            label: label.to_string(),
            value,
        });
    }

    if options.is_empty() {
        None
    } else {
        Some(options)
    }
}
