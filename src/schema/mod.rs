//! Configuration schema model
//!
//! A schema is the flat, ordered list of declarations for one product
//! family. Declarations are evaluated strictly in listed order, so a formula
//! may only reference variables assigned by earlier rows.

pub mod declaration;
pub mod family;
pub mod value;

pub use declaration::{parse_options, ChoiceOption, Declaration, DeclarationKind, SchemaRow};
pub use family::{BomRowDef, FamilyFileError, FamilyMeta, ProductFamily};
pub use value::{parse_number, try_parse_number, ParseWarning};

use ahash::AHashMap;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Authoring error in a single schema row
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("row {row}: '{variable}' needs at least one option")]
    EmptyOptions { row: usize, variable: String },
    #[error("row {row}: '{variable}' needs a formula")]
    MissingFormula { row: usize, variable: String },
    #[error("row {row}: unknown declaration kind '{kind}'")]
    UnknownKind { row: usize, kind: String },
    #[error("row {row}: variable '{variable}' already declared in row {first_row}")]
    DuplicateVariable {
        row: usize,
        variable: String,
        first_row: usize,
    },
    #[error("row {row}: missing variable name")]
    MissingVariable { row: usize },
}

impl SchemaError {
    pub fn row(&self) -> usize {
        match self {
            SchemaError::EmptyOptions { row, .. }
            | SchemaError::MissingFormula { row, .. }
            | SchemaError::UnknownKind { row, .. }
            | SchemaError::DuplicateVariable { row, .. }
            | SchemaError::MissingVariable { row } => *row,
        }
    }
}

/// Every row error found while loading a schema
#[derive(Debug, Clone, PartialEq, Error)]
#[error("schema has {} invalid row(s): {}", .errors.len(), join_errors(.errors))]
pub struct SchemaLoadError {
    pub errors: Vec<SchemaError>,
}

fn join_errors(errors: &[SchemaError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A Number default that could not be read and was loaded as 0
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefaultWarning {
    pub row: usize,
    pub variable: String,
    pub warning: ParseWarning,
}

impl fmt::Display for DefaultWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} ({}): {}", self.row, self.variable, self.warning)
    }
}

/// Ordered declarations of one product family
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    declarations: Vec<Declaration>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<DefaultWarning>,
}

impl Schema {
    /// Load rows, failing with every row error if any row is invalid
    pub fn load<'a, I>(rows: I) -> Result<Schema, SchemaLoadError>
    where
        I: IntoIterator<Item = &'a SchemaRow>,
    {
        let (schema, errors) = Self::load_lenient(rows);
        if errors.is_empty() {
            Ok(schema)
        } else {
            Err(SchemaLoadError { errors })
        }
    }

    /// Load rows, keeping every valid declaration and reporting the rest
    pub fn load_lenient<'a, I>(rows: I) -> (Schema, Vec<SchemaError>)
    where
        I: IntoIterator<Item = &'a SchemaRow>,
    {
        let mut declarations = Vec::new();
        let mut warnings = Vec::new();
        let mut errors = Vec::new();
        let mut seen: AHashMap<String, usize> = AHashMap::new();

        for (index, raw) in rows.into_iter().enumerate() {
            let row = index + 1;
            match load_row(row, raw) {
                Ok((decl, warning)) => {
                    if let Some(&first_row) = seen.get(&decl.variable) {
                        errors.push(SchemaError::DuplicateVariable {
                            row,
                            variable: decl.variable,
                            first_row,
                        });
                        continue;
                    }
                    if let Some(warning) = warning {
                        warnings.push(DefaultWarning {
                            row,
                            variable: decl.variable.clone(),
                            warning,
                        });
                    }
                    seen.insert(decl.variable.clone(), row);
                    declarations.push(decl);
                }
                Err(e) => errors.push(e),
            }
        }

        for error in &errors {
            tracing::warn!("skipping schema row: {}", error);
        }
        tracing::debug!(
            declarations = declarations.len(),
            errors = errors.len(),
            warnings = warnings.len(),
            "schema loaded"
        );

        (
            Schema {
                declarations,
                warnings,
            },
            errors,
        )
    }

    /// Declarations in evaluation order
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Number defaults that were unreadable and loaded as 0
    pub fn warnings(&self) -> &[DefaultWarning] {
        &self.warnings
    }

    pub fn get(&self, variable: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.variable == variable)
    }

    /// Position of a variable's declaration in evaluation order
    pub fn position(&self, variable: &str) -> Option<usize> {
        self.declarations.iter().position(|d| d.variable == variable)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

fn load_row(
    row: usize,
    raw: &SchemaRow,
) -> Result<(Declaration, Option<ParseWarning>), SchemaError> {
    let kind: DeclarationKind = raw
        .kind
        .parse()
        .map_err(|kind| SchemaError::UnknownKind { row, kind })?;

    let variable = raw.variable.trim().to_string();
    if variable.is_empty() {
        return Err(SchemaError::MissingVariable { row });
    }

    let mut decl = Declaration {
        row,
        kind,
        label: raw.label.trim().to_string(),
        variable,
        options: Vec::new(),
        default: None,
        formula: None,
    };

    let mut warning = None;
    match kind {
        DeclarationKind::Number => {
            // A bad default degrades to zero and keeps the row
            if !raw.options.trim().is_empty() {
                let (value, unreadable) = parse_number(&raw.options);
                decl.default = Some(value);
                warning = unreadable;
            }
        }
        DeclarationKind::Choice | DeclarationKind::MultiChoice => {
            decl.options = parse_options(&raw.options).ok_or_else(|| SchemaError::EmptyOptions {
                row,
                variable: decl.variable.clone(),
            })?;
        }
        DeclarationKind::Derived | DeclarationKind::Price => {
            let formula = raw.formula.trim();
            if formula.is_empty() {
                return Err(SchemaError::MissingFormula {
                    row,
                    variable: decl.variable,
                });
            }
            decl.formula = Some(formula.to_string());
        }
    }

    Ok((decl, warning))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<SchemaRow> {
        vec![
            SchemaRow::new("Number", "Länge (m)", "L", "10", ""),
            SchemaRow::new("Choice", "Farbe", "farbe", "STF=1; SOF=1,1", ""),
            SchemaRow::new("MultiChoice", "Extras", "extras", "Kappe=5; Blende=12,5", ""),
            SchemaRow::new("Derived", "Basis", "basis", "", "L * 100"),
            SchemaRow::new("Price", "Endpreis", "Endpreis", "", "basis * farbe + extras"),
        ]
    }

    #[test]
    fn test_load_valid_schema() {
        let schema = Schema::load(&rows()).unwrap();
        assert_eq!(schema.len(), 5);

        let l = schema.get("L").unwrap();
        assert_eq!(l.kind, DeclarationKind::Number);
        assert_eq!(l.default, Some(10.0));
        assert_eq!(l.row, 1);

        let farbe = schema.get("farbe").unwrap();
        assert_eq!(farbe.options.len(), 2);

        let price = &schema.declarations()[4];
        assert_eq!(price.kind, DeclarationKind::Price);
        assert_eq!(price.formula.as_deref(), Some("basis * farbe + extras"));
        assert_eq!(schema.position("basis"), Some(3));
    }

    #[test]
    fn test_load_collects_every_row_error() {
        let rows = vec![
            SchemaRow::new("Choice", "Farbe", "farbe", "", ""),
            SchemaRow::new("Number", "Länge", "L", "", ""),
            SchemaRow::new("Derived", "Basis", "basis", "", "   "),
            SchemaRow::new("Lookup", "Tabelle", "tab", "", ""),
            SchemaRow::new("Number", "Länge doppelt", "L", "", ""),
            SchemaRow::new("Number", "Ohne Namen", " ", "", ""),
            SchemaRow::new("Choice", "Kaputt", "kaputt", "Ja=viel", ""),
        ];

        let err = Schema::load(&rows).unwrap_err();
        assert_eq!(
            err.errors,
            vec![
                SchemaError::EmptyOptions {
                    row: 1,
                    variable: "farbe".into()
                },
                SchemaError::MissingFormula {
                    row: 3,
                    variable: "basis".into()
                },
                SchemaError::UnknownKind {
                    row: 4,
                    kind: "Lookup".into()
                },
                SchemaError::DuplicateVariable {
                    row: 5,
                    variable: "L".into(),
                    first_row: 2
                },
                SchemaError::MissingVariable { row: 6 },
                SchemaError::EmptyOptions {
                    row: 7,
                    variable: "kaputt".into()
                },
            ]
        );
        assert_eq!(err.errors[3].row(), 5);
        assert!(err.to_string().starts_with("schema has 6 invalid row(s)"));
    }

    #[test]
    fn test_lenient_load_keeps_valid_rows() {
        let mut rows = rows();
        rows.insert(1, SchemaRow::new("Price", "Kaputt", "kaputt", "", ""));

        let (schema, errors) = Schema::load_lenient(&rows);
        assert_eq!(schema.len(), 5);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row(), 2);
        assert!(schema.get("kaputt").is_none());
    }

    #[test]
    fn test_bad_number_default_degrades_to_zero() {
        let rows = vec![
            SchemaRow::new("Number", "Breite", "breite", "1,5", ""),
            SchemaRow::new("Number", "Höhe", "hoehe", "tausend", ""),
        ];
        let schema = Schema::load(&rows).unwrap();
        assert_eq!(schema.get("hoehe").unwrap().default, Some(0.0));
        assert_eq!(
            schema.warnings(),
            &[DefaultWarning {
                row: 2,
                variable: "hoehe".into(),
                warning: ParseWarning {
                    text: "tausend".into()
                },
            }]
        );
        assert!(schema.warnings()[0].to_string().starts_with("row 2 (hoehe)"));
    }

    #[test]
    fn test_rejected_row_keeps_no_default_warning() {
        let rows = vec![
            SchemaRow::new("Number", "Höhe", "hoehe", "2", ""),
            SchemaRow::new("Number", "Höhe nochmal", "hoehe", "viel", ""),
        ];
        let (schema, errors) = Schema::load_lenient(&rows);
        assert_eq!(errors.len(), 1);
        assert!(schema.warnings().is_empty());
    }

    #[test]
    fn test_valid_schema_has_no_warnings() {
        assert!(Schema::load(&rows()).unwrap().warnings().is_empty());
    }

    #[test]
    fn test_formulas_are_not_validated_at_load() {
        let rows = vec![SchemaRow::new("Price", "Preis", "p", "", "later * 2")];
        assert!(Schema::load(&rows).is_ok());
    }
}
