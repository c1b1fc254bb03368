//! Product family files
//!
//! A family bundles its schema rows with display metadata and optional
//! family-specific BOM rows. Files are TOML:
//!
//! ```toml
//! [family]
//! id = "canopy"
//! title = "Vordach"
//! reference_variable = "breite"
//! reference_unit = "m"
//!
//! [[rows]]
//! kind = "Number"
//! label = "Breite (m)"
//! variable = "breite"
//! options = "2,5"
//!
//! [[bom]]
//! text = "Wandanschlussprofil"
//! quantity = "breite"
//! unit = "m"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::{Schema, SchemaError, SchemaLoadError, SchemaRow};

/// Errors that can occur when loading a family file
#[derive(Debug, Error)]
pub enum FamilyFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// Only returned by the strict loaders
    #[error("{0}")]
    Schema(#[from] SchemaLoadError),
}

/// Display metadata for a family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyMeta {
    pub id: String,
    pub title: String,
    /// Variable whose value is the item's reference quantity (e.g. run length)
    #[serde(default)]
    pub reference_variable: Option<String>,
    /// Unit shown next to the reference quantity
    #[serde(default)]
    pub reference_unit: Option<String>,
}

/// Family-specific BOM row, evaluated after the standard rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomRowDef {
    pub text: String,
    /// Formula for the quantity; empty means a text-only line
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FamilyFile {
    family: FamilyMeta,
    #[serde(default)]
    rows: Vec<SchemaRow>,
    #[serde(default)]
    bom: Vec<BomRowDef>,
}

/// A loaded product family
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductFamily {
    pub meta: FamilyMeta,
    pub schema: Schema,
    pub bom_rows: Vec<BomRowDef>,
    /// Rows left out of `schema` because they were invalid
    #[serde(skip)]
    pub load_errors: Vec<SchemaError>,
}

impl ProductFamily {
    pub fn new(meta: FamilyMeta, schema: Schema) -> Self {
        Self {
            meta,
            schema,
            bom_rows: Vec::new(),
            load_errors: Vec::new(),
        }
    }

    pub fn with_bom_rows(mut self, rows: Vec<BomRowDef>) -> Self {
        self.bom_rows = rows;
        self
    }

    /// Parse a family from TOML text.
    ///
    /// Invalid schema rows are left out and kept in `load_errors`; the
    /// remaining declarations load normally.
    pub fn from_toml(content: &str) -> Result<Self, FamilyFileError> {
        let file: FamilyFile = toml::from_str(content)?;
        let (schema, load_errors) = Schema::load_lenient(&file.rows);
        if !load_errors.is_empty() {
            tracing::warn!(
                family = %file.family.id,
                skipped = load_errors.len(),
                "family loaded with invalid rows"
            );
        }
        tracing::debug!(family = %file.family.id, rows = schema.len(), "family loaded");
        Ok(Self {
            meta: file.family,
            schema,
            bom_rows: file.bom,
            load_errors,
        })
    }

    /// Parse a family from TOML text, failing on any invalid schema row
    pub fn from_toml_strict(content: &str) -> Result<Self, FamilyFileError> {
        let family = Self::from_toml(content)?;
        if !family.load_errors.is_empty() {
            return Err(SchemaLoadError {
                errors: family.load_errors,
            }
            .into());
        }
        Ok(family)
    }

    /// Load a family file from disk, skipping invalid rows
    pub fn load_file(path: &Path) -> Result<Self, FamilyFileError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load a family file from disk, failing on any invalid row
    pub fn load_file_strict(path: &Path) -> Result<Self, FamilyFileError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_strict(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANOPY: &str = r#"
[family]
id = "canopy"
title = "Vordach"
reference_variable = "breite"
reference_unit = "m"

[[rows]]
kind = "Number"
label = "Breite (m)"
variable = "breite"
options = "2,5"

[[rows]]
kind = "Price"
label = "Preis"
variable = "preis"
formula = "breite * 480"

[[bom]]
text = "Wandanschlussprofil"
quantity = "breite"
unit = "m"
"#;

    #[test]
    fn test_from_toml() {
        let family = ProductFamily::from_toml(CANOPY).unwrap();
        assert_eq!(family.meta.id, "canopy");
        assert_eq!(family.meta.reference_variable.as_deref(), Some("breite"));
        assert_eq!(family.schema.len(), 2);
        assert_eq!(family.schema.get("breite").unwrap().default, Some(2.5));
        assert_eq!(family.bom_rows.len(), 1);
        assert_eq!(family.bom_rows[0].unit.as_deref(), Some("m"));
        assert!(family.load_errors.is_empty());
    }

    #[test]
    fn test_invalid_row_is_skipped_and_reported() {
        let bad_choice = r#"
[[rows]]
kind = "Choice"
label = "Farbe"
variable = "farbe"
options = ""
"#;
        let with_bad_choice = format!("{}{}", CANOPY, bad_choice);
        let family = ProductFamily::from_toml(&with_bad_choice).unwrap();

        assert_eq!(family.schema.len(), 2);
        assert!(family.schema.get("preis").is_some());
        assert!(family.schema.get("farbe").is_none());
        assert_eq!(
            family.load_errors,
            vec![SchemaError::EmptyOptions {
                row: 3,
                variable: "farbe".into()
            }]
        );
    }

    #[test]
    fn test_strict_load_fails_on_invalid_rows() {
        let broken = CANOPY.replace("formula = \"breite * 480\"", "");
        assert_eq!(ProductFamily::from_toml(&broken).unwrap().schema.len(), 1);

        match ProductFamily::from_toml_strict(&broken) {
            Err(FamilyFileError::Schema(err)) => {
                assert_eq!(err.errors.len(), 1);
                assert_eq!(err.errors[0].row(), 2);
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            ProductFamily::from_toml("[family\nid = 1"),
            Err(FamilyFileError::Toml(_))
        ));
    }
}
