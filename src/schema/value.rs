//! Numeric literal normalization
//!
//! Spreadsheet cells and form fields arrive as text in either German
//! (`1.234,50`) or English (`1,234.50`) notation.

use serde::Serialize;
use std::fmt;

/// Non-fatal notice that a literal could not be read as a number
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub text: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not read '{}' as a number, using 0", self.text)
    }
}

/// Parse a numeric literal, accepting `.` or `,` as the decimal separator.
///
/// Unreadable input yields `0.0` together with a warning.
pub fn parse_number(text: &str) -> (f64, Option<ParseWarning>) {
    match normalize(text).and_then(|s| s.parse::<f64>().ok()) {
        Some(value) if value.is_finite() => (value, None),
        _ => {
            let warning = ParseWarning {
                text: text.to_string(),
            };
            tracing::warn!("{}", warning);
            (0.0, Some(warning))
        }
    }
}

/// Strict variant used where a bad literal must not turn into zero
pub fn try_parse_number(text: &str) -> Result<f64, ParseWarning> {
    match parse_number(text) {
        (value, None) => Ok(value),
        (_, Some(warning)) => Err(warning),
    }
}

/// Rewrite a literal into the form `f64::from_str` understands
fn normalize(text: &str) -> Option<String> {
    let compact: String = text
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\'' && *c != '_')
        .collect();

    if compact.is_empty() {
        return None;
    }

    // Only signs, digits and separators; this also rules out "inf"/"NaN"
    let body = compact.trim_start_matches(['+', '-']);
    if body.len() + 1 < compact.len()
        || body.is_empty()
        || !body.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
    {
        return None;
    }

    let commas = body.matches(',').count();
    let dots = body.matches('.').count();

    let normalized = match (commas, dots) {
        (0, 0) => compact.clone(),
        // Both present: whichever comes last is the decimal separator
        (_, _) if commas > 0 && dots > 0 => {
            let last_comma = compact.rfind(',')?;
            let last_dot = compact.rfind('.')?;
            if last_comma > last_dot {
                if commas > 1 {
                    return None;
                }
                compact.replace('.', "").replace(',', ".")
            } else {
                if dots > 1 {
                    return None;
                }
                compact.replace(',', "")
            }
        }
        (1, 0) => compact.replace(',', "."),
        (_, 0) => grouped_thousands(&compact, ',')?,
        (0, 1) => compact.clone(),
        (0, _) => grouped_thousands(&compact, '.')?,
        _ => return None,
    };

    Some(normalized)
}

/// `1.234.567` -> `1234567`, rejecting groups that are not three digits
fn grouped_thousands(text: &str, separator: char) -> Option<String> {
    let mut groups = text.split(separator);
    let head = groups.next()?;
    if head.trim_start_matches(['+', '-']).is_empty() {
        return None;
    }
    let mut out = head.to_string();
    for group in groups {
        if group.len() != 3 {
            return None;
        }
        out.push_str(group);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(text: &str) -> f64 {
        let (value, warning) = parse_number(text);
        assert!(warning.is_none(), "unexpected warning for {:?}", text);
        value
    }

    #[test]
    fn test_plain_numbers() {
        assert_eq!(value("42"), 42.0);
        assert_eq!(value("  3.5 "), 3.5);
        assert_eq!(value("-12"), -12.0);
        assert_eq!(value("+0.25"), 0.25);
    }

    #[test]
    fn test_comma_decimal() {
        assert_eq!(value("1,90"), 1.9);
        assert_eq!(value("0,5"), 0.5);
    }

    #[test]
    fn test_german_and_english_grouping_agree() {
        assert_eq!(value("1.234,50"), value("1234.50"));
        assert_eq!(value("1,234.50"), 1234.5);
        assert_eq!(value("1.234.567"), 1_234_567.0);
        assert_eq!(value("1 234,5"), 1234.5);
        assert_eq!(value("1'234.5"), 1234.5);
    }

    #[test]
    fn test_unparseable_input_yields_zero_with_warning() {
        for text in ["", "   ", "abc", "12a", "inf", "NaN", "1,2,3,4", "1.23.4", "--5", "1,2.3,4"] {
            let (value, warning) = parse_number(text);
            assert_eq!(value, 0.0, "value for {:?}", text);
            assert_eq!(
                warning,
                Some(ParseWarning {
                    text: text.to_string()
                }),
                "warning for {:?}",
                text
            );
        }
    }

    #[test]
    fn test_try_parse_number() {
        assert_eq!(try_parse_number("2,5"), Ok(2.5));
        assert!(try_parse_number("zwei").is_err());
    }
}
