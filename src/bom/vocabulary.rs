//! Variable names the BOM rules look for
//!
//! Families name their variables freely (often in German), so each rule
//! trigger is a list of aliases; the first alias bound in the environment
//! wins.

use serde::{Deserialize, Serialize};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Alias lists and fallback constants for the standard BOM rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BomVocabulary {
    /// Total run length in metres
    pub length: Vec<String>,
    /// Maximum distance between posts in metres
    pub post_spacing: Vec<String>,
    /// Non-zero when posts are set in concrete
    pub concrete_mount: Vec<String>,
    pub bags_per_post: Vec<String>,
    pub corners: Vec<String>,
    pub roof_width: Vec<String>,
    pub roof_depth: Vec<String>,
    /// Number of horizontal rail rows
    pub rail_rows: Vec<String>,
    /// Glass panel height in metres
    pub glass_height: Vec<String>,
    /// Floor-to-floor height of a staircase in metres
    pub floor_height: Vec<String>,
    pub riser_height: Vec<String>,

    /// Concrete bags per post when the family declares none
    pub default_bags_per_post: f64,
    /// Stair riser height in metres when the family declares none
    pub default_riser_height: f64,
}

impl Default for BomVocabulary {
    fn default() -> Self {
        Self {
            length: names(&["laenge", "laenge_gesamt", "length", "L"]),
            post_spacing: names(&["steher_abstand", "post_spacing", "spacing"]),
            concrete_mount: names(&["einbetonieren", "betoniert", "concrete_mount"]),
            bags_per_post: names(&["saecke_pro_steher", "bags_per_post"]),
            corners: names(&["ecken", "corners"]),
            roof_width: names(&["dach_breite", "breite", "roof_width", "width"]),
            roof_depth: names(&["dach_tiefe", "tiefe", "ausladung", "roof_depth", "depth"]),
            rail_rows: names(&["reihen", "querstaebe", "rail_rows"]),
            glass_height: names(&["glas_hoehe", "glass_height"]),
            floor_height: names(&["geschosshoehe", "floor_height"]),
            riser_height: names(&["steigung", "riser_height"]),
            default_bags_per_post: 2.0,
            default_riser_height: 0.18,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let vocab: BomVocabulary = toml::from_str(
            r#"
length = ["lfm"]
default_bags_per_post = 3.0
"#,
        )
        .unwrap();

        assert_eq!(vocab.length, vec!["lfm".to_string()]);
        assert_eq!(vocab.default_bags_per_post, 3.0);
        assert_eq!(vocab.corners, BomVocabulary::default().corners);
        assert_eq!(vocab.default_riser_height, 0.18);
    }
}
