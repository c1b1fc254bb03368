//! Variable bindings for one evaluated configuration.

use ahash::AHashMap;
use serde::Serialize;

/// Variable name -> value bindings for a single line-item evaluation.
///
/// Built fresh per evaluation pass and never shared between items.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Environment {
    values: AHashMap<String, f64>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable, replacing any previous value
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// First bound name out of a list of aliases, with its value
    pub fn first_of<'a>(&self, names: &'a [String]) -> Option<(&'a str, f64)> {
        names
            .iter()
            .find_map(|name| self.get(name).map(|value| (name.as_str(), value)))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Environment {
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        let mut env = Environment::new();
        for (name, value) in iter {
            env.insert(name, value);
        }
        env
    }
}
