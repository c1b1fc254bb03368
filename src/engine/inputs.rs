//! Raw user input for one configured item

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// A value supplied by the input surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    /// Already-numeric Number input
    Number(f64),
    /// Number text (any locale) or a Choice label
    Text(String),
    /// MultiChoice labels
    Choices(Vec<String>),
}

/// Variable name -> raw input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inputs {
    values: AHashMap<String, InputValue>,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, variable: impl Into<String>, value: InputValue) -> &mut Self {
        self.values.insert(variable.into(), value);
        self
    }

    pub fn number(mut self, variable: impl Into<String>, value: f64) -> Self {
        self.set(variable, InputValue::Number(value));
        self
    }

    pub fn text(mut self, variable: impl Into<String>, text: impl Into<String>) -> Self {
        self.set(variable, InputValue::Text(text.into()));
        self
    }

    pub fn choose(self, variable: impl Into<String>, label: impl Into<String>) -> Self {
        self.text(variable, label)
    }

    pub fn choose_many<I, S>(mut self, variable: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels = labels.into_iter().map(Into::into).collect();
        self.set(variable, InputValue::Choices(labels));
        self
    }

    pub fn get(&self, variable: &str) -> Option<&InputValue> {
        self.values.get(variable)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
