use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{FaceError, Result};

/// Two-way mapping between dense label indices and identity strings.
///
/// Indices are handed out in the order labels are first registered, starting at 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LabelDictionary {
    labels: Vec<String>,
    indices: HashMap<String, usize>,
}

impl LabelDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of `label`, assigning the next free one if it is new.
    pub fn register(&mut self, label: &str) -> usize {
        if let Some(&index) = self.indices.get(label) {
            return index;
        }
        let index = self.labels.len();
        self.labels.push(label.to_string());
        self.indices.insert(label.to_string(), index);
        index
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.indices.get(label).copied()
    }

    /// Maps a label index back to its identity string.
    ///
    /// # Errors
    /// - `UnknownLabel` if the index was never registered
    pub fn resolve(&self, index: usize) -> Result<&str> {
        self.labels
            .get(index)
            .map(String::as_str)
            .ok_or(FaceError::UnknownLabel(index))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in index order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl TryFrom<Vec<String>> for LabelDictionary {
    type Error = FaceError;

    fn try_from(labels: Vec<String>) -> Result<Self> {
        let mut dictionary = Self::new();
        for label in &labels {
            if dictionary.index_of(label).is_some() {
                return Err(FaceError::InvalidParameter(format!(
                    "Duplicate label '{}' in dictionary",
                    label
                )));
            }
            dictionary.register(label);
        }
        Ok(dictionary)
    }
}

impl From<LabelDictionary> for Vec<String> {
    fn from(dictionary: LabelDictionary) -> Self {
        dictionary.labels
    }
}
