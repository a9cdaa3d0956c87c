use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// Categories that are always present in an analysis, `null` when the prompt names none.
pub const CORE_CATEGORIES: [&str; 5] = ["setting", "activity", "clothing", "objects", "decor"];

/// Categories the analysis may add when the prompt mentions them.
pub const EXTENDED_CATEGORIES: [&str; 7] = [
    "mood",
    "time_of_day",
    "weather",
    "ability",
    "companion",
    "size",
    "quantity",
];

/// Scene elements extracted from a free-text prompt.
///
/// `subjects` is never empty once an analysis has produced the map. Every other
/// category, including ad-hoc ones the model invents, lives in `categories`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementMap {
    pub subjects: Vec<String>,
    #[serde(flatten)]
    pub categories: Map<String, Value>,
}

impl ElementMap {
    pub fn new(subjects: Vec<String>) -> Self {
        let mut map = Self {
            subjects,
            categories: Map::new(),
        };
        map.fill_core_categories();
        map
    }

    /// Map used when the analysis reply cannot be trusted: the raw prompt becomes the only subject.
    pub fn fallback(prompt: &str) -> Self {
        Self::new(vec![prompt.to_string()])
    }

    pub fn get(&self, category: &str) -> Option<&Value> {
        self.categories.get(category)
    }

    pub fn fill_core_categories(&mut self) {
        for category in CORE_CATEGORIES {
            self.categories
                .entry(category.to_string())
                .or_insert(Value::Null);
        }
    }

    pub fn to_compact_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
