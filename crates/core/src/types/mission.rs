use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A natural-language engineering request. Immutable once accepted by the Senate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    pub text: String,
    #[serde(default)]
    pub context: HashMap<String, Value>,
}

impl Mission {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context: HashMap::new(),
        }
    }

    pub fn with_context(text: impl Into<String>, context: HashMap<String, Value>) -> Self {
        Self {
            text: text.into(),
            context,
        }
    }
}

impl From<&str> for Mission {
    fn from(text: &str) -> Self {
        Mission::new(text)
    }
}

impl From<String> for Mission {
    fn from(text: String) -> Self {
        Mission::new(text)
    }
}
