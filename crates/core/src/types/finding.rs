use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Critical,
}

/// A security concern extracted from the adversary's report by pattern match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydraFinding {
    pub pattern: String,
    pub excerpt: String,
    pub severity: Severity,
}

impl HydraFinding {
    /// Dedup key: the first 50 characters of the excerpt, matching the reference
    /// deduplication rule (two findings quoting the same surrounding text collapse).
    pub fn dedup_key(&self) -> String {
        self.excerpt.chars().take(50).collect()
    }
}
