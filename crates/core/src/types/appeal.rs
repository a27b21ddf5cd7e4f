use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::vote::Vote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AppealStatus {
    Upheld,
    Overturned,
    Modified,
}

/// A context-expanded re-run against an existing precedent. Never mutates
/// the original record's content; only appends its own id to its history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppealRecord {
    pub appeal_id: String,
    pub original_case_id: String,
    pub original_ruling: Value,
    pub original_deliberation: Vec<Vote>,
    pub expanded_context: Value,
    pub constraint_changes: Value,
    pub appellant_reason: String,
    pub new_deliberation: Vec<Vote>,
    pub new_ruling: Value,
    pub chronicle_citations: Vec<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub appeal_depth: u32,
    pub liability_multiplier: f64,
    pub status: AppealStatus,
}

impl AppealRecord {
    /// `liability_multiplier = 1.5 ^ appeal_depth`, escalating with every
    /// successive appeal against the same case.
    pub fn liability_multiplier_for(depth: u32) -> f64 {
        1.5f64.powi(depth as i32)
    }
}
