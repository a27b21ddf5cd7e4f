use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::vote::Vote;

/// A persisted mission outcome. Once written, every field except
/// `appeal_history` is immutable for the lifetime of the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrecedentRecord {
    pub case_id: String,
    pub question: String,
    /// Reserved for a future semantic index; unused by the keyword-overlap
    /// retrieval this gateway ships with.
    #[serde(default)]
    pub context_vector: Option<Value>,
    pub deliberation: Vec<Vote>,
    pub verdict: Value,
    #[serde(default)]
    pub appeal_history: Vec<String>,
}

impl PrecedentRecord {
    pub fn question_tokens(&self) -> Vec<String> {
        self.question
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect()
    }
}

/// A refusal, persisted through the same store as an approved precedent so
/// that refusals are first-class case law rather than unlogged side effects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NullVerdictRecord {
    pub case_id: String,
    pub mission: String,
    pub nulling_agents: Vec<String>,
    pub reason_codes: Vec<String>,
    pub context_summary: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(default = "default_verdict_type")]
    pub verdict_type: String,
}

fn default_verdict_type() -> String {
    "NULL_VERDICT".to_string()
}

impl NullVerdictRecord {
    /// The view persisted into the Chronicle's precedent store.
    pub fn as_precedent(&self) -> PrecedentRecord {
        PrecedentRecord {
            case_id: self.case_id.clone(),
            question: self.mission.clone(),
            context_vector: None,
            deliberation: Vec::new(),
            verdict: serde_json::json!({
                "ruling": self.verdict_type,
                "nulling_agents": self.nulling_agents,
                "reason_codes": self.reason_codes,
                "context_summary": self.context_summary,
            }),
            appeal_history: Vec::new(),
        }
    }
}
