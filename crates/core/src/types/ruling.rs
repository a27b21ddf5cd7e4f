use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The boundary-facing shape of a mission's outcome. Replaces the dynamic,
/// runtime-sniffed verdict dictionaries of the system this gateway descends
/// from with a single tagged sum, converted to JSON exactly once at the edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Ruling {
    Approved,
    NullVerdict {
        nulling_agents: Vec<String>,
        reason_codes: Vec<String>,
        context_summary: String,
    },
    HydraOverride {
        findings_count: usize,
        summary: String,
    },
    Ungoverned {
        watermark: Value,
    },
}

impl Ruling {
    pub fn label(&self) -> &'static str {
        match self {
            Ruling::Approved => "APPROVED",
            Ruling::NullVerdict { .. } => "NULL_VERDICT",
            Ruling::HydraOverride { .. } => "HYDRA_OVERRIDE",
            Ruling::Ungoverned { .. } => "UNGOVERNED",
        }
    }
}
