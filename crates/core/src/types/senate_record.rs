use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::finding::HydraFinding;
use super::vote::Vote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SenateState {
    Pending,
    Authorized,
    NullVerdict,
    HydraOverride,
    Ungoverned,
    AwaitingAppeal,
}

/// The full result of one `Senate::convene` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenateRecord {
    pub state: SenateState,
    pub intent: String,
    pub proposal: Option<String>,
    pub adversary_report: Option<String>,
    pub findings: Vec<HydraFinding>,
    pub votes: Vec<Vote>,
    pub appealable: bool,
    pub metadata: HashMap<String, Value>,
}

impl SenateRecord {
    pub fn pending(intent: impl Into<String>) -> Self {
        Self {
            state: SenateState::Pending,
            intent: intent.into(),
            proposal: None,
            adversary_report: None,
            findings: Vec::new(),
            votes: Vec::new(),
            appealable: false,
            metadata: HashMap::new(),
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.state == SenateState::Authorized
    }
}
