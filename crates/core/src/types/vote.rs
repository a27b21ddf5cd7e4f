use serde::{Deserialize, Serialize};

/// Which agent cast a vote at a given Senate stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Agent {
    PreChecker,
    FinalJudge,
    /// Synthetic vote appended by the binding rule, never by a model.
    Override,
}

/// The outcome an agent attached to its vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Authorize,
    Veto,
    Abstain,
}

/// A single recorded vote in a `SenateRecord`'s deliberation trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub agent: Agent,
    pub verdict: Verdict,
    pub reasoning: String,
    pub confidence: f64,
    #[serde(default)]
    pub findings_cited: bool,
}

impl Vote {
    pub fn new(agent: Agent, verdict: Verdict, reasoning: impl Into<String>, confidence: f64) -> Self {
        Self {
            agent,
            verdict,
            reasoning: reasoning.into(),
            confidence: confidence.clamp(0.0, 1.0),
            findings_cited: false,
        }
    }
}
