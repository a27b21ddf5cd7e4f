//! The single orchestrator. Holds the only writer handle the Chronicle ever
//! issues, drives the Senate, and persists every terminal outcome before
//! returning it.

use std::sync::Arc;

use chrono::Utc;
use rand::RngCore;
use serde_json::{json, Value};

use crate::chronicle::Chronicle;
use crate::events::{DeliberationEvent, DeliberationSink, NullSink};
use crate::senate::Senate;
use crate::types::{
    AppealRecord, AppealStatus, ChronicleHandle, Mission, NullVerdictRecord, PrecedentRecord, Ruling, RuntimeError,
    RuntimeResult, SenateState, Vote,
};

fn random_hex8() -> String {
    let mut bytes = [0u8; 4];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex_encode(&bytes)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn case_id(prefix: &str) -> String {
    let date = chrono::Local::now().format("%Y-%m-%d");
    format!("{prefix}-{date}-{}", random_hex8())
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MissionOutcome {
    pub mission: String,
    pub case_id: String,
    pub status: String,
    pub artifact: Option<Value>,
    pub verdict: Ruling,
    pub message: Option<String>,
    pub test_results: Value,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct AppealOutcome {
    pub appeal_id: String,
    pub original_case_id: String,
    pub status: AppealStatus,
    pub liability_multiplier: f64,
    pub new_ruling: Ruling,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct UngovernedOutcome {
    pub case_id: String,
    pub watermark: Value,
    pub ruling: Ruling,
}

/// Constructed once per process (or once per CLI invocation); holds the
/// Chronicle's sole writer handle for its entire lifetime.
pub struct Elder {
    chronicle: Arc<Chronicle>,
    senate: Senate,
    writer_handle: ChronicleHandle,
    sink: Arc<dyn DeliberationSink>,
}

impl Elder {
    pub async fn new(chronicle: Arc<Chronicle>, senate: Senate) -> RuntimeResult<Self> {
        let writer_handle = chronicle
            .get_writer_handle("ELDER")
            .map_err(RuntimeError::Chronicle)?;
        Ok(Self { chronicle, senate, writer_handle, sink: Arc::new(NullSink) })
    }

    pub fn with_sink(mut self, sink: Arc<dyn DeliberationSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn chronicle(&self) -> &Chronicle {
        &self.chronicle
    }

    pub async fn run_mission(&self, mission: Mission, shadow_mode: bool) -> RuntimeResult<MissionOutcome> {
        self.sink.emit(DeliberationEvent::SenateConvening { mission: mission.text.clone() });

        let record = self.senate.convene(&mission, false).await;

        match record.state {
            SenateState::Authorized => {
                let id = case_id("CASE");
                if !shadow_mode {
                    let precedent = PrecedentRecord {
                        case_id: id.clone(),
                        question: mission.text.clone(),
                        context_vector: None,
                        deliberation: record.votes.clone(),
                        verdict: json!({ "ruling": Ruling::Approved.label() }),
                        appeal_history: Vec::new(),
                    };
                    self.chronicle
                        .write_precedent(precedent, &self.writer_handle)
                        .await
                        .map_err(RuntimeError::Chronicle)?;
                }
                self.sink.emit(DeliberationEvent::MissionApproved { case_id: id.clone() });

                Ok(MissionOutcome {
                    mission: mission.text,
                    case_id: id,
                    status: "APPROVED".to_string(),
                    artifact: Some(json!({
                        "code": record.proposal,
                        "adversary_report": record.adversary_report,
                    })),
                    verdict: Ruling::Approved,
                    message: None,
                    test_results: json!({ "status": "PASSED" }),
                })
            }
            _ => {
                let id = case_id("NULL");
                let (nulling_agents, reason_codes) = nulling_agents_and_reasons(&record.votes);
                let context_summary = reason_codes.join("; ");

                let ruling = if record.state == SenateState::HydraOverride {
                    Ruling::HydraOverride { findings_count: record.findings.len(), summary: context_summary.clone() }
                } else {
                    Ruling::NullVerdict {
                        nulling_agents: nulling_agents.clone(),
                        reason_codes: reason_codes.clone(),
                        context_summary: context_summary.clone(),
                    }
                };

                if !shadow_mode {
                    let null_verdict = NullVerdictRecord {
                        case_id: id.clone(),
                        mission: mission.text.clone(),
                        nulling_agents: nulling_agents.clone(),
                        reason_codes: reason_codes.clone(),
                        context_summary: context_summary.clone(),
                        timestamp: Utc::now(),
                        verdict_type: ruling.label().to_string(),
                    };
                    // Persistence must succeed before MISSION_REFUSED is emitted: a
                    // refusal the caller cannot see logged must not look refused.
                    self.chronicle
                        .persist_null_verdict(&null_verdict, &self.writer_handle)
                        .await
                        .map_err(RuntimeError::Chronicle)?;
                }
                self.sink.emit(DeliberationEvent::MissionRefused { case_id: id.clone() });

                Ok(MissionOutcome {
                    mission: mission.text,
                    case_id: id,
                    status: "STOP_WORK_ORDER".to_string(),
                    artifact: None,
                    verdict: ruling,
                    message: Some(context_summary),
                    test_results: json!({ "status": "FAILED" }),
                })
            }
        }
    }

    pub async fn process_appeal(
        &self,
        original_case_id: &str,
        expanded_context: Value,
        constraint_changes: Value,
        appellant_reason: &str,
    ) -> RuntimeResult<AppealOutcome> {
        let original = self
            .chronicle
            .get_case_by_id(original_case_id)
            .await
            .ok_or_else(|| RuntimeError::CaseNotFound { case_id: original_case_id.to_string() })?;

        let appeal_depth = self.chronicle.get_appeal_count(original_case_id).await as u32 + 1;
        let liability_multiplier = AppealRecord::liability_multiplier_for(appeal_depth);

        let _citation = self.chronicle.cite_precedent(original_case_id).await;
        let chronicle_citations = vec![original_case_id.to_string()];

        let expanded_mission_text = format!(
            "{question}\n\nORIGINAL DELIBERATION SUMMARY: {deliberation_count} votes, ruling {original_ruling}\n\nEXPANDED CONTEXT: {expanded_context}\n\nCONSTRAINT CHANGES: {constraint_changes}\n\nAPPELLANT REASON: {appellant_reason}\n\nRE-EVALUATION REQUIRED: {question}",
            question = original.question,
            deliberation_count = original.deliberation.len(),
            original_ruling = original.verdict,
            expanded_context = expanded_context,
            constraint_changes = constraint_changes,
            appellant_reason = appellant_reason,
        );
        let expanded_mission = Mission::new(expanded_mission_text);

        // Re-convening cannot bypass the pre-checker or the binding rule.
        let record = self.senate.convene(&expanded_mission, false).await;

        let (nulling_agents, reason_codes) = nulling_agents_and_reasons(&record.votes);
        let new_ruling_enum = match record.state {
            SenateState::Authorized => Ruling::Approved,
            SenateState::HydraOverride => {
                Ruling::HydraOverride { findings_count: record.findings.len(), summary: reason_codes.join("; ") }
            }
            _ => Ruling::NullVerdict {
                nulling_agents: nulling_agents.clone(),
                reason_codes: reason_codes.clone(),
                context_summary: reason_codes.join("; "),
            },
        };
        let new_ruling_value = serde_json::to_value(&new_ruling_enum).unwrap_or(Value::Null);
        let original_label = original.verdict.get("ruling").and_then(Value::as_str).unwrap_or("");
        let new_label = new_ruling_enum.label();
        let new_is_approved = new_label == Ruling::Approved.label();

        let status = if original_label == new_label {
            AppealStatus::Upheld
        } else if new_is_approved {
            AppealStatus::Overturned
        } else {
            AppealStatus::Modified
        };

        let appeal_id = case_id("APPEAL");
        let appeal = AppealRecord {
            appeal_id: appeal_id.clone(),
            original_case_id: original_case_id.to_string(),
            original_ruling: original.verdict.clone(),
            original_deliberation: original.deliberation.clone(),
            expanded_context,
            constraint_changes,
            appellant_reason: appellant_reason.to_string(),
            new_deliberation: record.votes.clone(),
            new_ruling: new_ruling_value,
            chronicle_citations,
            timestamp: Utc::now(),
            appeal_depth,
            liability_multiplier,
            status,
        };

        self.chronicle
            .persist_appeal(appeal, &self.writer_handle)
            .await
            .map_err(RuntimeError::Chronicle)?;

        Ok(AppealOutcome {
            appeal_id,
            original_case_id: original_case_id.to_string(),
            status,
            liability_multiplier,
            new_ruling: new_ruling_enum,
        })
    }

    pub async fn invoke_article_50(&self, mission: Mission) -> RuntimeResult<UngovernedOutcome> {
        let id = case_id("CASE-VOID");
        let watermark = json!({
            "zone": "UNGOVERNED",
            "article": "Article 50: Martial Governance",
            "liability": "KEEPER",
            "constitutional_protection": false,
            "senate_reviewed": false,
            "timestamp": Utc::now().to_rfc3339(),
            "quarantine_path": "ungoverned/",
            "warning": "This artifact bypassed all constitutional review. The invoking party assumes full liability.",
        });
        let ruling = Ruling::Ungoverned { watermark: watermark.clone() };

        let precedent = PrecedentRecord {
            case_id: id.clone(),
            question: mission.text,
            context_vector: None,
            deliberation: Vec::new(),
            verdict: json!({
                "ruling": ruling.label(),
                "principle_cited": "Article 50: Martial Governance",
                "watermark": watermark,
            }),
            appeal_history: Vec::new(),
        };
        self.chronicle
            .write_precedent(precedent, &self.writer_handle)
            .await
            .map_err(RuntimeError::Chronicle)?;

        Ok(UngovernedOutcome { case_id: id, watermark, ruling })
    }
}

fn nulling_agents_and_reasons(votes: &[Vote]) -> (Vec<String>, Vec<String>) {
    let mut agents = Vec::new();
    let mut reasons = Vec::new();
    for vote in votes {
        if vote.verdict == crate::types::Verdict::Veto {
            agents.push(format!("{:?}", vote.agent));
            reasons.push(vote.reasoning.clone());
        }
    }
    (agents, reasons)
}
