//! The deliberation state machine: pre-check, forge, adversary, final
//! judgment, and the constitutional override that binds the final judge to
//! whatever the adversary found.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use crate::events::{DeliberationEvent, DeliberationSink, NullSink};
use crate::reasoner::{Reasoner, Role, ThinkOptions, ThinkResponse};
use crate::types::{Agent, HydraFinding, Mission, SenateRecord, SenateState, Severity, Verdict, Vote};

const PRECHECK_SYSTEM_PROMPT: &str =
    "You are the pre-check auditor. Decide ALLOW or BLOCK for the requested mission before any code is written.";
const FORGE_SYSTEM_PROMPT: &str =
    "You are the forger. Produce a code artifact satisfying the mission.";
const ADVERSARY_SYSTEM_PROMPT: &str =
    "You are the adversary. Attempt to find exploitable flaws in the proposal.";
const FINAL_SYSTEM_PROMPT: &str =
    "You are the final judge. AUTHORIZE or VETO the proposal given the adversary's report.";

/// Keyword scan that flips a mission into governance mode, rerouting the
/// forger to the backstop endpoint.
const GOVERNANCE_KEYWORDS: &[&str] = &[
    "refusal", "override", "constitution", "system prompt", "security", "auth", "permission",
    "ban", "delete", "destroy",
];

struct FindingPattern {
    id: &'static str,
    regex: Regex,
}

static FINDING_PATTERNS: Lazy<Vec<FindingPattern>> = Lazy::new(|| {
    let raw: &[(&str, &str)] = &[
        ("exploit_demonstrated", r"(?i)exploit\s+demonstrated"),
        ("vulnerability_confirmed", r"(?i)vulnerability\s+confirmed"),
        ("attack_vector_identified", r"(?i)attack\s+vector\s+identified"),
        ("security_flaw_found", r"(?i)security\s+flaw\s+found"),
        ("injection_possible", r"(?i)injection\s+possible"),
        ("authentication_bypass", r"(?i)authentication\s+bypass"),
        ("privilege_escalation", r"(?i)privilege\s+escalation"),
        ("remote_code_execution", r"(?i)remote\s+code\s+execution"),
        ("sql_injection", r"(?i)sql\s+injection"),
        ("xss_vulnerability", r"(?i)xss\s+vulnerability"),
        ("path_traversal", r"(?i)path\s+traversal"),
        ("buffer_overflow", r"(?i)buffer\s+overflow"),
        ("race_condition_exploitable", r"(?i)race\s+condition\s+exploitable"),
        ("critical_colon", r"(?i)critical\s*:"),
        ("high_severity", r"(?i)high\s+severity"),
        ("cvss_high", r"(?i)cvss\s*[:\s]*\s*[789]"),
    ];
    raw.iter()
        .map(|(id, pattern)| FindingPattern { id, regex: Regex::new(pattern).expect("static finding pattern") })
        .collect()
});

static ACKNOWLEDGMENT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    let raw: &[&str] = &[
        r"(?i)accept(?:ing|ed)?\s+(?:the\s+)?risk",
        r"(?i)acknowledge(?:d|s)?\s+(?:the\s+)?(?:security\s+)?risk",
        r"(?i)risk\s+accepted",
        r"(?i)aware\s+of\s+(?:the\s+)?vulnerability",
        r"(?i)despite\s+(?:the\s+)?(?:security\s+)?(?:risk|concern|finding)",
        r"(?i)hydra\s+finding[s]?\s+(?:noted|acknowledged|accepted)",
        r"(?i)proceeding\s+with\s+(?:known\s+)?risk",
        r"(?i)mitigat(?:ed|ion)\s+(?:in\s+place|applied|sufficient)",
    ];
    raw.iter().map(|p| Regex::new(p).expect("static acknowledgment pattern")).collect()
});

fn severity_for(pattern_id: &str) -> Severity {
    const CRITICAL_MARKERS: &[&str] = &["exploit", "injection", "bypass", "execution"];
    if CRITICAL_MARKERS.iter().any(|m| pattern_id.contains(m)) {
        Severity::Critical
    } else {
        Severity::High
    }
}

fn classify_governance_mode(mission_text: &str) -> bool {
    let lower = mission_text.to_lowercase();
    GOVERNANCE_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

fn extract_findings(report: &str) -> Vec<HydraFinding> {
    let mut seen = std::collections::HashSet::new();
    let mut findings = Vec::new();
    for fp in FINDING_PATTERNS.iter() {
        for m in fp.regex.find_iter(report) {
            let start = m.start().saturating_sub(40);
            let end = (m.end() + 40).min(report.len());
            let excerpt: String = report[start..end].to_string();
            let finding = HydraFinding {
                pattern: fp.id.to_string(),
                excerpt,
                severity: severity_for(fp.id),
            };
            let key = finding.dedup_key();
            if seen.insert(key) {
                findings.push(finding);
            }
        }
    }
    findings
}

fn acknowledges_findings(reasoning: &str) -> bool {
    ACKNOWLEDGMENT_PATTERNS.iter().any(|re| re.is_match(reasoning))
}

fn text_field<'a>(resp: &'a ThinkResponse, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| resp.get(*k)).and_then(Value::as_str)
}

fn is_failure_response(resp: &ThinkResponse) -> bool {
    resp.get("status").and_then(Value::as_str) == Some("FAILED") || resp.contains_key("error")
}

/// Convert a raw model response into a vote, fail-closed on error/unparseable
/// shapes: a Reasoner failure at pre-check or final stage is never allowed
/// to default to authorization.
fn parse_vote(resp: &ThinkResponse, agent: Agent) -> Vote {
    if is_failure_response(resp) {
        let reason = text_field(resp, &["error"]).unwrap_or("unknown reasoner failure");
        return Vote::new(agent, Verdict::Veto, format!("System Error during Audit: {reason}"), 1.0);
    }

    let verdict_text = text_field(resp, &["vote", "verdict"]).unwrap_or("").to_uppercase();
    let verdict = match verdict_text.as_str() {
        "AUTHORIZE" | "ALLOW" => Verdict::Authorize,
        "VETO" | "BLOCK" | "NULL" => Verdict::Veto,
        _ => Verdict::Veto,
    };
    let reasoning = text_field(resp, &["reasoning", "reason", "explanation"]).unwrap_or("").to_string();
    let confidence = resp.get("confidence").and_then(Value::as_f64).unwrap_or(0.8);
    Vote::new(agent, verdict, reasoning, confidence)
}

fn extract_proposal(resp: &ThinkResponse) -> String {
    if let Some(code) = resp.get("code").and_then(Value::as_str) {
        return code.to_string();
    }
    serde_json::to_string(resp).unwrap_or_default()
}

fn vote_json(vote: &Vote) -> Value {
    serde_json::to_value(vote).unwrap_or(Value::Null)
}

/// Result of applying the Hydra binding rule: whether a synthetic override
/// vote was appended, and that vote if so.
struct BindingOutcome {
    override_fired: bool,
    override_vote: Option<Vote>,
}

fn apply_binding_rule(final_vote: &mut Vote, findings: &[HydraFinding]) -> BindingOutcome {
    if findings.is_empty() || final_vote.verdict == Verdict::Veto {
        return BindingOutcome { override_fired: false, override_vote: None };
    }

    if acknowledges_findings(&final_vote.reasoning) {
        final_vote.findings_cited = true;
        return BindingOutcome { override_fired: false, override_vote: None };
    }

    let patterns: Vec<&str> = findings.iter().map(|f| f.pattern.as_str()).collect();
    let preview: String = final_vote.reasoning.chars().take(200).collect();
    let reasoning = format!(
        "HYDRA BINDING OVERRIDE: Onyx attempted to AUTHORIZE without acknowledging {} security finding(s). Patterns: [{}]. Original reasoning: {}…",
        findings.len(),
        patterns.join("; "),
        preview
    );
    let override_vote = Vote::new(Agent::Override, Verdict::Veto, reasoning, 1.0);
    BindingOutcome { override_fired: true, override_vote: Some(override_vote) }
}

pub struct Senate {
    reasoner: Arc<dyn Reasoner>,
    sink: Arc<dyn DeliberationSink>,
}

impl Senate {
    pub fn new(reasoner: Arc<dyn Reasoner>) -> Self {
        Self { reasoner, sink: Arc::new(NullSink) }
    }

    pub fn with_sink(reasoner: Arc<dyn Reasoner>, sink: Arc<dyn DeliberationSink>) -> Self {
        Self { reasoner, sink }
    }

    pub async fn convene(&self, mission: &Mission, allow_ungoverned: bool) -> SenateRecord {
        let mut record = SenateRecord::pending(mission.text.clone());

        if allow_ungoverned {
            tracing::info!("martial law short-circuit; zero reasoner calls");
            record.state = SenateState::Ungoverned;
            record.metadata.insert("martial_law".to_string(), json!(true));
            return record;
        }

        // Stage 1: pre-check
        self.sink.emit(DeliberationEvent::OnyxPrecheckStart);
        let precheck_resp = self
            .reasoner
            .think(Role::PreCheck, PRECHECK_SYSTEM_PROMPT, &mission.text, ThinkOptions::default())
            .await;
        let precheck_vote = match precheck_resp {
            Ok(resp) => parse_vote(&resp, Agent::PreChecker),
            Err(e) => Vote::new(Agent::PreChecker, Verdict::Veto, format!("System Error during Audit: {e}"), 1.0),
        };
        self.sink.emit(DeliberationEvent::OnyxPrecheckComplete { vote: vote_json(&precheck_vote) });

        if precheck_vote.verdict == Verdict::Veto {
            self.sink.emit(DeliberationEvent::OnyxPrecheckVeto { vote: vote_json(&precheck_vote) });
            record.votes.push(precheck_vote);
            record.state = SenateState::NullVerdict;
            record.appealable = true;
            return record;
        }
        record.votes.push(precheck_vote);

        // Stage 2: governance-mode classification (affects forge routing only)
        let governance_mode = classify_governance_mode(&mission.text);

        // Stage 3: forge
        self.sink.emit(DeliberationEvent::IgnisForgeStart);
        let forge_opts = ThinkOptions { governance_mode, ..Default::default() };
        let forge_resp = self
            .reasoner
            .think(Role::Forge, FORGE_SYSTEM_PROMPT, &mission.text, forge_opts)
            .await
            .unwrap_or_else(|e| {
                let mut stub = serde_json::Map::new();
                stub.insert("code".to_string(), json!(format!("// forge failed: {e}")));
                stub
            });
        let proposal = extract_proposal(&forge_resp);
        self.sink.emit(DeliberationEvent::IgnisForgeComplete {
            proposal_len: proposal.len(),
            preview: proposal.chars().take(256).collect(),
        });
        record.proposal = Some(proposal.clone());

        // Stage 4: adversary, skipped for trivially small proposals
        let (adversary_report, findings) = if proposal.chars().count() <= 100 {
            let reason = "Skipped (proposal too small)".to_string();
            self.sink.emit(DeliberationEvent::HydraSkipped { reason: reason.clone() });
            (reason, Vec::new())
        } else {
            self.sink.emit(DeliberationEvent::HydraStart);
            let resp = self
                .reasoner
                .think(Role::Adversary, ADVERSARY_SYSTEM_PROMPT, &proposal, ThinkOptions::default())
                .await
                .unwrap_or_default();
            let report = serde_json::to_string(&resp).unwrap_or_default();
            let findings = extract_findings(&report);
            self.sink.emit(DeliberationEvent::HydraComplete { findings_count: findings.len() });
            (report, findings)
        };
        record.adversary_report = Some(adversary_report.clone());
        record.findings = findings;

        // Stage 5: final judgment
        self.sink.emit(DeliberationEvent::OnyxFinalStart);
        let final_context = build_final_context(&proposal, &adversary_report, &record.findings);
        let final_resp = self
            .reasoner
            .think(Role::Final, FINAL_SYSTEM_PROMPT, &final_context, ThinkOptions::default())
            .await;
        let mut final_vote = match final_resp {
            Ok(resp) => parse_vote(&resp, Agent::FinalJudge),
            Err(e) => Vote::new(Agent::FinalJudge, Verdict::Veto, format!("System Error during Audit: {e}"), 1.0),
        };
        self.sink.emit(DeliberationEvent::OnyxFinalComplete { vote: vote_json(&final_vote) });

        // Stage 6: binding-rule override, then terminal state
        let final_verdict_was_authorize = final_vote.verdict == Verdict::Authorize;
        let binding = apply_binding_rule(&mut final_vote, &record.findings);
        record.votes.push(final_vote);

        if binding.override_fired {
            let override_vote = binding.override_vote.expect("override_fired implies a vote");
            self.sink.emit(DeliberationEvent::HydraOverrideTriggered { unacknowledged_count: record.findings.len() });
            record.votes.push(override_vote);
            record.state = SenateState::HydraOverride;
            record.appealable = true;
        } else if final_verdict_was_authorize {
            record.state = SenateState::Authorized;
        } else {
            record.state = SenateState::NullVerdict;
            record.appealable = true;
        }

        record
    }
}

fn build_final_context(proposal: &str, adversary_report: &str, findings: &[HydraFinding]) -> String {
    let mut context = format!("PROPOSAL:\n{proposal}\n\nADVERSARY REPORT:\n{adversary_report}\n");
    if !findings.is_empty() {
        context.push_str("\nBINDING FINDINGS REQUIRING ACKNOWLEDGMENT:\n");
        for finding in findings {
            context.push_str(&format!("- [{:?}] {}: {}\n", finding.severity, finding.pattern, finding.excerpt));
        }
    }
    context
}
