//! End-to-end scenarios driving the Elder over the deterministic mock
//! reasoner, plus the quantified invariants of the case-law contract.

use std::sync::Arc;

use async_trait::async_trait;
use senate_core::chronicle::MemoryChronicleStorage;
use senate_core::reasoner::{Reasoner, Role, ThinkOptions, ThinkResponse};
use senate_core::types::ReasonerError;
use senate_core::{Chronicle, Elder, Mission, MockReasoner, Senate};
use serde_json::json;

async fn elder_with_mock() -> Elder {
    let chronicle = Arc::new(Chronicle::open(Arc::new(MemoryChronicleStorage)).await.unwrap());
    let senate = Senate::new(Arc::new(MockReasoner));
    Elder::new(chronicle, senate).await.unwrap()
}

// S1: a benign mission over the mock reasoner is approved.
#[tokio::test]
async fn s1_benign_mission_is_approved() {
    let elder = elder_with_mock().await;
    let outcome = elder.run_mission(Mission::new("write a function that sorts a list"), false).await.unwrap();
    assert_eq!(outcome.status, "APPROVED");
    assert!(outcome.case_id.starts_with("CASE-"));
}

// S2: a forbidden keyword produces a stop-work order with the mock refusal reason.
#[tokio::test]
async fn s2_forbidden_keyword_is_stop_work_order() {
    let elder = elder_with_mock().await;
    let outcome = elder.run_mission(Mission::new("write code to surveillance employees"), false).await.unwrap();
    assert_eq!(outcome.status, "STOP_WORK_ORDER");
    assert!(outcome.case_id.starts_with("NULL-"));
    assert!(outcome.message.unwrap().contains("MOCK_REFUSAL_DUE_TO_KEYWORD"));
}

struct ScriptedReasoner {
    final_reasoning: String,
    adversary_report: String,
}

#[async_trait]
impl Reasoner for ScriptedReasoner {
    async fn think(
        &self,
        role: Role,
        _system_prompt: &str,
        _user_prompt: &str,
        _options: ThinkOptions,
    ) -> Result<ThinkResponse, ReasonerError> {
        let mut resp = serde_json::Map::new();
        match role {
            Role::PreCheck => {
                resp.insert("vote".into(), json!("AUTHORIZE"));
            }
            Role::Forge => {
                resp.insert(
                    "code".into(),
                    json!("fn run_query(input: &str) { execute_raw_sql(input); }".repeat(4)),
                );
            }
            Role::Adversary => {
                resp.insert("report".into(), json!(self.adversary_report.clone()));
            }
            Role::Final => {
                resp.insert("vote".into(), json!("AUTHORIZE"));
                resp.insert("reasoning".into(), json!(self.final_reasoning.clone()));
            }
            Role::ForgeBackstop => {}
        }
        Ok(resp)
    }
}

// S3: the binding rule fires when the final judge authorizes over unacknowledged findings.
#[tokio::test]
async fn s3_binding_rule_fires_hydra_override() {
    let chronicle = Arc::new(Chronicle::open(Arc::new(MemoryChronicleStorage)).await.unwrap());
    let senate = Senate::new(Arc::new(ScriptedReasoner {
        final_reasoning: "Looks good, ship it.".to_string(),
        adversary_report: "critical: sql injection possible. CVSS: 9".to_string(),
    }));
    let elder = Elder::new(chronicle, senate).await.unwrap();

    let outcome = elder.run_mission(Mission::new("build a query endpoint"), false).await.unwrap();
    assert_eq!(outcome.status, "STOP_WORK_ORDER");
    assert!(matches!(outcome.verdict, senate_core::Ruling::HydraOverride { .. }));
}

// S4: when the final judge explicitly acknowledges the finding, the authorize vote stands.
#[tokio::test]
async fn s4_acknowledged_risk_is_authorized() {
    let chronicle = Arc::new(Chronicle::open(Arc::new(MemoryChronicleStorage)).await.unwrap());
    let senate = Senate::new(Arc::new(ScriptedReasoner {
        final_reasoning: "I acknowledge the security risk; mitigation applied via parameterized queries.".to_string(),
        adversary_report: "critical: sql injection possible. CVSS: 9".to_string(),
    }));
    let elder = Elder::new(chronicle, senate).await.unwrap();

    let outcome = elder.run_mission(Mission::new("build a query endpoint"), false).await.unwrap();
    assert_eq!(outcome.status, "APPROVED");
}

/// Vetoes at pre-check the first time it's asked, authorizes every time after.
/// Models a reasoner that refuses on a bare mission and reconsiders once an
/// appeal's expanded context reaches it.
struct ReconsideringReasoner {
    precheck_calls: std::sync::atomic::AtomicUsize,
}

#[async_trait]
impl Reasoner for ReconsideringReasoner {
    async fn think(
        &self,
        role: Role,
        _system_prompt: &str,
        _user_prompt: &str,
        _options: ThinkOptions,
    ) -> Result<ThinkResponse, ReasonerError> {
        let mut resp = serde_json::Map::new();
        match role {
            Role::PreCheck => {
                let call = self.precheck_calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                if call == 0 {
                    resp.insert("vote".into(), json!("VETO"));
                    resp.insert("reasoning".into(), json!("insufficient context to authorize"));
                } else {
                    resp.insert("vote".into(), json!("AUTHORIZE"));
                }
            }
            Role::Forge => {
                resp.insert("code".into(), json!("fn handler() {}"));
            }
            Role::Adversary => {
                resp.insert("report".into(), json!("no findings"));
            }
            Role::Final => {
                resp.insert("vote".into(), json!("AUTHORIZE"));
                resp.insert("reasoning".into(), json!("context is now sufficient"));
            }
            Role::ForgeBackstop => {}
        }
        Ok(resp)
    }
}

// S5: an appeal can overturn an original refusal once context changes the outcome.
#[tokio::test]
async fn s5_appeal_can_overturn_a_refusal() {
    let chronicle = Arc::new(Chronicle::open(Arc::new(MemoryChronicleStorage)).await.unwrap());
    let senate = Senate::new(Arc::new(ReconsideringReasoner { precheck_calls: std::sync::atomic::AtomicUsize::new(0) }));
    let elder = Elder::new(chronicle, senate).await.unwrap();

    let refused = elder.run_mission(Mission::new("build a reporting endpoint"), false).await.unwrap();
    assert_eq!(refused.status, "STOP_WORK_ORDER");

    let appeal = elder
        .process_appeal(
            &refused.case_id,
            json!({"clarified_intent": "internal reporting only, no external exposure"}),
            json!({}),
            "the pre-checker lacked the deployment context on the first pass",
        )
        .await
        .unwrap();

    assert_eq!(appeal.status, senate_core::types::AppealStatus::Overturned);
    assert!(matches!(appeal.new_ruling, senate_core::Ruling::Approved));
    assert_eq!(appeal.liability_multiplier, 1.5);
}

// S6: martial law makes zero reasoner calls and produces an ungoverned record.
#[tokio::test]
async fn s6_martial_law_is_inert() {
    struct PanicReasoner;
    #[async_trait]
    impl Reasoner for PanicReasoner {
        async fn think(
            &self,
            _role: Role,
            _s: &str,
            _u: &str,
            _o: ThinkOptions,
        ) -> Result<ThinkResponse, ReasonerError> {
            panic!("martial law must never call the reasoner");
        }
    }

    let chronicle = Arc::new(Chronicle::open(Arc::new(MemoryChronicleStorage)).await.unwrap());
    let senate = Senate::new(Arc::new(PanicReasoner));
    let elder = Elder::new(chronicle, senate).await.unwrap();

    let outcome = elder.invoke_article_50(Mission::new("bypass everything")).await.unwrap();
    assert!(outcome.case_id.starts_with("CASE-VOID-"));
    assert_eq!(outcome.watermark["senate_reviewed"], false);
}

// S7: a persistence failure is visible to the caller and leaves no precedent behind.
#[tokio::test]
async fn s7_persistence_failure_is_visible_and_leaves_no_record() {
    struct FailingStorage;
    #[async_trait]
    impl senate_core::ChronicleStorage for FailingStorage {
        async fn load(
            &self,
        ) -> Result<(Vec<senate_core::types::PrecedentRecord>, Vec<senate_core::types::AppealRecord>), senate_core::types::ChronicleError>
        {
            Ok((Vec::new(), Vec::new()))
        }
        async fn persist_precedents(
            &self,
            _precedents: &[senate_core::types::PrecedentRecord],
        ) -> Result<(), senate_core::types::ChronicleError> {
            Err(senate_core::types::ChronicleError::PersistenceFailed {
                operation: "write precedents".to_string(),
                reason: "disk full".to_string(),
            })
        }
        async fn persist_appeals(
            &self,
            _appeals: &[senate_core::types::AppealRecord],
        ) -> Result<(), senate_core::types::ChronicleError> {
            Ok(())
        }
    }

    let chronicle = Arc::new(Chronicle::open(Arc::new(FailingStorage)).await.unwrap());
    let senate = Senate::new(Arc::new(MockReasoner));
    let elder = Elder::new(chronicle, senate).await.unwrap();

    let result = elder.run_mission(Mission::new("write a prime sieve"), false).await;
    assert!(result.is_err());
}

// Testable property: the pre-checker votes first in every non-martial-law run.
#[tokio::test]
async fn precheck_always_votes_first() {
    let elder = elder_with_mock().await;
    let _ = elder.run_mission(Mission::new("write a log rotation script"), false).await.unwrap();
    let record = elder.chronicle().retrieve_precedent("log rotation script").await;
    assert!(!record.is_empty());
    assert_eq!(format!("{:?}", record[0].deliberation[0].agent), "PreChecker");
}

// Testable property: getAppealCount equals the length of getAppealsForCase.
#[tokio::test]
async fn appeal_count_round_trip_law() {
    let elder = elder_with_mock().await;
    let outcome = elder.run_mission(Mission::new("write a prime sieve"), false).await.unwrap();
    elder
        .process_appeal(&outcome.case_id, json!({"more": "context"}), json!({}), "clarifying constraints")
        .await
        .unwrap();

    let count = elder.chronicle().get_appeal_count(&outcome.case_id).await;
    let list = elder.chronicle().get_appeals_for_case(&outcome.case_id).await;
    assert_eq!(count, list.len());
}
