//! The append-only case-law store. Nothing in this module updates, deletes,
//! or modifies an existing precedent, null-verdict, or appeal; the only
//! permitted change to an existing record is appending a new appeal id to
//! its `appeal_history`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::types::{AppealRecord, ChronicleError, ChronicleHandle, PrecedentRecord};

/// Pluggable durable backing store. The JSON-file implementation is the
/// reference; any backend preserving append-only, fsync-before-return
/// semantics is conforming.
#[async_trait]
pub trait ChronicleStorage: Send + Sync {
    async fn load(&self) -> Result<(Vec<PrecedentRecord>, Vec<AppealRecord>), ChronicleError>;
    async fn persist_precedents(&self, precedents: &[PrecedentRecord]) -> Result<(), ChronicleError>;
    async fn persist_appeals(&self, appeals: &[AppealRecord]) -> Result<(), ChronicleError>;
}

/// Keeps everything in memory and never touches disk. Used by tests that
/// need a Chronicle without filesystem side effects.
#[derive(Debug, Default)]
pub struct MemoryChronicleStorage;

#[async_trait]
impl ChronicleStorage for MemoryChronicleStorage {
    async fn load(&self) -> Result<(Vec<PrecedentRecord>, Vec<AppealRecord>), ChronicleError> {
        Ok((Vec::new(), Vec::new()))
    }

    async fn persist_precedents(&self, _precedents: &[PrecedentRecord]) -> Result<(), ChronicleError> {
        Ok(())
    }

    async fn persist_appeals(&self, _appeals: &[AppealRecord]) -> Result<(), ChronicleError> {
        Ok(())
    }
}

/// Two flat JSON files, written atomically: build the buffer, write it into
/// a temp file in the destination's own directory, fsync that file, then
/// rename it into place. A reader never observes a partially-written file.
pub struct JsonFileStorage {
    precedents_path: PathBuf,
    appeals_path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref();
        Self {
            precedents_path: dir.join("chronicle_data.json"),
            appeals_path: dir.join("chronicle_data_appeals.json"),
        }
    }

    async fn write_atomic(path: PathBuf, value: Value, operation: &'static str) -> Result<(), ChronicleError> {
        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        tokio::task::spawn_blocking(move || -> Result<(), ChronicleError> {
            use std::io::Write;

            let body = serde_json::to_vec_pretty(&value).map_err(|e| ChronicleError::PersistenceFailed {
                operation: operation.to_string(),
                reason: e.to_string(),
            })?;

            let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(|e| ChronicleError::PersistenceFailed {
                operation: operation.to_string(),
                reason: e.to_string(),
            })?;
            tmp.write_all(&body).map_err(|e| ChronicleError::PersistenceFailed {
                operation: operation.to_string(),
                reason: e.to_string(),
            })?;
            tmp.flush().map_err(|e| ChronicleError::PersistenceFailed {
                operation: operation.to_string(),
                reason: e.to_string(),
            })?;
            tmp.as_file().sync_all().map_err(|e| ChronicleError::PersistenceFailed {
                operation: operation.to_string(),
                reason: e.to_string(),
            })?;
            tmp.persist(&path).map_err(|e| ChronicleError::PersistenceFailed {
                operation: operation.to_string(),
                reason: e.error.to_string(),
            })?;
            Ok(())
        })
        .await
        .map_err(|e| ChronicleError::PersistenceFailed { operation: operation.to_string(), reason: e.to_string() })?
    }

    async fn read_json(path: &Path) -> Result<Value, ChronicleError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| ChronicleError::PersistenceFailed {
                operation: "load".to_string(),
                reason: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(json!([])),
            Err(e) => Err(ChronicleError::PersistenceFailed { operation: "load".to_string(), reason: e.to_string() }),
        }
    }
}

#[async_trait]
impl ChronicleStorage for JsonFileStorage {
    async fn load(&self) -> Result<(Vec<PrecedentRecord>, Vec<AppealRecord>), ChronicleError> {
        let precedents_json = Self::read_json(&self.precedents_path).await?;
        let appeals_json = Self::read_json(&self.appeals_path).await?;
        let precedents: Vec<PrecedentRecord> =
            serde_json::from_value(precedents_json).map_err(|e| ChronicleError::PersistenceFailed {
                operation: "load precedents".to_string(),
                reason: e.to_string(),
            })?;
        let appeals: Vec<AppealRecord> =
            serde_json::from_value(appeals_json).map_err(|e| ChronicleError::PersistenceFailed {
                operation: "load appeals".to_string(),
                reason: e.to_string(),
            })?;
        Ok((precedents, appeals))
    }

    async fn persist_precedents(&self, precedents: &[PrecedentRecord]) -> Result<(), ChronicleError> {
        let value = serde_json::to_value(precedents).map_err(|e| ChronicleError::PersistenceFailed {
            operation: "serialize precedents".to_string(),
            reason: e.to_string(),
        })?;
        Self::write_atomic(self.precedents_path.clone(), value, "write precedents").await
    }

    async fn persist_appeals(&self, appeals: &[AppealRecord]) -> Result<(), ChronicleError> {
        let value = serde_json::to_value(appeals).map_err(|e| ChronicleError::PersistenceFailed {
            operation: "serialize appeals".to_string(),
            reason: e.to_string(),
        })?;
        Self::write_atomic(self.appeals_path.clone(), value, "write appeals").await
    }
}

struct ChronicleState {
    precedents: Vec<PrecedentRecord>,
    appeals: Vec<AppealRecord>,
}

/// The append-only store. Shared reads, exclusive writes, a single writer
/// handle (the Elder's) ever issued in practice.
pub struct Chronicle {
    state: RwLock<ChronicleState>,
    storage: Arc<dyn ChronicleStorage>,
}

impl Chronicle {
    pub async fn open(storage: Arc<dyn ChronicleStorage>) -> Result<Self, ChronicleError> {
        let (precedents, appeals) = storage.load().await?;
        Ok(Self { state: RwLock::new(ChronicleState { precedents, appeals }), storage })
    }

    pub fn get_reader_handle(&self, owner: impl Into<String>) -> ChronicleHandle {
        ChronicleHandle::reader(owner)
    }

    pub fn get_writer_handle(&self, caller: &str) -> Result<ChronicleHandle, ChronicleError> {
        if caller.eq_ignore_ascii_case("elder") {
            Ok(ChronicleHandle::writer(caller.to_string()))
        } else {
            Err(ChronicleError::AccessDenied { owner: caller.to_string() })
        }
    }

    pub async fn retrieve_precedent(&self, query: &str) -> Vec<PrecedentRecord> {
        let query_tokens: std::collections::HashSet<String> =
            query.split_whitespace().map(|t| t.to_lowercase()).collect();
        let state = self.state.read().await;
        state
            .precedents
            .iter()
            .filter(|p| p.question_tokens().iter().any(|t| query_tokens.contains(t)))
            .cloned()
            .collect()
    }

    pub async fn get_case_by_id(&self, case_id: &str) -> Option<PrecedentRecord> {
        self.state.read().await.precedents.iter().find(|p| p.case_id == case_id).cloned()
    }

    pub async fn get_appeals_for_case(&self, case_id: &str) -> Vec<AppealRecord> {
        self.state
            .read()
            .await
            .appeals
            .iter()
            .filter(|a| a.original_case_id == case_id)
            .cloned()
            .collect()
    }

    pub async fn get_appeal_count(&self, case_id: &str) -> usize {
        self.get_appeals_for_case(case_id).await.len()
    }

    pub async fn cite_precedent(&self, case_id: &str) -> Option<Value> {
        let state = self.state.read().await;
        let case = state.precedents.iter().find(|p| p.case_id == case_id)?;
        let appeal_count = state.appeals.iter().filter(|a| a.original_case_id == case_id).count();
        Some(json!({
            "case_id": case.case_id,
            "question": case.question,
            "ruling": case.verdict,
            "deliberation_summary": case.deliberation.len(),
            "appeal_count": appeal_count,
        }))
    }

    fn require_writer(handle: &ChronicleHandle, operation: &'static str) -> Result<(), ChronicleError> {
        if handle.is_writer() {
            Ok(())
        } else {
            Err(ChronicleError::WriteRequiresHandle { operation: operation.to_string() })
        }
    }

    pub async fn write_precedent(
        &self,
        precedent: PrecedentRecord,
        handle: &ChronicleHandle,
    ) -> Result<String, ChronicleError> {
        Self::require_writer(handle, "write_precedent")?;
        let case_id = precedent.case_id.clone();
        let mut state = self.state.write().await;
        state.precedents.push(precedent);
        self.storage.persist_precedents(&state.precedents).await?;
        tracing::info!(case_id = %case_id, "precedent committed");
        Ok(case_id)
    }

    pub async fn persist_null_verdict(
        &self,
        record: &crate::types::NullVerdictRecord,
        handle: &ChronicleHandle,
    ) -> Result<String, ChronicleError> {
        Self::require_writer(handle, "persist_null_verdict")?;
        let precedent = record.as_precedent();
        let case_id = precedent.case_id.clone();
        let mut state = self.state.write().await;
        state.precedents.push(precedent);
        self.storage.persist_precedents(&state.precedents).await?;
        tracing::info!(case_id = %case_id, "null verdict committed");
        Ok(case_id)
    }

    pub async fn persist_appeal(
        &self,
        appeal: AppealRecord,
        handle: &ChronicleHandle,
    ) -> Result<String, ChronicleError> {
        Self::require_writer(handle, "persist_appeal")?;
        let appeal_id = appeal.appeal_id.clone();
        let original_case_id = appeal.original_case_id.clone();

        let mut state = self.state.write().await;
        state.appeals.push(appeal);
        if let Some(original) = state.precedents.iter_mut().find(|p| p.case_id == original_case_id) {
            original.appeal_history.push(appeal_id.clone());
        }
        self.storage.persist_appeals(&state.appeals).await?;
        self.storage.persist_precedents(&state.precedents).await?;
        tracing::info!(appeal_id = %appeal_id, original_case_id = %original_case_id, "appeal committed");
        Ok(appeal_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vote;

    async fn chronicle() -> Chronicle {
        Chronicle::open(Arc::new(MemoryChronicleStorage)).await.unwrap()
    }

    fn sample_precedent(case_id: &str) -> PrecedentRecord {
        PrecedentRecord {
            case_id: case_id.to_string(),
            question: "write a csv parser".to_string(),
            context_vector: None,
            deliberation: Vec::<Vote>::new(),
            verdict: json!({"ruling": "APPROVED"}),
            appeal_history: Vec::new(),
        }
    }

    #[tokio::test]
    async fn only_elder_receives_a_writer_handle() {
        let chronicle = chronicle().await;
        assert!(chronicle.get_writer_handle("ELDER").is_ok());
        assert!(chronicle.get_writer_handle("elder").is_ok());
        assert!(chronicle.get_writer_handle("intruder").is_err());
    }

    #[tokio::test]
    async fn write_without_writer_handle_is_rejected() {
        let chronicle = chronicle().await;
        let reader = chronicle.get_reader_handle("auditor");
        let result = chronicle.write_precedent(sample_precedent("CASE-1"), &reader).await;
        assert!(matches!(result, Err(ChronicleError::WriteRequiresHandle { .. })));
    }

    #[tokio::test]
    async fn round_trip_write_then_get_by_id() {
        let chronicle = chronicle().await;
        let writer = chronicle.get_writer_handle("ELDER").unwrap();
        let case_id = chronicle.write_precedent(sample_precedent("CASE-1"), &writer).await.unwrap();
        let fetched = chronicle.get_case_by_id(&case_id).await.unwrap();
        assert_eq!(fetched.case_id, "CASE-1");
    }

    #[tokio::test]
    async fn appeal_count_matches_appeals_list_length() {
        let chronicle = chronicle().await;
        let writer = chronicle.get_writer_handle("ELDER").unwrap();
        chronicle.write_precedent(sample_precedent("CASE-1"), &writer).await.unwrap();

        let appeal = AppealRecord {
            appeal_id: "APPEAL-1".to_string(),
            original_case_id: "CASE-1".to_string(),
            original_ruling: json!({"ruling": "APPROVED"}),
            original_deliberation: Vec::new(),
            expanded_context: json!({}),
            constraint_changes: json!({}),
            appellant_reason: "context changed".to_string(),
            new_deliberation: Vec::new(),
            new_ruling: json!({"ruling": "APPROVED"}),
            chronicle_citations: vec!["CASE-1".to_string()],
            timestamp: chrono::Utc::now(),
            appeal_depth: 1,
            liability_multiplier: AppealRecord::liability_multiplier_for(1),
            status: crate::types::AppealStatus::Upheld,
        };
        chronicle.persist_appeal(appeal, &writer).await.unwrap();

        assert_eq!(chronicle.get_appeal_count("CASE-1").await, chronicle.get_appeals_for_case("CASE-1").await.len());
        let original = chronicle.get_case_by_id("CASE-1").await.unwrap();
        assert_eq!(original.appeal_history, vec!["APPEAL-1".to_string()]);
    }

    #[tokio::test]
    async fn appeal_never_erases_original_record_content() {
        let chronicle = chronicle().await;
        let writer = chronicle.get_writer_handle("ELDER").unwrap();
        chronicle.write_precedent(sample_precedent("CASE-1"), &writer).await.unwrap();
        let before = chronicle.get_case_by_id("CASE-1").await.unwrap();

        let appeal = AppealRecord {
            appeal_id: "APPEAL-1".to_string(),
            original_case_id: "CASE-1".to_string(),
            original_ruling: before.verdict.clone(),
            original_deliberation: before.deliberation.clone(),
            expanded_context: json!({}),
            constraint_changes: json!({}),
            appellant_reason: "context changed".to_string(),
            new_deliberation: Vec::new(),
            new_ruling: json!({"ruling": "APPROVED"}),
            chronicle_citations: vec!["CASE-1".to_string()],
            timestamp: chrono::Utc::now(),
            appeal_depth: 1,
            liability_multiplier: AppealRecord::liability_multiplier_for(1),
            status: crate::types::AppealStatus::Upheld,
        };
        chronicle.persist_appeal(appeal, &writer).await.unwrap();

        let after = chronicle.get_case_by_id("CASE-1").await.unwrap();
        assert_eq!(before.question, after.question);
        assert_eq!(before.verdict, after.verdict);
        assert_eq!(after.appeal_history.len(), 1);
    }

    #[tokio::test]
    async fn retrieve_precedent_matches_on_keyword_overlap() {
        let chronicle = chronicle().await;
        let writer = chronicle.get_writer_handle("ELDER").unwrap();
        chronicle.write_precedent(sample_precedent("CASE-1"), &writer).await.unwrap();
        let results = chronicle.retrieve_precedent("please write a CSV importer").await;
        assert_eq!(results.len(), 1);
        let no_match = chronicle.retrieve_precedent("completely unrelated topic").await;
        assert!(no_match.is_empty());
    }
}
