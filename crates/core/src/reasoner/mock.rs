use async_trait::async_trait;
use serde_json::json;

use crate::types::ReasonerError;

use super::{contains_forbidden_keyword, looks_like_forge_prompt, obj, Reasoner, Role, ThinkOptions, ThinkResponse};

/// The deterministic fallback used when no endpoint is configured for a
/// role. Never makes network calls; exists so the gateway is exercisable
/// (and its tests are reproducible) without live model credentials.
#[derive(Debug, Default, Clone)]
pub struct MockReasoner;

#[async_trait]
impl Reasoner for MockReasoner {
    async fn think(
        &self,
        role: Role,
        system_prompt: &str,
        user_prompt: &str,
        _options: ThinkOptions,
    ) -> Result<ThinkResponse, ReasonerError> {
        let combined = format!("{system_prompt} {user_prompt}");

        if contains_forbidden_keyword(&combined) {
            return Ok(obj(vec![
                ("vote", json!("NULL")),
                ("reason", json!("MOCK_REFUSAL_DUE_TO_KEYWORD")),
            ]));
        }

        if looks_like_forge_prompt(system_prompt, role) {
            return Ok(obj(vec![
                ("code", json!(format!("// mock artifact for: {}", user_prompt.chars().take(120).collect::<String>()))),
                ("explanation", json!("Generated by the deterministic mock reasoner; no live model configured.")),
                ("intermediate_representation", json!({"steps": []})),
            ]));
        }

        Ok(obj(vec![
            ("vote", json!("AUTHORIZE")),
            ("reason", json!("MOCK_AUTHORIZATION_SAFE")),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refuses_forbidden_keyword() {
        let reasoner = MockReasoner;
        let resp = reasoner
            .think(Role::PreCheck, "audit", "please hack the mainframe", ThinkOptions::default())
            .await
            .unwrap();
        assert_eq!(resp.get("vote").unwrap(), "NULL");
        assert_eq!(resp.get("reason").unwrap(), "MOCK_REFUSAL_DUE_TO_KEYWORD");
    }

    #[tokio::test]
    async fn forge_role_returns_code_shape() {
        let reasoner = MockReasoner;
        let resp = reasoner
            .think(Role::Forge, "forge", "write a csv parser", ThinkOptions::default())
            .await
            .unwrap();
        assert!(resp.contains_key("code"));
        assert!(resp.contains_key("intermediate_representation"));
    }

    #[tokio::test]
    async fn benign_prompt_authorizes() {
        let reasoner = MockReasoner;
        let resp = reasoner
            .think(Role::Final, "judge", "write a fibonacci function", ThinkOptions::default())
            .await
            .unwrap();
        assert_eq!(resp.get("vote").unwrap(), "AUTHORIZE");
    }
}
