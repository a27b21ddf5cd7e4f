use async_trait::async_trait;
use serde_json::{json, Value};

use crate::types::ReasonerError;

use super::{MockReasoner, Reasoner, Role, ThinkOptions, ThinkResponse};

/// Per-role endpoint and credential configuration, matching the environment
/// variables enumerated for the Reasoner in the external-interfaces contract.
#[derive(Debug, Clone, Default)]
pub struct EndpointConfig {
    pub cloud_url: Option<String>,
    pub sovereign_url: Option<String>,
    pub cloud_key: Option<String>,
    pub precheck_model: Option<String>,
    pub forge_model: Option<String>,
    pub forge_backstop_model: Option<String>,
    pub adversary_model: Option<String>,
    pub final_model: Option<String>,
}

impl EndpointConfig {
    fn model_for(&self, role: Role) -> Option<&str> {
        match role {
            Role::PreCheck => self.precheck_model.as_deref(),
            Role::Forge => self.forge_model.as_deref(),
            Role::ForgeBackstop => self.forge_backstop_model.as_deref(),
            Role::Adversary => self.adversary_model.as_deref(),
            Role::Final => self.final_model.as_deref(),
        }
    }

    /// Resolve which configured endpoint a role should hit. `pre_check` is
    /// pinned to the sovereign endpoint when one is configured; a
    /// governance-mode forge call is rerouted to the backstop (which is
    /// just the sovereign endpoint relabeled, since no separate backstop
    /// URL is modeled); everything else defaults to the cloud endpoint.
    fn endpoint_for(&self, role: Role, governance_mode: bool) -> Option<&str> {
        match role {
            Role::PreCheck => self.sovereign_url.as_deref().or(self.cloud_url.as_deref()),
            Role::Forge if governance_mode => {
                self.sovereign_url.as_deref().or(self.cloud_url.as_deref())
            }
            _ => self.cloud_url.as_deref(),
        }
    }
}

/// The role a call is actually billed/modeled under, after the governance-mode
/// reroute: a forge call in governance mode is rerouted to the backstop
/// endpoint, so it must also resolve the backstop model, not the forger's.
fn effective_role(role: Role, governance_mode: bool) -> Role {
    if role == Role::Forge && governance_mode {
        Role::ForgeBackstop
    } else {
        role
    }
}

/// Routes deliberation roles to configured model endpoints, falling back to
/// the deterministic mock for any role whose endpoint is unconfigured. This
/// is the only `Reasoner` implementation the gateway builds a live HTTP
/// client for; everything else goes through it.
pub struct RoutedReasoner {
    config: EndpointConfig,
    client: reqwest::Client,
    mock: MockReasoner,
}

impl RoutedReasoner {
    pub fn new(config: EndpointConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            mock: MockReasoner,
        }
    }

    /// Build from environment variables. Always succeeds: a gateway with no
    /// endpoints configured is a fully-functional mock-mode gateway.
    pub fn from_env() -> Self {
        let config = EndpointConfig {
            cloud_url: std::env::var("REASONER_CLOUD_URL").ok(),
            sovereign_url: std::env::var("REASONER_SOVEREIGN_URL").ok(),
            cloud_key: std::env::var("REASONER_CLOUD_KEY").ok(),
            precheck_model: std::env::var("PRECHECK_MODEL").ok(),
            forge_model: std::env::var("FORGE_MODEL").ok(),
            forge_backstop_model: std::env::var("FORGE_BACKSTOP_MODEL").ok(),
            adversary_model: std::env::var("ADVERSARY_MODEL").ok(),
            final_model: std::env::var("FINAL_MODEL").ok(),
        };
        Self::new(config)
    }

    async fn call_endpoint(
        &self,
        endpoint: &str,
        role: Role,
        system_prompt: &str,
        user_prompt: &str,
        options: &ThinkOptions,
    ) -> Result<ThinkResponse, ReasonerError> {
        let model = options
            .explicit_model
            .clone()
            .or_else(|| self.config.model_for(role).map(str::to_string));

        let body = json!({
            "model": model,
            "temperature": options.temperature,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
        });

        let mut request = self.client.post(endpoint).json(&body);
        if let Some(key) = &self.config.cloud_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| ReasonerError::Transport {
            role: role.as_str().to_string(),
            reason: e.to_string(),
        })?;

        let raw: Value = response.json().await.map_err(|e| ReasonerError::Decode {
            role: role.as_str().to_string(),
            reason: e.to_string(),
        })?;

        match raw {
            Value::Object(map) => Ok(map),
            Value::String(s) => {
                let mut wrapped = serde_json::Map::new();
                wrapped.insert("raw_output".to_string(), Value::String(s));
                wrapped.insert("status".to_string(), Value::String("UNKNOWN_FORMAT".to_string()));
                Ok(wrapped)
            }
            other => {
                let mut wrapped = serde_json::Map::new();
                wrapped.insert("raw_output".to_string(), other);
                wrapped.insert("status".to_string(), Value::String("UNKNOWN_FORMAT".to_string()));
                Ok(wrapped)
            }
        }
    }
}

#[async_trait]
impl Reasoner for RoutedReasoner {
    async fn think(
        &self,
        role: Role,
        system_prompt: &str,
        user_prompt: &str,
        options: ThinkOptions,
    ) -> Result<ThinkResponse, ReasonerError> {
        tracing::debug!(role = role.as_str(), "dispatching reasoner call");

        match self.config.endpoint_for(role, options.governance_mode) {
            Some(endpoint) => {
                let role = effective_role(role, options.governance_mode);
                self.call_endpoint(endpoint, role, system_prompt, user_prompt, &options)
                    .await
            }
            None => self.mock.think(role, system_prompt, user_prompt, options).await,
        }
    }
}
