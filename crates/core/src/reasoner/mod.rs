//! The abstract language-model capability the Senate deliberates through.

mod cloud;
mod mock;

pub use cloud::{EndpointConfig, RoutedReasoner};
pub use mock::MockReasoner;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::ReasonerError;

/// One of the four deliberation roles, plus the backstop variant used when
/// governance mode reroutes the forger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    PreCheck,
    Forge,
    ForgeBackstop,
    Adversary,
    Final,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::PreCheck => "pre_check",
            Role::Forge => "forge",
            Role::ForgeBackstop => "forge_backstop",
            Role::Adversary => "adversary",
            Role::Final => "final",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ThinkOptions {
    pub temperature: Option<f32>,
    pub governance_mode: bool,
    pub explicit_model: Option<String>,
}

/// A decoded model response: always a JSON object, never a bare scalar or
/// array, so callers can index fields without re-checking the shape.
pub type ThinkResponse = Map<String, Value>;

#[async_trait]
pub trait Reasoner: Send + Sync {
    async fn think(
        &self,
        role: Role,
        system_prompt: &str,
        user_prompt: &str,
        options: ThinkOptions,
    ) -> Result<ThinkResponse, ReasonerError>;
}

/// Forbidden keywords the deterministic mock refuses on. Mirrors the
/// two-pass audit's hardcoded refusal list.
pub const FORBIDDEN_KEYWORDS: &[&str] =
    &["surveillance", "hack", "destroy", "delete", "kill", "rm -rf"];

pub(crate) fn contains_forbidden_keyword(text: &str) -> bool {
    let lower = text.to_lowercase();
    FORBIDDEN_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

pub(crate) fn looks_like_forge_prompt(system_prompt: &str, role: Role) -> bool {
    role == Role::Forge || role == Role::ForgeBackstop || system_prompt.to_lowercase().contains("forge")
}

pub(crate) fn obj(pairs: Vec<(&str, Value)>) -> ThinkResponse {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}
