//! Error taxonomy for the gateway.

use thiserror::Error;

/// Top-level error returned by the Elder and its collaborators.
#[derive(Error, Debug, Clone)]
pub enum RuntimeError {
    #[error("chronicle error: {0}")]
    Chronicle(#[from] ChronicleError),

    #[error("reasoner error: {0}")]
    Reasoner(#[from] ReasonerError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("case not found: {case_id}")]
    CaseNotFound { case_id: String },

    #[error("invalid input: {0}")]
    InputValidation(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors raised by the Chronicle store.
#[derive(Error, Debug, Clone)]
pub enum ChronicleError {
    #[error("access denied: {owner} requested a writer handle")]
    AccessDenied { owner: String },

    #[error("write rejected: {operation} requires a writer handle")]
    WriteRequiresHandle { operation: String },

    #[error("persistence failed while {operation}: {reason}")]
    PersistenceFailed { operation: String, reason: String },

    #[error("case not found: {case_id}")]
    CaseNotFound { case_id: String },
}

/// Errors raised by a Reasoner implementation.
#[derive(Error, Debug, Clone)]
pub enum ReasonerError {
    #[error("transport failure calling {role} endpoint: {reason}")]
    Transport { role: String, reason: String },

    #[error("failed to decode response for {role}: {reason}")]
    Decode { role: String, reason: String },

    #[error("no endpoint configured for role: {role}")]
    NoEndpoint { role: String },
}

/// Configuration loading errors.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse configuration: {0}")]
    ParseError(String),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
