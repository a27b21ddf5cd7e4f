//! Governed code-generation gateway.
//!
//! The Senate deliberates, the Elder orchestrates and persists, the
//! Chronicle keeps the case law. Transport framing, the model-provider
//! wire format, and user-facing dashboards live outside this crate.

pub mod chronicle;
pub mod config;
pub mod elder;
pub mod events;
pub mod logging;
pub mod reasoner;
pub mod senate;
pub mod types;

pub use chronicle::{Chronicle, ChronicleStorage, JsonFileStorage, MemoryChronicleStorage};
pub use config::GatewayConfig;
pub use elder::{AppealOutcome, Elder, MissionOutcome, UngovernedOutcome};
pub use events::{DeliberationEvent, DeliberationSink, MemorySink, NullSink};
pub use reasoner::{MockReasoner, Reasoner, Role, RoutedReasoner, ThinkOptions};
pub use senate::Senate;
pub use types::{Mission, Ruling, RuntimeError, RuntimeResult};
