pub mod appeal;
pub mod chronicle_handle;
pub mod error;
pub mod finding;
pub mod mission;
pub mod precedent;
pub mod ruling;
pub mod senate_record;
pub mod vote;

pub use appeal::{AppealRecord, AppealStatus};
pub use chronicle_handle::{ChronicleHandle, HandleRole};
pub use error::{ChronicleError, ConfigError, ReasonerError, RuntimeError, RuntimeResult};
pub use finding::{HydraFinding, Severity};
pub use mission::Mission;
pub use precedent::{NullVerdictRecord, PrecedentRecord};
pub use ruling::Ruling;
pub use senate_record::{SenateRecord, SenateState};
pub use vote::{Agent, Verdict, Vote};
