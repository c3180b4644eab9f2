mod engine;
mod error;
mod requests;
mod types;

pub use engine::{Engine, Session};
pub use error::{CoreError, CoreErrorCode};
pub use requests::{DetectionRequests, DetectionTicket};
pub use types::{Capabilities, CapabilityIssue, Snapshot};
