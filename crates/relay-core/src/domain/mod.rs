//! Domain model (ids, event types, envelopes, outcomes, errors).
//!
//! Nothing in here talks to a bus or a repository; it only defines the shape
//! of what flows through the dispatcher.

pub mod envelope;
pub mod errors;
pub mod event_type;
pub mod ids;
pub mod outcome;

pub use self::envelope::Envelope;
pub use self::errors::HandlerError;
pub use self::event_type::{EventType, EventTypeError, Phase};
pub use self::ids::{ContextId, EventId};
pub use self::outcome::{Scope, Status, TaskOutcome, Verdict};
