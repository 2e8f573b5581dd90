//! Ports - collaborator interfaces.
//!
//! The core only depends on these traits; the bus transport, the resource
//! repository and time itself live behind them.

pub mod clock;
pub mod event_sink;
pub mod event_source;
pub mod id_generator;
pub mod resource_store;
pub mod waiter;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::event_sink::{EventSink, SinkError};
pub use self::event_source::{EnvelopeStream, EventSource, SourceError, Subscription};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::resource_store::{ResourceError, ResourceScope, ResourceStore};
pub use self::waiter::{NoopWaiter, TokioWaiter, Waiter};
