//! Impls - in-process implementations of the ports.
//!
//! # Included
//! - **RecordingSink**: in-memory sink for tests and dry runs
//! - **ChannelBus**: broadcast-channel bus (source + sink)
//! - **LocalResourceStore** / **InMemoryResourceStore**
//!
//! Network transports (HTTP broker, configuration service client) are
//! bindings of the embedding process and live outside this crate.

pub mod channel_bus;
pub mod recording_sink;
pub mod resources;

pub use self::channel_bus::ChannelBus;
pub use self::recording_sink::RecordingSink;
pub use self::resources::{InMemoryResourceStore, LocalResourceStore};
