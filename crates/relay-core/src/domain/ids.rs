//! Envelope identifiers (strongly-typed IDs).
//!
//! `Id<T>` wraps the wire value and carries a phantom marker so an `EventId`
//! and a `ContextId` can't be mixed up at compile time. Values received from
//! the bus are kept verbatim; ids minted by this crate are ULIDs (see
//! `ports::IdGenerator`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// Marker trait for the different id kinds.
pub trait IdMarker: Send + Sync + 'static {
    /// Short name used in logs (e.g. "event", "context").
    fn kind() -> &'static str;
}

/// Generic string-backed id.
///
/// Serializes as the bare string so it can be embedded in envelopes as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct Id<T: IdMarker> {
    value: String,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn from_ulid(ulid: Ulid) -> Self {
        Self::new(ulid.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> &'static str {
        T::kind()
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> From<String> for Id<T> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Marker for one envelope occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Event {}

impl IdMarker for Event {
    fn kind() -> &'static str {
        "event"
    }
}

/// Marker for one logical task execution (triggered/started/finished).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Context {}

impl IdMarker for Context {
    fn kind() -> &'static str {
        "context"
    }
}

/// Identifier of a single envelope.
pub type EventId = Id<Event>;

/// Correlation identifier shared by every envelope of one task execution.
pub type ContextId = Id<Context>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_keep_wire_value_verbatim() {
        let ctx = ContextId::new("ctx-1");
        assert_eq!(ctx.as_str(), "ctx-1");
        assert_eq!(ctx.to_string(), "ctx-1");
        assert_eq!(ctx.kind(), "context");

        // let _: EventId = ctx; // <- does not compile
    }

    #[test]
    fn ids_serialize_as_bare_strings() {
        let id = EventId::new("e-42");
        let s = serde_json::to_string(&id).unwrap();
        assert_eq!(s, "\"e-42\"");

        let back: EventId = serde_json::from_str(&s).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn ulid_ids_are_distinct() {
        let a = EventId::from(Ulid::new());
        let b = EventId::from(Ulid::new());
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 26);
    }
}
