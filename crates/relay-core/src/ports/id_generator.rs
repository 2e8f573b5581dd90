//! IdGenerator port - id minting for emitted envelopes.
//!
//! # Implementations
//! - **UlidGenerator**: ULID based, timestamp taken from a `Clock`

use crate::domain::ids::{ContextId, EventId};
use crate::ports::Clock;
use ulid::Ulid;

/// Mints ids for envelopes created by this service.
///
/// `Send + Sync` because one generator is shared by every concurrent
/// execution.
pub trait IdGenerator: Send + Sync {
    /// Fresh id for a started/finished envelope.
    fn generate_event_id(&self) -> EventId;

    /// Fresh correlation context, only needed when this service originates a
    /// triggered envelope itself (CLI, tests).
    fn generate_context_id(&self) -> ContextId;
}

/// ULID based generator.
///
/// The timestamp part comes from the clock, so a `FixedClock` yields ids
/// that differ only in their random part.
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_event_id(&self) -> EventId {
        EventId::from(self.next_ulid())
    }

    fn generate_context_id(&self) -> ContextId {
        ContextId::from(self.next_ulid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};

    #[test]
    fn ulid_generator_generates_unique_ids() {
        let id_gen = UlidGenerator::new(SystemClock);

        let id1 = id_gen.generate_event_id();
        let id2 = id_gen.generate_event_id();
        let id3 = id_gen.generate_event_id();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn ulid_generator_uses_clock_timestamp() {
        let fixed_time = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let id_gen = UlidGenerator::new(FixedClock::new(fixed_time));

        let id1 = id_gen.generate_event_id();
        let id2 = id_gen.generate_event_id();
        assert_ne!(id1, id2);

        let ts1 = Ulid::from_string(id1.as_str()).unwrap().timestamp_ms();
        let ts2 = Ulid::from_string(id2.as_str()).unwrap().timestamp_ms();
        assert_eq!(ts1, ts2);
        assert_eq!(ts1, fixed_time.timestamp_millis() as u64);
    }

    #[test]
    fn context_ids_are_ulids_too() {
        let id_gen = UlidGenerator::new(SystemClock);
        let ctx = id_gen.generate_context_id();
        assert!(Ulid::from_string(ctx.as_str()).is_ok());
    }
}
