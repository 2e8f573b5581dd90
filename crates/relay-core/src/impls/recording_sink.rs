//! In-memory sink that keeps everything it publishes.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{Envelope, Phase};
use crate::ports::{EventSink, SinkError};

#[derive(Default)]
pub struct RecordingSink {
    published: Mutex<Vec<Envelope>>,
    failing_phase: Option<Phase>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects every envelope whose type ends in `phase`.
    pub fn failing_on(phase: Phase) -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            failing_phase: Some(phase),
        }
    }

    /// Snapshot of published envelopes in publish order.
    pub fn published(&self) -> Vec<Envelope> {
        self.published
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn of_phase(&self, phase: Phase) -> Vec<Envelope> {
        self.published()
            .into_iter()
            .filter(|e| phase_of(e) == Some(phase))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.published.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn phase_of(envelope: &Envelope) -> Option<Phase> {
    envelope.parsed_type().ok().map(|t| t.phase())
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn publish(&self, envelope: &Envelope) -> Result<(), SinkError> {
        if self.failing_phase.is_some() && phase_of(envelope) == self.failing_phase {
            return Err(SinkError::Rejected(format!(
                "{} refused by recording sink",
                envelope.event_type()
            )));
        }
        let mut published = self
            .published
            .lock()
            .map_err(|_| SinkError::Unavailable("recording sink poisoned".to_string()))?;
        published.push(envelope.clone());
        Ok(())
    }
}
