//! OutboundSender - builds derived envelopes and publishes them.
//!
//! Every envelope sent here answers an incoming one: it copies the
//! correlation context verbatim, points back at it via `triggeredid`, and
//! gets a fresh id and timestamp.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::config::AdapterConfig;
use crate::domain::{Envelope, EventId, EventType};
use crate::ports::{Clock, EventSink, IdGenerator, SinkError};
use crate::typed::{CodecError, PayloadCodec};

/// Publish acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub event_id: EventId,
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error("publishing {event_type} timed out after {timeout:?}")]
    Timeout {
        event_type: String,
        timeout: Duration,
    },

    #[error("publishing {event_type} failed: {source}")]
    Sink {
        event_type: String,
        #[source]
        source: SinkError,
    },

    #[error(transparent)]
    Encode(#[from] CodecError),
}

pub struct OutboundSender {
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    source: String,
    timeout: Duration,
}

impl OutboundSender {
    pub fn new(
        sink: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        config: &AdapterConfig,
    ) -> Self {
        Self {
            sink,
            clock,
            ids,
            source: config.service_name.clone(),
            timeout: config.send_timeout(),
        }
    }

    /// New envelope of `event_type` correlated to `correlation`.
    pub fn derive(
        &self,
        event_type: &EventType,
        data: serde_json::Value,
        correlation: &Envelope,
    ) -> Envelope {
        Envelope::new(
            event_type.to_string(),
            self.ids.generate_event_id(),
            correlation.context().clone(),
            self.source.as_str(),
            self.clock.now(),
            data,
        )
        .with_triggered_id(correlation.id().clone())
    }

    /// Encode `payload`, derive the envelope and publish it.
    pub async fn send<P: Serialize + Sync>(
        &self,
        event_type: &EventType,
        payload: &P,
        correlation: &Envelope,
    ) -> Result<Ack, SendError> {
        let data = PayloadCodec::encode(payload)?;
        let envelope = self.derive(event_type, data, correlation);
        self.publish(&envelope).await
    }

    /// Publish an already built envelope, bounded by the send timeout.
    pub async fn publish(&self, envelope: &Envelope) -> Result<Ack, SendError> {
        let event_type = envelope.event_type().to_string();
        match tokio::time::timeout(self.timeout, self.sink.publish(envelope)).await {
            Err(_) => Err(SendError::Timeout {
                event_type,
                timeout: self.timeout,
            }),
            Ok(Err(source)) => Err(SendError::Sink { event_type, source }),
            Ok(Ok(())) => {
                debug!(
                    event_type = %event_type,
                    event_id = %envelope.id(),
                    context = %envelope.context(),
                    "envelope published"
                );
                Ok(Ack {
                    event_id: envelope.id().clone(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContextId, Phase};
    use crate::impls::RecordingSink;
    use crate::ports::{FixedClock, UlidGenerator};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn triggered() -> Envelope {
        Envelope::new(
            "demo.action.triggered",
            EventId::new("t-1"),
            ContextId::new("ctx-1"),
            "shipyard",
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            json!({}),
        )
    }

    fn sender(sink: Arc<dyn EventSink>, config: &AdapterConfig) -> OutboundSender {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(at));
        let ids = Arc::new(UlidGenerator::new(clock.clone()));
        OutboundSender::new(sink, clock, ids, config)
    }

    #[tokio::test]
    async fn send_preserves_context_and_links_trigger() {
        let sink = Arc::new(RecordingSink::new());
        let config = AdapterConfig::default().with_service_name("me");
        let sender = sender(sink.clone(), &config);

        let origin = triggered();
        let started = EventType::triggered("demo", "action").with_phase(Phase::Started);
        let ack = sender
            .send(&started, &json!({ "status": "succeeded" }), &origin)
            .await
            .unwrap();

        let published = sink.published();
        assert_eq!(published.len(), 1);
        let env = &published[0];
        assert_eq!(env.event_type(), "demo.action.started");
        assert_eq!(env.context(), origin.context());
        assert_eq!(env.triggered_id(), Some(origin.id()));
        assert_eq!(env.source(), "me");
        assert_ne!(env.id(), origin.id());
        assert_eq!(&ack.event_id, env.id());
        assert_eq!(env.time(), Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn sink_failure_is_reported() {
        let sink = Arc::new(RecordingSink::failing_on(Phase::Finished));
        let sender = sender(sink, &AdapterConfig::default());
        let finished = EventType::triggered("demo", "action").with_phase(Phase::Finished);

        let err = sender.send(&finished, &json!({}), &triggered()).await.unwrap_err();
        assert!(matches!(err, SendError::Sink { .. }));
    }

    struct StuckSink;

    #[async_trait]
    impl EventSink for StuckSink {
        async fn publish(&self, _envelope: &Envelope) -> Result<(), SinkError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn slow_sink_times_out() {
        let config = AdapterConfig::default().with_send_timeout(Duration::from_millis(20));
        let sender = sender(Arc::new(StuckSink), &config);
        let finished = EventType::triggered("demo", "action").with_phase(Phase::Finished);

        let err = sender.send(&finished, &json!({}), &triggered()).await.unwrap_err();
        assert!(matches!(err, SendError::Timeout { .. }));
    }
}
