//! ChannelBus - in-process bus on a tokio broadcast channel.
//!
//! Implements both sides of the bus binding so a service and its peers can
//! talk inside one process. Each subscription gets its own receiver and only
//! sees the types it asked for.

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::broadcast;
use tracing::warn;

use crate::domain::Envelope;
use crate::ports::{EnvelopeStream, EventSink, EventSource, SinkError, SourceError, Subscription};

pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct ChannelBus {
    tx: broadcast::Sender<Envelope>,
}

impl ChannelBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Receiver for every envelope, regardless of type.
    pub fn tap(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }

    /// Live receivers, taps included.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChannelBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl EventSink for ChannelBus {
    async fn publish(&self, envelope: &Envelope) -> Result<(), SinkError> {
        self.tx
            .send(envelope.clone())
            .map(|_| ())
            .map_err(|_| SinkError::Unavailable("no subscribers on channel bus".to_string()))
    }
}

#[async_trait]
impl EventSource for ChannelBus {
    async fn subscribe(&self, subscription: &Subscription) -> Result<EnvelopeStream, SourceError> {
        let wanted = subscription.clone();
        let rx = self.tx.subscribe();

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(envelope) => return Some((envelope, rx)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "channel bus subscriber lagged, envelopes dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
        .filter(move |envelope| {
            let keep = wanted.matches(envelope.event_type());
            async move { keep }
        });

        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContextId, EventId, EventType};
    use chrono::Utc;

    fn envelope(event_type: &str) -> Envelope {
        Envelope::new(
            event_type,
            EventId::new("e"),
            ContextId::new("c"),
            "test",
            Utc::now(),
            serde_json::json!({}),
        )
    }

    #[tokio::test]
    async fn subscription_filters_by_type() {
        let bus = ChannelBus::default();
        let mut stream = bus
            .subscribe(&Subscription::Types(vec![EventType::triggered("demo", "action")]))
            .await
            .unwrap();

        bus.publish(&envelope("demo.action.started")).await.unwrap();
        bus.publish(&envelope("demo.other.triggered")).await.unwrap();
        bus.publish(&envelope("demo.action.triggered")).await.unwrap();

        let got = stream.next().await.unwrap();
        assert_eq!(got.event_type(), "demo.action.triggered");
    }

    #[tokio::test]
    async fn namespace_subscription_skips_own_lifecycle_events() {
        let bus = ChannelBus::default();
        let mut stream = bus
            .subscribe(&Subscription::Triggered {
                namespace: "demo".to_string(),
            })
            .await
            .unwrap();

        bus.publish(&envelope("demo.action.finished")).await.unwrap();
        bus.publish(&envelope("elsewhere.release.triggered")).await.unwrap();
        bus.publish(&envelope("demo.release.triggered")).await.unwrap();

        let got = stream.next().await.unwrap();
        assert_eq!(got.event_type(), "demo.release.triggered");
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_unavailable() {
        let bus = ChannelBus::default();
        let err = bus.publish(&envelope("demo.action.started")).await.unwrap_err();
        assert!(matches!(err, SinkError::Unavailable(_)));
    }
}
