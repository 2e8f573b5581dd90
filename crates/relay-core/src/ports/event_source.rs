//! EventSource port - subscribe side of the bus binding.

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::domain::{Envelope, EventType, Phase};

/// Stream of envelopes delivered by a subscription.
pub type EnvelopeStream = BoxStream<'static, Envelope>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("subscription failed: {0}")]
    Subscribe(String),
}

/// Which envelopes a subscription asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subscription {
    /// Exactly these event types.
    Types(Vec<EventType>),

    /// Every `<namespace>.<task>.triggered` type, known task or not.
    Triggered { namespace: String },
}

impl Subscription {
    pub fn matches(&self, event_type: &str) -> bool {
        match self {
            Subscription::Types(types) => types.iter().any(|t| t.to_string() == event_type),
            Subscription::Triggered { namespace } => EventType::parse(event_type)
                .is_ok_and(|t| t.phase() == Phase::Triggered && t.namespace() == namespace),
        }
    }
}

/// Delivers envelopes matching a [`Subscription`].
///
/// Delivery is at-least-once; the same envelope may show up twice.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn subscribe(&self, subscription: &Subscription) -> Result<EnvelopeStream, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("sh.keptn.event.release.triggered", true)]
    #[case("sh.keptn.event.action.triggered", true)]
    #[case("sh.keptn.event.action.finished", false)]
    #[case("other.ns.action.triggered", false)]
    #[case("garbage", false)]
    fn namespace_subscription_takes_any_triggered_task(#[case] event_type: &str, #[case] hit: bool) {
        let sub = Subscription::Triggered {
            namespace: "sh.keptn.event".to_string(),
        };
        assert_eq!(sub.matches(event_type), hit);
    }

    #[test]
    fn type_subscription_is_exact() {
        let sub = Subscription::Types(vec![EventType::triggered("demo", "action")]);
        assert!(sub.matches("demo.action.triggered"));
        assert!(!sub.matches("demo.release.triggered"));
    }
}
