//! Dispatcher - the triggered → started → finished lifecycle.
//!
//! # Flow
//! 1. Resolve the handler by exact event type
//! 2. Decode the payload (failure → errored finished, no started)
//! 3. Provider / handler scope filter (mismatch → nothing sent)
//! 4. Send started (failure logged, execution continues)
//! 5. Run the handler
//! 6. Build finished from the outcome or the handler error
//! 7. Send finished (failure → `DispatchError::FinishedNotSent`)
//!
//! Redelivered envelopes are processed again; no de-duplication happens here.

use std::sync::Arc;

use thiserror::Error;
use tracing::{Instrument, debug, error, info, info_span, warn};

use super::config::{AdapterConfig, UnhandledPolicy};
use super::outbound::{OutboundSender, SendError};
use crate::domain::{ContextId, Envelope, EventType, Phase, Scope, TaskOutcome};
use crate::typed::{DynHandler, Prepared, TypedRegistry};

/// How an envelope was dealt with.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// A finished envelope carrying this outcome was sent.
    Finished(TaskOutcome),

    /// The event belongs to another provider or handler; nothing was sent.
    OutOfScope,

    /// No handler for this type and the policy says ignore.
    Ignored,
}

/// Every variant stops a running [`Service`](super::Service).
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unhandled event type {0}")]
    Unhandled(String),

    #[error("finished event for context {context} could not be sent: {source}")]
    FinishedNotSent {
        context: ContextId,
        #[source]
        source: SendError,
    },
}

pub struct Dispatcher {
    registry: Arc<TypedRegistry>,
    sender: OutboundSender,
    identity: String,
    unhandled: UnhandledPolicy,
}

impl Dispatcher {
    pub fn new(registry: Arc<TypedRegistry>, sender: OutboundSender, config: &AdapterConfig) -> Self {
        Self {
            registry,
            sender,
            identity: config.service_name.clone(),
            unhandled: config.unhandled,
        }
    }

    pub fn registry(&self) -> &TypedRegistry {
        &self.registry
    }

    pub fn unhandled_policy(&self) -> UnhandledPolicy {
        self.unhandled
    }

    pub async fn handle(&self, envelope: &Envelope) -> Result<Disposition, DispatchError> {
        let span = info_span!(
            "dispatch",
            event_type = %envelope.event_type(),
            context = %envelope.context(),
            event_id = %envelope.id(),
        );
        self.dispatch(envelope).instrument(span).await
    }

    async fn dispatch(&self, envelope: &Envelope) -> Result<Disposition, DispatchError> {
        let Some((triggered, handler)) = self.resolve(envelope) else {
            return self.unhandled(envelope);
        };
        info!(task = handler.task(), "handling triggered event");

        let prepared = match handler.prepare(envelope.data(), &self.identity) {
            Ok(prepared) => prepared,
            Err(err) => {
                warn!(error = %err, "triggered payload could not be decoded");
                let outcome = TaskOutcome::errored(
                    Scope::from_payload_lossy(envelope.data()),
                    format!("failed to decode {triggered} event: {err}"),
                );
                return self.finish(&triggered, outcome, envelope).await;
            }
        };

        let (scope, execution) = match prepared {
            Prepared::OutOfScope { reason } => {
                info!(%reason, "not handling event");
                return Ok(Disposition::OutOfScope);
            }
            Prepared::Ready { scope, execution } => (scope, execution),
        };

        let started = TaskOutcome::succeeded(scope.clone());
        if let Err(err) = self
            .sender
            .send(&triggered.with_phase(Phase::Started), &started, envelope)
            .await
        {
            warn!(error = %err, "started event could not be sent, continuing");
        }

        let outcome = match execution.await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "handler failed");
                TaskOutcome::from_error(scope, &err)
            }
        };

        self.finish(&triggered, outcome, envelope).await
    }

    fn resolve(&self, envelope: &Envelope) -> Option<(EventType, Arc<dyn DynHandler>)> {
        let event_type = envelope.parsed_type().ok()?;
        if event_type.phase() != Phase::Triggered {
            return None;
        }
        let handler = self.registry.get(envelope.event_type())?;
        Some((event_type, handler))
    }

    fn unhandled(&self, envelope: &Envelope) -> Result<Disposition, DispatchError> {
        match self.unhandled {
            UnhandledPolicy::Ignore => {
                debug!("no handler registered, ignoring");
                Ok(Disposition::Ignored)
            }
            UnhandledPolicy::Fail => {
                error!("no handler registered for event type");
                Err(DispatchError::Unhandled(envelope.event_type().to_string()))
            }
        }
    }

    async fn finish(
        &self,
        triggered: &EventType,
        outcome: TaskOutcome,
        envelope: &Envelope,
    ) -> Result<Disposition, DispatchError> {
        let finished = triggered.with_phase(Phase::Finished);
        match self.sender.send(&finished, &outcome, envelope).await {
            Ok(ack) => {
                info!(
                    status = ?outcome.status,
                    result = ?outcome.result,
                    finished_id = %ack.event_id,
                    "task finished"
                );
                Ok(Disposition::Finished(outcome))
            }
            Err(source) => {
                error!(error = %source, "finished event could not be sent");
                Err(DispatchError::FinishedNotSent {
                    context: envelope.context().clone(),
                    source,
                })
            }
        }
    }
}
