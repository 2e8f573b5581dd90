//! Service - dispatcher に envelope を流す subscribe ループ
//!
//! # 購読範囲
//! - `ignore` policy: 登録済みの triggered type だけ
//! - `fail` policy: namespace の triggered type すべて → 未知の task も
//!   dispatcher に届き、`Unhandled` でループが止まる
//!
//! # 学習ポイント
//! - `JoinSet` による envelope ごとの fan-out
//! - `watch` channel での shutdown 通知
//! - 終了時は in-flight の dispatch を必ず待つ（drain）

use std::sync::Arc;

use futures::StreamExt;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info};

use super::config::UnhandledPolicy;
use super::dispatcher::{DispatchError, Disposition, Dispatcher};
use crate::domain::Envelope;
use crate::ports::{EventSource, SourceError, Subscription};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Subscribe(#[from] SourceError),

    #[error("dispatch failed: {0}")]
    Fatal(#[source] DispatchError),

    #[error("service task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub struct Service {
    dispatcher: Arc<Dispatcher>,
    source: Arc<dyn EventSource>,
}

type Dispatched = Result<Disposition, DispatchError>;

impl Service {
    pub fn new(dispatcher: Arc<Dispatcher>, source: Arc<dyn EventSource>) -> Self {
        Self { dispatcher, source }
    }

    /// Run until `shutdown` flips to `true`, the source ends, or a dispatch
    /// fails fatally. In-flight dispatches are always awaited before return.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), ServiceError> {
        let subscription = self.subscription();
        let mut stream = self.source.subscribe(&subscription).await?;
        info!(?subscription, "subscribed");

        let mut in_flight: JoinSet<Dispatched> = JoinSet::new();
        let mut fatal: Option<DispatchError> = None;

        while fatal.is_none() && !*shutdown.borrow() {
            tokio::select! {
                changed = shutdown.changed() => {
                    // a dropped sender counts as shutdown
                    if changed.is_err() {
                        break;
                    }
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    fatal = Self::reap(joined);
                }
                next = stream.next() => {
                    let Some(envelope) = next else {
                        info!("event source closed");
                        break;
                    };
                    self.spawn_dispatch(&mut in_flight, envelope);
                }
            }
        }

        info!(in_flight = in_flight.len(), "draining in-flight dispatches");
        while let Some(joined) = in_flight.join_next().await {
            let failed = Self::reap(joined);
            if fatal.is_none() {
                fatal = failed;
            }
        }

        match fatal {
            Some(err) => Err(ServiceError::Fatal(err)),
            None => Ok(()),
        }
    }

    /// Run on a background task with its own shutdown switch.
    pub fn spawn(self) -> ServiceHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(self.run(shutdown_rx));
        ServiceHandle { shutdown_tx, join }
    }

    fn subscription(&self) -> Subscription {
        let registry = self.dispatcher.registry();
        match self.dispatcher.unhandled_policy() {
            UnhandledPolicy::Ignore => Subscription::Types(registry.event_types()),
            UnhandledPolicy::Fail => Subscription::Triggered {
                namespace: registry.namespace().to_string(),
            },
        }
    }

    fn spawn_dispatch(&self, in_flight: &mut JoinSet<Dispatched>, envelope: Envelope) {
        let dispatcher = Arc::clone(&self.dispatcher);
        in_flight.spawn(async move { dispatcher.handle(&envelope).await });
    }

    fn reap(joined: Result<Dispatched, tokio::task::JoinError>) -> Option<DispatchError> {
        match joined {
            Ok(Ok(_)) => None,
            Ok(Err(err)) => {
                error!(error = %err, "fatal dispatch error, stopping");
                Some(err)
            }
            Err(join_err) => {
                error!(error = %join_err, "dispatch task panicked");
                None
            }
        }
    }
}

/// Handle to a spawned [`Service`].
/// - `request_shutdown()` stops intake; in-flight dispatches still finish
/// - `shutdown_and_join()` also waits for the service result
pub struct ServiceHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<Result<(), ServiceError>>,
}

impl ServiceHandle {
    pub fn request_shutdown(&self) {
        // receiver may already be gone if the service stopped on its own
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn join(self) -> Result<(), ServiceError> {
        self.join.await?
    }

    pub async fn shutdown_and_join(self) -> Result<(), ServiceError> {
        self.request_shutdown();
        self.join().await
    }
}
