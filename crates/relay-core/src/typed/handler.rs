//! Handler trait - 1 つの task 型に対するドメインロジック
//!
//! # 学習ポイント
//! - ジェネリック trait (Handler<T>)
//! - Object-safe trait (DynHandler)
//! - Type erasure パターン (TypedHandler<T, H> → DynHandler)
//! - decode と scope 判定は同期、実行だけ `BoxFuture` で遅延

use std::marker::PhantomData;

use async_trait::async_trait;
use futures::future::BoxFuture;

use super::codec::{CodecError, PayloadCodec};
use super::task::Task;
use crate::domain::{HandlerError, Scope, TaskOutcome};

/// Executes one decoded, in-scope task.
///
/// # Example
/// ```ignore
/// struct DeploymentHandler;
///
/// #[async_trait]
/// impl Handler<DeploymentTriggered> for DeploymentHandler {
///     async fn handle(&self, task: DeploymentTriggered) -> Result<TaskOutcome, HandlerError> {
///         Ok(TaskOutcome::succeeded(task.scope))
///     }
/// }
/// ```
///
/// Implementations are shared across concurrent executions; one execution
/// runs sequentially and reports nothing besides its final outcome.
#[async_trait]
pub trait Handler<T: Task>: Send + Sync {
    async fn handle(&self, task: T) -> Result<TaskOutcome, HandlerError>;

    /// Handler-specific scope rule. Returning `false` makes the event a
    /// silent no-op for this handler.
    fn accepts(&self, _task: &T) -> bool {
        true
    }
}

/// Handler execution that has not started yet.
///
/// The future is lazy: nothing in the handler runs until it is polled.
pub type Execution<'a> = BoxFuture<'a, Result<TaskOutcome, HandlerError>>;

/// Result of decoding and scope-filtering a triggered payload.
pub enum Prepared<'a> {
    /// Not this handler's event.
    OutOfScope { reason: String },

    /// Ready to run; `scope` is what started/finished payloads carry.
    Ready { scope: Scope, execution: Execution<'a> },
}

/// Object-safe handler, stored as `Arc<dyn DynHandler>` in the registry.
pub trait DynHandler: Send + Sync {
    /// Decode `payload` and apply the provider and handler scope rules.
    ///
    /// `identity` is this service's provider name.
    fn prepare<'a>(
        &'a self,
        payload: &serde_json::Value,
        identity: &str,
    ) -> Result<Prepared<'a>, CodecError>;

    fn task(&self) -> &'static str;
}

pub struct TypedHandler<T: Task, H: Handler<T>> {
    handler: H,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Task, H: Handler<T>> TypedHandler<T, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

impl<T: Task, H: Handler<T>> DynHandler for TypedHandler<T, H> {
    fn prepare<'a>(
        &'a self,
        payload: &serde_json::Value,
        identity: &str,
    ) -> Result<Prepared<'a>, CodecError> {
        let task: T = PayloadCodec::decode(payload)?;

        if let Some(provider) = task.provider()
            && provider != identity
        {
            return Ok(Prepared::OutOfScope {
                reason: format!("meant for provider {provider}"),
            });
        }
        if !self.handler.accepts(&task) {
            return Ok(Prepared::OutOfScope {
                reason: format!("not accepted by {} handler", T::TASK),
            });
        }

        let scope = task.scope().clone();
        Ok(Prepared::Ready {
            scope,
            execution: self.handler.handle(task),
        })
    }

    fn task(&self) -> &'static str {
        T::TASK
    }
}
