//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）: 期待した task の handler や sink が
//!   欠けていれば subscribe 前に `BuildError`

use std::sync::Arc;

use super::config::{AdapterConfig, ConfigError};
use super::dispatcher::Dispatcher;
use super::outbound::OutboundSender;
use super::service::Service;
use crate::ports::{Clock, EventSink, EventSource, IdGenerator, SystemClock, UlidGenerator};
use crate::typed::{Handler, RegistryError, Task, TypedRegistry};

/// Builds an [`App`].
///
/// # Example
/// ```ignore
/// let app = AppBuilder::new(config)
///     .register::<ActionTriggered, _>(ActionHandler::new(Arc::new(TokioWaiter)))?
///     .expect_tasks(&["action"])
///     .with_sink(Arc::new(bus.clone()))
///     .build()?;
/// ```
pub struct AppBuilder {
    config: AdapterConfig,
    registry: TypedRegistry,
    expected_tasks: Option<Vec<String>>,
    sink: Option<Arc<dyn EventSink>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing tasks: {0:?}. These tasks were expected but not registered.")]
    MissingTaskTypes(Vec<String>),

    #[error("No event sink configured")]
    MissingSink,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AppBuilder {
    pub fn new(config: AdapterConfig) -> Self {
        let registry = TypedRegistry::new(config.event_namespace.as_str());
        Self {
            config,
            registry,
            expected_tasks: None,
            sink: None,
            clock: None,
            ids: None,
        }
    }

    pub fn register<T: Task, H: Handler<T> + 'static>(
        mut self,
        handler: H,
    ) -> Result<Self, RegistryError> {
        self.registry.register::<T, H>(handler)?;
        Ok(self)
    }

    /// Task names (e.g. `"action"`) that must have a handler at build time.
    pub fn expect_tasks(mut self, tasks: &[&str]) -> Self {
        self.expected_tasks = Some(tasks.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Defaults to [`SystemClock`].
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Defaults to a [`UlidGenerator`] on the configured clock.
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn build(self) -> Result<App, BuildError> {
        self.config.validate()?;

        if let Some(expected) = &self.expected_tasks {
            let registered = self.registry.registered_tasks();
            let missing: Vec<String> = expected
                .iter()
                .filter(|t| !registered.contains(&t.as_str()))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingTaskTypes(missing));
            }
        }

        let sink = self.sink.ok_or(BuildError::MissingSink)?;
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(clock.clone())) as Arc<dyn IdGenerator>);

        let sender = OutboundSender::new(sink, clock, ids, &self.config);
        let dispatcher = Dispatcher::new(Arc::new(self.registry), sender, &self.config);

        Ok(App {
            dispatcher: Arc::new(dispatcher),
            config: self.config,
        })
    }
}

/// A wired, validated adapter.
pub struct App {
    dispatcher: Arc<Dispatcher>,
    config: AdapterConfig,
}

impl App {
    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        self.dispatcher.clone()
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Long-running service consuming `source`.
    pub fn service(&self, source: Arc<dyn EventSource>) -> Service {
        Service::new(self.dispatcher.clone(), source)
    }
}
