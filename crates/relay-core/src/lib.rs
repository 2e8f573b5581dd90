//! relay-core
//!
//! Task lifecycle adapter for event-driven orchestration platforms.
//!
//! A `<ns>.<task>.triggered` envelope arrives, the matching typed handler
//! runs, and the adapter answers with `<ns>.<task>.started` and
//! `<ns>.<task>.finished` envelopes carrying the same correlation context.
//!
//! # Modules
//! - **domain**: envelopes, event types, ids, outcomes, handler errors
//! - **ports**: bus, resource repository, clock, id and wait abstractions
//! - **typed**: Task / Handler traits, TypedRegistry, PayloadCodec
//! - **impls**: in-process port implementations (channel bus, recording sink, resource stores)
//! - **app**: configuration, builder, dispatcher, outbound sender, service loop
//! - **handlers**: `action` and `get-sli` task handlers
//! - **observability**: tracing subscriber setup

pub mod app;
pub mod domain;
pub mod handlers;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod typed;

pub use app::{AdapterConfig, App, AppBuilder, Dispatcher, Disposition, Service};
pub use domain::{Envelope, EventType, TaskOutcome};
