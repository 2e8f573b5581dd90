//! Handlers - task handler families shipped with the adapter.
//!
//! - **action**: remediation actions with an injectable settle wait
//! - **get_sli**: provider-scoped SLI retrieval backed by `sli.yaml`

pub mod action;
pub mod get_sli;

pub use self::action::{ActionHandler, ActionRequest, ActionTriggered};
pub use self::get_sli::{
    GetSliHandler, GetSliRequest, GetSliTriggered, MetricsBackend, MetricsError, SliConfig,
    SliResult, StaticMetrics,
};
