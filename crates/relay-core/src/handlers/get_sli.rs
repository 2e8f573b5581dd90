//! `get-sli` task - service level indicator retrieval.
//!
//! Provider-scoped: only payloads whose `sliProvider` equals this service's
//! name are handled. Indicator queries come from `<service>/sli.yaml` in the
//! resource repository and are evaluated by a [`MetricsBackend`].

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{HandlerError, Scope, TaskOutcome, Verdict};
use crate::ports::{ResourceScope, ResourceStore};
use crate::typed::{Handler, Task};

pub const SLI_FILE: &str = "sli.yaml";
pub const DATA_SOURCE_LABEL: &str = "Link to Data Source";
pub const DEFAULT_DATA_SOURCE_URL: &str = "https://mydatasource/myquery?testRun=";
pub const TEST_RUN_LABEL: &str = "testRunId";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFilter {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSliRequest {
    pub sli_provider: String,

    #[serde(default)]
    pub start: String,

    #[serde(default)]
    pub end: String,

    #[serde(default)]
    pub indicators: Vec<String>,

    #[serde(default)]
    pub custom_filters: Vec<CustomFilter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetSliTriggered {
    #[serde(flatten)]
    pub scope: Scope,

    #[serde(rename = "get-sli")]
    pub get_sli: GetSliRequest,
}

impl Task for GetSliTriggered {
    const TASK: &'static str = "get-sli";

    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn provider(&self) -> Option<&str> {
        Some(&self.get_sli.sli_provider)
    }
}

/// One entry of `indicatorValues`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliResult {
    pub metric: String,
    pub value: f64,
    pub success: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

/// Contents of `sli.yaml`: indicator name → backend query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SliConfig {
    #[serde(default)]
    pub indicators: BTreeMap<String, String>,
}

impl SliConfig {
    /// Empty files are an empty config.
    pub fn parse(content: &[u8]) -> Result<Self, serde_yaml::Error> {
        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_yaml::from_slice(content)
    }

    pub fn query(&self, indicator: &str) -> Option<&str> {
        self.indicators.get(indicator).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricsError {
    #[error("query for {metric} failed: {message}")]
    Query { metric: String, message: String },

    #[error("no query defined for {0}")]
    UnknownIndicator(String),
}

/// Evaluates one indicator over the requested window.
#[async_trait]
pub trait MetricsBackend: Send + Sync {
    async fn fetch(
        &self,
        indicator: &str,
        query: Option<&str>,
        request: &GetSliRequest,
    ) -> Result<f64, MetricsError>;
}

/// Returns the same value for every indicator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticMetrics(pub f64);

impl Default for StaticMetrics {
    fn default() -> Self {
        Self(123.4)
    }
}

#[async_trait]
impl MetricsBackend for StaticMetrics {
    async fn fetch(
        &self,
        _indicator: &str,
        _query: Option<&str>,
        _request: &GetSliRequest,
    ) -> Result<f64, MetricsError> {
        Ok(self.0)
    }
}

pub struct GetSliHandler {
    service_name: String,
    resources: Arc<dyn ResourceStore>,
    metrics: Arc<dyn MetricsBackend>,
    data_source_url: String,
}

impl GetSliHandler {
    pub fn new(
        service_name: impl Into<String>,
        resources: Arc<dyn ResourceStore>,
        metrics: Arc<dyn MetricsBackend>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            resources,
            metrics,
            data_source_url: DEFAULT_DATA_SOURCE_URL.to_string(),
        }
    }

    /// Prefix of the data source link; the test run id is appended.
    pub fn with_data_source_url(mut self, url: impl Into<String>) -> Self {
        self.data_source_url = url.into();
        self
    }

    fn sli_file(&self) -> String {
        format!("{}/{}", self.service_name, SLI_FILE)
    }

    async fn load_config(&self, scope: &Scope) -> Result<SliConfig, HandlerError> {
        let resource = ResourceScope::for_scope(scope, self.sli_file());
        let content = self
            .resources
            .get_resource(&resource)
            .await
            .map_err(|err| HandlerError::new(format!("error while fetching SLI file: {err}")))?;
        debug!(resource = %resource, bytes = content.len(), "SLI file fetched");

        SliConfig::parse(&content)
            .map_err(|err| HandlerError::new(format!("error while parsing SLI file: {err}")))
    }

    async fn evaluate(&self, config: &SliConfig, request: &GetSliRequest) -> Vec<SliResult> {
        let mut results = Vec::with_capacity(request.indicators.len());
        for indicator in &request.indicators {
            let result = match self
                .metrics
                .fetch(indicator, config.query(indicator), request)
                .await
            {
                Ok(value) => SliResult {
                    metric: indicator.clone(),
                    value,
                    success: true,
                    message: String::new(),
                },
                Err(err) => {
                    warn!(%indicator, error = %err, "indicator could not be fetched");
                    SliResult {
                        metric: indicator.clone(),
                        value: 0.0,
                        success: false,
                        message: err.to_string(),
                    }
                }
            };
            results.push(result);
        }
        results
    }
}

#[async_trait]
impl Handler<GetSliTriggered> for GetSliHandler {
    async fn handle(&self, task: GetSliTriggered) -> Result<TaskOutcome, HandlerError> {
        let config = self.load_config(&task.scope).await?;
        let values = self.evaluate(&config, &task.get_sli).await;

        let failed = values.iter().filter(|v| !v.success).count();
        info!(indicators = values.len(), failed, "SLI values retrieved");

        let test_run = task
            .scope
            .labels
            .get(TEST_RUN_LABEL)
            .cloned()
            .unwrap_or_default();
        let link = format!("{}{}", self.data_source_url, test_run);

        let mut outcome = TaskOutcome::succeeded(task.scope)
            .with_label(DATA_SOURCE_LABEL, link)
            .with_detail(
                "get-sli",
                serde_json::json!({
                    "start": task.get_sli.start,
                    "end": task.get_sli.end,
                    "indicatorValues": values,
                }),
            );
        if failed > 0 {
            outcome = outcome
                .with_result(Verdict::Warning)
                .with_message(format!("{failed} indicator(s) could not be retrieved"));
        }
        Ok(outcome)
    }
}
