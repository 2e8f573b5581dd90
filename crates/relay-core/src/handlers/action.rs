//! `action` task - remediation actions.
//!
//! Only a configured set of action names is handled; anything else is left
//! to other services listening on the same type.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{HandlerError, Scope, TaskOutcome};
use crate::ports::Waiter;
use crate::typed::{Handler, Task};

pub const DEFAULT_ACTION: &str = "action-xyz";
pub const DEFAULT_SETTLE_TIME: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionInfo {
    pub action: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// Either `{"action": {"action": "..."}}` or the flat `{"action": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionRequest {
    Named(String),
    Detailed(ActionInfo),
}

impl ActionRequest {
    pub fn name(&self) -> &str {
        match self {
            ActionRequest::Named(name) => name,
            ActionRequest::Detailed(info) => &info.action,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionTriggered {
    #[serde(flatten)]
    pub scope: Scope,

    pub action: ActionRequest,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem: Option<serde_json::Value>,
}

impl Task for ActionTriggered {
    const TASK: &'static str = "action";

    fn scope(&self) -> &Scope {
        &self.scope
    }
}

pub struct ActionHandler {
    waiter: Arc<dyn Waiter>,
    supported: Vec<String>,
    settle_time: Duration,
}

impl ActionHandler {
    pub fn new(waiter: Arc<dyn Waiter>) -> Self {
        Self {
            waiter,
            supported: vec![DEFAULT_ACTION.to_string()],
            settle_time: DEFAULT_SETTLE_TIME,
        }
    }

    pub fn with_supported_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported = actions.into_iter().map(Into::into).collect();
        self
    }

    /// How long to let the system settle after the action.
    pub fn with_settle_time(mut self, settle_time: Duration) -> Self {
        self.settle_time = settle_time;
        self
    }

    pub fn supports(&self, action: &str) -> bool {
        self.supported.iter().any(|a| a == action)
    }
}

#[async_trait]
impl Handler<ActionTriggered> for ActionHandler {
    async fn handle(&self, task: ActionTriggered) -> Result<TaskOutcome, HandlerError> {
        let action = task.action.name().to_string();
        info!(%action, settle_ms = self.settle_time.as_millis() as u64, "running remediation action");

        self.waiter.wait(self.settle_time).await;

        Ok(TaskOutcome::succeeded(task.scope))
    }

    fn accepts(&self, task: &ActionTriggered) -> bool {
        let supported = self.supports(task.action.name());
        if !supported {
            info!(action = task.action.name(), "unknown action, skipping");
        }
        supported
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Status, Verdict};
    use crate::ports::NoopWaiter;
    use crate::typed::PayloadCodec;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records requested waits instead of sleeping.
    #[derive(Default)]
    struct RecordingWaiter {
        waits: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Waiter for RecordingWaiter {
        async fn wait(&self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
        }
    }

    #[test]
    fn decodes_detailed_and_flat_action() {
        let detailed: ActionTriggered = PayloadCodec::decode(&json!({
            "project": "p", "stage": "s", "service": "svc",
            "action": { "action": "action-xyz", "name": "xyz", "value": 1 }
        }))
        .unwrap();
        assert_eq!(detailed.action.name(), "action-xyz");

        let flat: ActionTriggered = PayloadCodec::decode(&json!({
            "project": "p", "stage": "s", "service": "svc", "action": "scale"
        }))
        .unwrap();
        assert_eq!(flat.action, ActionRequest::Named("scale".to_string()));
    }

    #[test]
    fn missing_action_fails_to_decode() {
        let r = PayloadCodec::decode::<ActionTriggered>(&json!({
            "project": "p", "stage": "s", "service": "svc"
        }));
        assert!(r.is_err());
    }

    #[tokio::test]
    async fn supported_action_waits_then_succeeds() {
        let waiter = Arc::new(RecordingWaiter::default());
        let handler = ActionHandler::new(waiter.clone()).with_settle_time(Duration::from_secs(7));
        let task = ActionTriggered {
            scope: Scope::new("p", "s", "svc").with_label("team", "sre"),
            action: ActionRequest::Named(DEFAULT_ACTION.to_string()),
            problem: None,
        };

        assert!(handler.accepts(&task));
        let outcome = handler.handle(task).await.unwrap();
        assert_eq!(outcome.status, Status::Succeeded);
        assert_eq!(outcome.result, Verdict::Pass);
        assert_eq!(outcome.scope.labels["team"], "sre");
        assert_eq!(*waiter.waits.lock().unwrap(), vec![Duration::from_secs(7)]);
    }

    #[test]
    fn unknown_action_is_not_accepted() {
        let handler = ActionHandler::new(Arc::new(NoopWaiter));
        let task = ActionTriggered {
            scope: Scope::new("p", "s", "svc"),
            action: ActionRequest::Named("unknown-action".to_string()),
            problem: None,
        };
        assert!(!handler.accepts(&task));
    }

    #[test]
    fn supported_set_is_configurable() {
        let handler = ActionHandler::new(Arc::new(NoopWaiter)).with_supported_actions(["restart", "scale"]);
        assert!(handler.supports("scale"));
        assert!(!handler.supports(DEFAULT_ACTION));
    }
}
