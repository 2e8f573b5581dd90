//! Outcome model: status/result semantics of a task execution.
//!
//! `status` says whether the handler ran without an infrastructure or logic
//! failure; `result` is the business verdict. The two are independent: a
//! handler may run fine and still report `fail`.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use tracing::warn;

use super::errors::HandlerError;

/// Keys of the common payload fields. Details never shadow them.
pub const RESERVED_KEYS: [&str; 7] = [
    "project", "stage", "service", "labels", "status", "result", "message",
];

/// Did the handler execute without failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Succeeded,
    Errored,
}

/// Business-level verdict of a task execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    #[serde(alias = "failed")]
    Fail,
    Warning,
}

/// Scoping fields carried unchanged from the triggered payload to the
/// started and finished payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub project: String,
    pub stage: String,
    pub service: String,

    #[serde(
        default,
        deserialize_with = "nullable_labels",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub labels: HashMap<String, String>,
}

fn nullable_labels<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<HashMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Scope {
    pub fn new(
        project: impl Into<String>,
        stage: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            stage: stage.into(),
            service: service.into(),
            labels: HashMap::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Best-effort extraction from a payload that failed to decode.
    ///
    /// Missing or mistyped fields become empty strings; non-string label
    /// values are dropped.
    pub fn from_payload_lossy(payload: &serde_json::Value) -> Self {
        let text = |key: &str| {
            payload
                .get(key)
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let labels = payload
            .get("labels")
            .and_then(serde_json::Value::as_object)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            project: text("project"),
            stage: text("stage"),
            service: text("service"),
            labels,
        }
    }
}

/// Outcome of one task execution, as carried by the finished payload.
///
/// Details hold task-specific result fields (e.g. SLI values) and are
/// flattened next to the common fields, so a detail can never use one of
/// the [`RESERVED_KEYS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    #[serde(flatten)]
    pub scope: Scope,

    pub status: Status,

    pub result: Verdict,

    #[serde(default)]
    pub message: String,

    #[serde(flatten)]
    details: serde_json::Map<String, serde_json::Value>,
}

impl TaskOutcome {
    pub fn succeeded(scope: Scope) -> Self {
        Self {
            scope,
            status: Status::Succeeded,
            result: Verdict::Pass,
            message: String::new(),
            details: serde_json::Map::new(),
        }
    }

    pub fn errored(scope: Scope, message: impl Into<String>) -> Self {
        Self {
            scope,
            status: Status::Errored,
            result: Verdict::Fail,
            message: message.into(),
            details: serde_json::Map::new(),
        }
    }

    /// Mirror a handler error's status/result/message verbatim.
    pub fn from_error(scope: Scope, error: &HandlerError) -> Self {
        Self {
            scope,
            status: error.status,
            result: error.result,
            message: error.message.clone(),
            details: serde_json::Map::new(),
        }
    }

    pub fn with_result(mut self, result: Verdict) -> Self {
        self.result = result;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach a task-specific field. Reserved keys are dropped with a warning.
    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            warn!(key = %key, "detail would shadow a common field, dropped");
            return self;
        }
        self.details.insert(key, value);
        self
    }

    pub fn details(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.details
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.scope.labels.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_and_verdict_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Status::Succeeded).unwrap(), "\"succeeded\"");
        assert_eq!(serde_json::to_string(&Status::Errored).unwrap(), "\"errored\"");
        assert_eq!(serde_json::to_string(&Verdict::Pass).unwrap(), "\"pass\"");
        assert_eq!(serde_json::to_string(&Verdict::Fail).unwrap(), "\"fail\"");
        assert_eq!(serde_json::to_string(&Verdict::Warning).unwrap(), "\"warning\"");
    }

    #[test]
    fn outcome_flattens_scope_and_details() {
        let o = TaskOutcome::succeeded(Scope::new("p", "s", "svc"))
            .with_label("link", "https://example")
            .with_detail("get-sli", json!({ "indicatorValues": [] }));

        let v = serde_json::to_value(&o).unwrap();
        assert_eq!(v["project"], "p");
        assert_eq!(v["stage"], "s");
        assert_eq!(v["service"], "svc");
        assert_eq!(v["labels"]["link"], "https://example");
        assert_eq!(v["status"], "succeeded");
        assert_eq!(v["result"], "pass");
        assert!(v["get-sli"]["indicatorValues"].is_array());
    }

    #[test]
    fn reserved_detail_keys_cannot_override_common_fields() {
        let o = TaskOutcome::succeeded(Scope::new("p", "s", "svc"))
            .with_detail("status", json!("errored"))
            .with_detail("project", json!("someone-else"))
            .with_detail("labels", json!({ "x": "y" }))
            .with_detail("extra", json!(1));

        assert_eq!(o.details().len(), 1);
        let v = serde_json::to_value(&o).unwrap();
        assert_eq!(v["status"], "succeeded");
        assert_eq!(v["project"], "p");
        assert!(v.get("labels").is_none());
        assert_eq!(v["extra"], 1);

        let back: TaskOutcome = serde_json::from_value(v).unwrap();
        assert_eq!(back, o);
    }

    #[test]
    fn scope_accepts_null_labels() {
        let s: Scope = serde_json::from_value(json!({
            "project": "p", "stage": "s", "service": "svc", "labels": null
        }))
        .unwrap();
        assert!(s.labels.is_empty());
    }

    #[test]
    fn scope_requires_project_stage_service() {
        let r = serde_json::from_value::<Scope>(json!({ "project": "p" }));
        assert!(r.is_err());
    }

    #[test]
    fn lossy_scope_recovers_what_it_can() {
        let s = Scope::from_payload_lossy(&json!({
            "project": "p",
            "stage": 7,
            "labels": { "a": "b", "n": 1 }
        }));
        assert_eq!(s.project, "p");
        assert_eq!(s.stage, "");
        assert_eq!(s.service, "");
        assert_eq!(s.labels.len(), 1);
        assert_eq!(s.labels["a"], "b");
    }

    #[test]
    fn from_error_mirrors_triple() {
        let err = HandlerError::new("backend down").with_result(Verdict::Warning);
        let o = TaskOutcome::from_error(Scope::default(), &err);
        assert_eq!(o.status, Status::Errored);
        assert_eq!(o.result, Verdict::Warning);
        assert_eq!(o.message, "backend down");
    }
}
