//! Envelope - wire representation of one occurrence on the bus.
//!
//! Envelopes are immutable once built. The dispatcher never edits an
//! incoming envelope; started/finished envelopes are new values that only
//! copy the correlation context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event_type::{EventType, EventTypeError};
use super::ids::{ContextId, EventId};

pub const SPEC_VERSION: &str = "1.0";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// One event occurrence: type, identity, correlation context and payload.
///
/// `context` is also read from `shkeptncontext` so envelopes produced by
/// Keptn-style brokers decode without translation. A missing `time` decodes
/// as the time of decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    event_type: String,

    id: EventId,

    #[serde(alias = "shkeptncontext")]
    context: ContextId,

    source: String,

    #[serde(default = "Utc::now")]
    time: DateTime<Utc>,

    /// Id of the triggered envelope a started/finished envelope answers.
    #[serde(
        default,
        rename = "triggeredid",
        skip_serializing_if = "Option::is_none"
    )]
    triggered_id: Option<EventId>,

    #[serde(default = "default_spec_version")]
    specversion: String,

    #[serde(default = "default_content_type")]
    datacontenttype: String,

    #[serde(default)]
    data: serde_json::Value,
}

fn default_spec_version() -> String {
    SPEC_VERSION.to_string()
}

fn default_content_type() -> String {
    JSON_CONTENT_TYPE.to_string()
}

impl Envelope {
    pub fn new(
        event_type: impl Into<String>,
        id: EventId,
        context: ContextId,
        source: impl Into<String>,
        time: DateTime<Utc>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            id,
            context,
            source: source.into(),
            time,
            triggered_id: None,
            specversion: default_spec_version(),
            datacontenttype: default_content_type(),
            data,
        }
    }

    pub fn with_triggered_id(mut self, triggered_id: EventId) -> Self {
        self.triggered_id = Some(triggered_id);
        self
    }

    /// Raw type string as received.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Parsed type; fails for types outside the task lifecycle naming scheme.
    pub fn parsed_type(&self) -> Result<EventType, EventTypeError> {
        EventType::parse(&self.event_type)
    }

    pub fn id(&self) -> &EventId {
        &self.id
    }

    pub fn context(&self) -> &ContextId {
        &self.context
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    pub fn triggered_id(&self) -> Option<&EventId> {
        self.triggered_id.as_ref()
    }

    pub fn spec_version(&self) -> &str {
        &self.specversion
    }

    pub fn content_type(&self) -> &str {
        &self.datacontenttype
    }

    pub fn data(&self) -> &serde_json::Value {
        &self.data
    }
}
