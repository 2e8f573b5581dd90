//! EventType - `<namespace>.<task>.<phase>` naming support.
//!
//! The namespace may itself contain dots (`sh.keptn.event`), so parsing works
//! from the right: the last segment is the phase, the one before it the task.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle phase of a task event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Triggered,
    Started,
    Finished,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Triggered => "triggered",
            Phase::Started => "started",
            Phase::Finished => "finished",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = EventTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "triggered" => Ok(Phase::Triggered),
            "started" => Ok(Phase::Started),
            "finished" => Ok(Phase::Finished),
            other => Err(EventTypeError::UnknownPhase(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventTypeError {
    #[error("event type '{0}' is not of the form <namespace>.<task>.<phase>")]
    Malformed(String),

    #[error("unknown lifecycle phase '{0}'")]
    UnknownPhase(String),
}

/// Parsed task event type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventType {
    namespace: String,
    task: String,
    phase: Phase,
}

impl EventType {
    pub fn new(namespace: impl Into<String>, task: impl Into<String>, phase: Phase) -> Self {
        Self {
            namespace: namespace.into(),
            task: task.into(),
            phase,
        }
    }

    pub fn triggered(namespace: impl Into<String>, task: impl Into<String>) -> Self {
        Self::new(namespace, task, Phase::Triggered)
    }

    pub fn parse(value: &str) -> Result<Self, EventTypeError> {
        let mut parts = value.rsplitn(3, '.');
        let (Some(phase), Some(task), Some(namespace)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(EventTypeError::Malformed(value.to_string()));
        };
        if task.is_empty() || namespace.is_empty() {
            return Err(EventTypeError::Malformed(value.to_string()));
        }
        Ok(Self::new(namespace, task, phase.parse()?))
    }

    /// Same namespace and task, different phase.
    pub fn with_phase(&self, phase: Phase) -> Self {
        Self {
            namespace: self.namespace.clone(),
            task: self.task.clone(),
            phase,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.namespace, self.task, self.phase)
    }
}

impl FromStr for EventType {
    type Err = EventTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EventType {
    type Error = EventTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EventType> for String {
    fn from(value: EventType) -> Self {
        value.to_string()
    }
}
