//! Errors raised by task handlers.

use thiserror::Error;

use super::outcome::{Status, Verdict};

/// Domain logic failure reported by a handler.
///
/// The status/result/message triple is mirrored verbatim into the
/// synthesized finished envelope. The core never retries the handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (status={status:?}, result={result:?})")]
pub struct HandlerError {
    pub status: Status,
    pub result: Verdict,
    pub message: String,
}

impl HandlerError {
    /// `errored` / `fail` with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: Status::Errored,
            result: Verdict::Fail,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_result(mut self, result: Verdict) -> Self {
        self.result = result;
        self
    }
}
