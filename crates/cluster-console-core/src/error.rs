// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy shared by the command layer.
//!
//! Backend failures travel through the crate untouched inside
//! [`BackendError`]; everything else the layer can detect on its own
//! (undecodable payloads, malformed log stream names, unusable cluster
//! configurations) gets its own variant on [`CommandError`] so callers can
//! tell the two apart.

use std::fmt;

use serde_json::Value;

use crate::clusters::ClusterConfigurationError;
use crate::logs::LogStreamError;

/// HTTP status the backend answers with when the cost explorer cannot be reached.
const COST_EXPLORER_UNAVAILABLE_STATUS: u16 = 405;

/// Opaque failure produced by a [`RequestExecutor`](crate::executor::RequestExecutor).
///
/// The payload is whatever the transport reported, typically shaped like
/// `{ "response": { "status": 400, "data": { "message": "..." } } }`. It is
/// never reshaped; the accessors below only read from it.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendError {
    payload: Value,
}

impl BackendError {
    pub fn new(payload: Value) -> Self {
        Self { payload }
    }

    /// The untouched payload as received from the executor.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn into_payload(self) -> Value {
        self.payload
    }

    /// Message found at `response.data.message`, if any.
    pub fn message(&self) -> Option<&str> {
        self.payload
            .pointer("/response/data/message")
            .and_then(Value::as_str)
    }

    /// HTTP status found at `response.status`, if any.
    pub fn status(&self) -> Option<u16> {
        self.payload
            .pointer("/response/status")
            .and_then(Value::as_u64)
            .and_then(|status| u16::try_from(status).ok())
    }

    /// Whether the backend refused cost monitoring because the cost explorer is not reachable.
    pub fn is_cost_explorer_unavailable(&self) -> bool {
        self.status() == Some(COST_EXPLORER_UNAVAILABLE_STATUS)
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status(), self.message()) {
            (Some(status), Some(message)) => {
                write!(f, "backend request failed with status {status}: {message}")
            }
            (None, Some(message)) => write!(f, "backend request failed: {message}"),
            (Some(status), None) => write!(f, "backend request failed with status {status}"),
            (None, None) => f.write_str("backend request failed"),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<Value> for BackendError {
    fn from(payload: Value) -> Self {
        Self::new(payload)
    }
}

/// Errors returned by [`CommandDispatcher`](crate::commands::CommandDispatcher).
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The executor failed; the original error is carried as-is.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The call succeeded but the payload did not have the expected shape.
    #[error("{command}: unexpected response payload: {source}")]
    MalformedPayload {
        command: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A log stream name could not be decomposed.
    #[error(transparent)]
    LogStream(#[from] LogStreamError),

    /// The cluster configuration to submit could not be tagged.
    #[error(transparent)]
    ClusterConfiguration(#[from] ClusterConfigurationError),
}

impl CommandError {
    /// Returns the backend error when the failure originated in the executor.
    pub fn as_backend(&self) -> Option<&BackendError> {
        match self {
            Self::Backend(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn backend_error_reads_message_and_status() {
        let error = BackendError::new(json!({
            "response": { "status": 400, "data": { "message": "some-error-message" } }
        }));
        assert_eq!(error.message(), Some("some-error-message"));
        assert_eq!(error.status(), Some(400));
        assert_eq!(
            error.to_string(),
            "backend request failed with status 400: some-error-message"
        );
    }

    #[test]
    fn backend_error_without_response_still_displays() {
        let error = BackendError::new(json!("connection reset"));
        assert_eq!(error.message(), None);
        assert_eq!(error.status(), None);
        assert_eq!(error.to_string(), "backend request failed");
    }

    #[test]
    fn backend_error_keeps_payload_untouched() {
        let payload = json!({ "response": { "data": { "message": "m" } }, "extra": [1, 2] });
        let error = BackendError::from(payload.clone());
        assert_eq!(error.payload(), &payload);
        assert_eq!(error.into_payload(), payload);
    }

    #[test]
    fn detects_unreachable_cost_explorer() {
        let unavailable = BackendError::new(json!({ "response": { "status": 405 } }));
        let forbidden = BackendError::new(json!({ "response": { "status": 403 } }));
        assert!(unavailable.is_cost_explorer_unavailable());
        assert!(!forbidden.is_cost_explorer_unavailable());
    }

    #[test]
    fn command_error_is_transparent_for_backend_failures() {
        let backend = BackendError::new(json!({ "response": { "data": { "message": "boom" } } }));
        let error = CommandError::from(backend.clone());
        assert_eq!(error.to_string(), backend.to_string());
        assert_eq!(error.as_backend(), Some(&backend));
    }
}
