// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Mock request executors

use cluster_console_core::{ApiRequest, ApiResponse, BackendError, RequestExecutor};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays queued outcomes in order and records every request it receives.
///
/// Once the queue is drained it answers with an empty response.
#[derive(Default)]
pub struct RecordingExecutor {
    outcomes: Mutex<VecDeque<Result<ApiResponse, BackendError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

#[allow(dead_code)]
impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_with(self, data: Value) -> Self {
        self.push(Ok(ApiResponse::new(data)))
    }

    pub fn fail_with(self, error: BackendError) -> Self {
        self.push(Err(error))
    }

    fn push(self, outcome: Result<ApiResponse, BackendError>) -> Self {
        self.outcomes
            .lock()
            .expect("outcomes lock")
            .push_back(outcome);
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait::async_trait]
impl RequestExecutor for RecordingExecutor {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, BackendError> {
        self.requests.lock().expect("requests lock").push(request);
        self.outcomes
            .lock()
            .expect("outcomes lock")
            .pop_front()
            .unwrap_or_else(|| Ok(ApiResponse::empty()))
    }
}

/// Error shaped like the ones raised by the console's HTTP client.
#[allow(dead_code)]
pub fn backend_error(message: &str, status: u16) -> BackendError {
    BackendError::new(json!({
        "response": {
            "status": status,
            "data": { "message": message }
        }
    }))
}
