// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Seam between the command layer and whatever performs the network call.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BackendError;

/// HTTP verbs used by the console commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Lower-case verb as handed to the executor (`"get"`, `"put"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request handed to a [`RequestExecutor`].
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Resource path relative to the console API root, e.g. `costs`.
    pub resource: String,
    pub body: Option<Value>,
    pub query: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
}

impl ApiRequest {
    pub fn new(method: Method, resource: impl Into<String>) -> Self {
        Self {
            method,
            resource: resource.into(),
            body: None,
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Successful executor outcome. `data` is `None` for body-less responses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiResponse {
    pub data: Option<Value>,
}

impl ApiResponse {
    pub fn new(data: Value) -> Self {
        Self { data: Some(data) }
    }

    pub fn empty() -> Self {
        Self { data: None }
    }
}

/// Performs one network call per [`execute`](RequestExecutor::execute).
///
/// Implementations own transport concerns (timeouts, TLS, authentication).
/// On failure they return a [`BackendError`] wrapping the raw error payload;
/// the command layer hands it back to its caller unchanged.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, BackendError>;
}

#[async_trait]
impl<T> RequestExecutor for &T
where
    T: RequestExecutor + ?Sized,
{
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, BackendError> {
        (**self).execute(request).await
    }
}

#[async_trait]
impl<T> RequestExecutor for std::sync::Arc<T>
where
    T: RequestExecutor + ?Sized,
{
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, BackendError> {
        (**self).execute(request).await
    }
}
