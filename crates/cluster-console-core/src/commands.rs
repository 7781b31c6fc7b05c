// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Typed console commands and queries.
//!
//! Each method performs exactly one executor call, except
//! [`list_clusters`](CommandDispatcher::list_clusters) which issues one per
//! page. Backend failures come back as [`CommandError::Backend`] holding the
//! executor's error unchanged, so the caller can render
//! `response.data.message` as the backend wrote it.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::clusters::{
    self, ClusterInfoSummary, ListClustersResponse, ServiceVersion, VersionResponse,
};
use crate::config::ConsoleEnv;
use crate::costs::{CostMonitoringData, CostMonitoringDataResponse, CostMonitoringStatusResponse};
use crate::error::CommandError;
use crate::executor::{ApiRequest, ApiResponse, Method, RequestExecutor};
use crate::logs::{self, LogEvent, LogEventsResponse, LogStreamView, LogStreamsResponse};

/// Cost monitoring resource; `GET` reads the status, `PUT` activates it.
const COSTS_RESOURCE: &str = "costs";
/// Proxy resource forwarding to the cluster service API.
const API_RESOURCE: &str = "api";
/// Console manager endpoint reporting the cluster service version.
const VERSION_RESOURCE: &str = "manager/get_version";
const CLUSTERS_PATH: &str = "/v3/clusters";

/// Issues console commands through a [`RequestExecutor`].
#[derive(Debug, Clone)]
pub struct CommandDispatcher<E> {
    executor: E,
    region: Option<String>,
}

impl<E: RequestExecutor> CommandDispatcher<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            region: None,
        }
    }

    /// Adds a `region` query parameter to cluster service calls.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn from_env(executor: E, env: &ConsoleEnv) -> Self {
        Self {
            executor,
            region: env.region.clone(),
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Turns cost monitoring on for the account.
    pub async fn activate_cost_monitoring(&self) -> Result<(), CommandError> {
        self.send(
            "activate_cost_monitoring",
            ApiRequest::new(Method::Put, COSTS_RESOURCE),
        )
        .await?;
        Ok(())
    }

    /// Whether cost monitoring is active.
    pub async fn get_cost_monitoring_status(&self) -> Result<bool, CommandError> {
        const COMMAND: &str = "get_cost_monitoring_status";
        let response = self
            .send(COMMAND, ApiRequest::new(Method::Get, COSTS_RESOURCE))
            .await?;
        let status: CostMonitoringStatusResponse = decode(COMMAND, response)?;
        Ok(status.active)
    }

    /// Costs of `cluster_name` between `from_date` and `to_date`.
    ///
    /// The bounds are usually the two ends of a
    /// [`TimeRange`](crate::costs::TimeRange).
    pub async fn get_cost_monitoring_data(
        &self,
        cluster_name: &str,
        from_date: &str,
        to_date: &str,
    ) -> Result<Vec<CostMonitoringData>, CommandError> {
        const COMMAND: &str = "get_cost_monitoring_data";
        let request = ApiRequest::new(
            Method::Get,
            format!("{COSTS_RESOURCE}/clusters/{cluster_name}"),
        )
        .with_query("start", from_date)
        .with_query("end", to_date);
        let response = self.send(COMMAND, request).await?;
        let data: CostMonitoringDataResponse = decode(COMMAND, response)?;
        Ok(data.costs)
    }

    /// Log streams of `cluster_name`, split into host, instance and log identifier.
    pub async fn list_cluster_log_streams(
        &self,
        cluster_name: &str,
    ) -> Result<Vec<LogStreamView>, CommandError> {
        const COMMAND: &str = "list_cluster_log_streams";
        let request = self.cluster_api_request(
            Method::Get,
            format!("{CLUSTERS_PATH}/{cluster_name}/logstreams"),
        );
        let response = self.send(COMMAND, request).await?;
        let data: LogStreamsResponse = decode(COMMAND, response)?;
        Ok(logs::project(data.log_streams)?)
    }

    /// Events of one log stream of `cluster_name`.
    pub async fn list_cluster_log_events(
        &self,
        cluster_name: &str,
        log_stream_name: &str,
    ) -> Result<Vec<LogEvent>, CommandError> {
        const COMMAND: &str = "list_cluster_log_events";
        let request = self.cluster_api_request(
            Method::Get,
            format!("{CLUSTERS_PATH}/{cluster_name}/logstreams/{log_stream_name}"),
        );
        let response = self.send(COMMAND, request).await?;
        let data: LogEventsResponse = decode(COMMAND, response)?;
        Ok(data.events)
    }

    /// Every cluster of the region, following `nextToken` until the last page.
    ///
    /// A failure on any page is returned as that page's backend error.
    pub async fn list_clusters(&self) -> Result<Vec<ClusterInfoSummary>, CommandError> {
        const COMMAND: &str = "list_clusters";
        let mut clusters = Vec::new();
        let mut next_token: Option<String> = None;
        let mut pages = 0usize;
        loop {
            let mut request = self.cluster_api_request(Method::Get, CLUSTERS_PATH.to_string());
            if let Some(token) = &next_token {
                request = request.with_query("nextToken", token.as_str());
            }
            let response = self.send(COMMAND, request).await?;
            let page: ListClustersResponse = decode(COMMAND, response)?;
            pages += 1;
            clusters.extend(page.clusters);
            next_token = page.next_token;
            if next_token.is_none() {
                break;
            }
        }
        debug!(pages, clusters = clusters.len(), "listed clusters");
        Ok(clusters)
    }

    /// Submits a cluster configuration, tagged as created from the console.
    ///
    /// With `dry_run` the backend only validates the configuration. Returns
    /// the backend's response payload, `Null` when it has none.
    pub async fn create_cluster(
        &self,
        cluster_name: &str,
        cluster_configuration: &str,
        dry_run: bool,
    ) -> Result<Value, CommandError> {
        const COMMAND: &str = "create_cluster";
        let body = json!({
            "clusterName": cluster_name,
            "clusterConfiguration": clusters::with_console_tag(cluster_configuration)?,
        });

        let mut request = self
            .cluster_api_request(Method::Post, CLUSTERS_PATH.to_string())
            .with_body(body);
        if dry_run {
            request = request.with_query("dryrun", "true");
        }
        let response = self.send(COMMAND, request).await?;
        Ok(response.data.unwrap_or(Value::Null))
    }

    /// Version of the cluster service behind the console.
    pub async fn get_version(&self) -> Result<ServiceVersion, CommandError> {
        const COMMAND: &str = "get_version";
        let response = self
            .send(COMMAND, ApiRequest::new(Method::Get, VERSION_RESOURCE))
            .await?;
        let version: VersionResponse = decode(COMMAND, response)?;
        Ok(version.into())
    }

    fn cluster_api_request(&self, method: Method, path: String) -> ApiRequest {
        let request = ApiRequest::new(method, API_RESOURCE).with_query("path", path);
        match &self.region {
            Some(region) => request.with_query("region", region.as_str()),
            None => request,
        }
    }

    async fn send(
        &self,
        command: &'static str,
        request: ApiRequest,
    ) -> Result<ApiResponse, CommandError> {
        debug!(
            command,
            method = %request.method,
            resource = %request.resource,
            "dispatching console command"
        );
        self.executor.execute(request).await.map_err(|error| {
            warn!(
                command,
                status = ?error.status(),
                message = error.message().unwrap_or_default(),
                "console command failed"
            );
            CommandError::Backend(error)
        })
    }
}

fn decode<T: DeserializeOwned>(
    command: &'static str,
    response: ApiResponse,
) -> Result<T, CommandError> {
    serde_json::from_value(response.data.unwrap_or(Value::Null))
        .map_err(|source| CommandError::MalformedPayload { command, source })
}
