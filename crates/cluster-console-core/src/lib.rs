// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Command and view-model layer of the cluster management console.
//!
//! The crate issues typed commands against the console backend through an
//! injected [`RequestExecutor`], projects backend payloads into view models,
//! and migrates queue compute resources between configuration shapes behind
//! a version/region [`FeatureGate`].

pub mod clusters;
pub mod commands;
pub mod compute_resources;
pub mod config;
pub mod costs;
pub mod error;
pub mod executor;
pub mod feature_flags;
pub mod logs;

pub use clusters::{
    with_console_tag, ClusterConfigurationError, ClusterInfoSummary, ServiceVersion,
    CONSOLE_TAG_KEY,
};
pub use commands::CommandDispatcher;
pub use compute_resources::{
    map_compute_resource, ComputeResource, ComputeResourceError, ComputeResourceMigrator,
    InstanceSpec, InvalidComputeResource,
};
pub use config::{ConfigError, ConsoleEnv};
pub use costs::{
    compose_time_range, compose_time_range_now, to_full_dollar_amount, to_short_dollar_amount,
    CostMonitoringData, CostPeriod, TimeRange,
};
pub use error::{BackendError, CommandError};
pub use executor::{ApiRequest, ApiResponse, Method, RequestExecutor};
pub use feature_flags::{
    cost_monitoring_enabled, cost_monitoring_page_visible, Feature, FeatureFlagsProvider,
    FeatureGate, UnknownFeature,
};
pub use logs::{
    with_node_type, LogEvent, LogStreamError, LogStreamRecord, LogStreamView, NodeType,
    NodeTypedLogStream,
};
