// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log stream view models.
//!
//! Cluster log stream names encode their origin as
//! `hostname.instanceId.logIdentifier`; the views below expose those parts
//! as separate fields.

use serde::{Deserialize, Serialize};

const LOG_STREAM_NAME_SEPARATOR: char = '.';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogStreamError {
    #[error("log stream name {name:?} has {parts} dot-separated parts, expected 3")]
    MalformedName { name: String, parts: usize },
}

/// Log stream as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStreamRecord {
    pub log_stream_name: String,
    pub last_event_timestamp: String,
}

/// Body of a log stream listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStreamsResponse {
    pub log_streams: Vec<LogStreamRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStreamView {
    pub log_stream_name: String,
    pub hostname: String,
    pub instance_id: String,
    pub log_identifier: String,
    pub last_event_timestamp: String,
}

impl TryFrom<LogStreamRecord> for LogStreamView {
    type Error = LogStreamError;

    fn try_from(record: LogStreamRecord) -> Result<Self, Self::Error> {
        let parts: Vec<&str> = record
            .log_stream_name
            .split(LOG_STREAM_NAME_SEPARATOR)
            .collect();
        let (hostname, instance_id, log_identifier) = match parts.as_slice() {
            [hostname, instance_id, log_identifier] => (
                hostname.to_string(),
                instance_id.to_string(),
                log_identifier.to_string(),
            ),
            _ => {
                return Err(LogStreamError::MalformedName {
                    name: record.log_stream_name.clone(),
                    parts: parts.len(),
                })
            }
        };

        Ok(Self {
            hostname,
            instance_id,
            log_identifier,
            log_stream_name: record.log_stream_name,
            last_event_timestamp: record.last_event_timestamp,
        })
    }
}

/// Projects every record, in order. Fails on the first malformed name.
pub fn project(records: Vec<LogStreamRecord>) -> Result<Vec<LogStreamView>, LogStreamError> {
    records.into_iter().map(LogStreamView::try_from).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    HeadNode,
    ComputeNode,
}

/// A log stream tagged with the kind of node that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypedLogStream {
    #[serde(flatten)]
    pub log_stream: LogStreamView,
    pub node_type: Option<NodeType>,
}

/// Tags `log_stream` with its node type. Unknown when the head node is not yet known.
pub fn with_node_type(
    head_node_instance_id: Option<&str>,
    log_stream: LogStreamView,
) -> NodeTypedLogStream {
    let node_type = head_node_instance_id.map(|head_node| {
        if head_node == log_stream.instance_id {
            NodeType::HeadNode
        } else {
            NodeType::ComputeNode
        }
    });
    NodeTypedLogStream {
        log_stream,
        node_type,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub message: String,
    pub timestamp: String,
}

/// Body of a log events listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEventsResponse {
    pub events: Vec<LogEvent>,
}
