// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Cluster listing, creation and service version payloads.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

const TAGS_KEY: &str = "Tags";
const TAG_KEY: &str = "Key";
const TAG_VALUE: &str = "Value";

/// Tag marking clusters created from the console.
pub const CONSOLE_TAG_KEY: &str = "parallelcluster-ui";
const CONSOLE_TAG_VALUE: &str = "true";

#[derive(Debug, thiserror::Error)]
pub enum ClusterConfigurationError {
    #[error("cluster configuration is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("cluster configuration must be a YAML mapping")]
    NotAMapping,

    #[error("cluster configuration Tags must be a list")]
    TagsNotAList,
}

/// One cluster as listed by the cluster service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterInfoSummary {
    pub cluster_name: String,
    pub cluster_status: String,
    pub version: String,
    pub cloudformation_stack_arn: String,
    pub region: String,
    pub cloudformation_stack_status: String,
}

/// One page of a cluster listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListClustersResponse {
    pub clusters: Vec<ClusterInfoSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// Body of the service version query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}

/// Version of the cluster service backing the console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceVersion {
    pub full: String,
}

impl From<VersionResponse> for ServiceVersion {
    fn from(response: VersionResponse) -> Self {
        Self {
            full: response.version,
        }
    }
}

/// Adds the console tag to a YAML cluster configuration.
///
/// Existing tags are kept in order. The configuration is returned
/// re-serialized even when the tag was already present.
pub fn with_console_tag(cluster_configuration: &str) -> Result<String, ClusterConfigurationError> {
    let mut config = if cluster_configuration.trim().is_empty() {
        Mapping::new()
    } else {
        match serde_yaml::from_str::<Value>(cluster_configuration)? {
            Value::Mapping(mapping) => mapping,
            Value::Null => Mapping::new(),
            _ => return Err(ClusterConfigurationError::NotAMapping),
        }
    };

    match config.get(TAGS_KEY) {
        None | Some(Value::Null) => {
            config.insert(Value::from(TAGS_KEY), Value::Sequence(Vec::new()));
        }
        Some(Value::Sequence(_)) => {}
        Some(_) => return Err(ClusterConfigurationError::TagsNotAList),
    }
    let Some(Value::Sequence(tags)) = config.get_mut(TAGS_KEY) else {
        return Err(ClusterConfigurationError::TagsNotAList);
    };

    let tagged = tags
        .iter()
        .any(|tag| tag.get(TAG_KEY).and_then(Value::as_str) == Some(CONSOLE_TAG_KEY));
    if !tagged {
        let mut tag = Mapping::new();
        tag.insert(Value::from(TAG_KEY), Value::from(CONSOLE_TAG_KEY));
        tag.insert(Value::from(TAG_VALUE), Value::from(CONSOLE_TAG_VALUE));
        tags.push(Value::Mapping(tag));
    }

    Ok(serde_yaml::to_string(&Value::Mapping(config))?)
}
