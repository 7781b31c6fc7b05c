// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Version and region scoped feature flags.
//!
//! A cluster created with a given service version only supports the
//! capabilities that shipped with that version. [`FeatureFlagsProvider`]
//! reproduces the console's table of those capabilities, minus the ones that
//! were deprecated or that are unavailable in the cluster's region.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::warn;

/// Every capability that may be behind a flag in the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    Ubuntu1804,
    MultiuserCluster,
    FsxOntap,
    FsxOpenzfs,
    LustrePersistent2,
    MemoryBasedScheduling,
    SlurmQueueUpdateStrategy,
    EbsDeletionPolicy,
    CostMonitoring,
    SlurmAccounting,
    QueuesMultipleInstanceTypes,
    DynamicFsMount,
    EfsDeletionPolicy,
    LustreDeletionPolicy,
    ImdsSupport,
    MultiAz,
    OnNodeUpdated,
    Rhel8,
    NewResourcesLimits,
    Ubuntu2204,
    LoginNodes,
    AmazonFileCache,
    JobExclusiveAllocation,
    MemoryBasedSchedulingWithMultipleInstanceTypes,
    /// Never granted by version; only enabled through additional features.
    Experimental,
}

const ALL_FEATURES: [Feature; 25] = [
    Feature::Ubuntu1804,
    Feature::MultiuserCluster,
    Feature::FsxOntap,
    Feature::FsxOpenzfs,
    Feature::LustrePersistent2,
    Feature::MemoryBasedScheduling,
    Feature::SlurmQueueUpdateStrategy,
    Feature::EbsDeletionPolicy,
    Feature::CostMonitoring,
    Feature::SlurmAccounting,
    Feature::QueuesMultipleInstanceTypes,
    Feature::DynamicFsMount,
    Feature::EfsDeletionPolicy,
    Feature::LustreDeletionPolicy,
    Feature::ImdsSupport,
    Feature::MultiAz,
    Feature::OnNodeUpdated,
    Feature::Rhel8,
    Feature::NewResourcesLimits,
    Feature::Ubuntu2204,
    Feature::LoginNodes,
    Feature::AmazonFileCache,
    Feature::JobExclusiveAllocation,
    Feature::MemoryBasedSchedulingWithMultipleInstanceTypes,
    Feature::Experimental,
];

impl Feature {
    /// Flag name as used in configuration, e.g. `queues_multiple_instance_types`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ubuntu1804 => "ubuntu1804",
            Self::MultiuserCluster => "multiuser_cluster",
            // The flag has always been spelled this way.
            Self::FsxOpenzfs => "fsx_openzsf",
            Self::FsxOntap => "fsx_ontap",
            Self::LustrePersistent2 => "lustre_persistent2",
            Self::MemoryBasedScheduling => "memory_based_scheduling",
            Self::SlurmQueueUpdateStrategy => "slurm_queue_update_strategy",
            Self::EbsDeletionPolicy => "ebs_deletion_policy",
            Self::CostMonitoring => "cost_monitoring",
            Self::SlurmAccounting => "slurm_accounting",
            Self::QueuesMultipleInstanceTypes => "queues_multiple_instance_types",
            Self::DynamicFsMount => "dynamic_fs_mount",
            Self::EfsDeletionPolicy => "efs_deletion_policy",
            Self::LustreDeletionPolicy => "lustre_deletion_policy",
            Self::ImdsSupport => "imds_support",
            Self::MultiAz => "multi_az",
            Self::OnNodeUpdated => "on_node_updated",
            Self::Rhel8 => "rhel8",
            Self::NewResourcesLimits => "new_resources_limits",
            Self::Ubuntu2204 => "ubuntu2204",
            Self::LoginNodes => "login_nodes",
            Self::AmazonFileCache => "amazon_file_cache",
            Self::JobExclusiveAllocation => "job_exclusive_allocation",
            Self::MemoryBasedSchedulingWithMultipleInstanceTypes => {
                "memory_based_scheduling_with_multiple_instance_types"
            }
            Self::Experimental => "experimental",
        }
    }

    pub fn all() -> &'static [Feature] {
        &ALL_FEATURES
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown feature flag '{0}'")]
pub struct UnknownFeature(pub String);

impl FromStr for Feature {
    type Err = UnknownFeature;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ALL_FEATURES
            .iter()
            .copied()
            .find(|feature| feature.as_str() == value)
            .ok_or_else(|| UnknownFeature(value.to_string()))
    }
}

/// Decides whether a capability is enabled for a service version and region.
///
/// Injected wherever behaviour depends on a flag so that tests can supply
/// fixed answers.
pub trait FeatureGate {
    fn is_enabled(&self, version: &str, region: &str, feature: Feature) -> bool;
}

impl<T> FeatureGate for &T
where
    T: FeatureGate + ?Sized,
{
    fn is_enabled(&self, version: &str, region: &str, feature: Feature) -> bool {
        (**self).is_enabled(version, region, feature)
    }
}

impl<T> FeatureGate for Arc<T>
where
    T: FeatureGate + ?Sized,
{
    fn is_enabled(&self, version: &str, region: &str, feature: Feature) -> bool {
        (**self).is_enabled(version, region, feature)
    }
}

/// Capabilities introduced by each service version, oldest first.
const VERSION_FEATURES: &[(&str, &[Feature])] = &[
    ("3.0.0", &[Feature::Ubuntu1804]),
    ("3.1.0", &[Feature::MultiuserCluster]),
    (
        "3.2.0",
        &[
            Feature::FsxOntap,
            Feature::FsxOpenzfs,
            Feature::LustrePersistent2,
            Feature::MemoryBasedScheduling,
            Feature::MultiuserCluster,
            Feature::SlurmQueueUpdateStrategy,
            Feature::EbsDeletionPolicy,
            Feature::CostMonitoring,
        ],
    ),
    (
        "3.3.0",
        &[
            Feature::SlurmAccounting,
            Feature::QueuesMultipleInstanceTypes,
            Feature::DynamicFsMount,
            Feature::EfsDeletionPolicy,
            Feature::LustreDeletionPolicy,
            Feature::ImdsSupport,
        ],
    ),
    ("3.4.0", &[Feature::MultiAz, Feature::OnNodeUpdated]),
    ("3.6.0", &[Feature::Rhel8, Feature::NewResourcesLimits]),
    (
        "3.7.0",
        &[
            Feature::Ubuntu2204,
            Feature::LoginNodes,
            Feature::AmazonFileCache,
            Feature::JobExclusiveAllocation,
            Feature::MemoryBasedSchedulingWithMultipleInstanceTypes,
        ],
    ),
];

/// Version from which a capability is no longer offered.
const DEPRECATED_FEATURES: &[(Feature, &str)] = &[(Feature::Ubuntu1804, "3.7.0")];

/// Regions in which a capability is not offered.
const UNSUPPORTED_REGIONS: &[(Feature, &[&str])] = &[(Feature::CostMonitoring, &["us-gov-west-1"])];

/// Dotted numeric version; missing components compare as zero.
#[derive(Debug, Clone)]
struct Version(Vec<u64>);

impl Version {
    fn parse(value: &str) -> Option<Self> {
        value
            .trim()
            .split('.')
            .map(|component| component.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    fn component(&self, index: usize) -> u64 {
        self.0.get(index).copied().unwrap_or(0)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        let len = self.0.len().max(other.0.len());
        (0..len)
            .map(|index| self.component(index).cmp(&other.component(index)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    }
}

/// Table-driven [`FeatureGate`].
#[derive(Debug, Clone, Default)]
pub struct FeatureFlagsProvider {
    additional_features: Vec<Feature>,
}

impl FeatureFlagsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables extra capabilities on top of the version table (e.g. `experimental`).
    pub fn with_additional_features(mut self, features: impl IntoIterator<Item = Feature>) -> Self {
        self.additional_features.extend(features);
        self
    }

    /// Ordered, duplicate-free list of capabilities for `version` in `region`.
    ///
    /// An empty `region` means the region is unknown, which disables every
    /// region-restricted capability.
    pub fn features(&self, version: &str, region: &str) -> Vec<Feature> {
        let Some(current) = Version::parse(version) else {
            warn!(version, "unparsable service version, no versioned features enabled");
            return self.filtered(self.additional_features.iter().copied(), None, region);
        };

        let versioned = VERSION_FEATURES
            .iter()
            .filter(|(introduced, _)| {
                Version::parse(introduced).is_some_and(|introduced| current >= introduced)
            })
            .flat_map(|(_, features)| features.iter().copied());

        self.filtered(
            versioned.chain(self.additional_features.iter().copied()),
            Some(&current),
            region,
        )
    }

    fn filtered(
        &self,
        candidates: impl Iterator<Item = Feature>,
        current: Option<&Version>,
        region: &str,
    ) -> Vec<Feature> {
        let mut features = Vec::new();
        for feature in candidates {
            if features.contains(&feature) {
                continue;
            }
            if is_supported_in_region(feature, region) && !is_deprecated(feature, current) {
                features.push(feature);
            }
        }
        features
    }
}

impl FeatureGate for FeatureFlagsProvider {
    fn is_enabled(&self, version: &str, region: &str, feature: Feature) -> bool {
        self.features(version, region).contains(&feature)
    }
}

fn is_supported_in_region(feature: Feature, region: &str) -> bool {
    match UNSUPPORTED_REGIONS
        .iter()
        .find(|(restricted, _)| *restricted == feature)
    {
        Some((_, regions)) => !region.is_empty() && !regions.contains(&region),
        None => true,
    }
}

fn is_deprecated(feature: Feature, current: Option<&Version>) -> bool {
    let Some(current) = current else {
        return false;
    };
    DEPRECATED_FEATURES
        .iter()
        .filter(|(deprecated, _)| *deprecated == feature)
        .filter_map(|(_, since)| Version::parse(since))
        .any(|since| *current >= since)
}

/// Whether cost monitoring queries may be issued for this version and region.
pub fn cost_monitoring_enabled(gate: &impl FeatureGate, version: &str, region: &str) -> bool {
    gate.is_enabled(version, region, Feature::CostMonitoring)
}

/// Whether the cost monitoring page is shown; it is still experimental.
pub fn cost_monitoring_page_visible(gate: &impl FeatureGate, version: &str, region: &str) -> bool {
    cost_monitoring_enabled(gate, version, region)
        && gate.is_enabled(version, region, Feature::Experimental)
}
