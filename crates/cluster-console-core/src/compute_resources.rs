// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Queue compute resources and their migration to the multi-instance shape.
//!
//! Older configurations describe a compute resource with a single
//! `InstanceType`; from the release that introduced multiple instance types
//! per compute resource the backend expects an `Instances` list instead.
//! [`ComputeResourceMigrator`] rewrites a queue's compute resources into the
//! newer shape when the cluster version supports it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::feature_flags::{Feature, FeatureGate};

const INSTANCE_TYPE_KEY: &str = "InstanceType";
const INSTANCES_KEY: &str = "Instances";

#[derive(Debug, thiserror::Error)]
pub enum ComputeResourceError {
    #[error("compute resource must be a JSON object")]
    NotAnObject,

    #[error("compute resource {name:?} sets both InstanceType and Instances")]
    AmbiguousShape { name: Option<String> },

    #[error("compute resource field {field} is invalid: {source}")]
    InvalidField {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// A `migrate_json` input element that is not a valid compute resource.
#[derive(Debug, thiserror::Error)]
#[error("compute resource at index {index} is invalid: {source}")]
pub struct InvalidComputeResource {
    /// Position of the element in the input list.
    pub index: usize,
    /// `Name` of the element, when it is an object with a string name.
    pub name: Option<String>,
    #[source]
    pub source: ComputeResourceError,
}

/// One entry of a multi-instance compute resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSpec {
    #[serde(rename = "InstanceType")]
    pub instance_type: String,
    /// Any other per-instance settings, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InstanceSpec {
    pub fn new(instance_type: impl Into<String>) -> Self {
        Self {
            instance_type: instance_type.into(),
            extra: Map::new(),
        }
    }
}

/// A compute resource in one of its two persisted shapes.
///
/// `fields` holds every key other than `InstanceType`/`Instances` (name,
/// min/max count, ...) exactly as it was read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub enum ComputeResource {
    SingleInstance {
        instance_type: String,
        fields: Map<String, Value>,
    },
    /// `instances` is `None` when the `Instances` key is absent altogether.
    MultiInstance {
        instances: Option<Vec<InstanceSpec>>,
        fields: Map<String, Value>,
    },
}

impl ComputeResource {
    pub fn fields(&self) -> &Map<String, Value> {
        match self {
            Self::SingleInstance { fields, .. } | Self::MultiInstance { fields, .. } => fields,
        }
    }

    /// Value of the `Name` field, when present.
    pub fn name(&self) -> Option<&str> {
        self.fields().get("Name").and_then(Value::as_str)
    }

    pub fn is_multi_instance(&self) -> bool {
        matches!(self, Self::MultiInstance { .. })
    }

    /// Whether [`map_compute_resource`] rewrites this resource.
    pub fn needs_migration(&self) -> bool {
        match self {
            Self::SingleInstance { .. } => true,
            Self::MultiInstance {
                instances: Some(instances),
                ..
            } => instances.is_empty(),
            Self::MultiInstance { instances: None, .. } => false,
        }
    }
}

impl TryFrom<Map<String, Value>> for ComputeResource {
    type Error = ComputeResourceError;

    fn try_from(mut fields: Map<String, Value>) -> Result<Self, Self::Error> {
        if fields.contains_key(INSTANCE_TYPE_KEY) && fields.contains_key(INSTANCES_KEY) {
            return Err(ComputeResourceError::AmbiguousShape {
                name: fields.get("Name").and_then(Value::as_str).map(str::to_owned),
            });
        }

        if let Some(instance_type) = fields.remove(INSTANCE_TYPE_KEY) {
            let instance_type = serde_json::from_value(instance_type).map_err(|source| {
                ComputeResourceError::InvalidField {
                    field: INSTANCE_TYPE_KEY,
                    source,
                }
            })?;
            return Ok(Self::SingleInstance {
                instance_type,
                fields,
            });
        }

        let instances = fields
            .remove(INSTANCES_KEY)
            .map(serde_json::from_value::<Vec<InstanceSpec>>)
            .transpose()
            .map_err(|source| ComputeResourceError::InvalidField {
                field: INSTANCES_KEY,
                source,
            })?;
        Ok(Self::MultiInstance { instances, fields })
    }
}

impl TryFrom<Value> for ComputeResource {
    type Error = ComputeResourceError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Self::try_from(fields),
            _ => Err(ComputeResourceError::NotAnObject),
        }
    }
}

impl From<ComputeResource> for Map<String, Value> {
    fn from(resource: ComputeResource) -> Self {
        match resource {
            ComputeResource::SingleInstance {
                instance_type,
                mut fields,
            } => {
                fields.insert(INSTANCE_TYPE_KEY.to_string(), Value::String(instance_type));
                fields
            }
            ComputeResource::MultiInstance {
                instances,
                mut fields,
            } => {
                if let Some(instances) = instances {
                    let instances = instances
                        .into_iter()
                        .map(|instance| Value::Object(instance_to_map(instance)))
                        .collect();
                    fields.insert(INSTANCES_KEY.to_string(), Value::Array(instances));
                }
                fields
            }
        }
    }
}

impl From<ComputeResource> for Value {
    fn from(resource: ComputeResource) -> Self {
        Value::Object(resource.into())
    }
}

fn instance_to_map(instance: InstanceSpec) -> Map<String, Value> {
    let mut map = instance.extra;
    map.insert(
        INSTANCE_TYPE_KEY.to_string(),
        Value::String(instance.instance_type),
    );
    map
}

/// Rewrites one compute resource into the multi-instance shape.
///
/// A populated `Instances` list is kept as is, a single `InstanceType`
/// becomes a one-element list, and an empty or missing list is dropped.
pub fn map_compute_resource(resource: ComputeResource) -> ComputeResource {
    match resource {
        ComputeResource::MultiInstance {
            instances: Some(instances),
            fields,
        } if !instances.is_empty() => ComputeResource::MultiInstance {
            instances: Some(instances),
            fields,
        },
        ComputeResource::SingleInstance {
            instance_type,
            fields,
        } => ComputeResource::MultiInstance {
            instances: Some(vec![InstanceSpec::new(instance_type)]),
            fields,
        },
        ComputeResource::MultiInstance { fields, .. } => ComputeResource::MultiInstance {
            instances: None,
            fields,
        },
    }
}

/// Applies [`map_compute_resource`] to a queue's compute resources when the
/// cluster version and region support multiple instance types.
#[derive(Debug, Clone)]
pub struct ComputeResourceMigrator<G> {
    gate: G,
}

impl<G: FeatureGate> ComputeResourceMigrator<G> {
    pub fn new(gate: G) -> Self {
        Self { gate }
    }

    fn enabled(&self, version: &str, region: &str) -> bool {
        let enabled = self
            .gate
            .is_enabled(version, region, Feature::QueuesMultipleInstanceTypes);
        if !enabled {
            debug!(
                version,
                region, "multiple instance types unsupported, compute resources left as is"
            );
        }
        enabled
    }

    /// Returns `resources` untouched when the gate is off, migrated otherwise.
    pub fn map_compute_resources(
        &self,
        version: &str,
        region: &str,
        resources: Vec<ComputeResource>,
    ) -> Vec<ComputeResource> {
        if !self.enabled(version, region) {
            return resources;
        }
        migrate(resources)
    }

    /// Same as [`map_compute_resources`](Self::map_compute_resources) on raw
    /// configuration values.
    ///
    /// Values are only parsed when the gate is on; with the gate off they are
    /// returned untouched even if they would not parse. The first element
    /// that does not parse is reported with its index.
    pub fn migrate_json(
        &self,
        version: &str,
        region: &str,
        resources: Vec<Value>,
    ) -> Result<Vec<Value>, InvalidComputeResource> {
        if !self.enabled(version, region) {
            return Ok(resources);
        }

        let parsed = resources
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                let name = value.get("Name").and_then(Value::as_str).map(str::to_owned);
                ComputeResource::try_from(value).map_err(|source| InvalidComputeResource {
                    index,
                    name,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(migrate(parsed).into_iter().map(Value::from).collect())
    }
}

fn migrate(resources: Vec<ComputeResource>) -> Vec<ComputeResource> {
    let converted = resources
        .iter()
        .filter(|resource| resource.needs_migration())
        .count();
    debug!(
        total = resources.len(),
        converted, "migrating compute resources to multi-instance shape"
    );
    resources.into_iter().map(map_compute_resource).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use tracing_test::traced_test;

    struct FixedGate(bool);

    impl FeatureGate for FixedGate {
        fn is_enabled(&self, _version: &str, _region: &str, feature: Feature) -> bool {
            assert_eq!(feature, Feature::QueuesMultipleInstanceTypes);
            self.0
        }
    }

    fn resource(value: Value) -> ComputeResource {
        serde_json::from_value(value).expect("valid compute resource")
    }

    fn to_json(resources: Vec<ComputeResource>) -> Value {
        serde_json::to_value(resources).expect("serializable")
    }

    #[test]
    fn parses_single_instance_shape() {
        let parsed = resource(json!({ "Name": "cr-1", "InstanceType": "t2.micro", "MinCount": 0 }));
        match &parsed {
            ComputeResource::SingleInstance {
                instance_type,
                fields,
            } => {
                assert_eq!(instance_type, "t2.micro");
                assert_eq!(fields.get("MinCount"), Some(&json!(0)));
                assert!(!fields.contains_key("InstanceType"));
            }
            other => panic!("unexpected shape {other:?}"),
        }
        assert_eq!(parsed.name(), Some("cr-1"));
    }

    #[test]
    fn rejects_ambiguous_shape() {
        let error = ComputeResource::try_from(json!({
            "Name": "cr-1",
            "InstanceType": "t2.micro",
            "Instances": [{ "InstanceType": "t2.micro" }]
        }))
        .expect_err("both shapes at once");
        assert!(matches!(
            error,
            ComputeResourceError::AmbiguousShape { name: Some(ref name) } if name == "cr-1"
        ));
    }

    #[test]
    fn rejects_invalid_fields() {
        assert!(matches!(
            ComputeResource::try_from(json!({ "InstanceType": 3 })),
            Err(ComputeResourceError::InvalidField { field: "InstanceType", .. })
        ));
        assert!(matches!(
            ComputeResource::try_from(json!({ "Instances": "t2.micro" })),
            Err(ComputeResourceError::InvalidField { field: "Instances", .. })
        ));
        assert!(matches!(
            ComputeResource::try_from(json!(["t2.micro"])),
            Err(ComputeResourceError::NotAnObject)
        ));
    }

    #[test]
    fn converts_single_instance_to_multi_instance() {
        let migrator = ComputeResourceMigrator::new(FixedGate(true));
        let migrated = migrator.map_compute_resources(
            "3.3.0",
            "eu-west-1",
            vec![resource(json!({ "InstanceType": "t2.micro", "otherField": 1 }))],
        );
        assert_eq!(
            to_json(migrated),
            json!([{ "otherField": 1, "Instances": [{ "InstanceType": "t2.micro" }] }])
        );
    }

    #[test]
    fn keeps_populated_multi_instance_resources() {
        let input = json!({ "Instances": [{ "InstanceType": "t2.micro" }], "otherField": 1 });
        let migrator = ComputeResourceMigrator::new(FixedGate(true));
        let migrated = migrator.map_compute_resources("3.3.0", "eu-west-1", vec![resource(input.clone())]);
        assert_eq!(to_json(migrated), json!([input]));
    }

    #[test]
    fn drops_empty_instances() {
        let migrator = ComputeResourceMigrator::new(FixedGate(true));
        let migrated = migrator.map_compute_resources(
            "3.3.0",
            "eu-west-1",
            vec![resource(json!({ "Instances": [], "otherField": 1 }))],
        );
        assert_eq!(to_json(migrated), json!([{ "otherField": 1 }]));
    }

    #[test]
    fn preserves_order_and_mixed_shapes() {
        let migrator = ComputeResourceMigrator::new(FixedGate(true));
        let migrated = migrator.map_compute_resources(
            "3.3.0",
            "eu-west-1",
            vec![
                resource(json!({ "Name": "a", "InstanceType": "c5.large" })),
                resource(json!({ "Name": "b", "Instances": [{ "InstanceType": "m5.large" }, { "InstanceType": "m5.xlarge" }] })),
                resource(json!({ "Name": "c" })),
            ],
        );
        assert!(migrated.iter().all(ComputeResource::is_multi_instance));
        assert_eq!(
            to_json(migrated),
            json!([
                { "Name": "a", "Instances": [{ "InstanceType": "c5.large" }] },
                { "Name": "b", "Instances": [{ "InstanceType": "m5.large" }, { "InstanceType": "m5.xlarge" }] },
                { "Name": "c" },
            ])
        );
    }

    #[test]
    fn keeps_extra_instance_settings() {
        let input = json!({ "Name": "a", "Instances": [{ "InstanceType": "p4d.24xlarge", "Weight": 2 }] });
        let migrated = map_compute_resource(resource(input.clone()));
        assert_eq!(Value::from(migrated), input);
    }

    #[test]
    #[traced_test]
    fn disabled_gate_leaves_resources_untouched() {
        let input = vec![
            resource(json!({ "InstanceType": "t2.micro", "otherField": 1 })),
            resource(json!({ "Instances": [], "otherField": 2 })),
        ];
        let migrator = ComputeResourceMigrator::new(FixedGate(false));
        let output = migrator.map_compute_resources("3.2.0", "eu-west-1", input.clone());
        assert_eq!(output, input);
        assert!(logs_contain("compute resources left as is"));
    }

    #[test]
    fn migrate_json_with_disabled_gate_skips_parsing() {
        let raw = vec![json!({ "InstanceType": "t2.micro", "Instances": [] }), json!(42)];
        let migrator = ComputeResourceMigrator::new(FixedGate(false));
        let output = migrator
            .migrate_json("3.2.0", "eu-west-1", raw.clone())
            .expect("gate off never parses");
        assert_eq!(output, raw);
    }

    #[test]
    fn migrate_json_converts_and_reports_shape_errors() {
        let migrator = ComputeResourceMigrator::new(FixedGate(true));
        let output = migrator
            .migrate_json(
                "3.3.0",
                "eu-west-1",
                vec![json!({ "Name": "a", "InstanceType": "t3.small" })],
            )
            .expect("valid input");
        assert_eq!(
            output,
            vec![json!({ "Name": "a", "Instances": [{ "InstanceType": "t3.small" }] })]
        );

        let error = migrator
            .migrate_json("3.3.0", "eu-west-1", vec![json!("not-a-resource")])
            .expect_err("strings are not compute resources");
        assert_eq!(error.index, 0);
        assert!(matches!(error.source, ComputeResourceError::NotAnObject));
    }

    #[test]
    fn migrate_json_reports_the_failing_element() {
        let migrator = ComputeResourceMigrator::new(FixedGate(true));
        let error = migrator
            .migrate_json(
                "3.3.0",
                "eu-west-1",
                vec![
                    json!({ "Name": "ok", "InstanceType": "t3.small" }),
                    json!({ "Name": "ok-too", "Instances": [] }),
                    json!({ "Name": "broken", "InstanceType": 7 }),
                    json!(42),
                ],
            )
            .expect_err("third element has a numeric instance type");
        assert_eq!(error.index, 2);
        assert_eq!(error.name.as_deref(), Some("broken"));
        assert!(matches!(
            error.source,
            ComputeResourceError::InvalidField {
                field: "InstanceType",
                ..
            }
        ));
        assert!(error.to_string().contains("index 2"));
    }

    #[test]
    fn needs_migration_matches_rewritten_shapes() {
        assert!(resource(json!({ "InstanceType": "t2.micro" })).needs_migration());
        assert!(resource(json!({ "Instances": [] })).needs_migration());
        assert!(!resource(json!({ "Instances": [{ "InstanceType": "t2.micro" }] })).needs_migration());
        assert!(!resource(json!({ "Name": "bare" })).needs_migration());
    }

    #[test]
    #[traced_test]
    fn migration_log_counts_every_rewritten_resource() {
        let migrator = ComputeResourceMigrator::new(FixedGate(true));
        migrator.map_compute_resources(
            "3.3.0",
            "eu-west-1",
            vec![
                resource(json!({ "InstanceType": "t2.micro" })),
                resource(json!({ "Instances": [] })),
                resource(json!({ "Instances": [{ "InstanceType": "m5.large" }] })),
            ],
        );
        assert!(logs_contain("total=3"));
        assert!(logs_contain("converted=2"));
    }

    proptest! {
        #[test]
        fn disabled_gate_is_identity(
            instance_types in proptest::collection::vec("[a-z][0-9]\\.[a-z]{4,7}", 0..8),
            counts in proptest::collection::vec(0u32..64, 0..8),
        ) {
            let input: Vec<ComputeResource> = instance_types
                .iter()
                .zip(counts.iter())
                .map(|(instance_type, count)| {
                    resource(json!({ "InstanceType": instance_type, "MaxCount": count }))
                })
                .collect();
            let migrator = ComputeResourceMigrator::new(FixedGate(false));
            prop_assert_eq!(migrator.map_compute_resources("3.0.0", "eu-west-1", input.clone()), input);
        }

        #[test]
        fn enabled_gate_always_yields_multi_instance(
            instance_types in proptest::collection::vec("[a-z][0-9]\\.[a-z]{4,7}", 0..8),
        ) {
            let input: Vec<ComputeResource> = instance_types
                .iter()
                .map(|instance_type| resource(json!({ "InstanceType": instance_type })))
                .collect();
            let migrator = ComputeResourceMigrator::new(FixedGate(true));
            let output = migrator.map_compute_resources("3.3.0", "eu-west-1", input);
            prop_assert_eq!(output.len(), instance_types.len());
            for (migrated, instance_type) in output.iter().zip(instance_types.iter()) {
                match migrated {
                    ComputeResource::MultiInstance { instances: Some(instances), .. } => {
                        prop_assert_eq!(instances, &vec![InstanceSpec::new(instance_type.clone())]);
                    }
                    other => prop_assert!(false, "unexpected shape {:?}", other),
                }
            }
        }
    }
}
