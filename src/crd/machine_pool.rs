//! MachinePool CRD
//!
//! Client-side view of Hive's `MachinePool` (`hive.openshift.io/v1`), the
//! declarative request for a homogeneous group of compute nodes. The CRD is
//! owned and reconciled by Hive; only the fields the resizer reads or writes
//! are modelled, everything else rides along in flattened maps so a derived
//! pool is recreated exactly as it was.

use kube::CustomResource;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::ports::{CloudProvider, PoolRef};

// =============================================================================
// MachinePool CRD
// =============================================================================

/// MachinePool describes a set of machines for one logical pool of a
/// ClusterDeployment.
#[derive(CustomResource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[kube(
    group = "hive.openshift.io",
    version = "v1",
    kind = "MachinePool",
    plural = "machinepools",
    namespaced,
    status = "MachinePoolStatus",
    schema = "disabled",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct MachinePoolSpec {
    /// ClusterDeployment this pool belongs to
    pub cluster_deployment_ref: ClusterDeploymentRef,

    /// Logical pool name (e.g. "worker", "infra")
    pub name: String,

    /// Desired number of machines; unset when the pool autoscales
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i64>,

    /// Cloud-provider specific machine configuration
    #[serde(default)]
    pub platform: MachinePoolPlatform,

    /// Fields not interpreted by the resizer (labels, taints, autoscaling, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

// =============================================================================
// Sub-Types
// =============================================================================

/// Reference to the owning ClusterDeployment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterDeploymentRef {
    pub name: String,
}

/// Provider-specific machine configuration; exactly one provider is expected
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachinePoolPlatform {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<ProviderMachineConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcp: Option<ProviderMachineConfig>,

    /// Other providers (azure, openstack, ...) which the resizer cannot size
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

/// Machine configuration shared by the AWS and GCP platform blocks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderMachineConfig {
    /// Instance type (`m5.xlarge`, `custom-4-32768-ext`, ...)
    #[serde(rename = "type")]
    pub instance_type: String,

    /// Zones, volumes, subnets and the like
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

// =============================================================================
// Status
// =============================================================================

/// Status of the MachinePool, written by Hive
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachinePoolStatus {
    /// Observed machine count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

// =============================================================================
// Implementations
// =============================================================================

impl MachinePoolPlatform {
    /// The populated provider and its instance type. AWS wins if both are set.
    pub fn instance_type(&self) -> Option<(CloudProvider, &str)> {
        if let Some(aws) = &self.aws {
            Some((CloudProvider::Aws, aws.instance_type.as_str()))
        } else {
            self.gcp
                .as_ref()
                .map(|gcp| (CloudProvider::Gcp, gcp.instance_type.as_str()))
        }
    }

    /// Overwrite the instance type of `provider`'s block.
    ///
    /// Returns false when that block is absent; the other provider is never
    /// populated as a side effect.
    pub fn set_instance_type(&mut self, provider: CloudProvider, instance_type: &str) -> bool {
        let block = match provider {
            CloudProvider::Aws => self.aws.as_mut(),
            CloudProvider::Gcp => self.gcp.as_mut(),
        };
        match block {
            Some(config) => {
                config.instance_type = instance_type.to_string();
                true
            }
            None => false,
        }
    }
}

impl MachinePool {
    /// Namespaced reference to this pool
    pub fn pool_ref(&self) -> PoolRef {
        PoolRef::new(
            self.metadata.namespace.clone().unwrap_or_default(),
            self.metadata.name.clone().unwrap_or_default(),
        )
    }

    /// Logical pool name from the spec
    pub fn logical_name(&self) -> &str {
        &self.spec.name
    }

    /// Desired replica count
    pub fn replicas(&self) -> Option<i64> {
        self.spec.replicas
    }

    /// Populated provider and instance type
    pub fn instance_type(&self) -> Option<(CloudProvider, &str)> {
        self.spec.platform.instance_type()
    }
}
