//! Domain Ports - Core trait definitions for the resizer
//!
//! These traits define the boundaries between the resize campaign and the
//! systems it drives. Adapters implement these traits to provide concrete
//! functionality; tests implement them against an in-memory cluster.

use crate::crd::MachinePool;
use crate::error::Result;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// =============================================================================
// Cloud Providers
// =============================================================================

/// Cloud providers whose machine pools can be resized
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    Aws,
    Gcp,
}

impl std::fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloudProvider::Aws => write!(f, "aws"),
            CloudProvider::Gcp => write!(f, "gcp"),
        }
    }
}

// =============================================================================
// Pool References
// =============================================================================

/// Namespaced name of a MachinePool
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolRef {
    pub namespace: String,
    pub name: String,
}

impl PoolRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for PoolRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

// =============================================================================
// Service Logs
// =============================================================================

/// A customer notification rendered from a remote template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceLog {
    /// Cluster the notification is posted to
    pub cluster_id: String,
    /// Template reference (URL)
    pub template: String,
    /// `KEY=VALUE` template parameters
    pub template_params: Vec<String>,
}

impl ServiceLog {
    /// Equivalent command line an operator can run by hand
    pub fn manual_command(&self) -> String {
        let mut command = format!("osdctl servicelog post {} -t {}", self.cluster_id, self.template);
        if !self.template_params.is_empty() {
            command.push_str(" -p ");
            command.push_str(&self.template_params.join(" -p "));
        }
        command
    }
}

// =============================================================================
// Pool Store Port
// =============================================================================

/// Port for MachinePool and namespace operations on the management cluster
#[async_trait]
pub trait PoolStore: Send + Sync {
    /// Names of namespaces matching a label selector
    async fn list_namespaces(&self, label_selector: &str) -> Result<Vec<String>>;

    /// All MachinePools in a namespace
    async fn list_pools(&self, namespace: &str) -> Result<Vec<MachinePool>>;

    /// Fetch a MachinePool; `None` when it does not exist
    async fn get_pool(&self, pool: &PoolRef) -> Result<Option<MachinePool>>;

    /// Create a MachinePool
    async fn create_pool(&self, pool: &MachinePool) -> Result<()>;

    /// Request deletion of a MachinePool
    async fn delete_pool(&self, pool: &PoolRef) -> Result<()>;
}

// =============================================================================
// Node Inventory Port
// =============================================================================

/// Port for reading nodes of the managed cluster
#[async_trait]
pub trait NodeInventory: Send + Sync {
    /// Nodes matching a label selector
    async fn list_nodes(&self, label_selector: &str) -> Result<Vec<Node>>;
}

// =============================================================================
// Operator Interaction Ports
// =============================================================================

/// Port for the human-in-the-loop gate before the first mutation
#[async_trait]
pub trait Confirmer: Send + Sync {
    /// Ask the operator; `Ok(false)` means declined
    async fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Port for customer notification delivery
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Post a service log
    async fn notify(&self, log: &ServiceLog) -> Result<()>;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type PoolStoreRef = Arc<dyn PoolStore>;
pub type NodeInventoryRef = Arc<dyn NodeInventory>;
pub type ConfirmerRef = Arc<dyn Confirmer>;
pub type NotifierRef = Arc<dyn Notifier>;
