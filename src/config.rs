//! Resize campaign configuration
//!
//! Defaults match the runbook the tool automates: 20 second polls, 20 minute
//! ceiling per wait, Hive's `infra` pool and the standard infra node role.

use std::time::Duration;

/// Label carrying the cluster id on its Hive namespace
pub const CLUSTER_ID_LABEL: &str = "api.openshift.com/id";

/// Logical name of the infra MachinePool
pub const INFRA_POOL_NAME: &str = "infra";

/// Selector for infra nodes on the managed cluster
pub const INFRA_NODE_SELECTOR: &str = "node-role.kubernetes.io/infra=";

/// Suffix appended to the temporary pool's names
pub const TEMPORARY_POOL_SUFFIX: &str = "2";

/// Service log template announcing the resize to the customer
pub const RESIZED_INFRA_NODE_TEMPLATE: &str =
    "https://raw.githubusercontent.com/openshift/managed-notifications/master/osd/infranode_resized_auto.json";

/// Default time between polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);

/// Default ceiling for a single wait
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// Cadence and ceiling of a watcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Time between polls
    pub interval: Duration,
    /// Maximum time to wait
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

/// Configuration for a resize campaign
#[derive(Debug, Clone)]
pub struct ResizeConfig {
    /// Poll cadence shared by every wait
    pub poll: PollSettings,
    /// Logical name of the pool to resize
    pub infra_pool_name: String,
    /// Label selector matching the pool's nodes
    pub infra_node_selector: String,
    /// Namespace label key holding the cluster id
    pub cluster_id_label: String,
    /// Suffix for the temporary pool
    pub temporary_suffix: String,
    /// Notification template reference
    pub service_log_template: String,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            poll: PollSettings::default(),
            infra_pool_name: INFRA_POOL_NAME.to_string(),
            infra_node_selector: INFRA_NODE_SELECTOR.to_string(),
            cluster_id_label: CLUSTER_ID_LABEL.to_string(),
            temporary_suffix: TEMPORARY_POOL_SUFFIX.to_string(),
            service_log_template: RESIZED_INFRA_NODE_TEMPLATE.to_string(),
        }
    }
}

impl ResizeConfig {
    /// Label selector for the cluster's Hive namespace
    pub fn namespace_selector(&self, cluster_id: &str) -> String {
        format!("{}={}", self.cluster_id_label, cluster_id)
    }
}
