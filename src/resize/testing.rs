//! In-memory stand-ins for the cluster and the operator, used by tests.
//!
//! `FakeCluster` plays the part of Hive and the machine-api: creating a pool
//! brings up its nodes (NotReady for a few polls, then Ready) and deleting a
//! pool removes it and its nodes after a short delay.

use crate::crd::{ClusterDeploymentRef, MachinePool, MachinePoolPlatform, MachinePoolSpec, ProviderMachineConfig};
use crate::domain::ports::{Confirmer, NodeInventory, Notifier, PoolRef, PoolStore, ServiceLog};
use crate::error::{Error, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, NodeCondition, NodeStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const NODE_ROLE_PREFIX: &str = "node-role.kubernetes.io";
pub const MACHINE_POOL_LABEL: &str = "hive.openshift.io/machine-pool";

// =============================================================================
// Fixtures
// =============================================================================

fn pool(namespace: &str, name: &str, logical: &str, replicas: i64, platform: MachinePoolPlatform) -> MachinePool {
    let mut pool = MachinePool::new(
        name,
        MachinePoolSpec {
            cluster_deployment_ref: ClusterDeploymentRef {
                name: "mycluster".into(),
            },
            name: logical.into(),
            replicas: Some(replicas),
            platform,
            extra: BTreeMap::new(),
        },
    );
    pool.metadata.namespace = Some(namespace.into());
    pool
}

fn provider_config(instance_type: &str) -> ProviderMachineConfig {
    ProviderMachineConfig {
        instance_type: instance_type.into(),
        extra: BTreeMap::from([("zones".to_string(), serde_json::json!(["zone-a"]))]),
    }
}

/// MachinePool on AWS
pub fn aws_pool(namespace: &str, name: &str, logical: &str, replicas: i64, instance_type: &str) -> MachinePool {
    pool(
        namespace,
        name,
        logical,
        replicas,
        MachinePoolPlatform {
            aws: Some(provider_config(instance_type)),
            ..Default::default()
        },
    )
}

/// MachinePool on GCP
pub fn gcp_pool(namespace: &str, name: &str, logical: &str, replicas: i64, instance_type: &str) -> MachinePool {
    pool(
        namespace,
        name,
        logical,
        replicas,
        MachinePoolPlatform {
            gcp: Some(provider_config(instance_type)),
            ..Default::default()
        },
    )
}

/// Infra node belonging to logical pool `pool`
pub fn infra_node(name: &str, pool: &str, ready: bool) -> Node {
    pool_node(name, pool, "infra", ready)
}

/// Node with role `role` belonging to logical pool `pool`
pub fn pool_node(name: &str, pool: &str, role: &str, ready: bool) -> Node {
    Node {
        metadata: ObjectMeta {
            name: Some(name.into()),
            labels: Some(BTreeMap::from([
                (format!("{}/{}", NODE_ROLE_PREFIX, role), String::new()),
                (MACHINE_POOL_LABEL.to_string(), pool.to_string()),
            ])),
            ..Default::default()
        },
        status: Some(NodeStatus {
            conditions: Some(vec![NodeCondition {
                type_: "Ready".into(),
                status: if ready { "True" } else { "False" }.into(),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Copy of `node` reporting the given readiness
fn with_readiness(node: &Node, ready: bool) -> Node {
    let mut node = node.clone();
    if let Some(conditions) = node.status.as_mut().and_then(|s| s.conditions.as_mut()) {
        for condition in conditions.iter_mut().filter(|c| c.type_ == "Ready") {
            condition.status = if ready { "True" } else { "False" }.into();
        }
    }
    node
}

/// Role a pool's nodes carry: `infra` for the infra pool and its siblings
fn role_of(pool: &MachinePool) -> &'static str {
    if pool.logical_name().starts_with("infra") {
        "infra"
    } else {
        "worker"
    }
}

/// Minimal `key=value` / `key` label selector matching
pub fn selector_matches(selector: &str, labels: &BTreeMap<String, String>) -> bool {
    selector
        .split(',')
        .filter(|term| !term.is_empty())
        .all(|term| match term.split_once('=') {
            Some((key, value)) => labels.get(key).map(|v| v == value).unwrap_or(false),
            None => labels.contains_key(term),
        })
}

// =============================================================================
// Scripted Ports
// =============================================================================

/// Node inventory replaying a fixed script; the last entry repeats
pub struct ScriptedNodes {
    script: Mutex<VecDeque<Result<Vec<Node>>>>,
    last: Mutex<Option<Vec<Node>>>,
    selectors: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedNodes {
    pub fn new(script: Vec<Result<Vec<Node>>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            selectors: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn selectors(&self) -> Vec<String> {
        self.selectors.lock().unwrap().clone()
    }
}

#[async_trait]
impl NodeInventory for ScriptedNodes {
    async fn list_nodes(&self, label_selector: &str) -> Result<Vec<Node>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.selectors.lock().unwrap().push(label_selector.to_string());

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(nodes)) => {
                *self.last.lock().unwrap() = Some(nodes.clone());
                Ok(nodes)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last.lock().unwrap().clone().unwrap_or_default()),
        }
    }
}

/// Pool store whose `get_pool` replays a fixed script; the last entry repeats
pub struct ScriptedPools {
    script: Mutex<VecDeque<Result<Option<MachinePool>>>>,
    last: Mutex<Option<MachinePool>>,
    calls: AtomicUsize,
}

impl ScriptedPools {
    pub fn new(script: Vec<Result<Option<MachinePool>>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn unscripted(operation: &str) -> Error {
    Error::Internal(format!("{} is not scripted", operation))
}

#[async_trait]
impl PoolStore for ScriptedPools {
    async fn list_namespaces(&self, _label_selector: &str) -> Result<Vec<String>> {
        Err(unscripted("list_namespaces"))
    }

    async fn list_pools(&self, _namespace: &str) -> Result<Vec<MachinePool>> {
        Err(unscripted("list_pools"))
    }

    async fn get_pool(&self, _pool: &PoolRef) -> Result<Option<MachinePool>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(found)) => {
                *self.last.lock().unwrap() = found.clone();
                Ok(found)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last.lock().unwrap().clone()),
        }
    }

    async fn create_pool(&self, _pool: &MachinePool) -> Result<()> {
        Err(unscripted("create_pool"))
    }

    async fn delete_pool(&self, _pool: &PoolRef) -> Result<()> {
        Err(unscripted("delete_pool"))
    }
}

// =============================================================================
// Fake Cluster
// =============================================================================

/// A mutating call observed by the fake cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create { pool: PoolRef, instance_type: String, replicas: i64 },
    Delete { pool: PoolRef },
}

#[derive(Debug, Clone)]
struct FakeNode {
    node: Node,
    /// Node reports Ready once this many node lists have happened
    ready_after: usize,
}

#[derive(Debug, Clone)]
struct FakePool {
    pool: MachinePool,
    /// Remaining `get_pool` calls that still see a deleted pool
    deleting: Option<usize>,
}

#[derive(Debug, Default)]
struct ClusterState {
    namespaces: BTreeMap<String, BTreeMap<String, String>>,
    pools: BTreeMap<PoolRef, FakePool>,
    nodes: Vec<FakeNode>,
    mutations: Vec<Mutation>,
    node_lists: usize,
}

/// Simulated management and managed cluster
pub struct FakeCluster {
    state: Mutex<ClusterState>,
    /// Node lists a new node stays NotReady for
    boot_polls: usize,
    /// `get_pool` calls a deleted pool lingers for
    delete_polls: usize,
    /// Whether created pools ever produce nodes
    provisions_nodes: bool,
}

impl Default for FakeCluster {
    fn default() -> Self {
        Self {
            state: Mutex::new(ClusterState::default()),
            boot_polls: 2,
            delete_polls: 2,
            provisions_nodes: true,
        }
    }
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Created pools never get nodes
    pub fn without_provisioning(mut self) -> Self {
        self.provisions_nodes = false;
        self
    }

    pub fn add_namespace(&self, name: &str, labels: &[(&str, &str)]) {
        let labels = labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        self.state.lock().unwrap().namespaces.insert(name.to_string(), labels);
    }

    /// Seed an existing pool with all of its nodes already Ready
    pub fn add_pool(&self, pool: MachinePool) {
        let mut state = self.state.lock().unwrap();
        for i in 0..pool.replicas().unwrap_or(0) {
            let name = format!("{}-{}", pool.name_any(), i);
            state.nodes.push(FakeNode {
                node: pool_node(&name, pool.logical_name(), role_of(&pool), true),
                ready_after: 0,
            });
        }
        state.pools.insert(pool.pool_ref(), FakePool { pool, deleting: None });
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.state.lock().unwrap().mutations.clone()
    }

    pub fn pool(&self, pool: &PoolRef) -> Option<MachinePool> {
        self.state.lock().unwrap().pools.get(pool).map(|p| p.pool.clone())
    }

    pub fn pool_names(&self) -> Vec<String> {
        self.state.lock().unwrap().pools.keys().map(|p| p.name.clone()).collect()
    }
}

#[async_trait]
impl PoolStore for FakeCluster {
    async fn list_namespaces(&self, label_selector: &str) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .namespaces
            .iter()
            .filter(|(_, labels)| selector_matches(label_selector, labels))
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn list_pools(&self, namespace: &str) -> Result<Vec<MachinePool>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .pools
            .iter()
            .filter(|(r, _)| r.namespace == namespace)
            .map(|(_, p)| p.pool.clone())
            .collect())
    }

    async fn get_pool(&self, pool: &PoolRef) -> Result<Option<MachinePool>> {
        let mut state = self.state.lock().unwrap();
        let remaining = match state.pools.get_mut(pool) {
            None => return Ok(None),
            Some(entry) => match entry.deleting.as_mut() {
                None => return Ok(Some(entry.pool.clone())),
                Some(remaining) => {
                    let left = *remaining;
                    *remaining = remaining.saturating_sub(1);
                    left
                }
            },
        };

        if remaining > 0 {
            return Ok(state.pools.get(pool).map(|p| p.pool.clone()));
        }

        // Finalized: the pool and its machines are gone
        if let Some(gone) = state.pools.remove(pool) {
            let logical = gone.pool.logical_name().to_string();
            state.nodes.retain(|n| {
                n.node
                    .labels()
                    .get(MACHINE_POOL_LABEL)
                    .map(|p| p != &logical)
                    .unwrap_or(true)
            });
        }
        Ok(None)
    }

    async fn create_pool(&self, pool: &MachinePool) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let key = pool.pool_ref();
        if state.pools.contains_key(&key) {
            return Err(Error::ControlPlane {
                operation: "create machinepool".into(),
                reason: format!("machinepools {:?} already exists", key.name),
            });
        }

        let (_, instance_type) = pool
            .instance_type()
            .ok_or_else(|| Error::Internal("pool without platform".into()))?;
        let replicas = pool.replicas().unwrap_or(0);
        state.mutations.push(Mutation::Create {
            pool: key.clone(),
            instance_type: instance_type.to_string(),
            replicas,
        });

        if self.provisions_nodes {
            let ready_after = state.node_lists + self.boot_polls;
            for i in 0..replicas {
                state.nodes.push(FakeNode {
                    node: pool_node(&format!("{}-{}", key.name, i), pool.logical_name(), role_of(pool), false),
                    ready_after,
                });
            }
        }

        state.pools.insert(
            key,
            FakePool {
                pool: pool.clone(),
                deleting: None,
            },
        );
        Ok(())
    }

    async fn delete_pool(&self, pool: &PoolRef) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.mutations.push(Mutation::Delete { pool: pool.clone() });
        match state.pools.get_mut(pool) {
            Some(entry) => {
                entry.deleting.get_or_insert(self.delete_polls);
                Ok(())
            }
            None => Err(Error::ControlPlane {
                operation: "delete machinepool".into(),
                reason: format!("machinepools {:?} not found", pool.name),
            }),
        }
    }
}

#[async_trait]
impl NodeInventory for FakeCluster {
    async fn list_nodes(&self, label_selector: &str) -> Result<Vec<Node>> {
        let mut state = self.state.lock().unwrap();
        state.node_lists += 1;
        let lists = state.node_lists;

        Ok(state
            .nodes
            .iter()
            .filter(|n| selector_matches(label_selector, n.node.labels()))
            .map(|n| with_readiness(&n.node, lists > n.ready_after))
            .collect())
    }
}

// =============================================================================
// Operator Stand-ins
// =============================================================================

/// Confirmer with a fixed answer
pub struct FixedConfirmer {
    answer: bool,
    prompts: Mutex<Vec<String>>,
}

impl FixedConfirmer {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Confirmer for FixedConfirmer {
    async fn confirm(&self, prompt: &str) -> Result<bool> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.answer)
    }
}

/// Notifier recording what it was asked to send
pub struct RecordingNotifier {
    fail: bool,
    sent: Mutex<Vec<ServiceLog>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            fail: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<ServiceLog> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, log: &ServiceLog) -> Result<()> {
        self.sent.lock().unwrap().push(log.clone());
        if self.fail {
            Err(Error::Notification("osdctl exited with status 1".into()))
        } else {
            Ok(())
        }
    }
}
