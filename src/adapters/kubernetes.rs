//! Kubernetes adapters
//!
//! `PoolStore` over Hive's MachinePool API on the management cluster and
//! `NodeInventory` over the managed cluster's nodes. Every call goes to the
//! API server; nothing is cached.

use crate::crd::MachinePool;
use crate::domain::ports::{NodeInventory, PoolRef, PoolStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Node};
use kube::api::{DeleteParams, ListParams, PostParams};
use kube::config::KubeConfigOptions;
use kube::{Api, Client, Config, ResourceExt};
use std::time::Duration;
use tracing::debug;

/// Default connection timeout for kube clients
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default read timeout for kube clients
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Create a client for a kubeconfig context, or the inferred default
pub async fn client_for_context(context: Option<&str>) -> Result<Client> {
    let mut config = match context {
        Some(context) => {
            let options = KubeConfigOptions {
                context: Some(context.to_string()),
                ..Default::default()
            };
            Config::from_kubeconfig(&options).await.map_err(|e| {
                Error::Configuration(format!("failed to load kubeconfig context {}: {}", context, e))
            })?
        }
        None => Config::infer()
            .await
            .map_err(|e| Error::Configuration(format!("failed to infer kube config: {}", e)))?,
    };
    config.connect_timeout = Some(DEFAULT_CONNECT_TIMEOUT);
    config.read_timeout = Some(DEFAULT_READ_TIMEOUT);

    Ok(Client::try_from(config)?)
}

// =============================================================================
// Pool Store
// =============================================================================

/// MachinePool access on the management cluster.
///
/// Reads go through `reader`; creates and deletes through `admin`, which may
/// carry elevated credentials.
#[derive(Clone)]
pub struct KubePoolStore {
    reader: Client,
    admin: Client,
}

impl KubePoolStore {
    pub fn new(reader: Client, admin: Client) -> Self {
        Self { reader, admin }
    }

    fn pools(client: &Client, namespace: &str) -> Api<MachinePool> {
        Api::namespaced(client.clone(), namespace)
    }
}

#[async_trait]
impl PoolStore for KubePoolStore {
    async fn list_namespaces(&self, label_selector: &str) -> Result<Vec<String>> {
        let namespaces: Api<Namespace> = Api::all(self.reader.clone());
        let list = namespaces
            .list(&ListParams::default().labels(label_selector))
            .await?;
        Ok(list.items.iter().map(|ns| ns.name_any()).collect())
    }

    async fn list_pools(&self, namespace: &str) -> Result<Vec<MachinePool>> {
        let list = Self::pools(&self.reader, namespace)
            .list(&ListParams::default())
            .await?;
        debug!("Listed {} machinepools in {}", list.items.len(), namespace);
        Ok(list.items)
    }

    async fn get_pool(&self, pool: &PoolRef) -> Result<Option<MachinePool>> {
        Ok(Self::pools(&self.reader, &pool.namespace)
            .get_opt(&pool.name)
            .await?)
    }

    async fn create_pool(&self, pool: &MachinePool) -> Result<()> {
        let namespace = pool.metadata.namespace.as_deref().ok_or_else(|| {
            Error::Configuration(format!("machinepool {} has no namespace", pool.name_any()))
        })?;
        Self::pools(&self.admin, namespace)
            .create(&PostParams::default(), pool)
            .await?;
        Ok(())
    }

    async fn delete_pool(&self, pool: &PoolRef) -> Result<()> {
        Self::pools(&self.admin, &pool.namespace)
            .delete(&pool.name, &DeleteParams::default())
            .await?;
        Ok(())
    }
}

// =============================================================================
// Node Inventory
// =============================================================================

/// Node reads on the managed cluster
#[derive(Clone)]
pub struct KubeNodeInventory {
    client: Client,
}

impl KubeNodeInventory {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NodeInventory for KubeNodeInventory {
    async fn list_nodes(&self, label_selector: &str) -> Result<Vec<Node>> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let list = nodes
            .list(&ListParams::default().labels(label_selector))
            .await?;
        Ok(list.items)
    }
}
