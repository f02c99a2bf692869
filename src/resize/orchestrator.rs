//! Resize Orchestrator - the campaign state machine
//!
//! Drives one infra resize end to end:
//!
//! ```text
//! init -> discover-original-pool -> compute-plan -> confirm
//!      -> create-temporary-pool -> await-double-capacity
//!      -> delete-original-pool  -> await-original-absent
//!      -> create-final-pool     -> await-final-capacity
//!      -> delete-temporary-pool -> await-temporary-absent
//!      -> await-steady-replica-count -> notify-best-effort -> done
//! ```
//!
//! Phases run strictly in order; each mutation is confirmed only by the wait
//! that follows it. A failure abandons the campaign where it stands: nothing
//! is rolled back, so the operator can see and recover the intermediate state.

use crate::config::ResizeConfig;
use crate::crd::MachinePool;
use crate::domain::ports::{
    CloudProvider, ConfirmerRef, NodeInventoryRef, NotifierRef, PoolRef, PoolStoreRef, ServiceLog,
};
use crate::error::{Error, Result};
use crate::resize::catalog::InstanceSizeCatalog;
use crate::resize::transform::PoolSpecTransformer;
use crate::resize::watch::{NodeReadinessWatcher, PoolLifecycleWatcher};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use tracing::{info, warn};

// =============================================================================
// Phases
// =============================================================================

/// Campaign phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizePhase {
    Init,
    DiscoverOriginalPool,
    ComputePlan,
    Confirm,
    CreateTemporaryPool,
    AwaitDoubleCapacity,
    DeleteOriginalPool,
    AwaitOriginalAbsent,
    CreateFinalPool,
    AwaitFinalCapacity,
    DeleteTemporaryPool,
    AwaitTemporaryAbsent,
    AwaitSteadyReplicaCount,
    NotifyBestEffort,
    Done,
}

impl std::fmt::Display for ResizePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResizePhase::Init => "init",
            ResizePhase::DiscoverOriginalPool => "discover-original-pool",
            ResizePhase::ComputePlan => "compute-plan",
            ResizePhase::Confirm => "confirm",
            ResizePhase::CreateTemporaryPool => "create-temporary-pool",
            ResizePhase::AwaitDoubleCapacity => "await-double-capacity",
            ResizePhase::DeleteOriginalPool => "delete-original-pool",
            ResizePhase::AwaitOriginalAbsent => "await-original-absent",
            ResizePhase::CreateFinalPool => "create-final-pool",
            ResizePhase::AwaitFinalCapacity => "await-final-capacity",
            ResizePhase::DeleteTemporaryPool => "delete-temporary-pool",
            ResizePhase::AwaitTemporaryAbsent => "await-temporary-absent",
            ResizePhase::AwaitSteadyReplicaCount => "await-steady-replica-count",
            ResizePhase::NotifyBestEffort => "notify-best-effort",
            ResizePhase::Done => "done",
        };
        write!(f, "{}", name)
    }
}

// =============================================================================
// Requests, Plans and Reports
// =============================================================================

/// What the operator asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeRequest {
    /// Cluster whose infra pool is resized
    pub cluster_id: String,
    /// Explicit target size, bypassing the catalog
    pub instance_type: Option<String>,
}

impl ResizeRequest {
    pub fn new(cluster_id: impl Into<String>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            instance_type: None,
        }
    }

    /// Explicit target size; a blank value leaves the catalog in charge
    pub fn with_instance_type(mut self, instance_type: impl Into<String>) -> Self {
        let instance_type = instance_type.into();
        self.instance_type = match instance_type.trim() {
            "" => None,
            trimmed => Some(trimmed.to_string()),
        };
        self
    }
}

/// Everything one campaign needs, computed before the first mutation
#[derive(Debug, Clone)]
pub struct ResizePlan {
    pub original: MachinePool,
    pub provider: CloudProvider,
    pub current_instance_type: String,
    pub target_instance_type: String,
    /// Permanent replacement, same identity as the original
    pub new_pool: MachinePool,
    /// Same-size sibling carrying the overlap
    pub temporary_pool: MachinePool,
    pub original_replicas: usize,
}

impl ResizePlan {
    /// Ready nodes expected while two pools of the original size coexist
    pub fn double_capacity_target(&self) -> usize {
        self.original_replicas * 2
    }

    /// Node count once the temporary pool has drained
    pub fn steady_state_target(&self) -> usize {
        self.original_replicas
    }

    pub fn original_ref(&self) -> PoolRef {
        self.original.pool_ref()
    }

    pub fn new_ref(&self) -> PoolRef {
        self.new_pool.pool_ref()
    }

    pub fn temporary_ref(&self) -> PoolRef {
        self.temporary_pool.pool_ref()
    }

    /// Question put to the operator before anything is touched
    pub fn confirmation_prompt(&self) -> String {
        format!(
            "Planning to resize infra machinepool {} ({} replicas) from {} to instance type {}. Continue?",
            self.original_ref(),
            self.original_replicas,
            self.current_instance_type,
            self.target_instance_type
        )
    }
}

/// Result of the best-effort customer notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum NotificationOutcome {
    Sent,
    Failed { reason: String, manual_command: String },
}

/// Summary of a completed campaign
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeReport {
    pub cluster_id: String,
    pub pool: PoolRef,
    pub temporary_pool: PoolRef,
    pub provider: CloudProvider,
    pub from_instance_type: String,
    pub to_instance_type: String,
    pub replicas: usize,
    pub phases: Vec<ResizePhase>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub notification: NotificationOutcome,
}

/// How a campaign ended without error
#[derive(Debug, Clone)]
pub enum ResizeOutcome {
    /// Operator declined at the prompt; nothing was changed
    Declined,
    /// Infra pool now runs on the new instance type
    Completed(ResizeReport),
}

// =============================================================================
// Campaign Tracking
// =============================================================================

/// Phase bookkeeping for a single run
struct Campaign {
    cluster_id: String,
    started_at: DateTime<Utc>,
    phases: Vec<ResizePhase>,
}

impl Campaign {
    fn start(cluster_id: &str) -> Self {
        let mut campaign = Self {
            cluster_id: cluster_id.to_string(),
            started_at: Utc::now(),
            phases: Vec::new(),
        };
        campaign.enter(ResizePhase::Init);
        campaign
    }

    fn enter(&mut self, phase: ResizePhase) {
        info!(cluster_id = %self.cluster_id, %phase, "Entering phase");
        self.phases.push(phase);
    }

    /// Run one phase, tagging any error with it
    async fn step<T, F>(&mut self, phase: ResizePhase, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.enter(phase);
        work.await.map_err(|e| e.in_phase(phase))
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Drives the infra resize campaign against the cluster ports
pub struct ResizeOrchestrator {
    config: ResizeConfig,
    catalog: InstanceSizeCatalog,
    pools: PoolStoreRef,
    confirmer: ConfirmerRef,
    notifier: NotifierRef,
    readiness: NodeReadinessWatcher,
    lifecycle: PoolLifecycleWatcher,
}

impl ResizeOrchestrator {
    /// Create a new orchestrator
    pub fn new(
        config: ResizeConfig,
        catalog: InstanceSizeCatalog,
        pools: PoolStoreRef,
        nodes: NodeInventoryRef,
        confirmer: ConfirmerRef,
        notifier: NotifierRef,
    ) -> Self {
        Self {
            config,
            catalog,
            readiness: NodeReadinessWatcher::new(nodes),
            lifecycle: PoolLifecycleWatcher::new(pools.clone()),
            pools,
            confirmer,
            notifier,
        }
    }

    /// Locate the infra MachinePool of `cluster_id` on the management cluster
    pub async fn discover_original_pool(&self, cluster_id: &str) -> Result<MachinePool> {
        let selector = self.config.namespace_selector(cluster_id);
        let namespaces = self.pools.list_namespaces(&selector).await?;

        let namespace = match namespaces.as_slice() {
            [only] => only.clone(),
            _ => {
                return Err(Error::AmbiguousOrMissingNamespace {
                    selector,
                    found: namespaces.len(),
                })
            }
        };
        info!("Found namespace: {}", namespace);

        let infra = self
            .pools
            .list_pools(&namespace)
            .await?
            .into_iter()
            .find(|pool| pool.logical_name() == self.config.infra_pool_name)
            .ok_or_else(|| Error::InfraPoolNotFound {
                namespace: namespace.clone(),
            })?;

        info!("Found machinepool {}", infra.pool_ref());
        Ok(infra)
    }

    /// Derive the replacement and temporary pools for `original`
    pub fn compute_plan(&self, original: MachinePool, override_type: Option<&str>) -> Result<ResizePlan> {
        let transformer = PoolSpecTransformer::new(&self.catalog, self.config.temporary_suffix.as_str());

        let new_pool = transformer.derive_resized(&original, override_type)?;
        let temporary_pool = transformer.derive_temporary(&new_pool);

        let replicas = original
            .replicas()
            .and_then(|r| usize::try_from(r).ok())
            .ok_or_else(|| Error::MissingReplicaCount {
                pool: original.pool_ref().to_string(),
            })?;

        let (provider, current) = original.instance_type().ok_or_else(|| Error::UnsupportedPlatform {
            pool: original.pool_ref().to_string(),
        })?;
        let (_, target) = new_pool.instance_type().ok_or_else(|| Error::UnsupportedPlatform {
            pool: new_pool.pool_ref().to_string(),
        })?;

        Ok(ResizePlan {
            provider,
            current_instance_type: current.to_string(),
            target_instance_type: target.to_string(),
            original_replicas: replicas,
            original,
            new_pool,
            temporary_pool,
        })
    }

    /// Run the whole campaign
    pub async fn run(&self, request: &ResizeRequest) -> Result<ResizeOutcome> {
        let poll = self.config.poll;
        let selector = self.config.infra_node_selector.as_str();
        let mut campaign = Campaign::start(&request.cluster_id);

        info!("Resizing infra nodes for {}", request.cluster_id);

        let original = campaign
            .step(
                ResizePhase::DiscoverOriginalPool,
                self.discover_original_pool(&request.cluster_id),
            )
            .await?;

        let plan = campaign
            .step(ResizePhase::ComputePlan, async {
                self.compute_plan(original, request.instance_type.as_deref())
            })
            .await?;
        let instance_type = plan.target_instance_type.as_str();

        info!("Planning to resize to instance type {}", instance_type);
        let confirmed = campaign
            .step(ResizePhase::Confirm, self.confirmer.confirm(&plan.confirmation_prompt()))
            .await?;
        if !confirmed {
            info!("Resize declined, exiting");
            return Ok(ResizeOutcome::Declined);
        }

        info!(
            "Creating temporary machinepool {}, with instance type {}",
            plan.temporary_ref(),
            instance_type
        );
        campaign
            .step(ResizePhase::CreateTemporaryPool, self.pools.create_pool(&plan.temporary_pool))
            .await?;

        campaign
            .step(
                ResizePhase::AwaitDoubleCapacity,
                self.readiness
                    .await_ready_count(selector, plan.double_capacity_target(), poll),
            )
            .await?;

        info!(
            "Deleting original machinepool {}, with instance type {}",
            plan.original_ref(),
            plan.current_instance_type
        );
        campaign
            .step(ResizePhase::DeleteOriginalPool, self.pools.delete_pool(&plan.original_ref()))
            .await?;

        campaign
            .step(
                ResizePhase::AwaitOriginalAbsent,
                self.lifecycle.await_absence(&plan.original_ref(), poll),
            )
            .await?;

        info!(
            "Creating new machinepool {}, with instance type {}",
            plan.new_ref(),
            instance_type
        );
        campaign
            .step(ResizePhase::CreateFinalPool, self.pools.create_pool(&plan.new_pool))
            .await?;

        campaign
            .step(
                ResizePhase::AwaitFinalCapacity,
                self.readiness
                    .await_ready_count(selector, plan.double_capacity_target(), poll),
            )
            .await?;

        info!(
            "Deleting temporary machinepool {}, with instance type {}",
            plan.temporary_ref(),
            instance_type
        );
        campaign
            .step(ResizePhase::DeleteTemporaryPool, self.pools.delete_pool(&plan.temporary_ref()))
            .await?;

        campaign
            .step(
                ResizePhase::AwaitTemporaryAbsent,
                self.lifecycle.await_absence(&plan.temporary_ref(), poll),
            )
            .await?;

        campaign
            .step(
                ResizePhase::AwaitSteadyReplicaCount,
                self.readiness
                    .await_node_count(selector, plan.steady_state_target(), poll),
            )
            .await?;

        campaign.enter(ResizePhase::NotifyBestEffort);
        let notification = self.notify(&request.cluster_id, &plan).await;

        campaign.enter(ResizePhase::Done);
        info!(
            "Infra resize complete for {}: {} -> {}",
            request.cluster_id, plan.current_instance_type, plan.target_instance_type
        );

        Ok(ResizeOutcome::Completed(ResizeReport {
            cluster_id: campaign.cluster_id,
            pool: plan.new_ref(),
            temporary_pool: plan.temporary_ref(),
            provider: plan.provider,
            from_instance_type: plan.current_instance_type.clone(),
            to_instance_type: plan.target_instance_type.clone(),
            replicas: plan.original_replicas,
            phases: campaign.phases,
            started_at: campaign.started_at,
            finished_at: Utc::now(),
            notification,
        }))
    }

    /// Service log announcing the new instance type
    pub fn service_log(&self, cluster_id: &str, plan: &ResizePlan) -> ServiceLog {
        ServiceLog {
            cluster_id: cluster_id.to_string(),
            template: self.config.service_log_template.clone(),
            template_params: vec![format!("INSTANCE_TYPE={}", plan.target_instance_type)],
        }
    }

    /// Post the service log; failures degrade to a manual command
    async fn notify(&self, cluster_id: &str, plan: &ResizePlan) -> NotificationOutcome {
        let log = self.service_log(cluster_id, plan);
        match self.notifier.notify(&log).await {
            Ok(()) => {
                info!("Sent service log to cluster {}", cluster_id);
                NotificationOutcome::Sent
            }
            Err(e) => {
                let manual_command = log.manual_command();
                warn!(
                    error = %e,
                    "Failed to send service log, send it manually with: {}",
                    manual_command
                );
                NotificationOutcome::Failed {
                    reason: e.to_string(),
                    manual_command,
                }
            }
        }
    }
}
