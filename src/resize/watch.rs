//! Cluster state watchers
//!
//! Each wait polls immediately, then on a fixed cadence, until its condition
//! holds, its own timeout expires, or a read fails. Read failures are not
//! retried: only "not there yet" keeps a wait alive.

use crate::config::PollSettings;
use crate::domain::ports::{NodeInventoryRef, PoolRef, PoolStoreRef};
use crate::error::{Error, Result};
use k8s_openapi::api::core::v1::Node;
use std::future::Future;
use tokio::time::Instant;
use tracing::{debug, info};

/// The "Ready" condition type for nodes
pub const CONDITION_READY: &str = "Ready";
/// The "True" status value for conditions
pub const STATUS_TRUE: &str = "True";

/// Outcome of a single poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// Condition met, stop polling
    Satisfied,
    /// Not yet; carries a description of what was observed
    Pending(String),
}

/// Poll `check` until it is satisfied or `poll.timeout` elapses.
///
/// The first check runs without delay. An `Err` from `check` ends the wait
/// immediately with that error.
pub async fn poll_immediate<F, Fut>(operation: &str, poll: PollSettings, mut check: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollStatus>>,
{
    if poll.interval.is_zero() {
        return Err(Error::Configuration(format!(
            "poll interval for {} must be greater than zero",
            operation
        )));
    }

    let deadline = Instant::now() + poll.timeout;
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        match check().await? {
            PollStatus::Satisfied => {
                debug!(operation, attempt, "Wait condition met");
                return Ok(());
            }
            PollStatus::Pending(observed) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(Error::WaitTimedOut {
                        operation: operation.to_string(),
                        timeout: poll.timeout,
                        last_observed: observed,
                    });
                }
                debug!(operation, attempt, %observed, "Wait condition not met, continuing to wait");
                tokio::time::sleep(poll.interval.min(deadline - now)).await;
            }
        }
    }
}

/// Whether a node reports Ready=True
pub fn is_node_ready(node: &Node) -> bool {
    node.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .map(|conds| {
            conds
                .iter()
                .any(|c| c.type_ == CONDITION_READY && c.status == STATUS_TRUE)
        })
        .unwrap_or(false)
}

fn node_name(node: &Node) -> &str {
    node.metadata.name.as_deref().unwrap_or("<unnamed>")
}

// =============================================================================
// Node Readiness Watcher
// =============================================================================

/// Waits on the number of nodes behind a label selector
#[derive(Clone)]
pub struct NodeReadinessWatcher {
    nodes: NodeInventoryRef,
}

impl NodeReadinessWatcher {
    pub fn new(nodes: NodeInventoryRef) -> Self {
        Self { nodes }
    }

    /// Wait until at least `target` nodes matching `selector` report Ready
    pub async fn await_ready_count(&self, selector: &str, target: usize, poll: PollSettings) -> Result<()> {
        let nodes = &self.nodes;
        let operation = format!("{} nodes matching {} to report Ready", target, selector);
        info!("Waiting for {} nodes matching {} to be reporting Ready", target, selector);

        poll_immediate(&operation, poll, move || async move {
            let listed = nodes.list_nodes(selector).await?;
            let ready: Vec<&str> = listed
                .iter()
                .filter(|node| is_node_ready(node))
                .map(node_name)
                .collect();

            for name in &ready {
                debug!("Found node {} reporting Ready", name);
            }

            if ready.len() >= target {
                info!("Found {} nodes reporting Ready", ready.len());
                Ok(PollStatus::Satisfied)
            } else {
                info!("Found {} nodes reporting Ready, continuing to wait", ready.len());
                Ok(PollStatus::Pending(format!(
                    "{} of {} nodes Ready",
                    ready.len(),
                    listed.len()
                )))
            }
        })
        .await
    }

    /// Wait until exactly `exact` nodes match `selector`, ready or not
    pub async fn await_node_count(&self, selector: &str, exact: usize, poll: PollSettings) -> Result<()> {
        let nodes = &self.nodes;
        let operation = format!("node count matching {} to return to {}", selector, exact);
        info!("Waiting for node count matching {} to return to: {}", selector, exact);

        poll_immediate(&operation, poll, move || async move {
            let count = nodes.list_nodes(selector).await?.len();
            if count == exact {
                info!("Found {} nodes, node count settled", count);
                Ok(PollStatus::Satisfied)
            } else {
                info!("Found {} nodes, continuing to wait", count);
                Ok(PollStatus::Pending(format!("{} nodes", count)))
            }
        })
        .await
    }
}

// =============================================================================
// Pool Lifecycle Watcher
// =============================================================================

/// Waits on the existence of a MachinePool
#[derive(Clone)]
pub struct PoolLifecycleWatcher {
    pools: PoolStoreRef,
}

impl PoolLifecycleWatcher {
    pub fn new(pools: PoolStoreRef) -> Self {
        Self { pools }
    }

    /// Wait until `pool` is confirmed absent
    pub async fn await_absence(&self, pool: &PoolRef, poll: PollSettings) -> Result<()> {
        let pools = &self.pools;
        let operation = format!("machinepool {} to be deleted", pool);

        poll_immediate(&operation, poll, move || async move {
            match pools.get_pool(pool).await? {
                None => {
                    info!("Machinepool {} is gone", pool);
                    Ok(PollStatus::Satisfied)
                }
                Some(_) => {
                    info!("Machinepool {} still exists, continuing to wait", pool);
                    Ok(PollStatus::Pending("machinepool still exists".to_string()))
                }
            }
        })
        .await
    }
}
