//! Infra Resizer - zero-downtime infra MachinePool resize
//!
//! Moves the infra nodes of a managed OpenShift cluster to a larger instance
//! type without ever dropping below the original infra capacity.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        ResizeOrchestrator                        │
//! │   discover -> plan -> confirm -> double -> cut over -> shrink    │
//! ├──────────────────┬────────────────────┬──────────────────────────┤
//! │  Size Catalog    │  Pool Transformer  │  Readiness / Lifecycle   │
//! │  (next size up)  │  (resized + temp)  │  Watchers (poll loops)   │
//! ├──────────────────┴────────────────────┴──────────────────────────┤
//! │                          Domain Ports                            │
//! │     PoolStore    NodeInventory    Confirmer    Notifier          │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                           Adapters                               │
//! │  Hive MachinePools (kube)  Nodes (kube)  stdin prompt  osdctl    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`resize`]: Catalog, pool derivation, watchers and the campaign orchestrator
//! - [`adapters`]: Kubernetes, terminal and `osdctl` implementations of the ports
//! - [`crd`]: Hive MachinePool resource
//! - [`domain`]: Port traits and shared value types
//! - [`config`]: Defaults and runtime settings
//! - [`error`]: Error types and handling

pub mod adapters;
pub mod config;
pub mod crd;
pub mod domain;
pub mod error;
pub mod resize;

// Re-export commonly used types
pub use adapters::{client_for_context, KubeNodeInventory, KubePoolStore, OsdctlNotifier, StdinConfirmer};

pub use config::{PollSettings, ResizeConfig};

pub use crd::{MachinePool, MachinePoolPlatform, MachinePoolSpec, ProviderMachineConfig};

pub use domain::ports::{
    CloudProvider, Confirmer, NodeInventory, Notifier, PoolRef, PoolStore, ServiceLog,
};

pub use error::{Error, ErrorCategory, Result};

pub use resize::{
    InstanceSizeCatalog, NotificationOutcome, PoolSpecTransformer, ResizeOrchestrator,
    ResizeOutcome, ResizePhase, ResizePlan, ResizeReport, ResizeRequest,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
