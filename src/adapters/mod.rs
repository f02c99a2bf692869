//! Adapters
//!
//! Concrete implementations of the domain ports:
//! - Kubernetes: MachinePools on the management cluster, nodes on the managed cluster
//! - Prompt: `[y/N]` confirmation on the terminal
//! - Service log: customer notification through `osdctl`

pub mod kubernetes;
pub mod prompt;
pub mod servicelog;

pub use kubernetes::*;
pub use prompt::*;
pub use servicelog::*;
