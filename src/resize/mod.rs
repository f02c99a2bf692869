//! Infra Resize Module
//!
//! The double-capacity cutover that moves an infra MachinePool to a larger
//! instance type: sizing catalog, pool derivation, cluster watchers and the
//! campaign orchestrator.

pub mod catalog;
pub mod orchestrator;
pub mod transform;
pub mod watch;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::*;
pub use orchestrator::*;
pub use transform::*;
pub use watch::*;
