//! Custom Resource Definitions consumed by the resizer
//!
//! - MachinePool: Hive's declarative node pool request

pub mod machine_pool;

pub use machine_pool::*;
