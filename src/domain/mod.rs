//! Domain layer - Core domain types and port definitions
//!
//! This module defines the traits (ports) that cluster and operator adapters
//! implement, following hexagonal architecture principles.

pub mod ports;

pub use ports::*;
