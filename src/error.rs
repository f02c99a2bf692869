//! Error types for the infra resizer
//!
//! Provides structured error types for pool discovery, spec derivation,
//! control plane calls, watchers, and customer notification.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for the resizer
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Discovery Errors
    // =========================================================================
    #[error("Expected 1 namespace, found {found} namespaces with label: {selector}")]
    AmbiguousOrMissingNamespace { selector: String, found: usize },

    #[error("Did not find the infra machinepool in namespace: {namespace}")]
    InfraPoolNotFound { namespace: String },

    #[error("Machinepool {pool} has no fixed replica count")]
    MissingReplicaCount { pool: String },

    // =========================================================================
    // Sizing Errors
    // =========================================================================
    #[error("Unsupported platform for machinepool {pool}, only AWS and GCP are supported")]
    UnsupportedPlatform { pool: String },

    #[error("Resizing instance type {instance_type} not supported")]
    UnsupportedInstanceType { instance_type: String },

    #[error("Catalog parse error: {0}")]
    CatalogParse(#[from] serde_yaml::Error),

    // =========================================================================
    // Control Plane Errors
    // =========================================================================
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Control plane error during {operation}: {reason}")]
    ControlPlane { operation: String, reason: String },

    // =========================================================================
    // Wait Errors
    // =========================================================================
    #[error("Timed out after {timeout:?} waiting for {operation} (last observed: {last_observed})")]
    WaitTimedOut {
        operation: String,
        timeout: Duration,
        last_observed: String,
    },

    // =========================================================================
    // Notification Errors
    // =========================================================================
    #[error("Notification failed: {0}")]
    Notification(String),

    // =========================================================================
    // Campaign Errors
    // =========================================================================
    #[error("Resize failed during {phase}: {source}")]
    Phase {
        phase: String,
        #[source]
        source: Box<Error>,
    },

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Broad classification of an error, used for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input or cluster shape, detected before any mutation
    Configuration,
    /// A list/get/create/delete call failed
    ControlPlane,
    /// A watcher ran out of time
    WaitTimedOut,
    /// The customer notification could not be sent
    Notification,
    /// Anything else
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::ControlPlane => write!(f, "control-plane"),
            ErrorCategory::WaitTimedOut => write!(f, "wait-timed-out"),
            ErrorCategory::Notification => write!(f, "notification"),
            ErrorCategory::Internal => write!(f, "internal"),
        }
    }
}

impl Error {
    /// Classify this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Configuration(_)
            | Error::AmbiguousOrMissingNamespace { .. }
            | Error::InfraPoolNotFound { .. }
            | Error::MissingReplicaCount { .. }
            | Error::UnsupportedPlatform { .. }
            | Error::UnsupportedInstanceType { .. }
            | Error::CatalogParse(_)
            | Error::Io(_) => ErrorCategory::Configuration,

            Error::Kube(_) | Error::ControlPlane { .. } => ErrorCategory::ControlPlane,

            Error::WaitTimedOut { .. } => ErrorCategory::WaitTimedOut,

            Error::Notification(_) => ErrorCategory::Notification,

            Error::Phase { source, .. } => source.category(),

            Error::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Whether this error abandons the campaign
    pub fn is_fatal(&self) -> bool {
        !matches!(self.category(), ErrorCategory::Notification)
    }

    /// Name of the campaign phase the error was raised in, if known
    pub fn phase(&self) -> Option<&str> {
        match self {
            Error::Phase { phase, .. } => Some(phase.as_str()),
            _ => None,
        }
    }

    /// Strip the phase wrapper, if any
    pub fn root(&self) -> &Error {
        match self {
            Error::Phase { source, .. } => source.root(),
            other => other,
        }
    }

    /// Wrap this error with the phase it happened in
    pub fn in_phase(self, phase: impl std::fmt::Display) -> Self {
        Error::Phase {
            phase: phase.to_string(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for the resizer
pub type Result<T> = std::result::Result<T, Error>;
