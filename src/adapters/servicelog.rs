//! Service log delivery through `osdctl`

use crate::domain::ports::{Notifier, ServiceLog};
use crate::error::{Error, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Posts service logs by running `osdctl servicelog post`
#[derive(Debug, Clone)]
pub struct OsdctlNotifier {
    binary: String,
}

impl Default for OsdctlNotifier {
    fn default() -> Self {
        Self::new("osdctl")
    }
}

impl OsdctlNotifier {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Arguments passed to the binary for `log`
    pub fn command_args(log: &ServiceLog) -> Vec<String> {
        let mut args = vec![
            "servicelog".to_string(),
            "post".to_string(),
            log.cluster_id.clone(),
            "-t".to_string(),
            log.template.clone(),
        ];
        for param in &log.template_params {
            args.push("-p".to_string());
            args.push(param.clone());
        }
        args
    }
}

#[async_trait]
impl Notifier for OsdctlNotifier {
    async fn notify(&self, log: &ServiceLog) -> Result<()> {
        let args = Self::command_args(log);
        debug!("Running {} {}", self.binary, args.join(" "));

        let status = Command::new(&self.binary)
            .args(&args)
            .status()
            .await
            .map_err(|e| Error::Notification(format!("failed to run {}: {}", self.binary, e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::Notification(format!("{} exited with {}", self.binary, status)))
        }
    }
}
