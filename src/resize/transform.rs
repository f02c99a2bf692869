//! Pool spec derivation
//!
//! Builds the replacement and temporary MachinePools from the one currently
//! serving the infra role. Pure transformations over in-memory copies.

use crate::crd::MachinePool;
use crate::domain::ports::CloudProvider;
use crate::error::{Error, Result};
use crate::resize::catalog::InstanceSizeCatalog;
use tracing::{debug, info};

/// Derives resized and temporary pools from an existing one
#[derive(Debug, Clone)]
pub struct PoolSpecTransformer<'a> {
    catalog: &'a InstanceSizeCatalog,
    temporary_suffix: String,
}

impl<'a> PoolSpecTransformer<'a> {
    pub fn new(catalog: &'a InstanceSizeCatalog, temporary_suffix: impl Into<String>) -> Self {
        Self {
            catalog,
            temporary_suffix: temporary_suffix.into(),
        }
    }

    /// Copy of `original` sized one step up (or to `override_type`), with
    /// every server-assigned field cleared so it can be created afresh.
    pub fn derive_resized(
        &self,
        original: &MachinePool,
        override_type: Option<&str>,
    ) -> Result<MachinePool> {
        let (provider, current) =
            original
                .instance_type()
                .ok_or_else(|| Error::UnsupportedPlatform {
                    pool: original.pool_ref().to_string(),
                })?;

        let target = match override_type {
            Some(instance_type) if instance_type.trim().is_empty() => {
                return Err(Error::Configuration(
                    "override instance type must not be blank".to_string(),
                ))
            }
            Some(instance_type) => {
                info!("Using override instance type: {}", instance_type);
                instance_type
            }
            None => self.catalog.next_size(provider, current)?,
        };

        debug!(
            pool = %original.pool_ref(),
            %provider,
            from = current,
            to = target,
            "Deriving resized machinepool"
        );

        let mut resized = original.clone();
        clear_server_fields(&mut resized);
        set_instance_type(&mut resized, provider, target)?;
        Ok(resized)
    }

    /// Same-size sibling of `new_pool` under a suffixed identity
    pub fn derive_temporary(&self, new_pool: &MachinePool) -> MachinePool {
        let mut temporary = new_pool.clone();
        if let Some(name) = temporary.metadata.name.as_mut() {
            name.push_str(&self.temporary_suffix);
        }
        temporary.spec.name.push_str(&self.temporary_suffix);
        temporary
    }
}

/// Unset everything the API server or Hive assigns
fn clear_server_fields(pool: &mut MachinePool) {
    let meta = &mut pool.metadata;
    meta.creation_timestamp = None;
    meta.deletion_timestamp = None;
    meta.deletion_grace_period_seconds = None;
    meta.finalizers = None;
    meta.resource_version = None;
    meta.generation = None;
    meta.self_link = None;
    meta.uid = None;
    meta.managed_fields = None;
    pool.status = None;
}

fn set_instance_type(pool: &mut MachinePool, provider: CloudProvider, instance_type: &str) -> Result<()> {
    if pool.spec.platform.set_instance_type(provider, instance_type) {
        Ok(())
    } else {
        Err(Error::UnsupportedPlatform {
            pool: pool.pool_ref().to_string(),
        })
    }
}
