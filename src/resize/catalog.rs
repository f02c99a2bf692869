//! Instance size catalog
//!
//! Maps an instance type to the next larger size for a given provider. The
//! built-in ladder covers the sizes infra pools are provisioned with; an
//! alternate ladder can be loaded from YAML:
//!
//! ```yaml
//! aws:
//!   m5.xlarge: r5.xlarge
//! gcp:
//!   custom-4-32768-ext: custom-8-65536-ext
//! ```

use crate::domain::ports::CloudProvider;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Built-in AWS ladder, memory optimized
const AWS_LADDER: &[(&str, &str)] = &[
    ("m5.xlarge", "r5.xlarge"),
    ("m5.2xlarge", "r5.2xlarge"),
    ("r5.xlarge", "r5.2xlarge"),
    ("r5.2xlarge", "r5.4xlarge"),
    ("r5.4xlarge", "r5.8xlarge"),
];

/// Built-in GCP ladder, custom machine types
const GCP_LADDER: &[(&str, &str)] = &[
    ("custom-4-32768-ext", "custom-8-65536-ext"),
    ("custom-8-65536-ext", "custom-16-131072-ext"),
];

/// Static `(provider, instance type) -> next size` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceSizeCatalog {
    entries: BTreeMap<(CloudProvider, String), String>,
}

impl Default for InstanceSizeCatalog {
    fn default() -> Self {
        let aws = AWS_LADDER.iter().map(|(from, to)| (CloudProvider::Aws, *from, *to));
        let gcp = GCP_LADDER.iter().map(|(from, to)| (CloudProvider::Gcp, *from, *to));
        Self::from_entries(aws.chain(gcp))
    }
}

impl InstanceSizeCatalog {
    /// Empty catalog
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Build from `(provider, from, to)` triples
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (CloudProvider, S, S)>,
        S: Into<String>,
    {
        let mut catalog = Self::empty();
        for (provider, from, to) in entries {
            catalog.insert(provider, from, to);
        }
        catalog
    }

    /// Parse a YAML ladder keyed by provider
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let ladders: BTreeMap<CloudProvider, BTreeMap<String, String>> = serde_yaml::from_str(yaml)?;
        let catalog = Self::from_entries(ladders.into_iter().flat_map(|(provider, ladder)| {
            ladder.into_iter().map(move |(from, to)| (provider, from, to))
        }));
        if catalog.is_empty() {
            return Err(Error::Configuration("instance size catalog is empty".into()));
        }
        Ok(catalog)
    }

    /// Load a YAML ladder from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Add or replace a mapping
    pub fn insert(&mut self, provider: CloudProvider, from: impl Into<String>, to: impl Into<String>) {
        self.entries.insert((provider, from.into()), to.into());
    }

    /// Next larger size for `current`
    pub fn next_size(&self, provider: CloudProvider, current: &str) -> Result<&str> {
        self.entries
            .get(&(provider, current.to_string()))
            .map(String::as_str)
            .ok_or_else(|| Error::UnsupportedInstanceType {
                instance_type: current.to_string(),
            })
    }

    /// Number of mappings
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All mappings, ordered by provider then source size
    pub fn iter(&self) -> impl Iterator<Item = (CloudProvider, &str, &str)> {
        self.entries
            .iter()
            .map(|((provider, from), to)| (*provider, from.as_str(), to.as_str()))
    }
}
