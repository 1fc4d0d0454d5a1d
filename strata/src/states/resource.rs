//! Resource records

use super::ResourceInstance;
use crate::addrs::{self, AbsProviderConfig, InstanceKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a resource's instances are keyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EachMode {
    /// Single instance, no `count` or `for_each`
    #[default]
    NoEach,
    /// Integer keys from `count`
    List,
    /// String keys from `for_each`
    Map,
}

impl EachMode {
    /// Infers the each mode implied by one instance key
    pub fn for_instance_key(key: &InstanceKey) -> Self {
        match key {
            InstanceKey::NoKey => EachMode::NoEach,
            InstanceKey::Int(_) => EachMode::List,
            InstanceKey::Str(_) => EachMode::Map,
        }
    }
}

/// All recorded instances of one resource, with resource-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub addr: addrs::Resource,
    pub each_mode: EachMode,
    pub provider: AbsProviderConfig,
    #[serde(default)]
    pub instances: BTreeMap<InstanceKey, ResourceInstance>,
}

impl Resource {
    pub fn new(addr: addrs::Resource, each_mode: EachMode, provider: AbsProviderConfig) -> Self {
        Self {
            addr,
            each_mode,
            provider,
            instances: BTreeMap::new(),
        }
    }

    pub fn instance(&self, key: &InstanceKey) -> Option<&ResourceInstance> {
        self.instances.get(key)
    }

    pub fn instance_mut(&mut self, key: &InstanceKey) -> Option<&mut ResourceInstance> {
        self.instances.get_mut(key)
    }

    /// Returns the instance for `key`, creating an empty one if needed
    pub fn ensure_instance(&mut self, key: &InstanceKey) -> &mut ResourceInstance {
        self.instances.entry(key.clone()).or_default()
    }

    /// Returns true when a resource without instances should be dropped
    ///
    /// An empty list or map of instances is meaningful (`count = 0`), so
    /// only single-instance resources qualify.
    pub(crate) fn is_husk(&self) -> bool {
        self.instances.is_empty() && self.each_mode == EachMode::NoEach
    }
}
