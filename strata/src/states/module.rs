//! Module state and the cleanup rules for resource records

use super::{DeposedKey, EachMode, Resource, ResourceInstance, ResourceInstanceObject};
use crate::addrs::{self, AbsOutputValue, AbsProviderConfig, ModuleInstance};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// A recorded output value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputValue {
    pub addr: AbsOutputValue,
    pub value: Value,
    #[serde(default)]
    pub sensitive: bool,
}

/// Everything recorded for one module instance
///
/// Resources are keyed by their module-relative address string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub addr: ModuleInstance,
    #[serde(default)]
    pub resources: BTreeMap<String, Resource>,
    #[serde(default)]
    pub output_values: BTreeMap<String, OutputValue>,
    #[serde(default)]
    pub local_values: BTreeMap<String, Value>,
}

impl Module {
    pub fn new(addr: ModuleInstance) -> Self {
        Self {
            addr,
            resources: BTreeMap::new(),
            output_values: BTreeMap::new(),
            local_values: BTreeMap::new(),
        }
    }

    pub fn resource(&self, addr: &addrs::Resource) -> Option<&Resource> {
        self.resources.get(&addr.to_string())
    }

    pub fn resource_instance(&self, addr: &addrs::ResourceInstance) -> Option<&ResourceInstance> {
        self.resource(&addr.resource)?.instance(&addr.key)
    }

    /// Updates the resource-wide settings, creating the record if needed
    pub fn set_resource_meta(
        &mut self,
        addr: &addrs::Resource,
        each_mode: EachMode,
        provider: AbsProviderConfig,
    ) -> &mut Resource {
        let resource = self
            .resources
            .entry(addr.to_string())
            .or_insert_with(|| Resource::new(addr.clone(), each_mode, provider.clone()));
        resource.each_mode = each_mode;
        resource.provider = provider;
        resource
    }

    /// Removes a resource with all of its instances
    pub fn remove_resource(&mut self, addr: &addrs::Resource) {
        if self.resources.remove(&addr.to_string()).is_some() {
            debug!("Removed resource {} from {}", addr, self.addr);
        }
    }

    /// Sets the current object of an instance
    ///
    /// With `Some`, missing resource and instance records are created and the
    /// provider is updated for the whole resource. A new instance also sets
    /// the resource's each mode from its key. With `None`, the current object
    /// is cleared and empty records are pruned; nothing is created.
    pub fn set_resource_instance_current(
        &mut self,
        addr: &addrs::ResourceInstance,
        obj: Option<ResourceInstanceObject>,
        provider: AbsProviderConfig,
    ) {
        let Some(obj) = obj else {
            let Some(instance) = self.resource_instance_mut(addr) else {
                return;
            };
            instance.current = None;
            self.prune_instance(addr);
            return;
        };

        let each_mode = match self.resource(&addr.resource) {
            Some(resource) if resource.instance(&addr.key).is_some() => resource.each_mode,
            _ => EachMode::for_instance_key(&addr.key),
        };
        self.set_resource_meta(&addr.resource, each_mode, provider)
            .ensure_instance(&addr.key)
            .current = Some(obj);
    }

    /// Sets or clears one deposed object of an instance
    ///
    /// Meant for objects whose key is already known, such as those reloaded
    /// from a saved state. Use [`Module::depose_resource_instance_object`] to
    /// depose the current object.
    pub fn set_resource_instance_deposed(
        &mut self,
        addr: &addrs::ResourceInstance,
        key: DeposedKey,
        obj: Option<ResourceInstanceObject>,
        provider: AbsProviderConfig,
    ) {
        match obj {
            Some(obj) => {
                self.set_resource_meta(&addr.resource, EachMode::for_instance_key(&addr.key), provider)
                    .ensure_instance(&addr.key)
                    .deposed
                    .insert(key, obj);
            }
            None => self.forget_resource_instance_deposed(addr, key),
        }
    }

    /// Forgets every object of an instance, if present
    pub fn forget_resource_instance_all(&mut self, addr: &addrs::ResourceInstance) {
        let Some(resource) = self.resource_mut(&addr.resource) else {
            return;
        };
        resource.instances.remove(&addr.key);
        self.prune_resource(&addr.resource);
    }

    /// Forgets one deposed object of an instance, if present
    pub fn forget_resource_instance_deposed(&mut self, addr: &addrs::ResourceInstance, key: DeposedKey) {
        let Some(instance) = self.resource_instance_mut(addr) else {
            return;
        };
        instance.deposed.remove(&key);
        self.prune_instance(addr);
    }

    /// Moves the current object of an instance into a deposed slot
    ///
    /// Returns the key used, or `None` if there was nothing to depose.
    pub fn depose_resource_instance_object(
        &mut self,
        addr: &addrs::ResourceInstance,
        force: Option<DeposedKey>,
    ) -> Option<DeposedKey> {
        self.resource_instance_mut(addr)?.depose_current_object(force)
    }

    /// Promotes a deposed object back to current
    ///
    /// Only happens when the instance has no current object and `key`
    /// names an existing deposed object. Returns whether it happened.
    pub fn maybe_restore_resource_instance_deposed(
        &mut self,
        addr: &addrs::ResourceInstance,
        key: DeposedKey,
    ) -> bool {
        let Some(instance) = self.resource_instance_mut(addr) else {
            return false;
        };
        if instance.current.is_some() {
            return false;
        }
        match instance.deposed.remove(&key) {
            Some(obj) => {
                instance.current = Some(obj);
                true
            }
            None => false,
        }
    }

    /// Writes an output value, overwriting any previous one
    pub fn set_output_value(&mut self, name: &str, value: Value, sensitive: bool) -> &OutputValue {
        let output = OutputValue {
            addr: AbsOutputValue::new(self.addr.clone(), name),
            value,
            sensitive,
        };
        self.output_values.insert(name.to_string(), output);
        &self.output_values[name]
    }

    pub fn remove_output_value(&mut self, name: &str) {
        self.output_values.remove(name);
    }

    pub fn set_local_value(&mut self, name: &str, value: Value) {
        self.local_values.insert(name.to_string(), value);
    }

    pub fn remove_local_value(&mut self, name: &str) {
        self.local_values.remove(name);
    }

    /// Removes every resource that has no instances, whatever its each mode
    ///
    /// Only safe once every `count`/`for_each` expression has been
    /// evaluated; otherwise a legitimately empty resource is lost.
    pub fn prune_resource_husks(&mut self) {
        self.resources.retain(|_, resource| !resource.instances.is_empty());
    }

    /// Returns true if removing this module would not change the state
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.output_values.is_empty() && self.local_values.is_empty()
    }

    fn resource_mut(&mut self, addr: &addrs::Resource) -> Option<&mut Resource> {
        self.resources.get_mut(&addr.to_string())
    }

    fn resource_instance_mut(&mut self, addr: &addrs::ResourceInstance) -> Option<&mut ResourceInstance> {
        self.resource_mut(&addr.resource)?.instance_mut(&addr.key)
    }

    /// Drops an instance left without objects, then its resource if that
    /// became a husk
    fn prune_instance(&mut self, addr: &addrs::ResourceInstance) {
        let Some(resource) = self.resource_mut(&addr.resource) else {
            return;
        };
        if resource.instance(&addr.key).is_some_and(|i| !i.has_objects()) {
            resource.instances.remove(&addr.key);
            debug!("Removed empty instance {} from {}", addr, self.addr);
        }
        self.prune_resource(&addr.resource);
    }

    fn prune_resource(&mut self, addr: &addrs::Resource) {
        if self.resource(addr).is_some_and(Resource::is_husk) {
            self.remove_resource(addr);
        }
    }
}
