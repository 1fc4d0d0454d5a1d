//! The whole state tree

use super::{Module, Resource, ResourceInstance};
use crate::addrs::{AbsResource, AbsResourceInstance, ModuleInstance};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Every module instance tracked by a single state
///
/// Modules are keyed by their rendered address; the root module is keyed by
/// the empty string and is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub modules: BTreeMap<String, Module>,
}

impl State {
    pub fn new() -> Self {
        let root = ModuleInstance::root();
        let mut modules = BTreeMap::new();
        modules.insert(root.to_string(), Module::new(root));
        Self { modules }
    }

    pub fn module(&self, addr: &ModuleInstance) -> Option<&Module> {
        self.modules.get(&addr.to_string())
    }

    pub fn module_mut(&mut self, addr: &ModuleInstance) -> Option<&mut Module> {
        self.modules.get_mut(&addr.to_string())
    }

    /// Returns the module for `addr`, creating an empty one if needed
    pub fn ensure_module(&mut self, addr: &ModuleInstance) -> &mut Module {
        self.modules
            .entry(addr.to_string())
            .or_insert_with(|| Module::new(addr.clone()))
    }

    /// Removes a module and everything it contains
    ///
    /// # Panics
    ///
    /// Panics if `addr` is the root module.
    pub fn remove_module(&mut self, addr: &ModuleInstance) {
        assert!(!addr.is_root(), "cannot remove the root module");
        if self.modules.remove(&addr.to_string()).is_some() {
            debug!("Removed module {}", addr);
        }
    }

    pub fn resource(&self, addr: &AbsResource) -> Option<&Resource> {
        self.module(&addr.module)?.resource(&addr.resource)
    }

    pub fn resource_instance(&self, addr: &AbsResourceInstance) -> Option<&ResourceInstance> {
        self.module(&addr.module)?.resource_instance(&addr.resource)
    }

    /// Returns true if the state tracks no resources or outputs
    ///
    /// Local values are transient and don't count.
    pub fn is_empty(&self) -> bool {
        self.modules
            .values()
            .all(|m| m.resources.is_empty() && m.output_values.is_empty())
    }

    /// Returns the address of every tracked resource instance, ordered by
    /// module then resource
    pub fn all_resource_instance_addrs(&self) -> Vec<AbsResourceInstance> {
        self.modules
            .values()
            .flat_map(|module| {
                module.resources.values().flat_map(move |resource| {
                    resource.instances.keys().map(move |key| {
                        resource
                            .addr
                            .instance(key.clone())
                            .absolute(module.addr.clone())
                    })
                })
            })
            .collect()
    }

    /// Removes resources without instances from every module
    ///
    /// See [`Module::prune_resource_husks`] for when this is safe.
    pub fn prune_resource_husks(&mut self) {
        for module in self.modules.values_mut() {
            module.prune_resource_husks();
        }
        self.prune_empty_modules();
    }

    /// Removes the module at `addr` if it is empty and not the root
    pub(crate) fn maybe_prune_module(&mut self, addr: &ModuleInstance) {
        if addr.is_root() {
            return;
        }
        let key = addr.to_string();
        if self.modules.get(&key).is_some_and(Module::is_empty) {
            self.modules.remove(&key);
            debug!("Pruned empty module {}", addr);
        }
    }

    pub(crate) fn prune_empty_modules(&mut self) {
        self.modules
            .retain(|key, module| key.is_empty() || !module.is_empty());
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}
