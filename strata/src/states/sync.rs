//! Lock-guarded access to a [`State`] shared by concurrent walk callbacks

use super::{DeposedKey, Generation, Module, OutputValue, Resource, ResourceInstance, ResourceInstanceObject, State};
use crate::addrs::{AbsOutputValue, AbsProviderConfig, AbsResource, AbsResourceInstance, ModuleInstance};
use serde_json::Value;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard};

/// A [`State`] behind a single coarse lock
///
/// Every operation holds the lock only for its own duration. Reads return
/// deep copies and writes take ownership of the values passed in, so no
/// caller ever shares an object with the store. Non-root modules left empty
/// by a write are pruned before the lock is released.
#[derive(Debug, Default)]
pub struct SyncState {
    state: Mutex<State>,
}

impl SyncState {
    pub fn new(state: State) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    fn guard(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .expect("State Mutex poisoned - unrecoverable state")
    }

    /// Runs `f` against the module at `addr`, then prunes it if empty
    ///
    /// When the module doesn't exist it is created only if `create` is set;
    /// otherwise `f` is not called and `None` is returned.
    fn with_module<R>(&self, addr: &ModuleInstance, create: bool, f: impl FnOnce(&mut Module) -> R) -> Option<R> {
        let mut state = self.guard();
        let module = if create {
            Some(state.ensure_module(addr))
        } else {
            state.module_mut(addr)
        };
        let result = module.map(f);
        state.maybe_prune_module(addr);
        result
    }

    pub fn module(&self, addr: &ModuleInstance) -> Option<Module> {
        self.guard().module(addr).cloned()
    }

    pub fn resource(&self, addr: &AbsResource) -> Option<Resource> {
        self.guard().resource(addr).cloned()
    }

    pub fn resource_instance(&self, addr: &AbsResourceInstance) -> Option<ResourceInstance> {
        self.guard().resource_instance(addr).cloned()
    }

    pub fn resource_instance_object(
        &self,
        addr: &AbsResourceInstance,
        generation: Generation,
    ) -> Option<ResourceInstanceObject> {
        self.guard()
            .resource_instance(addr)?
            .object(generation)
            .cloned()
    }

    pub fn output_value(&self, addr: &AbsOutputValue) -> Option<OutputValue> {
        self.guard()
            .module(&addr.module)?
            .output_values
            .get(&addr.name)
            .cloned()
    }

    pub fn local_value(&self, module: &ModuleInstance, name: &str) -> Option<Value> {
        self.guard().module(module)?.local_values.get(name).cloned()
    }

    /// Sets or clears the current object of a resource instance
    ///
    /// Clearing the only object removes the instance, then the resource if
    /// it has no each mode, then the module if nothing else remains.
    pub fn set_resource_instance_current(
        &self,
        addr: &AbsResourceInstance,
        obj: Option<ResourceInstanceObject>,
        provider: AbsProviderConfig,
    ) {
        let create = obj.is_some();
        self.with_module(&addr.module, create, |module| {
            module.set_resource_instance_current(&addr.resource, obj, provider)
        });
    }

    /// Sets or clears a deposed object whose key is already known
    pub fn set_resource_instance_deposed(
        &self,
        addr: &AbsResourceInstance,
        key: DeposedKey,
        obj: Option<ResourceInstanceObject>,
        provider: AbsProviderConfig,
    ) {
        let create = obj.is_some();
        self.with_module(&addr.module, create, |module| {
            module.set_resource_instance_deposed(&addr.resource, key, obj, provider)
        });
    }

    /// Moves the current object into a freshly allocated deposed slot
    ///
    /// Returns the new key, or `None` if there was no current object.
    pub fn depose_resource_instance_object(&self, addr: &AbsResourceInstance) -> Option<DeposedKey> {
        self.with_module(&addr.module, false, |module| {
            module.depose_resource_instance_object(&addr.resource, None)
        })
        .flatten()
    }

    /// Like [`SyncState::depose_resource_instance_object`] but with a
    /// caller-chosen key
    ///
    /// # Panics
    ///
    /// Panics if `key` is already used by another deposed object of the
    /// instance.
    pub fn depose_resource_instance_object_force(&self, addr: &AbsResourceInstance, key: DeposedKey) {
        self.with_module(&addr.module, false, |module| {
            module.depose_resource_instance_object(&addr.resource, Some(key))
        });
    }

    /// Promotes a deposed object back to current if there is no current
    /// object. Returns whether the restore happened.
    pub fn maybe_restore_resource_instance_deposed(&self, addr: &AbsResourceInstance, key: DeposedKey) -> bool {
        self.with_module(&addr.module, false, |module| {
            module.maybe_restore_resource_instance_deposed(&addr.resource, key)
        })
        .unwrap_or(false)
    }

    pub fn forget_resource_instance_all(&self, addr: &AbsResourceInstance) {
        self.with_module(&addr.module, false, |module| {
            module.forget_resource_instance_all(&addr.resource)
        });
    }

    pub fn forget_resource_instance_deposed(&self, addr: &AbsResourceInstance, key: DeposedKey) {
        self.with_module(&addr.module, false, |module| {
            module.forget_resource_instance_deposed(&addr.resource, key)
        });
    }

    pub fn set_output_value(&self, addr: &AbsOutputValue, value: Value, sensitive: bool) {
        self.with_module(&addr.module, true, |module| {
            module.set_output_value(&addr.name, value, sensitive);
        });
    }

    pub fn remove_output_value(&self, addr: &AbsOutputValue) {
        self.with_module(&addr.module, false, |module| module.remove_output_value(&addr.name));
    }

    pub fn set_local_value(&self, module: &ModuleInstance, name: &str, value: Value) {
        self.with_module(module, true, |m| m.set_local_value(name, value));
    }

    pub fn remove_local_value(&self, module: &ModuleInstance, name: &str) {
        self.with_module(module, false, |m| m.remove_local_value(name));
    }

    /// Removes a non-root module with everything in it
    ///
    /// # Panics
    ///
    /// Panics if `addr` is the root module.
    pub fn remove_module(&self, addr: &ModuleInstance) {
        self.guard().remove_module(addr);
    }

    /// Takes the lock for a batch of changes made directly on the tree
    ///
    /// Empty non-root modules are pruned when the guard is dropped. Keep
    /// the guard out of any `.await`.
    pub fn lock(&self) -> StateGuard<'_> {
        StateGuard(self.guard())
    }

    /// Returns a deep copy of the whole state
    pub fn snapshot(&self) -> State {
        self.guard().clone()
    }

    pub fn into_state(self) -> State {
        self.state
            .into_inner()
            .expect("State Mutex poisoned - unrecoverable state")
    }
}

impl From<State> for SyncState {
    fn from(state: State) -> Self {
        Self::new(state)
    }
}

/// Exclusive access to the state held by a [`SyncState`]
pub struct StateGuard<'a>(MutexGuard<'a, State>);

impl Deref for StateGuard<'_> {
    type Target = State;

    fn deref(&self) -> &State {
        &self.0
    }
}

impl DerefMut for StateGuard<'_> {
    fn deref_mut(&mut self) -> &mut State {
        &mut self.0
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        self.0.prune_empty_modules();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addrs::{self, InstanceKey};
    use serde_json::json;

    fn web() -> AbsResourceInstance {
        AbsResourceInstance::root_managed("aws_instance", "web")
    }

    fn aws() -> AbsProviderConfig {
        AbsProviderConfig::root("aws")
    }

    fn object(id: &str) -> Option<ResourceInstanceObject> {
        Some(ResourceInstanceObject::new(json!({ "id": id })))
    }

    #[test]
    fn test_reads_are_copies() {
        let state = SyncState::default();
        state.set_resource_instance_current(&web(), object("i-1"), aws());

        let mut copy = state
            .resource_instance_object(&web(), Generation::Current)
            .unwrap();
        copy.attrs = json!({"id": "changed"});

        let stored = state
            .resource_instance_object(&web(), Generation::Current)
            .unwrap();
        assert_eq!(stored.attrs, json!({"id": "i-1"}));
    }

    #[test]
    fn test_clearing_prunes_child_module() {
        let state = SyncState::default();
        let child = ModuleInstance::root().child("app", InstanceKey::NoKey);
        let addr = addrs::Resource::managed("aws_instance", "web")
            .instance(InstanceKey::NoKey)
            .absolute(child.clone());

        state.set_resource_instance_current(&addr, object("i-1"), aws());
        assert!(state.module(&child).is_some());

        state.set_resource_instance_current(&addr, None, aws());
        assert!(state.resource(&addr.containing_resource()).is_none());
        assert!(state.module(&child).is_none());
        assert!(state.module(&ModuleInstance::root()).is_some());
    }

    #[test]
    fn test_clearing_missing_instance_creates_nothing() {
        let state = SyncState::default();
        let child = ModuleInstance::root().child("app", InstanceKey::NoKey);
        let addr = addrs::Resource::managed("aws_instance", "web")
            .instance(InstanceKey::NoKey)
            .absolute(child.clone());

        state.set_resource_instance_current(&addr, None, aws());
        state.set_resource_instance_deposed(&addr, DeposedKey::generate(), None, aws());

        assert!(state.module(&child).is_none());
    }

    #[test]
    fn test_depose_and_restore() {
        let state = SyncState::default();
        assert_eq!(state.depose_resource_instance_object(&web()), None);

        state.set_resource_instance_current(&web(), object("old"), aws());
        let key = state.depose_resource_instance_object(&web()).unwrap();
        assert!(state
            .resource_instance_object(&web(), Generation::Current)
            .is_none());

        assert!(state.maybe_restore_resource_instance_deposed(&web(), key));
        let restored = state
            .resource_instance_object(&web(), Generation::Current)
            .unwrap();
        assert_eq!(restored.attrs, json!({"id": "old"}));
        assert!(state
            .resource_instance_object(&web(), Generation::Deposed(key))
            .is_none());
    }

    #[test]
    fn test_forced_depose_key() {
        let state = SyncState::default();
        let key = DeposedKey::parse("deadbeef").unwrap();
        state.set_resource_instance_current(&web(), object("old"), aws());

        state.depose_resource_instance_object_force(&web(), key);

        let instance = state.resource_instance(&web()).unwrap();
        assert_eq!(instance.deposed_keys().collect::<Vec<_>>(), vec![key]);
    }

    #[test]
    fn test_forget_all() {
        let state = SyncState::default();
        state.set_resource_instance_current(&web(), object("new"), aws());
        state.depose_resource_instance_object(&web()).unwrap();
        state.set_resource_instance_current(&web(), object("newer"), aws());

        state.forget_resource_instance_all(&web());

        assert!(state.snapshot().is_empty());
    }

    #[test]
    fn test_outputs_and_locals() {
        let state = SyncState::default();
        let child = ModuleInstance::root().child("net", InstanceKey::NoKey);
        let output = AbsOutputValue::new(child.clone(), "vpc_id");

        state.set_output_value(&output, json!("vpc-1"), true);
        state.set_local_value(&child, "cidr", json!("10.0.0.0/16"));

        let stored = state.output_value(&output).unwrap();
        assert_eq!(stored.value, json!("vpc-1"));
        assert!(stored.sensitive);
        assert_eq!(state.local_value(&child, "cidr"), Some(json!("10.0.0.0/16")));

        state.remove_output_value(&output);
        assert!(state.module(&child).is_some());
        state.remove_local_value(&child, "cidr");
        assert!(state.module(&child).is_none());
    }

    #[test]
    fn test_lock_guard_prunes_on_drop() {
        let state = SyncState::default();
        let child = ModuleInstance::root().child("batch", InstanceKey::NoKey);
        {
            let mut guard = state.lock();
            guard.ensure_module(&child);
            assert!(guard.module(&child).is_some());
        }
        assert!(state.module(&child).is_none());
    }

    #[test]
    fn test_into_state() {
        let state = SyncState::from(State::new());
        state.set_resource_instance_current(&web(), object("i-1"), aws());

        let state = state.into_state();
        assert_eq!(state.all_resource_instance_addrs(), vec![web()]);
    }
}
