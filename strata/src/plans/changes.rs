//! The ordered list of planned changes

use super::{OutputChange, ResourceInstanceChange};
use crate::addrs::{AbsOutputValue, AbsResourceInstance};
use crate::states::Generation;
use serde::{Deserialize, Serialize};

/// All changes planned so far, in the order they were recorded
///
/// Lookups return the most recently recorded match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changes {
    #[serde(default)]
    pub resources: Vec<ResourceInstanceChange>,
    #[serde(default)]
    pub outputs: Vec<OutputChange>,
}

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.outputs.is_empty()
    }

    pub fn resource_instance(
        &self,
        addr: &AbsResourceInstance,
        generation: Generation,
    ) -> Option<&ResourceInstanceChange> {
        self.resources
            .iter()
            .rev()
            .find(|c| c.addr == *addr && c.generation() == generation)
    }

    pub fn output_value(&self, addr: &AbsOutputValue) -> Option<&OutputChange> {
        self.outputs.iter().rev().find(|c| c.addr == *addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addrs::{AbsProviderConfig, ModuleInstance};
    use crate::plans::Action;
    use crate::states::DeposedKey;
    use serde_json::json;

    #[test]
    fn test_lookup_prefers_latest() {
        let addr = AbsResourceInstance::root_managed("aws_instance", "web");
        let provider = AbsProviderConfig::root("aws");
        let mut changes = Changes::new();
        changes
            .resources
            .push(ResourceInstanceChange::new(addr.clone(), Action::Create, provider.clone()));
        changes
            .resources
            .push(ResourceInstanceChange::new(addr.clone(), Action::Update, provider));

        let found = changes.resource_instance(&addr, Generation::Current).unwrap();
        assert_eq!(found.action, Action::Update);
    }

    #[test]
    fn test_lookup_matches_generation() {
        let addr = AbsResourceInstance::root_managed("aws_instance", "web");
        let key = DeposedKey::parse("00000001").unwrap();
        let mut changes = Changes::new();
        changes.resources.push(
            ResourceInstanceChange::new(addr.clone(), Action::Delete, AbsProviderConfig::root("aws"))
                .with_deposed_key(key),
        );

        assert!(changes.resource_instance(&addr, Generation::Current).is_none());
        assert!(changes
            .resource_instance(&addr, Generation::Deposed(key))
            .is_some());
    }

    #[test]
    fn test_output_lookup() {
        let addr = AbsOutputValue::new(ModuleInstance::root(), "ip");
        let mut changes = Changes::new();
        changes
            .outputs
            .push(OutputChange::new(addr.clone(), Action::Create, json!(null), json!("10.0.0.1")));

        assert_eq!(changes.output_value(&addr).unwrap().after, json!("10.0.0.1"));
        assert!(!changes.is_empty());
    }
}
