//! Addresses for the objects tracked in state and plans.
//!
//! Addresses are plain values: they are cheap to clone, totally ordered so
//! that they can key ordered maps, and render to the familiar dotted form
//! (`module.network[0].aws_subnet.private["a"]`) through `Display`.
//!
//! Nothing in this module knows how an address was produced. The
//! configuration evaluator that builds them lives outside this crate.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::graph::Vertex;
use crate::states::StateError;

/// Identifies one instance among those produced by `count` or `for_each`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum InstanceKey {
    /// The resource has neither `count` nor `for_each`.
    #[default]
    NoKey,
    /// An index produced by `count`.
    Int(i64),
    /// A key produced by `for_each`.
    Str(String),
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceKey::NoKey => Ok(()),
            InstanceKey::Int(i) => write!(f, "[{}]", i),
            InstanceKey::Str(s) => {
                let quoted = serde_json::to_string(s).map_err(|_| fmt::Error)?;
                write!(f, "[{}]", quoted)
            }
        }
    }
}

impl FromStr for InstanceKey {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(InstanceKey::NoKey);
        }
        let inner = s
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| StateError::invalid_instance_key(s))?;
        if inner.starts_with('"') {
            serde_json::from_str::<String>(inner)
                .map(InstanceKey::Str)
                .map_err(|_| StateError::invalid_instance_key(s))
        } else {
            inner
                .parse::<i64>()
                .map(InstanceKey::Int)
                .map_err(|_| StateError::invalid_instance_key(s))
        }
    }
}

impl From<i64> for InstanceKey {
    fn from(i: i64) -> Self {
        InstanceKey::Int(i)
    }
}

impl From<&str> for InstanceKey {
    fn from(s: &str) -> Self {
        InstanceKey::Str(s.to_string())
    }
}

// Instance keys key JSON maps, so they travel in their rendered form.
impl Serialize for InstanceKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for InstanceKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// One step in a module path: a module call name plus its instance key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleInstanceStep {
    pub name: String,
    pub key: InstanceKey,
}

/// Path from the root module to a particular module instance.
///
/// The root module is the empty path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ModuleInstance(Vec<ModuleInstanceStep>);

impl ModuleInstance {
    /// The root module.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the address of a child module instance of this one.
    pub fn child(&self, name: impl Into<String>, key: InstanceKey) -> Self {
        let mut steps = self.0.clone();
        steps.push(ModuleInstanceStep {
            name: name.into(),
            key,
        });
        Self(steps)
    }
}

impl fmt::Display for ModuleInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "module.{}{}", step.name, step.key)?;
        }
        Ok(())
    }
}

/// Whether a resource is managed (created and destroyed) or only read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceMode {
    Managed,
    Data,
}

/// A resource block, relative to its module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Resource {
    pub mode: ResourceMode,
    pub type_name: String,
    pub name: String,
}

impl Resource {
    /// A managed resource address.
    pub fn managed(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            mode: ResourceMode::Managed,
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    /// A data resource address.
    pub fn data(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            mode: ResourceMode::Data,
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    pub fn instance(&self, key: InstanceKey) -> ResourceInstance {
        ResourceInstance {
            resource: self.clone(),
            key,
        }
    }

    pub fn absolute(&self, module: ModuleInstance) -> AbsResource {
        AbsResource {
            module,
            resource: self.clone(),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            ResourceMode::Managed => write!(f, "{}.{}", self.type_name, self.name),
            ResourceMode::Data => write!(f, "data.{}.{}", self.type_name, self.name),
        }
    }
}

/// One instance of a resource, relative to its module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceInstance {
    pub resource: Resource,
    pub key: InstanceKey,
}

impl ResourceInstance {
    pub fn absolute(&self, module: ModuleInstance) -> AbsResourceInstance {
        AbsResourceInstance {
            module,
            resource: self.clone(),
        }
    }
}

impl fmt::Display for ResourceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.resource, self.key)
    }
}

fn write_in_module(
    f: &mut fmt::Formatter<'_>,
    module: &ModuleInstance,
    rest: &dyn fmt::Display,
) -> fmt::Result {
    if module.is_root() {
        write!(f, "{}", rest)
    } else {
        write!(f, "{}.{}", module, rest)
    }
}

/// A resource within a particular module instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbsResource {
    pub module: ModuleInstance,
    pub resource: Resource,
}

impl AbsResource {
    pub fn instance(&self, key: InstanceKey) -> AbsResourceInstance {
        AbsResourceInstance {
            module: self.module.clone(),
            resource: self.resource.instance(key),
        }
    }
}

impl fmt::Display for AbsResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_in_module(f, &self.module, &self.resource)
    }
}

/// A fully qualified resource instance address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbsResourceInstance {
    pub module: ModuleInstance,
    pub resource: ResourceInstance,
}

impl AbsResourceInstance {
    /// Shorthand for a managed, single-instance resource in the root module.
    pub fn root_managed(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Resource::managed(type_name, name)
            .instance(InstanceKey::NoKey)
            .absolute(ModuleInstance::root())
    }

    pub fn containing_resource(&self) -> AbsResource {
        AbsResource {
            module: self.module.clone(),
            resource: self.resource.resource.clone(),
        }
    }
}

impl fmt::Display for AbsResourceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_in_module(f, &self.module, &self.resource)
    }
}

/// The provider configuration that manages a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct AbsProviderConfig {
    pub module: ModuleInstance,
    pub provider: String,
    pub alias: Option<String>,
}

impl AbsProviderConfig {
    /// The default (unaliased) configuration of `provider` in the root module.
    pub fn root(provider: impl Into<String>) -> Self {
        Self {
            module: ModuleInstance::root(),
            provider: provider.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

impl fmt::Display for AbsProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let local = match &self.alias {
            Some(alias) => format!("provider.{}.{}", self.provider, alias),
            None => format!("provider.{}", self.provider),
        };
        write_in_module(f, &self.module, &local)
    }
}

/// An output value of a particular module instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbsOutputValue {
    pub module: ModuleInstance,
    pub name: String,
}

impl AbsOutputValue {
    pub fn new(module: ModuleInstance, name: impl Into<String>) -> Self {
        Self {
            module,
            name: name.into(),
        }
    }
}

impl fmt::Display for AbsOutputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let local = format!("output.{}", self.name);
        write_in_module(f, &self.module, &local)
    }
}

impl Vertex for AbsResource {
    fn name(&self) -> String {
        self.to_string()
    }
}

impl Vertex for AbsResourceInstance {
    fn name(&self) -> String {
        self.to_string()
    }
}
