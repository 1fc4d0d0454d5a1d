//! Planned change records

use crate::addrs::{AbsOutputValue, AbsProviderConfig, AbsResourceInstance};
use crate::states::{DeposedKey, Generation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// What a change does to its object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Action {
    #[default]
    NoOp,
    Create,
    Read,
    Update,
    DeleteThenCreate,
    CreateThenDelete,
    Delete,
}

impl Action {
    /// Returns true for both replacement orderings
    pub fn is_replace(&self) -> bool {
        matches!(self, Action::DeleteThenCreate | Action::CreateThenDelete)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::NoOp => "no-op",
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::DeleteThenCreate => "replace (delete then create)",
            Action::CreateThenDelete => "replace (create then delete)",
            Action::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// A planned action against one object of a resource instance
///
/// `deposed_key` selects a deposed object; `None` targets the current one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInstanceChange {
    pub addr: AbsResourceInstance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposed_key: Option<DeposedKey>,
    pub provider_addr: AbsProviderConfig,
    pub action: Action,
    pub before: Value,
    pub after: Value,
    /// Attribute paths whose change forces a replacement
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_replace: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub private: Vec<u8>,
}

impl ResourceInstanceChange {
    pub fn new(addr: AbsResourceInstance, action: Action, provider_addr: AbsProviderConfig) -> Self {
        Self {
            addr,
            deposed_key: None,
            provider_addr,
            action,
            before: Value::Null,
            after: Value::Null,
            required_replace: Vec::new(),
            private: Vec::new(),
        }
    }

    pub fn with_deposed_key(mut self, key: DeposedKey) -> Self {
        self.deposed_key = Some(key);
        self
    }

    pub fn with_values(mut self, before: Value, after: Value) -> Self {
        self.before = before;
        self.after = after;
        self
    }

    pub fn generation(&self) -> Generation {
        self.deposed_key.into()
    }
}

/// A planned change to an output value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputChange {
    pub addr: AbsOutputValue,
    pub action: Action,
    pub before: Value,
    pub after: Value,
    #[serde(default)]
    pub sensitive: bool,
}

impl OutputChange {
    pub fn new(addr: AbsOutputValue, action: Action, before: Value, after: Value) -> Self {
        Self {
            addr,
            action,
            before,
            after,
            sensitive: false,
        }
    }
}
