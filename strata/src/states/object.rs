//! Stored resource instance objects

use crate::addrs::AbsResource;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether an object can be trusted as-is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectStatus {
    #[default]
    Ready,
    /// Creation did not complete; the object must be replaced on the next
    /// apply
    Tainted,
}

/// One remote object as last recorded in state
///
/// `attrs` is the provider-defined attribute value, kept opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInstanceObject {
    pub attrs: Value,
    #[serde(default)]
    pub status: ObjectStatus,
    #[serde(default)]
    pub schema_version: u64,
    /// Provider-private bytes, passed back to the provider untouched
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub private: Vec<u8>,
    /// Resources that must be destroyed after this object
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<AbsResource>,
    #[serde(default)]
    pub create_before_destroy: bool,
}

impl ResourceInstanceObject {
    pub fn new(attrs: Value) -> Self {
        Self {
            attrs,
            status: ObjectStatus::Ready,
            schema_version: 0,
            private: Vec::new(),
            dependencies: Vec::new(),
            create_before_destroy: false,
        }
    }
}
