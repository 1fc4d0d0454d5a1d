//! Resource instances and their object generations

use super::{ResourceInstanceObject, StateError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifies one deposed object of a resource instance
///
/// Rendered as 8 lowercase hexadecimal digits. Keys only need to be unique
/// within a single instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeposedKey(u32);

impl DeposedKey {
    /// Allocates a random key
    pub fn generate() -> Self {
        Self(Uuid::new_v4().as_u128() as u32)
    }

    /// Parses a key recorded outside this process
    pub fn parse(s: &str) -> Result<Self, StateError> {
        let valid = s.len() == 8
            && s
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !valid {
            return Err(StateError::invalid_deposed_key(s));
        }
        u32::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| StateError::invalid_deposed_key(s))
    }
}

impl fmt::Display for DeposedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl FromStr for DeposedKey {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DeposedKey {
    type Error = StateError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<DeposedKey> for String {
    fn from(key: DeposedKey) -> Self {
        key.to_string()
    }
}

/// Which object slot of a resource instance is meant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Generation {
    #[default]
    Current,
    Deposed(DeposedKey),
}

impl From<Option<DeposedKey>> for Generation {
    fn from(key: Option<DeposedKey>) -> Self {
        match key {
            Some(key) => Generation::Deposed(key),
            None => Generation::Current,
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Generation::Current => f.write_str("current object"),
            Generation::Deposed(key) => write!(f, "deposed object {}", key),
        }
    }
}

/// The objects recorded for one resource instance
///
/// `current` is the live object. `deposed` holds objects displaced by a
/// create-before-destroy replacement until they are destroyed or restored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceInstance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<ResourceInstanceObject>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub deposed: BTreeMap<DeposedKey, ResourceInstanceObject>,
}

impl ResourceInstance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_current(&self) -> bool {
        self.current.is_some()
    }

    pub fn has_deposed(&self) -> bool {
        !self.deposed.is_empty()
    }

    /// Returns false once the instance tracks nothing and can be dropped
    pub fn has_objects(&self) -> bool {
        self.has_current() || self.has_deposed()
    }

    pub fn object(&self, generation: Generation) -> Option<&ResourceInstanceObject> {
        match generation {
            Generation::Current => self.current.as_ref(),
            Generation::Deposed(key) => self.deposed.get(&key),
        }
    }

    pub fn deposed_keys(&self) -> impl Iterator<Item = DeposedKey> + '_ {
        self.deposed.keys().copied()
    }

    /// Moves the current object into a deposed slot
    ///
    /// Uses `force` as the key when given, otherwise allocates one unused by
    /// this instance. Returns `None` and changes nothing when there is no
    /// current object.
    ///
    /// # Panics
    ///
    /// Panics if `force` is already in use by another deposed object.
    pub(crate) fn depose_current_object(&mut self, force: Option<DeposedKey>) -> Option<DeposedKey> {
        if !self.has_current() {
            return None;
        }
        let key = match force {
            Some(key) => {
                assert!(
                    !self.deposed.contains_key(&key),
                    "deposed key {} already in use for this instance",
                    key
                );
                key
            }
            None => self.unused_deposed_key(),
        };
        let current = self.current.take()?;
        self.deposed.insert(key, current);
        Some(key)
    }

    fn unused_deposed_key(&self) -> DeposedKey {
        loop {
            let key = DeposedKey::generate();
            if !self.deposed.contains_key(&key) {
                return key;
            }
        }
    }
}
