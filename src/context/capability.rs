use crate::core::{Result, UpgradeError};
use crate::persistence::PersistenceContext;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Key under which a persistence capability is registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapabilityTag(Cow<'static, str>);

impl CapabilityTag {
    /// The primary database of an upgrade run
    pub const DATABASE: CapabilityTag = CapabilityTag(Cow::Borrowed("database"));

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CapabilityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CapabilityTag {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Persistence capabilities of one run, fixed once the context is built.
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    entries: HashMap<CapabilityTag, Arc<dyn PersistenceContext>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a capability, replacing any previous one under the same tag.
    pub fn register(&mut self, tag: CapabilityTag, capability: Arc<dyn PersistenceContext>) {
        self.entries.insert(tag, capability);
    }

    pub fn get(&self, tag: &CapabilityTag) -> Result<Arc<dyn PersistenceContext>> {
        self.entries
            .get(tag)
            .cloned()
            .ok_or_else(|| UpgradeError::MissingCapability(tag.clone()))
    }

    pub fn contains(&self, tag: &CapabilityTag) -> bool {
        self.entries.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}
