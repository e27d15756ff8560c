//! Registry Module
//!
//! Directory of named groups. Build one at startup, create groups on it,
//! then share it (usually behind an `Arc`) with everything that needs to
//! resolve a group by name, such as the peer protocol handler.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::error::{CacheError, Result};
use crate::group::{Getter, Group};

// == Registry ==
/// Name to [`Group`] directory.
///
/// Creation takes the write lock and is expected to be rare. Lookups share
/// the read lock.
#[derive(Debug, Default)]
pub struct Registry {
    groups: RwLock<HashMap<String, Group>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // == Create ==
    /// Creates a group and registers it under `name`.
    ///
    /// A group already registered under the same name is replaced. Callers
    /// holding the old handle keep using the old group; new lookups see the
    /// new one.
    ///
    /// # Errors
    /// [`CacheError::InvalidArgument`] if `name` is empty or contains `/`,
    /// since such a group could not be addressed over the peer protocol.
    pub fn create(
        &self,
        name: impl Into<String>,
        cache_bytes: usize,
        getter: Arc<dyn Getter>,
    ) -> Result<Group> {
        let name = name.into();
        if name.is_empty() {
            return Err(CacheError::InvalidArgument(
                "group name is required".to_string(),
            ));
        }
        if name.contains('/') {
            return Err(CacheError::InvalidArgument(format!(
                "group name '{}' must not contain '/'",
                name
            )));
        }

        let group = Group::new(name.clone(), cache_bytes, getter);
        let mut groups = self.groups.write();
        if groups.insert(name.clone(), group.clone()).is_some() {
            warn!("Replaced existing group '{}'", name);
        } else {
            info!("Created group '{}' with {} cache bytes", name, cache_bytes);
        }
        Ok(group)
    }

    // == Lookup ==
    /// Returns the group registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<Group> {
        self.groups.read().get(name).cloned()
    }

    /// Registered group names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.groups.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.read().is_empty()
    }
}
