// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::collections::{BTreeSet, HashMap};

use parking_lot::RwLock;

use super::*;

/// A [`ConnectorRegistry`] kept in memory. Connector names are case-insensitive.
#[derive(Default)]
pub struct MemoryConnectorRegistry {
    inner: RwLock<HashMap<String, Entry>>,
}

struct Entry {
    connector: ConnectorRef,
    enabled: bool,
}

impl MemoryConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an enabled connector.
    pub fn register(&self, connector: ConnectorRef) -> Result<(), ConnectorError> {
        self.register_with_state(connector, true)
    }

    pub fn register_with_state(
        &self,
        connector: ConnectorRef,
        enabled: bool,
    ) -> Result<(), ConnectorError> {
        let name = connector.name().to_lowercase();
        let mut inner = self.inner.write();
        if inner.contains_key(&name) {
            return Err(ConnectorError::Duplicated(name));
        }
        inner.insert(name, Entry { connector, enabled });
        Ok(())
    }

    pub fn remove(&self, name: &str) -> Result<ConnectorRef, ConnectorError> {
        self.inner
            .write()
            .remove(&name.to_lowercase())
            .map(|entry| entry.connector)
            .ok_or_else(|| ConnectorError::NotFound(name.into()))
    }

    /// Returns whether the connector is enabled, or `None` if there is no such connector.
    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.inner
            .read()
            .get(&name.to_lowercase())
            .map(|entry| entry.enabled)
    }

    /// Names of all connectors, enabled or not.
    pub fn all_names(&self) -> BTreeSet<String> {
        self.inner.read().keys().cloned().collect()
    }
}

impl ConnectorRegistry for MemoryConnectorRegistry {
    fn get(&self, name: &str) -> Option<ConnectorRef> {
        self.inner
            .read()
            .get(&name.to_lowercase())
            .filter(|entry| entry.enabled)
            .map(|entry| entry.connector.clone())
    }

    fn enabled_names(&self) -> BTreeSet<String> {
        self.inner
            .read()
            .iter()
            .filter(|(_, entry)| entry.enabled)
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), ConnectorError> {
        let mut inner = self.inner.write();
        let entry = inner
            .get_mut(&name.to_lowercase())
            .ok_or_else(|| ConnectorError::NotFound(name.into()))?;
        entry.enabled = enabled;
        Ok(())
    }
}
