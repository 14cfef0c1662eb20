// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::collections::BTreeSet;

use super::*;
use crate::connector::ConnectorRegistryRef;

/// The root schema.
///
/// Its sub-schemas are the enabled connectors. The list is asked from the
/// registry on every call, never cached, so it may differ from what the tree
/// has already loaded.
pub struct RootSchema {
    connectors: ConnectorRegistryRef,
}

impl RootSchema {
    pub fn new(connectors: ConnectorRegistryRef) -> Self {
        RootSchema { connectors }
    }

    /// Names of the currently enabled connectors.
    pub fn sub_schema_names(&self) -> BTreeSet<String> {
        self.connectors.enabled_names()
    }

    pub fn type_name(&self) -> &'static str {
        ROOT_SCHEMA_NAME
    }

    /// The root is never listed as a schema of its own.
    pub fn show_in_information_schema(&self) -> bool {
        false
    }

    pub fn connectors(&self) -> &ConnectorRegistryRef {
        &self.connectors
    }
}
