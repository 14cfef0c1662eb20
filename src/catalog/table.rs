// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TableType {
    Table,
    View,
}

/// A table or view provided by a connector. Opaque to the catalog.
pub trait Table: Debug + Send + Sync {
    fn table_type(&self) -> TableType;
}

pub type TableRef = Arc<dyn Table>;

/// A table as registered in a catalog node.
#[derive(Clone, Debug)]
pub struct TableEntry {
    name: String,
    table: TableRef,
    /// SQL text, if the entry was materialized from a view or an alias.
    definition: Option<String>,
}

impl TableEntry {
    pub fn new(name: impl Into<String>, table: TableRef) -> Self {
        TableEntry {
            name: name.into(),
            table,
            definition: None,
        }
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = Some(definition.into());
        self
    }

    /// The same table, addressed by another name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        TableEntry {
            name: name.into(),
            table: self.table.clone(),
            definition: self.definition.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    pub fn table_type(&self) -> TableType {
        self.table.table_type()
    }

    pub fn definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }

    /// Returns true if both entries refer to the same underlying table.
    pub fn same_table(&self, other: &TableEntry) -> bool {
        Arc::ptr_eq(&self.table, &other.table)
    }
}
