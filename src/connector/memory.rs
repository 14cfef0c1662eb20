// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::*;
use crate::catalog::{Table, TableEntry, TableType};

/// A declarative description of a schema and everything below it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaDef {
    pub schemas: BTreeMap<String, SchemaDef>,
    pub tables: BTreeMap<String, TableDef>,
    /// Registers the schema as an opaque node of this type instead of a regular one.
    pub opaque: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableDef {
    pub columns: Vec<String>,
    /// The SQL text if the table is a view.
    pub view: Option<String>,
}

/// A table described by a [`TableDef`].
#[derive(Debug, PartialEq, Eq)]
pub struct MemoryTable {
    columns: Vec<String>,
    table_type: TableType,
}

impl MemoryTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl Table for MemoryTable {
    fn table_type(&self) -> TableType {
        self.table_type
    }
}

/// A connector that registers a fixed [`SchemaDef`] under its own name.
///
/// It can be told to fail a number of registrations first, which is handy to
/// exercise retries.
pub struct MemoryConnector {
    name: String,
    schema: SchemaDef,
    failures_left: AtomicU32,
    failure: RegistrationError,
    attempts: AtomicU32,
}

impl MemoryConnector {
    pub fn new(name: impl Into<String>, schema: SchemaDef) -> Self {
        let name = name.into();
        MemoryConnector {
            failure: RegistrationErrorKind::Connection(format!("{name} is unreachable")).into(),
            name,
            schema,
            failures_left: AtomicU32::new(0),
            attempts: AtomicU32::new(0),
        }
    }

    /// Fails the first `times` registrations with `failure`.
    pub fn fail_times(mut self, times: u32, failure: impl Into<RegistrationError>) -> Self {
        self.failures_left = AtomicU32::new(times);
        self.failure = failure.into();
        self
    }

    /// Fails every registration with `failure`.
    pub fn always_fail(self, failure: impl Into<RegistrationError>) -> Self {
        self.fail_times(u32::MAX, failure)
    }

    /// Number of times `register_schemas` has been called.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::Relaxed)
    }

    fn register_def(schema: &mut SchemaMut<'_>, def: &SchemaDef) {
        for (name, table) in &def.tables {
            let memory_table = MemoryTable {
                columns: table.columns.clone(),
                table_type: match table.view {
                    Some(_) => TableType::View,
                    None => TableType::Table,
                },
            };
            let mut entry = TableEntry::new(name.clone(), Arc::new(memory_table));
            if let Some(sql) = &table.view {
                entry = entry.with_definition(sql.clone());
            }
            schema.add_table(entry);
        }
        for (name, sub) in &def.schemas {
            let mut child = match &sub.opaque {
                Some(type_name) => schema.add_opaque_schema(name, type_name),
                None => schema.add_schema(name),
            };
            Self::register_def(&mut child, sub);
        }
    }
}

impl Connector for MemoryConnector {
    fn name(&self) -> &str {
        &self.name
    }

    fn register_schemas(
        &self,
        _config: &SchemaConfig,
        root: &mut SchemaMut<'_>,
    ) -> Result<(), RegistrationError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        let failing = self
            .failures_left
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |left| {
                left.checked_sub(1)
            })
            .is_ok();
        if failing {
            return Err(self.failure.clone());
        }
        let mut schema = root.add_schema(&self.name);
        Self::register_def(&mut schema, &self.schema);
        Ok(())
    }
}
