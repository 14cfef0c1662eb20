// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! Per-user aliases of namespaces and tables.
//!
//! There are two independent alias namespaces: namespace aliases map a short name
//! to a namespace path (`fast => dfs.tmp`), table aliases map a short name to a
//! table path (`t => dfs.tmp.orders`). The target is always a path string which
//! the resolver parses and walks.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::path::{ParsePathError, SchemaPath};

/// Source of alias definitions, queried by the resolver.
pub trait AliasRegistry: Send + Sync {
    /// Returns the namespace path `alias` stands for, as seen by `user`.
    fn namespace_alias(&self, user: &str, alias: &str) -> Option<String>;

    /// Returns the table path `alias` stands for, as seen by `user`.
    fn table_alias(&self, user: &str, alias: &str) -> Option<String>;
}

pub type AliasRegistryRef = Arc<dyn AliasRegistry>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasKind {
    Namespace,
    Table,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AliasError {
    #[error("duplicated {0:?} alias: {1}")]
    Duplicated(AliasKind, String),
    #[error("invalid alias target {0:?}: {1}")]
    InvalidTarget(String, #[source] ParsePathError),
}

/// Alias definitions of one kind: public aliases visible to everybody, plus
/// aliases owned by a single user. A user alias shadows a public one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasSet {
    pub public: HashMap<String, String>,
    pub users: HashMap<String, HashMap<String, String>>,
}

impl AliasSet {
    fn get(&self, user: &str, alias: &str) -> Option<&String> {
        self.users
            .get(user)
            .and_then(|aliases| aliases.get(alias))
            .or_else(|| self.public.get(alias))
    }

    fn user_aliases(&self, user: &str) -> HashMap<String, String> {
        let mut aliases = self.public.clone();
        if let Some(own) = self.users.get(user) {
            aliases.extend(own.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        aliases
    }
}

/// Both alias namespaces, as stored in a catalog definition file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasDefs {
    pub namespace: AliasSet,
    pub table: AliasSet,
}

/// An [`AliasRegistry`] kept in memory.
#[derive(Default)]
pub struct MemoryAliasRegistry {
    inner: RwLock<AliasDefs>,
}

impl MemoryAliasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry from existing definitions, validating every target.
    pub fn from_defs(defs: AliasDefs) -> Result<Self, AliasError> {
        for set in [&defs.namespace, &defs.table] {
            let targets = set
                .public
                .values()
                .chain(set.users.values().flat_map(|a| a.values()));
            for target in targets {
                validate_target(target)?;
            }
        }
        Ok(MemoryAliasRegistry {
            inner: RwLock::new(defs),
        })
    }

    pub fn add_user_alias(
        &self,
        kind: AliasKind,
        user: &str,
        alias: &str,
        target: &str,
    ) -> Result<(), AliasError> {
        validate_target(target)?;
        let mut inner = self.inner.write();
        let aliases = Self::set_mut(&mut inner, kind)
            .users
            .entry(user.into())
            .or_default();
        if aliases.contains_key(alias) {
            return Err(AliasError::Duplicated(kind, alias.into()));
        }
        aliases.insert(alias.into(), target.into());
        Ok(())
    }

    pub fn add_public_alias(
        &self,
        kind: AliasKind,
        alias: &str,
        target: &str,
    ) -> Result<(), AliasError> {
        validate_target(target)?;
        let mut inner = self.inner.write();
        let aliases = &mut Self::set_mut(&mut inner, kind).public;
        if aliases.contains_key(alias) {
            return Err(AliasError::Duplicated(kind, alias.into()));
        }
        aliases.insert(alias.into(), target.into());
        Ok(())
    }

    /// Returns true if the alias existed.
    pub fn remove_user_alias(&self, kind: AliasKind, user: &str, alias: &str) -> bool {
        let mut inner = self.inner.write();
        Self::set_mut(&mut inner, kind)
            .users
            .get_mut(user)
            .is_some_and(|aliases| aliases.remove(alias).is_some())
    }

    /// Returns true if the alias existed.
    pub fn remove_public_alias(&self, kind: AliasKind, alias: &str) -> bool {
        let mut inner = self.inner.write();
        Self::set_mut(&mut inner, kind)
            .public
            .remove(alias)
            .is_some()
    }

    /// All aliases of `kind` visible to `user`.
    pub fn user_aliases(&self, kind: AliasKind, user: &str) -> HashMap<String, String> {
        let inner = self.inner.read();
        Self::set(&inner, kind).user_aliases(user)
    }

    fn set(defs: &AliasDefs, kind: AliasKind) -> &AliasSet {
        match kind {
            AliasKind::Namespace => &defs.namespace,
            AliasKind::Table => &defs.table,
        }
    }

    fn set_mut(defs: &mut AliasDefs, kind: AliasKind) -> &mut AliasSet {
        match kind {
            AliasKind::Namespace => &mut defs.namespace,
            AliasKind::Table => &mut defs.table,
        }
    }
}

impl AliasRegistry for MemoryAliasRegistry {
    fn namespace_alias(&self, user: &str, alias: &str) -> Option<String> {
        self.inner.read().namespace.get(user, alias).cloned()
    }

    fn table_alias(&self, user: &str, alias: &str) -> Option<String> {
        self.inner.read().table.get(user, alias).cloned()
    }
}

fn validate_target(target: &str) -> Result<(), AliasError> {
    SchemaPath::parse(target)
        .map(|_| ())
        .map_err(|e| AliasError::InvalidTarget(target.into(), e))
}
