// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! Catalog definition files.
//!
//! A definition file describes in-memory connectors, aliases and the session
//! options in JSON:
//!
//! ```json
//! {
//!   "config": { "user": "alice", "store.plugin.retry_attempts": 2 },
//!   "connectors": {
//!     "dfs": { "schemas": { "tmp": { "tables": { "orders": { "columns": ["id"] } } } } },
//!     "flaky": { "fail_times": 1 },
//!     "old": { "enabled": false }
//!   },
//!   "aliases": {
//!     "namespace": { "public": { "fast": "dfs.tmp" } },
//!     "table": { "users": { "alice": { "t": "dfs.tmp.orders" } } }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::alias::{AliasDefs, AliasError, MemoryAliasRegistry};
use crate::catalog::CatalogResolver;
use crate::config::SchemaConfig;
use crate::connector::{
    ConnectorError, MemoryConnector, MemoryConnectorRegistry, RegistrationErrorKind, SchemaDef,
};

#[derive(thiserror::Error, Debug)]
pub enum DefError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON decode error: {0}")]
    JsonDecode(#[from] serde_json::Error),
    #[error("alias error: {0}")]
    Alias(#[from] AliasError),
    #[error("connector error: {0}")]
    Connector(#[from] ConnectorError),
}

/// A connector of a definition file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorDef {
    pub enabled: bool,
    /// Number of registrations to fail before succeeding.
    pub fail_times: u32,
    /// Message of the simulated failures.
    pub failure: Option<String>,
    #[serde(flatten)]
    pub schema: SchemaDef,
}

impl Default for ConnectorDef {
    fn default() -> Self {
        ConnectorDef {
            enabled: true,
            fail_times: 0,
            failure: None,
            schema: SchemaDef::default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogDef {
    pub config: SchemaConfig,
    pub connectors: BTreeMap<String, ConnectorDef>,
    pub aliases: AliasDefs,
}

impl CatalogDef {
    pub fn from_json(json: &str) -> Result<Self, DefError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DefError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Creates the registries described by this definition.
    pub fn build(&self) -> Result<Catalog, DefError> {
        let connectors = MemoryConnectorRegistry::new();
        for (name, def) in &self.connectors {
            let mut connector = MemoryConnector::new(name.clone(), def.schema.clone());
            if def.fail_times > 0 {
                let message = def
                    .failure
                    .clone()
                    .unwrap_or_else(|| format!("{name} is unreachable"));
                connector = connector
                    .fail_times(def.fail_times, RegistrationErrorKind::Connection(message));
            }
            connectors.register_with_state(Arc::new(connector), def.enabled)?;
        }
        Ok(Catalog {
            config: self.config.clone(),
            connectors: Arc::new(connectors),
            aliases: Arc::new(MemoryAliasRegistry::from_defs(self.aliases.clone())?),
        })
    }
}

/// The process-wide registries of a catalog, from which per-session resolvers
/// are created.
pub struct Catalog {
    pub config: SchemaConfig,
    pub connectors: Arc<MemoryConnectorRegistry>,
    pub aliases: Arc<MemoryAliasRegistry>,
}

impl Catalog {
    /// Creates a resolver for a new session with the catalog's options.
    pub fn resolver(&self) -> CatalogResolver {
        self.resolver_with(self.config.clone())
    }

    pub fn resolver_with(&self, config: SchemaConfig) -> CatalogResolver {
        CatalogResolver::new(self.connectors.clone(), self.aliases.clone(), config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasRegistry;
    use crate::connector::ConnectorRegistry;

    #[test]
    fn test_build() {
        let def = CatalogDef::from_json(
            r#"{
                "config": { "user": "alice" },
                "connectors": {
                    "dfs": { "schemas": { "tmp": {} } },
                    "old": { "enabled": false },
                    "flaky": { "fail_times": 2, "failure": "no route" }
                },
                "aliases": { "namespace": { "public": { "fast": "dfs.tmp" } } }
            }"#,
        )
        .unwrap();
        assert!(def.connectors["dfs"].enabled);
        assert_eq!(def.connectors["flaky"].fail_times, 2);

        let catalog = def.build().unwrap();
        assert_eq!(catalog.config.user, "alice");
        assert_eq!(catalog.connectors.enabled_names().len(), 2);
        assert_eq!(catalog.connectors.is_enabled("old"), Some(false));
        assert_eq!(
            catalog.aliases.namespace_alias("bob", "fast").as_deref(),
            Some("dfs.tmp")
        );
        assert_eq!(catalog.resolver().config().user, "alice");
    }

    #[test]
    fn test_bad_alias_rejected() {
        let def = CatalogDef::from_json(r#"{ "aliases": { "table": { "public": { "t": "a..b" } } } }"#)
            .unwrap();
        assert!(matches!(def.build(), Err(DefError::Alias(_))));
        assert!(matches!(
            CatalogDef::from_json("{ not json"),
            Err(DefError::JsonDecode(_))
        ));
    }
}
