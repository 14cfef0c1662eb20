// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, error, warn};

use super::*;
use crate::alias::{AliasKind, AliasRegistryRef};
use crate::config::{SchemaConfig, AUTO_DISABLE_OPTION};
use crate::connector::{ConnectorRef, ConnectorRegistryRef};
use crate::path::{schema_path_as_list, SchemaPath};

type Result<T> = std::result::Result<T, CatalogError>;

/// Resolves names against a catalog tree whose top-level schemas are loaded
/// from connectors on first access.
///
/// A resolver belongs to one session. Nodes it loads are cached for its whole
/// lifetime and never evicted, even if their connector gets disabled later.
pub struct CatalogResolver {
    tree: CatalogTree,
    root: RootSchema,
    aliases: AliasRegistryRef,
    config: SchemaConfig,
    sleeper: SleeperRef,
}

impl CatalogResolver {
    pub fn new(
        connectors: ConnectorRegistryRef,
        aliases: AliasRegistryRef,
        config: SchemaConfig,
    ) -> Self {
        CatalogResolver {
            tree: CatalogTree::new(),
            root: RootSchema::new(connectors),
            aliases,
            config,
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// Replaces how the resolver waits between registration attempts.
    pub fn with_sleeper(mut self, sleeper: SleeperRef) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    pub fn tree(&self) -> &CatalogTree {
        &self.tree
    }

    pub fn root(&self) -> &RootSchema {
        &self.root
    }

    /// Names of the root's sub-schemas, i.e. the currently enabled connectors.
    pub fn list_child_names(&self) -> BTreeSet<String> {
        self.root.sub_schema_names()
    }

    /// Resolves a sub-schema of the root, loading its connector if needed.
    ///
    /// A namespace alias of the acting user is followed first. Schema names are
    /// matched ignoring case whatever `case_sensitive` says; the flag only
    /// matters for tables.
    pub fn resolve_child(&mut self, name: &str, case_sensitive: bool) -> Result<Option<NodeId>> {
        debug!("resolving schema {} (case sensitive: {})", name, case_sensitive);
        let Some(target) = self.aliases.namespace_alias(&self.config.user, name) else {
            return self.get_schema(name);
        };
        let path = SchemaPath::parse(&target).map_err(|source| CatalogError::InvalidAlias {
            kind: AliasKind::Namespace,
            alias: name.into(),
            target: target.clone(),
            source,
        })?;
        debug!("schema alias {} resolved to {}", name, path);
        let Some(mut id) = self.get_schema(path.root_segment())? else {
            return Ok(None);
        };
        for segment in &path.segments()[1..] {
            match self.tree.child(id, segment) {
                Some(child) => id = child,
                None => return Ok(None),
            }
        }
        Ok(Some(id))
    }

    /// Resolves a sub-schema of `parent`. Only the root loads connectors;
    /// below it, schemas are looked up in the cache.
    pub fn resolve_child_of(
        &mut self,
        parent: NodeId,
        name: &str,
        case_sensitive: bool,
    ) -> Result<Option<NodeId>> {
        if parent == NodeId::ROOT {
            return self.resolve_child(name, case_sensitive);
        }
        Ok(self.tree.child(parent, name))
    }

    /// Resolves a dotted schema path such as `dfs.tmp` from the root.
    pub fn resolve_path(&mut self, path: &SchemaPath, case_sensitive: bool) -> Result<Option<NodeId>> {
        let mut current = NodeId::ROOT;
        for segment in path.segments() {
            match self.resolve_child_of(current, segment, case_sensitive)? {
                Some(id) => current = id,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Resolves a table alias of the acting user to the table it points to.
    ///
    /// Returns `Ok(None)` if there is no such alias, or if any part of the
    /// aliased path does not exist.
    pub fn resolve_temporary_table(
        &mut self,
        table_name: &str,
        case_sensitive: bool,
    ) -> Result<Option<TableEntry>> {
        let Some(target) = self.aliases.table_alias(&self.config.user, table_name) else {
            return Ok(None);
        };
        let path = SchemaPath::parse(&target).map_err(|source| CatalogError::InvalidAlias {
            kind: AliasKind::Table,
            alias: table_name.into(),
            target: target.clone(),
            source,
        })?;
        debug!("table alias {} resolved to {}", table_name, path);
        let mut current = NodeId::ROOT;
        for segment in path.parent_segments() {
            match self.resolve_child_of(current, segment, case_sensitive)? {
                Some(id) => current = id,
                None => return Ok(None),
            }
        }
        Ok(self
            .tree
            .table(current, path.last_segment(), case_sensitive)
            .cloned())
    }

    /// Resolves a table directly under the root.
    ///
    /// Table aliases come first; the entry found through an alias is returned
    /// under the alias name. Otherwise tables of the root itself are matched
    /// case-sensitively.
    pub fn resolve_table(&mut self, table_name: &str, case_sensitive: bool) -> Result<Option<TableEntry>> {
        if let Some(entry) = self.resolve_temporary_table(table_name, case_sensitive)? {
            return Ok(Some(entry.renamed(table_name)));
        }
        Ok(self.tree.table(NodeId::ROOT, table_name, true).cloned())
    }

    fn get_schema(&mut self, name: &str) -> Result<Option<NodeId>> {
        // schemas are registered in lower case
        let name = name.to_lowercase();
        if let Some(id) = self.tree.child(NodeId::ROOT, &name) {
            debug!("schema {} found in cache", name);
            return Ok(Some(id));
        }
        self.load_schema_factory(&name)?;
        Ok(self.tree.child(NodeId::ROOT, &name))
    }

    /// Loads the connector serving `name`, which is either a connector name or a
    /// two-level name such as `dfs.tmp`.
    fn load_schema_factory(&mut self, name: &str) -> Result<()> {
        if let Some(connector) = self.root.connectors().get(name) {
            return self.register_schemas(name, &connector);
        }

        // `name` could be `dfs.tmp`, a second level schema under `dfs`
        let paths = schema_path_as_list(name);
        let &[outer, _] = paths.as_slice() else {
            return Ok(());
        };
        let Some(connector) = self.root.connectors().get(outer) else {
            return Ok(());
        };
        let first_level = match self.tree.child(NodeId::ROOT, outer) {
            Some(id) => id,
            None => {
                self.register_schemas(name, &connector)?;
                match self.tree.child(NodeId::ROOT, outer) {
                    Some(id) => id,
                    None => {
                        warn!(
                            "connector {} did not register a schema named {}",
                            connector.name(),
                            outer
                        );
                        return Ok(());
                    }
                }
            }
        };

        let second_level = self.tree.children(first_level);
        for (child_name, id) in &second_level {
            let kind = self.tree.node(*id).kind();
            if !matches!(kind, NodeKind::Connector { .. } | NodeKind::Compound { .. }) {
                return Err(CatalogError::UnexpectedSchema {
                    schema: format!("{outer}.{child_name}"),
                    type_name: kind.type_name().into(),
                    connector: self.tree.full_name(first_level),
                });
            }
        }
        for (child_name, id) in second_level {
            self.tree.add_node(
                NodeId::ROOT,
                &format!("{outer}.{child_name}"),
                NodeKind::Compound { target: id },
            );
        }
        Ok(())
    }

    /// Registers the schemas of `connector` with retries. Once the attempts are
    /// exhausted the connector is disabled if so configured, and the last
    /// failure is returned as a plugin error.
    fn register_schemas(&mut self, schema_name: &str, connector: &ConnectorRef) -> Result<()> {
        let exhausted = match register_with_retry(
            &mut self.tree,
            connector.as_ref(),
            &self.config,
            self.sleeper.as_ref(),
        ) {
            Ok(()) => return Ok(()),
            Err(exhausted) => exhausted,
        };
        error!(
            "Failed to load schema for {}: {}",
            schema_name, exhausted.last
        );
        let connector_name = connector.name();
        let mut err = PluginError::new(
            schema_name,
            connector_name,
            exhausted.last,
            exhausted.previous,
        );
        if self.config.auto_disable {
            let msg = format!(
                "The plugin {connector_name} will now be disabled (see SYSTEM option {AUTO_DISABLE_OPTION})"
            );
            warn!("{}", msg);
            err.add_context(msg);
            if let Err(e) = self.root.connectors().set_enabled(connector_name, false) {
                error!("Could not disable {}: {}", connector_name, e);
            }
        }
        Err(err.into())
    }
}
