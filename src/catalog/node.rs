// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::collections::HashMap;

use super::*;

/// What a node of the catalog tree stands for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// The root of the tree.
    Root,
    /// A schema registered by a connector.
    Connector { connector: String },
    /// A second-level schema of a connector, attached to the root under its
    /// dotted name (`dfs.tmp`). Lookups go through to `target`.
    Compound { target: NodeId },
    /// A schema a connector registered without a kind the catalog understands.
    Unknown { type_name: String },
}

impl NodeKind {
    /// A short name of the kind, used in diagnostics.
    pub fn type_name(&self) -> &str {
        match self {
            NodeKind::Root => "ROOT",
            NodeKind::Connector { .. } => "CONNECTOR",
            NodeKind::Compound { .. } => "COMPOUND",
            NodeKind::Unknown { type_name } => type_name,
        }
    }
}

/// A namespace in the catalog tree.
///
/// Node names are always lower case. Children are keyed by their lower-cased
/// name; tables keep the name they were registered with.
#[derive(Debug)]
pub struct CatalogNode {
    id: NodeId,
    name: String,
    parent: Option<NodeId>,
    kind: NodeKind,
    pub(super) children: HashMap<String, NodeId>,
    pub(super) tables: HashMap<String, TableEntry>,
}

impl CatalogNode {
    pub(super) fn new(id: NodeId, name: &str, parent: Option<NodeId>, kind: NodeKind) -> Self {
        CatalogNode {
            id,
            name: name.to_lowercase(),
            parent,
            kind,
            children: HashMap::new(),
            tables: HashMap::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The node lookups are forwarded to, if this is a compound node.
    pub fn compound_target(&self) -> Option<NodeId> {
        match self.kind {
            NodeKind::Compound { target } => Some(target),
            _ => None,
        }
    }

    /// Names of the cached children, in no particular order.
    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Looks up a table registered directly on this node.
    ///
    /// Without case sensitivity an exact match is preferred, then any table whose
    /// name equals `name` ignoring case (the smallest such name, if several).
    pub fn get_table(&self, name: &str, case_sensitive: bool) -> Option<&TableEntry> {
        if let Some(entry) = self.tables.get(name) {
            return Some(entry);
        }
        if case_sensitive {
            return None;
        }
        let lower = name.to_lowercase();
        self.tables
            .iter()
            .filter(|(table_name, _)| table_name.to_lowercase() == lower)
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, entry)| entry)
    }
}
