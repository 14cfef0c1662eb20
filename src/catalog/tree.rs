// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use itertools::Itertools;

use super::*;

/// An arena holding every node of one catalog tree.
///
/// Nodes are never removed: once a name is cached under a parent it keeps
/// pointing to the same [`NodeId`] for the lifetime of the tree.
#[derive(Debug)]
pub struct CatalogTree {
    nodes: Vec<CatalogNode>,
}

impl Default for CatalogTree {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogTree {
    /// Creates a tree containing only the root.
    pub fn new() -> Self {
        CatalogTree {
            nodes: vec![CatalogNode::new(
                NodeId::ROOT,
                ROOT_SCHEMA_NAME,
                None,
                NodeKind::Root,
            )],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree holds nothing but the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn root(&self) -> &CatalogNode {
        &self.nodes[0]
    }

    pub fn get(&self, id: NodeId) -> Option<&CatalogNode> {
        self.nodes.get(id.index())
    }

    /// Returns the node of `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not handed out by this tree.
    pub fn node(&self, id: NodeId) -> &CatalogNode {
        &self.nodes[id.index()]
    }

    /// Follows compound nodes to the node that holds the actual content.
    pub fn resolve_target(&self, mut id: NodeId) -> NodeId {
        while let Some(target) = self.node(id).compound_target() {
            id = target;
        }
        id
    }

    /// Looks up a cached child by name, ignoring case.
    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        let node = self.node(self.resolve_target(parent));
        node.children.get(&name.to_lowercase()).copied()
    }

    /// Cached children of `parent`, sorted by name.
    pub fn children(&self, parent: NodeId) -> Vec<(String, NodeId)> {
        let node = self.node(self.resolve_target(parent));
        node.children
            .iter()
            .map(|(name, id)| (name.clone(), *id))
            .sorted()
            .collect()
    }

    /// Looks up a table of `parent`. See [`CatalogNode::get_table`].
    pub fn table(&self, parent: NodeId, name: &str, case_sensitive: bool) -> Option<&TableEntry> {
        self.node(self.resolve_target(parent))
            .get_table(name, case_sensitive)
    }

    /// The dotted name of a node, relative to the root.
    pub fn full_name(&self, id: NodeId) -> String {
        let mut names = vec![];
        let mut current = Some(id);
        while let Some(id) = current {
            let node = self.node(id);
            if node.parent().is_some() {
                names.push(node.name());
            }
            current = node.parent();
        }
        names.iter().rev().join(".")
    }

    /// Returns a handle for registering schemas and tables under `id` on behalf
    /// of `connector`.
    pub fn schema_mut(&mut self, id: NodeId, connector: &str) -> SchemaMut<'_> {
        SchemaMut {
            tree: self,
            id,
            connector: connector.into(),
        }
    }

    /// Adds a child to `parent`, or returns the existing child of the same name.
    pub(super) fn add_node(&mut self, parent: NodeId, name: &str, kind: NodeKind) -> NodeId {
        let key = name.to_lowercase();
        if let Some(id) = self.nodes[parent.index()].children.get(&key) {
            return *id;
        }
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(CatalogNode::new(id, &key, Some(parent), kind));
        self.nodes[parent.index()].children.insert(key, id);
        id
    }

    /// Adds a table to `parent` unless one of the same name exists.
    pub(super) fn add_table(&mut self, parent: NodeId, entry: TableEntry) {
        self.nodes[parent.index()]
            .tables
            .entry(entry.name().to_string())
            .or_insert(entry);
    }

    /// Merges everything below the root of `staging` into this tree.
    ///
    /// Existing nodes and tables win over staged ones of the same name.
    pub(super) fn graft(&mut self, staging: &CatalogTree) {
        self.graft_children(NodeId::ROOT, staging, NodeId::ROOT);
    }

    fn graft_children(&mut self, parent: NodeId, staging: &CatalogTree, staged_parent: NodeId) {
        let staged = staging.node(staged_parent);
        for entry in staged.tables.values() {
            self.add_table(parent, entry.clone());
        }
        for (_, staged_child) in staging.children(staged_parent) {
            let child = staging.node(staged_child);
            let id = self.add_node(parent, child.name(), child.kind().clone());
            self.graft_children(id, staging, staged_child);
        }
    }
}

/// A mutable view of one node, handed to connectors while they register their
/// schemas.
pub struct SchemaMut<'a> {
    tree: &'a mut CatalogTree,
    id: NodeId,
    connector: String,
}

impl SchemaMut<'_> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.tree.node(self.id).name()
    }

    /// Adds (or reopens) a sub-schema backed by the current connector.
    pub fn add_schema(&mut self, name: &str) -> SchemaMut<'_> {
        let kind = NodeKind::Connector {
            connector: self.connector.clone(),
        };
        let id = self.tree.add_node(self.id, name, kind);
        SchemaMut {
            tree: &mut *self.tree,
            id,
            connector: self.connector.clone(),
        }
    }

    /// Adds a sub-schema of a kind the catalog does not know how to handle.
    pub fn add_opaque_schema(&mut self, name: &str, type_name: &str) -> SchemaMut<'_> {
        let kind = NodeKind::Unknown {
            type_name: type_name.into(),
        };
        let id = self.tree.add_node(self.id, name, kind);
        SchemaMut {
            tree: &mut *self.tree,
            id,
            connector: self.connector.clone(),
        }
    }

    pub fn add_table(&mut self, entry: TableEntry) {
        self.tree.add_table(self.id, entry);
    }
}
