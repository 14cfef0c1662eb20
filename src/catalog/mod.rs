// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! The catalog tree and its lazy resolution.

use std::fmt;

pub use self::error::*;
pub use self::node::*;
pub use self::resolver::*;
pub use self::retry::*;
pub use self::root::*;
pub use self::table::*;
pub use self::tree::*;

mod error;
mod node;
mod resolver;
mod retry;
mod root;
mod table;
mod tree;

/// The name of the root schema.
pub const ROOT_SCHEMA_NAME: &str = "";

/// A stable index of a node in a [`CatalogTree`].
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone)]
pub struct NodeId(u32);

impl NodeId {
    /// The root of every tree.
    pub const ROOT: NodeId = NodeId(0);

    fn new(index: usize) -> Self {
        NodeId(u32::try_from(index).expect("too many catalog nodes"))
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
