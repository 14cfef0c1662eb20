// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! A catalog tree whose top-level namespaces are backed by pluggable connectors
//! and registered on first access.
//!
//! The entry point is [`CatalogResolver`](catalog::CatalogResolver). It owns the
//! tree of namespaces for one session, asks the
//! [`ConnectorRegistry`](connector::ConnectorRegistry) for a connector when a
//! namespace is missing, retries failed registrations and resolves per-user
//! aliases through an [`AliasRegistry`](alias::AliasRegistry).

#![deny(unused_must_use)]

pub mod alias;
pub mod catalog;
pub mod config;
pub mod connector;
pub mod def;
pub mod path;

pub use self::catalog::{CatalogError, CatalogResolver, NodeId, PluginError, TableEntry};
pub use self::config::SchemaConfig;
pub use self::def::{Catalog, CatalogDef};
