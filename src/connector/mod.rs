// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! Connectors and the registry that holds them.
//!
//! A connector registers one or more schemas under the root of a catalog tree.
//! Registration may fail or take long; the resolver retries it as configured.
//!
//! To fail a registration, construct a `RegistrationErrorKind` and attach a hint
//! if there is one:
//!
//! ```ignore
//! return Err(RegistrationErrorKind::Connection("refused".into()).into());
//! return Err(RegistrationErrorKind::AccessDenied("s3".into()).with_hint("check the access key"));
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::SchemaMut;
use crate::config::SchemaConfig;

mod memory;
mod registry;

pub use self::memory::*;
pub use self::registry::*;

/// A data source that can register its schemas into a catalog tree.
pub trait Connector: Send + Sync {
    /// The name the connector is registered under.
    fn name(&self) -> &str;

    /// Registers the connector's schemas as children of `root`.
    fn register_schemas(
        &self,
        config: &SchemaConfig,
        root: &mut SchemaMut<'_>,
    ) -> Result<(), RegistrationError>;
}

pub type ConnectorRef = Arc<dyn Connector>;

/// A registry of named connectors, each of which may be disabled.
pub trait ConnectorRegistry: Send + Sync {
    /// Returns the enabled connector named `name`.
    fn get(&self, name: &str) -> Option<ConnectorRef>;

    /// Names of all enabled connectors.
    fn enabled_names(&self) -> BTreeSet<String>;

    fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), ConnectorError>;
}

pub type ConnectorRegistryRef = Arc<dyn ConnectorRegistry>;

/// The error type of connector registry operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    #[error("connector not found: {0}")]
    NotFound(String),
    #[error("duplicated connector: {0}")]
    Duplicated(String),
    #[error("connector {0} can not be changed: {1}")]
    Immutable(String, String),
}

/// The error a connector raises when it fails to register its schemas.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub struct RegistrationError(Box<Inner>);

#[derive(Debug, Clone, PartialEq, Eq)]
struct Inner {
    kind: RegistrationErrorKind,
    hint: Option<String>,
}

impl std::fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.kind)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationErrorKind {
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("{0}")]
    Other(String),
}

impl RegistrationErrorKind {
    /// Attach a remediation hint for the user.
    pub fn with_hint(self, hint: impl Into<String>) -> RegistrationError {
        RegistrationError(Box::new(Inner {
            kind: self,
            hint: Some(hint.into()),
        }))
    }

    /// A stable name of the kind, reported as the cause type of a plugin error.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Connection(_) => "ConnectionError",
            Self::Timeout(_) => "TimeoutError",
            Self::AccessDenied(_) => "AccessDeniedError",
            Self::InvalidConfig(_) => "InvalidConfigError",
            Self::Other(_) => "RegistrationError",
        }
    }
}

impl From<RegistrationErrorKind> for RegistrationError {
    fn from(kind: RegistrationErrorKind) -> Self {
        RegistrationError(Box::new(Inner { kind, hint: None }))
    }
}

impl RegistrationError {
    pub fn kind(&self) -> &RegistrationErrorKind {
        &self.0.kind
    }

    pub fn hint(&self) -> Option<&str> {
        self.0.hint.as_deref()
    }

    pub fn type_name(&self) -> &'static str {
        self.0.kind.type_name()
    }
}
