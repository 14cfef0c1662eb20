// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use crate::alias::AliasKind;
use crate::connector::RegistrationError;
use crate::path::ParsePathError;

/// The error type of catalog resolution.
///
/// A name that can not be resolved is not an error: resolution returns `Ok(None)`.
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Plugin(Box<PluginError>),
    #[error("schema {schema:?} is not expected under root schema: found {type_name} node while loading {connector:?}")]
    UnexpectedSchema {
        schema: String,
        type_name: String,
        connector: String,
    },
    #[error("invalid {kind:?} alias {alias:?} => {target:?}: {source}")]
    InvalidAlias {
        kind: AliasKind,
        alias: String,
        target: String,
        #[source]
        source: ParsePathError,
    },
}

impl From<PluginError> for CatalogError {
    fn from(e: PluginError) -> Self {
        CatalogError::Plugin(Box::new(e))
    }
}

impl CatalogError {
    /// Returns the plugin error, if this is one.
    pub fn as_plugin(&self) -> Option<&PluginError> {
        match self {
            CatalogError::Plugin(e) => Some(e),
            _ => None,
        }
    }
}

/// A connector failed to register its schemas after all attempts.
///
/// Carries the last failure as its cause, plus every earlier failure.
#[derive(thiserror::Error, Debug, Clone)]
pub struct PluginError {
    schema: String,
    connector: String,
    #[source]
    cause: RegistrationError,
    previous: Vec<RegistrationError>,
    context: Vec<String>,
}

impl std::fmt::Display for PluginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PLUGIN ERROR: Failed to load schema for schema {}", self.schema)?;
        write!(f, "\n\n{}: {}", self.cause_type(), self.cause_message())?;
        if let Some(hint) = self.hint() {
            write!(f, "\n{hint}")?;
        }
        for line in &self.context {
            write!(f, "\n{line}")?;
        }
        Ok(())
    }
}

impl PluginError {
    pub(super) fn new(
        schema: &str,
        connector: &str,
        cause: RegistrationError,
        previous: Vec<RegistrationError>,
    ) -> Self {
        PluginError {
            schema: schema.into(),
            connector: connector.into(),
            cause,
            previous,
            context: vec![],
        }
    }

    pub(super) fn add_context(&mut self, line: impl Into<String>) {
        self.context.push(line.into());
    }

    /// The schema name whose resolution triggered the registration.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn connector(&self) -> &str {
        &self.connector
    }

    /// The failure of the last attempt.
    pub fn cause(&self) -> &RegistrationError {
        &self.cause
    }

    pub fn cause_type(&self) -> &'static str {
        self.cause.type_name()
    }

    pub fn cause_message(&self) -> String {
        self.cause.to_string()
    }

    pub fn hint(&self) -> Option<&str> {
        self.cause.hint()
    }

    /// Failures of the attempts before the last one, oldest first.
    pub fn previous_failures(&self) -> &[RegistrationError] {
        &self.previous
    }

    /// Total number of failed attempts.
    pub fn attempts(&self) -> usize {
        self.previous.len() + 1
    }

    pub fn context(&self) -> &[String] {
        &self.context
    }
}
