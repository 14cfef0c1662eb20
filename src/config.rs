// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Number of extra attempts made to register a connector's schemas.
pub const RETRY_ATTEMPTS_OPTION: &str = "store.plugin.retry_attempts";
/// Delay between two attempts to register a connector's schemas.
pub const RETRY_DELAY_OPTION: &str = "store.plugin.retry_delay";
/// Whether a connector is disabled once all registration attempts failed.
pub const AUTO_DISABLE_OPTION: &str = "store.plugin.auto_disable";

/// Options of a catalog resolution session.
///
/// A `SchemaConfig` is read-only for the lifetime of a
/// [`CatalogResolver`](crate::CatalogResolver).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// The user on whose behalf names are resolved. Aliases are looked up for this user.
    pub user: String,

    /// Default case sensitivity of table lookups.
    pub case_sensitive: bool,

    /// Extra registration attempts after the first one failed.
    #[serde(rename = "store.plugin.retry_attempts")]
    pub retry_attempts: u32,

    /// Delay in milliseconds between two registration attempts.
    #[serde(rename = "store.plugin.retry_delay")]
    pub retry_delay_ms: u64,

    /// Disable a connector whose registration attempts are exhausted.
    #[serde(rename = "store.plugin.auto_disable")]
    pub auto_disable: bool,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self::default_for_cli()
    }
}

impl SchemaConfig {
    pub fn default_for_cli() -> Self {
        Self {
            user: "anonymous".into(),
            case_sensitive: false,
            retry_attempts: 1,
            retry_delay_ms: 1000,
            auto_disable: false,
        }
    }

    pub fn default_for_test() -> Self {
        Self {
            user: "test".into(),
            case_sensitive: false,
            retry_attempts: 0,
            retry_delay_ms: 0,
            auto_disable: false,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Total number of registration attempts, never less than one.
    pub fn max_attempts(&self) -> u32 {
        self.retry_attempts.saturating_add(1)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
