// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::*;
use crate::config::{SchemaConfig, RETRY_ATTEMPTS_OPTION, RETRY_DELAY_OPTION};
use crate::connector::{Connector, RegistrationError};

/// A wait between two registration attempts was cut short.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("sleep interrupted")]
pub struct Interrupted;

/// Waits between two registration attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> Result<(), Interrupted>;
}

pub type SleeperRef = Arc<dyn Sleeper>;

/// Blocks the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        std::thread::sleep(duration);
        Ok(())
    }
}

/// All attempts to register a connector failed.
#[derive(Debug, Clone)]
pub struct RetryExhausted {
    /// The failure of the last attempt.
    pub last: RegistrationError,
    /// Failures of the attempts before, oldest first.
    pub previous: Vec<RegistrationError>,
}

/// Registers the schemas of `connector` into `tree`, making up to
/// [`SchemaConfig::max_attempts`] attempts.
///
/// Every attempt registers into a fresh staging tree which is merged into `tree`
/// only once the attempt succeeded, so a failed attempt leaves no trace.
pub fn register_with_retry(
    tree: &mut CatalogTree,
    connector: &dyn Connector,
    config: &SchemaConfig,
    sleeper: &dyn Sleeper,
) -> Result<(), RetryExhausted> {
    let max_attempts = config.max_attempts();
    let retry_delay = config.retry_delay();
    let name = connector.name();
    let mut previous = vec![];
    let mut attempt = 1;
    loop {
        let mut staging = CatalogTree::new();
        let result = connector.register_schemas(config, &mut staging.schema_mut(NodeId::ROOT, name));
        let err = match result {
            Ok(()) => {
                tree.graft(&staging);
                return Ok(());
            }
            Err(err) => err,
        };
        warn!(
            "Attempt {} of {} to register schemas for connector {} failed: {}",
            attempt, max_attempts, name, err
        );
        if attempt >= max_attempts {
            info!(
                "Giving up on connector {} after {} attempts (see SYSTEM option {})",
                name, attempt, RETRY_ATTEMPTS_OPTION
            );
            return Err(RetryExhausted {
                last: err,
                previous,
            });
        }
        info!(
            "Next attempt to register schemas for connector {} will be made in {:?} (see SYSTEM option {})",
            name, retry_delay, RETRY_DELAY_OPTION
        );
        if let Err(e) = sleeper.sleep(retry_delay) {
            warn!(
                "Interrupted while waiting to make another attempt to register schemas for connector {}: {}",
                name, e
            );
        }
        previous.push(err);
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::connector::{MemoryConnector, RegistrationErrorKind, SchemaDef};

    #[derive(Default)]
    struct CountingSleeper {
        sleeps: AtomicU32,
        interrupt: bool,
    }

    impl Sleeper for CountingSleeper {
        fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
            assert_eq!(duration, Duration::from_millis(5));
            self.sleeps.fetch_add(1, Ordering::Relaxed);
            match self.interrupt {
                true => Err(Interrupted),
                false => Ok(()),
            }
        }
    }

    fn config(retry_attempts: u32) -> SchemaConfig {
        SchemaConfig {
            retry_attempts,
            retry_delay_ms: 5,
            ..SchemaConfig::default_for_test()
        }
    }

    #[test]
    fn test_exhausted_after_max_attempts() {
        let connector = MemoryConnector::new("dfs", SchemaDef::default()).always_fail(
            RegistrationErrorKind::Other("boom".into()),
        );
        let sleeper = CountingSleeper::default();
        let mut tree = CatalogTree::new();

        let err = register_with_retry(&mut tree, &connector, &config(2), &sleeper).unwrap_err();
        assert_eq!(connector.attempts(), 3);
        assert_eq!(sleeper.sleeps.load(Ordering::Relaxed), 2);
        assert_eq!(err.previous.len(), 2);
        assert_eq!(err.last.to_string(), "boom");
        assert!(tree.is_empty());
    }

    #[test]
    fn test_succeeds_after_failures() {
        let connector = MemoryConnector::new("dfs", SchemaDef::default())
            .fail_times(1, RegistrationErrorKind::Other("boom".into()));
        let sleeper = CountingSleeper::default();
        let mut tree = CatalogTree::new();

        register_with_retry(&mut tree, &connector, &config(2), &sleeper).unwrap();
        assert_eq!(connector.attempts(), 2);
        assert_eq!(sleeper.sleeps.load(Ordering::Relaxed), 1);
        assert!(tree.child(NodeId::ROOT, "dfs").is_some());
    }

    #[test]
    fn test_interrupted_sleep_proceeds() {
        let connector = MemoryConnector::new("dfs", SchemaDef::default())
            .fail_times(2, RegistrationErrorKind::Other("boom".into()));
        let sleeper = CountingSleeper {
            interrupt: true,
            ..Default::default()
        };
        let mut tree = CatalogTree::new();

        register_with_retry(&mut tree, &connector, &config(2), &sleeper).unwrap();
        assert_eq!(connector.attempts(), 3);
        assert_eq!(sleeper.sleeps.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_single_attempt_never_sleeps() {
        let connector = MemoryConnector::new("dfs", SchemaDef::default()).always_fail(
            RegistrationErrorKind::Other("boom".into()),
        );
        let sleeper = CountingSleeper::default();
        let mut tree = CatalogTree::new();

        let err = register_with_retry(&mut tree, &connector, &config(0), &sleeper).unwrap_err();
        assert!(err.previous.is_empty());
        assert_eq!(connector.attempts(), 1);
        assert_eq!(sleeper.sleeps.load(Ordering::Relaxed), 0);
    }
}
