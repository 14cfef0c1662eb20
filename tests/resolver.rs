use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lazy_catalog::alias::MemoryAliasRegistry;
use lazy_catalog::catalog::{Interrupted, NodeId, NodeKind, SchemaMut, Sleeper};
use lazy_catalog::connector::{
    Connector, ConnectorError, ConnectorRef, ConnectorRegistry, MemoryConnector,
    MemoryConnectorRegistry, RegistrationError, RegistrationErrorKind, SchemaDef,
};
use lazy_catalog::{CatalogError, CatalogResolver, SchemaConfig};
use test_case::test_case;

#[derive(Default)]
struct CountingSleeper {
    sleeps: AtomicU32,
}

impl Sleeper for CountingSleeper {
    fn sleep(&self, _: Duration) -> Result<(), Interrupted> {
        self.sleeps.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

fn schema(json: &str) -> SchemaDef {
    serde_json::from_str(json).unwrap()
}

fn dfs() -> Arc<MemoryConnector> {
    Arc::new(MemoryConnector::new(
        "dfs",
        schema(r#"{ "schemas": { "tmp": { "tables": { "orders": {} } }, "root": {} } }"#),
    ))
}

struct Fixture {
    registry: Arc<MemoryConnectorRegistry>,
    sleeper: Arc<CountingSleeper>,
    resolver: CatalogResolver,
}

fn fixture(connectors: &[Arc<MemoryConnector>], config: SchemaConfig) -> Fixture {
    let registry = Arc::new(MemoryConnectorRegistry::new());
    for connector in connectors {
        registry.register(connector.clone()).unwrap();
    }
    let sleeper = Arc::new(CountingSleeper::default());
    let resolver = CatalogResolver::new(
        registry.clone(),
        Arc::new(MemoryAliasRegistry::new()),
        config,
    )
    .with_sleeper(sleeper.clone());
    Fixture {
        registry,
        sleeper,
        resolver,
    }
}

#[test]
fn unknown_name_is_not_found() {
    let dfs = dfs();
    let mut f = fixture(&[dfs.clone()], SchemaConfig::default_for_test());
    for name in ["nope", "nope.tmp", "a.b.c", ""] {
        assert_eq!(f.resolver.resolve_child(name, false).unwrap(), None);
    }
    assert!(f.resolver.tree().is_empty());
    assert_eq!(dfs.attempts(), 0);
    assert_eq!(f.registry.all_names(), BTreeSet::from(["dfs".to_string()]));
}

#[test]
fn cached_node_is_not_registered_again() {
    let dfs = dfs();
    let mut f = fixture(&[dfs.clone()], SchemaConfig::default_for_test());
    let first = f.resolver.resolve_child("dfs", false).unwrap().unwrap();
    let second = f.resolver.resolve_child("dfs", false).unwrap().unwrap();
    assert_eq!(first, second);
    assert_eq!(dfs.attempts(), 1);
}

#[test_case("DFS", false)]
#[test_case("dfs", true)]
#[test_case("Dfs", true)]
fn schema_names_ignore_case(name: &str, case_sensitive: bool) {
    let dfs = dfs();
    let mut f = fixture(&[dfs.clone()], SchemaConfig::default_for_test());
    let loaded = f.resolver.resolve_child("dfs", false).unwrap().unwrap();
    assert_eq!(
        f.resolver.resolve_child(name, case_sensitive).unwrap(),
        Some(loaded)
    );
    assert_eq!(dfs.attempts(), 1);
}

#[test]
fn compound_path_is_flattened_under_root() {
    let a = Arc::new(MemoryConnector::new(
        "a",
        schema(r#"{ "schemas": { "b": {}, "c": {} } }"#),
    ));
    let mut f = fixture(&[a.clone()], SchemaConfig::default_for_test());

    let ab = f.resolver.resolve_child("a.b", false).unwrap().unwrap();
    let ac = f.resolver.resolve_child("a.c", false).unwrap().unwrap();
    let a_node = f.resolver.resolve_child("a", false).unwrap().unwrap();
    assert_eq!(a.attempts(), 1);

    let tree = f.resolver.tree();
    assert_eq!(tree.node(ab).parent(), Some(NodeId::ROOT));
    assert_eq!(tree.node(ac).parent(), Some(NodeId::ROOT));
    assert_eq!(tree.child(NodeId::ROOT, "a.b"), Some(ab));
    assert_eq!(tree.child(NodeId::ROOT, "a.c"), Some(ac));
    assert_eq!(
        tree.node(a_node).kind(),
        &NodeKind::Connector {
            connector: "a".into()
        }
    );
    assert_eq!(tree.resolve_target(ab), tree.child(a_node, "b").unwrap());
    assert_eq!(tree.resolve_target(ac), tree.child(a_node, "c").unwrap());
    assert_eq!(tree.resolve_target(a_node), a_node);
}

#[test]
fn retries_are_exhausted() {
    let broken = Arc::new(
        MemoryConnector::new("broken", SchemaDef::default()).always_fail(
            RegistrationErrorKind::Connection("refused".into()).with_hint("is the server up?"),
        ),
    );
    let config = SchemaConfig {
        retry_attempts: 2,
        retry_delay_ms: 10,
        ..SchemaConfig::default_for_test()
    };
    let mut f = fixture(&[broken.clone()], config);

    let err = f.resolver.resolve_child("broken", false).unwrap_err();
    assert_eq!(broken.attempts(), 3);
    assert_eq!(f.sleeper.sleeps.load(Ordering::Relaxed), 2);

    let plugin = err.as_plugin().unwrap();
    assert_eq!(plugin.connector(), "broken");
    assert_eq!(plugin.attempts(), 3);
    assert_eq!(plugin.cause_type(), "ConnectionError");
    assert_eq!(plugin.cause_message(), "connection failed: refused");
    assert_eq!(plugin.hint(), Some("is the server up?"));
    assert!(plugin.context().is_empty());
    assert!(err.to_string().contains("Failed to load schema for schema broken"));
    assert!(f.resolver.tree().is_empty());
}

#[test]
fn last_failure_is_reported() {
    let connector = FailingInOrder {
        name: "flaky".into(),
        calls: AtomicU32::new(0),
    };
    let registry = Arc::new(MemoryConnectorRegistry::new());
    registry.register(Arc::new(connector)).unwrap();
    let config = SchemaConfig {
        retry_attempts: 1,
        ..SchemaConfig::default_for_test()
    };
    let mut resolver =
        CatalogResolver::new(registry, Arc::new(MemoryAliasRegistry::new()), config)
            .with_sleeper(Arc::new(CountingSleeper::default()));

    let err = resolver.resolve_child("flaky", false).unwrap_err();
    let plugin = err.as_plugin().unwrap();
    assert_eq!(plugin.cause_message(), "failure 2");
    assert_eq!(plugin.previous_failures()[0].to_string(), "failure 1");
}

/// Fails every call with a numbered message.
struct FailingInOrder {
    name: String,
    calls: AtomicU32,
}

impl Connector for FailingInOrder {
    fn name(&self) -> &str {
        &self.name
    }

    fn register_schemas(
        &self,
        _: &SchemaConfig,
        _: &mut SchemaMut<'_>,
    ) -> Result<(), RegistrationError> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        Err(RegistrationErrorKind::Other(format!("failure {call}")).into())
    }
}

#[test_case(true ; "auto disable on")]
#[test_case(false ; "auto disable off")]
fn auto_disable(enabled: bool) {
    let broken = Arc::new(
        MemoryConnector::new("broken", SchemaDef::default())
            .always_fail(RegistrationErrorKind::Other("boom".into())),
    );
    let config = SchemaConfig {
        auto_disable: enabled,
        ..SchemaConfig::default_for_test()
    };
    let mut f = fixture(&[broken, dfs()], config);

    let err = f.resolver.resolve_child("broken", false).unwrap_err();
    assert_eq!(err.as_plugin().unwrap().cause_message(), "boom");
    assert_eq!(f.registry.is_enabled("broken"), Some(!enabled));
    assert_eq!(
        f.resolver.list_child_names().contains("broken"),
        !enabled
    );
    assert_eq!(f.registry.is_enabled("dfs"), Some(true));
}

/// A registry whose connectors can not be disabled.
struct PinnedRegistry(MemoryConnectorRegistry);

impl ConnectorRegistry for PinnedRegistry {
    fn get(&self, name: &str) -> Option<ConnectorRef> {
        self.0.get(name)
    }

    fn enabled_names(&self) -> BTreeSet<String> {
        self.0.enabled_names()
    }

    fn set_enabled(&self, name: &str, _: bool) -> Result<(), ConnectorError> {
        Err(ConnectorError::Immutable(name.into(), "pinned".into()))
    }
}

#[test]
fn failure_to_disable_keeps_original_error() {
    let inner = MemoryConnectorRegistry::new();
    inner
        .register(Arc::new(
            MemoryConnector::new("broken", SchemaDef::default())
                .always_fail(RegistrationErrorKind::Other("boom".into())),
        ))
        .unwrap();
    let registry = Arc::new(PinnedRegistry(inner));
    let config = SchemaConfig {
        auto_disable: true,
        ..SchemaConfig::default_for_test()
    };
    let mut resolver =
        CatalogResolver::new(registry.clone(), Arc::new(MemoryAliasRegistry::new()), config);

    let err = resolver.resolve_child("broken", false).unwrap_err();
    let plugin = err.as_plugin().unwrap();
    assert_eq!(plugin.cause_message(), "boom");
    assert_eq!(plugin.context().len(), 1);
    assert!(registry.get("broken").is_some());
}

#[test]
fn disabled_connector_stays_cached() {
    let dfs = dfs();
    let mut f = fixture(&[dfs.clone()], SchemaConfig::default_for_test());
    let id = f.resolver.resolve_child("dfs", false).unwrap().unwrap();

    f.registry.set_enabled("dfs", false).unwrap();
    assert!(f.resolver.list_child_names().is_empty());
    assert_eq!(f.resolver.resolve_child("dfs", false).unwrap(), Some(id));
    assert_eq!(dfs.attempts(), 1);
}

#[test]
fn child_names_follow_registry() {
    let mut f = fixture(&[dfs()], SchemaConfig::default_for_test());
    assert_eq!(
        f.resolver.list_child_names(),
        BTreeSet::from(["dfs".to_string()])
    );
    assert!(f.resolver.tree().is_empty());

    f.registry
        .register(Arc::new(MemoryConnector::new("s3", SchemaDef::default())))
        .unwrap();
    assert_eq!(f.resolver.list_child_names().len(), 2);
    assert_eq!(f.resolver.root().type_name(), "");
    assert!(!f.resolver.root().show_in_information_schema());
}

#[test]
fn unexpected_schema_aborts() {
    let odd = Arc::new(MemoryConnector::new(
        "odd",
        schema(r#"{ "schemas": { "good": {}, "bad": { "opaque": "JDBC" } } }"#),
    ));
    let mut f = fixture(&[odd.clone()], SchemaConfig::default_for_test());
    let err = f.resolver.resolve_child("odd.good", false).unwrap_err();
    assert!(matches!(
        &err,
        CatalogError::UnexpectedSchema { schema, connector, .. } if schema == "odd.bad" && connector == "odd"
    ));
    assert_eq!(odd.attempts(), 1);
    // the first level itself still resolves
    assert!(f.resolver.resolve_child("odd", false).unwrap().is_some());
}
