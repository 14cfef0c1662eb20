// Copyright 2022 RisingLight Project Authors. Licensed under Apache-2.0.

//! Resolve schema paths and tables against a catalog definition file.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use itertools::Itertools;
use lazy_catalog::path::SchemaPath;
use lazy_catalog::{CatalogDef, CatalogResolver};
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter;
use tracing_subscriber::prelude::*;

/// Resolve names against a lazily loaded catalog.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Catalog definition file (JSON).
    #[clap(short, long)]
    catalog: PathBuf,

    /// Resolve on behalf of this user instead of the configured one.
    #[clap(short, long)]
    user: Option<String>,

    /// Match table names case-sensitively.
    #[clap(long)]
    case_sensitive: bool,

    /// Tables to resolve under the root, possibly through table aliases.
    #[clap(short, long)]
    table: Vec<String>,

    /// Schema paths to resolve, e.g. `dfs.tmp` or `` `dfs.tmp` ``.
    paths: Vec<String>,
}

/// Resolve a schema path and print what it contains.
fn print_schema(resolver: &mut CatalogResolver, path: &str, case_sensitive: bool) -> Result<()> {
    let path: SchemaPath = path.parse()?;
    let Some(id) = resolver.resolve_path(&path, case_sensitive)? else {
        println!("{path}: not found");
        return Ok(());
    };
    let tree = resolver.tree();
    let node = tree.node(tree.resolve_target(id));
    println!("{path}: {} ({})", tree.full_name(id), node.kind().type_name());
    for (name, _) in tree.children(id) {
        println!("  schema {name}");
    }
    for name in node.table_names().sorted() {
        println!("  table {name}");
    }
    Ok(())
}

/// Resolve a table and print where it comes from.
fn print_table(resolver: &mut CatalogResolver, name: &str, case_sensitive: bool) -> Result<()> {
    match resolver.resolve_table(name, case_sensitive)? {
        Some(entry) => {
            println!("{name}: {:?}", entry.table_type());
            if let Some(sql) = entry.definition() {
                println!("  {sql}");
            }
        }
        None => println!("{name}: not found"),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let fmt_layer = tracing_subscriber::fmt::layer().compact();
    let filter_layer =
        filter::EnvFilter::from_default_env().add_directive(LevelFilter::INFO.into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    let catalog = CatalogDef::load(&args.catalog)?.build()?;
    let mut config = catalog.config.clone();
    if let Some(user) = args.user {
        config.user = user;
    }
    let case_sensitive = config.case_sensitive || args.case_sensitive;
    info!("resolving as user {}", config.user);

    let mut resolver = catalog.resolver_with(config);
    println!(
        "schemas: {}",
        resolver.list_child_names().iter().join(", ")
    );
    for path in &args.paths {
        if let Err(err) = print_schema(&mut resolver, path, case_sensitive) {
            println!("{path}: {err:#}");
        }
    }
    for table in &args.table {
        if let Err(err) = print_table(&mut resolver, table, case_sensitive) {
            println!("{table}: {err:#}");
        }
    }

    Ok(())
}
