//! ACL Command Line Interface
//!
//! Offline access to the ACL engines over JSON files.
//!
//! # Usage
//!
//! ```bash
//! # Sanitize version keys of a tree before storing it
//! acl_cli encode --file scope.json
//!
//! # Render a tree against a catalog dump
//! acl_cli project --tree scope.json --catalog catalog.json --env dev --env prod
//!
//! # Compare two environments, then promote the edited list
//! acl_cli preview --tree scope.json --catalog catalog.json --main dev --sec prod --granularity api > records.json
//! acl_cli apply --tree scope.json --catalog catalog.json --records records.json --target prod
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use acl_types::{AclTree, CatalogService, PreviewGranularity, PreviewRecord};
use gateway_acl::catalog::{CatalogIndex, CatalogQuery};
use gateway_acl::{key_codec, preview, projection};

#[derive(Parser)]
#[command(name = "acl_cli")]
#[command(version = "0.1.0")]
#[command(about = "Gateway ACL tooling: key sanitizing, projections and environment previews")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Emit compact JSON instead of pretty-printed
    #[arg(long, global = true)]
    compact: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Granularity {
    Service,
    Api,
}

impl From<Granularity> for PreviewGranularity {
    fn from(value: Granularity) -> Self {
        match value {
            Granularity::Service => PreviewGranularity::Service,
            Granularity::Api => PreviewGranularity::Api,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Encode version keys of a raw tree into their stored form
    Encode {
        /// Input file (reads stdin if not provided)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Decode version keys of a stored tree
    Decode {
        /// Input file (reads stdin if not provided)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Project a tree against the catalog for display
    Project {
        #[arg(long)]
        tree: PathBuf,

        /// JSON array of catalog services
        #[arg(long)]
        catalog: PathBuf,

        /// Environments to render in full
        #[arg(long = "env")]
        envs: Vec<String>,
    },

    /// Compare two environments of a tree
    Preview {
        #[arg(long)]
        tree: PathBuf,

        #[arg(long)]
        catalog: PathBuf,

        #[arg(long)]
        main: String,

        #[arg(long)]
        sec: String,

        #[arg(long, value_enum, default_value = "service")]
        granularity: Granularity,
    },

    /// Write edited preview records into one environment
    Apply {
        #[arg(long)]
        tree: PathBuf,

        #[arg(long)]
        catalog: PathBuf,

        /// JSON array of preview records
        #[arg(long)]
        records: PathBuf,

        #[arg(long)]
        target: String,
    },
}

// =============================================================================
// MAIN
// =============================================================================

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Encode { file } => cmd_rewrite(file, key_codec::encode_document),
        Commands::Decode { file } => cmd_rewrite(file, key_codec::decode_document),
        Commands::Project {
            tree,
            catalog,
            envs,
        } => cmd_project(&tree, &catalog, &envs),
        Commands::Preview {
            tree,
            catalog,
            main,
            sec,
            granularity,
        } => cmd_preview(&tree, &catalog, &main, &sec, granularity.into()),
        Commands::Apply {
            tree,
            catalog,
            records,
            target,
        } => cmd_apply(&tree, &catalog, &records, &target),
    };

    match result.and_then(|output| print_json(&output, cli.compact)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

fn cmd_rewrite(
    file: Option<PathBuf>,
    rewrite: fn(&serde_json::Value) -> serde_json::Value,
) -> Result<serde_json::Value> {
    let source = read_input(file)?;
    let document: serde_json::Value =
        serde_json::from_str(&source).context("input is not valid JSON")?;
    Ok(rewrite(&document))
}

fn cmd_project(tree: &Path, catalog: &Path, envs: &[String]) -> Result<serde_json::Value> {
    let tree: AclTree = read_json(tree)?;
    let catalog = load_catalog(catalog)?;
    let projected = projection::project_scope(&tree, &catalog, envs);
    Ok(serde_json::to_value(projected)?)
}

fn cmd_preview(
    tree: &Path,
    catalog: &Path,
    main: &str,
    sec: &str,
    granularity: PreviewGranularity,
) -> Result<serde_json::Value> {
    let tree: AclTree = read_json(tree)?;
    let records = match granularity {
        PreviewGranularity::Service => preview::preview_services(&tree, main, sec),
        PreviewGranularity::Api => {
            let catalog = load_catalog(catalog)?;
            preview::preview_apis(&tree, main, sec, &catalog)
        }
    };
    Ok(serde_json::to_value(records)?)
}

fn cmd_apply(tree: &Path, catalog: &Path, records: &Path, target: &str) -> Result<serde_json::Value> {
    let tree: AclTree = read_json(tree)?;
    let catalog = load_catalog(catalog)?;
    let records: Vec<PreviewRecord> = read_json(records)?;

    let updated = preview::apply_scope(&tree, target, &records, &catalog)
        .with_context(|| format!("failed to apply {} records to '{}'", records.len(), target))?;
    Ok(serde_json::to_value(updated)?)
}

// =============================================================================
// HELPERS
// =============================================================================

fn read_input(file: Option<PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

fn load_catalog(path: &Path) -> Result<CatalogIndex> {
    let services: Vec<CatalogService> = read_json(path)?;
    Ok(CatalogIndex::build(services, &CatalogQuery::default()))
}

fn print_json(value: &serde_json::Value, compact: bool) -> Result<()> {
    let rendered = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", rendered);
    Ok(())
}
