//! Pkgforge - deployment manifest generator
//!
//! Usage:
//!   pkgforge git --from HEAD~1          # Manifests from a git diff
//!   pkgforge json components.json       # Manifests from JSON descriptors
//!   pkgforge merge a.xml b.xml          # Merge existing manifests

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pkgforge_core::catalog::{StaticCatalog, parse_catalog};
use pkgforge_core::config::{ConfigStore, Settings, resolve_api_version};
use pkgforge_core::derive::{DerivationResult, DeriveOptions, Deriver};
use pkgforge_core::git::GitRevisionDiff;
use pkgforge_core::ignore::{DEFAULT_IGNORE_FILE, IgnoreRules};
use pkgforge_core::output::ManifestWriter;
use pkgforge_core::source::{
    RevisionDiff, change_set_from_descriptor, change_set_from_diff, load_manifest_sources,
};
use pkgforge_core::types::MemberSet;

const DEFAULT_OUTPUT_DIR: &str = "manifest";

#[derive(Parser)]
#[command(name = "pkgforge")]
#[command(about = "Deployment manifest generator", long_about = None)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive manifests from the files changed between two revisions
    Git {
        /// Base revision
        #[arg(long)]
        from: String,
        /// Target revision (defaults to the working tree)
        #[arg(long)]
        to: Option<String>,
        /// Repository directory
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },

    /// Derive manifests from JSON component descriptors
    Json {
        /// Descriptor files
        #[arg(required = true)]
        descriptors: Vec<PathBuf>,
    },

    /// Merge existing manifests
    ///
    /// Files named destructiveChanges*.xml are merged as destructive changes,
    /// everything else as packages.
    Merge {
        /// Manifest files
        #[arg(required = true)]
        manifests: Vec<PathBuf>,
        /// Only merge package manifests
        #[arg(long, conflicts_with = "only_destructive")]
        only_package: bool,
        /// Only merge destructive manifests
        #[arg(long)]
        only_destructive: bool,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Directory the manifests are written to
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// List every member instead of using wildcards
    #[arg(long, global = true)]
    explicit: bool,

    /// Run destructive changes before the deploy
    #[arg(long, global = true)]
    before_deploy: bool,

    /// JSON ignore file
    #[arg(long, global = true, conflicts_with = "no_ignore")]
    ignore_file: Option<PathBuf>,

    /// Do not apply any ignore file
    #[arg(long, global = true)]
    no_ignore: bool,

    /// API version written into manifests
    #[arg(long, global = true)]
    api_version: Option<String>,

    /// Additional catalog TOML layered over the built-in types
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Print the derived data as JSON instead of writing manifests
    #[arg(long, global = true)]
    raw: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable summary
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pkgforge=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let project_root = std::env::current_dir().context("Failed to read current directory")?;
    let settings = ConfigStore::from_project(&project_root)?.load()?;
    let common = &cli.common;

    let catalog = load_catalog(common, &settings, &project_root)?;
    let options = build_options(common, &settings, &project_root)?;

    let options = match &cli.command {
        Commands::Merge {
            only_package,
            only_destructive,
            ..
        } => options
            .with_merge_packages(!*only_destructive)
            .with_merge_destructives(!*only_package),
        _ => options,
    };
    let deriver = Deriver::new(&catalog, options);

    if common.raw {
        return print_raw(&cli.command, &deriver, &catalog);
    }

    let result = match &cli.command {
        Commands::Git { from, to, repo } => {
            deriver.from_diff(&git_diff(repo, from, to.as_deref()))?
        }
        Commands::Json { descriptors } => {
            let documents = read_descriptors(descriptors)?;
            let documents: Vec<&str> = documents.iter().map(String::as_str).collect();
            deriver.from_descriptors(&documents)?
        }
        Commands::Merge { manifests, .. } => {
            let sources = load_manifest_sources(manifests)?;
            deriver.from_manifests(&sources)?
        }
    };

    let output_dir = common
        .output_dir
        .clone()
        .or_else(|| settings.output_dir.as_ref().map(|dir| project_root.join(dir)))
        .unwrap_or_else(|| project_root.join(DEFAULT_OUTPUT_DIR));
    let written = ManifestWriter::new(&output_dir).write(&result)?;

    match common.format {
        OutputFormat::Table => print_summary(&result, &written),
        OutputFormat::Json => print_json(&result, &written)?,
    }

    Ok(())
}

fn load_catalog(
    common: &CommonArgs,
    settings: &Settings,
    project_root: &Path,
) -> Result<StaticCatalog> {
    let mut catalog = StaticCatalog::builtin().context("Failed to load built-in catalog")?;
    let extra = common
        .catalog
        .clone()
        .or_else(|| settings.catalog.as_ref().map(|path| project_root.join(path)));
    if let Some(path) = extra {
        let file = parse_catalog(&path)?;
        catalog
            .extend(file.types)
            .with_context(|| format!("Invalid catalog: {}", path.display()))?;
        tracing::debug!(path = %path.display(), types = catalog.len(), "loaded catalog");
    }
    Ok(catalog)
}

fn build_options(
    common: &CommonArgs,
    settings: &Settings,
    project_root: &Path,
) -> Result<DeriveOptions> {
    let mut options = settings.apply_to(DeriveOptions::default());

    let api_version = resolve_api_version(
        common.api_version.as_deref(),
        settings.api_version.as_deref(),
        project_root,
    )?;
    options = options.with_api_version(api_version);

    if common.explicit {
        options = options.with_explicit(true);
    }
    if common.before_deploy {
        options = options.before_deploy(true);
    }

    if !common.no_ignore {
        let ignore_file = common
            .ignore_file
            .clone()
            .or_else(|| settings.ignore_file.as_ref().map(|path| project_root.join(path)));
        let ignore_file = match ignore_file {
            Some(path) => Some(path),
            None => Some(project_root.join(DEFAULT_IGNORE_FILE)).filter(|path| path.exists()),
        };
        if let Some(path) = ignore_file {
            let rules = IgnoreRules::load(&path)?;
            tracing::debug!(path = %path.display(), rules = rules.len(), "loaded ignore rules");
            options = options.with_ignore_rules(rules);
        }
    }

    Ok(options)
}

fn git_diff(repo: &Path, from: &str, to: Option<&str>) -> GitRevisionDiff {
    let diff = GitRevisionDiff::new(repo, from);
    match to {
        Some(to) => diff.to(to),
        None => diff,
    }
}

fn read_descriptors(paths: &[PathBuf]) -> Result<Vec<String>> {
    paths
        .iter()
        .map(|path| {
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read descriptor: {}", path.display()))
        })
        .collect()
}

fn print_raw(command: &Commands, deriver: &Deriver<'_>, catalog: &StaticCatalog) -> Result<()> {
    let output = match command {
        Commands::Git { from, to, repo } => {
            let entries = git_diff(repo, from, to.as_deref()).entries()?;
            let changes = change_set_from_diff(&entries, catalog);
            serde_json::to_value(deriver.prepare(vec![changes])?)?
        }
        Commands::Json { descriptors } => {
            let changes = read_descriptors(descriptors)?
                .iter()
                .map(|document| change_set_from_descriptor(document, catalog))
                .collect::<pkgforge_core::error::Result<Vec<_>>>()?;
            serde_json::to_value(deriver.prepare(changes)?)?
        }
        Commands::Merge { manifests, .. } => {
            let sources = load_manifest_sources(manifests)?;
            serde_json::to_value(deriver.from_manifests(&sources)?)?
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_summary(result: &DerivationResult, written: &[PathBuf]) {
    if written.is_empty() {
        println!("• Nothing to write");
    }
    for ((_, manifest), path) in result.outputs().into_iter().zip(written) {
        println!(
            "{} {} (API {})",
            style("✓").green(),
            path.display(),
            manifest.api_version
        );
        for (type_name, members) in &manifest.types {
            let listed = match members {
                MemberSet::Wildcard => style("*").cyan().to_string(),
                MemberSet::Explicit(names) => format!("{} member(s)", names.len()),
            };
            println!("    {:<32} {}", type_name, listed);
        }
    }

    for warning in result.warnings() {
        println!("  {} {}", style("⚠").yellow(), warning);
    }
}

fn print_json(result: &DerivationResult, written: &[PathBuf]) -> Result<()> {
    let output = serde_json::json!({
        "written": written,
        "warnings": result.warnings(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
