//! ormgen Command-Line Interface
//!
//! Introspects a catalog snapshot and prints the model, the emission plan or
//! the per-unit render contexts.

mod formatter;

use clap::Parser;
use formatter::OutputFormat;
use ormgen_core::{GeneratorConfig, Introspector, MigrationCategory, SnapshotCatalog};
use std::path::PathBuf;

/// ormgen Command-Line Interface
#[derive(Parser, Debug)]
#[command(name = "ormgen")]
#[command(version, about = "Generate ORM models and migrations from a database catalog")]
pub struct Args {
    /// Catalog snapshot (JSON) to introspect
    #[arg(short, long)]
    pub snapshot: PathBuf,

    /// Generator configuration file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Schema to introspect (repeatable)
    #[arg(long = "schema")]
    pub schemas: Vec<String>,

    /// Table to introspect, `table` or `schema.table` (repeatable)
    #[arg(long = "table")]
    pub tables: Vec<String>,

    /// Table to skip (repeatable)
    #[arg(long = "skip-table")]
    pub skip_tables: Vec<String>,

    /// Migration category not to emit (repeatable)
    #[arg(long = "disable", value_parser = parse_category)]
    pub disabled: Vec<MigrationCategory>,

    /// Base timestamp for migration files (YYYYMMDDHHMMSS)
    #[arg(long)]
    pub base_timestamp: Option<String>,

    /// Do not sample JSON columns
    #[arg(long)]
    pub no_samples: bool,

    /// Maximum nesting depth of synthesized JSON structures
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Output format
    #[arg(long, default_value = "summary", value_enum)]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

fn parse_category(value: &str) -> Result<MigrationCategory, ormgen_core::Error> {
    value.parse()
}

impl Args {
    /// Build the run configuration: the config file (if any) with
    /// command-line values layered on top.
    pub fn into_config(&self) -> Result<GeneratorConfig, ormgen_core::Error> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::load(path)?,
            None => GeneratorConfig::default(),
        };

        if !self.schemas.is_empty() {
            config = config.with_schemas(self.schemas.clone());
        }
        if !self.tables.is_empty() {
            config = config.with_tables(self.tables.clone());
        }
        if !self.skip_tables.is_empty() {
            config.skip_tables.extend(self.skip_tables.iter().cloned());
        }
        for category in &self.disabled {
            if !config.disabled_categories.contains(category) {
                config.disabled_categories.push(*category);
            }
        }
        if let Some(timestamp) = &self.base_timestamp {
            config = config.with_base_timestamp(timestamp.clone());
        }
        if self.no_samples {
            config = config.with_sample_json(false);
        }
        if let Some(depth) = self.max_depth {
            config = config.with_max_structure_depth(depth);
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ormgen=info,ormgen_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!(error = %e, "introspection failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.into_config()?;
    tracing::info!(
        snapshot = %args.snapshot.display(),
        schemas = ?config.schemas,
        base_timestamp = ?config.base_timestamp,
        "configuration loaded"
    );

    let catalog = SnapshotCatalog::load(&args.snapshot)?;
    let introspector = Introspector::new(catalog, config)?;
    let (model, plan) = introspector.plan().await?;

    let output = formatter::format(args.format, &model, &plan)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, output)?;
            tracing::info!(path = %path.display(), format = %args.format, "output written");
        }
        None => println!("{}", output),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_defaults() {
        let args = Args::try_parse_from(["ormgen", "--snapshot", "catalog.json"]).unwrap();
        assert_eq!(args.snapshot, PathBuf::from("catalog.json"));
        assert_eq!(args.format, OutputFormat::Summary);
        assert!(!args.no_samples);

        let config = args.into_config().unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn test_parse_repeated_flags() {
        let args = Args::try_parse_from([
            "ormgen",
            "-s",
            "catalog.json",
            "--schema",
            "public",
            "--schema",
            "billing",
            "--disable",
            "foreign_keys",
            "--disable",
            "seeds",
            "--base-timestamp",
            "20240101000000",
            "--no-samples",
            "--format",
            "plan",
        ])
        .unwrap();

        let config = args.into_config().unwrap();
        assert_eq!(config.schemas, vec!["public", "billing"]);
        assert_eq!(
            config.disabled_categories,
            vec![MigrationCategory::ForeignKeys, MigrationCategory::Seeds]
        );
        assert!(!config.sample_json);
        assert_eq!(args.format, OutputFormat::Plan);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let result = Args::try_parse_from(["ormgen", "-s", "c.json", "--disable", "sequences"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_timestamp_rejected() {
        let args =
            Args::try_parse_from(["ormgen", "-s", "c.json", "--base-timestamp", "soon"]).unwrap();
        assert!(args.into_config().is_err());
    }

    #[test]
    fn test_config_file_with_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"schemas": ["public"], "skip_tables": ["audit_log"], "max_structure_depth": 3}}"#
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let args = Args::try_parse_from([
            "ormgen",
            "-s",
            "c.json",
            "--config",
            path.as_str(),
            "--skip-table",
            "sessions",
        ])
        .unwrap();

        let config = args.into_config().unwrap();
        assert_eq!(config.schemas, vec!["public"]);
        assert_eq!(config.skip_tables, vec!["audit_log", "sessions"]);
        assert_eq!(config.max_structure_depth, 3);
    }

    #[tokio::test]
    async fn test_run_writes_output() {
        let mut snapshot = tempfile::NamedTempFile::new().unwrap();
        write!(
            snapshot,
            r#"{{"tables": [{{"schema": "public", "name": "users"}}],
                "columns": [{{"schema": "public", "table": "users", "name": "id",
                              "data_type": "integer", "is_primary_key": true}}]}}"#
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("plan.json");

        let args = Args::try_parse_from([
            "ormgen",
            "-s",
            snapshot.path().to_str().unwrap(),
            "--base-timestamp",
            "20240101000000",
            "--format",
            "plan",
            "-o",
            output.to_str().unwrap(),
        ])
        .unwrap();
        run(args).await.unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.contains("20240101000030"));
    }
}
