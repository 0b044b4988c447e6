pub mod cli;
pub mod config;
pub mod data;
pub mod distribution;
pub mod error;
pub mod io_utils;
pub mod issues;
pub mod loader;
pub mod missingness;
pub mod profile;
pub mod report;
pub mod score;
pub mod sentinel;
pub mod types;

use std::{env, io::Write, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, InputArgs},
    config::ProfileConfig,
    data::TableSnapshot,
    loader::LoadOptions,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("table_profiler", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Profile(args) => handle_profile(&args),
        Commands::Infer(args) => handle_infer(&args),
        Commands::Config(args) => handle_config(args.config.as_deref()),
    }
}

fn handle_profile(args: &cli::ProfileArgs) -> Result<()> {
    let config = load_config(args.input.config.as_deref())?;
    let table_name = args
        .table
        .clone()
        .unwrap_or_else(|| io_utils::table_name_from_path(&args.input.input));
    let snapshot = load_input(&args.input, &table_name)?;
    let result = profile::profile(&snapshot, &config)
        .with_context(|| format!("Profiling table '{table_name}'"))?;

    let mut writer = io_utils::open_output(args.output.as_deref())?;
    report::write_report(&result, args.format, &mut writer)?;
    info!(
        "Profiled {} row(s) across {} column(s) of '{}': {} ({} issue(s))",
        result.summary.row_count,
        result.summary.variable_count,
        table_name,
        result.summary.quality_score,
        result.issues.len()
    );
    Ok(())
}

fn handle_infer(args: &cli::InferArgs) -> Result<()> {
    let config = load_config(args.input.config.as_deref())?;
    let table_name = io_utils::table_name_from_path(&args.input.input);
    let snapshot = load_input(&args.input, &table_name)?;
    let inferred = snapshot
        .columns()
        .iter()
        .map(|column| {
            (
                column.name.clone(),
                types::infer(&column.cells, &column.name, &config),
            )
        })
        .collect::<Vec<_>>();
    print!("{}", report::render_types(&inferred));
    info!(
        "Inferred types for {} column(s) from {} row(s)",
        inferred.len(),
        snapshot.row_count()
    );
    Ok(())
}

fn handle_config(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    let yaml = config.to_yaml_string()?;
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(yaml.as_bytes())
        .context("Writing configuration")?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ProfileConfig> {
    match path {
        Some(path) => {
            debug!("Loading profiling configuration from {path:?}");
            ProfileConfig::load(path)
        }
        None => Ok(ProfileConfig::default()),
    }
}

fn load_input(args: &InputArgs, table_name: &str) -> Result<TableSnapshot> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Reading '{}' with delimiter '{}' and encoding {}",
        args.input.display(),
        printable_delimiter(delimiter),
        encoding.name()
    );
    let options = LoadOptions {
        delimiter,
        encoding,
        na_tokens: args.na_tokens.clone(),
        limit: args.limit,
    };
    loader::load_table(&args.input, table_name, &options)
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
