use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::loader::DEFAULT_NA_TOKEN;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Profile tabular snapshots for type, missingness and quality issues",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Profile one table: missingness, sentinels, distributions, issues and a quality score
    Profile(ProfileArgs),
    /// Print the inferred logical type of every column
    Infer(InferArgs),
    /// Print the fully resolved profiling configuration as YAML
    Config(ConfigArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Options shared by every command that reads a table.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Input CSV/TSV file (`-` reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Cell text treated as an explicit missing value; repeat for several tokens
    #[arg(
        long = "na-token",
        action = clap::ArgAction::Append,
        default_values_t = [DEFAULT_NA_TOKEN.to_string()]
    )]
    pub na_tokens: Vec<String>,
    /// Limit number of rows read
    #[arg(long)]
    pub limit: Option<usize>,
    /// YAML profiling configuration
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Table name recorded on issues and the summary (defaults to the file stem)
    #[arg(short = 't', long = "table")]
    pub table: Option<String>,
    /// Report format
    #[arg(short = 'f', long = "format", value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
    /// Output file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct InferArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// YAML profiling configuration to resolve (defaults only when omitted)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "pipe" | "|" => Ok(b'|'),
        "semicolon" | ";" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn parse_delimiter_accepts_names_and_characters() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("pipe"), Ok(b'|'));
        assert_eq!(parse_delimiter(":"), Ok(b':'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("é").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn profile_defaults() {
        let cli = Cli::try_parse_from(["table-profiler", "profile", "-i", "data.csv"]).unwrap();
        let Commands::Profile(args) = cli.command else {
            panic!("expected profile command");
        };
        assert_eq!(args.format, OutputFormat::Table);
        assert_eq!(args.input.na_tokens, vec!["NA".to_string()]);
        assert!(args.table.is_none());
    }

    #[test]
    fn repeated_na_tokens_replace_default() {
        let cli = Cli::try_parse_from([
            "table-profiler",
            "infer",
            "-i",
            "data.csv",
            "--na-token",
            ".",
            "--na-token",
            "NULL",
        ])
        .unwrap();
        let Commands::Infer(args) = cli.command else {
            panic!("expected infer command");
        };
        assert_eq!(args.input.na_tokens, vec![".".to_string(), "NULL".to_string()]);
    }
}
