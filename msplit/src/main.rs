//! msplit: split a large table by querying its metadata.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use metasplit::CrossSourceMode;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

mod commands;

#[derive(Parser)]
#[command(name = "msplit")]
#[command(about = "Select columns of a table with queries over metadata tables")]
#[command(version)]
struct Cli {
    /// Config file (default: $METASPLIT_CONFIG or the platform config dir)
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    /// Log debug details
    #[arg(short = 'v', long = "verbose", global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short = 'q', long = "quiet", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the columns selected by metadata queries
    #[command(visible_alias = "s")]
    Split {
        /// Metadata query: <path>@<id-column><clauses>, e.g. meta.csv@id?group=a&batch!=[1,2]
        #[arg(short = 'm', long = "meta", required = true)]
        queries: Vec<String>,

        /// Table to take columns from
        input: PathBuf,

        /// Where to write the selected columns
        output: PathBuf,

        /// Skip selected identifiers missing from the input instead of failing
        #[arg(long = "ignore-missing")]
        ignore_missing: bool,

        /// Delimiter of the input table (default from config, usually ',')
        #[arg(short = 'd', long = "delimiter", value_parser = parse_delimiter_arg)]
        delimiter: Option<char>,

        /// Delimiter of the metadata tables
        #[arg(long = "metadata-delimiter", value_parser = parse_delimiter_arg)]
        metadata_delimiter: Option<char>,

        /// Column to extract regardless of the queries (repeatable)
        #[arg(short = 'a', long = "always-include")]
        always_include: Vec<String>,

        /// Combine queries: union (any query) or intersect (every query)
        #[arg(long = "cross-source-mode", value_parser = parse_mode_arg)]
        cross_source_mode: Option<CrossSourceMode>,

        /// Shortcut for --cross-source-mode intersect
        #[arg(long = "intersect", conflicts_with = "cross_source_mode")]
        intersect: bool,

        /// Program used to read and project tables
        #[arg(long = "xsv")]
        xsv: Option<PathBuf>,

        /// Show the selected columns without extracting them
        #[arg(short = 'n', long = "dry-run")]
        dry_run: bool,
    },

    /// Show how metadata queries are parsed
    #[command(visible_alias = "e")]
    Explain {
        /// Metadata queries to parse
        #[arg(required = true)]
        queries: Vec<String>,

        /// Output format: table, json
        #[arg(short = 'f', long = "format", default_value = "table")]
        format: String,
    },
}

fn parse_delimiter_arg(s: &str) -> Result<char, String> {
    metasplit::parse_delimiter(s).map_err(|e| e.to_string())
}

fn parse_mode_arg(s: &str) -> Result<CrossSourceMode, String> {
    s.parse::<CrossSourceMode>().map_err(|e| e.to_string())
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else if quiet {
        LevelFilter::WARN
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Split {
            queries,
            input,
            output,
            ignore_missing,
            delimiter,
            metadata_delimiter,
            always_include,
            cross_source_mode,
            intersect,
            xsv,
            dry_run,
        } => {
            let opts = commands::SplitArgs {
                ignore_missing,
                delimiter,
                metadata_delimiter,
                always_include,
                cross_source_mode: cross_source_mode
                    .or(intersect.then_some(CrossSourceMode::Intersect)),
                xsv,
                dry_run,
            };
            commands::split(cli.config.as_deref(), &queries, &input, &output, opts)
        }
        Commands::Explain { queries, format } => commands::explain(&queries, &format),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
