//! Command implementations for msplit.

use std::path::{Path, PathBuf};

use metasplit::{Config, CrossSourceMode, MetadataQuery, SplitOptions, Xsv};
use tracing::debug;

/// Flags of the `split` command that override config values.
pub struct SplitArgs {
    pub ignore_missing: bool,
    pub delimiter: Option<char>,
    pub metadata_delimiter: Option<char>,
    pub always_include: Vec<String>,
    pub cross_source_mode: Option<CrossSourceMode>,
    pub xsv: Option<PathBuf>,
    pub dry_run: bool,
}

fn load_config(path: Option<&Path>) -> metasplit::Result<Config> {
    match path {
        Some(path) if !path.exists() => Err(metasplit::Error::Config(format!(
            "Config file not found: {}",
            path.display()
        ))),
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn parse_queries(raw: &[String]) -> metasplit::Result<Vec<MetadataQuery>> {
    raw.iter().map(|q| MetadataQuery::new(q)).collect()
}

pub fn split(
    config_path: Option<&Path>,
    raw_queries: &[String],
    input: &Path,
    output: &Path,
    args: SplitArgs,
) -> metasplit::Result<()> {
    let config = load_config(config_path)?;
    debug!(?config, "loaded config");
    let queries = parse_queries(raw_queries)?;

    let mut options = SplitOptions::from_config(&config);
    options.ignore_missing = args.ignore_missing;
    options.always_include = args.always_include;
    if let Some(delimiter) = args.delimiter {
        options.delimiter = delimiter;
    }
    if let Some(delimiter) = args.metadata_delimiter {
        options.metadata_delimiter = delimiter;
    }
    if let Some(mode) = args.cross_source_mode {
        options.cross_source_mode = mode;
    }

    let tool = Xsv::new(args.xsv.unwrap_or(config.xsv));

    if args.dry_run {
        let plan = metasplit::plan(&tool, &queries, input, &options)?;
        println!(
            "Would select {} of {} columns:",
            plan.identifiers.len(),
            plan.target_columns
        );
        for id in &plan.identifiers {
            println!("  {}", id);
        }
        println!("Column spec: {}", plan.spec);
        return Ok(());
    }

    let plan = metasplit::run(&tool, &queries, input, output, &options)?;
    println!("Selected {} columns.", plan.identifiers.len());
    println!("Done!");
    Ok(())
}

pub fn explain(raw_queries: &[String], format: &str) -> metasplit::Result<()> {
    let queries = parse_queries(raw_queries)?;

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&queries).map_err(|e| {
                metasplit::Error::Config(format!("Failed to serialize queries: {}", e))
            })?;
            println!("{}", json);
        }
        "table" => {
            for (i, query) in queries.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                println!("{}", query);
                println!("  source:    {}", query.source().display());
                println!("  id column: {}", query.id_column());
                for clause in query.clauses() {
                    println!(
                        "  {:<9}  {} {} [{}]",
                        format!("{:?}", clause.combinator).to_lowercase(),
                        clause.filter_variable,
                        clause.comparator,
                        clause.filter_values.join(", ")
                    );
                }
            }
        }
        other => {
            return Err(metasplit::Error::Config(format!(
                "Unknown format '{}': expected table or json",
                other
            )));
        }
    }

    Ok(())
}
