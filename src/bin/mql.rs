//! mql: the card query language CLI
//!
//! # Usage
//!
//! ```bash
//! # Show the SQL for a query
//! mql --schema schema.toml compile "status = open AND owner = current user"
//!
//! # Run it
//! mql --schema schema.toml --database-url sqlite://cards.db run "status = open"
//!
//! # Rewrite a saved filter after a value rename
//! mql --schema schema.toml rename "status = open" Status open "in progress"
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use mql::prelude::*;

#[derive(Parser)]
#[command(name = "mql")]
#[command(version)]
#[command(about = "Card query language: parse, check and compile card filters", long_about = None)]
#[command(after_help = "EXAMPLES:
    mql parse 'status = open OR status = closed'
    mql --schema schema.toml compile 'SELECT status, owner WHERE owner = current user'
    mql --schema schema.toml filters 'WHERE status = open AND size > 3'")]
struct Cli {
    /// Schema snapshot (TOML); overrides the config file
    #[arg(short, long, global = true)]
    schema: Option<PathBuf>,

    /// Config file; defaults to ./mql.toml or the user config dir
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQL dialect: postgres, mysql, sqlite, sqlserver
    #[arg(short, long, global = true)]
    dialect: Option<Dialect>,

    /// Database connection URL
    #[arg(long, env = "MQL_DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a query and print it back in canonical form
    Parse {
        query: String,
        /// Print the syntax tree as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check a query against the schema and show the SQL
    Compile { query: String },
    /// Compile and execute a query
    Run { query: String },
    /// Rewrite a query after a managed value is renamed
    Rename {
        query: String,
        property: String,
        old_value: String,
        new_value: String,
    },
    /// List the property values a query mentions
    Detect { query: String },
    /// Break a simple filter into live filter tuples
    Filters { query: String },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mql=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = dispatch(&cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn dispatch(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;

    match &cli.command {
        Commands::Parse { query, json } => parse_query(query, *json),
        Commands::Compile { query } => {
            let schema = load_schema(&config)?;
            compile_query(query, &schema, &config)
        }
        Commands::Run { query } => {
            let schema = load_schema(&config)?;
            run_query(query, &schema, &config, &cli.format).await
        }
        Commands::Rename {
            query,
            property,
            old_value,
            new_value,
        } => {
            let schema = load_schema(&config)?;
            let renamed = rename_value(query, property, old_value, new_value, &schema)?;
            println!("{}", renamed);
            Ok(())
        }
        Commands::Detect { query } => {
            let schema = load_schema(&config)?;
            detect_values(query, &schema, &cli.format)
        }
        Commands::Filters { query } => {
            let schema = load_schema(&config)?;
            live_filters(query, &schema, &config, &cli.format)
        }
    }
}

/// Config file first, then command-line overrides.
fn load_config(cli: &Cli) -> Result<MqlConfig> {
    let mut config = match &cli.config {
        Some(path) => MqlConfig::load(path)?,
        None => MqlConfig::discover()?,
    };
    if cli.schema.is_some() {
        config.schema = cli.schema.clone();
    }
    if cli.dialect.is_some() {
        config.dialect = cli.dialect;
    }
    if cli.database_url.is_some() {
        config.database_url = cli.database_url.clone();
    }
    Ok(config)
}

fn load_schema(config: &MqlConfig) -> Result<SchemaSnapshot> {
    let Some(path) = &config.schema else {
        bail!("no schema snapshot; pass --schema or set `schema` in mql.toml");
    };
    SchemaSnapshot::load(path).with_context(|| format!("loading {}", path.display()))
}

fn parse_query(query: &str, json: bool) -> Result<()> {
    let parsed = parse(query)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
    } else {
        println!("{}", parsed.to_string().white());
    }
    Ok(())
}

fn compile_query(query: &str, schema: &SchemaSnapshot, config: &MqlConfig) -> Result<()> {
    let compiler = Compiler::new(config.dialect()).with_tables(config.tables());
    let compiled = prepare(query, schema, &config.eval_context(), &compiler)?;

    println!("{}", "Generated SQL:".green().bold());
    println!("{}", compiled.text.white());
    if !compiled.params.is_empty() {
        println!();
        println!("{}", "Bindings:".cyan());
        for (i, param) in compiled.params.iter().enumerate() {
            println!("  {} = {}", i + 1, param.to_string().yellow());
        }
    }
    Ok(())
}

async fn run_query(
    query: &str,
    schema: &SchemaSnapshot,
    config: &MqlConfig,
    format: &OutputFormat,
) -> Result<()> {
    let Some(url) = &config.database_url else {
        bail!("no database URL; use --database-url or set MQL_DATABASE_URL");
    };
    let compiler = Compiler::new(config.dialect()).with_tables(config.tables());
    let db = Executor::connect(url).await?;
    let rows = db
        .query(query, schema, &config.eval_context(), &compiler)
        .await?;
    format_output(&rows, format);
    Ok(())
}

fn detect_values(query: &str, schema: &SchemaSnapshot, format: &OutputFormat) -> Result<()> {
    let resolved = resolve(parse(query)?, schema)?;
    let detected = detect(&resolved);

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&detected)?);
        return Ok(());
    }
    if detected.is_empty() {
        println!("{}", "(no property values)".dimmed());
    }
    for (property, values) in detected.iter() {
        let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        println!("{} {}", property.name.cyan(), values.join(", ").yellow());
    }
    Ok(())
}

fn live_filters(
    query: &str,
    schema: &SchemaSnapshot,
    config: &MqlConfig,
    format: &OutputFormat,
) -> Result<()> {
    let filters = extract(query, schema, &config.eval_context())?;

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&filters)?);
        return Ok(());
    }
    for filter in &filters {
        println!(
            "{} {} {}",
            filter.property.cyan(),
            filter.operator.symbol().white(),
            filter.value.as_deref().unwrap_or("NULL").yellow()
        );
    }
    Ok(())
}

fn format_output(results: &[RowMap], format: &OutputFormat) {
    if results.is_empty() {
        println!("{}", "(no results)".dimmed());
        return;
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(results).unwrap_or_default());
        }
        OutputFormat::Table => {
            let mut columns: Vec<&String> = results[0].keys().collect();
            columns.sort();

            let widths: Vec<usize> = columns
                .iter()
                .map(|c| {
                    results
                        .iter()
                        .filter_map(|row| row.get(*c))
                        .map(|v| val_to_string(v).len())
                        .fold(c.len(), usize::max)
                })
                .collect();

            let header: Vec<String> = columns
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:width$}", c, width = *w))
                .collect();
            println!("{}", header.join(" │ ").white().bold());

            let sep: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
            println!("{}", sep.join("─┼─").dimmed());

            for row in results {
                let cells: Vec<String> = columns
                    .iter()
                    .zip(&widths)
                    .map(|(c, w)| {
                        let val = row.get(*c).map(val_to_string).unwrap_or_default();
                        format!("{:width$}", val, width = *w)
                    })
                    .collect();
                println!("{}", cells.join(" │ "));
            }

            println!();
            println!("{} row(s) returned", results.len().to_string().cyan());
        }
    }
}

fn val_to_string(val: &serde_json::Value) -> String {
    match val {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        _ => val.to_string(),
    }
}
