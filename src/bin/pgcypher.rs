//! pgcypher: translate graph queries from the command line
//!
//! # Usage
//!
//! ```bash
//! # Print the generated SQL
//! pgcypher "MATCH (p:Person) WHERE p.age > 30 RETURN p.name"
//!
//! # Positional parameters instead of inline literals
//! pgcypher "MATCH (p:Person {name: \"Ada\"}) RETURN p" --format params
//!
//! # Read the query from stdin
//! cat query.cypher | pgcypher -
//! ```

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use pgcypher::fragment::quote_literal;
use pgcypher::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pgcypher")]
#[command(version)]
#[command(about = "Translate graph MATCH queries into PostgreSQL", long_about = None)]
#[command(after_help = "EXAMPLES:
    pgcypher 'MATCH (p:Person) RETURN p.name'
    pgcypher 'MATCH (a)-[:KNOWS]->(b) WHERE b.age > 30 RETURN b' --format params
    pgcypher explain 'MATCH (c:City)<-[:LIVES_IN]-(p) RETURN p'")]
struct Cli {
    /// The query to translate, or `-` to read it from stdin
    query: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "sql")]
    format: OutputFormat,

    /// Fail on text that would otherwise be skipped
    #[arg(long)]
    strict: bool,

    /// Configuration file
    #[arg(short, long, env = "PGCYPHER_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// SQL with inline literals
    Sql,
    /// SQL with positional parameters, followed by the parameter list
    Params,
    /// Fragment sequence as JSON
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the clauses, pattern and SQL of a query
    Explain {
        /// The query to explain
        query: String,
    },
    /// Print the active configuration
    Schema,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "pgcypher=debug" } else { "pgcypher=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if cli.strict {
        config.strict = true;
    }

    match &cli.command {
        Some(Commands::Explain { query }) => explain_query(&config, &read_query(query)?),
        Some(Commands::Schema) => {
            println!("{}", config.to_toml()?);
            Ok(())
        }
        None => match &cli.query {
            Some(query) => translate_query(&config, &read_query(query)?, cli.format),
            None => {
                println!("{}", "pgcypher: graph patterns over PostgreSQL".cyan().bold());
                println!();
                println!("Usage: pgcypher <QUERY> [OPTIONS]");
                println!();
                println!("Try: pgcypher --help");
                Ok(())
            }
        },
    }
}

fn read_query(arg: &str) -> anyhow::Result<String> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn translate_query(config: &Config, query: &str, format: OutputFormat) -> anyhow::Result<()> {
    let generated = config.translator().translate(query)?;

    match format {
        OutputFormat::Sql => println!("{}", generated.to_sql()),
        OutputFormat::Params => {
            let rendered = generated.to_parameterized();
            println!("{}", rendered.sql);
            for (i, param) in rendered.params.iter().enumerate() {
                match param {
                    Param::Value(v) => println!("  ${} = {}", i + 1, quote_literal(v).yellow()),
                    Param::Named(n) => println!("  ${} = {}", i + 1, format!("${}", n).cyan()),
                }
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&generated)?),
    }
    Ok(())
}

fn explain_query(config: &Config, query: &str) -> anyhow::Result<()> {
    let translator = config.translator();
    let mut names = SequentialNames::new();
    let parsed = translator.parse_with(query, &mut names)?;

    println!("{}", "Query Explanation".cyan().bold());
    println!();
    println!("{} {}", "Normalized:".dimmed(), parsed.normalized.yellow());
    println!();
    println!("{}", "Clauses:".green().bold());
    println!("  {} {}", "MATCH: ".dimmed(), parsed.match_clause.white());
    if !parsed.where_clause.is_empty() {
        println!("  {} {}", "WHERE: ".dimmed(), parsed.where_clause.white());
    }
    println!("  {} {}", "RETURN:".dimmed(), parsed.return_clause.white());

    println!();
    println!("{}", "Nodes:".green().bold());
    for (i, node) in parsed.pattern.nodes.iter().enumerate() {
        let base = if i == 0 { " (base)".dimmed().to_string() } else { String::new() };
        println!(
            "  • {}{}{}",
            node.variable.cyan(),
            node.label.as_ref().map(|l| format!(":{}", l)).unwrap_or_default().white(),
            base
        );
        for (key, value) in node.properties.iter() {
            println!("      {} = {}", key.white(), value.yellow());
        }
    }

    if !parsed.pattern.relationships.is_empty() {
        println!();
        println!("{}", "Relationships:".green().bold());
        for rel in &parsed.pattern.relationships {
            let arrow = match rel.direction {
                Direction::Outgoing => "->",
                Direction::Incoming => "<-",
            };
            println!(
                "  • {} {} {} {}{}",
                rel.source.cyan(),
                arrow,
                rel.target.cyan(),
                rel.alias().white(),
                rel.rel_type.as_ref().map(|t| format!(":{}", t)).unwrap_or_default().white(),
            );
            for (key, value) in rel.properties.iter() {
                println!("      {} = {}", key.white(), value.yellow());
            }
        }
    }

    // A fresh sequential generator reproduces the names printed above.
    let generated = translator.translate_with(query, &mut SequentialNames::new())?;
    println!();
    println!("{}", "Generated SQL:".green().bold());
    println!("  {}", generated.to_sql().white());
    Ok(())
}
