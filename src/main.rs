//! querygate command-line entry point.
//!
//! Checks candidate SQL from the command line or stdin and runs allowed
//! queries against a read-only SQLite database. Results go to stdout; logs go
//! to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use querygate::config::OutputFormat;
use querygate::extract::extract_sql;
use querygate::history::QueryHistory;
use querygate::schema::Schema;
use querygate::{sanitize, Config, QueryGate, SqlValidator, SqliteEngine, Verdict};
use serde_json::json;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "querygate")]
#[command(version, about = "Safety gate for language-model generated SQL")]
struct Cli {
    /// Output format (overrides QUERYGATE_OUTPUT)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a candidate query and show the sanitized form if allowed
    Check {
        /// SQL text; read from stdin when omitted
        sql: Option<String>,

        /// Treat the input as raw model output and extract the SQL first
        #[arg(long)]
        response: bool,
    },
    /// Print the sanitized form of an allowed query
    Sanitize {
        /// SQL text; read from stdin when omitted
        sql: Option<String>,
    },
    /// Run queries through the gate against a SQLite database (opened read-only)
    Run {
        /// Database file
        #[arg(long)]
        db: PathBuf,

        /// One or more candidate queries; read one from stdin when omitted
        sql: Vec<String>,

        /// Treat each input as raw model output and extract the SQL first
        #[arg(long)]
        response: bool,

        /// Print the recorded gate decisions after running
        #[arg(long)]
        history: bool,
    },
    /// Extract SQL from model output read from stdin
    Extract,
    /// Describe a schema as model context
    Schema {
        /// Path to a JSON file mapping table names to column lists
        #[arg(required_unless_present = "db")]
        path: Option<PathBuf>,

        /// Read the schema from a SQLite database instead
        #[arg(long, conflicts_with = "path")]
        db: Option<PathBuf>,
    },
}

fn main() -> Result<ExitCode> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::from_env();
    let format = cli.format.unwrap_or(config.output);

    match cli.command {
        Commands::Check { sql, response } => {
            let input = read_input(sql)?;
            let candidate = if response {
                extract_sql(&input).unwrap_or_default()
            } else {
                input
            };
            Ok(check(&candidate, format))
        }
        Commands::Sanitize { sql } => {
            let input = read_input(sql)?;
            match SqlValidator::new().check(&input) {
                Verdict::Allowed => {
                    println!("{}", sanitize(&input));
                    Ok(ExitCode::SUCCESS)
                }
                Verdict::Rejected { reason } => {
                    eprintln!("Refusing to sanitize rejected query: {reason}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Extract => {
            let input = read_input(None)?;
            match extract_sql(&input) {
                Some(sql) => {
                    println!("{sql}");
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!("No SQL found in input");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Run {
            db,
            sql,
            response,
            history,
        } => run(&config, format, &db, sql, response, history),
        Commands::Schema { path, db } => {
            let schema = match (path, db) {
                (_, Some(db)) => SqliteEngine::open_read_only(&db)
                    .and_then(|engine| engine.schema())
                    .with_context(|| format!("Failed to read schema from {}", db.display()))?,
                (Some(path), None) => Schema::from_file(&path)
                    .with_context(|| format!("Failed to load schema from {}", path.display()))?,
                (None, None) => anyhow::bail!("Either a schema file or --db is required"),
            };
            match format {
                OutputFormat::Text => print!("{}", schema.describe()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&schema)?),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Validate `sql` and print the verdict.
fn check(sql: &str, format: OutputFormat) -> ExitCode {
    let verdict = SqlValidator::new().check(sql);
    let sanitized = verdict.is_allowed().then(|| sanitize(sql));

    match format {
        OutputFormat::Text => match (&verdict, &sanitized) {
            (Verdict::Rejected { reason }, _) => println!("REJECTED: {reason}"),
            (Verdict::Allowed, Some(sql)) => println!("ALLOWED: {sql}"),
            (Verdict::Allowed, None) => println!("ALLOWED"),
        },
        OutputFormat::Json => {
            let rejection = verdict.rejection();
            let output = json!({
                "allowed": verdict.is_allowed(),
                "reason": rejection.map(|r| r.to_string()).unwrap_or_default(),
                "code": rejection.map(|r| r.code()),
                "sanitized": sanitized,
            });
            println!("{output}");
        }
    }

    if verdict.is_allowed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Run each candidate through the gate and print its result.
fn run(
    config: &Config,
    format: OutputFormat,
    db: &std::path::Path,
    sql: Vec<String>,
    response: bool,
    show_history: bool,
) -> Result<ExitCode> {
    let engine = SqliteEngine::open_read_only(db)
        .with_context(|| format!("Failed to open database {}", db.display()))?
        .with_row_limit(config.max_result_rows);
    let history = Arc::new(QueryHistory::new(config.history_capacity));
    let gate = QueryGate::new(engine, config.max_result_rows).with_history(Arc::clone(&history));

    let inputs = if sql.is_empty() {
        vec![read_input(None)?]
    } else {
        sql
    };

    let mut all_ok = true;
    for input in inputs {
        let candidate = if response {
            extract_sql(&input).unwrap_or_default()
        } else {
            input
        };

        match (gate.run(&candidate), format) {
            (Ok(result), OutputFormat::Text) => {
                println!("{}", result.summary());
                if !result.columns.is_empty() {
                    println!("{}", result.to_markdown_table());
                }
            }
            (Ok(result), OutputFormat::Json) => {
                println!("{}", json!({ "ok": true, "summary": result.summary(), "result": result }));
            }
            (Err(e), OutputFormat::Text) => {
                all_ok = false;
                println!("ERROR: {e}");
                if let Some(hint) = e.suggestion() {
                    eprintln!("hint: {hint}");
                }
            }
            (Err(e), OutputFormat::Json) => {
                all_ok = false;
                println!(
                    "{}",
                    json!({ "ok": false, "error": e.to_string(), "code": e.rejection().map(|r| r.code()) })
                );
            }
        }
    }

    if show_history {
        for entry in history.recent(history.capacity()) {
            println!("{}", serde_json::to_string(&entry)?);
        }
    }

    Ok(if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Use the argument if given, otherwise read all of stdin.
fn read_input(arg: Option<String>) -> Result<String> {
    match arg {
        Some(sql) => Ok(sql),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
    }
}

/// Initialize tracing subscriber with stderr output.
///
/// Logs MUST go to stderr because stdout carries command results.
fn init_logging() {
    let filter = std::env::var("RUST_LOG")
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new("warn,querygate=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
