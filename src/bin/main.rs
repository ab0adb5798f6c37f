//! asksql CLI - Ask questions of a SQLite database in plain language
//!
//! Usage:
//!   asksql ask <question> [--db <file>] [--format text|json]
//!   asksql schema [--db <file>]
//!   asksql check <sql>
//!   asksql seed <file>
//!
//! Examples:
//!   asksql seed talk2data.db
//!   asksql ask "Total revenue by region" --db talk2data.db
//!   asksql check "SELECT * FROM sales; DROP TABLE sales"

use asksql::chart::ChartSpec;
use asksql::config::{Settings, SettingsError};
use asksql::pipeline::{Answer, AnswerError, Pipeline};
use asksql::prompt::render_schema;
use asksql::result::ResultSet;
use asksql::sanitize::{sanitize, CandidateQuery};
use asksql::store::{sample, SqliteStore, Store};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "asksql")]
#[command(about = "asksql - Ask questions of a SQLite database in plain language")]
#[command(version)]
struct Cli {
    /// Path to a config file (defaults to ASKSQL_CONFIG, ./asksql.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question with a single read-only query
    Ask {
        /// The question, in plain language
        question: String,

        /// SQLite database file (overrides store.path)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the schema description sent to the model
    Schema {
        /// SQLite database file (overrides store.path)
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Run a query through the sanitizer only
    Check {
        /// SQL text to check
        sql: String,
    },

    /// Create the sample `sales` table in a database file
    Seed {
        /// SQLite database file (created if missing)
        db: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Query, table, chart and summary as text
    Text,
    /// The whole answer as JSON
    Json,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Ask {
            question,
            db,
            format,
        } => cmd_ask(cli.config, db, &question, format),
        Commands::Schema { db } => cmd_schema(cli.config, db),
        Commands::Check { sql } => cmd_check(&sql),
        Commands::Seed { db } => cmd_seed(db),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(config: Option<PathBuf>) -> Result<Settings, SettingsError> {
    match config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    }
}

fn open_store(settings: &Settings, db: Option<PathBuf>) -> Result<SqliteStore, String> {
    let path = match db {
        Some(path) => path,
        None => settings
            .store
            .resolved_path()
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "no database given; pass --db or set store.path".to_string())?,
    };
    SqliteStore::open(&path).map_err(|e| e.to_string())
}

fn cmd_ask(
    config: Option<PathBuf>,
    db: Option<PathBuf>,
    question: &str,
    format: OutputFormat,
) -> ExitCode {
    let settings = match load_settings(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let (pipeline_config, model) = match (settings.pipeline_config(), settings.model.command_model())
    {
        (Ok(c), Ok(m)) => (c, m),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let store = match open_store(&settings, db) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error starting runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let pipeline = Pipeline::new(store, Arc::new(model), pipeline_config);
    let outcome = runtime.block_on(pipeline.ask(question));

    match (outcome, format) {
        (Ok(answer), OutputFormat::Text) => {
            print_answer(&answer);
            ExitCode::SUCCESS
        }
        (Ok(answer), OutputFormat::Json) => match serde_json::to_string_pretty(&answer) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error encoding answer: {}", e);
                ExitCode::FAILURE
            }
        },
        (Err(e), OutputFormat::Text) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
        (Err(e), OutputFormat::Json) => {
            println!("{}", error_json(&e));
            ExitCode::FAILURE
        }
    }
}

fn error_json(err: &AnswerError) -> serde_json::Value {
    let mut value = serde_json::json!({
        "error": err.kind(),
        "message": err.to_string(),
    });
    if let AnswerError::RejectedQuery(rejection) = err {
        value["rule"] = rejection.rule.name().into();
        value["sql"] = rejection.sql.clone().into();
    }
    value
}

fn print_answer(answer: &Answer) {
    println!("SQL:");
    println!("  {}", answer.query);
    println!();

    print_table(&answer.result);
    println!();

    match &answer.chart {
        ChartSpec::None => println!("Chart: none"),
        ChartSpec::TimeSeries { x, y } => println!("Chart: time series of {} over {}", y, x),
        ChartSpec::CategoricalBar { category, value } => {
            println!("Chart: bar of {} by {}", value, category)
        }
    }
    println!("Summary: {}", answer.summary.text);

    for warning in &answer.warnings {
        eprintln!("Warning: {}", warning);
    }
}

fn print_table(result: &ResultSet) {
    println!("{}", render_table(result));
}

fn render_table(result: &ResultSet) -> String {
    let mut builder = Builder::default();
    builder.push_record(result.columns().iter().map(|c| c.name.as_str()));
    for row in result.rows() {
        builder.push_record(row.iter().map(|v| v.to_string()));
    }
    builder.build().with(Style::rounded()).to_string()
}

fn cmd_schema(config: Option<PathBuf>, db: Option<PathBuf>) -> ExitCode {
    let settings = match load_settings(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let schema = open_store(&settings, db)
        .and_then(|store| store.introspect().map_err(|e| e.to_string()));
    match schema {
        Ok(schema) => {
            println!("{}", render_schema(&schema));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_check(sql: &str) -> ExitCode {
    match sanitize(CandidateQuery::new(sql)) {
        Ok(query) => {
            println!("OK: {}", query);
            ExitCode::SUCCESS
        }
        Err(rejection) => {
            eprintln!("{}", rejection);
            ExitCode::FAILURE
        }
    }
}

fn cmd_seed(db: PathBuf) -> ExitCode {
    let conn = match rusqlite::Connection::open(&db) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error opening '{}': {}", db.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match sample::seed_sample_sales(&conn) {
        Ok(0) => {
            println!("OK: sales already populated in {}", db.display());
            ExitCode::SUCCESS
        }
        Ok(n) => {
            println!("OK: inserted {} rows into sales in {}", n, db.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error seeding '{}': {}", db.display(), e);
            ExitCode::FAILURE
        }
    }
}
