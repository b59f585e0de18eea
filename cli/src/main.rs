mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::commands::{
    EntryEdit, cmd_add, cmd_add_json, cmd_category, cmd_chart, cmd_delete, cmd_edit, cmd_list,
    parse_date, store_failure,
};
use crate::config::Config;
use kcal_core::models::Category;
use kcal_core::store::EntryStore;

#[derive(Parser)]
#[command(
    name = "kcal",
    version,
    about = "A simple calorie tracker CLI",
    long_about = "Record meals, edit or delete entries, and review calories per month."
)]
struct Cli {
    /// Path to the database file (default: <data dir>/caloriesdb.db)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,
    /// Log store operations to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a calorie entry
    Add {
        /// Calories (must be greater than 0)
        #[arg(required_unless_present = "from_json")]
        calories: Option<f64>,
        /// What was eaten
        #[arg(required_unless_present = "from_json")]
        description: Option<String>,
        /// Category: breakfast, lunch, dinner, other (default: breakfast)
        #[arg(short, long)]
        category: Option<String>,
        /// Date of the meal (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Read the entry from a JSON object instead of arguments
        #[arg(long, value_name = "JSON", conflicts_with_all = ["calories", "description", "category", "date"])]
        from_json: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change fields of an existing entry
    Edit {
        /// Entry ID to update
        entry_id: i64,
        /// New calories
        #[arg(long)]
        calories: Option<f64>,
        /// New category: breakfast, lunch, dinner, other
        #[arg(short, long)]
        category: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
        /// New date (YYYY-MM-DD or today/yesterday/tomorrow)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an entry by ID
    Delete {
        /// Entry ID to delete
        entry_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the entries of a month
    List {
        /// Month (YYYY-MM, this, last; default: this month)
        month: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Chart calories per day for a month
    Chart {
        /// Month (YYYY-MM, this, last; default: this month)
        month: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all entries of one category
    Category {
        /// Category: breakfast, lunch, dinner, other
        category: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.db)?;
    let store = EntryStore::open(&config.db_path, config.schema_version)
        .await
        .map_err(store_failure)?;

    match cli.command {
        Commands::Add {
            calories,
            description,
            category,
            date,
            from_json,
            json,
        } => match (from_json, calories, description) {
            (Some(raw), _, _) => cmd_add_json(&store, &raw, json).await,
            (None, Some(calories), Some(description)) => {
                cmd_add(&store, calories, &description, category.as_deref(), date, json).await
            }
            _ => anyhow::bail!("Provide <CALORIES> <DESCRIPTION> or --from-json"),
        },
        Commands::Edit {
            entry_id,
            calories,
            category,
            description,
            date,
            json,
        } => {
            let edit = EntryEdit {
                calories,
                category: category.as_deref().map(str::parse::<Category>).transpose()?,
                description,
                date: date.map(Some).map(parse_date).transpose()?,
            };
            cmd_edit(&store, entry_id, edit, json).await
        }
        Commands::Delete { entry_id, json } => cmd_delete(&store, entry_id, json).await,
        Commands::List { month, json } => cmd_list(&store, month.as_deref(), json).await,
        Commands::Chart { month, json } => cmd_chart(&store, month.as_deref(), json).await,
        Commands::Category { category, json } => cmd_category(&store, &category, json).await,
    }
}
