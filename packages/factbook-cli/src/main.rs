//! Factbook CLI - terminal client for the factbook marketing backend.
//!
//! Browses factbooks, strategies, activities and LLM logs, kicks off
//! generation, and runs the streaming chat assistant in the terminal.

mod chat;
mod config;
mod render;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use factbook_core::api::FactbookClient;
use factbook_core::library::{
    filter_logs, shape_strategies, strategy_type_label, LogFilter, LogStats, StrategyFilter,
    StrategySort,
};
use factbook_core::{CreateFactbookRequest, CreateStrategyRequest, Factbook, Strategy};

use config::Config;
use render::render_markdown;

#[derive(Parser)]
#[command(name = "factbook")]
#[command(about = "Factbook marketing library - browse, generate, chat")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides config and FACTBOOK_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Factbook commands
    Factbook {
        #[command(subcommand)]
        action: FactbookAction,
    },
    /// Strategy commands
    Strategy {
        #[command(subcommand)]
        action: StrategyAction,
    },
    /// Show the recent activity feed
    Activities {
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = 6)]
        limit: usize,
    },
    /// Show backend LLM invocation logs
    Logs {
        #[arg(long, default_value_t = 200)]
        limit: usize,
        /// Filter by status (success, error)
        #[arg(long)]
        status: Option<String>,
        /// Filter by model name
        #[arg(long)]
        llm_type: Option<String>,
        /// Substring search over prompt type, user and error message
        #[arg(long)]
        search: Option<String>,
    },
    /// Chat with the strategy assistant
    Chat {
        /// Strategy the answers should reference
        #[arg(long)]
        strategy: Option<i64>,
    },
}

#[derive(Subcommand)]
enum FactbookAction {
    /// List all factbooks
    List,
    /// Show a factbook's research sections
    Show {
        id: i64,
        /// Render a single section by its key
        #[arg(long)]
        section: Option<String>,
    },
    /// Delete a factbook
    Delete { id: i64 },
    /// Duplicate a factbook
    Duplicate { id: i64 },
    /// List the strategies derived from a factbook
    Strategies { id: i64 },
    /// Generate a new factbook
    Create {
        #[arg(long)]
        creator: String,
        #[arg(long)]
        brand: String,
        #[arg(long)]
        industry: String,
        #[arg(long)]
        description: Option<String>,
        /// RFP document to upload
        #[arg(long)]
        rfp: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum StrategyAction {
    /// List strategies, with local filtering and sorting
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        industry: Option<String>,
        #[arg(long = "type")]
        strategy_type: Option<String>,
        #[arg(long, value_enum, default_value = "latest")]
        sort: SortArg,
    },
    /// Show a strategy
    Show { id: i64 },
    /// Delete a strategy
    Delete { id: i64 },
    /// Duplicate a strategy
    Duplicate { id: i64 },
    /// Generate a new strategy from a factbook
    Create {
        #[arg(long)]
        factbook: i64,
        #[arg(long = "type")]
        strategy_type: String,
        #[arg(long)]
        objective: Option<String>,
        #[arg(long)]
        creator: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Reference documents to upload (repeatable)
        #[arg(long = "file")]
        files: Vec<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Latest,
    Oldest,
    Name,
    Kind,
    Views,
}

impl From<SortArg> for StrategySort {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Latest => StrategySort::Latest,
            SortArg::Oldest => StrategySort::Oldest,
            SortArg::Name => StrategySort::Name,
            SortArg::Kind => StrategySort::Kind,
            SortArg::Views => StrategySort::Views,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    let client = FactbookClient::with_timeout(
        &config.api_url,
        Duration::from_secs(config.request_timeout_secs),
    )?;

    match cli.command {
        Commands::Factbook { action } => run_factbook(&client, action).await,
        Commands::Strategy { action } => run_strategy(&client, action).await,
        Commands::Activities { offset, limit } => {
            let activities = client.recent_activities(offset, limit).await?;
            if activities.is_empty() {
                println!("no recent activity");
            }
            for activity in activities {
                println!(
                    "[{}] {} — {} ({})",
                    activity.kind, activity.title, activity.description, activity.time
                );
            }
            Ok(())
        }
        Commands::Logs {
            limit,
            status,
            llm_type,
            search,
        } => {
            let logs = client.llm_logs(limit).await?;
            let filter = LogFilter {
                search,
                status,
                llm_type,
            };
            let filtered = filter_logs(&logs, &filter);
            for log in &filtered {
                println!(
                    "{:>6}  {}  {:<20} {:<24} {:>8}  {:>7}  {}",
                    log.id,
                    fmt_time(&log.created_at),
                    log.llm_type,
                    log.prompt_type,
                    log.total_tokens.map_or("-".to_string(), |t| t.to_string()),
                    log.elapsed_time
                        .map_or("-".to_string(), |t| format!("{t:.1}s")),
                    log.status,
                );
                if let Some(error) = &log.error_message {
                    println!("        error: {error}");
                }
            }

            let stats = LogStats::compute(&filtered);
            println!(
                "\n{} calls ({} success, {} failed), {} tokens total, avg {:.1}s",
                stats.total, stats.success, stats.failed, stats.total_tokens, stats.average_elapsed
            );
            Ok(())
        }
        Commands::Chat { strategy } => chat::run(client, strategy).await,
    }
}

async fn run_factbook(client: &FactbookClient, action: FactbookAction) -> Result<()> {
    match action {
        FactbookAction::List => {
            let factbooks = client.list_factbooks().await?;
            for factbook in &factbooks {
                println!(
                    "{:>5}  {:<24} {:<16} {:>5} views  {}",
                    factbook.id,
                    factbook.brand_name,
                    factbook.industry.as_deref().unwrap_or("-"),
                    factbook.views,
                    fmt_time(&factbook.created_at),
                );
            }
            println!("\n{} factbooks", factbooks.len());
        }
        FactbookAction::Show { id, section } => {
            let factbook = client.get_factbook(id).await?;
            print_factbook(&factbook, section.as_deref());
        }
        FactbookAction::Delete { id } => {
            client.delete_factbook(id).await?;
            println!("deleted factbook {id}");
        }
        FactbookAction::Duplicate { id } => {
            let copy = client.duplicate_factbook(id).await?;
            println!("duplicated factbook {id} -> {}", copy.id);
        }
        FactbookAction::Strategies { id } => {
            let strategies = client.factbook_strategies(id).await?;
            print_strategy_rows(&strategies.iter().collect::<Vec<_>>());
        }
        FactbookAction::Create {
            creator,
            brand,
            industry,
            description,
            rfp,
        } => {
            let request = CreateFactbookRequest {
                creator_name: creator,
                brand_name: brand,
                industry,
                description,
                rfp_file: rfp,
            };
            println!("generating factbook, this can take a while...");
            let factbook = client.generate_factbook(&request).await?;
            println!("created factbook {} ({})", factbook.id, factbook.brand_name);
        }
    }
    Ok(())
}

async fn run_strategy(client: &FactbookClient, action: StrategyAction) -> Result<()> {
    match action {
        StrategyAction::List {
            search,
            industry,
            strategy_type,
            sort,
        } => {
            let strategies = client.list_strategies().await?;
            let filter = StrategyFilter {
                search,
                industry,
                strategy_type,
            };
            let shaped = shape_strategies(&strategies, &filter, sort.into());
            print_strategy_rows(&shaped);
        }
        StrategyAction::Show { id } => {
            let strategy = client.get_strategy(id).await?;
            print_strategy(&strategy);
        }
        StrategyAction::Delete { id } => {
            client.delete_strategy(id).await?;
            println!("deleted strategy {id}");
        }
        StrategyAction::Duplicate { id } => {
            let copy = client.duplicate_strategy(id).await?;
            println!("duplicated strategy {id} -> {}", copy.id);
        }
        StrategyAction::Create {
            factbook,
            strategy_type,
            objective,
            creator,
            description,
            files,
        } => {
            let request = CreateStrategyRequest {
                factbook_id: factbook,
                strategy_type,
                objective,
                creator,
                description,
                files,
            };
            println!("generating strategy, this can take a while...");
            let strategy = client.generate_strategy(&request).await?;
            println!("created strategy {} ({})", strategy.id, strategy.title);
        }
    }
    Ok(())
}

fn print_strategy_rows(strategies: &[&Strategy]) {
    for strategy in strategies {
        println!(
            "{:>5}  {:<32} {:<28} {:<16} {:>5} views  {}",
            strategy.id,
            strategy.title,
            strategy_type_label(&strategy.strategy_type),
            strategy.brand_name.as_deref().unwrap_or("-"),
            strategy.views,
            fmt_time(&strategy.created_at),
        );
    }
    println!("\n{} strategies", strategies.len());
}

fn print_strategy(strategy: &Strategy) {
    println!("# {} (strategy {})", strategy.title, strategy.id);
    println!(
        "{} | {} | factbook {} | by {} | {}",
        strategy_type_label(&strategy.strategy_type),
        strategy.brand_name.as_deref().unwrap_or("-"),
        strategy.factbook_id,
        strategy.creator,
        fmt_time(&strategy.created_at),
    );
    if let Some(description) = &strategy.description {
        println!("\n{description}");
    }

    let bodies = [
        ("Problem", &strategy.problem),
        ("Insight", &strategy.insight),
        ("Goal & Target", &strategy.goal_target),
        ("Direction", &strategy.direction),
        ("Execution", &strategy.execution),
    ];
    for (title, value) in bodies {
        if let Some(text) = value_text(value) {
            println!("\n== {title} ==");
            print!("{}", render_markdown(&text));
        }
    }
}

fn print_factbook(factbook: &Factbook, only_section: Option<&str>) {
    println!("# {} (factbook {})", factbook.brand_name, factbook.id);
    println!(
        "{} | by {} | {} views | {}",
        factbook.industry.as_deref().unwrap_or("-"),
        factbook.creator_name.as_deref().unwrap_or("-"),
        factbook.views,
        fmt_time(&factbook.created_at),
    );
    if let Some(description) = &factbook.description {
        println!("\n{description}");
    }

    let mut keys: Vec<&String> = factbook.sections.keys().collect();
    keys.sort();

    let mut shown = 0;
    for key in &keys {
        if let Some(wanted) = only_section {
            if key.as_str() != wanted {
                continue;
            }
        }
        if let Some(section) = factbook.section(key) {
            println!("\n== {} ==", section.title);
            print!("{}", render_markdown(&section.content.text()));
            shown += 1;
        }
    }

    if shown == 0 {
        if let Some(wanted) = only_section {
            println!("\nno section named {wanted:?}; available: {keys:?}");
        }
    }
}

/// Print a JSON strategy body as text: strings verbatim, anything else as
/// pretty JSON, nulls omitted.
fn value_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(text) => Some(text.clone()),
        other => serde_json::to_string_pretty(other).ok(),
    }
}

fn fmt_time(time: &Option<NaiveDateTime>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}
