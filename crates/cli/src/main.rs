use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use reco_client::{CatalogItem, RecommendationClient, RecommendedItem, DEFAULT_ROOT_URI};
use tracing::debug;
use workflow::config::{default_resources_dir, default_seed_items, DEFAULT_MODEL_NAME};
use workflow::{WorkflowConfig, WorkflowEvent, WorkflowOrchestrator};

/// Log filter used when `RUST_LOG` is not set
const DEFAULT_LOG_FILTER: &str = "info";

/// Recommendations demo - walks a hosted recommendation model through its lifecycle
#[derive(Parser)]
#[command(name = "reco-demo")]
#[command(about = "Demo client for the hosted recommendations service", long_about = None)]
struct Cli {
    /// Account email used as the Basic credential identity
    #[arg(long, env = "RECO_EMAIL")]
    email: String,

    /// Account key used as the Basic credential secret
    #[arg(long, env = "RECO_ACCOUNT_KEY", hide_env_values = true)]
    account_key: String,

    /// Root of the recommendations API
    #[arg(long, env = "RECO_BASE_URL", default_value = DEFAULT_ROOT_URI)]
    base_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full demo: create, import, build, recommend, delete
    Run(RunArgs),

    /// Create an empty model container and print its id
    Create {
        #[arg(long, default_value = DEFAULT_MODEL_NAME)]
        model_name: String,
    },

    /// Show the status of one build
    Status {
        #[arg(long)]
        model_id: String,

        #[arg(long)]
        build_id: String,
    },

    /// Get recommendations for one or more catalog items
    Recommend {
        #[arg(long)]
        model_id: String,

        /// Seed item ids
        #[arg(long = "item", required = true)]
        items: Vec<String>,

        /// Number of recommendations to return
        #[arg(long, default_value = "5")]
        results: u32,

        /// Ask the service to include item metadata
        #[arg(long)]
        include_metadata: bool,
    },

    /// Delete a model container
    Delete {
        #[arg(long)]
        model_id: String,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Name of the model container to create
    #[arg(long, default_value = DEFAULT_MODEL_NAME)]
    model_name: String,

    /// Directory holding catalog.txt and usage.txt
    #[arg(long, env = "RECO_RESOURCES_DIR")]
    resources_dir: Option<PathBuf>,

    /// Seconds between two build status checks
    #[arg(long, default_value = "30")]
    poll_interval_secs: u64,

    /// Give up after this many status checks (default: wait for the build)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_polls: Option<u32>,

    /// Seconds to wait after the build before querying recommendations
    #[arg(long, default_value = "20")]
    settle_secs: u64,

    /// Number of recommendations per query
    #[arg(long, default_value = "5")]
    results: u32,

    /// Seed item as ID:NAME (repeatable)
    #[arg(long = "seed", value_name = "ID:NAME")]
    seeds: Vec<CatalogItem>,
}

impl RunArgs {
    fn into_config(self) -> WorkflowConfig {
        WorkflowConfig {
            model_name: self.model_name,
            resources_dir: self.resources_dir.unwrap_or_else(default_resources_dir),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            max_polls: self.max_polls,
            settle_delay: Duration::from_secs(self.settle_secs),
            seed_items: if self.seeds.is_empty() {
                default_seed_items()
            } else {
                self.seeds
            },
            results_per_query: self.results,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials may live in a local .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();

    println!("\nInitializing...");
    let client = RecommendationClient::with_base_url(&cli.base_url, &cli.email, &cli.account_key)
        .context("Failed to initialize the recommendations client")?;

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Run(args) => handle_run(&client, args).await?,
        Commands::Create { model_name } => handle_create(&client, &model_name).await?,
        Commands::Status { model_id, build_id } => {
            handle_status(&client, &model_id, &build_id).await?
        }
        Commands::Recommend {
            model_id,
            items,
            results,
            include_metadata,
        } => handle_recommend(&client, &model_id, &items, results, include_metadata).await?,
        Commands::Delete { model_id } => handle_delete(&client, &model_id).await?,
    }

    Ok(())
}

/// Handle the 'run' command
async fn handle_run(client: &RecommendationClient, args: RunArgs) -> Result<()> {
    println!(
        "{}",
        "Welcome to the recommendations demo!".bold().blue()
    );

    let config = args.into_config();
    debug!("resources directory: {}", config.resources_dir.display());

    let orchestrator = WorkflowOrchestrator::new(config);
    let summary = orchestrator
        .run(client, print_event)
        .await
        .context("Demo workflow aborted")?;

    println!(
        "\n{} Demo finished: build {} of model {} ended with {}",
        "✓".green(),
        summary.build_id,
        summary.model_id,
        summary.build_status
    );
    Ok(())
}

/// Handle the 'create' command
async fn handle_create(client: &RecommendationClient, model_name: &str) -> Result<()> {
    let model_id = client
        .create_model(model_name)
        .await
        .with_context(|| format!("Failed to create model {model_name}"))?;
    println!("\tModel '{}' created with ID: {}", model_name, model_id.bold());
    Ok(())
}

/// Handle the 'status' command
async fn handle_status(client: &RecommendationClient, model_id: &str, build_id: &str) -> Result<()> {
    let status = client
        .get_build_status(model_id, build_id)
        .await
        .with_context(|| format!("Failed to get status of build {build_id}"))?;
    println!("\tbuild {} of model {}: {}", build_id, model_id, status.to_string().bold());
    Ok(())
}

/// Handle the 'recommend' command
async fn handle_recommend(
    client: &RecommendationClient,
    model_id: &str,
    items: &[String],
    results: u32,
    include_metadata: bool,
) -> Result<()> {
    let recommended = client
        .get_recommendation_with(model_id, items, results, include_metadata)
        .await
        .context("Failed to get recommendations")?;
    println!("\n\tRecommendations for [{}]", items.join("] + ["));
    print_recommended(&recommended);
    Ok(())
}

/// Handle the 'delete' command
async fn handle_delete(client: &RecommendationClient, model_id: &str) -> Result<()> {
    client
        .delete_model(model_id)
        .await
        .with_context(|| format!("Failed to delete model {model_id}"))?;
    println!("\tModel with ID: {} deleted", model_id);
    Ok(())
}

/// Render one workflow progress event
fn print_event(event: WorkflowEvent) {
    match event {
        WorkflowEvent::CreatingModel { name } => {
            println!("\nCreating model container {}...", name);
        }
        WorkflowEvent::ModelCreated { name, model_id } => {
            println!("\tModel '{}' created with ID: {}", name, model_id.bold());
        }
        WorkflowEvent::ImportingData => {
            println!("\nImporting catalog and usage data...");
        }
        WorkflowEvent::FileImported(report) => {
            println!("\t{}", report);
        }
        WorkflowEvent::BuildTriggered { model_id, build_id } => {
            println!("\nTrigger build for model '{}'", model_id);
            println!("\ttriggered build id '{}'", build_id);
            println!("\nMonitoring build '{}'", build_id);
        }
        WorkflowEvent::BuildStatusChecked { status, next_check } => match next_check {
            Some(wait) => println!(
                "\tstatus: {} --> will check again in {} secs...",
                status.to_string().yellow(),
                wait.as_secs()
            ),
            None => println!("\tstatus: {}", status.to_string().bold()),
        },
        // Logged by the build monitor
        WorkflowEvent::BuildFinished { .. } => {}
        WorkflowEvent::WaitingForPropagation(wait) => {
            println!(
                "\nWaiting {} secs for propagation of the built model...",
                wait.as_secs()
            );
        }
        WorkflowEvent::Recommendations { seeds, items } => {
            if seeds.len() == 1 {
                println!("\n\tRecommendation for '{}'", seeds[0]);
            } else {
                let seeds: Vec<String> = seeds.iter().map(ToString::to_string).collect();
                println!("\n\tRecommendations for [{}]", seeds.join("] + ["));
            }
            print_recommended(&items);
        }
        WorkflowEvent::ModelDeleted { name, model_id } => {
            println!("\n\tModel '{}' with ID: {} deleted", name, model_id);
        }
    }
}

/// Helper function to format and print recommended items
fn print_recommended(items: &[RecommendedItem]) {
    if items.is_empty() {
        println!("\t  {}", "(no recommendations)".dimmed());
        return;
    }
    for item in items {
        println!("\t  Id: {}", item.id.green());
        println!("\t  Name: {}", item.name);
        println!("\t  Rating: {}", item.rating);
        println!("\t  Reasoning: {}", item.reasoning);
        println!();
    }
}
