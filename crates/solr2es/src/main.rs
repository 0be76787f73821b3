//! solr2es CLI
//!
//! Copies a Solr core into an Elasticsearch index, directly or buffered
//! through a Redis list.

// CLI tool - relax pedantic lints for ergonomics
#![allow(clippy::pedantic)]

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use solr2es::runtime::{self, CancelFlag, ExecutionMode};
use solr2es::{
    load_json_arg, BulkWriter, DumpResult, ElasticsearchDestination, Migration, MigrationConfig,
    MigrationResult, QueueBuffer, RedisQueue, ResumeConsumer, SolrPager,
};

#[derive(Parser)]
#[command(name = "solr2es")]
#[command(author = "ICIJ")]
#[command(version)]
#[command(about = "Copy a Solr core into an Elasticsearch index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, value_name = "FILE", env = "SOLR2ES_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    connection: ConnectionArgs,

    /// Use the cooperative single-threaded scheduler
    #[arg(long = "async", global = true)]
    cooperative: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Overrides for the configuration file.
#[derive(Args)]
struct ConnectionArgs {
    /// Solr core URL
    #[arg(long, global = true, env = "SOLR2ES_SOLR_URL")]
    solr_url: Option<String>,

    /// Elasticsearch URL
    #[arg(long, global = true, env = "SOLR2ES_ES_URL")]
    es_url: Option<String>,

    /// Redis URL
    #[arg(long, global = true, env = "SOLR2ES_REDIS_URL")]
    redis_url: Option<String>,

    /// Redis list key
    #[arg(long, global = true, env = "SOLR2ES_QUEUE_KEY")]
    queue_key: Option<String>,

    /// Target index
    #[arg(long, global = true, env = "SOLR2ES_INDEX")]
    index: Option<String>,

    /// Index mappings, inline JSON or @file
    #[arg(long, global = true, value_name = "JSON")]
    mappings: Option<String>,

    /// Index settings, inline JSON or @file
    #[arg(long, global = true, value_name = "JSON")]
    settings: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy Solr documents straight into Elasticsearch
    Migrate,

    /// Read Solr documents into the Redis queue
    Dump,

    /// Index the documents waiting in the Redis queue
    Resume,

    /// Validate configuration
    Validate,

    /// Generate example configuration
    Init {
        /// Output file path
        #[arg(short, long, default_value = "solr2es.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match &cli.command {
        Commands::Migrate => {
            let config = load_config(&cli)?;
            let result = execute(&config, |cancel| run_migration(&config, cancel))?;
            print_result("Migration Complete!", &result);
        }
        Commands::Dump => {
            let config = load_config(&cli)?;
            let result = execute(&config, |cancel| run_dump(&config, cancel))?;
            println!("\n✅ Dump Complete!");
            println!("   Queued:    {}", result.queued);
            println!("   Pages:     {}", result.pages);
            println!("   Key:       {}", config.queue.key);
            println!("   Duration:  {:.2}s", result.duration_secs);
        }
        Commands::Resume => {
            let config = load_config(&cli)?;
            let result = execute(&config, |cancel| run_resume(&config, cancel))?;
            print_result("Resume Complete!", &result);
        }
        Commands::Validate => {
            let config = load_config(&cli)?;
            println!("✅ Configuration is valid!");
            println!("   Source:      {}", config.source.url);
            println!("   Destination: {}", config.destination.url);
            println!("   Index:       {}", config.destination.index);
            println!("   Queue:       {} ({})", config.queue.url, config.queue.key);
            println!("   Mode:        {:?}", config.options.mode);
        }
        Commands::Init { output, force } => {
            generate_config(output, *force)?;
        }
    }

    Ok(())
}

/// Reads the configuration file (or defaults) and applies CLI overrides.
fn load_config(cli: &Cli) -> anyhow::Result<MigrationConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            MigrationConfig::from_file(path)
                .with_context(|| format!("cannot load configuration {:?}", path))?
        }
        None => MigrationConfig::default(),
    };

    let args = &cli.connection;
    if let Some(url) = &args.solr_url {
        config.source.url = url.clone();
    }
    if let Some(url) = &args.es_url {
        config.destination.url = url.clone();
    }
    if let Some(url) = &args.redis_url {
        config.queue.url = url.clone();
    }
    if let Some(key) = &args.queue_key {
        config.queue.key = key.clone();
    }
    if let Some(index) = &args.index {
        config.destination.index = index.clone();
    }
    if args.mappings.is_some() {
        config.destination.mappings = Some(load_json_arg(args.mappings.as_deref())?);
    }
    if args.settings.is_some() {
        config.destination.settings = Some(load_json_arg(args.settings.as_deref())?);
    }
    if cli.cooperative {
        config.options.mode = ExecutionMode::Cooperative;
    }

    config.validate()?;
    Ok(config)
}

/// Drives a pipeline future under the configured execution mode.
fn execute<T, Fut>(
    config: &MigrationConfig,
    pipeline: impl FnOnce(CancelFlag) -> Fut,
) -> anyhow::Result<T>
where
    Fut: Future<Output = anyhow::Result<T>>,
{
    let cancel = CancelFlag::new();
    runtime::run(config.options.mode, cancel.clone(), pipeline(cancel))?
}

fn writer(config: &MigrationConfig) -> BulkWriter<ElasticsearchDestination> {
    BulkWriter::new(
        ElasticsearchDestination::new(config.destination.clone()),
        config.options.retry.clone(),
    )
}

async fn run_migration(
    config: &MigrationConfig,
    cancel: CancelFlag,
) -> anyhow::Result<MigrationResult> {
    let migration = Migration::new(
        SolrPager::new(config.source.clone()),
        writer(config),
        config.transformer(),
    )
    .with_options(config.pipeline_options(cancel));

    let body = config.index_body()?;
    Ok(migration.migrate(&config.destination.index, Some(&body)).await?)
}

async fn run_dump(config: &MigrationConfig, cancel: CancelFlag) -> anyhow::Result<DumpResult> {
    let queue = RedisQueue::connect(&config.queue.url).await?;
    let buffer = QueueBuffer::new(queue, config.queue.key.clone());
    let pager = SolrPager::new(config.source.clone());
    let options = config.pipeline_options(cancel);

    Ok(buffer
        .dump(&pager, options.guard, options.cancel, options.progress_every)
        .await?)
}

async fn run_resume(
    config: &MigrationConfig,
    cancel: CancelFlag,
) -> anyhow::Result<MigrationResult> {
    let queue = RedisQueue::connect(&config.queue.url).await?;
    let consumer = ResumeConsumer::new(
        queue,
        config.queue.key.clone(),
        config.queue.batch_size,
        writer(config),
        config.transformer(),
    )
    .with_index_body(config.index_body()?)
    .with_options(config.pipeline_options(cancel));

    Ok(consumer.resume(&config.destination.index).await?)
}

fn print_result(title: &str, result: &MigrationResult) {
    println!("\n✅ {}", title);
    println!("   Extracted: {}", result.extracted);
    println!("   Indexed:   {}", result.indexed);
    println!("   Failed:    {}", result.failed);
    println!("   Duration:  {:.2}s", result.duration_secs);
    println!("   Throughput: {:.0} docs/sec", result.throughput());
}

fn generate_config(output: &Path, force: bool) -> anyhow::Result<()> {
    if output.exists() && !force {
        bail!("{:?} already exists, use --force to overwrite", output);
    }

    let template = MigrationConfig::default().to_yaml()?;
    std::fs::write(output, template)?;
    println!("✅ Generated configuration: {:?}", output);
    println!("   Edit the file and run: solr2es migrate --config {:?}", output);

    Ok(())
}
