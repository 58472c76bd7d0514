//! steadyq: run a worker pool, enqueue a task, or print queue counts.

mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use steadyq_core::SupervisorBuilder;
use steadyq_core::impls::RedisConnector;
use steadyq_core::observability::QueueCounts;
use steadyq_core::ports::Connector;
use steadyq_core::queue::Producer;
use steadyq_core::runtime::{LogArgsHandler, UnsupportedEscalation};
use tracing::{Dispatch, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(name = "steadyq")]
#[command(about = "Reliable task queue on Redis", long_about = None)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Queue category (overrides config and environment)
    #[arg(short, long)]
    task_type: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the worker pool; runs until interrupted
    Run,

    /// Push one task and print its id
    Enqueue {
        /// Task arguments
        args: Vec<String>,
    },

    /// Print list lengths as JSON
    Status,
}

fn logging() -> anyhow::Result<Dispatch> {
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().with_target(false));
    let dispatch = Dispatch::new(subscriber);
    tracing::dispatcher::set_global_default(dispatch.clone())?;
    Ok(dispatch)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let dispatch = logging()?;

    let config = settings::load(args.config.as_deref(), args.task_type.as_deref())?;
    let connector = RedisConnector::new(&config.store_address, config.keyspace())?;

    match args.command {
        Command::Run => {
            let supervisor = SupervisorBuilder::from_config(&config, Arc::new(connector))
                .handler(Arc::new(LogArgsHandler))
                .escalation_handler(Arc::new(UnsupportedEscalation))
                .dispatch(dispatch)
                .build()?;
            let pool = supervisor.start().await;
            tokio::signal::ctrl_c().await?;
            info!("interrupted, abandoning in-flight tasks");
            pool.abort().await;
        }
        Command::Enqueue { args } => {
            let mut producer = Producer::new(connector.connect().await?);
            let id = producer.enqueue(args).await?;
            println!("{id}");
        }
        Command::Status => {
            let mut store = connector.connect().await?;
            let counts = QueueCounts::collect(store.as_mut()).await?;
            println!("{}", serde_json::to_string_pretty(&counts)?);
        }
    }

    Ok(())
}
