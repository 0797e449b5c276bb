use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use shared_budget::{load_csv, logging, BudgetConfig, BudgetEngine, ChannelSubscriber};

#[derive(Parser)]
#[command(name = "shared-budget", version, about = "Shared budget ledger tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Push expenses from a CSV through the ledger, printing every broadcast
    /// event as a JSON line followed by the final snapshot
    Replay {
        /// CSV with a Description,Amount,User,Category header
        csv: PathBuf,

        #[command(flatten)]
        budget: BudgetConfig,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    match Cli::parse().command {
        Command::Replay { csv, budget } => run_replay(&csv, &budget).await,
    }
}

async fn run_replay(csv_path: &Path, config: &BudgetConfig) -> Result<()> {
    let expenses = load_csv(csv_path)?;
    info!(count = expenses.len(), path = ?csv_path, "loaded expenses");

    let engine = BudgetEngine::start(config).context("Invalid budget configuration")?;

    let (subscriber, mut rx) = ChannelSubscriber::new(64);
    engine.registry.register(Arc::new(subscriber));

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            println!("{}", event.to_json()?);
        }
        Ok::<_, serde_json::Error>(())
    });

    for expense in expenses {
        engine.service.add_expense(expense);
    }
    let snapshot = engine.service.read_snapshot();

    // Dropping the service drops the last publisher, so the dispatcher drains
    // the queue and exits; dropping the registry then closes the printer.
    let BudgetEngine {
        service,
        registry,
        dispatcher,
    } = engine;
    drop(service);
    dispatcher.await.context("Dispatcher task failed")?;
    drop(registry);
    printer.await.context("Printer task failed")??;

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    info!(
        total_expenses = snapshot.total_expenses,
        total_amount = snapshot.total_amount,
        "replay complete"
    );

    Ok(())
}
