// Shared Budget - Web Server
// REST + WebSocket API with Axum

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use shared_budget::api::{router, AppState};
use shared_budget::{logging, BudgetEngine, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let config = ServerConfig::parse();
    let engine = BudgetEngine::start(&config.budget).context("Invalid budget configuration")?;

    info!(
        budget = %config.budget.budget_name,
        total_amount = config.budget.total_amount,
        threshold = config.budget.threshold,
        "budget initialized"
    );

    let app = router(AppState::from(&engine));

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(addr = %config.bind, "server running");
    info!("  POST /addExpense   GET /api/budget   GET /ws");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
