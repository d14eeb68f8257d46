use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use issue_autopatch::agent::Agent;
use issue_autopatch::auth::SystemClock;
use issue_autopatch::config::Config;
use issue_autopatch::github::OctocrabConnector;
use issue_autopatch::patch::AnthropicClient;
use issue_autopatch::server::{AppState, build_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "issue_autopatch=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    tracing::debug!(?config, "Loaded configuration");

    let connector = OctocrabConnector::new(config.github_api_url.clone(), config.request_timeout);
    let model = AnthropicClient::new(
        config.anthropic_api_key.clone(),
        config.anthropic_api_url.clone(),
        config.request_timeout,
    )
    .context("building model client")?;
    let agent = Agent::new(&config, connector, model, Arc::new(SystemClock))
        .context("initialising agent")?;

    let app = build_router(AppState::new(agent, config.webhook_secret.clone()));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!("listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
