use tokio::net::TcpListener;
use tracing::{error, info};
use expert_chat::{agents::ExpertAgents, config::Config, routes::create_router, utils::init_logger, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    // A missing or invalid credential stops the server before any chat happens
    let config = Config::from_env().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;
    info!("Configuration loaded: {:?}", config.server);
    info!(model = %config.llm.model, base_url = %config.llm.base_url, "Model settings");

    let experts = ExpertAgents::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to build expert agents: {}", e))?;

    let addr = config.bind_address();
    let state = AppState::new(config, experts);
    let sweeper = state.sessions.spawn_idle_sweeper(
        state.config.session.sweep_interval(),
        state.config.session.idle_timeout(),
    );
    info!(
        idle_secs = state.config.session.idle_secs,
        "Idle session sweeper started"
    );
    let app = create_router(state);

    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    sweeper.abort();
    Ok(())
}
