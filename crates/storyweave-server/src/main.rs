//! Storyweave game server binary.
//!
//! This is the main entry point that wires together the database pool, the
//! judge webhook notifier, and the HTTP API. It loads configuration, runs
//! migrations, and serves until the process is terminated.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `storyweave-config.yaml`
//! 3. Connect to `PostgreSQL` and run migrations
//! 4. Assemble application state (judge trust, webhook notifier)
//! 5. Serve the HTTP API

mod config;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use storyweave_api::{start_server, AppState, ServerConfig};
use storyweave_db::{PostgresConfig, PostgresPool};
use storyweave_notify::JudgeNotifier;
use storyweave_types::AgentId;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ServerSettings;

/// Default path to the configuration file, relative to the working directory.
const CONFIG_PATH: &str = "storyweave-config.yaml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("storyweave-server starting");

    // 2. Load configuration.
    let settings = load_config()?;
    info!(
        host = settings.server.host,
        port = settings.server.port,
        base_url = settings.server.base_url,
        "Configuration loaded"
    );

    // 3. Connect to PostgreSQL and run migrations.
    let db_config = PostgresConfig::new(&settings.database.url)
        .with_max_connections(settings.database.max_connections)
        .with_connect_timeout(Duration::from_secs(10));
    let pool = PostgresPool::connect(&db_config).await?;
    pool.run_migrations().await?;

    // 4. Assemble application state.
    let mut state = AppState::new(pool, &settings.server.base_url);

    if !settings.judge.admin_key.is_empty() {
        state = state.with_admin_key(&settings.judge.admin_key);
        info!("Admin key configured for judging");
    }
    if !settings.judge.agent_id.is_empty() {
        match settings.judge.agent_id.parse::<uuid::Uuid>() {
            Ok(id) => {
                state = state.with_judge_agent(AgentId::from(id));
                info!(judge_agent_id = %id, "Judge agent configured");
            }
            Err(e) => {
                warn!(error = %e, "judge.agent_id is not a UUID, ignoring");
            }
        }
    }
    if !settings.judge.webhook_url.is_empty() {
        state = state.with_notifier(JudgeNotifier::new(&settings.judge.webhook_url));
        info!(
            webhook_url = settings.judge.webhook_url,
            "Judge webhook notifier configured"
        );
    }
    if state.admin_key.is_none() && state.judge_agent_id.is_none() {
        warn!("No judge credential configured; judging endpoints will reject all callers");
    }

    // 5. Serve the HTTP API.
    let server_config = ServerConfig {
        host: settings.server.host.clone(),
        port: settings.server.port,
    };
    start_server(&server_config, Arc::new(state)).await?;

    Ok(())
}

/// Load configuration from `storyweave-config.yaml`, falling back to
/// defaults when the file does not exist.
fn load_config() -> Result<ServerSettings, config::ConfigError> {
    let path = Path::new(CONFIG_PATH);
    if path.exists() {
        ServerSettings::from_file(path)
    } else {
        warn!(path = CONFIG_PATH, "Config file not found, using defaults");
        let mut settings = ServerSettings::default();
        settings.apply_env_overrides();
        Ok(settings)
    }
}
