use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use graphruntime::{GraphRuntime, NodeRegistry, ProjectStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod projects;

use config::ServerConfig;

/// Application state shared across handlers
pub(crate) struct AppState {
    runtime: Arc<GraphRuntime>,
    store: ProjectStore,
    log_keepalive: Duration,
}

impl AppState {
    pub(crate) fn new(
        runtime: Arc<GraphRuntime>,
        store: ProjectStore,
        log_keepalive: Duration,
    ) -> Self {
        Self {
            runtime,
            store,
            log_keepalive,
        }
    }
}

/// Periodically drop runs that were submitted but never attached
fn spawn_session_reaper(runtime: Arc<GraphRuntime>, ttl: Duration) {
    let period = (ttl / 2).max(Duration::from_secs(1));
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let reaped = runtime.reap_expired_sessions();
            if reaped > 0 {
                debug!("Reaped {} expired run sessions", reaped);
            }
        }
    });
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🚀 Starting Graph Engine Server");

    let config = ServerConfig::from_env()?;

    // Create runtime with registered nodes
    let mut registry = NodeRegistry::new();
    graphnodes::register_all(&mut registry);
    let node_count = registry.len();

    let runtime = Arc::new(GraphRuntime::with_registry(
        Arc::new(registry),
        config.runtime_config(),
    ));

    info!("✅ Runtime initialized with {} node types", node_count);

    spawn_session_reaper(runtime.clone(), config.session_ttl);

    info!("📁 Projects stored under {}", config.projects_dir.display());
    let app_state = web::Data::new(AppState::new(
        runtime,
        ProjectStore::new(config.projects_dir.clone()),
        config.log_keepalive,
    ));

    info!("🌐 Server starting on http://{}", config.bind_address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .wrap(cors)
            .wrap(actix_web::middleware::Logger::default())
            .configure(api::configure)
            .configure(projects::configure)
    })
    .bind(&config.bind_address)?
    .run()
    .await?;

    Ok(())
}
