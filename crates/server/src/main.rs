mod api;
mod assets;
mod config;
mod gateway;
mod lyrics;
mod state;
mod utils;
mod ytdlp;

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use api::api_router;
use config::{config_path_from_env, library_store, load_or_create_config};
use parking_lot::RwLock;
use reqwest::Client;
use state::AppState;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utils::open_in_browser;
use ytdlp::YtDlp;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = config_path_from_env();
    let (config, created) = load_or_create_config(&config_path)?;
    if created {
        info!("Created default config at {:?}", config_path);
    } else {
        info!("Loaded config from {:?}", config_path);
    }

    let library = library_store(&config_path, &config)?;
    if library.ensure_exists()? {
        info!("Created empty library at {:?}", library.path());
    } else {
        info!("Using library at {:?}", library.path());
    }

    let http_client = Client::builder().user_agent("neon-pulse/0.1").build()?;
    let timeout = Duration::from_secs(config.external_timeout_secs);
    let ytdlp = Arc::new(
        YtDlp::new(config.ytdlp_path.clone(), timeout, http_client.clone())
            .with_lyrics(config.lyrics_enabled),
    );

    let bind_addr = config.listen_addr();
    let browser_url = config.browser_url();
    let open_browser = config.open_browser;
    let open_delay = Duration::from_millis(config.open_browser_delay_ms);

    let state = AppState {
        config_path,
        config: Arc::new(RwLock::new(config)),
        library,
        catalog: ytdlp.clone(),
        media: ytdlp,
        http_client,
    };

    let app = Router::new()
        .route("/", get(assets::index))
        .route("/static/*file", get(assets::static_asset))
        .with_state(state.clone())
        .nest("/api", api_router(state))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", bind_addr);

    if open_browser {
        tokio::spawn(async move {
            tokio::time::sleep(open_delay).await;
            if let Err(err) = open_in_browser(&browser_url) {
                warn!("Failed to open browser at {}: {}", browser_url, err);
            }
        });
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(err) => {
                warn!("Failed to install terminate signal handler: {}", err);
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", err);
        }
    }

    info!("Shutdown signal received.");
}
