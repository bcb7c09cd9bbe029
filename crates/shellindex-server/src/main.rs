use anyhow::Context;
use shellindex_storage::{dump, InMemoryStore, Storage};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod metrics;
mod routes;

use config::ServerConfig;
use routes::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    let store = InMemoryStore::new();
    if let Some(path) = &config.seed_file {
        let documents = dump::read_dump(path)
            .with_context(|| format!("reading seed file {}", path.display()))?;
        let loaded = store.load(documents)?;
        info!(loaded, path = %path.display(), "seeded catalog");
    }
    metrics::DOCUMENTS.set(store.len() as i64);

    let http_addr = config.http_addr;
    let tls = config.tls.clone();
    let state = AppState {
        store: Arc::new(store),
        config: Arc::new(config),
    };
    let app = router(state);

    match tls {
        Some(paths) => {
            let tls_config =
                axum_server::tls_rustls::RustlsConfig::from_pem_file(&paths.cert, &paths.key)
                    .await
                    .context("loading TLS certificate")?;
            info!("https listening on {}", http_addr);
            axum_server::bind_rustls(http_addr, tls_config)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            info!("http listening on {}", http_addr);
            axum_server::bind(http_addr)
                .serve(app.into_make_service())
                .await?;
        }
    }
    warn!("server stopped");
    Ok(())
}
