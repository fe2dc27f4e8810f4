mod catalog;
mod config;
mod db;
mod entities;
mod error;
mod graphql;
mod models;
mod repository;
mod routes;
mod seed;

use tracing::{info, warn};

use crate::{catalog::Catalog, config::Config, db::Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,movie_catalog=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let store = Store::connect(&config.database_url).await?;
    if config.seed_sample_data {
        seed::seed_sample_data(&store).await?;
    }

    let schema = graphql::build_schema(Catalog::new(store.clone(), config.max_page_size));
    let app = routes::app(schema);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "listening");
    info!("GraphQL endpoint and GraphiQL UI at http://{}/graphql", config.addr);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    store.close().await?;
    info!("shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            },
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
