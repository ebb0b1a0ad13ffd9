//! # folio-api — Binary Entry Point
//!
//! Starts the Axum HTTP server. All wiring comes from the environment:
//! catalog endpoint, index tables, the two object-store tiers, and the
//! optional Postgres credential store.

use std::sync::Arc;

use folio_api::keystore::{ApiKeyRecord, KeyStore, MemoryKeyStore};
use folio_api::state::AppConfig;
use folio_catalog::{CatalogClient, CatalogConfig};
use folio_store::{
    DynamoIndex, HttpObjectStore, IndexConfig, MappingIndex, ObjectStoreConfig, TieredStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();

    // Credential store: Postgres when DATABASE_URL is set, in-memory
    // otherwise.
    let db_pool = folio_api::db::init_pool().await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })?;
    let keys: Arc<dyn KeyStore> = match &db_pool {
        Some(pool) => Arc::new(folio_api::db::keys::PgKeyStore::new(pool.clone())),
        None => {
            let memory = MemoryKeyStore::new();
            if let Ok(dev_key) = std::env::var("FOLIO_DEV_API_KEY") {
                memory.insert(ApiKeyRecord {
                    key: dev_key,
                    expires_at: None,
                    is_paying: true,
                    requests_per_day: None,
                    organization: None,
                    email: None,
                });
                tracing::warn!(
                    "FOLIO_DEV_API_KEY seeded into the in-memory key store — \
                     development use only"
                );
            }
            Arc::new(memory)
        }
    };

    let catalog = CatalogClient::new(CatalogConfig::from_env()?)?;

    let index: Arc<dyn MappingIndex> = Arc::new(DynamoIndex::new(IndexConfig::from_env()?)?);

    let primary = HttpObjectStore::new(ObjectStoreConfig::from_env("primary", "FOLIO_PRIMARY")?)?;
    let backup = HttpObjectStore::new(ObjectStoreConfig::from_env("backup", "FOLIO_BACKUP")?)?;
    let tiers = TieredStore::new(Arc::new(primary), Arc::new(backup));

    let port = config.port;
    let state = folio_api::AppState::new(catalog, index, tiers, keys, db_pool, config);
    let app = folio_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Folio API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
