use std::{sync::Arc, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::{
    config::Config,
    error::AppResult,
    geo::bases::BaseRegistry,
    geocode::{
        provider::{GeocodeProvider, HttpGeocodeProvider},
        queue::{GeocodeQueue, GeocodeWorker},
    },
    requests::{
        approval::ApprovalWorkflow,
        handlers::AppState,
        status::StatusService,
        store::{PgRequestStore, RequestStore},
    },
};

pub async fn initialize_app_state(config: &Config) -> AppResult<AppState> {
    info!("Initializing application components ...");

    // Database pool
    let pool = initialize_database(&config.database_url).await?;
    let store: Arc<dyn RequestStore> = Arc::new(PgRequestStore::new(pool));

    // Home-region bounding box and known bases
    let bounds = config.region_bounds()?;
    info!(
        "✅ Home region configured: lat {}..{}, lng {}..{}",
        bounds.min_lat, bounds.max_lat, bounds.min_lng, bounds.max_lng
    );

    let bases = Arc::new(BaseRegistry::from_entries(config.base_locations.clone()));
    info!("✅ Base registry loaded ({} entries)", bases.len());

    // Geocoding provider
    let provider: Arc<dyn GeocodeProvider> = Arc::new(HttpGeocodeProvider::new(
        config.geocoder_url.clone(),
        Duration::from_secs(config.geocoder_timeout_secs),
    )?);
    info!("✅ Geocoding provider configured: {}", config.geocoder_url);

    // Background geocode queue and worker
    let (queue, rx) = GeocodeQueue::new();
    GeocodeWorker::new(store.clone(), provider.clone()).start(rx);
    info!("✅ Geocode worker started");

    let status_service = Arc::new(StatusService::new(store.clone()));
    let approval = Arc::new(ApprovalWorkflow::new(store.clone(), bases, bounds));
    info!("✅ Approval workflow initialized");

    Ok(AppState {
        store,
        status_service,
        approval,
        queue,
    })
}

async fn initialize_database(database_url: &str) -> AppResult<PgPool> {
    info!("📊 Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(30)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .connect(database_url)
        .await?;

    // Run migrations
    info!("🔄 Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("✓ Database initialized");
    Ok(pool)
}
