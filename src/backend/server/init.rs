/**
 * Server Initialization
 *
 * Builds the application from a `ServerConfig`:
 *
 * 1. Error detail exposure follows `APP_ENV`
 * 2. Postgres stores when `DATABASE_URL` connects, otherwise in-memory stores
 * 3. `AppState` with one shared room registry
 * 4. The ring-timeout sweeper
 * 5. The router
 */

use axum::Router;

use crate::backend::error::set_expose_details;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, ServerConfig};
use crate::backend::server::state::{AppState, Stores};

pub async fn create_app(config: ServerConfig) -> Router<()> {
    tracing::info!("Initializing parttime-comms server ({:?})", config.environment);
    set_expose_details(config.is_development());

    for warning in config.fallback_warnings() {
        tracing::warn!("{}", warning);
    }

    let stores = match config.database_url.as_deref() {
        Some(url) => match load_database(url).await {
            Some(pool) => Stores::postgres(pool),
            None => {
                tracing::warn!("Database unavailable; falling back to in-memory stores");
                Stores::in_memory()
            }
        },
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory stores");
            Stores::in_memory()
        }
    };

    let ring_timeout = config.ring_timeout();
    let state = AppState::new(config, stores);
    state.hub.spawn_ring_sweeper(ring_timeout);
    tracing::info!("Ring sweeper started ({}s timeout)", ring_timeout.as_secs());

    create_router(state)
}
