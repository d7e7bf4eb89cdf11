use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::require_internal_key;
use crate::handlers::{self, AppState};

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Builds the full application router.
///
/// Everything except the health routes sits behind the internal-key gate.
pub fn build_router(state: AppState) -> Router {
    let state = Arc::new(state);

    let mut protected_routes = Router::new()
        .route("/api/webhook/ads/create", post(handlers::create_ad))
        .route("/api/ads", get(handlers::list_ads))
        .route(
            "/api/ads/:id",
            get(handlers::get_ad).patch(handlers::update_ad),
        )
        .route(
            "/api/ads/by-campaign/:campaign_id",
            get(handlers::get_ad_by_campaign),
        )
        .route(
            "/api/leads",
            get(handlers::list_leads).post(handlers::create_lead),
        );

    if state.config.enable_seed {
        protected_routes = protected_routes.route("/api/seed", post(handlers::seed));
    }

    let protected_routes = protected_routes.layer(
        ServiceBuilder::new()
            .layer(middleware::from_fn_with_state(
                state.clone(),
                require_internal_key,
            ))
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
    );

    Router::new()
        .route("/", get(handlers::health))
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
