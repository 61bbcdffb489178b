use super::handlers::{self, AppState};
use super::middleware::ResponseCache;
use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    routing::{delete, get, patch},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the Axum router with all endpoints.
///
/// Read routes sit behind the response-cache middleware with their
/// configured TTL class; write routes and the operator surface are never
/// cached.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let use_distributed = state.facade.distributed().is_enabled();

    let products_cache = ResponseCache::new(
        state.facade.clone(),
        state.routes.products_ttl_secs,
        use_distributed,
    );
    let products_detail_cache = products_cache.clone();
    let reference_cache = ResponseCache::new(
        state.facade.clone(),
        state.routes.reference_ttl_secs,
        use_distributed,
    );
    let status_cache = ResponseCache::new(
        state.facade.clone(),
        state.routes.status_ttl_secs,
        use_distributed,
    );

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Catalog read endpoints (response-cached) and writes
        .route(
            "/api/v1/products",
            get(handlers::list_products)
                .route_layer(middleware::from_fn(move |req: Request, next: Next| {
                    let cache = products_cache.clone();
                    async move { ResponseCache::layer(cache, req, next).await }
                }))
                .post(handlers::create_product),
        )
        .route(
            "/api/v1/products/{id}",
            get(handlers::get_product)
                .route_layer(middleware::from_fn(move |req: Request, next: Next| {
                    let cache = products_detail_cache.clone();
                    async move { ResponseCache::layer(cache, req, next).await }
                }))
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route(
            "/api/v1/products/{id}/status",
            patch(handlers::set_product_status),
        )
        .route(
            "/api/v1/catalog/categories",
            get(handlers::list_categories).route_layer(middleware::from_fn(
                move |req: Request, next: Next| {
                    let cache = reference_cache.clone();
                    async move { ResponseCache::layer(cache, req, next).await }
                },
            )),
        )
        .route("/api/v1/catalog/dropdowns", get(handlers::catalog_dropdowns))
        .route(
            "/api/v1/status",
            get(handlers::api_status).route_layer(middleware::from_fn(
                move |req: Request, next: Next| {
                    let cache = status_cache.clone();
                    async move { ResponseCache::layer(cache, req, next).await }
                },
            )),
        )
        // Operator surface
        .route("/api/performance", get(handlers::performance))
        .route("/api/cache/clear", delete(handlers::cache_clear))
        .route("/metrics", get(handlers::metrics_handler))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
