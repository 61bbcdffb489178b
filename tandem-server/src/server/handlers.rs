use crate::cache::{self, CacheFacade, Invalidator};
use crate::catalog::{CatalogStore, DropdownData, NewProduct, Product, ProductUpdate};
use crate::config::RouteTtlConfig;
use crate::core::TandemError;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub facade: Arc<CacheFacade>,
    pub invalidator: Invalidator,
    pub catalog: CatalogStore,
    pub routes: RouteTtlConfig,
    pub environment: String,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        facade: Arc<CacheFacade>,
        catalog: CatalogStore,
        routes: RouteTtlConfig,
        environment: String,
    ) -> Self {
        let invalidator = Invalidator::new(facade.clone());
        Self {
            facade,
            invalidator,
            catalog,
            routes,
            environment,
            started_at: Instant::now(),
        }
    }

    /// Evict everything a product write can have made stale: the
    /// products response-cache keys (list and detail share the
    /// `/products` substring) and the derived dropdown aggregate.
    /// Substring matching is deliberately broad.
    fn invalidate_products(&self) {
        self.invalidator.trigger(vec![
            "products".to_string(),
            "catalog_dropdowns".to_string(),
        ]);
    }
}

// Request/Response types for the catalog REST API

#[derive(Debug, Deserialize)]
pub struct ListProductsParams {
    pub category: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct ClearParams {
    pub pattern: Option<String>,
}

/// GET /api/v1/products - list products with filtering and pagination
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ListProductsParams>,
) -> Json<ProductListResponse> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    debug!("REST LIST products category={:?} page={}", params.category, page);

    let (products, total) = state.catalog.list(params.category.as_deref(), page, limit);

    Json(ProductListResponse {
        products,
        pagination: Pagination { page, limit, total },
    })
}

/// GET /api/v1/products/{id} - fetch a single product
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, TandemError> {
    debug!("REST GET product id={}", id);

    state
        .catalog
        .get(id)
        .map(Json)
        .ok_or_else(|| TandemError::ProductNotFound(id.to_string()))
}

/// POST /api/v1/products - create a product
pub async fn create_product(
    State(state): State<AppState>,
    Json(req): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), TandemError> {
    if req.name.trim().is_empty() {
        return Err(TandemError::InvalidRequest("name must not be empty".to_string()));
    }
    debug!("REST CREATE product name={}", req.name);

    let product = state.catalog.insert(req);
    state.invalidate_products();

    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/v1/products/{id} - update a product
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ProductUpdate>,
) -> Result<Json<Product>, TandemError> {
    debug!("REST UPDATE product id={}", id);

    let product = state
        .catalog
        .update(id, req)
        .ok_or_else(|| TandemError::ProductNotFound(id.to_string()))?;
    state.invalidate_products();

    Ok(Json(product))
}

/// DELETE /api/v1/products/{id} - delete a product
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, TandemError> {
    debug!("REST DELETE product id={}", id);

    if !state.catalog.delete(id) {
        return Err(TandemError::ProductNotFound(id.to_string()));
    }
    state.invalidate_products();

    Ok(Json(json!({ "deleted": true, "id": id })))
}

/// PATCH /api/v1/products/{id}/status - toggle product visibility
pub async fn set_product_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Product>, TandemError> {
    debug!("REST STATUS product id={} active={}", id, req.active);

    let product = state
        .catalog
        .set_active(id, req.active)
        .ok_or_else(|| TandemError::ProductNotFound(id.to_string()))?;
    state.invalidate_products();

    Ok(Json(product))
}

/// GET /api/v1/catalog/categories - reference data (near-static)
pub async fn list_categories(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "categories": state.catalog.categories() }))
}

/// GET /api/v1/catalog/dropdowns - aggregated form data, cached at the
/// application level through the facade rather than the response
/// middleware. A corrupt cached payload is treated as a miss and
/// recomputed; cache trouble never fails the request.
pub async fn catalog_dropdowns(State(state): State<AppState>) -> Json<DropdownData> {
    let key = cache::app_key("catalog_dropdowns", &[]);

    if let Some(bytes) = state.facade.read(&key, true).await {
        match serde_json::from_slice::<DropdownData>(&bytes) {
            Ok(data) => {
                debug!("Dropdown data served from cache");
                return Json(data);
            }
            Err(e) => warn!("Corrupt cached dropdown payload, recomputing: {}", e),
        }
    }

    let data = state.catalog.dropdown_data();
    match serde_json::to_vec(&data) {
        Ok(bytes) => {
            state
                .facade
                .write(&key, bytes, state.routes.dropdowns_ttl_secs, true)
                .await;
        }
        Err(e) => warn!("Failed to serialize dropdown data for cache: {}", e),
    }

    Json(data)
}

/// GET /api/v1/status - lightweight liveness payload (served through the
/// response cache with a very short TTL)
pub async fn api_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}

/// Health check endpoint; reports distributed tier connectivity
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let connected = state.facade.distributed().is_connected();
    Json(json!({
        "status": "healthy",
        "service": "tandem",
        "version": env!("CARGO_PKG_VERSION"),
        "cache": {
            "distributed": if connected { "connected" } else { "disconnected" },
        }
    }))
}

/// GET /api/performance - operator snapshot of both cache tiers plus
/// process vitals
pub async fn performance(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.facade.stats();

    let memory = match sys_info::mem_info() {
        Ok(mem) => json!({
            "total_kb": mem.total,
            "avail_kb": mem.avail,
            "used_kb": mem.total.saturating_sub(mem.avail),
            "local_cache_bytes": snapshot.local.total_bytes,
        }),
        Err(e) => {
            warn!("Failed to read memory info: {}", e);
            json!(null)
        }
    };

    Json(json!({
        "status": "ok",
        "cache": snapshot,
        "memory": memory,
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "environment": state.environment,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// DELETE /api/cache/clear?pattern=<p> - administrative eviction: with a
/// pattern, invalidate matching keys in both tiers; without, flush both
/// tiers entirely
pub async fn cache_clear(
    State(state): State<AppState>,
    Query(params): Query<ClearParams>,
) -> Json<serde_json::Value> {
    match params.pattern.as_deref() {
        Some(pattern) if !pattern.is_empty() => {
            let removed = state.facade.invalidate(pattern).await;
            Json(json!({
                "success": true,
                "message": format!("Invalidated {} keys matching '{}'", removed, pattern),
            }))
        }
        _ => {
            let flushed = state.facade.flush_all().await;
            Json(json!({
                "success": true,
                "message": format!("Cache cleared ({} local entries dropped)", flushed),
            }))
        }
    }
}

/// GET /metrics - Prometheus metrics endpoint
pub async fn metrics_handler() -> axum::response::Response {
    use axum::response::IntoResponse;

    match crate::metrics::encode_metrics() {
        Ok(metrics) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            metrics,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode metrics: {}", e),
        )
            .into_response(),
    }
}
