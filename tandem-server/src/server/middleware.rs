use crate::cache::{self, CacheFacade};
use crate::metrics;
use axum::{
    body::{Body, to_bytes},
    extract::Request,
    http::{HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error};

/// Response-cache middleware: serves cached payloads for safe read
/// requests and captures fresh ones on the way out.
///
/// Capture-then-forward: the handler's serialized body is buffered,
/// written through the facade, and forwarded unchanged. On a hit the
/// handler never runs at all.
#[derive(Clone)]
pub struct ResponseCache {
    facade: Arc<CacheFacade>,
    ttl_secs: u64,
    use_distributed: bool,
}

impl ResponseCache {
    pub fn new(facade: Arc<CacheFacade>, ttl_secs: u64, use_distributed: bool) -> Self {
        Self {
            facade,
            ttl_secs,
            use_distributed,
        }
    }

    /// Middleware function for Axum
    pub async fn layer(cache: ResponseCache, req: Request, next: Next) -> Response {
        // Only idempotent reads are cacheable; everything else passes
        // through untouched
        if req.method() != Method::GET {
            metrics::record_response_cache("bypass");
            return next.run(req).await;
        }

        let key = cache::response_key(full_path(&req));

        if let Some(payload) = cache.facade.read(&key, cache.use_distributed).await {
            metrics::record_response_cache("hit");
            debug!("Response cache HIT key={}", key);
            return cached_response(payload);
        }
        metrics::record_response_cache("miss");

        let response = next.run(req).await;

        // Non-2xx responses are never cached
        if !response.status().is_success() {
            return response;
        }

        let (mut parts, body) = response.into_parts();
        let bytes = match to_bytes(body, usize::MAX).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to buffer response body for key={}: {}", key, e);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        cache
            .facade
            .write(&key, bytes.to_vec(), cache.ttl_secs, cache.use_distributed)
            .await;
        metrics::record_response_cache("store");
        debug!("Response cache STORE key={} ttl={}s", key, cache.ttl_secs);

        parts
            .headers
            .insert("x-cache", HeaderValue::from_static("MISS"));
        Response::from_parts(parts, Body::from(bytes))
    }
}

/// Full request path including the query string, so distinct
/// filter/sort/page combinations are distinct cache entries.
fn full_path(req: &Request) -> &str {
    req.uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| req.uri().path())
}

fn cached_response(payload: Vec<u8>) -> Response {
    let mut response = Response::new(Body::from(payload));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
        .headers_mut()
        .insert("x-cache", HeaderValue::from_static("HIT"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Uri;

    fn request_with_uri(uri: &str) -> Request {
        Request::builder()
            .uri(uri.parse::<Uri>().unwrap())
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_full_path_includes_query() {
        let req = request_with_uri("/api/v1/products?category=x&page=2");
        assert_eq!(full_path(&req), "/api/v1/products?category=x&page=2");
    }

    #[test]
    fn test_full_path_without_query() {
        let req = request_with_uri("/api/v1/products");
        assert_eq!(full_path(&req), "/api/v1/products");
    }

    #[test]
    fn test_cached_response_shape() {
        let response = cached_response(b"{\"ok\":true}".to_vec());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("x-cache").unwrap(),
            &HeaderValue::from_static("HIT")
        );
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            &HeaderValue::from_static("application/json")
        );
    }
}
