use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{web, App, HttpResponse, HttpServer, ResponseError};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::json;

use crate::cache::ListingCache;
use crate::config::HttpConfig;
use crate::domain::order::NewOrder;
use crate::health;
use crate::metrics::Metrics;
use crate::repository::{OrderRepository, RepositoryError};
use crate::store::OrderStore;

// ============================================================================
// HTTP Gateway
// ============================================================================
//
// Routes:
//   GET  /api/orders         full listing, tagged with cache provenance
//   POST /api/orders         create an order (validated, starts pending)
//   PUT  /api/orders/{id}    overwrite an order's status
//   GET  /api/health         dependency health report
//   GET  /metrics            Prometheus exposition
// ============================================================================

/// Shared handler state. The raw store and cache handles exist only for
/// health probes; all order traffic goes through the repository.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<OrderRepository>,
    pub store: Arc<dyn OrderStore>,
    pub cache: Arc<dyn ListingCache>,
    pub metrics: Arc<Metrics>,
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: Option<String>,
}

impl ResponseError for RepositoryError {
    fn status_code(&self) -> StatusCode {
        match self {
            RepositoryError::Validation(_) => StatusCode::BAD_REQUEST,
            RepositoryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/orders", web::get().to(list_orders))
        .route("/api/orders", web::post().to(create_order))
        .route("/api/orders/{order_id}", web::put().to(update_order_status))
        .route("/api/health", web::get().to(health_handler))
        .route("/metrics", web::get().to(metrics_handler));
}

/// Serve the gateway until the process is stopped.
pub async fn run_server(state: AppState, config: &HttpConfig) -> std::io::Result<()> {
    tracing::info!(
        "🌐 Starting HTTP gateway on http://{}:{}",
        config.host,
        config.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(configure_routes)
    })
    .bind((config.host.clone(), config.port))?
    .run()
    .await
}

async fn list_orders(state: web::Data<AppState>) -> HttpResponse {
    match state.repository.list_orders().await {
        Ok(listing) => HttpResponse::Ok().json(listing),
        Err(e) => {
            tracing::error!(error = %e, "Error getting orders");
            HttpResponse::build(e.status_code()).json(json!({
                "error": e.to_string(),
                "data": [],
            }))
        }
    }
}

async fn create_order(
    state: web::Data<AppState>,
    body: Option<web::Json<NewOrder>>,
) -> Result<HttpResponse, RepositoryError> {
    let Some(body) = body else {
        return Ok(HttpResponse::BadRequest().json(json!({ "error": "No JSON data provided" })));
    };

    let order_id = state.repository.create_order(&body).await?;
    Ok(HttpResponse::Created().json(json!({
        "message": "Order created",
        "order_id": order_id,
    })))
}

async fn update_order_status(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: Option<web::Json<StatusUpdate>>,
) -> Result<HttpResponse, RepositoryError> {
    let order_id = path.into_inner();
    let status = body.and_then(|b| b.into_inner().status);

    state.repository.update_status(order_id, status).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Order updated" })))
}

async fn health_handler(state: web::Data<AppState>) -> HttpResponse {
    let report =
        health::check_dependencies("api", state.store.as_ref(), state.cache.as_ref()).await;

    if report.status.is_serving() {
        HttpResponse::Ok().json(report)
    } else {
        HttpResponse::ServiceUnavailable().json(report)
    }
}

async fn metrics_handler(state: web::Data<AppState>) -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = state.metrics.registry().gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryListingCache;
    use crate::config::CacheConfig;
    use crate::store::MemoryOrderStore;
    use actix_web::test;
    use serde_json::Value;

    fn build_state() -> (Arc<MemoryOrderStore>, Arc<MemoryListingCache>, AppState) {
        let store = Arc::new(MemoryOrderStore::new());
        let cache = Arc::new(MemoryListingCache::new());
        let metrics = Arc::new(Metrics::default());
        let repository = Arc::new(OrderRepository::new(
            store.clone(),
            cache.clone(),
            &CacheConfig::default(),
            metrics.clone(),
        ));
        let state = AppState {
            repository,
            store: store.clone(),
            cache: cache.clone(),
            metrics,
        };
        (store, cache, state)
    }

    macro_rules! init_app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .configure(configure_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_create_then_list_orders() {
        let (_store, _cache, state) = build_state();
        let app = init_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(json!({
                "customer_name": "Alice",
                "items": ["Pizza", "Coke"],
                "total": 25.99
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Order created");
        let order_id = body["order_id"].as_i64().unwrap();

        let req = test::TestRequest::get().uri("/api/orders").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["source"], "database");
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["id"], order_id);
        assert_eq!(body["data"][0]["customer_name"], "Alice");
        assert_eq!(body["data"][0]["items"], json!(["Pizza", "Coke"]));
        assert_eq!(body["data"][0]["total"], json!(25.99));
        assert_eq!(body["data"][0]["status"], "pending");

        // Unchanged data inside the TTL is served from the cache
        let req = test::TestRequest::get().uri("/api/orders").to_request();
        let resp = test::call_service(&app, req).await;
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["source"], "cache");
        assert_eq!(body["count"], 1);
    }

    #[actix_web::test]
    async fn test_create_without_body_is_rejected() {
        let (_store, _cache, state) = build_state();
        let app = init_app!(state);

        let req = test::TestRequest::post().uri("/api/orders").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "No JSON data provided");
    }

    #[actix_web::test]
    async fn test_create_with_invalid_fields_is_rejected() {
        let (_store, _cache, state) = build_state();
        let app = init_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(json!({
                "customer_name": "",
                "items": ["Pizza"],
                "total": 10.0
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "customer_name must not be empty");
    }

    #[actix_web::test]
    async fn test_update_status_and_invalidation() {
        let (_store, _cache, state) = build_state();
        let app = init_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(json!({
                "customer_name": "Bob",
                "items": ["Burger"],
                "total": 9.5
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        let body: Value = test::read_body_json(resp).await;
        let order_id = body["order_id"].as_i64().unwrap();

        // Prime the cache
        let req = test::TestRequest::get().uri("/api/orders").to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::put()
            .uri(&format!("/api/orders/{order_id}"))
            .set_json(json!({"status": "preparing"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Order updated");

        // The write dropped the cached listing
        let req = test::TestRequest::get().uri("/api/orders").to_request();
        let resp = test::call_service(&app, req).await;
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["source"], "database");
        assert_eq!(body["data"][0]["status"], "preparing");
    }

    #[actix_web::test]
    async fn test_update_requires_status_field() {
        let (_store, _cache, state) = build_state();
        let app = init_app!(state);

        let req = test::TestRequest::put()
            .uri("/api/orders/1")
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "status is required");

        let req = test::TestRequest::put()
            .uri("/api/orders/1")
            .set_json(json!({"status": "burnt"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "unknown order status: burnt");
    }

    #[actix_web::test]
    async fn test_listing_survives_cache_outage() {
        let (_store, cache, state) = build_state();
        let app = init_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(json!({
                "customer_name": "Carol",
                "items": ["Salad"],
                "total": 7.25
            }))
            .to_request();
        test::call_service(&app, req).await;

        cache.set_unavailable(true);

        let req = test::TestRequest::get().uri("/api/orders").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["source"], "database");
        assert_eq!(body["count"], 1);
    }

    #[actix_web::test]
    async fn test_listing_fails_when_store_is_down() {
        let (store, _cache, state) = build_state();
        let app = init_app!(state);

        store.set_unavailable(true);

        let req = test::TestRequest::get().uri("/api/orders").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"], json!([]));
        assert!(body["error"].as_str().unwrap().contains("unavailable"));
    }

    #[actix_web::test]
    async fn test_health_reflects_dependency_state() {
        let (store, cache, state) = build_state();
        let app = init_app!(state);

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "connected");
        assert_eq!(body["redis"], "connected");

        cache.set_unavailable(true);
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "degraded");

        store.set_unavailable(true);
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "unhealthy");
    }

    #[actix_web::test]
    async fn test_metrics_exposition() {
        let (_store, _cache, state) = build_state();
        let app = init_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(json!({
                "customer_name": "Dave",
                "items": ["Tea"],
                "total": 3.0
            }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test::read_body(resp).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("orders_created_total 1"));
    }
}
