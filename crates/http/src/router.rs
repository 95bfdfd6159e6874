//! Router builder for the Libris HTTP server

use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode},
    middleware,
    routing::{get, MethodRouter},
    Router,
};
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use uuid::Uuid;

use libris_kernel::ModuleRegistry;

use crate::error::{self, ErrorPolicy};

/// Builder for constructing the main HTTP router.
///
/// Layers only wrap what is already registered, so routes, module mounts and
/// the fallback go first and middleware last.
pub struct RouterBuilder {
    router: Router,
    base_path: String,
}

impl RouterBuilder {
    /// Create a router builder mounting modules under `base_path`
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            router: Router::new(),
            base_path: base_path.into(),
        }
    }

    /// Path a module is mounted at
    pub fn module_path(&self, module_name: &str) -> String {
        format!("{}/{}", self.base_path, module_name)
    }

    /// Add a route to the router
    pub fn route(mut self, path: &str, route: MethodRouter) -> Self {
        self.router = self.router.route(path, route);
        self
    }

    /// Mount a module's router under `{base_path}/{module_name}`
    pub fn mount_module(mut self, module_name: &str, module_router: Router) -> Self {
        let path = self.module_path(module_name);
        self.router = self.router.nest(&path, module_router);
        self
    }

    /// Answer unroutable requests with a `not_found` error
    pub fn with_not_found_fallback(mut self) -> Self {
        self.router = self.router.fallback(error::not_found);
        self
    }

    /// Render every failure as the uniform error envelope
    pub fn with_error_normalizer(mut self, policy: ErrorPolicy) -> Self {
        self.router = self
            .router
            .layer(middleware::from_fn_with_state(policy, error::normalize_errors));
        self
    }

    /// Add tracing middleware
    pub fn with_tracing(mut self) -> Self {
        self.router = self.router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        );
        self
    }

    /// Add CORS middleware
    pub fn with_cors(mut self) -> Self {
        self.router = self.router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
        self
    }

    /// Set `x-request-id` on requests lacking one and echo it on responses
    pub fn with_request_id(mut self) -> Self {
        self.router = self.router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
                .layer(PropagateRequestIdLayer::x_request_id()),
        );
        self
    }

    /// Add timeout middleware
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.router = self
            .router
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_millis(timeout_ms),
            ));
        self
    }

    /// Turn handler panics into 500 responses. Must sit inside the error normalizer.
    pub fn with_panic_recovery(mut self) -> Self {
        self.router = self.router.layer(CatchPanicLayer::new());
        self
    }

    /// Serve `/docs/openapi.json`, merging the fragments every module contributes
    pub fn with_openapi(mut self, registry: &ModuleRegistry) -> Self {
        let document = self.openapi_document(registry);
        self.router = self.router.route(
            "/docs/openapi.json",
            get(move || async move { axum::Json(document.clone()) }),
        );
        self
    }

    fn openapi_document(&self, registry: &ModuleRegistry) -> Value {
        let info = utoipa::openapi::InfoBuilder::new()
            .title("Libris API")
            .version(env!("CARGO_PKG_VERSION"))
            .description(Some("Authors and books catalog"))
            .build();
        let base = utoipa::openapi::OpenApiBuilder::new().info(info).build();
        let mut spec = serde_json::to_value(&base).unwrap_or_else(|_| json!({}));

        spec["paths"] = json!({});
        spec["components"]["schemas"]["ErrorResponse"] = error_response_schema();

        for module in registry.modules() {
            let Some(fragment) = module.openapi() else {
                continue;
            };
            let mount = self.module_path(module.name());

            if let Some(paths) = fragment.get("paths").and_then(Value::as_object) {
                for (path, item) in paths {
                    let full = if path == "/" {
                        mount.clone()
                    } else {
                        format!("{mount}{path}")
                    };
                    spec["paths"][full] = item.clone();
                }
            }

            if let Some(schemas) = fragment
                .get("components")
                .and_then(|components| components.get("schemas"))
                .and_then(Value::as_object)
            {
                for (name, schema) in schemas {
                    spec["components"]["schemas"][name] = schema.clone();
                }
            }
        }

        spec
    }

    /// Build the final router
    pub fn build(self) -> Router {
        self.router
    }
}

fn error_response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "error": {
                "type": "object",
                "properties": {
                    "message": { "type": "string" },
                    "status": { "type": "integer" },
                    "path": { "type": "string" },
                    "method": { "type": "string" },
                    "timestamp": { "type": "string", "format": "date-time" },
                    "code": { "type": "string" },
                    "details": {},
                    "stack": { "type": "string" }
                },
                "required": ["message", "status", "path", "method", "timestamp"]
            }
        },
        "required": ["error"]
    })
}

/// Request ID generator: time-ordered UUID v7
#[derive(Clone, Copy)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let request_id = Uuid::now_v7().to_string().parse::<HeaderValue>().ok()?;
        Some(RequestId::new(request_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use tower::ServiceExt;

    fn request(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_module_mounting_respects_base_path() {
        let module_router = Router::new().route("/", get(|| async { "module" }));

        let router = RouterBuilder::new("/api")
            .mount_module("books", module_router)
            .build();

        let response = router.clone().oneshot(request("/api/books")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router.oneshot(request("/books")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_request_id_is_generated_and_propagated() {
        let router = RouterBuilder::new("")
            .route("/health", get(|| async { "ok" }))
            .with_request_id()
            .build();

        let response = router.clone().oneshot(request("/health")).await.unwrap();
        let generated = response.headers().get("x-request-id").unwrap();
        assert!(Uuid::parse_str(generated.to_str().unwrap()).is_ok());

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }

    #[tokio::test]
    async fn test_full_middleware_chain_normalizes_fallback() {
        let router = RouterBuilder::new("")
            .route("/health", get(|| async { "ok" }))
            .with_not_found_fallback()
            .with_timeout(5000)
            .with_error_normalizer(ErrorPolicy::default())
            .with_tracing()
            .with_request_id()
            .with_cors()
            .build();

        let response = router.clone().oneshot(request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router.oneshot(request("/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key("x-request-id"));
    }

    async fn boom() -> &'static str {
        panic!("catalog lock poisoned")
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_error_envelope() {
        let router = RouterBuilder::new("")
            .route("/boom", get(boom))
            .with_panic_recovery()
            .with_error_normalizer(ErrorPolicy::default())
            .build();

        let response = router.oneshot(request("/boom")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"]["status"], 500);
        assert_eq!(json["error"]["message"], "Internal Server Error");
        assert_eq!(json["error"]["path"], "/boom");
    }

    #[tokio::test]
    async fn test_slow_handler_times_out_with_request_timeout() {
        let router = RouterBuilder::new("")
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
            .with_timeout(10)
            .with_error_normalizer(ErrorPolicy::default())
            .build();

        let response = router.oneshot(request("/slow")).await.unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"]["code"], "request_timeout");
    }
}
