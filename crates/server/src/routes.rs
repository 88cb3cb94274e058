pub mod todos;

use axum::{
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::{metrics, types::Health};

use crate::openapi::ApiDoc;
use crate::state::ServerState;

#[utoipa::path(
    get, path = "/health", tag = "health",
    responses((status = 200, description = "OK", body = crate::openapi::HealthResponse))
)]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics_handler() -> (StatusCode, String) {
    metrics::encode_metrics()
}

/// Versioned todo API.
pub fn todo_routes() -> Router<ServerState> {
    Router::new()
        .route("/todos/api/v1", get(todos::list))
        .route("/todos/api/v1/create", post(todos::create))
        .route("/todos/api/v1/completed", get(todos::list_completed))
        .route("/todos/api/v1/uncompleted", get(todos::list_uncompleted))
        .route("/todos/api/v1/search/", get(todos::search_without_title))
        .route("/todos/api/v1/search/:title", get(todos::search_by_title))
        .route("/todos/api/v1/update/:id", put(todos::update))
        .route("/todos/api/v1/delete/:id", delete(todos::delete))
        .route("/todos/api/v1/:id", get(todos::get_by_id))
        .route("/todos/api/v1/:id/completed", put(todos::toggle_completed))
}

/// Earlier resource-style paths, served by the same handlers.
pub fn legacy_todo_routes() -> Router<ServerState> {
    Router::new()
        .route("/todos", get(todos::list).post(todos::create))
        .route("/todos/completed", get(todos::list_completed))
        .route("/todos/uncompleted", get(todos::list_uncompleted))
        .route(
            "/todos/:id",
            get(todos::get_by_id).put(todos::update).delete(todos::delete),
        )
        .route("/todos/:id/complete", put(todos::toggle_completed))
}

/// Build the full application router: todo API, health, metrics and docs
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    public
        .merge(todo_routes())
        .merge(legacy_todo_routes())
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                // 响应返回时打点，包含状态码与耗时
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
