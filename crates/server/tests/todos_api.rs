use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use models::todo::{Model as Todo, NewTodo};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::{json, Value};
use service::errors::ServiceError;
use service::todo::repository::mock::MockTodoRepository;
use service::todo::TodoRepository;
use tower::ServiceExt;

use server::routes;
use server::state::ServerState;

const API: &str = "/todos/api/v1";

fn cors() -> tower_http::cors::CorsLayer {
    tower_http::cors::CorsLayer::very_permissive()
}

fn app_with<R: TodoRepository + 'static>(repo: R) -> Router {
    routes::build_router(ServerState::with_repository(Arc::new(repo)), cors())
}

fn build_app() -> Router {
    app_with(MockTodoRepository::default())
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> anyhow::Result<(StatusCode, Value)> {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&v)?))?,
        None => builder.body(Body::empty())?,
    };
    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
    Ok((status, value))
}

async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    raw: &'static str,
) -> anyhow::Result<StatusCode> {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(raw))?;
    Ok(app.clone().oneshot(req).await?.status())
}

async fn create(app: &Router, title: &str, description: &str) -> anyhow::Result<Value> {
    let input = json!({"title": title, "description": description});
    let (status, body) = send(app, "POST", &format!("{API}/create"), Some(input)).await?;
    assert_eq!(status, StatusCode::CREATED);
    Ok(body["todo"].clone())
}

fn ids(v: &Value) -> Vec<i64> {
    v["todos"]
        .as_array()
        .map(|a| a.iter().filter_map(|t| t["id"].as_i64()).collect())
        .unwrap_or_default()
}

fn completed_at(v: &Value) -> anyhow::Result<chrono::DateTime<chrono::FixedOffset>> {
    let raw = v["todo"]["completed_at"].as_str().unwrap_or_default();
    Ok(chrono::DateTime::parse_from_rfc3339(raw)?)
}

#[tokio::test]
async fn create_trims_and_defaults_to_uncompleted() -> anyhow::Result<()> {
    let app = build_app();
    let input = json!({"title": "  Buy milk  ", "description": " 2l "});
    let (status, body) = send(&app, "POST", &format!("{API}/create"), Some(input)).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "todo created successfully");
    assert_eq!(body["todo"]["title"], "Buy milk");
    assert_eq!(body["todo"]["description"], "2l");
    assert_eq!(body["todo"]["completed"], false);
    assert!(body["todo"]["completed_at"].is_null());

    let second = create(&app, "second", "").await?;
    assert!(second["id"].as_i64() > body["todo"]["id"].as_i64());
    Ok(())
}

#[tokio::test]
async fn create_rejects_blank_title_and_persists_nothing() -> anyhow::Result<()> {
    let app = build_app();
    for title in ["", "   ", "\t\n"] {
        let input = json!({"title": title});
        let (status, body) = send(&app, "POST", &format!("{API}/create"), Some(input)).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "title is required");
    }
    let (_, list) = send(&app, "GET", API, None).await?;
    assert_eq!(list["todos"], json!([]));
    Ok(())
}

#[tokio::test]
async fn create_rejects_unparseable_body() -> anyhow::Result<()> {
    let app = build_app();
    let input = json!({"description": "no title"});
    let (status, body) = send(&app, "POST", &format!("{API}/create"), Some(input)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "error parsing request body");

    let status = send_raw(&app, "POST", &format!("{API}/create"), "{not json").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn get_by_id_found_missing_and_invalid() -> anyhow::Result<()> {
    let app = build_app();
    let created = create(&app, "A", "d").await?;
    let id = created["id"].as_i64().unwrap_or_default();

    let (status, body) = send(&app, "GET", &format!("{API}/{id}"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["todo"], created);

    let (status, body) = send(&app, "GET", &format!("{API}/999"), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "todo not found");

    for bad in ["abc", "0", "-1", "99999999999999999999"] {
        let (status, body) = send(&app, "GET", &format!("{API}/{bad}"), None).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{bad}");
        assert_eq!(body["error"], "invalid todo ID");
    }
    Ok(())
}

#[tokio::test]
async fn ids_beyond_the_key_range_are_not_found() -> anyhow::Result<()> {
    let app = build_app();
    let big = "99999999999";

    let (status, body) = send(&app, "GET", &format!("{API}/{big}"), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "todo not found");

    let input = json!({"title": "x"});
    let (status, _) = send(&app, "PUT", &format!("{API}/update/{big}"), Some(input)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "PUT", &format!("{API}/{big}/completed"), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "DELETE", &format!("{API}/delete/{big}"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "todo deleted successfully");
    Ok(())
}

#[tokio::test]
async fn update_merges_only_non_empty_fields() -> anyhow::Result<()> {
    let app = build_app();
    let created = create(&app, "A", "d").await?;
    let uri = format!("{API}/update/{}", created["id"]);

    let input = json!({"title": "", "description": "e"});
    let (status, body) = send(&app, "PUT", &uri, Some(input)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "todo updated successfully");
    assert_eq!(body["todo"]["title"], "A");
    assert_eq!(body["todo"]["description"], "e");

    let (_, body) = send(&app, "PUT", &uri, Some(json!({"title": "B"}))).await?;
    assert_eq!(body["todo"]["title"], "B");
    assert_eq!(body["todo"]["description"], "e");
    assert_eq!(body["todo"]["created_at"], created["created_at"]);

    let (_, body) = send(&app, "GET", &format!("{API}/{}", created["id"]), None).await?;
    assert_eq!(body["todo"]["title"], "B");
    Ok(())
}

#[tokio::test]
async fn update_error_paths() -> anyhow::Result<()> {
    let app = build_app();
    let input = json!({"title": "x"});
    let (status, _) = send(&app, "PUT", &format!("{API}/update/41"), Some(input.clone())).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "PUT", &format!("{API}/update/nope"), Some(input)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let created = create(&app, "A", "").await?;
    let status = send_raw(&app, "PUT", &format!("{API}/update/{}", created["id"]), "[1,2").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn delete_reports_success_whether_or_not_the_todo_exists() -> anyhow::Result<()> {
    let app = build_app();
    let created = create(&app, "A", "").await?;

    let existing = send(&app, "DELETE", &format!("{API}/delete/{}", created["id"]), None).await?;
    let missing = send(&app, "DELETE", &format!("{API}/delete/12345"), None).await?;
    assert_eq!(existing.0, StatusCode::OK);
    assert_eq!(existing, missing);
    assert_eq!(existing.1["message"], "todo deleted successfully");

    let (status, _) = send(&app, "GET", &format!("{API}/{}", created["id"]), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &format!("{API}/delete/x"), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn toggle_twice_restores_state_and_restamps() -> anyhow::Result<()> {
    let app = build_app();
    let created = create(&app, "A", "").await?;
    let uri = format!("{API}/{}/completed", created["id"]);

    let (status, first) = send(&app, "PUT", &uri, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["todo"]["completed"], true);
    assert_eq!(first["message"], "todo marked as completed successfully");

    let (_, second) = send(&app, "PUT", &uri, None).await?;
    assert_eq!(second["todo"]["completed"], false);
    assert_eq!(second["message"], "todo marked as uncompleted successfully");
    assert!(completed_at(&second)? >= completed_at(&first)?);

    let (_, stored) = send(&app, "GET", &format!("{API}/{}", created["id"]), None).await?;
    assert_eq!(stored["todo"]["completed"], false);
    assert_eq!(stored["todo"]["completed_at"], second["todo"]["completed_at"]);

    let (status, _) = send(&app, "PUT", &format!("{API}/77/completed"), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

/// Loads succeed but the row is gone by the time the completion is written,
/// as when a delete lands between the two statements.
struct VanishingRows(MockTodoRepository);

#[async_trait]
impl TodoRepository for VanishingRows {
    async fn create(&self, input: &NewTodo) -> Result<Todo, ServiceError> {
        self.0.create(input).await
    }
    async fn get_all(&self) -> Result<Vec<Todo>, ServiceError> {
        self.0.get_all().await
    }
    async fn get_by_id(&self, id: i32) -> Result<Todo, ServiceError> {
        let found = self.0.get_by_id(id).await?;
        self.0.delete(id).await?;
        Ok(found)
    }
    async fn update(&self, todo: &Todo) -> Result<Todo, ServiceError> {
        self.0.update(todo).await
    }
    async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        self.0.delete(id).await
    }
    async fn mark_completed(
        &self,
        id: i32,
        completed: bool,
        at: DateTimeWithTimeZone,
    ) -> Result<(), ServiceError> {
        self.0.mark_completed(id, completed, at).await
    }
    async fn get_completed(&self) -> Result<Vec<Todo>, ServiceError> {
        self.0.get_completed().await
    }
    async fn get_uncompleted(&self) -> Result<Vec<Todo>, ServiceError> {
        self.0.get_uncompleted().await
    }
    async fn search_by_title(&self, query: &str) -> Result<Vec<Todo>, ServiceError> {
        self.0.search_by_title(query).await
    }
}

#[tokio::test]
async fn toggle_of_a_row_deleted_meanwhile_is_not_found() -> anyhow::Result<()> {
    let app = app_with(VanishingRows(MockTodoRepository::default()));
    let created = create(&app, "A", "").await?;

    let uri = format!("{API}/{}/completed", created["id"]);
    let (status, body) = send(&app, "PUT", &uri, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "todo not found"}));
    Ok(())
}

#[tokio::test]
async fn completed_and_uncompleted_lists() -> anyhow::Result<()> {
    let app = build_app();

    let (status, body) = send(&app, "GET", &format!("{API}/completed"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "No completed todos found"}));
    let (_, body) = send(&app, "GET", &format!("{API}/uncompleted"), None).await?;
    assert_eq!(body, json!({"message": "No uncompleted todos found"}));

    let a = create(&app, "a", "").await?;
    let _b = create(&app, "b", "").await?;
    send(&app, "PUT", &format!("{API}/{}/completed", a["id"]), None).await?;

    let (_, done) = send(&app, "GET", &format!("{API}/completed"), None).await?;
    let (_, open) = send(&app, "GET", &format!("{API}/uncompleted"), None).await?;
    let (_, all) = send(&app, "GET", API, None).await?;

    assert_eq!(ids(&done), vec![a["id"].as_i64().unwrap_or_default()]);
    let mut union = ids(&done);
    union.extend(ids(&open));
    union.sort();
    assert_eq!(union, ids(&all));
    Ok(())
}

#[tokio::test]
async fn search_by_title() -> anyhow::Result<()> {
    let app = build_app();
    for title in ["abc", "xabcx", "ab", "other"] {
        create(&app, title, "").await?;
    }

    let (status, body) = send(&app, "GET", &format!("{API}/search/abc"), None).await?;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body["todos"]
        .as_array()
        .map(|a| a.iter().filter_map(|t| t["title"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(titles, vec!["abc", "xabcx"]);

    let (status, body) = send(&app, "GET", &format!("{API}/search/zzz"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "No todos found with the specified title"}));

    for empty in [format!("{API}/search/"), format!("{API}/search/%20")] {
        let (status, body) = send(&app, "GET", &empty, None).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{empty}");
        assert_eq!(body["error"], "title parameter is required");
    }
    Ok(())
}

#[tokio::test]
async fn storage_failures_are_generic_500s() -> anyhow::Result<()> {
    let app = app_with(MockTodoRepository::failing());

    let (status, body) = send(&app, "GET", API, None).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "error getting todos"}));

    let input = json!({"title": "x"});
    let (status, body) = send(&app, "POST", &format!("{API}/create"), Some(input)).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "error creating todo"}));

    let (status, _) = send(&app, "DELETE", &format!("{API}/delete/1"), None).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}

#[tokio::test]
async fn legacy_paths_reach_the_same_handlers() -> anyhow::Result<()> {
    let app = build_app();
    let (status, body) = send(&app, "POST", "/todos", Some(json!({"title": "legacy"}))).await?;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["todo"]["id"].clone();

    let (status, body) = send(&app, "PUT", &format!("/todos/{id}/complete"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["todo"]["completed"], true);

    let (_, body) = send(&app, "GET", "/todos/completed", None).await?;
    assert_eq!(body["todos"][0]["id"], id);

    let input = json!({"description": "via put"});
    let (_, body) = send(&app, "PUT", &format!("/todos/{id}"), Some(input)).await?;
    assert_eq!(body["todo"]["description"], "via put");

    let (status, _) = send(&app, "DELETE", &format!("/todos/{id}"), None).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/todos/{id}"), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn health_metrics_and_docs() -> anyhow::Result<()> {
    let app = build_app();
    let (status, body) = send(&app, "GET", "/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    create(&app, "counted", "").await?;
    let req = Request::builder().uri("/metrics").body(Body::empty())?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let text = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    assert!(String::from_utf8_lossy(&text).contains("todo_operations_total"));

    let (status, doc) = send(&app, "GET", "/api-docs/openapi.json", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/todos/api/v1/create"].is_object());
    Ok(())
}
