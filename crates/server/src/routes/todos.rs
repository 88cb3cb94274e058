//! Todo handlers: input parsing, trimming, merge and toggle, status mapping.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use common::metrics::record_operation;
use models::todo::{self, Model as Todo, NewTodo, TodoPatch};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{errors::JsonApiError, state::ServerState};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateTodoInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateTodoInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<UpdateTodoInput> for TodoPatch {
    fn from(input: UpdateTodoInput) -> Self {
        TodoPatch { title: input.title, description: input.description }
    }
}

#[derive(Debug, Serialize)]
pub struct TodoResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub todo: Todo,
}

#[derive(Debug, Serialize)]
pub struct TodoListResponse {
    pub todos: Vec<Todo>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Path ids must be positive integers.
pub fn parse_id(raw: &str) -> Result<i64, JsonApiError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(JsonApiError::bad_request("invalid todo ID")),
    }
}

/// A well-formed id past the key range cannot name a stored todo.
fn row_id(id: i64) -> Result<i32, JsonApiError> {
    i32::try_from(id).map_err(|_| JsonApiError::not_found("todo not found"))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, JsonApiError> {
    payload
        .map(|Json(v)| v)
        .map_err(|_| JsonApiError::bad_request("error parsing request body"))
}

/// Empty filtered results are a message, not an empty array.
fn list_or_message(todos: Vec<Todo>, empty: &'static str) -> Response {
    if todos.is_empty() {
        Json(MessageResponse { message: empty }).into_response()
    } else {
        Json(TodoListResponse { todos }).into_response()
    }
}

fn observed<T>(op: &str, res: Result<T, JsonApiError>) -> Result<T, JsonApiError> {
    match &res {
        Ok(_) => record_operation(op, "ok"),
        Err(e) => record_operation(op, e.outcome()),
    }
    res
}

#[utoipa::path(
    post, path = "/todos/api/v1/create", tag = "todos",
    request_body = CreateTodoInput,
    responses(
        (status = 201, description = "Created", body = crate::openapi::TodoEnvelopeDoc),
        (status = 400, description = "Validation Error", body = crate::openapi::ErrorDoc),
        (status = 500, description = "Create Failed", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    payload: Result<Json<CreateTodoInput>, JsonRejection>,
) -> Result<(StatusCode, Json<TodoResponse>), JsonApiError> {
    observed("create", async {
        let input = body(payload)?;
        let new = NewTodo::new(&input.title, input.description.as_deref())?;
        let created = state
            .todos
            .create(&new)
            .await
            .map_err(|e| JsonApiError::from_service(e, "error creating todo"))?;
        info!(id = created.id, "created todo");
        Ok((
            StatusCode::CREATED,
            Json(TodoResponse { message: Some("todo created successfully"), todo: created }),
        ))
    }
    .await)
}

#[utoipa::path(
    get, path = "/todos/api/v1", tag = "todos",
    responses(
        (status = 200, description = "All todos", body = crate::openapi::TodoListDoc),
        (status = 500, description = "List Failed", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn list(
    State(state): State<ServerState>,
) -> Result<Json<TodoListResponse>, JsonApiError> {
    observed("list", async {
        let todos = state
            .todos
            .get_all()
            .await
            .map_err(|e| JsonApiError::from_service(e, "error getting todos"))?;
        info!(count = todos.len(), "list todos");
        Ok(Json(TodoListResponse { todos }))
    }
    .await)
}

#[utoipa::path(
    get, path = "/todos/api/v1/{id}", tag = "todos",
    params(("id" = i32, Path, description = "Todo ID")),
    responses(
        (status = 200, description = "OK", body = crate::openapi::TodoEnvelopeDoc),
        (status = 400, description = "Invalid ID", body = crate::openapi::ErrorDoc),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(raw_id): Path<String>,
) -> Result<Json<TodoResponse>, JsonApiError> {
    observed("get", async {
        let id = row_id(parse_id(&raw_id)?)?;
        let todo = state
            .todos
            .get_by_id(id)
            .await
            .map_err(|e| JsonApiError::from_service(e, "error getting todo"))?;
        Ok(Json(TodoResponse { message: None, todo }))
    }
    .await)
}

#[utoipa::path(
    put, path = "/todos/api/v1/update/{id}", tag = "todos",
    params(("id" = i32, Path, description = "Todo ID")),
    request_body = UpdateTodoInput,
    responses(
        (status = 200, description = "Updated", body = crate::openapi::TodoEnvelopeDoc),
        (status = 400, description = "Validation Error", body = crate::openapi::ErrorDoc),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorDoc),
        (status = 500, description = "Update Failed", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdateTodoInput>, JsonRejection>,
) -> Result<Json<TodoResponse>, JsonApiError> {
    observed("update", async {
        let id = row_id(parse_id(&raw_id)?)?;
        let mut existing = state
            .todos
            .get_by_id(id)
            .await
            .map_err(|e| JsonApiError::from_service(e, "error getting todo"))?;
        let patch: TodoPatch = body(payload)?.into();
        patch.apply_to(&mut existing);
        let updated = state
            .todos
            .update(&existing)
            .await
            .map_err(|e| JsonApiError::from_service(e, "error updating todo"))?;
        info!(id = updated.id, "updated todo");
        Ok(Json(TodoResponse { message: Some("todo updated successfully"), todo: updated }))
    }
    .await)
}

#[utoipa::path(
    delete, path = "/todos/api/v1/delete/{id}", tag = "todos",
    params(("id" = i32, Path, description = "Todo ID")),
    responses(
        (
            status = 200,
            description = "Deleted (also reported for ids that do not exist)",
            body = crate::openapi::MessageDoc
        ),
        (status = 400, description = "Invalid ID", body = crate::openapi::ErrorDoc),
        (status = 500, description = "Delete Failed", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn delete(
    State(state): State<ServerState>,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageResponse>, JsonApiError> {
    observed("delete", async {
        let id = parse_id(&raw_id)?;
        // nothing to remove for ids no row can have
        if let Ok(key) = i32::try_from(id) {
            state
                .todos
                .delete(key)
                .await
                .map_err(|e| JsonApiError::from_service(e, "error deleting todo"))?;
        }
        info!(id, "deleted todo");
        Ok(Json(MessageResponse { message: "todo deleted successfully" }))
    }
    .await)
}

#[utoipa::path(
    put, path = "/todos/api/v1/{id}/completed", tag = "todos",
    params(("id" = i32, Path, description = "Todo ID")),
    responses(
        (status = 200, description = "Completion toggled", body = crate::openapi::TodoEnvelopeDoc),
        (status = 400, description = "Invalid ID", body = crate::openapi::ErrorDoc),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorDoc),
        (status = 500, description = "Update Failed", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn toggle_completed(
    State(state): State<ServerState>,
    Path(raw_id): Path<String>,
) -> Result<Json<TodoResponse>, JsonApiError> {
    observed("toggle", async {
        let id = row_id(parse_id(&raw_id)?)?;
        let existing = state
            .todos
            .get_by_id(id)
            .await
            .map_err(|e| JsonApiError::from_service(e, "error getting todo"))?;
        let toggled = existing.toggled(Utc::now().into());
        let at = toggled.updated_at;
        state
            .todos
            .mark_completed(id, toggled.completed, at)
            .await
            .map_err(|e| JsonApiError::from_service(e, "error updating todo"))?;
        info!(id, completed = toggled.completed, "toggled todo");
        let message = if toggled.completed {
            "todo marked as completed successfully"
        } else {
            "todo marked as uncompleted successfully"
        };
        Ok(Json(TodoResponse { message: Some(message), todo: toggled }))
    }
    .await)
}

#[utoipa::path(
    get, path = "/todos/api/v1/completed", tag = "todos",
    responses(
        (
            status = 200,
            description = "Completed todos, or a message when there are none",
            body = crate::openapi::TodoListDoc
        ),
        (status = 500, description = "List Failed", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn list_completed(State(state): State<ServerState>) -> Result<Response, JsonApiError> {
    observed("list_completed", async {
        let todos = state
            .todos
            .get_completed()
            .await
            .map_err(|e| JsonApiError::from_service(e, "error getting completed todos"))?;
        Ok(list_or_message(todos, "No completed todos found"))
    }
    .await)
}

#[utoipa::path(
    get, path = "/todos/api/v1/uncompleted", tag = "todos",
    responses(
        (
            status = 200,
            description = "Uncompleted todos, or a message when there are none",
            body = crate::openapi::TodoListDoc
        ),
        (status = 500, description = "List Failed", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn list_uncompleted(State(state): State<ServerState>) -> Result<Response, JsonApiError> {
    observed("list_uncompleted", async {
        let todos = state
            .todos
            .get_uncompleted()
            .await
            .map_err(|e| JsonApiError::from_service(e, "error getting uncompleted todos"))?;
        Ok(list_or_message(todos, "No uncompleted todos found"))
    }
    .await)
}

#[utoipa::path(
    get, path = "/todos/api/v1/search/{title}", tag = "todos",
    params(("title" = String, Path, description = "Substring to look for in titles")),
    responses(
        (
            status = 200,
            description = "Matching todos, or a message when there are none",
            body = crate::openapi::TodoListDoc
        ),
        (status = 400, description = "Empty query", body = crate::openapi::ErrorDoc),
        (status = 500, description = "Search Failed", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn search_by_title(
    State(state): State<ServerState>,
    Path(title): Path<String>,
) -> Result<Response, JsonApiError> {
    observed("search", async {
        let query = todo::validate_search_query(&title)?;
        let todos = state
            .todos
            .search_by_title(query)
            .await
            .map_err(|e| JsonApiError::from_service(e, "error searching todos by title"))?;
        info!(query, count = todos.len(), "search todos");
        Ok(list_or_message(todos, "No todos found with the specified title"))
    }
    .await)
}

/// `/search/` with nothing after it.
pub async fn search_without_title() -> JsonApiError {
    record_operation("search", "invalid");
    JsonApiError::bad_request("title parameter is required")
}
