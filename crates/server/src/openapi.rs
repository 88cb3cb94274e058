use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

/// Wire shape of a todo.
#[derive(ToSchema)]
pub struct TodoDoc {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub completed: bool,
    /// RFC 3339 timestamp
    pub created_at: String,
    pub updated_at: String,
    /// `null` until the first toggle
    pub completed_at: Option<String>,
}

#[derive(ToSchema)]
pub struct TodoEnvelopeDoc {
    pub message: Option<String>,
    pub todo: TodoDoc,
}

#[derive(ToSchema)]
pub struct TodoListDoc { pub todos: Vec<TodoDoc> }

#[derive(ToSchema)]
pub struct MessageDoc { pub message: String }

#[derive(ToSchema)]
pub struct ErrorDoc { pub error: String }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::todos::create,
        crate::routes::todos::list,
        crate::routes::todos::get_by_id,
        crate::routes::todos::update,
        crate::routes::todos::delete,
        crate::routes::todos::toggle_completed,
        crate::routes::todos::list_completed,
        crate::routes::todos::list_uncompleted,
        crate::routes::todos::search_by_title,
    ),
    components(
        schemas(
            HealthResponse,
            TodoDoc,
            TodoEnvelopeDoc,
            TodoListDoc,
            MessageDoc,
            ErrorDoc,
            crate::routes::todos::CreateTodoInput,
            crate::routes::todos::UpdateTodoInput,
        )
    ),
    tags(
        (name = "health"),
        (name = "todos")
    )
)]
pub struct ApiDoc;
