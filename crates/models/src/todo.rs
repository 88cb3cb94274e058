use chrono::Utc;
use sea_orm::{entity::prelude::*, ActiveModelTrait, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

use crate::errors;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "todo")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub completed: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub completed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    /// Stamp `updated_at` right before any persisted update.
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if !insert {
            self.updated_at = Set(Utc::now().into());
        }
        Ok(self)
    }
}

/// Validated input for a new todo: both fields trimmed, title non-empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTodo {
    title: String,
    description: String,
}

impl NewTodo {
    pub fn new(title: &str, description: Option<&str>) -> Result<Self, errors::ModelError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(errors::ModelError::Validation("title is required".into()));
        }
        Ok(Self {
            title: title.to_string(),
            description: description.map(str::trim).unwrap_or_default().to_string(),
        })
    }

    pub fn title(&self) -> &str { &self.title }

    pub fn description(&self) -> &str { &self.description }
}

/// Partial update. Only fields that are present and non-blank are applied.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl TodoPatch {
    /// Merge onto a fully loaded entity. Returns whether anything changed.
    pub fn apply_to(&self, todo: &mut Model) -> bool {
        let mut changed = false;
        if let Some(title) = non_blank(self.title.as_deref()) {
            changed |= todo.title != title;
            todo.title = title.to_string();
        }
        if let Some(description) = non_blank(self.description.as_deref()) {
            changed |= todo.description != description;
            todo.description = description.to_string();
        }
        changed
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl Model {
    /// Flip `completed` and stamp `completed_at`, whichever the direction.
    pub fn toggled(&self, at: DateTimeWithTimeZone) -> Model {
        Model {
            completed: !self.completed,
            completed_at: Some(at),
            updated_at: at,
            ..self.clone()
        }
    }
}

/// Search input must not be blank; surrounding whitespace is dropped.
pub fn validate_search_query(query: &str) -> Result<&str, errors::ModelError> {
    let q = query.trim();
    if q.is_empty() {
        return Err(errors::ModelError::Validation("title parameter is required".into()));
    }
    Ok(q)
}

/// Insert a new row; the database assigns `id`.
pub async fn create<C>(db: &C, input: &NewTodo) -> Result<Model, errors::ModelError>
where
    C: ConnectionTrait,
{
    let now: DateTimeWithTimeZone = Utc::now().into();
    let am = ActiveModel {
        title: Set(input.title.clone()),
        description: Set(input.description.clone()),
        completed: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        completed_at: Set(None),
        ..Default::default()
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
