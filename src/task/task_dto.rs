use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::task_models::{NewTask, Task, TaskChanges};

/// Body of `POST /tasks/`. Unknown fields such as `user`, `id` or
/// `created_at` are dropped during deserialization.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200), custom(function = "reject_nul"))]
    pub title: String,
    #[validate(custom(function = "reject_nul"))]
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl CreateTaskRequest {
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self
    }
}

impl From<CreateTaskRequest> for NewTask {
    fn from(payload: CreateTaskRequest) -> Self {
        Self {
            title: payload.title,
            description: payload.description,
            completed: payload.completed.unwrap_or(false),
        }
    }
}

/// Body of `PUT`/`PATCH /task/{id}/`. An explicit `"description": null`
/// clears the description; leaving the key out keeps it.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200), custom(function = "reject_nul"))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present_field")]
    #[schema(value_type = Option<String>)]
    #[validate(custom(function = "reject_nul"))]
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
}

impl UpdateTaskRequest {
    pub fn normalized(mut self) -> Self {
        self.title = self.title.map(|title| title.trim().to_string());
        self
    }
}

impl From<UpdateTaskRequest> for TaskChanges {
    fn from(payload: UpdateTaskRequest) -> Self {
        Self {
            title: payload.title,
            description: payload.description,
            completed: payload.completed,
        }
    }
}

// Postgres text columns cannot store NUL.
fn reject_nul(value: &str) -> Result<(), ValidationError> {
    if value.contains('\0') {
        let mut err = ValidationError::new("null_character");
        err.message = Some("Null characters are not allowed.".into());
        return Err(err);
    }
    Ok(())
}

/// Wraps a present key in `Some`, so `null` becomes `Some(None)` while a
/// missing key stays `None` through `#[serde(default)]`.
fn present_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TaskListResponse {
    pub data: Vec<Task>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}
