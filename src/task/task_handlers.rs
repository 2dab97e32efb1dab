use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, Result},
    extract::{AppJson, AppPath},
    middleware::AuthUser,
    state::AppState,
};
use super::{
    task_dto::{CreateTaskRequest, TaskListResponse, UpdateTaskRequest},
    task_filters::{TaskListParams, TaskQuery},
    task_models::Task,
};

/// List the authenticated user's tasks
#[utoipa::path(
    get,
    path = "/api/tasks/",
    params(
        ("search" = Option<String>, Query, description = "Case-insensitive substring match on title or description"),
        ("completed" = Option<bool>, Query, description = "Filter by completion state"),
        ("ordering" = Option<String>, Query, description = "created_at, completed; prefix with - for descending"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("page_size" = Option<u32>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Page of tasks", body = TaskListResponse),
        (status = 400, description = "Invalid filter value"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Invalid page")
    ),
    tag = "tasks",
    security(("bearer_auth" = []))
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<TaskListParams>,
) -> Result<Json<TaskListResponse>> {
    let query = TaskQuery::from_params(params, state.config.page_size)?;
    let page = state.task_service.list_tasks(user_id, query).await?;
    Ok(Json(page))
}

/// Create a task owned by the authenticated user
#[utoipa::path(
    post,
    path = "/api/tasks/",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "tasks",
    security(("bearer_auth" = []))
)]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<CreateTaskRequest>,
) -> Result<impl IntoResponse> {
    let payload = payload.normalized();
    payload.validate()?;

    let task = state.task_service.create_task(user_id, payload).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Retrieve one of the authenticated user's tasks
#[utoipa::path(
    get,
    path = "/api/task/{id}/",
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task", body = Task),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found")
    ),
    tag = "tasks",
    security(("bearer_auth" = []))
)]
pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(task_id): AppPath<Uuid>,
) -> Result<Json<Task>> {
    let task = state.task_service.get_task(user_id, task_id).await?;
    Ok(Json(task))
}

/// Replace a task's fields (title required)
#[utoipa::path(
    put,
    path = "/api/task/{id}/",
    params(("id" = Uuid, Path, description = "Task id")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found")
    ),
    tag = "tasks",
    security(("bearer_auth" = []))
)]
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(task_id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateTaskRequest>,
) -> Result<Json<Task>> {
    if payload.title.is_none() {
        return Err(AppError::Validation("title: This field is required.".to_string()));
    }
    apply_update(state, user_id, task_id, payload).await
}

/// Update a subset of a task's fields
#[utoipa::path(
    patch,
    path = "/api/task/{id}/",
    params(("id" = Uuid, Path, description = "Task id")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found")
    ),
    tag = "tasks",
    security(("bearer_auth" = []))
)]
pub async fn partial_update_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(task_id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateTaskRequest>,
) -> Result<Json<Task>> {
    apply_update(state, user_id, task_id, payload).await
}

async fn apply_update(
    state: AppState,
    user_id: Uuid,
    task_id: Uuid,
    payload: UpdateTaskRequest,
) -> Result<Json<Task>> {
    let payload = payload.normalized();
    payload.validate()?;

    let task = state.task_service.update_task(user_id, task_id, payload).await?;
    Ok(Json(task))
}

/// Delete a task; only its owner may do so
#[utoipa::path(
    delete,
    path = "/api/task/{id}/",
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Task belongs to another user"),
        (status = 404, description = "Not found")
    ),
    tag = "tasks",
    security(("bearer_auth" = []))
)]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(task_id): AppPath<Uuid>,
) -> Result<StatusCode> {
    state.task_service.delete_task(user_id, task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
