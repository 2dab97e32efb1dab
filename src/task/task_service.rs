use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use super::task_dto::{CreateTaskRequest, TaskListResponse, UpdateTaskRequest};
use super::task_filters::TaskQuery;
use super::task_models::Task;
use super::task_repository::TaskRepository;

/// Task operations, always on behalf of an explicit caller.
#[derive(Clone)]
pub struct TaskService {
    repo: Arc<dyn TaskRepository>,
}

fn not_found() -> AppError {
    AppError::NotFound("Not found.".into())
}

impl TaskService {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }

    pub async fn list_tasks(&self, user_id: Uuid, query: TaskQuery) -> Result<TaskListResponse> {
        let (tasks, total) = self.repo.find_all(user_id, &query).await?;
        let total_pages = query.total_pages(total);

        if query.page > 1 && query.page > total_pages {
            return Err(AppError::NotFound("Invalid page.".into()));
        }

        Ok(TaskListResponse {
            data: tasks,
            total,
            page: query.page,
            limit: query.page_size,
            total_pages,
        })
    }

    pub async fn get_task(&self, user_id: Uuid, task_id: Uuid) -> Result<Task> {
        self.repo
            .find_by_id(task_id, user_id)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn create_task(&self, user_id: Uuid, payload: CreateTaskRequest) -> Result<Task> {
        let task = self.repo.create(user_id, &payload.into()).await?;
        tracing::info!(task_id = %task.id, user_id = %user_id, "task created");
        Ok(task)
    }

    pub async fn update_task(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        payload: UpdateTaskRequest,
    ) -> Result<Task> {
        self.repo
            .update(task_id, user_id, &payload.into())
            .await?
            .ok_or_else(not_found)
    }

    /// Unlike reads and updates, a foreign task is reported as forbidden
    /// rather than missing.
    pub async fn delete_task(&self, user_id: Uuid, task_id: Uuid) -> Result<()> {
        let task = self
            .repo
            .find_by_id_any_owner(task_id)
            .await?
            .ok_or_else(not_found)?;

        if task.user_id != user_id {
            tracing::warn!(task_id = %task_id, user_id = %user_id, "refused to delete task owned by another user");
            return Err(AppError::Forbidden(
                "You do not have permission to delete this task.".into(),
            ));
        }

        // A concurrent delete may already have removed the row.
        if self.repo.delete(task_id, user_id).await? == 0 {
            return Err(not_found());
        }

        tracing::info!(task_id = %task_id, user_id = %user_id, "task deleted");
        Ok(())
    }
}
