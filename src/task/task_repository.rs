use axum::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::Result;
use super::task_filters::{like_pattern, TaskQuery};
use super::task_models::{NewTask, Task, TaskChanges};

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// One page of the owner's tasks plus the total match count.
    async fn find_all(&self, user_id: Uuid, query: &TaskQuery) -> Result<(Vec<Task>, i64)>;

    async fn find_by_id(&self, id: Uuid, user_id: Uuid) -> Result<Option<Task>>;

    /// Unscoped lookup, used only where ownership is checked explicitly.
    async fn find_by_id_any_owner(&self, id: Uuid) -> Result<Option<Task>>;

    async fn create(&self, user_id: Uuid, task: &NewTask) -> Result<Task>;

    async fn update(&self, id: Uuid, user_id: Uuid, changes: &TaskChanges) -> Result<Option<Task>>;

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<u64>;
}

#[derive(Clone)]
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, user_id: Uuid, query: &TaskQuery) {
    builder.push(" WHERE user_id = ").push_bind(user_id);

    if let Some(completed) = query.completed {
        builder.push(" AND completed = ").push_bind(completed);
    }

    for term in &query.search_terms {
        let pattern = like_pattern(term);
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR COALESCE(description, '') ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn find_all(&self, user_id: Uuid, query: &TaskQuery) -> Result<(Vec<Task>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks");
        push_filters(&mut count, user_id, query);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM tasks");
        push_filters(&mut select, user_id, query);
        select
            .push(" ORDER BY ")
            .push(query.order_by_clause())
            .push(" LIMIT ")
            .push_bind(i64::from(query.page_size))
            .push(" OFFSET ")
            .push_bind(query.offset());

        let tasks = select.build_query_as::<Task>().fetch_all(&self.pool).await?;
        Ok((tasks, total))
    }

    async fn find_by_id(&self, id: Uuid, user_id: Uuid) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn find_by_id_any_owner(&self, id: Uuid) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn create(&self, user_id: Uuid, task: &NewTask) -> Result<Task> {
        let task = sqlx::query_as::<_, Task>(
            "INSERT INTO tasks (user_id, title, description, completed)
             VALUES ($1, $2, $3, $4)
             RETURNING *"
        )
        .bind(user_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.completed)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    async fn update(&self, id: Uuid, user_id: Uuid, changes: &TaskChanges) -> Result<Option<Task>> {
        // The owner column is re-stamped so no update can move a task elsewhere.
        let task = sqlx::query_as::<_, Task>(
            "UPDATE tasks SET
                title = COALESCE($1, title),
                description = CASE WHEN $2 THEN $3 ELSE description END,
                completed = COALESCE($4, completed),
                user_id = $5
             WHERE id = $6 AND user_id = $5
             RETURNING *"
        )
        .bind(&changes.title)
        .bind(changes.description.is_some())
        .bind(changes.description.as_ref().and_then(Option::as_deref))
        .bind(changes.completed)
        .bind(user_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
