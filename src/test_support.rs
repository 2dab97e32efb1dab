//! In-memory stand-ins for the Postgres repositories plus request helpers, so
//! router tests run without a database.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};

use axum::{
    async_trait,
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::auth_repository::TokenBlacklist;
use crate::auth::AuthService;
use crate::error::{AppError, Result};
use crate::routes::create_router;
use crate::state::{AppState, Config};
use crate::task::task_filters::{SortField, TaskQuery};
use crate::task::task_models::{NewTask, Task, TaskChanges};
use crate::task::task_repository::TaskRepository;
use crate::task::TaskService;
use crate::user::user_models::User;
use crate::user::user_repository::UserRepository;

pub const PASSWORD: &str = "correct horse battery";

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        database_max_connections: 1,
        jwt_secret: "test-secret".to_string(),
        access_token_minutes: 5,
        refresh_token_days: 1,
        bcrypt_cost: 4,
        page_size: 10,
        host: "127.0.0.1".to_string(),
        port: 0,
    }
}

#[derive(Default)]
pub struct InMemoryTaskRepository {
    tasks: Mutex<Vec<Task>>,
    last_created: Mutex<Option<DateTime<Utc>>>,
}

impl InMemoryTaskRepository {
    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    // Strictly increasing so ordering by creation time is deterministic.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let mut last = self.last_created.lock().unwrap();
        let now = match *last {
            Some(previous) if previous >= Utc::now() => previous + Duration::milliseconds(1),
            _ => Utc::now(),
        };
        *last = Some(now);
        now
    }
}

fn matches(task: &Task, query: &TaskQuery) -> bool {
    if query.completed.is_some_and(|completed| task.completed != completed) {
        return false;
    }
    let title = task.title.to_lowercase();
    let description = task.description.as_deref().unwrap_or("").to_lowercase();
    query.search_terms.iter().all(|term| {
        let term = term.to_lowercase();
        title.contains(&term) || description.contains(&term)
    })
}

fn compare(a: &Task, b: &Task, query: &TaskQuery) -> Ordering {
    for key in query.sort_keys() {
        let ordering = match key.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::Completed => a.completed.cmp(&b.completed),
        };
        let ordering = if key.descending { ordering.reverse() } else { ordering };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.id.cmp(&b.id)
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn find_all(&self, user_id: Uuid, query: &TaskQuery) -> Result<(Vec<Task>, i64)> {
        let mut owned: Vec<Task> = self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|task| task.user_id == user_id && matches(task, query))
            .cloned()
            .collect();
        owned.sort_by(|a, b| compare(a, b, query));

        let total = owned.len() as i64;
        let page = owned
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.page_size as usize)
            .collect();
        Ok((page, total))
    }

    async fn find_by_id(&self, id: Uuid, user_id: Uuid) -> Result<Option<Task>> {
        let tasks = self.tasks.lock().unwrap();
        Ok(tasks.iter().find(|t| t.id == id && t.user_id == user_id).cloned())
    }

    async fn find_by_id_any_owner(&self, id: Uuid) -> Result<Option<Task>> {
        let tasks = self.tasks.lock().unwrap();
        Ok(tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn create(&self, user_id: Uuid, task: &NewTask) -> Result<Task> {
        let task = Task {
            id: Uuid::new_v4(),
            title: task.title.clone(),
            description: task.description.clone(),
            completed: task.completed,
            created_at: self.next_timestamp(),
            user_id,
        };
        self.tasks.lock().unwrap().push(task.clone());
        Ok(task)
    }

    async fn update(&self, id: Uuid, user_id: Uuid, changes: &TaskChanges) -> Result<Option<Task>> {
        let mut tasks = self.tasks.lock().unwrap();
        let Some(task) = tasks.iter_mut().find(|t| t.id == id && t.user_id == user_id) else {
            return Ok(None);
        };
        if let Some(title) = &changes.title {
            task.title = title.clone();
        }
        if let Some(description) = &changes.description {
            task.description = description.clone();
        }
        if let Some(completed) = changes.completed {
            task.completed = completed;
        }
        task.user_id = user_id;
        Ok(Some(task.clone()))
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<u64> {
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|t| !(t.id == id && t.user_id == user_id));
        Ok((before - tasks.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, username: &str, password_hash: &str) -> Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == user_id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryTokenBlacklist {
    entries: Mutex<Vec<Uuid>>,
    failing: AtomicBool,
}

impl InMemoryTokenBlacklist {
    /// Makes every subsequent `blacklist` call fail like an unreachable store.
    pub fn fail_writes(&self) {
        self.failing.store(true, AtomicOrdering::SeqCst);
    }
}

#[async_trait]
impl TokenBlacklist for InMemoryTokenBlacklist {
    async fn blacklist(&self, jti: Uuid, _user_id: Uuid, _expires_at: DateTime<Utc>) -> Result<bool> {
        if self.failing.load(AtomicOrdering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        let mut entries = self.entries.lock().unwrap();
        if entries.contains(&jti) {
            return Ok(false);
        }
        entries.push(jti);
        Ok(true)
    }

    async fn is_blacklisted(&self, jti: Uuid) -> Result<bool> {
        Ok(self.entries.lock().unwrap().contains(&jti))
    }
}

pub struct TestApp {
    pub router: Router,
    pub tasks: Arc<InMemoryTaskRepository>,
    pub blacklist: Arc<InMemoryTokenBlacklist>,
}

/// Tokens held by one registered user.
pub struct Session {
    pub user_id: Uuid,
    pub access: String,
    pub refresh: String,
}

impl TestApp {
    pub fn new() -> Self {
        let config = Arc::new(test_config());
        let tasks = Arc::new(InMemoryTaskRepository::default());
        let users = Arc::new(InMemoryUserRepository::default());
        let blacklist = Arc::new(InMemoryTokenBlacklist::default());

        let state = AppState {
            auth_service: AuthService::new(users, blacklist.clone(), &config).unwrap(),
            task_service: TaskService::new(tasks.clone()),
            config,
        };

        Self {
            router: create_router(state),
            tasks,
            blacklist,
        }
    }

    pub async fn register(&self, username: &str) -> Session {
        let (status, body) = send(
            &self.router,
            Method::POST,
            "/api/register/",
            None,
            Some(json!({"username": username, "password": PASSWORD})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        Session {
            user_id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
            access: body["access"].as_str().unwrap().to_string(),
            refresh: body["refresh"].as_str().unwrap().to_string(),
        }
    }

    pub async fn login(&self, username: &str) -> Session {
        let (status, body) = send(
            &self.router,
            Method::POST,
            "/api/login/",
            None,
            Some(json!({"username": username, "password": PASSWORD})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        let access = body["access"].as_str().unwrap().to_string();
        let claims = crate::auth::jwt::verify_jwt(
            &access,
            crate::auth::jwt::TokenType::Access,
            &test_config().jwt_secret,
        )
        .unwrap();

        Session {
            user_id: claims.user_id().unwrap(),
            access,
            refresh: body["refresh"].as_str().unwrap().to_string(),
        }
    }
}

impl Session {
    pub async fn send(
        &self,
        app: &TestApp,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        send(&app.router, method, path, Some(self.access.as_str()), body).await
    }

    pub async fn create_task(&self, app: &TestApp, body: Value) -> String {
        let (status, task) = self.send(app, Method::POST, "/api/tasks/", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", task);
        task["id"].as_str().unwrap().to_string()
    }
}

pub async fn send(
    router: &Router,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}
