use crate::{
    auth::{self, auth_dto::*},
    middleware::auth_middleware,
    state::AppState,
    task::{self, task_dto::*, task_models::Task},
    user::user_models::UserResponse,
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::auth_handlers::register,
        auth::auth_handlers::login,
        auth::auth_handlers::refresh_token,
        auth::auth_handlers::logout,
        task::task_handlers::list_tasks,
        task::task_handlers::create_task,
        task::task_handlers::get_task,
        task::task_handlers::update_task,
        task::task_handlers::partial_update_task,
        task::task_handlers::delete_task,
    ),
    components(
        schemas(
            RegisterRequest,
            RegisterResponse,
            LoginRequest,
            TokenPairResponse,
            RefreshTokenRequest,
            RefreshTokenResponse,
            LogoutRequest,
            LogoutResponse,
            UserResponse,
            CreateTaskRequest,
            UpdateTaskRequest,
            TaskListResponse,
            Task,
        )
    ),
    tags(
        (name = "auth", description = "Token issuance and revocation"),
        (name = "tasks", description = "Per-user task management")
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            )
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let auth_routes = Router::new()
        .route("/register/", post(auth::register))
        .route("/login/", post(auth::login))
        .route("/refresh/", post(auth::refresh_token))
        .route("/logout/", post(auth::logout));

    // Protected routes (auth required)
    let task_routes = Router::new()
        .route("/tasks/", get(task::list_tasks).post(task::create_task))
        .route(
            "/task/:id/",
            get(task::get_task)
                .put(task::update_task)
                .patch(task::partial_update_task)
                .delete(task::delete_task),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = Router::new().merge(auth_routes).merge(task_routes);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
