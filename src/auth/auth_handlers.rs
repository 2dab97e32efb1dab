use crate::{
    error::Result,
    extract::AppJson,
    state::AppState,
};
use super::auth_dto::{
    LoginRequest, LogoutRequest, LogoutResponse, RefreshTokenRequest, RefreshTokenResponse,
    RegisterRequest, RegisterResponse, TokenPairResponse,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/register/",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = RegisterResponse),
        (status = 400, description = "Validation error or username taken")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let (user, tokens) = state
        .auth_service
        .register(&payload.username, &payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            access: tokens.access,
            refresh: tokens.refresh,
            user: user.into(),
        }),
    ))
}

/// Exchange credentials for an access and a refresh token
#[utoipa::path(
    post,
    path = "/api/login/",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenPairResponse),
        (status = 400, description = "Malformed request"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<TokenPairResponse>> {
    let tokens = state
        .auth_service
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(tokens))
}

/// Refresh access token
#[utoipa::path(
    post,
    path = "/api/refresh/",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Token refreshed successfully", body = RefreshTokenResponse),
        (status = 400, description = "Malformed request"),
        (status = 401, description = "Invalid, expired or blacklisted refresh token")
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshTokenRequest>,
) -> Result<Json<RefreshTokenResponse>> {
    let access = state
        .auth_service
        .refresh_access_token(&payload.refresh)
        .await?;

    Ok(Json(RefreshTokenResponse { access }))
}

/// Logout (blacklist refresh token)
#[utoipa::path(
    post,
    path = "/api/logout/",
    request_body = LogoutRequest,
    responses(
        (status = 200, description = "Logged out successfully", body = LogoutResponse),
        (status = 400, description = "Missing, invalid or already revoked token")
    ),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    payload: Option<Json<LogoutRequest>>,
) -> Result<Json<LogoutResponse>> {
    let Json(payload) = payload.unwrap_or_default();

    state.auth_service.logout(payload.refresh.as_deref()).await?;

    Ok(Json(LogoutResponse {
        detail: "Successfully logged out.".to_string(),
    }))
}
