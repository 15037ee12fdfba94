// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::CookieJar;
use serde_json::json;
use validator::Validate;

use crate::{
    common::{error::AppError, json::AppJson},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{ChangePasswordPayload, LoginUserPayload, RegisterDeveloperPayload, UserResponse},
    services::session::{removal_cookie, session_cookie},
};

// POST /api/auth/register-dev
#[utoipa::path(
    post,
    path = "/api/auth/register-dev",
    tag = "Auth",
    request_body = RegisterDeveloperPayload,
    responses(
        (status = 201, description = "Conta de desenvolvedor criada; cookie de sessão definido", body = UserResponse),
        (status = 400, description = "Desenvolvedor já existe ou e-mail em uso")
    )
)]
pub async fn register_developer(
    State(app_state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<RegisterDeveloperPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let session = app_state
        .auth_service
        .register_developer(payload.name.as_deref(), &payload.email, &payload.password)
        .await?;

    let jar = jar.add(session_cookie(&app_state.config, session.token));
    Ok((StatusCode::CREATED, jar, Json(UserResponse::from(&session.user))))
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Login realizado; cookie de sessão definido", body = UserResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let session = app_state
        .auth_service
        .login_user(&payload.email, &payload.password)
        .await?;

    let jar = jar.add(session_cookie(&app_state.config, session.token));
    Ok((jar, Json(UserResponse::from(&session.user))))
}

// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Cookie de sessão removido"))
)]
pub async fn logout(State(app_state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(removal_cookie(&app_state.config));
    (jar, Json(json!({ "message": "Sessão encerrada." })))
}

// Handler da rota protegida /me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Users",
    responses(
        (status = 200, description = "Identidade da sessão atual", body = UserResponse),
        (status = 401, description = "Não autenticado")
    ),
    security(("session_cookie" = []))
)]
pub async fn get_me(AuthenticatedUser(identity): AuthenticatedUser) -> Json<UserResponse> {
    Json(UserResponse::from(&identity))
}

// PUT /api/auth/password
#[utoipa::path(
    put,
    path = "/api/auth/password",
    tag = "Users",
    request_body = ChangePasswordPayload,
    responses(
        (status = 204, description = "Senha alterada"),
        (status = 400, description = "Senha atual incorreta ou nova senha inválida")
    ),
    security(("session_cookie" = []))
)]
pub async fn change_password(
    State(app_state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    AppJson(payload): AppJson<ChangePasswordPayload>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;

    app_state
        .auth_service
        .change_password(&identity, &payload.current_password, &payload.new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
