// src/handlers/tenancy.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        json::{AppJson, AppPath},
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::{
        auth::{Role, UserResponse},
        tenancy::{ChangeRolePayload, CreateSchoolPayload, CreateStaffPayload, SchoolCreatedResponse, Tenant},
    },
};

// ---
// Escolas (operador da plataforma)
// ---
#[utoipa::path(
    post,
    path = "/api/schools",
    tag = "Tenancy",
    request_body = CreateSchoolPayload,
    responses(
        (status = 201, description = "Escola e administrador criados", body = SchoolCreatedResponse),
        (status = 400, description = "Dados inválidos ou e-mail em uso"),
        (status = 403, description = "Apenas DEVELOPER")
    ),
    security(("session_cookie" = []))
)]
pub async fn create_school(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<CreateSchoolPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (school, admin) = app_state
        .tenant_service
        .create_school(&payload.name, &payload.admin)
        .await?;

    let body = SchoolCreatedResponse {
        school,
        admin: UserResponse::from(&admin),
    };
    Ok((StatusCode::CREATED, Json(body)))
}

#[utoipa::path(
    get,
    path = "/api/schools",
    tag = "Tenancy",
    responses((status = 200, description = "Todas as escolas", body = Vec<Tenant>)),
    security(("session_cookie" = []))
)]
pub async fn list_schools(State(app_state): State<AppState>) -> Result<Json<Vec<Tenant>>, AppError> {
    let schools = app_state.tenant_service.list_schools().await?;
    Ok(Json(schools))
}

#[utoipa::path(
    get,
    path = "/api/schools/current",
    tag = "Tenancy",
    responses((status = 200, description = "A escola do usuário autenticado", body = Tenant)),
    security(("session_cookie" = []))
)]
pub async fn current_school(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<Tenant>, AppError> {
    let school = app_state.tenant_service.get_school(tenant.0).await?;
    Ok(Json(school))
}

// ---
// Equipe (administrador da escola)
// ---
#[utoipa::path(
    post,
    path = "/api/staff",
    tag = "Staff",
    request_body = CreateStaffPayload,
    responses(
        (status = 201, description = "Usuário criado na escola do chamador", body = UserResponse),
        (status = 400, description = "Dados inválidos, papel inválido ou e-mail em uso")
    ),
    security(("session_cookie" = []))
)]
pub async fn create_staff(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    AppJson(payload): AppJson<CreateStaffPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let role = payload.role.unwrap_or(Role::Librarian);
    let user = app_state
        .tenant_service
        .provision_staff(tenant.0, &payload.account, role)
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

#[utoipa::path(
    get,
    path = "/api/staff",
    tag = "Staff",
    responses((status = 200, description = "Usuários da escola do chamador", body = Vec<UserResponse>)),
    security(("session_cookie" = []))
)]
pub async fn list_staff(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = app_state.tenant_service.list_staff(tenant.0).await?;
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    put,
    path = "/api/staff/{id}/role",
    tag = "Staff",
    request_body = ChangeRolePayload,
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Papel alterado; sessões antigas do usuário deixam de valer", body = UserResponse),
        (status = 404, description = "Usuário não encontrado nesta escola")
    ),
    security(("session_cookie" = []))
)]
pub async fn change_role(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    AuthenticatedUser(actor): AuthenticatedUser,
    AppPath(user_id): AppPath<Uuid>,
    AppJson(payload): AppJson<ChangeRolePayload>,
) -> Result<Json<UserResponse>, AppError> {
    let user = app_state
        .tenant_service
        .change_role(tenant.0, &actor, user_id, payload.role)
        .await?;

    Ok(Json(UserResponse::from(&user)))
}
