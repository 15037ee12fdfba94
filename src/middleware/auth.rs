// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::{
    common::error::{AppError, AuthFailure},
    config::AppState,
    models::auth::Identity,
};

// O middleware em si: resolve o cookie de sessão numa identidade
pub async fn auth_guard(
    State(app_state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = jar
        .get(&app_state.config.session_cookie_name)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty())
        .ok_or(AppError::Unauthenticated(AuthFailure::MissingToken))?;

    let identity = app_state.auth_service.resolve_identity(&token).await?;

    // Insere a identidade nos "extensions" da requisição
    request.extensions_mut().insert(AuthenticatedUser(identity));
    Ok(next.run(request).await)
}

// Extrator para obter a identidade autenticada diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::Unauthenticated(AuthFailure::MissingIdentity))
    }
}
