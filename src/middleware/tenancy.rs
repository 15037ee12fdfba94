// src/middleware/tenancy.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::{
    common::error::{AppError, AuthFailure},
    middleware::auth::AuthenticatedUser,
    models::{auth::Identity, tenancy::TenantScope},
};

fn identity(parts: &Parts) -> Result<&Identity, AppError> {
    parts
        .extensions
        .get::<AuthenticatedUser>()
        .map(|AuthenticatedUser(identity)| identity)
        .ok_or(AppError::Unauthenticated(AuthFailure::MissingIdentity))
}

/// Escola em nome da qual uma escrita é feita.
///
/// Vem sempre da identidade autenticada. Não existe cabeçalho nem campo de
/// corpo que a substitua, então um registro novo nunca é carimbado com um
/// tenant escolhido pelo cliente.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub Uuid);

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity(parts)?
            .tenant_id
            .map(TenantContext)
            .ok_or(AppError::TenantRequired)
    }
}

/// Filtro de leitura da requisição: a escola do chamador, ou todas para o operador.
#[derive(Debug, Clone, Copy)]
pub struct Scoped(pub TenantScope);

impl<S> FromRequestParts<S> for Scoped
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Scoped(identity(parts)?.scope()))
    }
}
