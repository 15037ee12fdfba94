// src/middleware/rbac.rs

use std::fmt;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    common::error::{AppError, AuthFailure},
    middleware::auth::AuthenticatedUser,
    models::auth::{Identity, Role},
};

/// Conjunto de papéis permitidos numa rota.
///
/// É um bitset sobre o enum fechado `Role`, então a checagem é uma única
/// operação e não existe comparação de strings espalhada pelos handlers.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const DEVELOPER_ONLY: RoleSet = RoleSet::of(&[Role::Developer]);
    pub const SCHOOL_ADMIN_ONLY: RoleSet = RoleSet::of(&[Role::SchoolAdmin]);
    pub const SCHOOL_STAFF: RoleSet = RoleSet::of(&[Role::SchoolAdmin, Role::Librarian]);
    pub const ANY_ROLE: RoleSet = RoleSet::of(&Role::ALL);

    pub const fn of(roles: &[Role]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < roles.len() {
            bits |= Self::bit(roles[i]);
            i += 1;
        }
        RoleSet(bits)
    }

    const fn bit(role: Role) -> u8 {
        match role {
            Role::Developer => 1,
            Role::SchoolAdmin => 1 << 1,
            Role::Librarian => 1 << 2,
        }
    }

    pub const fn admits(self, role: Role) -> bool {
        self.0 & Self::bit(role) != 0
    }

    pub fn roles(self) -> impl Iterator<Item = Role> {
        Role::ALL.into_iter().filter(move |role| self.admits(*role))
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, role) in self.roles().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(role.as_str())?;
        }
        Ok(())
    }
}

impl fmt::Debug for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.roles()).finish()
    }
}

/// O único predicado de autorização da aplicação.
pub fn authorize(identity: &Identity, allowed: RoleSet) -> Result<(), AppError> {
    if allowed.admits(identity.role) {
        return Ok(());
    }

    tracing::info!(
        user_id = %identity.user_id,
        role = %identity.role,
        %allowed,
        "acesso negado pelo papel"
    );
    Err(AppError::Forbidden(allowed))
}

// Middleware de rota: `from_fn_with_state(RoleSet::X, role_gate)`, aplicado depois do `auth_guard`
pub async fn role_gate(
    State(allowed): State<RoleSet>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let AuthenticatedUser(identity) = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or(AppError::Unauthenticated(AuthFailure::MissingIdentity))?;

    authorize(identity, allowed)?;

    Ok(next.run(request).await)
}
