// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::tenancy::TenantScope;

// ---
// Papéis
// ---
/// O conjunto fechado de papéis. Os nomes de fio são os mesmos que o frontend já usa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Operador da plataforma: único papel sem escola, atua em todos os tenants.
    Developer,
    /// Administrador de uma escola.
    SchoolAdmin,
    /// Equipe operacional de uma escola.
    Librarian,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Developer, Role::SchoolAdmin, Role::Librarian];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Developer => "DEVELOPER",
            Role::SchoolAdmin => "SCHOOL_ADMIN",
            Role::Librarian => "LIBRARIAN",
        }
    }

    /// Todo papel, exceto o operador da plataforma, pertence a exatamente uma escola.
    pub fn is_tenant_scoped(self) -> bool {
        !matches!(self, Role::Developer)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---
// Usuário (linha do banco)
// ---
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    pub role: Role,
    pub tenant_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Hash bcrypt de uma senha. Só o `CredentialStore` constrói este tipo,
/// então nenhum store consegue receber uma senha em texto puro.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub(crate) fn from_bcrypt(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

/// Dados de um novo usuário já prontos para o store (e-mail normalizado, senha com hash).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: PasswordHash,
}

/// E-mail é o único identificador de login; comparações são sempre case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Remove espaços nas pontas antes da validação de formato.
pub fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().to_string())
}

// ---
// Identidade canônica da requisição
// ---
/// Quem está chamando e em nome de qual escola. Existe um único campo de tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub tenant_id: Option<Uuid>,
}

impl Identity {
    /// Constrói a identidade a partir do registro, recusando combinações papel/tenant inválidas.
    pub fn from_user(user: &User) -> Option<Self> {
        if user.role.is_tenant_scoped() != user.tenant_id.is_some() {
            return None;
        }
        Some(Self {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            tenant_id: user.tenant_id,
        })
    }

    /// Filtro de leitura: todos os tenants apenas para o operador da plataforma.
    pub fn scope(&self) -> TenantScope {
        match self.tenant_id {
            Some(tenant_id) => TenantScope::Tenant(tenant_id),
            None => TenantScope::AllTenants,
        }
    }
}

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[serde(deserialize_with = "trimmed")]
    #[schema(example = "bibliotecaria@escola.com")]
    pub email: String,
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterDeveloperPayload {
    pub name: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[serde(deserialize_with = "trimmed")]
    pub email: String,
    #[validate(length(min = 8, message = "A senha deve ter no mínimo 8 caracteres."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordPayload {
    #[validate(length(min = 1, message = "A senha atual é obrigatória."))]
    pub current_password: String,
    #[validate(length(min = 8, message = "A senha deve ter no mínimo 8 caracteres."))]
    pub new_password: String,
}

// ---
// Respostas
// ---
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub tenant_id: Option<Uuid>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            tenant_id: user.tenant_id,
        }
    }
}

impl From<&Identity> for UserResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.user_id,
            name: identity.name.clone(),
            email: identity.email.clone(),
            role: identity.role,
            tenant_id: identity.tenant_id,
        }
    }
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub role: Role,
    #[serde(rename = "tenantId")]
    pub tenant_id: Option<Uuid>,
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}
