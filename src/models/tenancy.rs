// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::models::auth::{trimmed, Role, UserResponse};

// ---
// 1. Tenant (a "Escola")
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    #[schema(example = "Escola Estadual Machado de Assis")]
    pub name: String,
    // Referência fraca: a escola não é dona do ciclo de vida do admin
    pub admin_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// ---
// 2. Escopo de leitura
// ---
/// Filtro aplicado a toda leitura de coleções que pertencem a uma escola.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantScope {
    /// Sem filtro. Só o operador da plataforma recebe este escopo.
    AllTenants,
    Tenant(Uuid),
}

impl TenantScope {
    pub fn admits(&self, tenant_id: Uuid) -> bool {
        match self {
            TenantScope::AllTenants => true,
            TenantScope::Tenant(own) => *own == tenant_id,
        }
    }

    /// Parâmetro para `($1::uuid IS NULL OR tenant_id = $1)`.
    pub fn tenant_filter(&self) -> Option<Uuid> {
        match self {
            TenantScope::AllTenants => None,
            TenantScope::Tenant(own) => Some(*own),
        }
    }
}

// ---
// 3. Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AccountPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[serde(deserialize_with = "trimmed")]
    pub email: String,
    #[validate(length(min = 8, message = "A senha deve ter no mínimo 8 caracteres."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSchoolPayload {
    #[validate(length(min = 1, message = "O nome da escola é obrigatório."))]
    pub name: String,
    #[validate(nested)]
    pub admin: AccountPayload,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SchoolCreatedResponse {
    pub school: Tenant,
    pub admin: UserResponse,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStaffPayload {
    #[serde(flatten)]
    pub account: AccountPayload,
    /// `LIBRARIAN` quando omitido.
    pub role: Option<Role>,
}

// A conta vem achatada no JSON, então os erros dela ficam no nível de cima.
impl Validate for CreateStaffPayload {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.account.validate()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeRolePayload {
    pub role: Role,
}
