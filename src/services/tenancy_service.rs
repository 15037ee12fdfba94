// src/services/tenancy_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{TenantStore, UserStore},
    models::{
        auth::{normalize_email, Identity, NewUser, Role, User},
        tenancy::{AccountPayload, Tenant},
    },
    services::password::CredentialStore,
};

#[derive(Clone)]
pub struct TenantService {
    tenants: Arc<dyn TenantStore>,
    users: Arc<dyn UserStore>,
    credentials: CredentialStore,
}

impl TenantService {
    pub fn new(
        tenants: Arc<dyn TenantStore>,
        users: Arc<dyn UserStore>,
        credentials: CredentialStore,
    ) -> Self {
        Self {
            tenants,
            users,
            credentials,
        }
    }

    /// LÓGICA DE NEGÓCIO: cria a escola e, atomicamente, o seu administrador.
    pub async fn create_school(&self, name: &str, admin: &AccountPayload) -> Result<(Tenant, User), AppError> {
        let admin = self.new_account(admin).await?;
        let (school, admin) = self.tenants.create_with_admin(name.trim(), admin).await?;

        tracing::info!(tenant_id = %school.id, admin_id = %admin.id, "escola criada");
        Ok((school, admin))
    }

    pub async fn list_schools(&self) -> Result<Vec<Tenant>, AppError> {
        self.tenants.list().await
    }

    pub async fn get_school(&self, tenant_id: Uuid) -> Result<Tenant, AppError> {
        self.tenants
            .find_by_id(tenant_id)
            .await?
            .ok_or(AppError::NotFound("Escola"))
    }

    /// Cria um usuário da equipe. O tenant vem sempre do contexto do chamador.
    pub async fn provision_staff(
        &self,
        tenant_id: Uuid,
        account: &AccountPayload,
        role: Role,
    ) -> Result<User, AppError> {
        ensure_tenant_role(role)?;

        let new_user = self.new_account(account).await?;
        let user = self.users.create_user(new_user, role, Some(tenant_id)).await?;

        tracing::info!(%tenant_id, user_id = %user.id, %role, "usuário da equipe criado");
        Ok(user)
    }

    pub async fn list_staff(&self, tenant_id: Uuid) -> Result<Vec<User>, AppError> {
        self.users.list_by_tenant(tenant_id).await
    }

    pub async fn change_role(
        &self,
        tenant_id: Uuid,
        actor: &Identity,
        user_id: Uuid,
        role: Role,
    ) -> Result<User, AppError> {
        ensure_tenant_role(role)?;

        if actor.user_id == user_id {
            return Err(AppError::BadRequest(
                "Não é possível alterar o próprio papel.".to_string(),
            ));
        }

        // Usuário de outra escola é indistinguível de inexistente
        let user = self
            .users
            .update_role(tenant_id, user_id, role)
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;

        tracing::info!(%tenant_id, user_id = %user.id, %role, "papel alterado");
        Ok(user)
    }

    async fn new_account(&self, account: &AccountPayload) -> Result<NewUser, AppError> {
        let email = normalize_email(&account.email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::EmailAlreadyExists);
        }

        Ok(NewUser {
            name: account.name.trim().to_string(),
            email,
            password_hash: self.credentials.hash(&account.password).await?,
        })
    }
}

fn ensure_tenant_role(role: Role) -> Result<(), AppError> {
    if role.is_tenant_scoped() {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "O papel {role} não pode ser atribuído a usuários de uma escola."
        )))
    }
}
