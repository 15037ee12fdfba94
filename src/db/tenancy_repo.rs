// src/db/tenancy_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{store::TenantStore, user_repo::insert_user},
    models::{
        auth::{NewUser, Role, User},
        tenancy::Tenant,
    },
};

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantStore for TenantRepository {
    async fn create_with_admin(&self, name: &str, admin: NewUser) -> Result<(Tenant, User), AppError> {
        // 1. Inicia a transação
        let mut tx = self.pool.begin().await?;

        // 2. Cria a escola, ainda sem admin
        let tenant_id: Uuid = sqlx::query_scalar(
            "INSERT INTO tenants (id, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

        // 3. Cria o admin já vinculado à escola
        let admin = insert_user(&mut *tx, &admin, Role::SchoolAdmin, Some(tenant_id)).await?;

        // 4. Grava a referência de volta
        let tenant = sqlx::query_as::<_, Tenant>(
            "UPDATE tenants SET admin_id = $2 WHERE id = $1
             RETURNING id, name, admin_id, created_at",
        )
        .bind(tenant_id)
        .bind(admin.id)
        .fetch_one(&mut *tx)
        .await?;

        // 5. Commit. Qualquer `?` acima faz rollback ao sair do escopo (drop)
        tx.commit().await?;

        Ok((tenant, admin))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            "SELECT id, name, admin_id, created_at FROM tenants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tenant)
    }

    async fn list(&self) -> Result<Vec<Tenant>, AppError> {
        let tenants = sqlx::query_as::<_, Tenant>(
            "SELECT id, name, admin_id, created_at FROM tenants ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(tenants)
    }
}
