// src/db/user_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_unique_violation, error::AppError},
    db::store::UserStore,
    models::auth::{NewUser, PasswordHash, Role, User},
};

pub(crate) const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, tenant_id, created_at, updated_at";

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Insere um usuário usando qualquer executor (pool ou transação).
/// Violações de unicidade viram erros de domínio.
pub(crate) async fn insert_user<'e, E>(
    executor: E,
    new_user: &NewUser,
    role: Role,
    tenant_id: Option<Uuid>,
) -> Result<User, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let query = format!(
        "INSERT INTO users (id, name, email, password_hash, role, tenant_id)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {USER_COLUMNS}"
    );

    sqlx::query_as::<_, User>(&query)
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(new_user.password_hash.as_str())
        .bind(role)
        .bind(tenant_id)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, |constraint| match constraint {
                "users_single_developer" => AppError::DeveloperAlreadyExists,
                "users_email_key" => AppError::EmailAlreadyExists,
                _ => AppError::Conflict { field: "email" },
            })
        })
}

#[async_trait]
impl UserStore for UserRepository {
    // Busca um usuário pelo seu e-mail (case-insensitive, igual ao índice único)
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
        let maybe_user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    // Busca um usuário pelo seu ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let maybe_user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    async fn developer_exists(&self) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE role = 'DEVELOPER')",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create_user(
        &self,
        new_user: NewUser,
        role: Role,
        tenant_id: Option<Uuid>,
    ) -> Result<User, AppError> {
        insert_user(&self.pool, &new_user, role, tenant_id).await
    }

    async fn list_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<User>, AppError> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE tenant_id = $1 ORDER BY created_at"
        );
        let users = sqlx::query_as::<_, User>(&query)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn update_password(&self, id: Uuid, password_hash: &PasswordHash) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Usuário"));
        }
        Ok(())
    }

    async fn update_role(&self, tenant_id: Uuid, id: Uuid, role: Role) -> Result<Option<User>, AppError> {
        let query = format!(
            "UPDATE users SET role = $3, updated_at = NOW()
             WHERE id = $1 AND tenant_id = $2
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(tenant_id)
            .bind(role)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}
