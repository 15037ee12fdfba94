// src/db/store.rs

//! Contratos de persistência consumidos pelos serviços.
//!
//! Toda coleção que pertence a uma escola recebe um `TenantScope` nas leituras e
//! um `tenant_id` vindo da identidade nas escritas. Nenhum método aceita o tenant
//! a partir do corpo da requisição.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::{NewUser, PasswordHash, Role, User},
        library::{Book, CreateBookPayload, CreateStudentPayload, Loan, Student},
        settings::PlatformSettings,
        tenancy::{Tenant, TenantScope},
    },
};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// `email` já normalizado.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn developer_exists(&self) -> Result<bool, AppError>;

    /// Falha com `EmailAlreadyExists` ou, para `Role::Developer`, com
    /// `DeveloperAlreadyExists` quando a conta já existe.
    async fn create_user(
        &self,
        new_user: NewUser,
        role: Role,
        tenant_id: Option<Uuid>,
    ) -> Result<User, AppError>;

    async fn list_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<User>, AppError>;

    async fn update_password(&self, id: Uuid, password_hash: &PasswordHash) -> Result<(), AppError>;

    /// `None` quando o usuário não existe nesta escola.
    async fn update_role(&self, tenant_id: Uuid, id: Uuid, role: Role) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Cria a escola, o admin (`SCHOOL_ADMIN`) e a referência `admin_id` numa única transação.
    async fn create_with_admin(&self, name: &str, admin: NewUser) -> Result<(Tenant, User), AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tenant>, AppError>;

    async fn list(&self) -> Result<Vec<Tenant>, AppError>;
}

#[async_trait]
pub trait LibraryStore: Send + Sync {
    async fn list_books(&self, scope: TenantScope) -> Result<Vec<Book>, AppError>;

    async fn create_book(&self, tenant_id: Uuid, book: &CreateBookPayload) -> Result<Book, AppError>;

    async fn list_students(&self, scope: TenantScope) -> Result<Vec<Student>, AppError>;

    async fn find_student(&self, scope: TenantScope, id: Uuid) -> Result<Option<Student>, AppError>;

    async fn create_student(
        &self,
        tenant_id: Uuid,
        student: &CreateStudentPayload,
    ) -> Result<Student, AppError>;

    async fn list_loans(&self, scope: TenantScope) -> Result<Vec<Loan>, AppError>;

    /// Decrementa `available_copies` só se for maior que zero e registra o empréstimo,
    /// tudo de forma atômica.
    async fn issue_copy(&self, tenant_id: Uuid, book_id: Uuid, student_id: Uuid) -> Result<Loan, AppError>;

    /// Fecha um empréstimo aberto e devolve o exemplar ao acervo, de forma atômica.
    async fn return_copy(&self, tenant_id: Uuid, loan_id: Uuid) -> Result<Loan, AppError>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> Result<Option<PlatformSettings>, AppError>;

    async fn save(&self, settings: &PlatformSettings) -> Result<(), AppError>;
}
