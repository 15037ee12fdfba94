// src/services/library_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::LibraryStore,
    models::{
        library::{Book, CreateBookPayload, CreateStudentPayload, Loan, Student},
        tenancy::TenantScope,
    },
};

#[derive(Clone)]
pub struct LibraryService {
    store: Arc<dyn LibraryStore>,
}

impl LibraryService {
    pub fn new(store: Arc<dyn LibraryStore>) -> Self {
        Self { store }
    }

    pub async fn list_books(&self, scope: TenantScope) -> Result<Vec<Book>, AppError> {
        self.store.list_books(scope).await
    }

    pub async fn create_book(&self, tenant_id: Uuid, payload: &CreateBookPayload) -> Result<Book, AppError> {
        self.store.create_book(tenant_id, payload).await
    }

    pub async fn list_students(&self, scope: TenantScope) -> Result<Vec<Student>, AppError> {
        self.store.list_students(scope).await
    }

    pub async fn create_student(
        &self,
        tenant_id: Uuid,
        payload: &CreateStudentPayload,
    ) -> Result<Student, AppError> {
        self.store.create_student(tenant_id, payload).await
    }

    pub async fn list_loans(&self, scope: TenantScope) -> Result<Vec<Loan>, AppError> {
        self.store.list_loans(scope).await
    }

    /// Empresta um exemplar. O aluno é buscado no escopo da escola do chamador,
    /// então um id de outra escola aparece como inexistente.
    pub async fn issue_book(&self, tenant_id: Uuid, book_id: Uuid, student_id: Uuid) -> Result<Loan, AppError> {
        self.store
            .find_student(TenantScope::Tenant(tenant_id), student_id)
            .await?
            .ok_or(AppError::NotFound("Aluno"))?;

        let loan = self.store.issue_copy(tenant_id, book_id, student_id).await?;
        tracing::debug!(%tenant_id, loan_id = %loan.id, %book_id, "exemplar emprestado");
        Ok(loan)
    }

    pub async fn return_book(&self, tenant_id: Uuid, loan_id: Uuid) -> Result<Loan, AppError> {
        let loan = self.store.return_copy(tenant_id, loan_id).await?;
        tracing::debug!(%tenant_id, %loan_id, "exemplar devolvido");
        Ok(loan)
    }
}
