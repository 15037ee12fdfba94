// src/db/memory.rs

//! Store em memória. Usado nos testes e quando o servidor sobe sem `DATABASE_URL`.
//! Um único `RwLock` protege todas as coleções: cada operação que lê e escreve
//! roda inteira sob o lock de escrita, o que a torna atômica.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::{LibraryStore, SettingsStore, TenantStore, UserStore},
    models::{
        auth::{NewUser, PasswordHash, Role, User},
        library::{Book, CreateBookPayload, CreateStudentPayload, Loan, Student},
        settings::PlatformSettings,
        tenancy::{Tenant, TenantScope},
    },
};

#[derive(Default)]
struct MemoryData {
    users: Vec<User>,
    tenants: Vec<Tenant>,
    books: Vec<Book>,
    students: Vec<Student>,
    loans: Vec<Loan>,
    settings: Option<PlatformSettings>,
}

impl MemoryData {
    fn insert_user(&mut self, new_user: NewUser, role: Role, tenant_id: Option<Uuid>) -> Result<User, AppError> {
        if role == Role::Developer && self.users.iter().any(|u| u.role == Role::Developer) {
            return Err(AppError::DeveloperAlreadyExists);
        }
        if self.users.iter().any(|u| u.email.eq_ignore_ascii_case(&new_user.email)) {
            return Err(AppError::EmailAlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash.as_str().to_string(),
            role,
            tenant_id,
            created_at: now,
            updated_at: now,
        };
        self.users.push(user.clone());
        Ok(user)
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let data = self.inner.read().await;
        Ok(data.users.iter().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let data = self.inner.read().await;
        Ok(data.users.iter().find(|u| u.id == id).cloned())
    }

    async fn developer_exists(&self) -> Result<bool, AppError> {
        let data = self.inner.read().await;
        Ok(data.users.iter().any(|u| u.role == Role::Developer))
    }

    async fn create_user(
        &self,
        new_user: NewUser,
        role: Role,
        tenant_id: Option<Uuid>,
    ) -> Result<User, AppError> {
        let mut data = self.inner.write().await;
        if let Some(tenant_id) = tenant_id {
            if !data.tenants.iter().any(|t| t.id == tenant_id) {
                return Err(AppError::NotFound("Escola"));
            }
        }
        data.insert_user(new_user, role, tenant_id)
    }

    async fn list_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<User>, AppError> {
        let data = self.inner.read().await;
        Ok(data
            .users
            .iter()
            .filter(|u| u.tenant_id == Some(tenant_id))
            .cloned()
            .collect())
    }

    async fn update_password(&self, id: Uuid, password_hash: &PasswordHash) -> Result<(), AppError> {
        let mut data = self.inner.write().await;
        let user = data
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(AppError::NotFound("Usuário"))?;
        user.password_hash = password_hash.as_str().to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_role(&self, tenant_id: Uuid, id: Uuid, role: Role) -> Result<Option<User>, AppError> {
        let mut data = self.inner.write().await;
        let Some(user) = data
            .users
            .iter_mut()
            .find(|u| u.id == id && u.tenant_id == Some(tenant_id))
        else {
            return Ok(None);
        };
        user.role = role;
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl TenantStore for MemoryStore {
    async fn create_with_admin(&self, name: &str, admin: NewUser) -> Result<(Tenant, User), AppError> {
        let mut data = self.inner.write().await;

        let tenant_id = Uuid::new_v4();
        // O admin é validado antes de a escola existir, para não sobrar escola órfã
        let admin = data.insert_user(admin, Role::SchoolAdmin, Some(tenant_id))?;

        let tenant = Tenant {
            id: tenant_id,
            name: name.to_string(),
            admin_id: Some(admin.id),
            created_at: Utc::now(),
        };
        data.tenants.push(tenant.clone());
        Ok((tenant, admin))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tenant>, AppError> {
        let data = self.inner.read().await;
        Ok(data.tenants.iter().find(|t| t.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Tenant>, AppError> {
        Ok(self.inner.read().await.tenants.clone())
    }
}

#[async_trait]
impl LibraryStore for MemoryStore {
    async fn list_books(&self, scope: TenantScope) -> Result<Vec<Book>, AppError> {
        let data = self.inner.read().await;
        Ok(data.books.iter().filter(|b| scope.admits(b.tenant_id)).cloned().collect())
    }

    async fn create_book(&self, tenant_id: Uuid, book: &CreateBookPayload) -> Result<Book, AppError> {
        let mut data = self.inner.write().await;

        if let Some(isbn) = &book.isbn {
            let taken = data
                .books
                .iter()
                .any(|b| b.tenant_id == tenant_id && b.isbn.as_deref() == Some(isbn.as_str()));
            if taken {
                return Err(AppError::Conflict { field: "isbn" });
            }
        }

        let book = Book {
            id: Uuid::new_v4(),
            tenant_id,
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            total_copies: book.total_copies,
            available_copies: book.total_copies,
            created_at: Utc::now(),
        };
        data.books.push(book.clone());
        Ok(book)
    }

    async fn list_students(&self, scope: TenantScope) -> Result<Vec<Student>, AppError> {
        let data = self.inner.read().await;
        Ok(data.students.iter().filter(|s| scope.admits(s.tenant_id)).cloned().collect())
    }

    async fn find_student(&self, scope: TenantScope, id: Uuid) -> Result<Option<Student>, AppError> {
        let data = self.inner.read().await;
        Ok(data
            .students
            .iter()
            .find(|s| s.id == id && scope.admits(s.tenant_id))
            .cloned())
    }

    async fn create_student(
        &self,
        tenant_id: Uuid,
        student: &CreateStudentPayload,
    ) -> Result<Student, AppError> {
        let mut data = self.inner.write().await;

        let taken = data
            .students
            .iter()
            .any(|s| s.tenant_id == tenant_id && s.admission_number == student.admission_number);
        if taken {
            return Err(AppError::Conflict { field: "admissionNumber" });
        }

        let student = Student {
            id: Uuid::new_v4(),
            tenant_id,
            name: student.name.clone(),
            admission_number: student.admission_number.clone(),
            grade: student.grade.clone(),
            created_at: Utc::now(),
        };
        data.students.push(student.clone());
        Ok(student)
    }

    async fn list_loans(&self, scope: TenantScope) -> Result<Vec<Loan>, AppError> {
        let data = self.inner.read().await;
        Ok(data.loans.iter().filter(|l| scope.admits(l.tenant_id)).cloned().collect())
    }

    async fn issue_copy(&self, tenant_id: Uuid, book_id: Uuid, student_id: Uuid) -> Result<Loan, AppError> {
        let mut data = self.inner.write().await;

        let book = data
            .books
            .iter_mut()
            .find(|b| b.id == book_id && b.tenant_id == tenant_id)
            .ok_or(AppError::NotFound("Livro"))?;

        if book.available_copies <= 0 {
            return Err(AppError::NoCopiesAvailable);
        }
        book.available_copies -= 1;

        let loan = Loan {
            id: Uuid::new_v4(),
            tenant_id,
            book_id,
            student_id,
            issued_at: Utc::now(),
            returned_at: None,
        };
        data.loans.push(loan.clone());
        Ok(loan)
    }

    async fn return_copy(&self, tenant_id: Uuid, loan_id: Uuid) -> Result<Loan, AppError> {
        let mut data = self.inner.write().await;

        let loan = data
            .loans
            .iter_mut()
            .find(|l| l.id == loan_id && l.tenant_id == tenant_id)
            .ok_or(AppError::NotFound("Empréstimo"))?;

        if loan.returned_at.is_some() {
            return Err(AppError::LoanAlreadyClosed);
        }
        loan.returned_at = Some(Utc::now());
        let loan = loan.clone();

        if let Some(book) = data
            .books
            .iter_mut()
            .find(|b| b.id == loan.book_id && b.tenant_id == tenant_id)
        {
            book.available_copies = (book.available_copies + 1).min(book.total_copies);
        }
        Ok(loan)
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn load(&self) -> Result<Option<PlatformSettings>, AppError> {
        Ok(self.inner.read().await.settings.clone())
    }

    async fn save(&self, settings: &PlatformSettings) -> Result<(), AppError> {
        self.inner.write().await.settings = Some(settings.clone());
        Ok(())
    }
}
