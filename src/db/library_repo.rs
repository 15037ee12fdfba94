// src/db/library_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::map_unique_violation, error::AppError},
    db::store::LibraryStore,
    models::{
        library::{Book, CreateBookPayload, CreateStudentPayload, Loan, Student},
        tenancy::TenantScope,
    },
};

const BOOK_COLUMNS: &str =
    "id, tenant_id, title, author, isbn, total_copies, available_copies, created_at";
const STUDENT_COLUMNS: &str = "id, tenant_id, name, admission_number, grade, created_at";
const LOAN_COLUMNS: &str = "id, tenant_id, book_id, student_id, issued_at, returned_at";

// Toda leitura passa por este filtro: NULL só para o escopo de todas as escolas
const SCOPE_FILTER: &str = "($1::uuid IS NULL OR tenant_id = $1)";

#[derive(Clone)]
pub struct LibraryRepository {
    pool: PgPool,
}

impl LibraryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LibraryStore for LibraryRepository {
    async fn list_books(&self, scope: TenantScope) -> Result<Vec<Book>, AppError> {
        let query = format!("SELECT {BOOK_COLUMNS} FROM books WHERE {SCOPE_FILTER} ORDER BY title");
        let books = sqlx::query_as::<_, Book>(&query)
            .bind(scope.tenant_filter())
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn create_book(&self, tenant_id: Uuid, book: &CreateBookPayload) -> Result<Book, AppError> {
        let query = format!(
            "INSERT INTO books (id, tenant_id, title, author, isbn, total_copies, available_copies)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING {BOOK_COLUMNS}"
        );
        sqlx::query_as::<_, Book>(&query)
            .bind(Uuid::new_v4())
            .bind(tenant_id)
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.isbn)
            .bind(book.total_copies)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, |_| AppError::Conflict { field: "isbn" }))
    }

    async fn list_students(&self, scope: TenantScope) -> Result<Vec<Student>, AppError> {
        let query = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE {SCOPE_FILTER} ORDER BY name");
        let students = sqlx::query_as::<_, Student>(&query)
            .bind(scope.tenant_filter())
            .fetch_all(&self.pool)
            .await?;
        Ok(students)
    }

    async fn find_student(&self, scope: TenantScope, id: Uuid) -> Result<Option<Student>, AppError> {
        let query = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE {SCOPE_FILTER} AND id = $2");
        let student = sqlx::query_as::<_, Student>(&query)
            .bind(scope.tenant_filter())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(student)
    }

    async fn create_student(
        &self,
        tenant_id: Uuid,
        student: &CreateStudentPayload,
    ) -> Result<Student, AppError> {
        let query = format!(
            "INSERT INTO students (id, tenant_id, name, admission_number, grade)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {STUDENT_COLUMNS}"
        );
        sqlx::query_as::<_, Student>(&query)
            .bind(Uuid::new_v4())
            .bind(tenant_id)
            .bind(&student.name)
            .bind(&student.admission_number)
            .bind(&student.grade)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, |_| AppError::Conflict { field: "admissionNumber" }))
    }

    async fn list_loans(&self, scope: TenantScope) -> Result<Vec<Loan>, AppError> {
        let query = format!("SELECT {LOAN_COLUMNS} FROM loans WHERE {SCOPE_FILTER} ORDER BY issued_at DESC");
        let loans = sqlx::query_as::<_, Loan>(&query)
            .bind(scope.tenant_filter())
            .fetch_all(&self.pool)
            .await?;
        Ok(loans)
    }

    async fn issue_copy(&self, tenant_id: Uuid, book_id: Uuid, student_id: Uuid) -> Result<Loan, AppError> {
        let mut tx = self.pool.begin().await?;

        // Decremento condicional: dois empréstimos simultâneos do último exemplar
        // não conseguem passar os dois por aqui.
        let decremented: Option<Uuid> = sqlx::query_scalar(
            "UPDATE books SET available_copies = available_copies - 1
             WHERE id = $1 AND tenant_id = $2 AND available_copies > 0
             RETURNING id",
        )
        .bind(book_id)
        .bind(tenant_id)
        .fetch_optional(&mut *tx)
        .await?;

        if decremented.is_none() {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM books WHERE id = $1 AND tenant_id = $2)",
            )
            .bind(book_id)
            .bind(tenant_id)
            .fetch_one(&mut *tx)
            .await?;

            return Err(if exists {
                AppError::NoCopiesAvailable
            } else {
                AppError::NotFound("Livro")
            });
        }

        let query = format!(
            "INSERT INTO loans (id, tenant_id, book_id, student_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {LOAN_COLUMNS}"
        );
        let loan = sqlx::query_as::<_, Loan>(&query)
            .bind(Uuid::new_v4())
            .bind(tenant_id)
            .bind(book_id)
            .bind(student_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(loan)
    }

    async fn return_copy(&self, tenant_id: Uuid, loan_id: Uuid) -> Result<Loan, AppError> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            "UPDATE loans SET returned_at = NOW()
             WHERE id = $1 AND tenant_id = $2 AND returned_at IS NULL
             RETURNING {LOAN_COLUMNS}"
        );
        let closed = sqlx::query_as::<_, Loan>(&query)
            .bind(loan_id)
            .bind(tenant_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(loan) = closed else {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM loans WHERE id = $1 AND tenant_id = $2)",
            )
            .bind(loan_id)
            .bind(tenant_id)
            .fetch_one(&mut *tx)
            .await?;

            return Err(if exists {
                AppError::LoanAlreadyClosed
            } else {
                AppError::NotFound("Empréstimo")
            });
        };

        sqlx::query(
            "UPDATE books SET available_copies = available_copies + 1
             WHERE id = $1 AND tenant_id = $2 AND available_copies < total_copies",
        )
        .bind(loan.book_id)
        .bind(tenant_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(loan)
    }
}
