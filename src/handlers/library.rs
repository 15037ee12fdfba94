// src/handlers/library.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        json::{AppJson, AppPath},
    },
    config::AppState,
    middleware::tenancy::{Scoped, TenantContext},
    models::library::{Book, CreateBookPayload, CreateStudentPayload, IssueBookPayload, Loan, Student},
};

// ---
// Livros
// ---
#[utoipa::path(
    get,
    path = "/api/books",
    tag = "Library",
    responses((status = 200, description = "Livros da escola do chamador (todas, para DEVELOPER)", body = Vec<Book>)),
    security(("session_cookie" = []))
)]
pub async fn list_books(
    State(app_state): State<AppState>,
    Scoped(scope): Scoped,
) -> Result<Json<Vec<Book>>, AppError> {
    let books = app_state.library_service.list_books(scope).await?;
    Ok(Json(books))
}

#[utoipa::path(
    post,
    path = "/api/books",
    tag = "Library",
    request_body = CreateBookPayload,
    responses(
        (status = 201, description = "Livro cadastrado na escola do chamador", body = Book),
        (status = 400, description = "Dados inválidos ou ISBN duplicado")
    ),
    security(("session_cookie" = []))
)]
pub async fn create_book(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    AppJson(payload): AppJson<CreateBookPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let book = app_state.library_service.create_book(tenant.0, &payload).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

#[utoipa::path(
    post,
    path = "/api/books/{id}/issue",
    tag = "Library",
    request_body = IssueBookPayload,
    params(("id" = Uuid, Path, description = "ID do livro")),
    responses(
        (status = 201, description = "Empréstimo registrado", body = Loan),
        (status = 400, description = "Nenhum exemplar disponível"),
        (status = 404, description = "Livro ou aluno não encontrado")
    ),
    security(("session_cookie" = []))
)]
pub async fn issue_book(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    AppPath(book_id): AppPath<Uuid>,
    AppJson(payload): AppJson<IssueBookPayload>,
) -> Result<impl IntoResponse, AppError> {
    let loan = app_state
        .library_service
        .issue_book(tenant.0, book_id, payload.student_id)
        .await?;

    Ok((StatusCode::CREATED, Json(loan)))
}

// ---
// Empréstimos
// ---
#[utoipa::path(
    get,
    path = "/api/loans",
    tag = "Library",
    responses((status = 200, description = "Empréstimos da escola do chamador", body = Vec<Loan>)),
    security(("session_cookie" = []))
)]
pub async fn list_loans(
    State(app_state): State<AppState>,
    Scoped(scope): Scoped,
) -> Result<Json<Vec<Loan>>, AppError> {
    let loans = app_state.library_service.list_loans(scope).await?;
    Ok(Json(loans))
}

#[utoipa::path(
    post,
    path = "/api/loans/{id}/return",
    tag = "Library",
    params(("id" = Uuid, Path, description = "ID do empréstimo")),
    responses(
        (status = 200, description = "Devolução registrada", body = Loan),
        (status = 400, description = "Empréstimo já devolvido"),
        (status = 404, description = "Empréstimo não encontrado")
    ),
    security(("session_cookie" = []))
)]
pub async fn return_loan(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    AppPath(loan_id): AppPath<Uuid>,
) -> Result<Json<Loan>, AppError> {
    let loan = app_state.library_service.return_book(tenant.0, loan_id).await?;
    Ok(Json(loan))
}

// ---
// Alunos
// ---
#[utoipa::path(
    get,
    path = "/api/students",
    tag = "Library",
    responses((status = 200, description = "Alunos da escola do chamador", body = Vec<Student>)),
    security(("session_cookie" = []))
)]
pub async fn list_students(
    State(app_state): State<AppState>,
    Scoped(scope): Scoped,
) -> Result<Json<Vec<Student>>, AppError> {
    let students = app_state.library_service.list_students(scope).await?;
    Ok(Json(students))
}

#[utoipa::path(
    post,
    path = "/api/students",
    tag = "Library",
    request_body = CreateStudentPayload,
    responses(
        (status = 201, description = "Aluno cadastrado na escola do chamador", body = Student),
        (status = 400, description = "Dados inválidos ou matrícula duplicada")
    ),
    security(("session_cookie" = []))
)]
pub async fn create_student(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    AppJson(payload): AppJson<CreateStudentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let student = app_state.library_service.create_student(tenant.0, &payload).await?;
    Ok((StatusCode::CREATED, Json(student)))
}
