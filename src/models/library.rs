// src/models/library.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// ---
// Livro (acervo de uma escola)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub tenant_id: Uuid,
    #[schema(example = "Dom Casmurro")]
    pub title: String,
    #[schema(example = "Machado de Assis")]
    pub author: String,
    pub isbn: Option<String>,
    pub total_copies: i32,
    // Sempre entre 0 e total_copies
    pub available_copies: i32,
    pub created_at: DateTime<Utc>,
}

// ---
// Aluno
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    #[schema(example = "2024-0042")]
    pub admission_number: String,
    pub grade: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---
// Empréstimo
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub book_id: Uuid,
    pub student_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

// ---
// Payloads
// Nenhum deles tem campo de tenant: o tenant vem sempre da identidade.
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookPayload {
    #[validate(length(min = 1, message = "O título é obrigatório."))]
    pub title: String,
    #[validate(length(min = 1, message = "O autor é obrigatório."))]
    pub author: String,
    pub isbn: Option<String>,
    #[validate(range(min = 1, max = 10000, message = "A quantidade de exemplares deve estar entre 1 e 10000."))]
    pub total_copies: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(length(min = 1, message = "A matrícula é obrigatória."))]
    pub admission_number: String,
    pub grade: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueBookPayload {
    pub student_id: Uuid,
}
