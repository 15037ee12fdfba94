// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register_developer,
        handlers::auth::login,
        handlers::auth::logout,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::change_password,

        // --- Tenancy ---
        handlers::tenancy::create_school,
        handlers::tenancy::list_schools,
        handlers::tenancy::current_school,

        // --- Staff ---
        handlers::tenancy::create_staff,
        handlers::tenancy::list_staff,
        handlers::tenancy::change_role,

        // --- Library ---
        handlers::library::list_books,
        handlers::library::create_book,
        handlers::library::issue_book,
        handlers::library::list_loans,
        handlers::library::return_loan,
        handlers::library::list_students,
        handlers::library::create_student,

        // --- Settings ---
        handlers::settings::get_settings,
        handlers::settings::update_settings,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::UserResponse,
            models::auth::LoginUserPayload,
            models::auth::RegisterDeveloperPayload,
            models::auth::ChangePasswordPayload,

            // --- Tenancy ---
            models::tenancy::Tenant,
            models::tenancy::AccountPayload,
            models::tenancy::CreateSchoolPayload,
            models::tenancy::SchoolCreatedResponse,
            models::tenancy::CreateStaffPayload,
            models::tenancy::ChangeRolePayload,

            // --- Library ---
            models::library::Book,
            models::library::Student,
            models::library::Loan,
            models::library::CreateBookPayload,
            models::library::CreateStudentPayload,
            models::library::IssueBookPayload,

            // --- Settings ---
            models::settings::PlatformSettings,
            models::settings::MailerSettings,
        )
    ),
    tags(
        (name = "Auth", description = "Login, registro do desenvolvedor e logout"),
        (name = "Users", description = "Dados do usuário da sessão"),
        (name = "Tenancy", description = "Gestão de Escolas"),
        (name = "Staff", description = "Equipe da escola e papéis"),
        (name = "Library", description = "Acervo, alunos e empréstimos"),
        (name = "Settings", description = "Configuração da plataforma")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        // O nome real do cookie vem de SESSION_COOKIE_NAME; "session" é o padrão
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("session"))),
        );
    }
}
