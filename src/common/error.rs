use std::collections::BTreeMap;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::{config::AppState, middleware::rbac::RoleSet};

const UNAUTHENTICATED_MESSAGE: &str = "Não autenticado.";
const INVALID_CREDENTIALS_MESSAGE: &str = "Credenciais inválidas.";
const INTERNAL_ERROR_MESSAGE: &str = "Ocorreu um erro inesperado.";

/// Motivo interno de uma falha de autenticação.
/// Vai para o log; o cliente sempre recebe a mesma mensagem genérica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("cookie de sessão ausente")]
    MissingToken,
    #[error("token com assinatura inválida ou malformado")]
    InvalidToken,
    #[error("token expirado")]
    ExpiredToken,
    #[error("usuário do token não existe mais")]
    UserNotFound,
    #[error("papel ou escola do token não confere com o cadastro")]
    StaleSession,
    #[error("identidade ausente no contexto da requisição")]
    MissingIdentity,
}

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] ValidationErrors),

    #[error("Requisição inválida: {0}")]
    BadRequest(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("A conta de desenvolvedor já existe")]
    DeveloperAlreadyExists,

    #[error("Valor duplicado no campo '{field}'")]
    Conflict { field: &'static str },

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Não autenticado: {0}")]
    Unauthenticated(AuthFailure),

    #[error("Acesso negado, papéis permitidos: {0}")]
    Forbidden(RoleSet),

    #[error("Operação exige um usuário vinculado a uma escola")]
    TenantRequired,

    #[error("{0} não encontrado")]
    NotFound(&'static str),

    #[error("Nenhum exemplar disponível")]
    NoCopiesAvailable,

    #[error("Empréstimo já devolvido")]
    LoanAlreadyClosed,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor: {0:#}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Achata os erros do `validator` em `campo -> mensagens`.
/// Structs aninhadas viram `pai.campo`; listas viram `pai[i].campo`.
fn collect_field_messages(
    errors: &ValidationErrors,
    prefix: Option<&str>,
    details: &mut BTreeMap<String, Vec<String>>,
) {
    for (field, kind) in errors.errors() {
        let key = match prefix {
            Some(prefix) => format!("{prefix}.{field}"),
            None => field.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = field_errors.iter().map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                });
                details.entry(key).or_default().extend(messages);
            }
            ValidationErrorsKind::Struct(nested) => collect_field_messages(nested, Some(key.as_str()), details),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    let item_key = format!("{key}[{index}]");
                    collect_field_messages(nested, Some(item_key.as_str()), details);
                }
            }
        }
    }
}

/// Detalhe de um erro 500, anexado à resposta e exposto só em desenvolvimento.
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(errors) => {
                let mut details = BTreeMap::new();
                collect_field_messages(&errors, None, &mut details);
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::BadRequest(reason) => {
                let body = Json(json!({ "error": "Requisição inválida.", "details": reason }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::EmailAlreadyExists => {
                let body = Json(json!({ "error": "Este e-mail já está em uso.", "field": "email" }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::Conflict { field } => {
                let body = Json(json!({
                    "error": format!("Já existe um registro com este valor de '{field}'."),
                    "field": field,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::Forbidden(allowed) => {
                let body = Json(json!({
                    "error": format!("Acesso restrito aos papéis: {allowed}."),
                }));
                return (StatusCode::FORBIDDEN, body).into_response();
            }
            AppError::NotFound(entity) => {
                let body = Json(json!({ "error": format!("{entity} não encontrado.") }));
                return (StatusCode::NOT_FOUND, body).into_response();
            }
            AppError::DeveloperAlreadyExists => {
                (StatusCode::BAD_REQUEST, "A conta de desenvolvedor já existe.")
            }
            AppError::NoCopiesAvailable => {
                (StatusCode::BAD_REQUEST, "Nenhum exemplar disponível para empréstimo.")
            }
            AppError::LoanAlreadyClosed => (StatusCode::BAD_REQUEST, "Este empréstimo já foi devolvido."),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS_MESSAGE),
            AppError::Unauthenticated(reason) => {
                tracing::debug!(%reason, "requisição rejeitada sem identidade");
                (StatusCode::UNAUTHORIZED, UNAUTHENTICATED_MESSAGE)
            }
            AppError::TenantRequired => (
                StatusCode::FORBIDDEN,
                "Esta operação exige um usuário vinculado a uma escola.",
            ),

            // Todos os outros erros (DatabaseError, InternalServerError, ...) viram 500.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                let mut response = (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": INTERNAL_ERROR_MESSAGE })),
                )
                    .into_response();
                response
                    .extensions_mut()
                    .insert(InternalErrorDetail(e.to_string()));
                return response;
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

/// Camada de resposta: em desenvolvimento, reescreve erros 500 incluindo o detalhe.
/// Em produção o detalhe é descartado.
pub async fn expose_internal_errors(State(app_state): State<AppState>, mut response: Response) -> Response {
    let Some(InternalErrorDetail(detail)) = response.extensions_mut().remove::<InternalErrorDetail>() else {
        return response;
    };

    if !app_state.config.environment.is_development() {
        return response;
    }

    let body = Json(json!({ "error": INTERNAL_ERROR_MESSAGE, "details": detail }));
    (response.status(), body).into_response()
}
