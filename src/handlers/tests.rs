use axum::{
    body::{to_bytes, Body},
    http::{
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
        Method, Request, StatusCode,
    },
    middleware as axum_middleware,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::{
    common::error::{expose_internal_errors, AppError},
    config::{AppConfig, AppState, Environment},
    db::Stores,
    routes::build_router,
};

const PASSWORD: &str = "senha-segura-123";

struct Reply {
    status: StatusCode,
    set_cookie: Option<String>,
    body: Value,
}

impl Reply {
    /// `nome=valor` do Set-Cookie, pronto para o cabeçalho Cookie.
    fn session(&self) -> String {
        let header = self.set_cookie.as_deref().expect("resposta sem Set-Cookie");
        header.split(';').next().unwrap().trim().to_string()
    }
}

async fn test_app() -> Router {
    let state = AppState::from_stores(AppConfig::for_tests(), Stores::in_memory())
        .await
        .unwrap();
    build_router(state)
}

async fn send(app: &Router, method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Reply {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(COOKIE, cookie);
    }
    let request = match body {
        Some(body) => request
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(SET_COOKIE)
        .map(|value| value.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    Reply { status, set_cookie, body }
}

async fn register_developer(app: &Router) -> String {
    let reply = send(
        app,
        Method::POST,
        "/api/auth/register-dev",
        None,
        Some(json!({ "email": "dev@plataforma.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    reply.session()
}

async fn login(app: &Router, email: &str) -> String {
    let reply = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK, "login de {email}: {}", reply.body);
    reply.session()
}

/// Cria uma escola com o seu administrador e devolve (id da escola, sessão do admin).
async fn create_school(app: &Router, developer: &str, name: &str, admin_email: &str) -> (String, String) {
    let reply = send(
        app,
        Method::POST,
        "/api/schools",
        Some(developer),
        Some(json!({
            "name": name,
            "admin": { "name": "Admin", "email": admin_email, "password": PASSWORD },
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    let school_id = reply.body["school"]["id"].as_str().unwrap().to_string();
    (school_id, login(app, admin_email).await)
}

async fn create_librarian(app: &Router, admin: &str, email: &str) -> Value {
    let reply = send(
        app,
        Method::POST,
        "/api/staff",
        Some(admin),
        Some(json!({ "name": "Bibliotecária", "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    reply.body
}

async fn create_book(app: &Router, session: &str, title: &str, copies: i32) -> Value {
    let reply = send(
        app,
        Method::POST,
        "/api/books",
        Some(session),
        Some(json!({ "title": title, "author": "Autor", "totalCopies": copies })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    reply.body
}

#[tokio::test]
async fn health_is_public() {
    let app = test_app().await;
    let reply = send(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn second_developer_registration_is_rejected() {
    let app = test_app().await;
    register_developer(&app).await;

    let reply = send(
        &app,
        Method::POST,
        "/api/auth/register-dev",
        None,
        Some(json!({ "email": "outro@plataforma.com", "password": PASSWORD })),
    )
    .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], "A conta de desenvolvedor já existe.");
    assert!(reply.set_cookie.is_none());
}

#[tokio::test]
async fn login_sets_a_hardened_session_cookie() {
    let app = test_app().await;
    register_developer(&app).await;

    let reply = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "DEV@Plataforma.com", "password": PASSWORD })),
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["role"], "DEVELOPER");
    assert_eq!(reply.body["tenantId"], Value::Null);
    assert!(reply.body.get("passwordHash").is_none());

    let cookie = reply.set_cookie.unwrap();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=2592000"));
    // Secure só em produção
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn wrong_password_and_unknown_email_get_the_same_answer() {
    let app = test_app().await;
    register_developer(&app).await;

    let wrong_password = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "dev@plataforma.com", "password": "senha-errada" })),
    )
    .await;
    let unknown_email = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "ninguem@plataforma.com", "password": PASSWORD })),
    )
    .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body["error"], "Credenciais inválidas.");
    assert_eq!(unknown_email.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.body, wrong_password.body);
}

#[tokio::test]
async fn protected_routes_require_a_valid_session() {
    let app = test_app().await;

    let missing = send(&app, Method::GET, "/api/books", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.body["error"], "Não autenticado.");

    let garbage = send(&app, Method::GET, "/api/auth/me", Some("session=nao-e-um-token"), None).await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
    assert_eq!(garbage.body, missing.body);

    // Mesmo sem sessão, a rota de escrita também responde 401 antes de olhar o corpo
    let write = send(&app, Method::POST, "/api/books", None, Some(json!({}))).await;
    assert_eq!(write.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_the_session_identity() {
    let app = test_app().await;
    let developer = register_developer(&app).await;
    let (school_id, admin) = create_school(&app, &developer, "Escola A", "admin@escola-a.com").await;

    let reply = send(&app, Method::GET, "/api/auth/me", Some(&admin), None).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["email"], "admin@escola-a.com");
    assert_eq!(reply.body["role"], "SCHOOL_ADMIN");
    assert_eq!(reply.body["tenantId"], school_id.as_str());
}

#[tokio::test]
async fn book_listing_is_isolated_per_school() {
    let app = test_app().await;
    let developer = register_developer(&app).await;
    let (school_a, admin_a) = create_school(&app, &developer, "Escola A", "admin@escola-a.com").await;
    let (_, admin_b) = create_school(&app, &developer, "Escola B", "admin@escola-b.com").await;

    create_book(&app, &admin_a, "Dom Casmurro", 2).await;
    create_book(&app, &admin_b, "Iracema", 1).await;

    let reply = send(&app, Method::GET, "/api/books", Some(&admin_a), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    let books = reply.body.as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["title"], "Dom Casmurro");
    assert_eq!(books[0]["tenantId"], school_a.as_str());

    // O operador da plataforma lê todas as escolas
    let reply = send(&app, Method::GET, "/api/books", Some(&developer), None).await;
    assert_eq!(reply.body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn forged_tenant_id_in_the_body_is_ignored() {
    let app = test_app().await;
    let developer = register_developer(&app).await;
    let (school_a, admin_a) = create_school(&app, &developer, "Escola A", "admin@escola-a.com").await;
    let (school_b, admin_b) = create_school(&app, &developer, "Escola B", "admin@escola-b.com").await;

    let reply = send(
        &app,
        Method::POST,
        "/api/books",
        Some(&admin_a),
        Some(json!({
            "title": "Livro forjado",
            "author": "Autor",
            "totalCopies": 1,
            "tenantId": school_b,
        })),
    )
    .await;

    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.body["tenantId"], school_a.as_str());

    let reply = send(&app, Method::GET, "/api/books", Some(&admin_b), None).await;
    assert!(reply.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn librarian_cannot_reach_admin_only_routes() {
    let app = test_app().await;
    let developer = register_developer(&app).await;
    let (_, admin) = create_school(&app, &developer, "Escola A", "admin@escola-a.com").await;
    let librarian = create_librarian(&app, &admin, "bib@escola-a.com").await;
    assert_eq!(librarian["role"], "LIBRARIAN");
    let librarian = login(&app, "bib@escola-a.com").await;

    let reply = send(
        &app,
        Method::POST,
        "/api/staff",
        Some(&librarian),
        Some(json!({ "name": "Outro", "email": "outro@escola-a.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body["error"], "Acesso restrito aos papéis: SCHOOL_ADMIN.");

    // ...mas opera a biblioteca normalmente
    create_book(&app, &librarian, "Memórias Póstumas", 1).await;

    let reply = send(&app, Method::GET, "/api/platform/config", Some(&librarian), None).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn developer_cannot_write_into_a_school() {
    let app = test_app().await;
    let developer = register_developer(&app).await;

    let reply = send(
        &app,
        Method::POST,
        "/api/books",
        Some(&developer),
        Some(json!({ "title": "X", "author": "Y", "totalCopies": 1 })),
    )
    .await;

    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body["error"], "Acesso restrito aos papéis: SCHOOL_ADMIN, LIBRARIAN.");
}

#[tokio::test]
async fn role_change_invalidates_the_old_session() {
    let app = test_app().await;
    let developer = register_developer(&app).await;
    let (_, admin) = create_school(&app, &developer, "Escola A", "admin@escola-a.com").await;
    let librarian = create_librarian(&app, &admin, "bib@escola-a.com").await;
    let old_session = login(&app, "bib@escola-a.com").await;

    let uri = format!("/api/staff/{}/role", librarian["id"].as_str().unwrap());
    let reply = send(&app, Method::PUT, &uri, Some(&admin), Some(json!({ "role": "SCHOOL_ADMIN" }))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["role"], "SCHOOL_ADMIN");

    let reply = send(&app, Method::GET, "/api/auth/me", Some(&old_session), None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let new_session = login(&app, "bib@escola-a.com").await;
    let reply = send(&app, Method::GET, "/api/staff", Some(&new_session), None).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn admin_cannot_change_roles_in_another_school() {
    let app = test_app().await;
    let developer = register_developer(&app).await;
    let (_, admin_a) = create_school(&app, &developer, "Escola A", "admin@escola-a.com").await;
    let (_, admin_b) = create_school(&app, &developer, "Escola B", "admin@escola-b.com").await;
    let librarian_b = create_librarian(&app, &admin_b, "bib@escola-b.com").await;

    let uri = format!("/api/staff/{}/role", librarian_b["id"].as_str().unwrap());
    let reply = send(&app, Method::PUT, &uri, Some(&admin_a), Some(json!({ "role": "SCHOOL_ADMIN" }))).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    // E não pode promover ninguém a DEVELOPER
    let reply = send(&app, Method::PUT, &uri, Some(&admin_b), Some(json!({ "role": "DEVELOPER" }))).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn last_copy_can_only_be_issued_once() {
    let app = test_app().await;
    let developer = register_developer(&app).await;
    let (_, admin_a) = create_school(&app, &developer, "Escola A", "admin@escola-a.com").await;
    let (_, admin_b) = create_school(&app, &developer, "Escola B", "admin@escola-b.com").await;

    let book = create_book(&app, &admin_a, "O Cortiço", 1).await;
    let student = send(
        &app,
        Method::POST,
        "/api/students",
        Some(&admin_a),
        Some(json!({ "name": "João", "admissionNumber": "2024-001" })),
    )
    .await;
    assert_eq!(student.status, StatusCode::CREATED);

    let issue_uri = format!("/api/books/{}/issue", book["id"].as_str().unwrap());
    let issue_body = json!({ "studentId": student.body["id"] });

    // Outra escola não enxerga o livro
    let reply = send(&app, Method::POST, &issue_uri, Some(&admin_b), Some(issue_body.clone())).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    let loan = send(&app, Method::POST, &issue_uri, Some(&admin_a), Some(issue_body.clone())).await;
    assert_eq!(loan.status, StatusCode::CREATED);

    let reply = send(&app, Method::POST, &issue_uri, Some(&admin_a), Some(issue_body.clone())).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], "Nenhum exemplar disponível para empréstimo.");

    let return_uri = format!("/api/loans/{}/return", loan.body["id"].as_str().unwrap());
    let reply = send(&app, Method::POST, &return_uri, Some(&admin_a), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body["returnedAt"].is_string());

    let reply = send(&app, Method::POST, &return_uri, Some(&admin_a), None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = send(&app, Method::POST, &issue_uri, Some(&admin_a), Some(issue_body)).await;
    assert_eq!(reply.status, StatusCode::CREATED);
}

#[tokio::test]
async fn platform_config_update_is_visible_on_the_next_read() {
    let app = test_app().await;
    let developer = register_developer(&app).await;

    let reply = send(
        &app,
        Method::PUT,
        "/api/platform/config",
        Some(&developer),
        Some(json!({
            "platformName": "Leitura Viva",
            "supportEmail": "suporte@leituraviva.app",
            "mailer": { "fromAddress": "nao-responda@leituraviva.app", "smtpPort": 587 },
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);

    let reply = send(&app, Method::GET, "/api/platform/config", Some(&developer), None).await;
    assert_eq!(reply.body["platformName"], "Leitura Viva");
    assert_eq!(reply.body["mailer"]["smtpPort"], 587);

    let invalid = send(
        &app,
        Method::PUT,
        "/api/platform/config",
        Some(&developer),
        Some(json!({ "platformName": "", "supportEmail": "nao-e-email" })),
    )
    .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert!(invalid.body["details"]["platform_name"].is_array());

    let reply = send(&app, Method::GET, "/api/platform/config", Some(&developer), None).await;
    assert_eq!(reply.body["platformName"], "Leitura Viva");
}

#[tokio::test]
async fn change_password_requires_the_current_one() {
    let app = test_app().await;
    let developer = register_developer(&app).await;

    let reply = send(
        &app,
        Method::PUT,
        "/api/auth/password",
        Some(&developer),
        Some(json!({ "currentPassword": "errada", "newPassword": "nova-senha-456" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = send(
        &app,
        Method::PUT,
        "/api/auth/password",
        Some(&developer),
        Some(json!({ "currentPassword": PASSWORD, "newPassword": "nova-senha-456" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);

    let reply = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "dev@plataforma.com", "password": "nova-senha-456" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn logout_expires_the_cookie() {
    let app = test_app().await;
    let developer = register_developer(&app).await;

    let reply = send(&app, Method::POST, "/api/auth/logout", Some(&developer), None).await;

    assert_eq!(reply.status, StatusCode::OK);
    let cookie = reply.set_cookie.unwrap();
    assert!(cookie.starts_with("session=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn malformed_json_is_a_json_bad_request() {
    let app = test_app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{ nao e json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Requisição inválida.");
}

#[tokio::test]
async fn nested_account_errors_keep_their_field_details() {
    let app = test_app().await;
    let developer = register_developer(&app).await;

    let school = send(
        &app,
        Method::POST,
        "/api/schools",
        Some(&developer),
        Some(json!({
            "name": "Escola A",
            "admin": { "name": "Admin", "email": "nao-e-email", "password": PASSWORD },
        })),
    )
    .await;
    assert_eq!(school.status, StatusCode::BAD_REQUEST);
    assert_eq!(school.body["details"]["admin.email"][0], "O e-mail fornecido é inválido.");

    let (_, admin) = create_school(&app, &developer, "Escola B", "admin@escola-b.com").await;
    let staff = send(
        &app,
        Method::POST,
        "/api/staff",
        Some(&admin),
        Some(json!({ "name": "", "email": "x", "password": "1" })),
    )
    .await;
    assert_eq!(staff.status, StatusCode::BAD_REQUEST);
    for field in ["name", "email", "password"] {
        assert!(staff.body["details"][field].is_array(), "{field}: {}", staff.body);
    }
}

#[tokio::test]
async fn malformed_path_id_is_a_json_bad_request() {
    let app = test_app().await;
    let developer = register_developer(&app).await;
    let (_, admin) = create_school(&app, &developer, "Escola A", "admin@escola-a.com").await;

    let reply = send(
        &app,
        Method::PUT,
        "/api/staff/nao-uuid/role",
        Some(&admin),
        Some(json!({ "role": "LIBRARIAN" })),
    )
    .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], "Requisição inválida.");
}

#[tokio::test]
async fn login_accepts_a_padded_email() {
    let app = test_app().await;
    register_developer(&app).await;

    let session = login(&app, "  dev@plataforma.com ").await;
    assert!(session.starts_with("session="));
}

async fn failing_router(environment: Environment) -> Router {
    let mut config = AppConfig::for_tests();
    config.environment = environment;
    let state = AppState::from_stores(config, Stores::in_memory()).await.unwrap();

    async fn broken() -> Result<(), AppError> {
        Err(AppError::InternalServerError(anyhow::anyhow!("conexão recusada")))
    }

    Router::new()
        .route("/broken", get(broken))
        .layer(axum_middleware::map_response_with_state(state, expose_internal_errors))
}

#[tokio::test]
async fn internal_error_details_only_in_development() {
    let development = send(&failing_router(Environment::Development).await, Method::GET, "/broken", None, None).await;
    assert_eq!(development.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(development.body["error"], "Ocorreu um erro inesperado.");
    assert!(development.body["details"].as_str().unwrap().contains("conexão recusada"));

    let production = send(&failing_router(Environment::Production).await, Method::GET, "/broken", None, None).await;
    assert_eq!(production.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(production.body, json!({ "error": "Ocorreu um erro inesperado." }));
}
