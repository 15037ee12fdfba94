// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    common::error::expose_internal_errors,
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::{
        auth::auth_guard,
        rbac::{role_gate, RoleSet},
    },
};

// Autenticação primeiro, depois o papel: o último `route_layer` é o mais externo.
fn guarded(routes: Router<AppState>, app_state: &AppState, allowed: RoleSet) -> Router<AppState> {
    routes
        .route_layer(axum_middleware::from_fn_with_state(allowed, role_gate))
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard))
}

pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas
    let public_routes = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/register-dev", post(handlers::auth::register_developer))
        .route("/auth/logout", post(handlers::auth::logout));

    // Qualquer usuário autenticado. As leituras usam o escopo da identidade.
    let any_role_routes = Router::new()
        .route("/auth/me", get(handlers::auth::get_me))
        .route("/auth/password", put(handlers::auth::change_password))
        .route("/books", get(handlers::library::list_books))
        .route("/students", get(handlers::library::list_students))
        .route("/loans", get(handlers::library::list_loans));

    let developer_routes = Router::new()
        .route(
            "/schools",
            post(handlers::tenancy::create_school).get(handlers::tenancy::list_schools),
        )
        .route(
            "/platform/config",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        );

    let school_admin_routes = Router::new()
        .route(
            "/staff",
            post(handlers::tenancy::create_staff).get(handlers::tenancy::list_staff),
        )
        .route("/staff/{id}/role", put(handlers::tenancy::change_role));

    // Escritas da biblioteca: sempre dentro da escola do chamador
    let school_staff_routes = Router::new()
        .route("/schools/current", get(handlers::tenancy::current_school))
        .route("/books", post(handlers::library::create_book))
        .route("/books/{id}/issue", post(handlers::library::issue_book))
        .route("/loans/{id}/return", post(handlers::library::return_loan))
        .route("/students", post(handlers::library::create_student));

    let api_routes = public_routes
        .merge(guarded(any_role_routes, &app_state, RoleSet::ANY_ROLE))
        .merge(guarded(developer_routes, &app_state, RoleSet::DEVELOPER_ONLY))
        .merge(guarded(school_admin_routes, &app_state, RoleSet::SCHOOL_ADMIN_ONLY))
        .merge(guarded(school_staff_routes, &app_state, RoleSet::SCHOOL_STAFF));

    // Combina tudo no router principal
    Router::new()
        .nest("/api", api_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum_middleware::map_response_with_state(
            app_state.clone(),
            expose_internal_errors,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
