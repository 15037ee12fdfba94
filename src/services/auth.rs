// src/services/auth.rs

use std::sync::Arc;

use crate::{
    common::error::{AppError, AuthFailure},
    db::UserStore,
    models::auth::{normalize_email, Identity, NewUser, Role, User},
    services::{password::CredentialStore, token::TokenCodec},
};

const DEFAULT_DEVELOPER_NAME: &str = "Desenvolvedor";

/// Resultado de um login/registro: o usuário e o token que vai no cookie.
#[derive(Debug)]
pub struct Session {
    pub user: User,
    pub token: String,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    credentials: CredentialStore,
    tokens: TokenCodec,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, credentials: CredentialStore, tokens: TokenCodec) -> Self {
        Self {
            users,
            credentials,
            tokens,
        }
    }

    /// Cria a única conta de operador da plataforma.
    pub async fn register_developer(
        &self,
        name: Option<&str>,
        email: &str,
        password: &str,
    ) -> Result<Session, AppError> {
        if self.users.developer_exists().await? {
            return Err(AppError::DeveloperAlreadyExists);
        }

        let email = normalize_email(email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::EmailAlreadyExists);
        }

        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_DEVELOPER_NAME)
            .to_string();

        let password_hash = self.credentials.hash(password).await?;

        // O store repete a checagem de forma atômica, então uma corrida entre dois registros
        // termina em DeveloperAlreadyExists para o segundo.
        let user = self
            .users
            .create_user(NewUser { name, email, password_hash }, Role::Developer, None)
            .await?;

        tracing::info!(user_id = %user.id, "conta de desenvolvedor criada");
        self.open_session(user)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let email = normalize_email(email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            // Mesmo custo e mesma resposta de uma senha errada
            self.credentials.verify_absent(password).await?;
            tracing::debug!("login recusado: e-mail desconhecido");
            return Err(AppError::InvalidCredentials);
        };

        if !self.credentials.verify(password, &user.password_hash).await? {
            tracing::debug!(user_id = %user.id, "login recusado: senha incorreta");
            return Err(AppError::InvalidCredentials);
        }

        self.open_session(user)
    }

    /// Token → claims verificadas → registro atual → identidade.
    /// Qualquer falha vira `Unauthenticated`; erros de infraestrutura continuam 500.
    pub async fn resolve_identity(&self, token: &str) -> Result<Identity, AppError> {
        let claims = self
            .tokens
            .verify(token)
            .map_err(|e| AppError::Unauthenticated(e.into()))?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::Unauthenticated(AuthFailure::UserNotFound))?;

        // Papel ou escola mudaram depois da emissão: a sessão antiga deixa de valer
        if user.role != claims.role || user.tenant_id != claims.tenant_id {
            return Err(AppError::Unauthenticated(AuthFailure::StaleSession));
        }

        Identity::from_user(&user).ok_or(AppError::Unauthenticated(AuthFailure::StaleSession))
    }

    pub async fn change_password(
        &self,
        identity: &Identity,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = self
            .users
            .find_by_id(identity.user_id)
            .await?
            .ok_or(AppError::Unauthenticated(AuthFailure::UserNotFound))?;

        if !self.credentials.verify(current_password, &user.password_hash).await? {
            return Err(AppError::BadRequest("A senha atual está incorreta.".to_string()));
        }

        let password_hash = self.credentials.hash(new_password).await?;
        self.users.update_password(user.id, &password_hash).await?;

        tracing::info!(user_id = %user.id, "senha alterada");
        Ok(())
    }

    fn open_session(&self, user: User) -> Result<Session, AppError> {
        let token = self.tokens.issue(user.id, user.role, user.tenant_id)?;
        Ok(Session { user, token })
    }
}
