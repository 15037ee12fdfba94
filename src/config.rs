// src/config.rs

pub mod platform;

use std::{env, sync::Arc, time::Duration};

use anyhow::{bail, Context};
use sqlx::postgres::PgPoolOptions;

use crate::{
    config::platform::PlatformConfig,
    db::Stores,
    services::{
        auth::AuthService,
        library_service::LibraryService,
        password::{self, CredentialStore},
        tenancy_service::TenantService,
        token::TokenCodec,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Environment::Development
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }

    fn parse(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => bail!("APP_ENV inválido: '{other}' (use development ou production)"),
        }
    }
}

/// Configuração do processo: carregada uma vez na subida e congelada num `Arc`.
#[derive(Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub bind_addr: String,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub session_cookie_name: String,
    pub token_ttl: chrono::Duration,
    pub bcrypt_cost: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let environment = lookup("APP_ENV")
            .map(|v| Environment::parse(&v))
            .transpose()?
            .unwrap_or(Environment::Development);

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .context("JWT_SECRET deve ser definido")?;
        if environment.is_production() && jwt_secret.len() < 32 {
            bail!("JWT_SECRET deve ter pelo menos 32 caracteres em produção");
        }

        let token_ttl_days: i64 = lookup("TOKEN_TTL_DAYS")
            .map(|v| v.parse().context("TOKEN_TTL_DAYS deve ser um número inteiro"))
            .transpose()?
            .unwrap_or(30);
        if token_ttl_days <= 0 {
            bail!("TOKEN_TTL_DAYS deve ser positivo");
        }

        let bcrypt_cost: u32 = lookup("BCRYPT_COST")
            .map(|v| v.parse().context("BCRYPT_COST deve ser um número inteiro"))
            .transpose()?
            .unwrap_or(password::DEFAULT_COST);
        if !(4..=31).contains(&bcrypt_cost) {
            bail!("BCRYPT_COST deve estar entre 4 e 31");
        }

        Ok(Self {
            environment,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            database_url: lookup("DATABASE_URL").filter(|s| !s.trim().is_empty()),
            jwt_secret,
            session_cookie_name: lookup("SESSION_COOKIE_NAME").unwrap_or_else(|| "session".to_string()),
            token_ttl: chrono::Duration::days(token_ttl_days),
            bcrypt_cost,
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            environment: Environment::Development,
            bind_addr: "127.0.0.1:0".to_string(),
            database_url: None,
            jwt_secret: "segredo-dos-testes".to_string(),
            session_cookie_name: "session".to_string(),
            token_ttl: chrono::Duration::days(30),
            bcrypt_cost: 4,
        }
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth_service: AuthService,
    pub tenant_service: TenantService,
    pub library_service: LibraryService,
    pub platform: PlatformConfig,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let stores = match &config.database_url {
            Some(database_url) => {
                // Conecta ao banco de dados, usando '?' para propagar erros
                let db_pool = PgPoolOptions::new()
                    .max_connections(5)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await
                    .context("Falha ao conectar ao banco de dados")?;
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!()
                    .run(&db_pool)
                    .await
                    .context("Falha ao rodar as migrações do banco de dados")?;
                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                Stores::postgres(db_pool)
            }
            None => {
                tracing::warn!("DATABASE_URL não definida: usando o store em memória (os dados somem ao reiniciar)");
                Stores::in_memory()
            }
        };

        Self::from_stores(config, stores).await
    }

    // --- Monta o gráfico de dependências ---
    pub async fn from_stores(config: AppConfig, stores: Stores) -> anyhow::Result<Self> {
        let credentials = CredentialStore::new(config.bcrypt_cost)?;
        let tokens = TokenCodec::new(&config.jwt_secret, config.token_ttl);
        let platform = PlatformConfig::load(stores.settings.clone()).await?;

        let auth_service = AuthService::new(stores.users.clone(), credentials.clone(), tokens);
        let tenant_service = TenantService::new(stores.tenants.clone(), stores.users.clone(), credentials);
        let library_service = LibraryService::new(stores.library.clone());

        Ok(Self {
            config: Arc::new(config),
            auth_service,
            tenant_service,
            library_service,
            platform,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_the_secret_is_set() {
        let config = AppConfig::from_lookup(lookup(&[("JWT_SECRET", "abc")])).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.session_cookie_name, "session");
        assert_eq!(config.token_ttl, chrono::Duration::days(30));
        assert_eq!(config.bcrypt_cost, password::DEFAULT_COST);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn missing_secret_is_an_error() {
        assert!(AppConfig::from_lookup(lookup(&[])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("JWT_SECRET", "  ")])).is_err());
    }

    #[test]
    fn production_requires_a_long_secret() {
        let short = lookup(&[("JWT_SECRET", "curto"), ("APP_ENV", "production")]);
        assert!(AppConfig::from_lookup(short).is_err());

        let long_secret = "x".repeat(32);
        let long = lookup(&[("JWT_SECRET", long_secret.as_str()), ("APP_ENV", "production")]);
        let config = AppConfig::from_lookup(long).unwrap();
        assert!(config.environment.is_production());
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        assert!(AppConfig::from_lookup(lookup(&[("JWT_SECRET", "a"), ("TOKEN_TTL_DAYS", "0")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("JWT_SECRET", "a"), ("BCRYPT_COST", "3")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("JWT_SECRET", "a"), ("APP_ENV", "staging")])).is_err());
    }
}
