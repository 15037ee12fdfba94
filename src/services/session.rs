// src/services/session.rs

use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::config::AppConfig;

/// Cookie de sessão: HttpOnly (fora do alcance de scripts), SameSite=Strict,
/// Secure em produção e com a mesma validade do token.
pub fn session_cookie(config: &AppConfig, token: String) -> Cookie<'static> {
    Cookie::build((config.session_cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(config.environment.is_production())
        .max_age(time::Duration::seconds(config.token_ttl.num_seconds()))
        .build()
}

/// Cookie usado para remover a sessão (mesmo nome e path do cookie de sessão).
pub fn removal_cookie(config: &AppConfig) -> Cookie<'static> {
    Cookie::build((config.session_cookie_name.clone(), ""))
        .path("/")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    #[test]
    fn session_cookie_is_http_only_and_strict() {
        let config = AppConfig::for_tests();
        let cookie = session_cookie(&config, "abc.def.ghi".to_string());

        assert_eq!(cookie.name(), "session");
        assert_eq!(cookie.value(), "abc.def.ghi");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(30)));
        assert_ne!(cookie.secure(), Some(true));
    }

    #[test]
    fn session_cookie_is_secure_in_production() {
        let config = AppConfig {
            environment: Environment::Production,
            ..AppConfig::for_tests()
        };
        let cookie = session_cookie(&config, "t".to_string());
        assert_eq!(cookie.secure(), Some(true));
    }
}
