// src/services/token.rs

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    common::error::{AppError, AuthFailure},
    models::auth::{Claims, Role},
};

/// Falha tipada da verificação de um token. Nunca é um panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token inválido")]
    Invalid,
    #[error("token expirado")]
    Expired,
}

impl From<TokenError> for AuthFailure {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => AuthFailure::InvalidToken,
            TokenError::Expired => AuthFailure::ExpiredToken,
        }
    }
}

/// Emite e verifica o token de identidade `{userId, role, tenantId}` (JWT HS256).
/// As claims são assinadas, não cifradas: o portador já conhece o próprio id, papel e escola.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, user_id: Uuid, role: Role, tenant_id: Option<Uuid>) -> Result<String, AppError> {
        self.issue_at(user_id, role, tenant_id, Utc::now())
    }

    fn issue_at(
        &self,
        user_id: Uuid,
        role: Role,
        tenant_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let expires_at = now + self.ttl;

        let claims = Claims {
            sub: user_id,
            role,
            tenant_id,
            exp: expires_at.timestamp().max(0) as usize,
            iat: now.timestamp().max(0) as usize,
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new("segredo-de-teste", Duration::days(30))
    }

    #[test]
    fn verify_returns_the_issued_identity() {
        let codec = codec();
        let cases = [
            (Uuid::new_v4(), Role::Developer, None),
            (Uuid::new_v4(), Role::SchoolAdmin, Some(Uuid::new_v4())),
            (Uuid::new_v4(), Role::Librarian, Some(Uuid::new_v4())),
        ];

        for (user_id, role, tenant_id) in cases {
            let token = codec.issue(user_id, role, tenant_id).unwrap();
            let claims = codec.verify(&token).unwrap();
            assert_eq!((claims.sub, claims.role, claims.tenant_id), (user_id, role, tenant_id));
        }
    }

    #[test]
    fn tampered_signature_is_invalid() {
        let codec = codec();
        let token = codec
            .issue(Uuid::new_v4(), Role::Librarian, Some(Uuid::new_v4()))
            .unwrap();

        let (unsigned, signature) = token.rsplit_once('.').unwrap();
        let mut bytes = signature.as_bytes().to_vec();
        bytes[0] = if bytes[0] == b'A' { b'B' } else { b'A' };
        let forged = format!("{unsigned}.{}", String::from_utf8(bytes).unwrap());

        assert_eq!(codec.verify(&forged), Err(TokenError::Invalid));
    }

    #[test]
    fn tampered_claims_are_invalid() {
        let codec = codec();
        let token = codec
            .issue(Uuid::new_v4(), Role::Librarian, Some(Uuid::new_v4()))
            .unwrap();
        let other = codec.issue(Uuid::new_v4(), Role::Developer, None).unwrap();

        // payload de um token com a assinatura de outro
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = other.split('.').nth(1).unwrap();

        assert_eq!(codec.verify(&parts.join(".")), Err(TokenError::Invalid));
    }

    #[test]
    fn token_signed_with_another_secret_is_invalid() {
        let other = TokenCodec::new("outro-segredo", Duration::days(30));
        let token = other.issue(Uuid::new_v4(), Role::Developer, None).unwrap();
        assert_eq!(codec().verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let codec = codec();
        let issued_long_ago = Utc::now() - Duration::days(31);
        let token = codec
            .issue_at(Uuid::new_v4(), Role::Librarian, Some(Uuid::new_v4()), issued_long_ago)
            .unwrap();
        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn malformed_input_is_invalid() {
        let codec = codec();
        for garbage in ["", "abc", "a.b.c", "....", "não-é-jwt"] {
            assert_eq!(codec.verify(garbage), Err(TokenError::Invalid));
        }
    }
}
