// src/services/password.rs

use std::sync::Arc;

use bcrypt::{hash, verify};

use crate::{common::error::AppError, models::auth::PasswordHash};

/// Custo padrão do bcrypt: caro para força bruta offline, barato para login interativo.
pub const DEFAULT_COST: u32 = 10;

// Senha usada só para gerar o hash "fantasma" do login de e-mail inexistente
const DUMMY_PASSWORD: &str = "senha-fantasma-para-equalizar-tempo";

/// Hash e verificação de senhas. Todo trabalho de bcrypt roda no pool bloqueante.
#[derive(Clone)]
pub struct CredentialStore {
    cost: u32,
    dummy_hash: Arc<str>,
}

impl CredentialStore {
    pub fn new(cost: u32) -> Result<Self, AppError> {
        let dummy_hash = hash(DUMMY_PASSWORD, cost)?;
        Ok(Self {
            cost,
            dummy_hash: dummy_hash.into(),
        })
    }

    pub async fn hash(&self, plaintext: &str) -> Result<PasswordHash, AppError> {
        let password_clone = plaintext.to_owned();
        let cost = self.cost;

        let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        Ok(PasswordHash::from_bcrypt(hashed))
    }

    pub async fn verify(&self, plaintext: &str, password_hash: &str) -> Result<bool, AppError> {
        let password_clone = plaintext.to_owned();
        let password_hash_clone = password_hash.to_owned();

        // Executa a verificação em um thread separado
        let is_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        Ok(is_valid)
    }

    /// Gasta o mesmo tempo de uma verificação real quando o usuário não existe.
    pub async fn verify_absent(&self, plaintext: &str) -> Result<(), AppError> {
        let dummy = self.dummy_hash.clone();
        self.verify(plaintext, &dummy).await.map(|_| ())
    }
}
