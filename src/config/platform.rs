// src/config/platform.rs

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{common::error::AppError, db::SettingsStore, models::settings::PlatformSettings};

/// Configuração da plataforma em memória, com troca atômica do objeto inteiro.
///
/// Leitores recebem sempre o último snapshot confirmado. Atualizações persistem
/// primeiro e só então trocam o `Arc`, segurando o lock de escrita o tempo todo,
/// então duas atualizações concorrentes nunca se intercalam.
#[derive(Clone)]
pub struct PlatformConfig {
    store: Arc<dyn SettingsStore>,
    current: Arc<RwLock<Arc<PlatformSettings>>>,
}

impl PlatformConfig {
    pub async fn load(store: Arc<dyn SettingsStore>) -> Result<Self, AppError> {
        let settings = match store.load().await? {
            Some(settings) => settings,
            None => {
                tracing::info!("nenhuma configuração de plataforma salva, usando os valores padrão");
                PlatformSettings::default()
            }
        };

        Ok(Self {
            store,
            current: Arc::new(RwLock::new(Arc::new(settings))),
        })
    }

    pub async fn current(&self) -> Arc<PlatformSettings> {
        self.current.read().await.clone()
    }

    pub async fn replace(&self, settings: PlatformSettings) -> Result<Arc<PlatformSettings>, AppError> {
        let mut current = self.current.write().await;

        // Se a persistência falhar, o valor em memória continua o anterior
        self.store.save(&settings).await?;

        let settings = Arc::new(settings);
        *current = settings.clone();
        tracing::info!("configuração da plataforma atualizada");
        Ok(settings)
    }
}
