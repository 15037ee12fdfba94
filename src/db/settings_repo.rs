use async_trait::async_trait;
use sqlx::{types::Json, PgPool};

use crate::{
    common::error::AppError,
    db::store::SettingsStore,
    models::settings::PlatformSettings,
};

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for SettingsRepository {
    async fn load(&self) -> Result<Option<PlatformSettings>, AppError> {
        let settings: Option<Json<PlatformSettings>> =
            sqlx::query_scalar("SELECT data FROM platform_settings WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;

        Ok(settings.map(|Json(s)| s))
    }

    async fn save(&self, settings: &PlatformSettings) -> Result<(), AppError> {
        // UPSERT (Insert or Update) do documento inteiro
        sqlx::query(
            r#"
            INSERT INTO platform_settings (id, data)
            VALUES (1, $1)
            ON CONFLICT (id)
            DO UPDATE SET
                data = EXCLUDED.data,
                updated_at = NOW()
            "#,
        )
        .bind(Json(settings))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
