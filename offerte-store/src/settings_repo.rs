use async_trait::async_trait;
use offerte_core::repository::SettingsRepository;
use offerte_core::{CompanySettings, CoreResult};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::database::db_error;

/// The settings document lives in a single JSONB row with `id = 1`.
pub struct PostgresSettingsRepository {
    pub pool: PgPool,
}

impl PostgresSettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for PostgresSettingsRepository {
    async fn load_settings(&self) -> CoreResult<Option<CompanySettings>> {
        let row: Option<Json<CompanySettings>> =
            sqlx::query_scalar("SELECT settings FROM company_settings WHERE id = 1")
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("settings"))?;

        Ok(row.map(|json| json.0))
    }

    async fn save_settings(&self, settings: &CompanySettings) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO company_settings (id, settings, updated_at) VALUES (1, $1, $2)
            ON CONFLICT (id) DO UPDATE SET settings = EXCLUDED.settings, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(Json(settings))
        .bind(settings.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("settings"))?;

        Ok(())
    }
}
