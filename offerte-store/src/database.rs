use offerte_core::CoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::{error, info};

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

/// Unique and foreign-key violations become `Conflict`; everything else is
/// a storage error.
pub(crate) fn db_error(context: &str) -> impl Fn(sqlx::Error) -> CoreError + '_ {
    move |e| {
        if let Some(db) = e.as_database_error() {
            if db.is_unique_violation() {
                return CoreError::Conflict(format!("{} already exists", context));
            }
            if db.is_foreign_key_violation() {
                return CoreError::Conflict(format!("{} is still referenced", context));
            }
        }
        error!("Database error ({}): {}", context, e);
        CoreError::StorageError(e.to_string())
    }
}

/// Lowercase serde name of a unit enum, e.g. `OfferStatus::Draft` -> `draft`.
pub(crate) fn enum_text<T: Serialize>(value: &T) -> Result<String, CoreError> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => Ok(s),
        Ok(other) => Err(CoreError::StorageError(format!("not a text enum: {}", other))),
        Err(e) => Err(CoreError::StorageError(e.to_string())),
    }
}

pub(crate) fn text_enum<T: DeserializeOwned>(text: &str) -> Result<T, CoreError> {
    serde_json::from_value(serde_json::Value::String(text.to_string()))
        .map_err(|e| CoreError::StorageError(format!("unexpected stored value {:?}: {}", text, e)))
}
