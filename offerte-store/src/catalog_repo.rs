use async_trait::async_trait;
use chrono::{DateTime, Utc};
use offerte_core::catalog::{AdditionalService, ServiceCategory};
use offerte_core::repository::{CatalogRepository, RecordKey};
use offerte_core::{CoreError, CoreResult};
use offerte_shared::LocalizedText;
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{db_error, enum_text, text_enum};

const CATEGORY_COLUMNS: &str = "id, category_id, name, description, icon, active, pricing_model, \
     base_price, hourly_rate, form_fields, created_at, updated_at";

const SERVICE_COLUMNS: &str = "id, service_id, category_id, name, description, price, price_type, \
     hourly_rate, active, sort_order, created_at, updated_at";

pub struct PostgresCatalogRepository {
    pub pool: PgPool,
}

impl PostgresCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    category_id: String,
    name: Json<LocalizedText>,
    description: Json<LocalizedText>,
    icon: String,
    active: bool,
    pricing_model: String,
    base_price: Decimal,
    hourly_rate: Decimal,
    form_fields: Json<Vec<String>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CategoryRow> for ServiceCategory {
    type Error = CoreError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        Ok(ServiceCategory {
            id: row.id,
            category_id: row.category_id,
            name: row.name.0,
            description: row.description.0,
            icon: row.icon,
            active: row.active,
            pricing_model: text_enum(&row.pricing_model)?,
            base_price: row.base_price,
            hourly_rate: row.hourly_rate,
            form_fields: row.form_fields.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ServiceRow {
    id: Uuid,
    service_id: String,
    category_id: String,
    name: Json<LocalizedText>,
    description: Json<LocalizedText>,
    price: Decimal,
    price_type: String,
    hourly_rate: Option<Decimal>,
    active: bool,
    sort_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ServiceRow> for AdditionalService {
    type Error = CoreError;

    fn try_from(row: ServiceRow) -> Result<Self, Self::Error> {
        Ok(AdditionalService {
            id: row.id,
            service_id: row.service_id,
            category_id: row.category_id,
            name: row.name.0,
            description: row.description.0,
            price: row.price,
            price_type: text_enum(&row.price_type)?,
            hourly_rate: row.hourly_rate,
            active: row.active,
            order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl CatalogRepository for PostgresCatalogRepository {
    // ============================================================================
    // Categories
    // ============================================================================

    async fn list_categories(&self, active_only: bool) -> CoreResult<Vec<ServiceCategory>> {
        let sql = format!(
            "SELECT {} FROM service_categories WHERE (NOT $1 OR active) ORDER BY category_id",
            CATEGORY_COLUMNS
        );
        let rows = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("categories"))?;

        rows.into_iter().map(ServiceCategory::try_from).collect()
    }

    async fn get_category(&self, key: &RecordKey) -> CoreResult<Option<ServiceCategory>> {
        let row = match key {
            RecordKey::Id(id) => {
                let sql = format!("SELECT {} FROM service_categories WHERE id = $1", CATEGORY_COLUMNS);
                sqlx::query_as::<_, CategoryRow>(&sql)
                    .bind(*id)
                    .fetch_optional(&self.pool)
                    .await
            }
            RecordKey::Number(slug) => {
                let sql = format!("SELECT {} FROM service_categories WHERE category_id = $1", CATEGORY_COLUMNS);
                sqlx::query_as::<_, CategoryRow>(&sql)
                    .bind(slug)
                    .fetch_optional(&self.pool)
                    .await
            }
        }
        .map_err(db_error("category"))?;

        row.map(ServiceCategory::try_from).transpose()
    }

    async fn insert_category(&self, category: &ServiceCategory) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO service_categories (id, category_id, name, description, icon, active,
                pricing_model, base_price, hourly_rate, form_fields, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(category.id)
        .bind(&category.category_id)
        .bind(Json(&category.name))
        .bind(Json(&category.description))
        .bind(&category.icon)
        .bind(category.active)
        .bind(enum_text(&category.pricing_model)?)
        .bind(category.base_price)
        .bind(category.hourly_rate)
        .bind(Json(&category.form_fields))
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Category"))?;

        Ok(())
    }

    async fn update_category(&self, category: &ServiceCategory) -> CoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE service_categories SET name = $2, description = $3, icon = $4, active = $5,
                pricing_model = $6, base_price = $7, hourly_rate = $8, form_fields = $9, updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(category.id)
        .bind(Json(&category.name))
        .bind(Json(&category.description))
        .bind(&category.icon)
        .bind(category.active)
        .bind(enum_text(&category.pricing_model)?)
        .bind(category.base_price)
        .bind(category.hourly_rate)
        .bind(Json(&category.form_fields))
        .bind(category.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("category"))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Category {}", category.category_id)));
        }
        Ok(())
    }

    async fn delete_category(&self, key: &RecordKey) -> CoreResult<bool> {
        let result = match key {
            RecordKey::Id(id) => sqlx::query("DELETE FROM service_categories WHERE id = $1").bind(*id),
            RecordKey::Number(slug) => {
                sqlx::query("DELETE FROM service_categories WHERE category_id = $1").bind(slug.clone())
            }
        }
        .execute(&self.pool)
        .await
        .map_err(db_error("category"))?;

        Ok(result.rows_affected() > 0)
    }

    // ============================================================================
    // Additional Services
    // ============================================================================

    async fn list_services(
        &self,
        category_id: Option<&str>,
        active_only: bool,
    ) -> CoreResult<Vec<AdditionalService>> {
        let sql = format!(
            "SELECT {} FROM additional_services \
             WHERE ($1::TEXT IS NULL OR category_id = $1) AND (NOT $2 OR active) \
             ORDER BY sort_order, service_id",
            SERVICE_COLUMNS
        );
        let rows = sqlx::query_as::<_, ServiceRow>(&sql)
            .bind(category_id)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("services"))?;

        rows.into_iter().map(AdditionalService::try_from).collect()
    }

    async fn get_service(&self, key: &RecordKey) -> CoreResult<Option<AdditionalService>> {
        let row = match key {
            RecordKey::Id(id) => {
                let sql = format!("SELECT {} FROM additional_services WHERE id = $1", SERVICE_COLUMNS);
                sqlx::query_as::<_, ServiceRow>(&sql)
                    .bind(*id)
                    .fetch_optional(&self.pool)
                    .await
            }
            RecordKey::Number(slug) => {
                let sql = format!("SELECT {} FROM additional_services WHERE service_id = $1", SERVICE_COLUMNS);
                sqlx::query_as::<_, ServiceRow>(&sql)
                    .bind(slug)
                    .fetch_optional(&self.pool)
                    .await
            }
        }
        .map_err(db_error("service"))?;

        row.map(AdditionalService::try_from).transpose()
    }

    async fn insert_service(&self, service: &AdditionalService) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO additional_services (id, service_id, category_id, name, description, price,
                price_type, hourly_rate, active, sort_order, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(service.id)
        .bind(&service.service_id)
        .bind(&service.category_id)
        .bind(Json(&service.name))
        .bind(Json(&service.description))
        .bind(service.price)
        .bind(enum_text(&service.price_type)?)
        .bind(service.hourly_rate)
        .bind(service.active)
        .bind(service.order)
        .bind(service.created_at)
        .bind(service.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Service"))?;

        Ok(())
    }

    async fn update_service(&self, service: &AdditionalService) -> CoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE additional_services SET name = $2, description = $3, price = $4, price_type = $5,
                hourly_rate = $6, active = $7, sort_order = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(service.id)
        .bind(Json(&service.name))
        .bind(Json(&service.description))
        .bind(service.price)
        .bind(enum_text(&service.price_type)?)
        .bind(service.hourly_rate)
        .bind(service.active)
        .bind(service.order)
        .bind(service.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("service"))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Service {}", service.service_id)));
        }
        Ok(())
    }

    async fn delete_service(&self, key: &RecordKey) -> CoreResult<bool> {
        let result = match key {
            RecordKey::Id(id) => sqlx::query("DELETE FROM additional_services WHERE id = $1").bind(*id),
            RecordKey::Number(slug) => {
                sqlx::query("DELETE FROM additional_services WHERE service_id = $1").bind(slug.clone())
            }
        }
        .execute(&self.pool)
        .await
        .map_err(db_error("service"))?;

        Ok(result.rows_affected() > 0)
    }
}
