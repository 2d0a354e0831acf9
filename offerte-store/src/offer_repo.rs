use async_trait::async_trait;
use chrono::{DateTime, Utc};
use offerte_core::offer::{ContactDetails, Location, ServiceDetails};
use offerte_core::repository::{OfferFilter, OfferRepository, RecordKey};
use offerte_core::{CoreError, CoreResult, Offer};
use offerte_pricing::{AddOnLine, PricingBreakdown};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::db_error;

const OFFER_COLUMNS: &str = "id, offer_number, customer_id, status, category, language, customer, \
     current_location, new_location, service_details, moving_price, additional_services, total, \
     pricing, notes, contact_person, email_sent, email_sent_at, created_by, created_at, updated_at";

pub struct PostgresOfferRepository {
    pub pool: PgPool,
}

impl PostgresOfferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OfferRow {
    id: Uuid,
    offer_number: String,
    customer_id: Option<Uuid>,
    status: String,
    category: String,
    language: String,
    customer: Json<ContactDetails>,
    current_location: Json<Location>,
    new_location: Json<Location>,
    service_details: Json<ServiceDetails>,
    moving_price: Decimal,
    additional_services: Json<Vec<AddOnLine>>,
    total: Decimal,
    pricing: Option<Json<PricingBreakdown>>,
    notes: Option<String>,
    contact_person: Option<String>,
    email_sent: bool,
    email_sent_at: Option<DateTime<Utc>>,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OfferRow> for Offer {
    type Error = CoreError;

    fn try_from(row: OfferRow) -> Result<Self, Self::Error> {
        Ok(Offer {
            id: row.id,
            offer_number: row.offer_number,
            customer_id: row.customer_id,
            status: row.status.parse()?,
            category: row.category,
            language: row.language,
            customer: row.customer.0,
            current_location: row.current_location.0,
            new_location: row.new_location.0,
            service_details: row.service_details.0,
            moving_price: row.moving_price,
            additional_services: row.additional_services.0,
            total: row.total,
            pricing: row.pricing.map(|p| p.0),
            notes: row.notes,
            contact_person: row.contact_person,
            email_sent: row.email_sent,
            email_sent_at: row.email_sent_at,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl OfferRepository for PostgresOfferRepository {
    async fn insert_offer(&self, offer: &Offer) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO offers (id, offer_number, customer_id, status, category, language, customer,
                current_location, new_location, service_details, moving_price, additional_services,
                total, pricing, notes, contact_person, email_sent, email_sent_at, created_by,
                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)
            "#,
        )
        .bind(offer.id)
        .bind(&offer.offer_number)
        .bind(offer.customer_id)
        .bind(offer.status.to_string())
        .bind(&offer.category)
        .bind(&offer.language)
        .bind(Json(&offer.customer))
        .bind(Json(&offer.current_location))
        .bind(Json(&offer.new_location))
        .bind(Json(&offer.service_details))
        .bind(offer.moving_price)
        .bind(Json(&offer.additional_services))
        .bind(offer.total)
        .bind(offer.pricing.as_ref().map(Json))
        .bind(&offer.notes)
        .bind(&offer.contact_person)
        .bind(offer.email_sent)
        .bind(offer.email_sent_at)
        .bind(&offer.created_by)
        .bind(offer.created_at)
        .bind(offer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("offer number"))?;

        Ok(())
    }

    async fn get_offer(&self, key: &RecordKey) -> CoreResult<Option<Offer>> {
        let row = match key {
            RecordKey::Id(id) => {
                let sql = format!("SELECT {} FROM offers WHERE id = $1", OFFER_COLUMNS);
                sqlx::query_as::<_, OfferRow>(&sql)
                    .bind(*id)
                    .fetch_optional(&self.pool)
                    .await
            }
            RecordKey::Number(number) => {
                let sql = format!("SELECT {} FROM offers WHERE offer_number = $1", OFFER_COLUMNS);
                sqlx::query_as::<_, OfferRow>(&sql)
                    .bind(number)
                    .fetch_optional(&self.pool)
                    .await
            }
        }
        .map_err(db_error("offer"))?;

        row.map(Offer::try_from).transpose()
    }

    async fn list_offers(&self, filter: &OfferFilter) -> CoreResult<Vec<Offer>> {
        let status = filter.status.map(|s| s.to_string());
        let sql = format!(
            "SELECT {} FROM offers \
             WHERE ($1::TEXT IS NULL OR status = $1) AND ($2::TEXT IS NULL OR category = $2) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4",
            OFFER_COLUMNS
        );

        let rows = sqlx::query_as::<_, OfferRow>(&sql)
            .bind(status)
            .bind(filter.category.clone())
            .bind(filter.page.limit)
            .bind(filter.page.skip)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("offers"))?;

        rows.into_iter().map(Offer::try_from).collect()
    }

    async fn update_offer(&self, offer: &Offer) -> CoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE offers SET customer_id = $2, status = $3, language = $4, customer = $5,
                current_location = $6, new_location = $7, service_details = $8, moving_price = $9,
                additional_services = $10, total = $11, pricing = $12, notes = $13,
                contact_person = $14, email_sent = $15, email_sent_at = $16, updated_at = $17
            WHERE id = $1
            "#,
        )
        .bind(offer.id)
        .bind(offer.customer_id)
        .bind(offer.status.to_string())
        .bind(&offer.language)
        .bind(Json(&offer.customer))
        .bind(Json(&offer.current_location))
        .bind(Json(&offer.new_location))
        .bind(Json(&offer.service_details))
        .bind(offer.moving_price)
        .bind(Json(&offer.additional_services))
        .bind(offer.total)
        .bind(offer.pricing.as_ref().map(Json))
        .bind(&offer.notes)
        .bind(&offer.contact_person)
        .bind(offer.email_sent)
        .bind(offer.email_sent_at)
        .bind(offer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("offer"))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Offer {}", offer.id)));
        }
        Ok(())
    }

    async fn delete_offer(&self, key: &RecordKey) -> CoreResult<bool> {
        let result = match key {
            RecordKey::Id(id) => sqlx::query("DELETE FROM offers WHERE id = $1").bind(*id),
            RecordKey::Number(number) => {
                sqlx::query("DELETE FROM offers WHERE offer_number = $1").bind(number.clone())
            }
        }
        .execute(&self.pool)
        .await
        .map_err(db_error("offer"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn last_offer_number(&self) -> CoreResult<Option<String>> {
        // Numbers are zero-padded digit strings; length first keeps 100000 after 99999
        let number: Option<String> = sqlx::query_scalar(
            "SELECT offer_number FROM offers ORDER BY LENGTH(offer_number) DESC, offer_number DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("offer number"))?;

        Ok(number)
    }
}
