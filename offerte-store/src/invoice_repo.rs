use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use offerte_core::invoice::InvoiceItem;
use offerte_core::repository::{InvoiceFilter, InvoiceRepository, RecordKey};
use offerte_core::{CoreError, CoreResult, Invoice};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::db_error;

const INVOICE_COLUMNS: &str = "id, invoice_number, offer_id, customer_id, invoice_date, due_date, status, \
     items, subtotal, tax_rate, tax_amount, total, currency, notes, created_by, created_at, updated_at";

pub struct PostgresInvoiceRepository {
    pub pool: PgPool,
}

impl PostgresInvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct InvoiceRow {
    id: Uuid,
    invoice_number: String,
    offer_id: Option<Uuid>,
    customer_id: Uuid,
    invoice_date: NaiveDate,
    due_date: NaiveDate,
    status: String,
    items: Json<Vec<InvoiceItem>>,
    subtotal: Decimal,
    tax_rate: Decimal,
    tax_amount: Decimal,
    total: Decimal,
    currency: String,
    notes: Option<String>,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = CoreError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        Ok(Invoice {
            id: row.id,
            invoice_number: row.invoice_number,
            offer_id: row.offer_id,
            customer_id: row.customer_id,
            invoice_date: row.invoice_date,
            due_date: row.due_date,
            status: row.status.parse()?,
            items: row.items.0,
            subtotal: row.subtotal,
            tax_rate: row.tax_rate,
            tax_amount: row.tax_amount,
            total: row.total,
            currency: row.currency,
            notes: row.notes,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl InvoiceRepository for PostgresInvoiceRepository {
    async fn insert_invoice(&self, invoice: &Invoice) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO invoices (id, invoice_number, offer_id, customer_id, invoice_date, due_date, status,
                items, subtotal, tax_rate, tax_amount, total, currency, notes, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(invoice.id)
        .bind(&invoice.invoice_number)
        .bind(invoice.offer_id)
        .bind(invoice.customer_id)
        .bind(invoice.invoice_date)
        .bind(invoice.due_date)
        .bind(invoice.status.to_string())
        .bind(Json(&invoice.items))
        .bind(invoice.subtotal)
        .bind(invoice.tax_rate)
        .bind(invoice.tax_amount)
        .bind(invoice.total)
        .bind(&invoice.currency)
        .bind(&invoice.notes)
        .bind(&invoice.created_by)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("invoice number"))?;

        Ok(())
    }

    async fn get_invoice(&self, key: &RecordKey) -> CoreResult<Option<Invoice>> {
        let row = match key {
            RecordKey::Id(id) => {
                let sql = format!("SELECT {} FROM invoices WHERE id = $1", INVOICE_COLUMNS);
                sqlx::query_as::<_, InvoiceRow>(&sql)
                    .bind(*id)
                    .fetch_optional(&self.pool)
                    .await
            }
            RecordKey::Number(number) => {
                let sql = format!("SELECT {} FROM invoices WHERE invoice_number = $1", INVOICE_COLUMNS);
                sqlx::query_as::<_, InvoiceRow>(&sql)
                    .bind(number)
                    .fetch_optional(&self.pool)
                    .await
            }
        }
        .map_err(db_error("invoice"))?;

        row.map(Invoice::try_from).transpose()
    }

    async fn list_invoices(&self, filter: &InvoiceFilter) -> CoreResult<Vec<Invoice>> {
        let status = filter.status.map(|s| s.to_string());
        let sql = format!(
            "SELECT {} FROM invoices \
             WHERE ($1::TEXT IS NULL OR status = $1) AND ($2::UUID IS NULL OR customer_id = $2) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4",
            INVOICE_COLUMNS
        );

        let rows = sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(status)
            .bind(filter.customer_id)
            .bind(filter.page.limit)
            .bind(filter.page.skip)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("invoices"))?;

        rows.into_iter().map(Invoice::try_from).collect()
    }

    async fn update_invoice(&self, invoice: &Invoice) -> CoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE invoices SET due_date = $2, status = $3, items = $4, subtotal = $5, tax_amount = $6,
                total = $7, notes = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(invoice.id)
        .bind(invoice.due_date)
        .bind(invoice.status.to_string())
        .bind(Json(&invoice.items))
        .bind(invoice.subtotal)
        .bind(invoice.tax_amount)
        .bind(invoice.total)
        .bind(&invoice.notes)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("invoice"))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Invoice {}", invoice.id)));
        }
        Ok(())
    }

    async fn delete_invoice(&self, key: &RecordKey) -> CoreResult<bool> {
        let result = match key {
            RecordKey::Id(id) => sqlx::query("DELETE FROM invoices WHERE id = $1").bind(*id),
            RecordKey::Number(number) => {
                sqlx::query("DELETE FROM invoices WHERE invoice_number = $1").bind(number.clone())
            }
        }
        .execute(&self.pool)
        .await
        .map_err(db_error("invoice"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn last_invoice_number(&self) -> CoreResult<Option<String>> {
        let number: Option<String> = sqlx::query_scalar(
            "SELECT invoice_number FROM invoices \
             ORDER BY LENGTH(invoice_number) DESC, invoice_number DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("invoice number"))?;

        Ok(number)
    }
}
