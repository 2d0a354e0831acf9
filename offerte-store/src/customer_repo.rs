use async_trait::async_trait;
use chrono::{DateTime, Utc};
use offerte_core::customer::CustomerAddress;
use offerte_core::repository::{CustomerFilter, CustomerRepository, RecordKey};
use offerte_core::{CoreError, CoreResult, Customer};
use offerte_shared::Masked;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::db_error;

const CUSTOMER_COLUMNS: &str = "id, customer_number, salutation, first_name, last_name, email, phone, \
     address, notes, active, created_by, created_at, updated_at";

pub struct PostgresCustomerRepository {
    pub pool: PgPool,
}

impl PostgresCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    customer_number: String,
    salutation: String,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    address: Json<CustomerAddress>,
    notes: Option<String>,
    active: bool,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            customer_number: row.customer_number,
            salutation: row.salutation,
            first_name: row.first_name,
            last_name: row.last_name,
            email: Masked::new(row.email),
            phone: row.phone,
            address: row.address.0,
            notes: row.notes,
            active: row.active,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl CustomerRepository for PostgresCustomerRepository {
    async fn insert_customer(&self, customer: &Customer) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO customers (id, customer_number, salutation, first_name, last_name, email, phone,
                address, notes, active, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(customer.id)
        .bind(&customer.customer_number)
        .bind(&customer.salutation)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(customer.email.expose())
        .bind(&customer.phone)
        .bind(Json(&customer.address))
        .bind(&customer.notes)
        .bind(customer.active)
        .bind(&customer.created_by)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("customer number"))?;

        Ok(())
    }

    async fn get_customer(&self, key: &RecordKey) -> CoreResult<Option<Customer>> {
        let row = match key {
            RecordKey::Id(id) => {
                let sql = format!("SELECT {} FROM customers WHERE id = $1", CUSTOMER_COLUMNS);
                sqlx::query_as::<_, CustomerRow>(&sql)
                    .bind(*id)
                    .fetch_optional(&self.pool)
                    .await
            }
            RecordKey::Number(number) => {
                let sql = format!("SELECT {} FROM customers WHERE customer_number = $1", CUSTOMER_COLUMNS);
                sqlx::query_as::<_, CustomerRow>(&sql)
                    .bind(number)
                    .fetch_optional(&self.pool)
                    .await
            }
        }
        .map_err(db_error("customer"))?;

        Ok(row.map(Customer::from))
    }

    async fn list_customers(&self, filter: &CustomerFilter) -> CoreResult<Vec<Customer>> {
        let pattern = filter.search.as_ref().map(|s| format!("%{}%", s));
        let sql = format!(
            "SELECT {} FROM customers \
             WHERE (NOT $1 OR active) \
               AND ($2::TEXT IS NULL OR first_name ILIKE $2 OR last_name ILIKE $2 \
                    OR email ILIKE $2 OR customer_number ILIKE $2) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4",
            CUSTOMER_COLUMNS
        );

        let rows = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(filter.active_only)
            .bind(pattern)
            .bind(filter.page.limit)
            .bind(filter.page.skip)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("customers"))?;

        Ok(rows.into_iter().map(Customer::from).collect())
    }

    async fn update_customer(&self, customer: &Customer) -> CoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE customers SET salutation = $2, first_name = $3, last_name = $4, email = $5,
                phone = $6, address = $7, notes = $8, active = $9, updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(customer.id)
        .bind(&customer.salutation)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(customer.email.expose())
        .bind(&customer.phone)
        .bind(Json(&customer.address))
        .bind(&customer.notes)
        .bind(customer.active)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("customer"))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Customer {}", customer.id)));
        }
        Ok(())
    }

    async fn delete_customer(&self, key: &RecordKey) -> CoreResult<bool> {
        let result = match key {
            RecordKey::Id(id) => sqlx::query("DELETE FROM customers WHERE id = $1").bind(*id),
            RecordKey::Number(number) => {
                sqlx::query("DELETE FROM customers WHERE customer_number = $1").bind(number.clone())
            }
        }
        .execute(&self.pool)
        .await
        .map_err(db_error("customer"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn last_customer_number(&self) -> CoreResult<Option<String>> {
        let number: Option<String> = sqlx::query_scalar(
            "SELECT customer_number FROM customers \
             ORDER BY LENGTH(customer_number) DESC, customer_number DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("customer number"))?;

        Ok(number)
    }
}
