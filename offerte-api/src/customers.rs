use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use offerte_core::numbering::next_customer_number;
use offerte_core::repository::{CustomerFilter, Page, RecordKey};
use offerte_core::{Customer, CustomerUpdate, NewCustomer};
use offerte_shared::pii::redact_email;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppJson};
use crate::middleware::{admin_middleware, Claims};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CustomerQuery {
    #[serde(default = "default_active_only")]
    pub active_only: bool,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

fn default_active_only() -> bool {
    true
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextNumberResponse {
    pub next_number: String,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/customers/next-number", get(next_number))
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route_layer(middleware::from_fn_with_state(state, admin_middleware))
}

async fn find_customer(state: &AppState, id: &str) -> Result<Customer, AppError> {
    state
        .customers
        .get_customer(&RecordKey::parse(id))
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Customer {} not found", id)))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/customers/next-number
pub async fn next_number(State(state): State<AppState>) -> Result<Json<NextNumberResponse>, AppError> {
    let last = state.customers.last_customer_number().await?;
    Ok(Json(NextNumberResponse {
        next_number: next_customer_number(last.as_deref()),
    }))
}

/// GET /api/customers
pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<CustomerQuery>,
) -> Result<Json<Vec<Customer>>, AppError> {
    let filter = CustomerFilter {
        active_only: query.active_only,
        search: query.search.filter(|s| !s.trim().is_empty()),
        page: Page::new(query.limit, query.skip),
    };
    Ok(Json(state.customers.list_customers(&filter).await?))
}

/// GET /api/customers/{id}
/// `id` is the UUID or the customer number.
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, AppError> {
    Ok(Json(find_customer(&state, &id).await?))
}

/// POST /api/customers
pub async fn create_customer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(new): AppJson<NewCustomer>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    new.validate()?;

    let last = state.customers.last_customer_number().await?;
    let customer = Customer::create(new, next_customer_number(last.as_deref()), Some(claims.sub.clone()));
    state.customers.insert_customer(&customer).await?;

    tracing::info!(
        "Created customer {} ({}) by {}",
        customer.customer_number,
        redact_email(customer.email.expose()),
        claims.sub
    );
    Ok((StatusCode::CREATED, Json(customer)))
}

/// PUT /api/customers/{id}
pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(update): AppJson<CustomerUpdate>,
) -> Result<Json<Customer>, AppError> {
    let mut customer = find_customer(&state, &id).await?;
    customer.apply_update(update)?;
    state.customers.update_customer(&customer).await?;
    Ok(Json(customer))
}

/// DELETE /api/customers/{id}
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.customers.delete_customer(&RecordKey::parse(&id)).await? {
        return Err(AppError::NotFoundError(format!("Customer {} not found", id)));
    }
    tracing::info!("Deleted customer {}", id);
    Ok(StatusCode::NO_CONTENT)
}
