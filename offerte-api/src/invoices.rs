use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{delete, get},
    Json, Router,
};
use offerte_core::numbering::next_invoice_number;
use offerte_core::repository::{InvoiceFilter, Page, RecordKey};
use offerte_core::{Invoice, InvoiceStatus, InvoiceUpdate, NewInvoice};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppJson};
use crate::middleware::{admin_middleware, auth_middleware, Claims};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InvoiceQuery {
    pub status: Option<String>,
    pub customer_id: Option<String>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextNumberResponse {
    pub next_number: String,
}

/// Any signed-in user manages invoices; only admins delete them.
pub fn routes(state: AppState) -> Router<AppState> {
    let staff = Router::new()
        .route("/invoices/next-number", get(next_number))
        .route("/invoices", get(list_invoices).post(create_invoice))
        .route("/invoices/{id}", get(get_invoice).put(update_invoice))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin = Router::new()
        .route("/invoices/{id}", delete(delete_invoice))
        .route_layer(middleware::from_fn_with_state(state, admin_middleware));

    staff.merge(admin)
}

async fn find_invoice(state: &AppState, id: &str) -> Result<Invoice, AppError> {
    state
        .invoices
        .get_invoice(&RecordKey::parse(id))
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Invoice {} not found", id)))
}

async fn ensure_references_exist(state: &AppState, new: &NewInvoice) -> Result<(), AppError> {
    if state.customers.get_customer(&RecordKey::Id(new.customer_id)).await?.is_none() {
        return Err(AppError::ValidationError(format!("Unknown customer: {}", new.customer_id)));
    }
    if let Some(offer_id) = new.offer_id {
        if state.offers.get_offer(&RecordKey::Id(offer_id)).await?.is_none() {
            return Err(AppError::ValidationError(format!("Unknown offer: {}", offer_id)));
        }
    }
    Ok(())
}

/// GET /api/invoices/next-number
pub async fn next_number(State(state): State<AppState>) -> Result<Json<NextNumberResponse>, AppError> {
    let last = state.invoices.last_invoice_number().await?;
    Ok(Json(NextNumberResponse {
        next_number: next_invoice_number(last.as_deref()),
    }))
}

/// GET /api/invoices
/// Newest first, optionally narrowed to one status or customer.
pub async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<InvoiceQuery>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<InvoiceStatus>)
        .transpose()?;
    let customer_id = query
        .customer_id
        .as_deref()
        .map(Uuid::parse_str)
        .transpose()
        .map_err(|e| AppError::ValidationError(format!("customer_id: {}", e)))?;

    let filter = InvoiceFilter {
        status,
        customer_id,
        page: Page::new(query.limit, query.skip),
    };
    Ok(Json(state.invoices.list_invoices(&filter).await?))
}

/// GET /api/invoices/{id}
/// `id` is the UUID or the invoice number.
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Invoice>, AppError> {
    Ok(Json(find_invoice(&state, &id).await?))
}

/// POST /api/invoices
/// Always draws the next invoice number.
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(new): AppJson<NewInvoice>,
) -> Result<(StatusCode, Json<Invoice>), AppError> {
    new.validate()?;
    ensure_references_exist(&state, &new).await?;

    let last = state.invoices.last_invoice_number().await?;
    let invoice = Invoice::create(new, next_invoice_number(last.as_deref()), Some(claims.sub.clone()));
    state.invoices.insert_invoice(&invoice).await?;

    tracing::info!(
        "Created invoice {} over {} {} by {}",
        invoice.invoice_number,
        invoice.currency,
        invoice.total,
        claims.sub
    );
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// PUT /api/invoices/{id}
pub async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(update): AppJson<InvoiceUpdate>,
) -> Result<Json<Invoice>, AppError> {
    let mut invoice = find_invoice(&state, &id).await?;
    invoice.apply_update(update)?;
    state.invoices.update_invoice(&invoice).await?;
    Ok(Json(invoice))
}

/// DELETE /api/invoices/{id}
pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.invoices.delete_invoice(&RecordKey::parse(&id)).await? {
        return Err(AppError::NotFoundError(format!("Invoice {} not found", id)));
    }
    tracing::info!("Deleted invoice {}", id);
    Ok(StatusCode::NO_CONTENT)
}
