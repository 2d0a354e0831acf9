use axum::{
    body::Bytes,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use offerte_core::document::QuoteDocument;
use offerte_core::numbering::next_offer_number;
use offerte_core::repository::{OfferFilter, Page, RecordKey};
use offerte_core::{NewOffer, Offer, OfferStatus, OfferUpdate};
use offerte_pricing::money::{lenient_amount, lenient_amount_opt};
use offerte_shared::pii::redact_email;
use offerte_pricing::{Decimal, Discount, DiscountType, PricingBreakdown, PricingEngine};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppJson};
use crate::middleware::{auth_middleware, Claims};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct OfferQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRequest {
    #[serde(default, deserialize_with = "lenient_amount")]
    pub discount: Decimal,
    #[serde(default)]
    pub discount_type: DiscountType,
}

/// Toggle or re-price one add-on line of an offer.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLineChange {
    pub selected: Option<bool>,
    #[serde(default, deserialize_with = "lenient_amount_opt")]
    pub price: Option<Decimal>,
}

/// The moving price as typed into the form, e.g. `"1'500.00"`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovingPriceChange {
    pub moving_price: String,
}

/// An offer plus its Swiss-formatted total.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferResponse {
    #[serde(flatten)]
    pub offer: Offer,
    pub total_display: String,
}

impl From<Offer> for OfferResponse {
    fn from(offer: Offer) -> Self {
        Self {
            total_display: offer.total_display(),
            offer,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextNumberResponse {
    pub next_number: String,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/offers/next-number", get(next_number))
        .route("/offers", get(list_offers).post(create_offer))
        .route("/offers/{id}", get(get_offer).put(update_offer).delete(delete_offer))
        .route("/offers/{id}/moving-price", patch(set_moving_price))
        .route("/offers/{id}/services/{service_id}", patch(change_service_line))
        .route("/offers/{id}/calculate", post(calculate_offer))
        .route("/offers/{id}/send", post(send_offer))
        .route("/offers/{id}/document", get(offer_document))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

async fn find_offer(state: &AppState, id: &str) -> Result<Offer, AppError> {
    state
        .offers
        .get_offer(&RecordKey::parse(id))
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Offer {} not found", id)))
}

async fn ensure_customer_exists(state: &AppState, customer_id: Option<Uuid>) -> Result<(), AppError> {
    let Some(id) = customer_id else {
        return Ok(());
    };
    if state.customers.get_customer(&RecordKey::Id(id)).await?.is_none() {
        return Err(AppError::ValidationError(format!("Unknown customer: {}", id)));
    }
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/offers/next-number
pub async fn next_number(State(state): State<AppState>) -> Result<Json<NextNumberResponse>, AppError> {
    let last = state.offers.last_offer_number().await?;
    Ok(Json(NextNumberResponse {
        next_number: next_offer_number(last.as_deref()),
    }))
}

/// GET /api/offers
/// Newest first.
pub async fn list_offers(
    State(state): State<AppState>,
    Query(query): Query<OfferQuery>,
) -> Result<Json<Vec<OfferResponse>>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<OfferStatus>)
        .transpose()?;

    let filter = OfferFilter {
        status,
        category: query.category,
        page: Page::new(query.limit, query.skip),
    };

    let offers = state.offers.list_offers(&filter).await?;
    Ok(Json(offers.into_iter().map(OfferResponse::from).collect()))
}

/// GET /api/offers/{id}
/// `id` is the UUID or the offer number.
pub async fn get_offer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OfferResponse>, AppError> {
    Ok(Json(find_offer(&state, &id).await?.into()))
}

/// POST /api/offers
/// Draws the next offer number unless the form carries one.
pub async fn create_offer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(new): AppJson<NewOffer>,
) -> Result<(StatusCode, Json<OfferResponse>), AppError> {
    new.validate()?;
    ensure_customer_exists(&state, new.customer_id).await?;

    let number = match new.offer_number.as_deref().map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => {
            let last = state.offers.last_offer_number().await?;
            next_offer_number(last.as_deref())
        }
    };

    let offer = Offer::create(new, number, Some(claims.sub.clone()));
    state.offers.insert_offer(&offer).await?;

    tracing::info!(
        "Created offer {} for {} (total {}) by {}",
        offer.offer_number,
        redact_email(offer.customer.email.expose()),
        offer.total_display(),
        claims.sub
    );
    Ok((StatusCode::CREATED, Json(offer.into())))
}

/// PUT /api/offers/{id}
pub async fn update_offer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(update): AppJson<OfferUpdate>,
) -> Result<Json<OfferResponse>, AppError> {
    ensure_customer_exists(&state, update.customer_id).await?;

    let mut offer = find_offer(&state, &id).await?;
    offer.apply_update(update)?;
    state.offers.update_offer(&offer).await?;
    Ok(Json(offer.into()))
}

/// DELETE /api/offers/{id}
pub async fn delete_offer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.offers.delete_offer(&RecordKey::parse(&id)).await? {
        return Err(AppError::NotFoundError(format!("Offer {} not found", id)));
    }
    tracing::info!("Deleted offer {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/offers/{id}/moving-price
/// Unparseable text sets the moving price to zero.
pub async fn set_moving_price(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(change): AppJson<MovingPriceChange>,
) -> Result<Json<OfferResponse>, AppError> {
    let mut offer = find_offer(&state, &id).await?;
    offer.set_moving_price_text(&change.moving_price);
    state.offers.update_offer(&offer).await?;
    Ok(Json(offer.into()))
}

/// PATCH /api/offers/{id}/services/{service_id}
pub async fn change_service_line(
    State(state): State<AppState>,
    Path((id, service_id)): Path<(String, String)>,
    AppJson(change): AppJson<ServiceLineChange>,
) -> Result<Json<OfferResponse>, AppError> {
    let mut offer = find_offer(&state, &id).await?;
    let missing = || AppError::NotFoundError(format!("Offer {} has no service {}", id, service_id));

    if let Some(price) = change.price {
        if !offer.set_service_price(&service_id, price) {
            return Err(missing());
        }
    }
    if let Some(selected) = change.selected {
        if !offer.select_service(&service_id, selected) {
            return Err(missing());
        }
    }
    if !offer.additional_services.iter().any(|line| line.service_id == service_id) {
        return Err(missing());
    }

    state.offers.update_offer(&offer).await?;
    Ok(Json(offer.into()))
}

/// POST /api/offers/{id}/calculate
/// Discount and tax breakdown, stored on the offer.
pub async fn calculate_offer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<PricingBreakdown>, AppError> {
    // An empty body means no discount
    let req: CalculateRequest = if body.is_empty() {
        CalculateRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::ValidationError(e.to_string()))?
    };
    if req.discount < Decimal::ZERO {
        return Err(AppError::ValidationError("discount must not be negative".into()));
    }
    if req.discount_type == DiscountType::Percentage && req.discount > Decimal::ONE_HUNDRED {
        return Err(AppError::ValidationError("percentage discount must not exceed 100".into()));
    }

    let mut offer = find_offer(&state, &id).await?;
    let settings = state.settings.settings_or_seed().await?;

    let discount = match req.discount_type {
        DiscountType::Percentage => Discount::percentage(req.discount),
        DiscountType::Fixed => Discount::fixed(req.discount),
    };
    let breakdown = PricingEngine::new(settings.tax.policy()).breakdown(
        offer.moving_price,
        &offer.additional_services,
        discount,
    );

    offer.apply_pricing(breakdown.clone());
    state.offers.update_offer(&offer).await?;

    tracing::debug!("Offer {} priced at {}", offer.offer_number, breakdown.grand_total);
    Ok(Json(breakdown))
}

/// POST /api/offers/{id}/send
/// Marks the offer as sent. Delivery is only logged; no mail leaves the
/// service.
pub async fn send_offer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<OfferResponse>, AppError> {
    let mut offer = find_offer(&state, &id).await?;
    let settings = state.settings.settings_or_seed().await?;

    tracing::info!(
        "Sending offer {} to {} via {}:{} (requested by {})",
        offer.offer_number,
        redact_email(offer.customer.email.expose()),
        settings.email.smtp_host,
        settings.email.smtp_port,
        claims.sub
    );

    offer.mark_sent();
    state.offers.update_offer(&offer).await?;
    Ok(Json(offer.into()))
}

/// GET /api/offers/{id}/document
pub async fn offer_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QuoteDocument>, AppError> {
    let offer = find_offer(&state, &id).await?;
    let settings = state.settings.settings_or_seed().await?;
    let category = state
        .catalog
        .get_category(&RecordKey::Number(offer.category.clone()))
        .await?;

    Ok(Json(QuoteDocument::build(&offer, &settings, category.as_ref())))
}
