use axum::{routing::post, Json, Router};
use offerte_pricing::calculator::total_for_amount;
use offerte_pricing::money::coerce_amount;
use offerte_pricing::{calculate_total, format_swiss, AddOnLine, OfferTotal};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppJson};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalRequest {
    /// Form text such as `"1'500.00"`, or a plain number.
    #[serde(default)]
    pub moving_price: Value,
    #[serde(default)]
    pub additional_services: Vec<AddOnLine>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalResponse {
    #[serde(flatten)]
    pub totals: OfferTotal,
    pub moving_price_display: String,
    pub total_display: String,
}

impl From<OfferTotal> for TotalResponse {
    fn from(totals: OfferTotal) -> Self {
        Self {
            moving_price_display: format_swiss(totals.moving_price),
            total_display: totals.formatted(),
            totals,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/pricing/total", post(offer_total))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/pricing/total
/// Live total for the offer form. Malformed amounts count as zero.
pub async fn offer_total(AppJson(req): AppJson<TotalRequest>) -> Result<Json<TotalResponse>, AppError> {
    let totals = match &req.moving_price {
        Value::String(text) => calculate_total(text, &req.additional_services),
        other => total_for_amount(coerce_amount(other), &req.additional_services),
    };
    Ok(Json(totals.into()))
}
