use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use offerte_core::catalog::{AdditionalServiceUpdate, NewAdditionalService};
use offerte_core::repository::RecordKey;
use offerte_core::AdditionalService;
use serde::Deserialize;

use crate::error::{AppError, AppJson};
use crate::middleware::admin_middleware;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ServiceQuery {
    pub category_id: Option<String>,
    #[serde(default = "default_active_only")]
    pub active_only: bool,
}

fn default_active_only() -> bool {
    true
}

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/services", get(list_services))
        .route("/services/{id}", get(get_service));

    let admin = Router::new()
        .route("/services", post(create_service))
        .route("/services/{id}", put(update_service).delete(delete_service))
        .route_layer(middleware::from_fn_with_state(state, admin_middleware));

    public.merge(admin)
}

async fn find_service(state: &AppState, id: &str) -> Result<AdditionalService, AppError> {
    state
        .catalog
        .get_service(&RecordKey::parse(id))
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Service {} not found", id)))
}

/// GET /api/services
/// Sorted by display order.
pub async fn list_services(
    State(state): State<AppState>,
    Query(query): Query<ServiceQuery>,
) -> Result<Json<Vec<AdditionalService>>, AppError> {
    let services = state
        .catalog
        .list_services(query.category_id.as_deref(), query.active_only)
        .await?;
    Ok(Json(services))
}

/// GET /api/services/{id}
pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AdditionalService>, AppError> {
    Ok(Json(find_service(&state, &id).await?))
}

/// POST /api/services
pub async fn create_service(
    State(state): State<AppState>,
    AppJson(new): AppJson<NewAdditionalService>,
) -> Result<(StatusCode, Json<AdditionalService>), AppError> {
    new.validate()?;
    if state
        .catalog
        .get_category(&RecordKey::Number(new.category_id.clone()))
        .await?
        .is_none()
    {
        return Err(AppError::ValidationError(format!(
            "Unknown category: {}",
            new.category_id
        )));
    }

    let service = AdditionalService::create(new);
    state.catalog.insert_service(&service).await?;

    tracing::info!("Created service {} in {}", service.service_id, service.category_id);
    Ok((StatusCode::CREATED, Json(service)))
}

/// PUT /api/services/{id}
pub async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(update): AppJson<AdditionalServiceUpdate>,
) -> Result<Json<AdditionalService>, AppError> {
    let mut service = find_service(&state, &id).await?;
    service.apply_update(update)?;
    state.catalog.update_service(&service).await?;
    Ok(Json(service))
}

/// DELETE /api/services/{id}
pub async fn delete_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.catalog.delete_service(&RecordKey::parse(&id)).await? {
        return Err(AppError::NotFoundError(format!("Service {} not found", id)));
    }
    tracing::info!("Deleted service {}", id);
    Ok(StatusCode::NO_CONTENT)
}
