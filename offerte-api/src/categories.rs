use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use offerte_core::catalog::{NewServiceCategory, ServiceCategoryUpdate};
use offerte_core::repository::RecordKey;
use offerte_core::ServiceCategory;
use serde::Deserialize;

use crate::error::{AppError, AppJson};
use crate::middleware::admin_middleware;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    #[serde(default = "default_active_only")]
    pub active_only: bool,
}

fn default_active_only() -> bool {
    true
}

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/{id}", get(get_category));

    let admin = Router::new()
        .route("/categories", post(create_category))
        .route("/categories/{id}", put(update_category).delete(delete_category))
        .route_layer(middleware::from_fn_with_state(state, admin_middleware));

    public.merge(admin)
}

async fn find_category(state: &AppState, id: &str) -> Result<ServiceCategory, AppError> {
    state
        .catalog
        .get_category(&RecordKey::parse(id))
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Category {} not found", id)))
}

/// GET /api/categories
pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<Vec<ServiceCategory>>, AppError> {
    let categories = state.catalog.list_categories(query.active_only).await?;
    Ok(Json(categories))
}

/// GET /api/categories/{id}
/// `id` is the UUID or the slug.
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ServiceCategory>, AppError> {
    Ok(Json(find_category(&state, &id).await?))
}

/// POST /api/categories
pub async fn create_category(
    State(state): State<AppState>,
    AppJson(new): AppJson<NewServiceCategory>,
) -> Result<(StatusCode, Json<ServiceCategory>), AppError> {
    new.validate()?;
    let category = ServiceCategory::create(new);
    state.catalog.insert_category(&category).await?;

    tracing::info!("Created category {}", category.category_id);
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/categories/{id}
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(update): AppJson<ServiceCategoryUpdate>,
) -> Result<Json<ServiceCategory>, AppError> {
    let mut category = find_category(&state, &id).await?;
    category.apply_update(update)?;
    state.catalog.update_category(&category).await?;
    Ok(Json(category))
}

/// DELETE /api/categories/{id}
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.catalog.delete_category(&RecordKey::parse(&id)).await? {
        return Err(AppError::NotFoundError(format!("Category {} not found", id)));
    }
    tracing::info!("Deleted category {}", id);
    Ok(StatusCode::NO_CONTENT)
}
