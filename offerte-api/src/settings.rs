use axum::{
    extract::{Extension, State},
    middleware,
    routing::{get, put},
    Json, Router,
};
use offerte_core::settings::{CompanyUpdate, EmailSettings, PublicCompanySettings, TaxSettings, Theme};

use crate::error::{AppError, AppJson};
use crate::middleware::{admin_middleware, Claims};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/settings/company", get(get_company));

    let admin = Router::new()
        .route("/settings/company", put(update_company))
        .route("/settings/theme", put(update_theme))
        .route("/settings/tax", put(update_tax))
        .route("/settings/email", put(update_email))
        .route_layer(middleware::from_fn_with_state(state, admin_middleware));

    public.merge(admin)
}

/// GET /api/settings/company
/// Public view; SMTP credentials are never included.
pub async fn get_company(State(state): State<AppState>) -> Result<Json<PublicCompanySettings>, AppError> {
    let settings = state.settings.settings_or_seed().await?;
    Ok(Json(settings.public_view()))
}

/// PUT /api/settings/company
pub async fn update_company(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(update): AppJson<CompanyUpdate>,
) -> Result<Json<PublicCompanySettings>, AppError> {
    let mut settings = state.settings.settings_or_seed().await?;
    settings.apply_company_update(update)?;
    state.settings.save_settings(&settings).await?;

    tracing::info!("Company settings updated by {}", claims.sub);
    Ok(Json(settings.public_view()))
}

/// PUT /api/settings/theme
pub async fn update_theme(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(theme): AppJson<Theme>,
) -> Result<Json<PublicCompanySettings>, AppError> {
    let mut settings = state.settings.settings_or_seed().await?;
    settings.set_theme(theme)?;
    state.settings.save_settings(&settings).await?;

    tracing::info!("Theme updated by {}", claims.sub);
    Ok(Json(settings.public_view()))
}

/// PUT /api/settings/tax
pub async fn update_tax(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(tax): AppJson<TaxSettings>,
) -> Result<Json<PublicCompanySettings>, AppError> {
    let mut settings = state.settings.settings_or_seed().await?;
    settings.set_tax(tax)?;
    state.settings.save_settings(&settings).await?;

    tracing::info!(
        "Tax settings updated by {}: enabled={} rate={}",
        claims.sub,
        settings.tax.enabled,
        settings.tax.rate
    );
    Ok(Json(settings.public_view()))
}

/// PUT /api/settings/email
pub async fn update_email(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(email): AppJson<EmailSettings>,
) -> Result<Json<PublicCompanySettings>, AppError> {
    let mut settings = state.settings.settings_or_seed().await?;
    settings.set_email(email)?;
    state.settings.save_settings(&settings).await?;

    tracing::info!(
        "Email settings updated by {}: host={} password={}",
        claims.sub,
        settings.email.smtp_host,
        settings.email.smtp_password
    );
    Ok(Json(settings.public_view()))
}
