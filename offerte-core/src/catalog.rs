use chrono::{DateTime, Utc};
use offerte_pricing::money::{lenient_amount, lenient_amount_opt};
use offerte_pricing::AddOnLine;
use offerte_shared::LocalizedText;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{validate_slug, CoreError, CoreResult};

/// How a service category is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingModel {
    #[default]
    Custom,
    Hourly,
    Fixed,
}

/// How an add-on service is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceType {
    #[default]
    Fixed,
    Hourly,
}

fn default_icon() -> String {
    "package".to_string()
}

fn default_true() -> bool {
    true
}

fn check_non_negative(amount: Decimal, field: &str) -> CoreResult<()> {
    if amount < Decimal::ZERO {
        return Err(CoreError::ValidationError(format!("{} must not be negative", field)));
    }
    Ok(())
}

// ============================================================================
// Service Categories
// ============================================================================

/// A service line such as moving (`umzug`) or cleaning (`reinigung`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCategory {
    pub id: Uuid,
    pub category_id: String,
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub icon: String,
    pub active: bool,
    pub pricing_model: PricingModel,
    pub base_price: Decimal,
    pub hourly_rate: Decimal,
    pub form_fields: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewServiceCategory {
    pub category_id: String,
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub pricing_model: PricingModel,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub base_price: Decimal,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub hourly_rate: Decimal,
    #[serde(default)]
    pub form_fields: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCategoryUpdate {
    pub name: Option<LocalizedText>,
    pub description: Option<LocalizedText>,
    pub icon: Option<String>,
    pub active: Option<bool>,
    pub pricing_model: Option<PricingModel>,
    #[serde(default, deserialize_with = "lenient_amount_opt")]
    pub base_price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_amount_opt")]
    pub hourly_rate: Option<Decimal>,
    pub form_fields: Option<Vec<String>>,
}

impl NewServiceCategory {
    pub fn validate(&self) -> CoreResult<()> {
        validate_slug(&self.category_id, "categoryId")?;
        if self.name.is_empty() {
            return Err(CoreError::ValidationError("name is required".into()));
        }
        check_non_negative(self.base_price, "basePrice")?;
        check_non_negative(self.hourly_rate, "hourlyRate")
    }
}

impl ServiceCategory {
    pub fn create(new: NewServiceCategory) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            category_id: new.category_id,
            name: new.name,
            description: new.description,
            icon: new.icon,
            active: new.active,
            pricing_model: new.pricing_model,
            base_price: new.base_price,
            hourly_rate: new.hourly_rate,
            form_fields: new.form_fields,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_update(&mut self, update: ServiceCategoryUpdate) -> CoreResult<()> {
        if let Some(price) = update.base_price {
            check_non_negative(price, "basePrice")?;
        }
        if let Some(rate) = update.hourly_rate {
            check_non_negative(rate, "hourlyRate")?;
        }

        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(icon) = update.icon {
            self.icon = icon;
        }
        if let Some(active) = update.active {
            self.active = active;
        }
        if let Some(model) = update.pricing_model {
            self.pricing_model = model;
        }
        if let Some(price) = update.base_price {
            self.base_price = price;
        }
        if let Some(rate) = update.hourly_rate {
            self.hourly_rate = rate;
        }
        if let Some(fields) = update.form_fields {
            self.form_fields = fields;
        }

        self.updated_at = Utc::now();
        Ok(())
    }
}

// ============================================================================
// Additional Services
// ============================================================================

/// An optional extra (cleaning, disposal, piano transport) offered within a
/// category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalService {
    pub id: Uuid,
    pub service_id: String,
    pub category_id: String,
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub price: Decimal,
    pub price_type: PriceType,
    pub hourly_rate: Option<Decimal>,
    pub active: bool,
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAdditionalService {
    pub service_id: String,
    pub category_id: String,
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub price: Decimal,
    #[serde(default)]
    pub price_type: PriceType,
    #[serde(default, deserialize_with = "lenient_amount_opt")]
    pub hourly_rate: Option<Decimal>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub order: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalServiceUpdate {
    pub name: Option<LocalizedText>,
    pub description: Option<LocalizedText>,
    #[serde(default, deserialize_with = "lenient_amount_opt")]
    pub price: Option<Decimal>,
    pub price_type: Option<PriceType>,
    #[serde(default, deserialize_with = "lenient_amount_opt")]
    pub hourly_rate: Option<Decimal>,
    pub active: Option<bool>,
    pub order: Option<i32>,
}

impl NewAdditionalService {
    pub fn validate(&self) -> CoreResult<()> {
        validate_slug(&self.service_id, "serviceId")?;
        validate_slug(&self.category_id, "categoryId")?;
        if self.name.is_empty() {
            return Err(CoreError::ValidationError("name is required".into()));
        }
        check_non_negative(self.price, "price")?;
        if self.price_type == PriceType::Hourly && self.hourly_rate.is_none() {
            return Err(CoreError::ValidationError(
                "hourlyRate is required for hourly services".into(),
            ));
        }
        Ok(())
    }
}

impl AdditionalService {
    pub fn create(new: NewAdditionalService) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            service_id: new.service_id,
            category_id: new.category_id,
            name: new.name,
            description: new.description,
            price: new.price,
            price_type: new.price_type,
            hourly_rate: new.hourly_rate,
            active: new.active,
            order: new.order,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_update(&mut self, update: AdditionalServiceUpdate) -> CoreResult<()> {
        if let Some(price) = update.price {
            check_non_negative(price, "price")?;
        }

        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(price_type) = update.price_type {
            self.price_type = price_type;
        }
        if let Some(rate) = update.hourly_rate {
            self.hourly_rate = Some(rate);
        }
        if let Some(active) = update.active {
            self.active = active;
        }
        if let Some(order) = update.order {
            self.order = order;
        }

        self.updated_at = Utc::now();
        Ok(())
    }

    /// Unselected offer line pre-filled with this service's name and price.
    pub fn to_addon_line(&self) -> AddOnLine {
        AddOnLine::new(&self.service_id, self.name.clone(), self.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn category_defaults_from_minimal_payload() {
        let new: NewServiceCategory = serde_json::from_value(json!({
            "categoryId": "umzug",
            "name": {"de": "Umzug", "en": "Moving"}
        }))
        .unwrap();
        new.validate().unwrap();

        let category = ServiceCategory::create(new);
        assert_eq!(category.icon, "package");
        assert!(category.active);
        assert_eq!(category.pricing_model, PricingModel::Custom);
        assert_eq!(category.base_price, Decimal::ZERO);
    }

    #[test]
    fn rejects_bad_slugs() {
        let new: NewServiceCategory = serde_json::from_value(json!({
            "categoryId": "Umzug Bern",
            "name": "Umzug"
        }))
        .unwrap();
        assert!(new.validate().is_err());
    }

    #[test]
    fn hourly_service_needs_rate() {
        let new: NewAdditionalService = serde_json::from_value(json!({
            "serviceId": "packing",
            "categoryId": "umzug",
            "name": "Einpacken",
            "priceType": "hourly"
        }))
        .unwrap();
        assert!(new.validate().is_err());
    }

    #[test]
    fn service_update_and_addon_line() {
        let new: NewAdditionalService = serde_json::from_value(json!({
            "serviceId": "cleaning",
            "categoryId": "umzug",
            "name": {"de": "Reinigung"},
            "price": "900.00"
        }))
        .unwrap();
        new.validate().unwrap();
        let mut service = AdditionalService::create(new);

        let update: AdditionalServiceUpdate = serde_json::from_value(json!({"price": 950, "order": 3})).unwrap();
        service.apply_update(update).unwrap();
        assert_eq!(service.price, Decimal::new(950, 0));
        assert_eq!(service.order, 3);

        let line = service.to_addon_line();
        assert_eq!(line.service_id, "cleaning");
        assert!(!line.selected);
        assert_eq!(line.price, Decimal::new(950, 0));

        let negative = AdditionalServiceUpdate { price: Some(Decimal::new(-1, 0)), ..Default::default() };
        assert!(service.apply_update(negative).is_err());
    }
}
