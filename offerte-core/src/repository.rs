use async_trait::async_trait;
use uuid::Uuid;

use crate::catalog::{AdditionalService, ServiceCategory};
use crate::customer::Customer;
use crate::invoice::{Invoice, InvoiceStatus};
use crate::offer::{Offer, OfferStatus};
use crate::settings::CompanySettings;
use crate::CoreResult;

pub const DEFAULT_PAGE_LIMIT: i64 = 50;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Limit/skip window for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub skip: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self { limit: DEFAULT_PAGE_LIMIT, skip: 0 }
    }
}

impl Page {
    /// Limit falls back to 50 and is capped at 100; negative skip becomes 0.
    pub fn new(limit: Option<i64>, skip: Option<i64>) -> Self {
        let limit = match limit {
            Some(l) if l > 0 => l.min(MAX_PAGE_LIMIT),
            _ => DEFAULT_PAGE_LIMIT,
        };
        Self { limit, skip: skip.unwrap_or(0).max(0) }
    }

    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.skip as usize)
            .take(self.limit as usize)
            .collect()
    }
}

/// Path segment that is either a record UUID or its human key (offer or
/// customer number, category or service slug).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKey {
    Id(Uuid),
    Number(String),
}

impl RecordKey {
    pub fn parse(raw: &str) -> Self {
        match Uuid::parse_str(raw) {
            Ok(id) => RecordKey::Id(id),
            Err(_) => RecordKey::Number(raw.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OfferFilter {
    pub status: Option<OfferStatus>,
    pub category: Option<String>,
    pub page: Page,
}

impl OfferFilter {
    pub fn matches(&self, offer: &Offer) -> bool {
        self.status.map_or(true, |s| offer.status == s)
            && self.category.as_deref().map_or(true, |c| offer.category == c)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    pub active_only: bool,
    pub search: Option<String>,
    pub page: Page,
}

impl CustomerFilter {
    pub fn matches(&self, customer: &Customer) -> bool {
        (!self.active_only || customer.active)
            && self.search.as_deref().map_or(true, |s| customer.matches(s))
    }
}

#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub customer_id: Option<Uuid>,
    pub page: Page,
}

impl InvoiceFilter {
    pub fn matches(&self, invoice: &Invoice) -> bool {
        self.status.map_or(true, |s| invoice.status == s)
            && self.customer_id.map_or(true, |c| invoice.customer_id == c)
    }
}

/// Offer persistence. Lists are newest first.
#[async_trait]
pub trait OfferRepository: Send + Sync {
    async fn insert_offer(&self, offer: &Offer) -> CoreResult<()>;

    async fn get_offer(&self, key: &RecordKey) -> CoreResult<Option<Offer>>;

    async fn list_offers(&self, filter: &OfferFilter) -> CoreResult<Vec<Offer>>;

    /// Fails with `NotFound` when no offer has `offer.id`.
    async fn update_offer(&self, offer: &Offer) -> CoreResult<()>;

    async fn delete_offer(&self, key: &RecordKey) -> CoreResult<bool>;

    /// Highest offer number issued so far.
    async fn last_offer_number(&self) -> CoreResult<Option<String>>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn insert_customer(&self, customer: &Customer) -> CoreResult<()>;

    async fn get_customer(&self, key: &RecordKey) -> CoreResult<Option<Customer>>;

    async fn list_customers(&self, filter: &CustomerFilter) -> CoreResult<Vec<Customer>>;

    async fn update_customer(&self, customer: &Customer) -> CoreResult<()>;

    /// Fails with `Conflict` while invoices still reference the customer.
    async fn delete_customer(&self, key: &RecordKey) -> CoreResult<bool>;

    async fn last_customer_number(&self) -> CoreResult<Option<String>>;
}

/// Invoice persistence. Lists are newest first; `RecordKey::Number` carries
/// the invoice number.
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn insert_invoice(&self, invoice: &Invoice) -> CoreResult<()>;

    async fn get_invoice(&self, key: &RecordKey) -> CoreResult<Option<Invoice>>;

    async fn list_invoices(&self, filter: &InvoiceFilter) -> CoreResult<Vec<Invoice>>;

    async fn update_invoice(&self, invoice: &Invoice) -> CoreResult<()>;

    async fn delete_invoice(&self, key: &RecordKey) -> CoreResult<bool>;

    async fn last_invoice_number(&self) -> CoreResult<Option<String>>;
}

/// Service categories and their add-on services. `RecordKey::Number`
/// carries the slug.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_categories(&self, active_only: bool) -> CoreResult<Vec<ServiceCategory>>;

    async fn get_category(&self, key: &RecordKey) -> CoreResult<Option<ServiceCategory>>;

    /// Fails with `Conflict` when the slug is taken.
    async fn insert_category(&self, category: &ServiceCategory) -> CoreResult<()>;

    async fn update_category(&self, category: &ServiceCategory) -> CoreResult<()>;

    async fn delete_category(&self, key: &RecordKey) -> CoreResult<bool>;

    /// Sorted by `order`, then slug.
    async fn list_services(
        &self,
        category_id: Option<&str>,
        active_only: bool,
    ) -> CoreResult<Vec<AdditionalService>>;

    async fn get_service(&self, key: &RecordKey) -> CoreResult<Option<AdditionalService>>;

    async fn insert_service(&self, service: &AdditionalService) -> CoreResult<()>;

    async fn update_service(&self, service: &AdditionalService) -> CoreResult<()>;

    async fn delete_service(&self, key: &RecordKey) -> CoreResult<bool>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn load_settings(&self) -> CoreResult<Option<CompanySettings>>;

    async fn save_settings(&self, settings: &CompanySettings) -> CoreResult<()>;

    /// Stored settings, seeding the defaults on first use.
    async fn settings_or_seed(&self) -> CoreResult<CompanySettings> {
        if let Some(settings) = self.load_settings().await? {
            return Ok(settings);
        }
        let seeded = CompanySettings::seeded();
        tracing::info!("Seeding default company settings");
        self.save_settings(&seeded).await?;
        Ok(seeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_clamping() {
        assert_eq!(Page::new(None, None), Page { limit: 50, skip: 0 });
        assert_eq!(Page::new(Some(500), Some(10)), Page { limit: 100, skip: 10 });
        assert_eq!(Page::new(Some(0), Some(-3)), Page { limit: 50, skip: 0 });
        assert_eq!(Page::new(Some(2), Some(1)).apply(1..=5), vec![2, 3]);
    }

    #[test]
    fn record_key_parsing() {
        let id = Uuid::new_v4();
        assert_eq!(RecordKey::parse(&id.to_string()), RecordKey::Id(id));
        assert_eq!(RecordKey::parse("10001"), RecordKey::Number("10001".into()));
    }
}
