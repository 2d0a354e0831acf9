use async_trait::async_trait;
use offerte_core::catalog::{AdditionalService, ServiceCategory};
use offerte_core::repository::{
    CatalogRepository, CustomerFilter, CustomerRepository, InvoiceFilter, InvoiceRepository, OfferFilter,
    OfferRepository, RecordKey, SettingsRepository,
};
use offerte_core::{CompanySettings, CoreError, CoreResult, Customer, Invoice, Offer};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Repositories backed by process memory. Used when no database is
/// configured and in tests. Clones share the same data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Tables>,
}

#[derive(Default)]
struct Tables {
    offers: RwLock<Vec<Offer>>,
    customers: RwLock<Vec<Customer>>,
    invoices: RwLock<Vec<Invoice>>,
    categories: RwLock<Vec<ServiceCategory>>,
    services: RwLock<Vec<AdditionalService>>,
    settings: RwLock<Option<CompanySettings>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Highest zero-padded number; a longer string is always the larger one.
fn highest_number<'a>(numbers: impl Iterator<Item = &'a String>) -> Option<String> {
    numbers
        .max_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
        .cloned()
}

/// Newest first; equal timestamps keep the later insert first.
fn newest_first<T: Clone>(items: &[T], created_at: impl Fn(&T) -> chrono::DateTime<chrono::Utc>) -> Vec<T> {
    let mut sorted: Vec<T> = items.iter().rev().cloned().collect();
    sorted.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    sorted
}

fn offer_matches(offer: &Offer, key: &RecordKey) -> bool {
    match key {
        RecordKey::Id(id) => offer.id == *id,
        RecordKey::Number(number) => offer.offer_number == *number,
    }
}

fn customer_matches(customer: &Customer, key: &RecordKey) -> bool {
    match key {
        RecordKey::Id(id) => customer.id == *id,
        RecordKey::Number(number) => customer.customer_number == *number,
    }
}

fn invoice_matches(invoice: &Invoice, key: &RecordKey) -> bool {
    match key {
        RecordKey::Id(id) => invoice.id == *id,
        RecordKey::Number(number) => invoice.invoice_number == *number,
    }
}

fn category_matches(category: &ServiceCategory, key: &RecordKey) -> bool {
    match key {
        RecordKey::Id(id) => category.id == *id,
        RecordKey::Number(slug) => category.category_id == *slug,
    }
}

fn service_matches(service: &AdditionalService, key: &RecordKey) -> bool {
    match key {
        RecordKey::Id(id) => service.id == *id,
        RecordKey::Number(slug) => service.service_id == *slug,
    }
}

/// Removes the first row matching `pred`.
fn remove_where<T>(rows: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> bool {
    match rows.iter().position(pred) {
        Some(index) => {
            rows.remove(index);
            true
        }
        None => false,
    }
}

#[async_trait]
impl OfferRepository for InMemoryStore {
    async fn insert_offer(&self, offer: &Offer) -> CoreResult<()> {
        let mut offers = self.inner.offers.write().await;
        if offers.iter().any(|o| o.offer_number == offer.offer_number) {
            return Err(CoreError::Conflict(format!(
                "offer number {} already exists",
                offer.offer_number
            )));
        }
        offers.push(offer.clone());
        Ok(())
    }

    async fn get_offer(&self, key: &RecordKey) -> CoreResult<Option<Offer>> {
        let offers = self.inner.offers.read().await;
        Ok(offers.iter().find(|o| offer_matches(o, key)).cloned())
    }

    async fn list_offers(&self, filter: &OfferFilter) -> CoreResult<Vec<Offer>> {
        let offers = self.inner.offers.read().await;
        let matching: Vec<Offer> = offers.iter().filter(|o| filter.matches(o)).cloned().collect();
        Ok(filter.page.apply(newest_first(&matching, |o| o.created_at)))
    }

    async fn update_offer(&self, offer: &Offer) -> CoreResult<()> {
        let mut offers = self.inner.offers.write().await;
        let slot = offers
            .iter_mut()
            .find(|o| o.id == offer.id)
            .ok_or_else(|| CoreError::NotFound(format!("Offer {}", offer.id)))?;
        *slot = offer.clone();
        Ok(())
    }

    async fn delete_offer(&self, key: &RecordKey) -> CoreResult<bool> {
        let mut offers = self.inner.offers.write().await;
        Ok(remove_where(&mut *offers, |o| offer_matches(o, key)))
    }

    async fn last_offer_number(&self) -> CoreResult<Option<String>> {
        let offers = self.inner.offers.read().await;
        Ok(highest_number(offers.iter().map(|o| &o.offer_number)))
    }
}

#[async_trait]
impl CustomerRepository for InMemoryStore {
    async fn insert_customer(&self, customer: &Customer) -> CoreResult<()> {
        let mut customers = self.inner.customers.write().await;
        if customers.iter().any(|c| c.customer_number == customer.customer_number) {
            return Err(CoreError::Conflict(format!(
                "customer number {} already exists",
                customer.customer_number
            )));
        }
        customers.push(customer.clone());
        Ok(())
    }

    async fn get_customer(&self, key: &RecordKey) -> CoreResult<Option<Customer>> {
        let customers = self.inner.customers.read().await;
        Ok(customers.iter().find(|c| customer_matches(c, key)).cloned())
    }

    async fn list_customers(&self, filter: &CustomerFilter) -> CoreResult<Vec<Customer>> {
        let customers = self.inner.customers.read().await;
        let matching: Vec<Customer> = customers.iter().filter(|c| filter.matches(c)).cloned().collect();
        Ok(filter.page.apply(newest_first(&matching, |c| c.created_at)))
    }

    async fn update_customer(&self, customer: &Customer) -> CoreResult<()> {
        let mut customers = self.inner.customers.write().await;
        let slot = customers
            .iter_mut()
            .find(|c| c.id == customer.id)
            .ok_or_else(|| CoreError::NotFound(format!("Customer {}", customer.id)))?;
        *slot = customer.clone();
        Ok(())
    }

    async fn delete_customer(&self, key: &RecordKey) -> CoreResult<bool> {
        let mut customers = self.inner.customers.write().await;
        let Some(customer) = customers.iter().find(|c| customer_matches(c, key)) else {
            return Ok(false);
        };
        let invoices = self.inner.invoices.read().await;
        if invoices.iter().any(|i| i.customer_id == customer.id) {
            return Err(CoreError::Conflict(format!(
                "customer {} still has invoices",
                customer.customer_number
            )));
        }
        Ok(remove_where(&mut *customers, |c| customer_matches(c, key)))
    }

    async fn last_customer_number(&self) -> CoreResult<Option<String>> {
        let customers = self.inner.customers.read().await;
        Ok(highest_number(customers.iter().map(|c| &c.customer_number)))
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryStore {
    async fn insert_invoice(&self, invoice: &Invoice) -> CoreResult<()> {
        let mut invoices = self.inner.invoices.write().await;
        if invoices.iter().any(|i| i.invoice_number == invoice.invoice_number) {
            return Err(CoreError::Conflict(format!(
                "invoice number {} already exists",
                invoice.invoice_number
            )));
        }
        invoices.push(invoice.clone());
        Ok(())
    }

    async fn get_invoice(&self, key: &RecordKey) -> CoreResult<Option<Invoice>> {
        let invoices = self.inner.invoices.read().await;
        Ok(invoices.iter().find(|i| invoice_matches(i, key)).cloned())
    }

    async fn list_invoices(&self, filter: &InvoiceFilter) -> CoreResult<Vec<Invoice>> {
        let invoices = self.inner.invoices.read().await;
        let matching: Vec<Invoice> = invoices.iter().filter(|i| filter.matches(i)).cloned().collect();
        Ok(filter.page.apply(newest_first(&matching, |i| i.created_at)))
    }

    async fn update_invoice(&self, invoice: &Invoice) -> CoreResult<()> {
        let mut invoices = self.inner.invoices.write().await;
        let slot = invoices
            .iter_mut()
            .find(|i| i.id == invoice.id)
            .ok_or_else(|| CoreError::NotFound(format!("Invoice {}", invoice.id)))?;
        *slot = invoice.clone();
        Ok(())
    }

    async fn delete_invoice(&self, key: &RecordKey) -> CoreResult<bool> {
        let mut invoices = self.inner.invoices.write().await;
        Ok(remove_where(&mut *invoices, |i| invoice_matches(i, key)))
    }

    async fn last_invoice_number(&self) -> CoreResult<Option<String>> {
        let invoices = self.inner.invoices.read().await;
        Ok(highest_number(invoices.iter().map(|i| &i.invoice_number)))
    }
}

#[async_trait]
impl CatalogRepository for InMemoryStore {
    async fn list_categories(&self, active_only: bool) -> CoreResult<Vec<ServiceCategory>> {
        let categories = self.inner.categories.read().await;
        let mut list: Vec<ServiceCategory> = categories
            .iter()
            .filter(|c| !active_only || c.active)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.category_id.cmp(&b.category_id));
        Ok(list)
    }

    async fn get_category(&self, key: &RecordKey) -> CoreResult<Option<ServiceCategory>> {
        let categories = self.inner.categories.read().await;
        Ok(categories.iter().find(|c| category_matches(c, key)).cloned())
    }

    async fn insert_category(&self, category: &ServiceCategory) -> CoreResult<()> {
        let mut categories = self.inner.categories.write().await;
        if categories.iter().any(|c| c.category_id == category.category_id) {
            return Err(CoreError::Conflict(format!(
                "Category {} already exists",
                category.category_id
            )));
        }
        categories.push(category.clone());
        Ok(())
    }

    async fn update_category(&self, category: &ServiceCategory) -> CoreResult<()> {
        let mut categories = self.inner.categories.write().await;
        let slot = categories
            .iter_mut()
            .find(|c| c.id == category.id)
            .ok_or_else(|| CoreError::NotFound(format!("Category {}", category.category_id)))?;
        *slot = category.clone();
        Ok(())
    }

    async fn delete_category(&self, key: &RecordKey) -> CoreResult<bool> {
        let mut categories = self.inner.categories.write().await;
        Ok(remove_where(&mut *categories, |c| category_matches(c, key)))
    }

    async fn list_services(
        &self,
        category_id: Option<&str>,
        active_only: bool,
    ) -> CoreResult<Vec<AdditionalService>> {
        let services = self.inner.services.read().await;
        let mut list: Vec<AdditionalService> = services
            .iter()
            .filter(|s| category_id.map_or(true, |c| s.category_id == c))
            .filter(|s| !active_only || s.active)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.service_id.cmp(&b.service_id)));
        Ok(list)
    }

    async fn get_service(&self, key: &RecordKey) -> CoreResult<Option<AdditionalService>> {
        let services = self.inner.services.read().await;
        Ok(services.iter().find(|s| service_matches(s, key)).cloned())
    }

    async fn insert_service(&self, service: &AdditionalService) -> CoreResult<()> {
        let mut services = self.inner.services.write().await;
        if services.iter().any(|s| s.service_id == service.service_id) {
            return Err(CoreError::Conflict(format!(
                "Service {} already exists",
                service.service_id
            )));
        }
        services.push(service.clone());
        Ok(())
    }

    async fn update_service(&self, service: &AdditionalService) -> CoreResult<()> {
        let mut services = self.inner.services.write().await;
        let slot = services
            .iter_mut()
            .find(|s| s.id == service.id)
            .ok_or_else(|| CoreError::NotFound(format!("Service {}", service.service_id)))?;
        *slot = service.clone();
        Ok(())
    }

    async fn delete_service(&self, key: &RecordKey) -> CoreResult<bool> {
        let mut services = self.inner.services.write().await;
        Ok(remove_where(&mut *services, |s| service_matches(s, key)))
    }
}

#[async_trait]
impl SettingsRepository for InMemoryStore {
    async fn load_settings(&self) -> CoreResult<Option<CompanySettings>> {
        Ok(self.inner.settings.read().await.clone())
    }

    async fn save_settings(&self, settings: &CompanySettings) -> CoreResult<()> {
        *self.inner.settings.write().await = Some(settings.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offerte_core::catalog::{NewAdditionalService, NewServiceCategory};
    use offerte_core::repository::Page;
    use offerte_core::{InvoiceStatus, NewCustomer, NewInvoice, NewOffer, OfferStatus};
    use serde_json::json;

    fn offer(number: &str, category: &str) -> Offer {
        let new: NewOffer = serde_json::from_value(json!({
            "category": category,
            "customer": {
                "salutation": "Herr",
                "firstName": "Hans",
                "lastName": "Meier",
                "email": "hans@example.ch",
                "phone": "031 000 00 00"
            },
            "currentLocation": {"street": "A 1", "zipCode": "3000", "city": "Bern"},
            "newLocation": {"street": "B 2", "zipCode": "8000", "city": "Zürich"},
            "movingPrice": "1'000.00"
        }))
        .unwrap();
        Offer::create(new, number.into(), None)
    }

    fn customer(number: &str, last_name: &str) -> Customer {
        let new: NewCustomer = serde_json::from_value(json!({
            "salutation": "Frau",
            "firstName": "Eva",
            "lastName": last_name,
            "email": "eva@example.ch",
            "phone": "079 000 00 00",
            "address": {"street": "C 3", "zipCode": "3600", "city": "Thun"}
        }))
        .unwrap();
        Customer::create(new, number.into(), None)
    }

    fn invoice(number: &str, customer: &Customer) -> Invoice {
        let new: NewInvoice = serde_json::from_value(json!({
            "customerId": customer.id,
            "invoiceDate": "2026-11-03",
            "dueDate": "2026-12-03",
            "items": [{"description": "Umzug", "unitPrice": 1200}]
        }))
        .unwrap();
        Invoice::create(new, number.into(), None)
    }

    fn service(slug: &str, category: &str, order: i32) -> AdditionalService {
        let new: NewAdditionalService = serde_json::from_value(json!({
            "serviceId": slug,
            "categoryId": category,
            "name": slug,
            "price": 100,
            "order": order
        }))
        .unwrap();
        AdditionalService::create(new)
    }

    #[tokio::test]
    async fn offers_by_id_and_number() {
        let store = InMemoryStore::new();
        let first = offer("10001", "umzug");
        store.insert_offer(&first).await.unwrap();

        let by_number = store.get_offer(&RecordKey::Number("10001".into())).await.unwrap().unwrap();
        assert_eq!(by_number.id, first.id);
        assert!(store.get_offer(&RecordKey::Id(first.id)).await.unwrap().is_some());

        let duplicate = offer("10001", "umzug");
        assert!(matches!(store.insert_offer(&duplicate).await, Err(CoreError::Conflict(_))));

        assert!(store.delete_offer(&RecordKey::Id(first.id)).await.unwrap());
        assert!(!store.delete_offer(&RecordKey::Id(first.id)).await.unwrap());
    }

    #[tokio::test]
    async fn offer_listing_filters_and_pages() {
        let store = InMemoryStore::new();
        for (number, category) in [("10001", "umzug"), ("10002", "reinigung"), ("10003", "umzug")] {
            store.insert_offer(&offer(number, category)).await.unwrap();
        }
        let mut sent = store.get_offer(&RecordKey::Number("10003".into())).await.unwrap().unwrap();
        sent.mark_sent();
        store.update_offer(&sent).await.unwrap();

        let all = store.list_offers(&OfferFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].offer_number, "10003");

        let filter = OfferFilter { category: Some("umzug".into()), ..Default::default() };
        assert_eq!(store.list_offers(&filter).await.unwrap().len(), 2);

        let filter = OfferFilter { status: Some(OfferStatus::Sent), ..Default::default() };
        let found = store.list_offers(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].email_sent);

        let filter = OfferFilter { page: Page::new(Some(1), Some(1)), ..Default::default() };
        assert_eq!(store.list_offers(&filter).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn last_number_compares_numerically() {
        let store = InMemoryStore::new();
        assert_eq!(store.last_offer_number().await.unwrap(), None);

        store.insert_offer(&offer("99999", "umzug")).await.unwrap();
        store.insert_offer(&offer("100000", "umzug")).await.unwrap();
        assert_eq!(store.last_offer_number().await.unwrap().as_deref(), Some("100000"));
    }

    #[tokio::test]
    async fn update_of_missing_record_is_not_found() {
        let store = InMemoryStore::new();
        let ghost = offer("10001", "umzug");
        assert!(matches!(store.update_offer(&ghost).await, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn customer_search_and_active_filter() {
        let store = InMemoryStore::new();
        store.insert_customer(&customer("10001", "Muster")).await.unwrap();
        let mut inactive = customer("10002", "Beispiel");
        inactive.active = false;
        store.insert_customer(&inactive).await.unwrap();

        let filter = CustomerFilter { active_only: true, ..Default::default() };
        assert_eq!(store.list_customers(&filter).await.unwrap().len(), 1);

        let filter = CustomerFilter { search: Some("beisp".into()), ..Default::default() };
        let found = store.list_customers(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].customer_number, "10002");

        assert_eq!(store.last_customer_number().await.unwrap().as_deref(), Some("10002"));
    }

    #[tokio::test]
    async fn invoices_filter_by_customer_and_status() {
        let store = InMemoryStore::new();
        let anna = customer("10001", "Muster");
        let eva = customer("10002", "Beispiel");
        store.insert_invoice(&invoice("100001", &anna)).await.unwrap();
        store.insert_invoice(&invoice("100002", &eva)).await.unwrap();
        assert!(matches!(
            store.insert_invoice(&invoice("100002", &anna)).await,
            Err(CoreError::Conflict(_))
        ));

        let mut paid = store.get_invoice(&RecordKey::Number("100002".into())).await.unwrap().unwrap();
        paid.status = InvoiceStatus::Paid;
        store.update_invoice(&paid).await.unwrap();

        let filter = InvoiceFilter { customer_id: Some(anna.id), ..Default::default() };
        let found = store.list_invoices(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].invoice_number, "100001");

        let filter = InvoiceFilter { status: Some(InvoiceStatus::Paid), ..Default::default() };
        assert_eq!(store.list_invoices(&filter).await.unwrap()[0].customer_id, eva.id);

        assert_eq!(store.last_invoice_number().await.unwrap().as_deref(), Some("100002"));
        assert!(store.delete_invoice(&RecordKey::Id(paid.id)).await.unwrap());
    }

    #[tokio::test]
    async fn invoiced_customers_cannot_be_deleted() {
        let store = InMemoryStore::new();
        let anna = customer("10001", "Muster");
        store.insert_customer(&anna).await.unwrap();
        let bill = invoice("100001", &anna);
        store.insert_invoice(&bill).await.unwrap();

        let key = RecordKey::Number("10001".into());
        assert!(matches!(store.delete_customer(&key).await, Err(CoreError::Conflict(_))));

        store.delete_invoice(&RecordKey::Id(bill.id)).await.unwrap();
        assert!(store.delete_customer(&key).await.unwrap());
        assert!(!store.delete_customer(&key).await.unwrap());
    }

    #[tokio::test]
    async fn catalog_slugs_are_unique_and_services_sorted() {
        let store = InMemoryStore::new();
        let new: NewServiceCategory =
            serde_json::from_value(json!({"categoryId": "umzug", "name": "Umzug"})).unwrap();
        store.insert_category(&ServiceCategory::create(new.clone())).await.unwrap();
        assert!(matches!(
            store.insert_category(&ServiceCategory::create(new)).await,
            Err(CoreError::Conflict(_))
        ));

        store.insert_service(&service("piano", "umzug", 2)).await.unwrap();
        store.insert_service(&service("cleaning", "umzug", 1)).await.unwrap();
        store.insert_service(&service("windows", "reinigung", 0)).await.unwrap();

        let listed = store.list_services(Some("umzug"), true).await.unwrap();
        let slugs: Vec<&str> = listed.iter().map(|s| s.service_id.as_str()).collect();
        assert_eq!(slugs, vec!["cleaning", "piano"]);
        assert_eq!(store.list_services(None, false).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn settings_seed_once() {
        let store = InMemoryStore::new();
        assert!(store.load_settings().await.unwrap().is_none());

        let mut settings = store.settings_or_seed().await.unwrap();
        assert_eq!(settings.company_name, "Gelbe-Umzüge");

        settings.company_name = "Gelbe Umzüge AG".into();
        store.save_settings(&settings).await.unwrap();
        assert_eq!(store.settings_or_seed().await.unwrap().company_name, "Gelbe Umzüge AG");
    }
}
