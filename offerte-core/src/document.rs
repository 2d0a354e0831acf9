use offerte_pricing::breakdown::DEFAULT_CURRENCY;
use offerte_pricing::format_swiss;
use serde::Serialize;

use crate::catalog::ServiceCategory;
use crate::offer::{Location, Offer};
use crate::settings::{Address, CompanySettings};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLine {
    pub label: String,
    pub amount: String,
}

/// Printable quote. All amounts are Swiss-formatted strings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDocument {
    pub company_name: String,
    pub company_address: Option<Address>,
    pub offer_number: String,
    pub date: String,
    pub language: String,
    pub salutation: String,
    pub customer_name: String,
    pub moving_date: Option<String>,
    pub from: Location,
    pub to: Location,
    pub lines: Vec<DocumentLine>,
    pub total: String,
    pub currency: String,
}

impl QuoteDocument {
    /// `category` labels the moving price line; the raw slug is used when
    /// the category is unknown.
    pub fn build(offer: &Offer, settings: &CompanySettings, category: Option<&ServiceCategory>) -> Self {
        let language = offer.language.as_str();
        let base_label = category
            .map(|c| c.name.get(language).to_string())
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| offer.category.clone());

        let mut lines = vec![DocumentLine {
            label: base_label,
            amount: format_swiss(offer.moving_price),
        }];
        lines.extend(offer.selected_services().map(|line| DocumentLine {
            label: line.name.get(language).to_string(),
            amount: format_swiss(line.price),
        }));

        Self {
            company_name: settings.company_name.clone(),
            company_address: settings.head_office().cloned(),
            offer_number: offer.offer_number.clone(),
            date: offer.created_at.format("%d.%m.%Y").to_string(),
            language: offer.language.clone(),
            salutation: offer.customer.salutation.clone(),
            customer_name: format!("{} {}", offer.customer.first_name, offer.customer.last_name),
            moving_date: offer.service_details.moving_date.clone(),
            from: offer.current_location.clone(),
            to: offer.new_location.clone(),
            lines,
            total: offer.total_display(),
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}
