use chrono::{DateTime, Utc};
use offerte_pricing::calculator::total_for_amount;
use offerte_pricing::money::{format_swiss, lenient_amount_opt, lenient_non_negative, parse_swiss_or_zero};
use offerte_pricing::{AddOnLine, OfferTotal, PricingBreakdown};
use offerte_shared::Masked;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::customer::validate_email;
use crate::{require, CoreError, CoreResult};

/// Offer status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    #[default]
    Draft,
    Sent,
    Accepted,
    Rejected,
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OfferStatus::Draft => "draft",
            OfferStatus::Sent => "sent",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Rejected => "rejected",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for OfferStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(OfferStatus::Draft),
            "sent" => Ok(OfferStatus::Sent),
            "accepted" => Ok(OfferStatus::Accepted),
            "rejected" => Ok(OfferStatus::Rejected),
            other => Err(CoreError::ValidationError(format!("unknown offer status: {}", other))),
        }
    }
}

/// Who the quote is addressed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetails {
    pub salutation: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Masked<String>,
    pub phone: String,
}

/// Pick-up or drop-off address of the move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub street: String,
    pub zip_code: String,
    pub city: String,
    #[serde(default)]
    pub floor: i32,
    #[serde(default)]
    pub has_elevator: bool,
    #[serde(default)]
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceDetails {
    pub moving_date: Option<String>,
    pub start_time: Option<String>,
    pub cleaning_date: Option<String>,
    pub cleaning_start_time: Option<String>,
    pub object: Option<String>,
    pub workers: u32,
    pub trucks: u32,
    pub boxes: u32,
    pub assembly: bool,
}

impl Default for ServiceDetails {
    fn default() -> Self {
        Self {
            moving_date: None,
            start_time: None,
            cleaning_date: None,
            cleaning_start_time: None,
            object: None,
            workers: 2,
            trucks: 1,
            boxes: 0,
            assembly: false,
        }
    }
}

/// A price quotation for a moving job.
///
/// `total` is always `moving_price` plus the selected add-on prices; every
/// setter that touches either input re-derives it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: Uuid,
    pub offer_number: String,
    pub customer_id: Option<Uuid>,
    pub status: OfferStatus,
    pub category: String,
    pub language: String,
    pub customer: ContactDetails,
    pub current_location: Location,
    pub new_location: Location,
    pub service_details: ServiceDetails,
    pub moving_price: Decimal,
    pub additional_services: Vec<AddOnLine>,
    pub total: Decimal,
    pub pricing: Option<PricingBreakdown>,
    pub notes: Option<String>,
    pub contact_person: Option<String>,
    pub email_sent: bool,
    pub email_sent_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_language() -> String {
    "de".to_string()
}

/// Submitted offer form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOffer {
    #[serde(default)]
    pub offer_number: Option<String>,
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    pub category: String,
    #[serde(default = "default_language")]
    pub language: String,
    pub customer: ContactDetails,
    pub current_location: Location,
    pub new_location: Location,
    #[serde(default)]
    pub service_details: ServiceDetails,
    /// Accepts `"1'500.00"`, `1500` or garbage (zero).
    #[serde(default, deserialize_with = "lenient_non_negative")]
    pub moving_price: Decimal,
    #[serde(default)]
    pub additional_services: Vec<AddOnLine>,
    pub notes: Option<String>,
    pub contact_person: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferUpdate {
    pub status: Option<OfferStatus>,
    pub customer_id: Option<Uuid>,
    pub customer: Option<ContactDetails>,
    pub current_location: Option<Location>,
    pub new_location: Option<Location>,
    pub service_details: Option<ServiceDetails>,
    #[serde(default, deserialize_with = "lenient_amount_opt")]
    pub moving_price: Option<Decimal>,
    pub additional_services: Option<Vec<AddOnLine>>,
    pub notes: Option<String>,
    pub contact_person: Option<String>,
}

fn validate_contact(contact: &ContactDetails) -> CoreResult<()> {
    require(&contact.first_name, "customer.firstName")?;
    require(&contact.last_name, "customer.lastName")?;
    validate_email(contact.email.expose())
}

impl NewOffer {
    pub fn validate(&self) -> CoreResult<()> {
        require(&self.category, "category")?;
        validate_contact(&self.customer)?;
        require(&self.current_location.city, "currentLocation.city")?;
        require(&self.new_location.city, "newLocation.city")
    }
}

impl Offer {
    /// Build a draft offer from a submitted form.
    pub fn create(new: NewOffer, offer_number: String, created_by: Option<String>) -> Self {
        let now = Utc::now();
        let mut offer = Self {
            id: Uuid::new_v4(),
            offer_number,
            customer_id: new.customer_id,
            status: OfferStatus::Draft,
            category: new.category,
            language: new.language,
            customer: new.customer,
            current_location: new.current_location,
            new_location: new.new_location,
            service_details: new.service_details,
            moving_price: Decimal::ZERO,
            additional_services: new.additional_services,
            total: Decimal::ZERO,
            pricing: None,
            notes: new.notes,
            contact_person: new.contact_person,
            email_sent: false,
            email_sent_at: None,
            created_by,
            created_at: now,
            updated_at: now,
        };
        offer.set_moving_price(new.moving_price);
        offer
    }

    pub fn calculation(&self) -> OfferTotal {
        total_for_amount(self.moving_price, &self.additional_services)
    }

    fn recompute_total(&mut self) {
        let calc = self.calculation();
        self.moving_price = calc.moving_price;
        self.total = calc.total;
        self.updated_at = Utc::now();
    }

    /// Swiss display form of the total, e.g. `2'400.00`.
    pub fn total_display(&self) -> String {
        format_swiss(self.total)
    }

    pub fn set_moving_price(&mut self, amount: Decimal) {
        self.moving_price = amount;
        self.recompute_total();
    }

    /// Same as the form field: `"1'500.00"`; unparseable text is zero.
    pub fn set_moving_price_text(&mut self, text: &str) {
        self.set_moving_price(parse_swiss_or_zero(text));
    }

    pub fn set_additional_services(&mut self, lines: Vec<AddOnLine>) {
        self.additional_services = lines;
        self.recompute_total();
    }

    /// Returns false when the offer has no line for `service_id`.
    pub fn select_service(&mut self, service_id: &str, selected: bool) -> bool {
        let Some(line) = self.additional_services.iter_mut().find(|l| l.service_id == service_id) else {
            return false;
        };
        line.selected = selected;
        self.recompute_total();
        true
    }

    pub fn set_service_price(&mut self, service_id: &str, price: Decimal) -> bool {
        let Some(line) = self.additional_services.iter_mut().find(|l| l.service_id == service_id) else {
            return false;
        };
        line.price = price;
        self.recompute_total();
        true
    }

    pub fn selected_services(&self) -> impl Iterator<Item = &AddOnLine> {
        self.additional_services.iter().filter(|l| l.selected)
    }

    pub fn apply_update(&mut self, update: OfferUpdate) -> CoreResult<()> {
        if let Some(contact) = &update.customer {
            validate_contact(contact)?;
        }

        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(customer_id) = update.customer_id {
            self.customer_id = Some(customer_id);
        }
        if let Some(customer) = update.customer {
            self.customer = customer;
        }
        if let Some(location) = update.current_location {
            self.current_location = location;
        }
        if let Some(location) = update.new_location {
            self.new_location = location;
        }
        if let Some(details) = update.service_details {
            self.service_details = details;
        }
        if let Some(notes) = update.notes {
            self.notes = Some(notes);
        }
        if let Some(person) = update.contact_person {
            self.contact_person = Some(person);
        }
        if let Some(lines) = update.additional_services {
            self.additional_services = lines;
        }
        if let Some(price) = update.moving_price {
            self.moving_price = price;
        }

        self.recompute_total();
        Ok(())
    }

    pub fn apply_pricing(&mut self, breakdown: PricingBreakdown) {
        self.pricing = Some(breakdown);
        self.updated_at = Utc::now();
    }

    pub fn mark_sent(&mut self) {
        let now = Utc::now();
        self.email_sent = true;
        self.email_sent_at = Some(now);
        self.status = OfferStatus::Sent;
        self.updated_at = now;
    }
}
