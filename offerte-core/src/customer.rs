use chrono::{DateTime, Utc};
use offerte_shared::pii::redact_email;
use offerte_shared::Masked;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{require, CoreError, CoreResult};

fn default_country() -> String {
    "CH".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAddress {
    pub street: String,
    pub zip_code: String,
    pub city: String,
    #[serde(default = "default_country")]
    pub country: String,
}

/// A registered customer. Offers may link to one via `customerId`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub customer_number: String,
    pub salutation: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Masked<String>,
    pub phone: String,
    pub address: CustomerAddress,
    pub notes: Option<String>,
    pub active: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub salutation: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Masked<String>,
    pub phone: String,
    pub address: CustomerAddress,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdate {
    pub salutation: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<Masked<String>>,
    pub phone: Option<String>,
    pub address: Option<CustomerAddress>,
    pub notes: Option<String>,
    pub active: Option<bool>,
}

/// Exactly one `@`, something on both sides, and a dot in the domain.
pub fn validate_email(email: &str) -> CoreResult<()> {
    let invalid = || CoreError::ValidationError(format!("Invalid email address: {}", redact_email(email)));
    let (local, domain) = email.trim().split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(invalid());
    }
    Ok(())
}

impl NewCustomer {
    pub fn validate(&self) -> CoreResult<()> {
        require(&self.salutation, "salutation")?;
        require(&self.first_name, "firstName")?;
        require(&self.last_name, "lastName")?;
        require(&self.phone, "phone")?;
        require(&self.address.street, "address.street")?;
        require(&self.address.city, "address.city")?;
        validate_email(self.email.expose())
    }
}

impl Customer {
    pub fn create(new: NewCustomer, customer_number: String, created_by: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            customer_number,
            salutation: new.salutation,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            phone: new.phone,
            address: new.address,
            notes: new.notes,
            active: true,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_update(&mut self, update: CustomerUpdate) -> CoreResult<()> {
        if let Some(email) = &update.email {
            validate_email(email.expose())?;
        }

        if let Some(salutation) = update.salutation {
            self.salutation = salutation;
        }
        if let Some(first_name) = update.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            self.last_name = last_name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(phone) = update.phone {
            self.phone = phone;
        }
        if let Some(address) = update.address {
            self.address = address;
        }
        if let Some(notes) = update.notes {
            self.notes = Some(notes);
        }
        if let Some(active) = update.active {
            self.active = active;
        }

        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Case-insensitive match on name, e-mail or customer number.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.email.expose().as_str(),
            self.customer_number.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_customer() -> NewCustomer {
        serde_json::from_value(serde_json::json!({
            "salutation": "Frau",
            "firstName": "Anna",
            "lastName": "Muster",
            "email": "anna.muster@example.ch",
            "phone": "079 123 45 67",
            "address": {"street": "Bahnhofstrasse 1", "zipCode": "3000", "city": "Bern"}
        }))
        .unwrap()
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("info@gelbe-umzuege.ch").is_ok());
        assert!(validate_email("info@localhost").is_err());
        assert!(validate_email("@example.ch").is_err());
        assert!(validate_email("a@b@example.ch").is_err());
        assert!(validate_email("no-at-sign").is_err());
    }

    #[test]
    fn email_error_does_not_echo_address() {
        let message = validate_email("anna.muster@localhost").unwrap_err().to_string();
        assert!(message.contains("a***@localhost"));
        assert!(!message.contains("anna.muster"));
    }

    #[test]
    fn create_defaults() {
        let new = new_customer();
        new.validate().unwrap();

        let customer = Customer::create(new, "10001".into(), Some("admin".into()));
        assert!(customer.active);
        assert_eq!(customer.address.country, "CH");
        assert_eq!(customer.full_name(), "Anna Muster");
    }

    #[test]
    fn debug_output_hides_email() {
        let customer = Customer::create(new_customer(), "10001".into(), None);
        let debug = format!("{:?}", customer);
        assert!(!debug.contains("anna.muster@example.ch"));
    }

    #[test]
    fn update_rejects_bad_email_and_keeps_record() {
        let mut customer = Customer::create(new_customer(), "10001".into(), None);
        let update = CustomerUpdate {
            email: Some(Masked::from("broken")),
            phone: Some("031 000 00 00".into()),
            ..Default::default()
        };
        assert!(customer.apply_update(update).is_err());
        assert_eq!(customer.phone, "079 123 45 67");

        let update = CustomerUpdate { active: Some(false), ..Default::default() };
        customer.apply_update(update).unwrap();
        assert!(!customer.active);
    }

    #[test]
    fn search_matching() {
        let customer = Customer::create(new_customer(), "10042".into(), None);
        assert!(customer.matches("muster"));
        assert!(customer.matches("10042"));
        assert!(customer.matches("EXAMPLE.CH"));
        assert!(!customer.matches("zürich"));
    }
}
