pub mod offer;
pub mod customer;
pub mod invoice;
pub mod catalog;
pub mod settings;
pub mod repository;
pub mod numbering;
pub mod document;

pub use offer::{Offer, OfferStatus, NewOffer, OfferUpdate};
pub use customer::{Customer, NewCustomer, CustomerUpdate};
pub use invoice::{Invoice, InvoiceStatus, NewInvoice, InvoiceUpdate};
pub use catalog::{AdditionalService, ServiceCategory};
pub use settings::CompanySettings;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Storage error: {0}")]
    StorageError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

pub(crate) fn require(value: &str, field: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::ValidationError(format!("{} is required", field)));
    }
    Ok(())
}

/// Slugs identify categories and add-ons in URLs: `umzug`, `end-cleaning`.
pub(crate) fn validate_slug(value: &str, field: &str) -> CoreResult<()> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if !valid {
        return Err(CoreError::ValidationError(format!(
            "{} must be lowercase letters, digits, '-' or '_'",
            field
        )));
    }
    Ok(())
}
