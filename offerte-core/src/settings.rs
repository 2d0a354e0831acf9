use chrono::{DateTime, Utc};
use offerte_pricing::money::lenient_amount;
use offerte_pricing::TaxPolicy;
use offerte_shared::Masked;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{require, CoreError, CoreResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(rename = "type", default = "default_address_type")]
    pub kind: String,
    pub street: String,
    pub city: String,
    pub zip_code: String,
    #[serde(default = "default_country")]
    pub country: String,
    pub phone: String,
    pub email: String,
    pub website: Option<String>,
}

fn default_address_type() -> String {
    "hauptsitz".to_string()
}

fn default_country() -> String {
    "CH".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_color: "#EAB308".to_string(),
            secondary_color: "#000000".to_string(),
            accent_color: "#FFFFFF".to_string(),
        }
    }
}

impl Theme {
    pub fn validate(&self) -> CoreResult<()> {
        for (field, color) in [
            ("primaryColor", &self.primary_color),
            ("secondaryColor", &self.secondary_color),
            ("accentColor", &self.accent_color),
        ] {
            let hex = color.strip_prefix('#').unwrap_or("");
            if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(CoreError::ValidationError(format!(
                    "{} must be a #RRGGBB color, got {}",
                    field, color
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSettings {
    pub enabled: bool,
    #[serde(deserialize_with = "lenient_amount")]
    pub rate: Decimal,
    pub label: String,
}

impl Default for TaxSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            rate: Decimal::new(77, 1),
            label: "MwSt".to_string(),
        }
    }
}

impl TaxSettings {
    pub fn validate(&self) -> CoreResult<()> {
        if self.rate < Decimal::ZERO || self.rate > Decimal::ONE_HUNDRED {
            return Err(CoreError::ValidationError("tax rate must be between 0 and 100".into()));
        }
        require(&self.label, "label")
    }

    pub fn policy(&self) -> TaxPolicy {
        TaxPolicy {
            enabled: self.enabled,
            rate: self.rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_user: String,
    #[serde(default)]
    pub smtp_password: Masked<String>,
    #[serde(default)]
    pub from_email: String,
    #[serde(default)]
    pub from_name: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            smtp_user: String::new(),
            smtp_password: Masked::default(),
            from_email: String::new(),
            from_name: String::new(),
        }
    }
}

/// Sender identity only; what unauthenticated callers get to see.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicEmailSettings {
    pub from_email: String,
    pub from_name: String,
}

/// Company-wide configuration. There is exactly one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySettings {
    pub company_name: String,
    pub logo: Option<String>,
    pub addresses: Vec<Address>,
    pub theme: Theme,
    pub default_language: String,
    pub supported_languages: Vec<String>,
    pub tax: TaxSettings,
    pub email: EmailSettings,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicCompanySettings {
    pub company_name: String,
    pub logo: Option<String>,
    pub addresses: Vec<Address>,
    pub theme: Theme,
    pub default_language: String,
    pub supported_languages: Vec<String>,
    pub tax: TaxSettings,
    pub email: PublicEmailSettings,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyUpdate {
    pub company_name: Option<String>,
    pub addresses: Option<Vec<Address>>,
    pub default_language: Option<String>,
}

impl Default for CompanySettings {
    fn default() -> Self {
        Self {
            company_name: "Gelbe-Umzüge".to_string(),
            logo: Some("/uploads/logo.png".to_string()),
            addresses: Vec::new(),
            theme: Theme::default(),
            default_language: "de".to_string(),
            supported_languages: ["de", "en", "fr", "it"].iter().map(|l| l.to_string()).collect(),
            tax: TaxSettings::default(),
            email: EmailSettings::default(),
            updated_at: Utc::now(),
        }
    }
}

impl CompanySettings {
    /// Settings written on first read when nothing has been stored yet.
    pub fn seeded() -> Self {
        Self {
            addresses: vec![Address {
                kind: "hauptsitz".to_string(),
                street: "Sandstrasse 5".to_string(),
                city: "Schönbühl".to_string(),
                zip_code: "3322".to_string(),
                country: "CH".to_string(),
                phone: "031 557 24 31".to_string(),
                email: "info@gelbe-umzuege.ch".to_string(),
                website: Some("www.gelbe-umzuege.ch".to_string()),
            }],
            ..Self::default()
        }
    }

    pub fn public_view(&self) -> PublicCompanySettings {
        PublicCompanySettings {
            company_name: self.company_name.clone(),
            logo: self.logo.clone(),
            addresses: self.addresses.clone(),
            theme: self.theme.clone(),
            default_language: self.default_language.clone(),
            supported_languages: self.supported_languages.clone(),
            tax: self.tax.clone(),
            email: PublicEmailSettings {
                from_email: self.email.from_email.clone(),
                from_name: self.email.from_name.clone(),
            },
            updated_at: self.updated_at,
        }
    }

    /// First address on file; printed as the quote letterhead.
    pub fn head_office(&self) -> Option<&Address> {
        self.addresses.first()
    }

    pub fn apply_company_update(&mut self, update: CompanyUpdate) -> CoreResult<()> {
        if let Some(language) = &update.default_language {
            if !self.supported_languages.iter().any(|l| l == language) {
                return Err(CoreError::ValidationError(format!(
                    "unsupported language: {}",
                    language
                )));
            }
        }
        if let Some(name) = &update.company_name {
            require(name, "companyName")?;
        }

        if let Some(name) = update.company_name {
            self.company_name = name;
        }
        if let Some(addresses) = update.addresses {
            self.addresses = addresses;
        }
        if let Some(language) = update.default_language {
            self.default_language = language;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_theme(&mut self, theme: Theme) -> CoreResult<()> {
        theme.validate()?;
        self.theme = theme;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_tax(&mut self, tax: TaxSettings) -> CoreResult<()> {
        tax.validate()?;
        self.tax = tax;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_email(&mut self, email: EmailSettings) -> CoreResult<()> {
        require(&email.smtp_host, "smtpHost")?;
        self.email = email;
        self.updated_at = Utc::now();
        Ok(())
    }
}
