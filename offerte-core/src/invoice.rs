use chrono::{DateTime, NaiveDate, Utc};
use offerte_pricing::breakdown::DEFAULT_CURRENCY;
use offerte_pricing::money::{lenient_amount, percent_of, round_money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{require, CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for InvoiceStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(InvoiceStatus::Draft),
            "sent" => Ok(InvoiceStatus::Sent),
            "paid" => Ok(InvoiceStatus::Paid),
            "overdue" => Ok(InvoiceStatus::Overdue),
            "cancelled" => Ok(InvoiceStatus::Cancelled),
            other => Err(CoreError::ValidationError(format!("unknown invoice status: {}", other))),
        }
    }
}

fn one() -> Decimal {
    Decimal::ONE
}

/// Swiss VAT standard rate used when the form does not name one.
fn default_tax_rate() -> Decimal {
    Decimal::new(77, 1)
}

/// One billed position. `total` is always `quantity * unit_price`, rounded
/// to centimes; whatever the client sends for it is replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub description: String,
    #[serde(default = "one", deserialize_with = "lenient_amount")]
    pub quantity: Decimal,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub unit_price: Decimal,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total: Decimal,
}

impl InvoiceItem {
    /// Out-of-range products count as zero.
    fn line_total(&self) -> Decimal {
        self.quantity
            .checked_mul(self.unit_price)
            .map(round_money)
            .unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

impl InvoiceTotals {
    /// subtotal = sum of item totals; tax = subtotal * rate / 100, rounded.
    /// Amounts that cannot be added within the `Decimal` range count as zero.
    pub fn compute(items: &[InvoiceItem], tax_rate: Decimal) -> Self {
        let subtotal = items
            .iter()
            .fold(Decimal::ZERO, |sum, item| sum.checked_add(item.total).unwrap_or(sum));
        let tax_amount = percent_of(subtotal, tax_rate)
            .map(round_money)
            .filter(|tax| subtotal.checked_add(*tax).is_some())
            .unwrap_or(Decimal::ZERO);

        Self {
            subtotal,
            tax_amount,
            total: subtotal + tax_amount,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub offer_id: Option<Uuid>,
    pub customer_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub items: Vec<InvoiceItem>,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub currency: String,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoice {
    #[serde(default)]
    pub offer_id: Option<Uuid>,
    pub customer_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub items: Vec<InvoiceItem>,
    #[serde(default = "default_tax_rate", deserialize_with = "lenient_amount")]
    pub tax_rate: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceUpdate {
    pub status: Option<InvoiceStatus>,
    pub due_date: Option<NaiveDate>,
    pub items: Option<Vec<InvoiceItem>>,
    pub notes: Option<String>,
}

fn validate_items(items: &[InvoiceItem]) -> CoreResult<()> {
    if items.is_empty() {
        return Err(CoreError::ValidationError("an invoice needs at least one item".into()));
    }
    for item in items {
        require(&item.description, "items.description")?;
        if item.quantity < Decimal::ZERO {
            return Err(CoreError::ValidationError("items.quantity must not be negative".into()));
        }
    }
    Ok(())
}

fn validate_due_date(invoice_date: NaiveDate, due_date: NaiveDate) -> CoreResult<()> {
    if due_date < invoice_date {
        return Err(CoreError::ValidationError("dueDate must not be before invoiceDate".into()));
    }
    Ok(())
}

impl NewInvoice {
    pub fn validate(&self) -> CoreResult<()> {
        validate_items(&self.items)?;
        validate_due_date(self.invoice_date, self.due_date)?;
        if self.tax_rate < Decimal::ZERO || self.tax_rate > Decimal::ONE_HUNDRED {
            return Err(CoreError::ValidationError("taxRate must be between 0 and 100".into()));
        }
        Ok(())
    }
}

impl Invoice {
    pub fn create(new: NewInvoice, invoice_number: String, created_by: Option<String>) -> Self {
        let now = Utc::now();
        let mut invoice = Self {
            id: Uuid::new_v4(),
            invoice_number,
            offer_id: new.offer_id,
            customer_id: new.customer_id,
            invoice_date: new.invoice_date,
            due_date: new.due_date,
            status: InvoiceStatus::Draft,
            items: Vec::new(),
            subtotal: Decimal::ZERO,
            tax_rate: new.tax_rate,
            tax_amount: Decimal::ZERO,
            total: Decimal::ZERO,
            currency: DEFAULT_CURRENCY.to_string(),
            notes: new.notes,
            created_by,
            created_at: now,
            updated_at: now,
        };
        invoice.set_items(new.items);
        invoice
    }

    /// Replaces the items and re-derives every total at the stored tax rate.
    pub fn set_items(&mut self, mut items: Vec<InvoiceItem>) {
        for item in &mut items {
            item.total = item.line_total();
        }
        let totals = InvoiceTotals::compute(&items, self.tax_rate);

        self.items = items;
        self.subtotal = totals.subtotal;
        self.tax_amount = totals.tax_amount;
        self.total = totals.total;
        self.updated_at = Utc::now();
    }

    pub fn apply_update(&mut self, update: InvoiceUpdate) -> CoreResult<()> {
        if let Some(items) = &update.items {
            validate_items(items)?;
        }
        if let Some(due_date) = update.due_date {
            validate_due_date(self.invoice_date, due_date)?;
        }

        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(due_date) = update.due_date {
            self.due_date = due_date;
        }
        if let Some(notes) = update.notes {
            self.notes = Some(notes);
        }
        match update.items {
            Some(items) => self.set_items(items),
            None => self.updated_at = Utc::now(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn form() -> NewInvoice {
        serde_json::from_value(json!({
            "customerId": Uuid::new_v4(),
            "invoiceDate": "2026-11-03",
            "dueDate": "2026-12-03",
            "items": [
                {"description": "Umzug Bern - Thun", "unitPrice": "1'500.00"},
                {"description": "Reinigung", "quantity": 2, "unitPrice": 450, "total": 1}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn create_derives_totals_from_items() {
        let new = form();
        new.validate().unwrap();
        let invoice = Invoice::create(new, "100001".into(), Some("staff-1".into()));

        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert_eq!(invoice.currency, "CHF");
        assert_eq!(invoice.tax_rate, dec("7.7"));
        assert_eq!(invoice.items[0].quantity, Decimal::ONE);
        assert_eq!(invoice.items[1].total, dec("900"));
        assert_eq!(invoice.subtotal, dec("2400"));
        assert_eq!(invoice.tax_amount, dec("184.80"));
        assert_eq!(invoice.total, dec("2584.80"));
    }

    #[test]
    fn update_recomputes_only_when_items_change() {
        let mut invoice = Invoice::create(form(), "100001".into(), None);

        let update: InvoiceUpdate = serde_json::from_value(json!({"status": "sent", "notes": "Zahlbar in 30 Tagen"})).unwrap();
        invoice.apply_update(update).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Sent);
        assert_eq!(invoice.total, dec("2584.80"));

        let update: InvoiceUpdate = serde_json::from_value(json!({
            "items": [{"description": "Entsorgung", "quantity": "1.5", "unitPrice": "100.00"}]
        }))
        .unwrap();
        invoice.apply_update(update).unwrap();
        assert_eq!(invoice.subtotal, dec("150"));
        assert_eq!(invoice.tax_amount, dec("11.55"));
        assert_eq!(invoice.total, dec("161.55"));
    }

    #[test]
    fn rejects_inconsistent_forms() {
        let mut new = form();
        new.due_date = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        assert!(new.validate().is_err());

        let mut new = form();
        new.items.clear();
        assert!(new.validate().is_err());

        let mut new = form();
        new.tax_rate = dec("120");
        assert!(new.validate().is_err());

        let mut invoice = Invoice::create(form(), "100001".into(), None);
        let update = InvoiceUpdate { items: Some(vec![]), ..Default::default() };
        assert!(invoice.apply_update(update).is_err());
        assert_eq!(invoice.items.len(), 2);
    }

    #[test]
    fn out_of_range_positions_count_as_zero() {
        let items = vec![
            InvoiceItem {
                description: "Kran".into(),
                quantity: dec("2"),
                unit_price: Decimal::MAX,
                total: Decimal::ZERO,
            },
            InvoiceItem {
                description: "Kartons".into(),
                quantity: dec("10"),
                unit_price: dec("3.50"),
                total: Decimal::ZERO,
            },
        ];
        let mut invoice = Invoice::create(form(), "100001".into(), None);
        invoice.set_items(items);

        assert_eq!(invoice.items[0].total, Decimal::ZERO);
        assert_eq!(invoice.subtotal, dec("35"));

        let totals = InvoiceTotals::compute(
            &[InvoiceItem { description: "x".into(), quantity: Decimal::ONE, unit_price: Decimal::MAX, total: Decimal::MAX }],
            dec("7.7"),
        );
        assert_eq!(totals.tax_amount, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::MAX);
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            InvoiceStatus::Draft,
            InvoiceStatus::Sent,
            InvoiceStatus::Paid,
            InvoiceStatus::Overdue,
            InvoiceStatus::Cancelled,
        ] {
            assert_eq!(status.to_string().parse::<InvoiceStatus>().unwrap(), status);
        }
        assert!("void".parse::<InvoiceStatus>().is_err());
    }
}
