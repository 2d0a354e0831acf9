use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculator::{total_for_amount, AddOnLine};
use crate::money::{percent_of, round_money};

pub const DEFAULT_CURRENCY: &str = "CHF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    #[default]
    Percentage,
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Discount {
    pub value: Decimal,
    pub kind: DiscountType,
}

impl Discount {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn percentage(value: Decimal) -> Self {
        Self { value, kind: DiscountType::Percentage }
    }

    pub fn fixed(value: Decimal) -> Self {
        Self { value, kind: DiscountType::Fixed }
    }

    /// Amount taken off `subtotal`, never more than the subtotal itself.
    fn amount_on(&self, subtotal: Decimal) -> Decimal {
        if self.value <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let amount = match self.kind {
            DiscountType::Percentage => percent_of(subtotal, self.value).unwrap_or(subtotal),
            DiscountType::Fixed => self.value,
        };
        round_money(amount.min(subtotal))
    }
}

/// VAT applied on top of the discounted subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxPolicy {
    pub enabled: bool,
    /// Percent, e.g. `7.7`.
    pub rate: Decimal,
}

impl Default for TaxPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            rate: Decimal::new(77, 1),
        }
    }
}

/// Full price breakdown stored on an offer once it has been calculated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingBreakdown {
    pub base_price: Decimal,
    pub additional_services_total: Decimal,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub discount_type: DiscountType,
    pub discount_amount: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub grand_total: Decimal,
    pub currency: String,
    pub include_tax: bool,
}

pub struct PricingEngine {
    tax: TaxPolicy,
}

impl PricingEngine {
    pub fn new(tax: TaxPolicy) -> Self {
        Self { tax }
    }

    /// subtotal = base + selected add-ons; discount comes off the subtotal;
    /// tax is charged on what remains. Tax that cannot be computed or added
    /// within the `Decimal` range counts as zero.
    pub fn breakdown(&self, base_price: Decimal, lines: &[AddOnLine], discount: Discount) -> PricingBreakdown {
        let totals = total_for_amount(base_price, lines);
        let subtotal = totals.total;

        let discount_amount = discount.amount_on(subtotal);
        let taxable = subtotal - discount_amount;

        let tax_amount = if self.tax.enabled {
            percent_of(taxable, self.tax.rate)
                .filter(|tax| taxable.checked_add(*tax).is_some())
                .map(round_money)
                .unwrap_or(Decimal::ZERO)
        } else {
            Decimal::ZERO
        };
        let grand_total = taxable.checked_add(tax_amount).unwrap_or(taxable);

        PricingBreakdown {
            base_price: totals.moving_price,
            additional_services_total: totals.additional_services_total,
            subtotal,
            discount: discount.value,
            discount_type: discount.kind,
            discount_amount,
            tax_rate: self.tax.rate,
            tax_amount,
            grand_total: round_money(grand_total),
            currency: DEFAULT_CURRENCY.to_string(),
            include_tax: self.tax.enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offerte_shared::LocalizedText;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn lines() -> Vec<AddOnLine> {
        let mut cleaning = AddOnLine::new("cleaning", LocalizedText::new(), dec("900"));
        cleaning.selected = true;
        let disposal = AddOnLine::new("disposal", LocalizedText::new(), dec("250"));
        vec![cleaning, disposal]
    }

    #[test]
    fn tax_on_undiscounted_subtotal() {
        let engine = PricingEngine::new(TaxPolicy::default());
        let b = engine.breakdown(dec("1500"), &lines(), Discount::none());

        assert_eq!(b.subtotal, dec("2400"));
        assert_eq!(b.discount_amount, Decimal::ZERO);
        assert_eq!(b.tax_amount, dec("184.80"));
        assert_eq!(b.grand_total, dec("2584.80"));
        assert_eq!(b.currency, "CHF");
        assert!(b.include_tax);
    }

    #[test]
    fn percentage_discount_before_tax() {
        let engine = PricingEngine::new(TaxPolicy::default());
        let b = engine.breakdown(dec("1500"), &lines(), Discount::percentage(dec("10")));

        assert_eq!(b.discount_amount, dec("240"));
        assert_eq!(b.tax_amount, dec("166.32"));
        assert_eq!(b.grand_total, dec("2326.32"));
    }

    #[test]
    fn fixed_discount_without_tax() {
        let engine = PricingEngine::new(TaxPolicy { enabled: false, rate: dec("7.7") });
        let b = engine.breakdown(dec("1500"), &lines(), Discount::fixed(dec("400")));

        assert_eq!(b.discount_amount, dec("400"));
        assert_eq!(b.tax_amount, Decimal::ZERO);
        assert_eq!(b.grand_total, dec("2000"));
        assert!(!b.include_tax);
    }

    #[test]
    fn discount_never_exceeds_subtotal() {
        let engine = PricingEngine::new(TaxPolicy::default());
        let b = engine.breakdown(dec("100"), &[], Discount::fixed(dec("500")));

        assert_eq!(b.discount_amount, dec("100"));
        assert_eq!(b.grand_total, Decimal::ZERO);
    }

    #[test]
    fn huge_subtotal_does_not_panic() {
        let engine = PricingEngine::new(TaxPolicy::default());
        let mut line = AddOnLine::new("crane", LocalizedText::new(), dec("1"));
        line.selected = true;

        let b = engine.breakdown(Decimal::MAX, &[line], Discount::percentage(dec("10")));
        assert_eq!(b.subtotal, Decimal::MAX);
        assert_eq!(b.additional_services_total, Decimal::ZERO);
        assert!(b.discount_amount > Decimal::ZERO);
        assert_eq!(b.grand_total, b.subtotal - b.discount_amount + b.tax_amount);

        let b = engine.breakdown(Decimal::MAX, &[], Discount::none());
        assert_eq!(b.tax_amount, Decimal::ZERO);
        assert_eq!(b.grand_total, Decimal::MAX);
    }

    #[test]
    fn discount_type_wire_names() {
        assert_eq!(serde_json::to_value(DiscountType::Fixed).unwrap(), serde_json::json!("fixed"));
        let parsed: DiscountType = serde_json::from_str("\"percentage\"").unwrap();
        assert_eq!(parsed, DiscountType::Percentage);
    }
}
