use offerte_shared::LocalizedText;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::{format_swiss, lenient_amount, parse_swiss_or_zero};

/// One add-on as it appears on an offer form: included in the total only
/// while `selected` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOnLine {
    pub service_id: String,
    #[serde(default)]
    pub name: LocalizedText,
    #[serde(default)]
    pub selected: bool,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub price: Decimal,
}

impl AddOnLine {
    pub fn new(service_id: &str, name: LocalizedText, price: Decimal) -> Self {
        Self {
            service_id: service_id.to_string(),
            name,
            selected: false,
            price,
        }
    }
}

/// Result of the offer total computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferTotal {
    pub moving_price: Decimal,
    pub additional_services_total: Decimal,
    pub total: Decimal,
}

impl OfferTotal {
    /// Swiss display form, e.g. `2'400.00`.
    pub fn formatted(&self) -> String {
        format_swiss(self.total)
    }
}

/// Total for an already parsed base price. Negative base prices count as zero.
///
/// A selected add-on whose price cannot be added without leaving the
/// `Decimal` range counts as zero, like any other unusable amount.
pub fn total_for_amount(moving_price: Decimal, lines: &[AddOnLine]) -> OfferTotal {
    let moving_price = moving_price.max(Decimal::ZERO);
    let mut additional_services_total = Decimal::ZERO;
    let mut total = moving_price;

    for line in lines.iter().filter(|line| line.selected) {
        let sums = (
            additional_services_total.checked_add(line.price),
            total.checked_add(line.price),
        );
        if let (Some(services), Some(grand)) = sums {
            additional_services_total = services;
            total = grand;
        }
    }

    OfferTotal {
        moving_price,
        additional_services_total,
        total,
    }
}

/// Offer total from the text typed into the moving price field.
///
/// Never fails: unparseable base prices are zero, and add-on prices were
/// already coerced when the lines were deserialized.
pub fn calculate_total(moving_price_text: &str, lines: &[AddOnLine]) -> OfferTotal {
    total_for_amount(parse_swiss_or_zero(moving_price_text), lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(selected: bool, price: &str) -> AddOnLine {
        AddOnLine {
            service_id: format!("svc-{}", price),
            name: LocalizedText::new(),
            selected,
            price: dec(price),
        }
    }

    #[test]
    fn quote_with_cleaning_selected() {
        let lines = vec![line(true, "900.00"), line(false, "250.00")];
        let total = calculate_total("1'500.00", &lines);

        assert_eq!(total.moving_price, dec("1500"));
        assert_eq!(total.additional_services_total, dec("900"));
        assert_eq!(total.formatted(), "2'400.00");
    }

    #[test]
    fn zero_quote() {
        assert_eq!(calculate_total("0.00", &[]).formatted(), "0.00");
    }

    #[test]
    fn no_selection_means_base_price() {
        assert_eq!(calculate_total("1'500.00", &[]).total, dec("1500"));

        let unselected = vec![line(false, "900"), line(false, "250")];
        assert_eq!(calculate_total("1'500.00", &unselected).total, dec("1500"));
    }

    #[test]
    fn malformed_base_price_is_zero() {
        let lines = vec![line(true, "120.50")];
        assert_eq!(calculate_total("", &lines).moving_price, Decimal::ZERO);
        assert_eq!(calculate_total("abc", &lines).total, dec("120.50"));
        assert_eq!(calculate_total("-300", &lines).total, dec("120.50"));
    }

    #[test]
    fn malformed_addon_price_contributes_nothing() {
        let lines: Vec<AddOnLine> = serde_json::from_value(json!([
            {"serviceId": "cleaning", "name": {"de": "Reinigung"}, "selected": true, "price": "abc"},
            {"serviceId": "disposal", "name": "Entsorgung", "selected": true, "price": "250.00"},
            {"serviceId": "piano", "selected": true, "price": 300},
            {"serviceId": "storage", "selected": false, "price": 1000}
        ]))
        .unwrap();

        let total = calculate_total("1'000", &lines);
        assert_eq!(total.additional_services_total, dec("550"));
        assert_eq!(total.formatted(), "1'550.00");
    }

    #[test]
    fn total_is_base_plus_selected_sum() {
        let lines = vec![
            line(true, "10.10"),
            line(false, "99.99"),
            line(true, "0.05"),
            line(true, "1234.00"),
        ];
        for base in ["0", "1", "999.99", "1'000'000.01"] {
            let total = calculate_total(base, &lines);
            let expected = parse_swiss_or_zero(base) + dec("1244.15");
            assert_eq!(total.total, expected);
        }
    }

    #[test]
    fn idempotent() {
        let lines = vec![line(true, "900.00"), line(false, "250.00")];
        let first = calculate_total("1'500.00", &lines).formatted();
        let second = calculate_total("1'500.00", &lines).formatted();
        assert_eq!(first, second);
    }

    #[test]
    fn out_of_range_addon_counts_as_zero() {
        let lines = vec![line(true, "79228162514264337593543950335"), line(true, "1")];
        let total = calculate_total("1'500.00", &lines);

        assert_eq!(total.additional_services_total, dec("1"));
        assert_eq!(total.formatted(), "1'501.00");
    }

    #[test]
    fn amounts_at_the_decimal_limit_do_not_panic() {
        let lines = vec![line(true, "1")];
        let total = calculate_total("79'228'162'514'264'337'593'543'950'335", &lines);

        assert_eq!(total.total, Decimal::MAX);
        assert_eq!(total.additional_services_total, Decimal::ZERO);
        assert_eq!(total.formatted(), "79'228'162'514'264'337'593'543'950'335.00");

        let lines: Vec<AddOnLine> = serde_json::from_value(json!([
            {"serviceId": "a", "selected": true, "price": "79228162514264337593543950335"},
            {"serviceId": "b", "selected": true, "price": "79228162514264337593543950335"}
        ]))
        .unwrap();
        assert_eq!(total_for_amount(Decimal::ZERO, &lines).additional_services_total, Decimal::MAX);
    }

    #[test]
    fn large_amounts_keep_every_separator() {
        let lines = vec![line(true, "250000")];
        assert_eq!(calculate_total("1'234'567.50", &lines).formatted(), "1'484'567.50");
    }
}
