/// Width and first value of offer numbers (`10001`, `10002`, ...).
pub const OFFER_NUMBER_WIDTH: usize = 5;
pub const FIRST_OFFER_NUMBER: &str = "10001";

/// Customer numbers follow the same scheme as offer numbers.
pub const CUSTOMER_NUMBER_WIDTH: usize = 5;
pub const FIRST_CUSTOMER_NUMBER: &str = "10001";

/// Invoice numbers are one digit wider: `100001`, `100002`, ...
pub const INVOICE_NUMBER_WIDTH: usize = 6;
pub const FIRST_INVOICE_NUMBER: &str = "100001";

/// Successor of `last`, zero-padded to `width`. Starts over at `first` when
/// there is no previous number or it is not numeric.
pub fn next_number(last: Option<&str>, width: usize, first: &str) -> String {
    match last
        .map(str::trim)
        .and_then(|n| n.parse::<u64>().ok())
        .and_then(|n| n.checked_add(1))
    {
        Some(n) => format!("{:0width$}", n, width = width),
        None => first.to_string(),
    }
}

pub fn next_offer_number(last: Option<&str>) -> String {
    next_number(last, OFFER_NUMBER_WIDTH, FIRST_OFFER_NUMBER)
}

pub fn next_customer_number(last: Option<&str>) -> String {
    next_number(last, CUSTOMER_NUMBER_WIDTH, FIRST_CUSTOMER_NUMBER)
}

pub fn next_invoice_number(last: Option<&str>) -> String {
    next_number(last, INVOICE_NUMBER_WIDTH, FIRST_INVOICE_NUMBER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_and_pads() {
        assert_eq!(next_offer_number(Some("10001")), "10002");
        assert_eq!(next_offer_number(Some("00041")), "00042");
        assert_eq!(next_offer_number(Some("99999")), "100000");
    }

    #[test]
    fn starts_over_without_usable_predecessor() {
        assert_eq!(next_offer_number(None), "10001");
        assert_eq!(next_customer_number(Some("K-17")), "10001");
        assert_eq!(next_customer_number(Some("")), "10001");
    }

    #[test]
    fn invoice_numbers_are_six_digits() {
        assert_eq!(next_invoice_number(None), "100001");
        assert_eq!(next_invoice_number(Some("100041")), "100042");
        assert_eq!(next_invoice_number(Some("R-1")), "100001");
    }

    #[test]
    fn exhausted_counter_starts_over() {
        assert_eq!(next_offer_number(Some("18446744073709551615")), "10001");
        assert_eq!(next_offer_number(Some("18446744073709551614")), "18446744073709551615");
    }
}
