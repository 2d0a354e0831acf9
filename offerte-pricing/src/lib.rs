pub mod money;
pub mod calculator;
pub mod breakdown;

pub use money::{format_swiss, parse_swiss, parse_swiss_or_zero, MoneyError};
pub use calculator::{calculate_total, AddOnLine, OfferTotal};
pub use breakdown::{Discount, DiscountType, PricingBreakdown, PricingEngine, TaxPolicy};
pub use rust_decimal::Decimal;
