pub mod i18n;
pub mod pii;

pub use i18n::LocalizedText;
pub use pii::Masked;
