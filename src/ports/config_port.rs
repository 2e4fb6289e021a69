//! Configuration access port.

use rust_decimal::Decimal;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    /// `None` when the key is missing or not a decimal number.
    fn get_decimal(&self, section: &str, key: &str) -> Option<Decimal>;
}
