//! Port traits (interfaces between domain and adapters).

pub mod config_port;
pub mod holdings_port;
pub mod price_book_port;
