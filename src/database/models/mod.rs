pub mod business;
pub mod query;
pub mod trade;

pub use business::Business;
pub use query::{GetQuery, TradeQuery};
pub use trade::{Trade, TradeInput, TradePatch};
