pub mod error;
pub mod filter;
pub mod filter_order;
pub mod query;
pub mod types;

pub use error::FilterError;
pub use filter::Filter;
pub use query::{convert_query_to_filter, EntitySpec, TRADE_SPEC};
pub use types::*;
