pub mod trade;

use std::collections::BTreeMap;

pub use trade::{validate_trade, validate_trade_patch};

/// Schema failure carrying one message per offending field
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", summary(.field_errors))]
pub struct ValidationError {
    pub field_errors: BTreeMap<String, String>,
}

fn summary(field_errors: &BTreeMap<String, String>) -> String {
    match field_errors.len() {
        1 => field_errors.values().next().cloned().unwrap_or_default(),
        n => format!("{} errors occurred", n),
    }
}

/// Accumulates field errors while a payload is walked
#[derive(Debug, Default)]
pub(crate) struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub(crate) fn add(&mut self, field: &str, message: impl Into<String>) {
        // first message per field wins
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub(crate) fn into_error(self) -> ValidationError {
        ValidationError { field_errors: self.0 }
    }

    pub(crate) fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationError> {
        if self.0.is_empty() {
            Ok(value())
        } else {
            Err(self.into_error())
        }
    }
}
