use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

use super::{FieldErrors, ValidationError};
use crate::database::models::{TradeInput, TradePatch};

/// Server-managed and relation fields; tolerated in payloads and ignored
const IGNORED_FIELDS: &[&str] = &["id", "created_at", "updated_at", "business", "_count"];

const KNOWN_FIELDS: &[&str] = &["trade_date", "profit_or_loss", "business_id"];

/// Full schema used for create: every required field must be present.
pub fn validate_trade(payload: &Value) -> Result<TradeInput, ValidationError> {
    let mut errors = FieldErrors::default();
    let Some(object) = as_object(payload, &mut errors) else {
        return Err(errors.into_error());
    };
    check_unknown(object, &mut errors);

    let trade_date = match object.get("trade_date") {
        None | Some(Value::Null) => {
            errors.add("trade_date", "trade_date is a required field");
            None
        }
        Some(value) => parse_date(value, &mut errors),
    };
    let profit_or_loss = match object.get("profit_or_loss") {
        None | Some(Value::Null) => {
            errors.add("profit_or_loss", "profit_or_loss is a required field");
            None
        }
        Some(value) => parse_integer(value, &mut errors),
    };
    let business_id = parse_business_id(object.get("business_id"), &mut errors);

    match (trade_date, profit_or_loss) {
        (Some(trade_date), Some(profit_or_loss)) => errors.finish(|| TradeInput {
            trade_date,
            profit_or_loss,
            business_id: business_id.flatten(),
        }),
        _ => Err(errors.into_error()),
    }
}

/// Update schema: fields are optional, but any field present must be valid.
/// `null` is only meaningful for `business_id`.
pub fn validate_trade_patch(payload: &Value) -> Result<TradePatch, ValidationError> {
    let mut errors = FieldErrors::default();
    let Some(object) = as_object(payload, &mut errors) else {
        return Err(errors.into_error());
    };
    check_unknown(object, &mut errors);

    let trade_date = match object.get("trade_date") {
        None => None,
        Some(Value::Null) => {
            errors.add("trade_date", "trade_date cannot be null");
            None
        }
        Some(value) => parse_date(value, &mut errors),
    };
    let profit_or_loss = match object.get("profit_or_loss") {
        None => None,
        Some(Value::Null) => {
            errors.add("profit_or_loss", "profit_or_loss cannot be null");
            None
        }
        Some(value) => parse_integer(value, &mut errors),
    };
    let business_id = parse_business_id(object.get("business_id"), &mut errors);

    errors.finish(|| TradePatch {
        trade_date,
        profit_or_loss,
        business_id,
    })
}

fn as_object<'a>(payload: &'a Value, errors: &mut FieldErrors) -> Option<&'a Map<String, Value>> {
    match payload {
        Value::Object(map) => Some(map),
        other => {
            errors.add("payload", format!("payload must be an object, got {}", type_name(other)));
            None
        }
    }
}

fn check_unknown(object: &Map<String, Value>, errors: &mut FieldErrors) {
    for key in object.keys() {
        if !KNOWN_FIELDS.contains(&key.as_str()) && !IGNORED_FIELDS.contains(&key.as_str()) {
            errors.add(key, format!("{} is not a recognized field", key));
        }
    }
}

/// Integers are epoch milliseconds
fn parse_date(value: &Value, errors: &mut FieldErrors) -> Option<NaiveDate> {
    let parsed = match value {
        Value::String(s) => {
            let s = s.trim();
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc().date()))
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.date_naive()),
        _ => None,
    };
    if parsed.is_none() {
        errors.add("trade_date", format!("trade_date must be a `date` type, but the final value was: {}", value));
    }
    parsed
}

fn parse_integer(value: &Value, errors: &mut FieldErrors) -> Option<i64> {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    if parsed.is_none() {
        errors.add("profit_or_loss", "profit_or_loss must be an integer");
    }
    parsed
}

/// `None` when absent, `Some(None)` for explicit null
fn parse_business_id(value: Option<&Value>, errors: &mut FieldErrors) -> Option<Option<String>> {
    match value {
        None => None,
        Some(Value::Null) => Some(None),
        Some(Value::String(s)) => Some(Some(s.clone())),
        Some(other) => {
            errors.add(
                "business_id",
                format!("business_id must be a `string` type, but the final value was: {}", other),
            );
            None
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
