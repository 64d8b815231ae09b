use serde_json::Value;
use std::collections::HashMap;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::types::FilterData;
use crate::database::models::trade::{TRADE_ENTITY, TRADE_FIELDS, TRADE_RELATIONS};

/// What a resource exposes to query-string filtering
#[derive(Debug, Clone, Copy)]
pub struct EntitySpec {
    pub entity: &'static str,
    pub table: &'static str,
    pub fields: &'static [&'static str],
    /// Fields usable as equality filters
    pub filterable: &'static [&'static str],
    pub relations: &'static [&'static str],
}

pub const TRADE_SPEC: EntitySpec = EntitySpec {
    entity: TRADE_ENTITY,
    table: "trades",
    fields: TRADE_FIELDS,
    filterable: &["id", "business_id"],
    relations: TRADE_RELATIONS,
};

/// Translate a flat query-string mapping into a filter descriptor.
///
/// Pure: no store access, no configuration. Unknown keys, fields and
/// relations are rejected rather than passed through to the store.
pub fn convert_query_to_filter(params: &HashMap<String, String>, spec: &EntitySpec) -> Result<FilterData, FilterError> {
    let mut filter = FilterData::default();

    for (key, raw) in params {
        match key.as_str() {
            "limit" => filter.limit = Some(parse_non_negative(raw).ok_or_else(|| FilterError::InvalidLimit(raw.clone()))?),
            "offset" => filter.offset = Some(parse_non_negative(raw).ok_or_else(|| FilterError::InvalidOffset(raw.clone()))?),
            "order" => {
                let order = FilterOrder::parse(raw)?;
                for info in &order {
                    if !spec.fields.contains(&info.column.as_str()) {
                        return Err(FilterError::InvalidColumn(info.column.clone()));
                    }
                }
                filter.order = order;
            }
            "relations" => {
                for relation in split_list(raw) {
                    if !spec.relations.contains(&relation.as_str()) {
                        return Err(FilterError::UnknownRelation(relation));
                    }
                    if !filter.includes(&relation) {
                        filter.include.push(relation);
                    }
                }
            }
            "fields" => {
                for field in split_list(raw) {
                    if !spec.fields.contains(&field.as_str()) {
                        return Err(FilterError::InvalidColumn(field));
                    }
                    filter.select.push(field);
                }
            }
            field if spec.filterable.contains(&field) => {
                filter.where_clause.insert(field.to_string(), Value::String(raw.clone()));
            }
            other => return Err(FilterError::UnknownParameter(other.to_string())),
        }
    }

    tracing::debug!(?filter, "Translated query for {}", spec.table);
    Ok(filter)
}

fn parse_non_negative(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|n| *n >= 0)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
