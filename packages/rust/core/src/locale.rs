//! Target-locale extraction from variant query conditions.
//!
//! Only literal locale strings are harvested. The operator is carried but
//! never evaluated, so an `isNot` condition contributes its locales exactly
//! like an `is` condition does.

use serde_json::Value;
use tracing::trace;
use variantscope_shared::{QueryCondition, QueryValue};

/// Query property that carries locale targeting.
const LOCALE_PROPERTY: &str = "locale";

/// Collect the locales named by `locale` conditions in `query`.
///
/// The result holds no duplicates and keeps first-seen order. List values
/// contribute their string elements, text values contribute themselves, and
/// every other value shape is ignored.
pub fn extract_target_locales(query: &[QueryCondition]) -> Vec<String> {
    let mut locales: Vec<String> = Vec::new();
    let mut add = |locale: &str| {
        if !locales.iter().any(|l| l == locale) {
            locales.push(locale.to_string());
        }
    };

    for condition in query.iter().filter(|c| c.property == LOCALE_PROPERTY) {
        match &condition.value {
            QueryValue::List(items) => items
                .iter()
                .filter_map(QueryValue::as_text)
                .for_each(&mut add),
            QueryValue::Text(locale) => add(locale.as_str()),
            _ => {}
        }
    }

    locales
}

/// Lenient variant of [`extract_target_locales`] for raw JSON input.
///
/// Anything that is not an array yields no locales.
pub fn extract_target_locales_from_value(query: &Value) -> Vec<String> {
    extract_target_locales(&parse_query(query))
}

/// Decode a raw `query` value into conditions.
///
/// Non-array input becomes an empty list and entries that are not objects
/// are skipped. Every object entry is kept, whatever its operator holds.
pub fn parse_query(query: &Value) -> Vec<QueryCondition> {
    let Some(entries) = query.as_array() else {
        if !query.is_null() {
            trace!(kind = json_kind(query), "query is not an array, ignoring");
        }
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            if !entry.is_object() {
                trace!(kind = json_kind(entry), "skipping non-object query condition");
                return None;
            }
            match serde_json::from_value(entry.clone()) {
                Ok(condition) => Some(condition),
                Err(e) => {
                    trace!(error = %e, "skipping malformed query condition");
                    None
                }
            }
        })
        .collect()
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use variantscope_shared::QueryOperator;

    #[test]
    fn no_locale_conditions_yield_nothing() {
        let query = vec![
            QueryCondition::new("device", QueryOperator::Is, "mobile"),
            QueryCondition::new("urlPath", QueryOperator::StartsWith, "/fr"),
        ];
        assert!(extract_target_locales(&query).is_empty());
        assert!(extract_target_locales(&[]).is_empty());
    }

    #[test]
    fn polarity_is_ignored() {
        let query = vec![
            QueryCondition::new("locale", QueryOperator::Is, vec!["en", "fr"]),
            QueryCondition::new("locale", QueryOperator::IsNot, "de"),
        ];
        assert_eq!(extract_target_locales(&query), vec!["en", "fr", "de"]);
    }

    #[test]
    fn duplicates_collapse_in_first_seen_order() {
        let query = vec![
            QueryCondition::new("locale", QueryOperator::Is, vec!["fr", "en", "fr"]),
            QueryCondition::new("locale", QueryOperator::Contains, "en"),
            QueryCondition::new("locale", QueryOperator::Is, "es"),
        ];
        assert_eq!(extract_target_locales(&query), vec!["fr", "en", "es"]);
    }

    #[test]
    fn non_string_values_are_ignored() {
        let query = vec![
            QueryCondition::new("locale", QueryOperator::Is, true),
            QueryCondition::new("locale", QueryOperator::Is, 42_i64),
            QueryCondition {
                property: "locale".into(),
                operator: QueryOperator::Is,
                value: QueryValue::List(vec![
                    QueryValue::Number(7.into()),
                    QueryValue::Text("ja".into()),
                    QueryValue::Bool(false),
                    QueryValue::List(vec![QueryValue::Text("nested".into())]),
                ]),
            },
        ];
        assert_eq!(extract_target_locales(&query), vec!["ja"]);
    }

    #[test]
    fn property_match_is_exact() {
        let query = vec![
            QueryCondition::new("Locale", QueryOperator::Is, "en"),
            QueryCondition::new("locale ", QueryOperator::Is, "fr"),
        ];
        assert!(extract_target_locales(&query).is_empty());
    }

    #[test]
    fn raw_malformed_query_yields_nothing() {
        assert!(extract_target_locales_from_value(&json!(null)).is_empty());
        assert!(extract_target_locales_from_value(&json!({"property": "locale"})).is_empty());
        assert!(extract_target_locales_from_value(&json!("en")).is_empty());
    }

    #[test]
    fn raw_query_skips_bad_entries() {
        let query = json!([
            "not a condition",
            {"property": "locale", "operator": "is", "value": ["en-US", 1, null]},
            {"property": 5, "value": "xx"},
            {"property": "locale", "operator": "someFutureOp", "value": "pt-BR"},
            {"property": "locale", "value": {"nested": "obj"}}
        ]);
        assert_eq!(extract_target_locales_from_value(&query), vec!["en-US", "pt-BR"]);
        assert_eq!(parse_query(&query).len(), 4);
    }

    #[test]
    fn operator_shape_does_not_gate_locales() {
        let query = json!([
            {"property": "locale", "operator": null, "value": "fr"},
            {"property": "locale", "operator": 3, "value": ["de"]},
            {"property": "locale", "operator": {"op": "is"}, "value": "ja"},
            {"property": "locale", "value": ["en", {"x": 1}, "fr"]}
        ]);
        assert_eq!(
            extract_target_locales_from_value(&query),
            vec!["fr", "de", "ja", "en"]
        );
    }

    #[test]
    fn odd_operators_keep_their_conditions() {
        let query = json!([
            {"property": "locale", "operator": null, "value": "fr"},
            {"property": "device", "operator": 3, "value": "mobile"},
            {"property": "locale", "operator": {"op": "is"}, "value": "ja"},
            ["locale", "is", "es"]
        ]);
        let conditions = parse_query(&query);

        assert_eq!(conditions.len(), 3);
        assert!(conditions.iter().all(|c| c.operator == QueryOperator::Unknown));
        assert_eq!(conditions[1].property, "device");
        assert_eq!(conditions[1].value, QueryValue::Text("mobile".into()));
    }
}
