//! Flattening of nested JSON into dotted keys, and the `q` serializer built on it

use serde_json::Value;

/// A flattened entry: one scalar, or every scalar found under a repeated key.
#[derive(Debug, Clone, PartialEq)]
pub enum FlatValue {
    Single(Value),
    Many(Vec<Value>),
}

/// Flatten a JSON document into `(dotted.key, value)` pairs.
///
/// Objects nest into dotted keys, arrays repeat their key for every item and
/// repeated keys are grouped. Keys keep first-seen order.
///
/// ```
/// use crudkit::domain::flatten::{flatten, FlatValue};
/// use serde_json::json;
///
/// let flat = flatten(&json!({"prop1": {"sub": 11}, "prop3": [{"sub": 1}, {"sub": 2}]}));
/// assert_eq!(flat[0], ("prop1.sub".to_string(), FlatValue::Single(json!(11))));
/// assert_eq!(flat[1], ("prop3.sub".to_string(), FlatValue::Many(vec![json!(1), json!(2)])));
/// ```
pub fn flatten(json: &Value) -> Vec<(String, FlatValue)> {
    let mut leaves: Vec<(String, Value)> = Vec::new();
    collect("", json, &mut leaves);

    let mut grouped: Vec<(String, Vec<Value>)> = Vec::new();
    for (key, value) in leaves {
        match grouped.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => grouped.push((key, vec![value])),
        }
    }

    grouped
        .into_iter()
        .map(|(key, mut values)| {
            let value = if values.len() == 1 {
                FlatValue::Single(values.remove(0))
            } else {
                FlatValue::Many(values)
            };
            (key, value)
        })
        .collect()
}

fn collect(key: &str, value: &Value, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect(key, item, out);
            }
        }
        Value::Object(map) => {
            for (sub_key, sub_value) in map {
                let full = if key.is_empty() {
                    sub_key.clone()
                } else {
                    format!("{}.{}", key, sub_key)
                };
                collect(&full, sub_value, out);
            }
        }
        scalar => out.push((key.to_string(), scalar.clone())),
    }
}

/// Translate JSON documents into a `q` expression.
///
/// Every flattened `key:value` pair is joined with `,`; grouped values are
/// joined with `|`. Falsy values and empty keys are skipped.
///
/// ```
/// use crudkit::domain::flatten::json_to_query;
/// use serde_json::json;
///
/// let q = json_to_query(&[
///     json!({"amount": ">200", "company": {"name": "acme"}}),
///     json!({"company.name": "*inc*"}),
/// ]);
/// assert_eq!(q, "amount:>200,company.name:acme,company.name:*inc*");
/// ```
pub fn json_to_query(documents: &[Value]) -> String {
    let mut pairs = Vec::new();

    for document in documents {
        for (key, value) in flatten(document) {
            let text = match value {
                FlatValue::Single(v) => {
                    if !is_truthy(&v) {
                        continue;
                    }
                    scalar_text(&v)
                }
                FlatValue::Many(values) => values
                    .iter()
                    .map(scalar_text)
                    .collect::<Vec<_>>()
                    .join("|"),
            };
            if !key.is_empty() && !text.is_empty() {
                pairs.push(format!("{}:{}", key, text));
            }
        }
    }

    pairs.join(",")
}

/// JavaScript-style truthiness of a scalar.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Plain text of a scalar; strings are unquoted, null is empty.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
