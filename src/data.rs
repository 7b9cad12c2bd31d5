use std::io;

use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use serde_json::{Map, Number, Value};
use tracing::warn;

use crate::encoding::Dataset;

/// Coerce a resolved value to a finite number.
///
/// Strings are trimmed and parsed; anything else that is not a number is
/// absent.
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|n| n.is_finite()),
        Value::String(s) => parse_token(s),
        _ => None,
    }
}

fn parse_token(token: &str) -> Option<f64> {
    token.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Turn one `chart-data` argument into a dataset.
///
/// A comma-separated string or a list yields one value per element, a
/// single number a one-value dataset, a missing value an empty dataset.
pub fn dataset_from_value(value: &Value) -> Dataset {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => s.split(',').map(parse_token).collect(),
        Value::Array(items) => items.iter().map(parse_number).collect(),
        Value::Number(_) => vec![parse_number(value)],
        other => {
            warn!(value = %other, "chart data is not a sequence, using an empty dataset");
            Vec::new()
        }
    }
}

/// Best-effort scalar for a CSV cell: numbers when they parse, text otherwise.
fn cell_value(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(i.into());
    }
    match trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
        Some(n) => Value::Number(n),
        None => Value::String(cell.to_string()),
    }
}

/// Read a CSV table into one list variable per column, keyed by header.
pub fn columns_from_csv<R: io::Read>(reader: R) -> Result<Map<String, Value>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut columns: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];
    for result in reader.records() {
        let record = result.context("Failed to read CSV record")?;
        for (column, cell) in columns.iter_mut().zip(record.iter()) {
            column.push(cell_value(cell));
        }
    }

    if columns.first().map_or(true, Vec::is_empty) {
        return Err(anyhow!("CSV must contain at least one data row"));
    }

    Ok(headers
        .into_iter()
        .zip(columns)
        .map(|(header, values)| (header, Value::Array(values)))
        .collect())
}

/// Context variables from a JSON document, which must be an object.
pub fn values_from_json(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(anyhow!("Context data must be a JSON object")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(&json!(3)), Some(3.0));
        assert_eq!(parse_number(&json!(2.5)), Some(2.5));
        assert_eq!(parse_number(&json!(" 7 ")), Some(7.0));
        assert_eq!(parse_number(&json!("abc")), None);
        assert_eq!(parse_number(&json!("inf")), None);
        assert_eq!(parse_number(&json!("NaN")), None);
        assert_eq!(parse_number(&json!(true)), None);
        assert_eq!(parse_number(&Value::Null), None);
    }

    #[test]
    fn test_dataset_from_string() {
        assert_eq!(
            dataset_from_value(&json!("1,2,x,0")),
            vec![Some(1.0), Some(2.0), None, Some(0.0)]
        );
    }

    #[test]
    fn test_dataset_from_list() {
        assert_eq!(
            dataset_from_value(&json!([10, "20", null, 30.5])),
            vec![Some(10.0), Some(20.0), None, Some(30.5)]
        );
    }

    #[test]
    fn test_dataset_from_scalar_and_missing() {
        assert_eq!(dataset_from_value(&json!(4)), vec![Some(4.0)]);
        assert!(dataset_from_value(&Value::Null).is_empty());
        assert!(dataset_from_value(&json!({"a": 1})).is_empty());
    }

    #[test]
    fn test_columns_from_csv() {
        let csv = "month,sales\njan,10\nfeb,20.5\nmar,\n";
        let columns = columns_from_csv(Cursor::new(csv)).unwrap();
        assert_eq!(columns.get("month"), Some(&json!(["jan", "feb", "mar"])));
        assert_eq!(columns.get("sales"), Some(&json!([10, 20.5, null])));
        let keys: Vec<&String> = columns.keys().collect();
        assert_eq!(keys, vec!["month", "sales"]);
    }

    #[test]
    fn test_columns_from_empty_csv() {
        let result = columns_from_csv(Cursor::new("x,y\n"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("at least one data row"));
    }

    #[test]
    fn test_values_from_json() {
        assert!(values_from_json(json!({"a": 1})).is_ok());
        assert!(values_from_json(json!([1, 2])).is_err());
    }
}
