//! Result-entry formatting: `label1=value1; label2=value2`.

use gridsql_core::Row;

/// Render `row` in ascending column-index order, without a trailing separator.
pub fn format_row(row: &Row) -> String {
    row.entries()
        .map(|(label, value)| format!("{label}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use gridsql_core::{ResultMetadata, Value};

    fn row(labels: &[&str], values: Vec<Value>) -> Row {
        Row::new(Arc::new(ResultMetadata::new(labels.iter().copied())), values)
    }

    #[test]
    fn entries_are_joined_in_column_order() {
        let row = row(
            &["author", "retailCost", "quantityInStock"],
            vec![Value::from("Daisy Mae West"), Value::Double(34.99), Value::Int(10)],
        );
        assert_eq!(
            format_row(&row),
            "author=Daisy Mae West; retailCost=34.99; quantityInStock=10"
        );
    }

    #[test]
    fn value_rendering() {
        let row = row(
            &["a", "b", "c", "d"],
            vec![Value::Null, Value::Bool(true), Value::Double(20.0), Value::from("")],
        );
        assert_eq!(format_row(&row), "a=null; b=true; c=20.0; d=");
    }

    #[test]
    fn single_column_has_no_separator() {
        assert_eq!(format_row(&row(&["n"], vec![Value::Int(1)])), "n=1");
    }
}
