//! Native result metadata and values to wire descriptors and cells

use crate::native::{NativeColumn, NativeValue};
use sqlbridge_client::protocol::{CellValue, ColumnDescriptor, SqlType};

/// Map a declared column type name to its SQL type.
///
/// Follows SQLite's affinity rules for the generic cases and recognizes the
/// common date, time and boolean spellings before them.
pub fn sql_type_for(declared_type: Option<&str>) -> SqlType {
    let declared = match declared_type.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_ascii_uppercase(),
        _ => return SqlType::Other,
    };

    if declared.contains("BOOL") {
        SqlType::Boolean
    } else if declared.contains("TIMESTAMP") || declared.contains("DATETIME") {
        SqlType::Timestamp
    } else if declared.starts_with("DATE") {
        SqlType::Date
    } else if declared.starts_with("TIME") {
        SqlType::Time
    } else if declared.contains("BIGINT") {
        SqlType::BigInt
    } else if declared.contains("SMALLINT") || declared.contains("TINYINT") {
        SqlType::SmallInt
    } else if declared.contains("INT") {
        SqlType::Integer
    } else if declared.contains("CHAR") || declared.contains("CLOB") || declared.contains("TEXT") {
        SqlType::Text
    } else if declared.contains("BLOB") {
        SqlType::Blob
    } else if declared.contains("DOUB") {
        SqlType::Double
    } else if declared.contains("REAL") || declared.contains("FLOA") {
        SqlType::Real
    } else if declared == "NULL" {
        SqlType::Null
    } else {
        SqlType::Numeric
    }
}

pub fn describe_columns(columns: &[NativeColumn]) -> Vec<ColumnDescriptor> {
    columns
        .iter()
        .enumerate()
        .map(|(ordinal, column)| ColumnDescriptor {
            ordinal: ordinal as u32,
            name: column.name.clone(),
            type_name: column.declared_type.clone().unwrap_or_default(),
            sql_type: sql_type_for(column.declared_type.as_deref()),
        })
        .collect()
}

pub fn to_cell(value: NativeValue) -> CellValue {
    match value {
        NativeValue::Null => CellValue::Null,
        NativeValue::Integer(v) => CellValue::Integer(v),
        NativeValue::Real(v) => CellValue::Real(v),
        NativeValue::Text(v) => CellValue::Text(v),
        NativeValue::Blob(v) => CellValue::Blob(v),
    }
}

pub fn to_cells(row: Vec<NativeValue>) -> Vec<CellValue> {
    row.into_iter().map(to_cell).collect()
}
