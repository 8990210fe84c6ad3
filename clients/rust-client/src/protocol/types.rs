use serde::{Deserialize, Serialize};

/// Opaque identifier of a server-side object (connection, statement, result set)
pub type Handle = u64;

/// Fetch size sentinel asking the server to use the statement's max rows
pub const FETCH_SIZE_DEFAULT: i32 = -1;

/// Declared logical type of a statement parameter.
///
/// Tags the server does not recognize deserialize to `Unknown` so the request
/// reaches the statement layer and is rejected there with a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParameterType {
    Int,
    Long,
    Short,
    Float,
    Double,
    String,
    Boolean,
    Time,
    Date,
    #[serde(other)]
    Unknown,
}

impl ParameterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterType::Int => "INT",
            ParameterType::Long => "LONG",
            ParameterType::Short => "SHORT",
            ParameterType::Float => "FLOAT",
            ParameterType::Double => "DOUBLE",
            ParameterType::String => "STRING",
            ParameterType::Boolean => "BOOLEAN",
            ParameterType::Time => "TIME",
            ParameterType::Date => "DATE",
            ParameterType::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for ParameterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SQL type of a result column as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlType {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Numeric,
    Text,
    Date,
    Time,
    Timestamp,
    Blob,
    Null,
    Other,
}

/// Description of one result column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Zero-based position in the row
    pub ordinal: u32,
    pub name: String,
    /// Declared type name as reported by the database, empty when undeclared
    pub type_name: String,
    pub sql_type: SqlType,
}

/// One cell of a result row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(#[serde(with = "serde_bytes")] Vec<u8>),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Real(v) => Some(*v),
            CellValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Upper bound of the bytes this cell takes in an encoded frame
    pub fn encoded_size_bound(&self) -> usize {
        // variant tag, map and length headers
        const TAGGED: usize = 24;
        match self {
            CellValue::Text(v) => TAGGED + v.len(),
            CellValue::Blob(v) => TAGGED + v.len(),
            CellValue::Null | CellValue::Integer(_) | CellValue::Real(_) => TAGGED,
        }
    }
}

/// Upper bound of the bytes a row takes in an encoded frame
pub fn row_size_bound(row: &[CellValue]) -> usize {
    5 + row.iter().map(CellValue::encoded_size_bound).sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_type_tags() {
        let encoded = rmp_serde::to_vec(&ParameterType::Date).unwrap();
        let decoded: ParameterType = rmp_serde::from_slice(&encoded).unwrap();
        assert_eq!(decoded, ParameterType::Date);
        assert_eq!(ParameterType::Boolean.to_string(), "BOOLEAN");
    }

    #[test]
    fn test_unrecognized_parameter_type_is_unknown() {
        let encoded = rmp_serde::to_vec("DECIMAL").unwrap();
        let decoded: ParameterType = rmp_serde::from_slice(&encoded).unwrap();
        assert_eq!(decoded, ParameterType::Unknown);
    }

    #[test]
    fn test_cell_value_accessors() {
        assert_eq!(CellValue::Integer(7).as_i64(), Some(7));
        assert_eq!(CellValue::Integer(7).as_f64(), Some(7.0));
        assert_eq!(CellValue::Text("a".to_string()).as_str(), Some("a"));
        assert!(CellValue::Null.is_null());
        assert_eq!(CellValue::Blob(vec![1]).as_i64(), None);
    }

    #[test]
    fn test_size_bound_covers_encoding() {
        let row = vec![
            CellValue::Null,
            CellValue::Integer(i64::MIN),
            CellValue::Real(1.5),
            CellValue::Text("x".repeat(300)),
            CellValue::Blob(vec![7; 70_000]),
        ];
        let encoded = rmp_serde::to_vec_named(&row).unwrap();
        assert!(encoded.len() <= row_size_bound(&row));
        for cell in &row {
            let encoded = rmp_serde::to_vec_named(cell).unwrap();
            assert!(encoded.len() <= cell.encoded_size_bound(), "{:?}", cell);
        }
    }
}
