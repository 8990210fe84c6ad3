//! Textual parameter values to typed native parameters

use crate::error::{BridgeError, BridgeResult};
use crate::native::ParamValue;
use chrono::{NaiveDate, NaiveTime};
use sqlbridge_client::protocol::ParameterType;
use std::fmt::Display;
use std::str::FromStr;

pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

fn marshal_error(
    index: u32,
    parameter_type: ParameterType,
    value: &str,
    reason: impl Display,
) -> BridgeError {
    BridgeError::Marshal {
        index,
        parameter_type,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse<T>(index: u32, parameter_type: ParameterType, value: &str, text: &str) -> BridgeResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    text.parse::<T>()
        .map_err(|e| marshal_error(index, parameter_type, value, e))
}

/// Convert `value` to the native parameter declared by `parameter_type`.
///
/// Integers accept an optional sign and no surrounding whitespace; floating
/// point values are trimmed first. BOOLEAN never fails: only a
/// case-insensitive `"true"` is true. TIME is `HH:MM:SS`, DATE is `YYYY-MM-DD`.
pub fn to_param_value(
    index: u32,
    parameter_type: ParameterType,
    value: &str,
) -> BridgeResult<ParamValue> {
    let param = match parameter_type {
        ParameterType::Int => ParamValue::Int(parse(index, parameter_type, value, value)?),
        ParameterType::Long => ParamValue::Long(parse(index, parameter_type, value, value)?),
        ParameterType::Short => ParamValue::Short(parse(index, parameter_type, value, value)?),
        ParameterType::Float => {
            ParamValue::Float(parse(index, parameter_type, value, value.trim())?)
        }
        ParameterType::Double => {
            ParamValue::Double(parse(index, parameter_type, value, value.trim())?)
        }
        ParameterType::String => ParamValue::String(value.to_string()),
        ParameterType::Boolean => ParamValue::Boolean(value.eq_ignore_ascii_case("true")),
        ParameterType::Time => ParamValue::Time(
            NaiveTime::parse_from_str(value, TIME_FORMAT)
                .map_err(|e| marshal_error(index, parameter_type, value, e))?,
        ),
        ParameterType::Date => ParamValue::Date(
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .map_err(|e| marshal_error(index, parameter_type, value, e))?,
        ),
        ParameterType::Unknown => {
            return Err(BridgeError::invalid_operation(format!(
                "unsupported parameter type for parameter {}",
                index
            )))
        }
    };
    Ok(param)
}
