use super::command::Command;
use super::error::DriverError;
use super::response::Response;
use serde::{Deserialize, Serialize};

pub const DRIVER_MAGIC: &[u8] = b"sqlbridge-v1\0";
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Row bytes a single `Rows` response may carry, leaving room for its envelope
pub const MAX_ROWS_PAYLOAD: usize = MAX_MESSAGE_SIZE - 1024;

pub fn encode_command(cmd: &Command) -> Result<Vec<u8>, DriverError> {
    encode_message(cmd)
}

pub fn encode_response(resp: &Response) -> Result<Vec<u8>, DriverError> {
    encode_message(resp)
}

/// Serialize a message and prefix it with its big-endian length
pub fn encode_message<T: Serialize>(msg: &T) -> Result<Vec<u8>, DriverError> {
    let payload = rmp_serde::to_vec_named(msg)
        .map_err(|e| DriverError::ProtocolError(format!("Serialization failed: {}", e)))?;

    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(DriverError::MessageTooLarge);
    }

    let mut buf = Vec::with_capacity(4 + payload.len());
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

pub fn decode_message<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, DriverError> {
    rmp_serde::from_slice(data)
        .map_err(|e| DriverError::ProtocolError(format!("Deserialization failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::row_size_bound;
    use crate::protocol::{CellValue, ColumnDescriptor, ParameterType, SqlType};

    fn frame_payload(frame: &[u8]) -> &[u8] {
        let len = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
        assert_eq!(len, frame.len() - 4);
        &frame[4..]
    }

    #[test]
    fn test_set_parameter_frame() {
        let cmd = Command::SetParameter {
            statement_id: 3,
            index: 1,
            parameter_type: ParameterType::Int,
            value: "42".to_string(),
        };
        let frame = encode_command(&cmd).unwrap();
        let decoded: Command = decode_message(frame_payload(&frame)).unwrap();
        assert_eq!(decoded, cmd);
    }

    #[test]
    fn test_execute_without_sql_defaults_to_none() {
        let cmd = Command::ExecuteStatement {
            statement_id: 9,
            fetch_size: -1,
            sql: None,
        };
        let frame = encode_command(&cmd).unwrap();
        match decode_message::<Command>(frame_payload(&frame)).unwrap() {
            Command::ExecuteStatement {
                statement_id,
                fetch_size,
                sql,
            } => {
                assert_eq!(statement_id, 9);
                assert_eq!(fetch_size, -1);
                assert!(sql.is_none());
            }
            other => panic!("Unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_result_set_response_with_blob_rows() {
        let resp = Response::Rows {
            rows: vec![vec![
                CellValue::Integer(1),
                CellValue::Blob(vec![0xde, 0xad]),
                CellValue::Null,
            ]],
            has_more: false,
        };
        let frame = encode_response(&resp).unwrap();
        let decoded: Response = decode_message(frame_payload(&frame)).unwrap();
        assert_eq!(decoded, resp);

        let resp = Response::ResultSet {
            result_set_id: 2,
            has_rows: true,
            columns: vec![ColumnDescriptor {
                ordinal: 0,
                name: "id".to_string(),
                type_name: "INTEGER".to_string(),
                sql_type: SqlType::Integer,
            }],
        };
        let frame = encode_response(&resp).unwrap();
        let decoded: Response = decode_message(frame_payload(&frame)).unwrap();
        assert_eq!(decoded, resp);
    }

    #[test]
    fn test_rows_within_payload_limit_encode() {
        let row = vec![CellValue::Blob(vec![0; 4 * 1024 * 1024])];
        let rows: Vec<Vec<CellValue>> = vec![row.clone(); 3];
        let total: usize = rows.iter().map(|r| row_size_bound(r)).sum();
        assert!(total <= MAX_ROWS_PAYLOAD);

        let resp = Response::Rows {
            rows,
            has_more: true,
        };
        assert!(encode_response(&resp).is_ok());

        let resp = Response::Rows {
            rows: vec![row; 5],
            has_more: false,
        };
        assert_eq!(encode_response(&resp).unwrap_err(), DriverError::MessageTooLarge);
    }

    #[test]
    fn test_decode_garbage_is_protocol_error() {
        let err = decode_message::<Command>(&[0xc1, 0x00, 0x13]).unwrap_err();
        assert!(matches!(err, DriverError::ProtocolError(_)));
    }
}
