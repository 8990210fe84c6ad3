//! Result cursors
//!
//! A [`ResultCursor`] wraps a forward-only native result set. Because the
//! native cursor cannot be rewound, "has rows" is answered by pulling the
//! first row at open time and keeping it as a one-row lookahead; every read
//! serves the lookahead before advancing the native cursor, so the probed
//! row is delivered exactly once.

use crate::error::{BridgeError, BridgeResult};
use crate::marshal::{describe_columns, to_cells};
use crate::native::{NativeResult, NativeResultSet};
use parking_lot::Mutex;
use sqlbridge_client::protocol::{row_size_bound, CellValue, ColumnDescriptor, Handle};

struct CursorState {
    result_set: Box<dyn NativeResultSet>,
    lookahead: Option<Vec<CellValue>>,
    closed: bool,
}

impl CursorState {
    fn next(&mut self) -> NativeResult<Option<Vec<CellValue>>> {
        if let Some(row) = self.lookahead.take() {
            return Ok(Some(row));
        }
        if self.closed {
            return Ok(None);
        }
        Ok(self.result_set.next_row()?.map(to_cells))
    }

    fn refill(&mut self) -> NativeResult<bool> {
        if self.lookahead.is_none() && !self.closed {
            self.lookahead = self.result_set.next_row()?.map(to_cells);
        }
        Ok(self.lookahead.is_some())
    }
}

pub struct ResultCursor {
    statement_id: Handle,
    columns: Vec<ColumnDescriptor>,
    has_rows: bool,
    state: Mutex<CursorState>,
}

impl ResultCursor {
    /// Describe the result set and probe it for a first row
    pub fn open(
        statement_id: Handle,
        mut result_set: Box<dyn NativeResultSet>,
    ) -> NativeResult<Self> {
        let columns = describe_columns(result_set.columns());
        let lookahead = result_set.next_row()?.map(to_cells);
        let has_rows = lookahead.is_some();

        Ok(Self {
            statement_id,
            columns,
            has_rows,
            state: Mutex::new(CursorState {
                result_set,
                lookahead,
                closed: false,
            }),
        })
    }

    /// Handle of the statement that produced this cursor
    pub fn statement_id(&self) -> Handle {
        self.statement_id
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Whether the result held at least one row before anything was read
    pub fn has_rows(&self) -> bool {
        self.has_rows
    }

    pub fn next_row(&self) -> NativeResult<Option<Vec<CellValue>>> {
        self.state.lock().next()
    }

    /// Read up to `max_rows` rows whose encoded size stays within `max_bytes`.
    ///
    /// A row that would overflow the budget is kept for the next read, so the
    /// flag still tells exactly whether more rows remain. A single row larger
    /// than the whole budget is an error and stays unread.
    pub fn fetch(
        &self,
        max_rows: usize,
        max_bytes: usize,
    ) -> BridgeResult<(Vec<Vec<CellValue>>, bool)> {
        let mut state = self.state.lock();
        let mut rows = Vec::with_capacity(max_rows.min(1024));
        let mut used = 0;

        while rows.len() < max_rows {
            let row = match state.next()? {
                Some(row) => row,
                None => return Ok((rows, false)),
            };

            let size = row_size_bound(&row);
            if used + size > max_bytes {
                state.lookahead = Some(row);
                if rows.is_empty() {
                    return Err(BridgeError::invalid_operation(format!(
                        "row of {} bytes does not fit in a {} byte response",
                        size, max_bytes
                    )));
                }
                return Ok((rows, true));
            }
            used += size;
            rows.push(row);
        }

        let has_more = state.refill()?;
        Ok((rows, has_more))
    }

    pub fn close(&self) -> NativeResult<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        state.lookahead = None;
        state.result_set.close()
    }
}
