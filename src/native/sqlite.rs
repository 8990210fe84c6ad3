//! SQLite-backed native driver
//!
//! URLs: `sqlite::memory:` for a private in-memory database, `sqlite:<path>`
//! for a file. Recognized connection properties:
//! - `max_rows`: default row limit for new statements (0 = unlimited)
//! - `busy_timeout_ms`: how long to wait on a locked database
//! - `read_only`: open the file read-only
//!
//! Result sets are read to completion while the connection lock is held and
//! then streamed from memory, so the connection is free for other statements
//! as soon as `execute` returns.

use super::{
    NativeColumn, NativeConnection, NativeDriver, NativeError, NativeResult, NativeResultSet,
    NativeValue, ParamValue, PlainStatement, PreparedStatement, StatementControl,
};
use parking_lot::Mutex;
use rusqlite::types::{ToSqlOutput, Value as SqlValue};
use rusqlite::{Connection, ErrorCode, InterruptHandle, OpenFlags, ToSql};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const URL_PREFIX: &str = "sqlite:";
const MEMORY_TARGET: &str = ":memory:";

impl From<rusqlite::Error> for NativeError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::OperationInterrupted => {
                NativeError::Cancelled
            }
            _ => NativeError::Database(err.to_string()),
        }
    }
}

impl ToSql for ParamValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            ParamValue::Int(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            ParamValue::Long(v) => ToSqlOutput::Owned(SqlValue::Integer(*v)),
            ParamValue::Short(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            ParamValue::Float(v) => ToSqlOutput::Owned(SqlValue::Real(f64::from(*v))),
            ParamValue::Double(v) => ToSqlOutput::Owned(SqlValue::Real(*v)),
            ParamValue::String(v) => ToSqlOutput::Owned(SqlValue::Text(v.clone())),
            ParamValue::Boolean(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            ParamValue::Time(v) => return v.to_sql(),
            ParamValue::Date(v) => return v.to_sql(),
        })
    }
}

fn native_value(value: SqlValue) -> NativeValue {
    match value {
        SqlValue::Null => NativeValue::Null,
        SqlValue::Integer(v) => NativeValue::Integer(v),
        SqlValue::Real(v) => NativeValue::Real(v),
        SqlValue::Text(v) => NativeValue::Text(v),
        SqlValue::Blob(v) => NativeValue::Blob(v),
    }
}

fn parse_property<T: std::str::FromStr>(
    properties: &HashMap<String, String>,
    key: &str,
) -> NativeResult<Option<T>> {
    match properties.get(key) {
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            NativeError::InvalidArgument(format!("property '{}' has invalid value '{}'", key, raw))
        }),
        None => Ok(None),
    }
}

/// Driver for `sqlite:` URLs
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDriver;

impl SqliteDriver {
    pub fn new() -> Self {
        Self
    }
}

impl NativeDriver for SqliteDriver {
    fn accepts(&self, url: &str) -> bool {
        url.starts_with(URL_PREFIX)
    }

    fn connect(
        &self,
        url: &str,
        properties: &HashMap<String, String>,
    ) -> NativeResult<Arc<dyn NativeConnection>> {
        let target = url
            .strip_prefix(URL_PREFIX)
            .ok_or_else(|| NativeError::UnsupportedUrl(url.to_string()))?;

        let read_only = parse_property::<bool>(properties, "read_only")?.unwrap_or(false);
        let max_rows = parse_property::<i32>(properties, "max_rows")?.unwrap_or(0);
        if max_rows < 0 {
            return Err(NativeError::InvalidArgument(format!(
                "max_rows must be >= 0, got {}",
                max_rows
            )));
        }

        let conn = if target.is_empty() || target == MEMORY_TARGET {
            Connection::open_in_memory()?
        } else {
            let mut flags = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
            if read_only {
                flags |= OpenFlags::SQLITE_OPEN_READ_ONLY;
            } else {
                flags |= OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
            }
            Connection::open_with_flags(target, flags)?
        };

        if let Some(ms) = parse_property::<u64>(properties, "busy_timeout_ms")? {
            conn.busy_timeout(Duration::from_millis(ms))?;
        }

        tracing::debug!("Opened SQLite connection to '{}'", target);
        Ok(Arc::new(SqliteConnection::new(conn, max_rows)))
    }
}

/// Connection state shared by the connection and every statement created on it
struct SqliteSession {
    conn: Mutex<Option<Connection>>,
    interrupt: InterruptHandle,
}

impl SqliteSession {
    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> NativeResult<T>) -> NativeResult<T> {
        let guard = self.conn.lock();
        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(NativeError::Closed("connection")),
        }
    }
}

pub struct SqliteConnection {
    session: Arc<SqliteSession>,
    default_max_rows: i32,
}

impl SqliteConnection {
    fn new(conn: Connection, default_max_rows: i32) -> Self {
        let interrupt = conn.get_interrupt_handle();
        Self {
            session: Arc::new(SqliteSession {
                conn: Mutex::new(Some(conn)),
                interrupt,
            }),
            default_max_rows,
        }
    }

    fn new_core(&self) -> StatementCore {
        StatementCore {
            session: self.session.clone(),
            state: Mutex::new(StatementState {
                fetch_size: 0,
                max_rows: self.default_max_rows,
                update_count: -1,
                result: None,
            }),
            closed: AtomicBool::new(false),
            executing: AtomicBool::new(false),
        }
    }
}

impl NativeConnection for SqliteConnection {
    fn prepare_statement(&self, sql: &str) -> NativeResult<Arc<dyn PreparedStatement>> {
        let parameter_count = self
            .session
            .with_conn(|conn| Ok(conn.prepare_cached(sql)?.parameter_count()))?;

        Ok(Arc::new(SqlitePreparedStatement {
            core: self.new_core(),
            sql: sql.to_string(),
            params: Mutex::new(vec![None; parameter_count]),
        }))
    }

    fn create_statement(&self) -> NativeResult<Arc<dyn PlainStatement>> {
        self.session.with_conn(|_| Ok(()))?;
        Ok(Arc::new(SqlitePlainStatement {
            core: self.new_core(),
        }))
    }

    fn close(&self) -> NativeResult<()> {
        let conn = self.session.conn.lock().take();
        match conn {
            Some(conn) => conn.close().map_err(|(_, e)| NativeError::from(e)),
            None => Ok(()),
        }
    }

    fn is_closed(&self) -> bool {
        self.session.conn.lock().is_none()
    }
}

struct StatementState {
    fetch_size: i32,
    max_rows: i32,
    update_count: i64,
    result: Option<Box<dyn NativeResultSet>>,
}

enum Execution {
    Rows(SqliteResultSet),
    Affected(i64),
}

struct StatementCore {
    session: Arc<SqliteSession>,
    state: Mutex<StatementState>,
    closed: AtomicBool,
    /// Set while this statement holds the connection lock
    executing: AtomicBool,
}

/// Clears the executing flag when a run leaves the connection
struct Running<'a>(&'a AtomicBool);

impl<'a> Running<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for Running<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl StatementCore {
    fn ensure_open(&self) -> NativeResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(NativeError::Closed("statement"));
        }
        Ok(())
    }

    fn run(&self, sql: &str, params: &[Option<ParamValue>]) -> NativeResult<bool> {
        self.ensure_open()?;

        let max_rows = {
            let mut state = self.state.lock();
            state.result = None;
            state.update_count = -1;
            state.max_rows
        };

        let execution = self.session.with_conn(|conn| {
            let _running = Running::enter(&self.executing);
            let mut stmt = conn.prepare_cached(sql)?;
            for (i, param) in params.iter().enumerate() {
                if let Some(value) = param {
                    stmt.raw_bind_parameter(i + 1, value)?;
                }
            }

            if stmt.column_count() == 0 {
                let changed = stmt.raw_execute()?;
                return Ok(Execution::Affected(changed as i64));
            }

            let columns: Vec<NativeColumn> = stmt
                .columns()
                .iter()
                .map(|c| NativeColumn::new(c.name(), c.decl_type()))
                .collect();
            let width = columns.len();
            let limit = if max_rows > 0 { Some(max_rows as usize) } else { None };

            let mut rows = VecDeque::new();
            let mut cursor = stmt.raw_query();
            while let Some(row) = cursor.next()? {
                if limit.is_some_and(|l| rows.len() >= l) {
                    break;
                }
                let mut values = Vec::with_capacity(width);
                for i in 0..width {
                    values.push(native_value(row.get::<_, SqlValue>(i)?));
                }
                rows.push_back(values);
            }

            Ok(Execution::Rows(SqliteResultSet::new(columns, rows)))
        })?;

        let mut state = self.state.lock();
        match execution {
            Execution::Affected(count) => {
                state.update_count = count;
                Ok(false)
            }
            Execution::Rows(result) => {
                state.result = Some(Box::new(result));
                Ok(true)
            }
        }
    }
}

impl StatementControl for StatementCore {
    fn set_fetch_size(&self, rows: i32) -> NativeResult<()> {
        self.ensure_open()?;
        if rows < 0 {
            return Err(NativeError::InvalidArgument(format!(
                "fetch size must be >= 0, got {}",
                rows
            )));
        }
        self.state.lock().fetch_size = rows;
        Ok(())
    }

    fn fetch_size(&self) -> i32 {
        self.state.lock().fetch_size
    }

    fn set_max_rows(&self, rows: i32) -> NativeResult<()> {
        self.ensure_open()?;
        if rows < 0 {
            return Err(NativeError::InvalidArgument(format!(
                "max rows must be >= 0, got {}",
                rows
            )));
        }
        self.state.lock().max_rows = rows;
        Ok(())
    }

    fn max_rows(&self) -> i32 {
        self.state.lock().max_rows
    }

    fn update_count(&self) -> i64 {
        self.state.lock().update_count
    }

    fn take_result_set(&self) -> Option<Box<dyn NativeResultSet>> {
        self.state.lock().result.take()
    }

    fn cancel(&self) -> NativeResult<()> {
        self.ensure_open()?;
        // The interrupt handle is per connection; only fire it for our own run
        if self.executing.load(Ordering::Acquire) {
            self.session.interrupt.interrupt();
        } else {
            tracing::debug!("Cancel requested on an idle statement");
        }
        Ok(())
    }

    fn close(&self) -> NativeResult<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.state.lock().result = None;
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

macro_rules! delegate_control {
    ($ty:ty) => {
        impl StatementControl for $ty {
            fn set_fetch_size(&self, rows: i32) -> NativeResult<()> {
                self.core.set_fetch_size(rows)
            }
            fn fetch_size(&self) -> i32 {
                self.core.fetch_size()
            }
            fn set_max_rows(&self, rows: i32) -> NativeResult<()> {
                self.core.set_max_rows(rows)
            }
            fn max_rows(&self) -> i32 {
                self.core.max_rows()
            }
            fn update_count(&self) -> i64 {
                self.core.update_count()
            }
            fn take_result_set(&self) -> Option<Box<dyn NativeResultSet>> {
                self.core.take_result_set()
            }
            fn cancel(&self) -> NativeResult<()> {
                self.core.cancel()
            }
            fn close(&self) -> NativeResult<()> {
                self.core.close()
            }
            fn is_closed(&self) -> bool {
                self.core.is_closed()
            }
        }
    };
}

pub struct SqlitePlainStatement {
    core: StatementCore,
}

delegate_control!(SqlitePlainStatement);

impl PlainStatement for SqlitePlainStatement {
    fn execute(&self, sql: &str) -> NativeResult<bool> {
        self.core.run(sql, &[])
    }

    fn as_control(&self) -> &dyn StatementControl {
        self
    }
}

pub struct SqlitePreparedStatement {
    core: StatementCore,
    sql: String,
    params: Mutex<Vec<Option<ParamValue>>>,
}

delegate_control!(SqlitePreparedStatement);

impl PreparedStatement for SqlitePreparedStatement {
    fn execute(&self) -> NativeResult<bool> {
        let params = self.params.lock().clone();
        self.core.run(&self.sql, &params)
    }

    fn bind(&self, index: u32, value: ParamValue) -> NativeResult<()> {
        self.core.ensure_open()?;
        let mut params = self.params.lock();
        let count = params.len();
        let slot = (index as usize)
            .checked_sub(1)
            .and_then(|i| params.get_mut(i))
            .ok_or_else(|| {
                NativeError::InvalidArgument(format!(
                    "parameter index {} out of range (statement has {} parameters)",
                    index, count
                ))
            })?;
        *slot = Some(value);
        Ok(())
    }

    fn parameter_count(&self) -> usize {
        self.params.lock().len()
    }

    fn as_control(&self) -> &dyn StatementControl {
        self
    }
}

/// Rows of one execution, consumed front to back
pub struct SqliteResultSet {
    columns: Vec<NativeColumn>,
    rows: VecDeque<Vec<NativeValue>>,
    closed: bool,
}

impl SqliteResultSet {
    fn new(columns: Vec<NativeColumn>, rows: VecDeque<Vec<NativeValue>>) -> Self {
        Self {
            columns,
            rows,
            closed: false,
        }
    }
}

impl NativeResultSet for SqliteResultSet {
    fn columns(&self) -> &[NativeColumn] {
        &self.columns
    }

    fn next_row(&mut self) -> NativeResult<Option<Vec<NativeValue>>> {
        if self.closed {
            return Err(NativeError::Closed("result set"));
        }
        Ok(self.rows.pop_front())
    }

    fn close(&mut self) -> NativeResult<()> {
        self.closed = true;
        self.rows.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn memory_connection() -> Arc<dyn NativeConnection> {
        SqliteDriver::new()
            .connect("sqlite::memory:", &HashMap::new())
            .unwrap()
    }

    #[test]
    fn test_driver_accepts_sqlite_urls_only() {
        let driver = SqliteDriver::new();
        assert!(driver.accepts("sqlite::memory:"));
        assert!(driver.accepts("sqlite:/tmp/app.db"));
        assert!(!driver.accepts("postgres://localhost/db"));
    }

    #[test]
    fn test_plain_statement_classifies_outcomes() {
        let conn = memory_connection();
        let stmt = conn.create_statement().unwrap();

        assert!(!stmt.execute("CREATE TABLE t (id INTEGER, name TEXT)").unwrap());
        assert!(!stmt.execute("INSERT INTO t VALUES (1, 'a'), (2, 'b')").unwrap());
        assert_eq!(stmt.update_count(), 2);

        assert!(stmt.execute("SELECT id, name FROM t ORDER BY id").unwrap());
        assert_eq!(stmt.update_count(), -1);
        let mut rs = stmt.take_result_set().unwrap();
        assert_eq!(rs.columns()[0], NativeColumn::new("id", Some("INTEGER")));
        assert_eq!(
            rs.next_row().unwrap(),
            Some(vec![NativeValue::Integer(1), NativeValue::Text("a".to_string())])
        );
        assert!(rs.next_row().unwrap().is_some());
        assert!(rs.next_row().unwrap().is_none());
        assert!(stmt.take_result_set().is_none());
    }

    #[test]
    fn test_prepared_statement_binds_positionally() {
        let conn = memory_connection();
        let stmt = conn.prepare_statement("SELECT ?1 + 1, ?2").unwrap();
        assert_eq!(stmt.parameter_count(), 2);

        stmt.bind(1, ParamValue::Int(41)).unwrap();
        stmt.bind(2, ParamValue::Date(NaiveDate::from_ymd_opt(2023, 1, 15).unwrap()))
            .unwrap();
        assert!(stmt.execute().unwrap());

        let mut rs = stmt.take_result_set().unwrap();
        assert_eq!(
            rs.next_row().unwrap(),
            Some(vec![
                NativeValue::Integer(42),
                NativeValue::Text("2023-01-15".to_string())
            ])
        );
    }

    #[test]
    fn test_bind_rejects_out_of_range_index() {
        let conn = memory_connection();
        let stmt = conn.prepare_statement("SELECT ?").unwrap();
        assert!(matches!(
            stmt.bind(0, ParamValue::Int(1)),
            Err(NativeError::InvalidArgument(_))
        ));
        assert!(matches!(
            stmt.bind(2, ParamValue::Int(1)),
            Err(NativeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_prepare_reports_syntax_errors() {
        let conn = memory_connection();
        let err = conn.prepare_statement("SELEC 1").err().unwrap();
        assert!(matches!(err, NativeError::Database(msg) if msg.contains("syntax")));
    }

    #[test]
    fn test_max_rows_limits_result() {
        let conn = memory_connection();
        let stmt = conn.create_statement().unwrap();
        stmt.set_max_rows(2).unwrap();
        assert!(stmt
            .execute("WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < 10) SELECT x FROM n")
            .unwrap());
        let mut rs = stmt.take_result_set().unwrap();
        let mut count = 0;
        while rs.next_row().unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 2);
    }

    #[test]
    fn test_negative_fetch_size_rejected() {
        let conn = memory_connection();
        let stmt = conn.create_statement().unwrap();
        assert!(stmt.set_fetch_size(-5).is_err());
        stmt.set_fetch_size(50).unwrap();
        assert_eq!(stmt.fetch_size(), 50);
    }

    #[test]
    fn test_cancel_when_idle_is_noop() {
        let conn = memory_connection();
        let stmt = conn.create_statement().unwrap();
        stmt.cancel().unwrap();
        assert!(stmt.execute("SELECT 1").unwrap());
    }

    #[test]
    fn test_cancel_does_not_reach_sibling_statement() {
        let conn = memory_connection();
        let busy = conn.create_statement().unwrap();
        let idle = conn.create_statement().unwrap();

        let worker = {
            let busy = busy.clone();
            std::thread::spawn(move || {
                busy.execute(
                    "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n) SELECT COUNT(*) FROM n",
                )
            })
        };

        std::thread::sleep(Duration::from_millis(100));
        idle.cancel().unwrap();
        std::thread::sleep(Duration::from_millis(200));
        assert!(!worker.is_finished());

        while !worker.is_finished() {
            busy.cancel().unwrap();
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(worker.join().unwrap(), Err(NativeError::Cancelled));
        assert!(busy.execute("SELECT 1").unwrap());
    }

    #[test]
    fn test_closed_connection_fails_statements() {
        let conn = memory_connection();
        let stmt = conn.create_statement().unwrap();
        conn.close().unwrap();
        assert!(conn.is_closed());
        assert_eq!(
            stmt.execute("SELECT 1").unwrap_err(),
            NativeError::Closed("connection")
        );
    }

    #[test]
    fn test_closed_statement_rejects_execution() {
        let conn = memory_connection();
        let stmt = conn.create_statement().unwrap();
        stmt.close().unwrap();
        stmt.close().unwrap();
        assert_eq!(
            stmt.execute("SELECT 1").unwrap_err(),
            NativeError::Closed("statement")
        );
    }
}
