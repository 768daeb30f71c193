use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::Connection;
use tracedeck_core::error::{Result, TracedeckError};
use tracedeck_core::query::StatusResponse;

use crate::schema::SCHEMA_SQL;

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
    db_path: String,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| TracedeckError::Io(format!("failed to create db dir: {e}")))?;
        }

        let conn = Connection::open(path)
            .map_err(|e| TracedeckError::Store(format!("failed to open duckdb: {e}")))?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| TracedeckError::Store(format!("failed to initialize schema: {e}")))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: path.display().to_string(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| TracedeckError::Store(format!("failed to open in-memory db: {e}")))?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| TracedeckError::Store(format!("failed to initialize schema: {e}")))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: ":memory:".to_string(),
        })
    }

    pub(crate) fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("store mutex poisoned")
    }

    pub fn status(&self) -> Result<StatusResponse> {
        let conn = self.conn();

        let spans_count = scalar_usize(&conn, "SELECT COUNT(*) FROM spans")?;
        let traces_count = scalar_usize(&conn, "SELECT COUNT(DISTINCT trace_id) FROM spans")?;
        let alerts_count = scalar_usize(&conn, "SELECT COUNT(*) FROM alerts")?;
        let evaluations_count = scalar_usize(&conn, "SELECT COUNT(*) FROM evaluation_records")?;
        let workflows_count = scalar_usize(&conn, "SELECT COUNT(*) FROM evaluation_workflows")?;

        let oldest_ts = scalar_ts(&conn, "SELECT MIN(start_ts) FROM spans")?;
        let newest_ts = scalar_ts(&conn, "SELECT MAX(start_ts) FROM spans")?;

        let db_size_bytes = if self.db_path == ":memory:" {
            0
        } else {
            fs::metadata(&self.db_path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StatusResponse {
            db_path: self.db_path.clone(),
            db_size_bytes,
            traces_count,
            spans_count,
            alerts_count,
            evaluations_count,
            workflows_count,
            oldest_ts,
            newest_ts,
        })
    }
}

fn scalar_usize(conn: &Connection, sql: &str) -> Result<usize> {
    conn.query_row(sql, [], |row| row.get::<_, i64>(0))
        .map(|v| v as usize)
        .map_err(|e| TracedeckError::Store(format!("query failed: {e}")))
}

fn scalar_ts(conn: &Connection, sql: &str) -> Result<Option<DateTime<Utc>>> {
    conn.query_row(sql, [], |row| row.get::<_, Option<NaiveDateTime>>(0))
        .map(|opt| opt.map(|dt| dt.and_utc()))
        .map_err(|e| TracedeckError::Store(format!("query failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_store_initializes_empty() {
        let store = Store::open_in_memory().unwrap();
        let status = store.status().unwrap();
        assert_eq!(status.spans_count, 0);
        assert_eq!(status.traces_count, 0);
        assert_eq!(status.alerts_count, 0);
        assert_eq!(status.evaluations_count, 0);
        assert_eq!(status.workflows_count, 0);
        assert!(status.oldest_ts.is_none());
    }
}
