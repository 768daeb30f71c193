use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use duckdb::params;
use tracedeck_core::error::{Result, TracedeckError};

use crate::Store;

impl Store {
    pub fn run_retention(&self, ttl: Duration, max_bytes: u64) -> Result<()> {
        self.prune_ttl(ttl)?;
        self.prune_size(max_bytes)?;
        Ok(())
    }

    // Expired rows are the expected source of stale cursors; pagination
    // recovers from them by restarting at page 1.
    pub fn prune_ttl(&self, ttl: Duration) -> Result<()> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(ttl)
                .map_err(|e| TracedeckError::Internal(format!("ttl conversion failed: {e}")))?;
        let cutoff = cutoff.to_rfc3339();

        let conn = self.conn();
        conn.execute(
            "DELETE FROM spans WHERE trace_id IN (
               SELECT trace_id FROM spans WHERE depth = 0 AND start_ts < ?
             )",
            params![cutoff.clone()],
        )
        .map_err(|e| TracedeckError::Store(format!("retention spans delete failed: {e}")))?;
        conn.execute(
            "DELETE FROM alerts WHERE created_at < ?",
            params![cutoff.clone()],
        )
        .map_err(|e| TracedeckError::Store(format!("retention alerts delete failed: {e}")))?;
        conn.execute(
            "DELETE FROM evaluation_records WHERE created_at < ?",
            params![cutoff.clone()],
        )
        .map_err(|e| TracedeckError::Store(format!("retention evaluations delete failed: {e}")))?;
        conn.execute(
            "DELETE FROM evaluation_workflows WHERE created_at < ?",
            params![cutoff],
        )
        .map_err(|e| TracedeckError::Store(format!("retention workflows delete failed: {e}")))?;

        Ok(())
    }

    pub fn prune_size(&self, max_bytes: u64) -> Result<()> {
        let status = self.status()?;
        if status.db_path == ":memory:" {
            return Ok(());
        }

        let path = Path::new(&status.db_path);
        let size = fs::metadata(path)
            .map_err(|e| TracedeckError::Io(format!("failed to stat db: {e}")))?
            .len();
        if size <= max_bytes {
            return Ok(());
        }

        let conn = self.conn();
        conn.execute(
            "DELETE FROM spans WHERE trace_id IN (
               SELECT trace_id FROM spans WHERE depth = 0 ORDER BY start_ts ASC LIMIT 1000
             )",
            [],
        )
        .map_err(|e| TracedeckError::Store(format!("size prune spans failed: {e}")))?;
        conn.execute(
            "DELETE FROM alerts WHERE id IN (
               SELECT id FROM alerts ORDER BY created_at ASC LIMIT 10000
             )",
            [],
        )
        .map_err(|e| TracedeckError::Store(format!("size prune alerts failed: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;
    use tracedeck_core::model::record::AlertRecord;
    use tracedeck_core::model::span::{STATUS_OK, SpanRecord};

    use crate::Store;

    #[test]
    fn ttl_prunes_expired_traces_and_alerts() {
        let store = Store::open_in_memory().unwrap();
        let old = chrono::Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();

        store
            .insert_spans(&[SpanRecord {
                trace_id: "stale-trace".into(),
                span_id: "root".into(),
                parent_span_id: None,
                service: "api-gateway".into(),
                name: "GET /v1/traces".into(),
                start_ts: old,
                end_ts: Some(old + chrono::Duration::milliseconds(100)),
                status: STATUS_OK.into(),
                attrs_json: "{}".into(),
                events_json: "[]".into(),
                depth: 0,
                path: vec!["root".into()],
                root_span_id: "root".into(),
                span_order: 0,
            }])
            .unwrap();
        store
            .insert_alerts(&[AlertRecord {
                id: 1,
                created_at: old,
                entity: "churn-model".into(),
                drift_type: "psi".into(),
                active: true,
            }])
            .unwrap();

        store.prune_ttl(Duration::from_secs(60)).unwrap();
        let status = store.status().unwrap();
        assert_eq!(status.spans_count, 0);
        assert_eq!(status.alerts_count, 0);
    }
}
