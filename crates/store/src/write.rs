use duckdb::params;
use tracedeck_core::error::{Result, TracedeckError};
use tracedeck_core::model::record::{AlertRecord, EvaluationRecord, WorkflowRecord};
use tracedeck_core::model::span::SpanRecord;

use crate::Store;

impl Store {
    pub fn insert_spans(&self, spans: &[SpanRecord]) -> Result<()> {
        if spans.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .map_err(|e| TracedeckError::Store(format!("begin tx failed: {e}")))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO spans
                     (trace_id, span_id, parent_span_id, service, name, start_ts, end_ts,
                      status, attrs_json, events_json, depth, path, root_span_id, span_order)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .map_err(|e| TracedeckError::Store(format!("prepare insert spans failed: {e}")))?;

            for span in spans {
                stmt.execute(params![
                    span.trace_id,
                    span.span_id,
                    span.parent_span_id,
                    span.service,
                    span.name,
                    span.start_ts.to_rfc3339(),
                    span.end_ts.map(|t| t.to_rfc3339()),
                    span.status,
                    span.attrs_json,
                    span.events_json,
                    span.depth as i64,
                    span.path.join("/"),
                    span.root_span_id,
                    span.span_order as i64,
                ])
                .map_err(|e| TracedeckError::Store(format!("insert span failed: {e}")))?;
            }
        }

        tx.commit()
            .map_err(|e| TracedeckError::Store(format!("commit spans failed: {e}")))
    }

    pub fn insert_alerts(&self, alerts: &[AlertRecord]) -> Result<()> {
        if alerts.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .map_err(|e| TracedeckError::Store(format!("begin tx failed: {e}")))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO alerts (id, created_at, entity, drift_type, active)
                     VALUES (?, ?, ?, ?, ?)",
                )
                .map_err(|e| TracedeckError::Store(format!("prepare insert alerts failed: {e}")))?;

            for alert in alerts {
                stmt.execute(params![
                    alert.id,
                    alert.created_at.to_rfc3339(),
                    alert.entity,
                    alert.drift_type,
                    alert.active,
                ])
                .map_err(|e| TracedeckError::Store(format!("insert alert failed: {e}")))?;
            }
        }

        tx.commit()
            .map_err(|e| TracedeckError::Store(format!("commit alerts failed: {e}")))
    }

    pub fn insert_evaluations(&self, records: &[EvaluationRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .map_err(|e| TracedeckError::Store(format!("begin tx failed: {e}")))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO evaluation_records (id, created_at, name, evaluation_type)
                     VALUES (?, ?, ?, ?)",
                )
                .map_err(|e| {
                    TracedeckError::Store(format!("prepare insert evaluations failed: {e}"))
                })?;

            for record in records {
                stmt.execute(params![
                    record.id,
                    record.created_at.to_rfc3339(),
                    record.name,
                    record.evaluation_type,
                ])
                .map_err(|e| TracedeckError::Store(format!("insert evaluation failed: {e}")))?;
            }
        }

        tx.commit()
            .map_err(|e| TracedeckError::Store(format!("commit evaluations failed: {e}")))
    }

    pub fn insert_workflows(&self, workflows: &[WorkflowRecord]) -> Result<()> {
        if workflows.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .map_err(|e| TracedeckError::Store(format!("begin tx failed: {e}")))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO evaluation_workflows (id, created_at, name, status)
                     VALUES (?, ?, ?, ?)",
                )
                .map_err(|e| {
                    TracedeckError::Store(format!("prepare insert workflows failed: {e}"))
                })?;

            for workflow in workflows {
                stmt.execute(params![
                    workflow.id,
                    workflow.created_at.to_rfc3339(),
                    workflow.name,
                    workflow.status,
                ])
                .map_err(|e| TracedeckError::Store(format!("insert workflow failed: {e}")))?;
            }
        }

        tx.commit()
            .map_err(|e| TracedeckError::Store(format!("commit workflows failed: {e}")))
    }
}
