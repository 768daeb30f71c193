use std::collections::HashMap;

use chrono::NaiveDateTime;
use duckdb::params;
use tracedeck_core::assemble::{TraceDetail, assemble};
use tracedeck_core::cursor::sort_canonical;
use tracedeck_core::error::{Result, TracedeckError};
use tracedeck_core::model::record::{
    AlertRecord, EvaluationRecord, TraceSummary, WorkflowRecord,
};
use tracedeck_core::model::span::SpanRecord;
use tracedeck_core::page::{Page, paginate};
use tracedeck_core::query::{
    AlertsRequest, EvaluationsRequest, TracesRequest, WorkflowsRequest,
};

use crate::Store;

impl Store {
    pub fn list_traces(&self, req: &TracesRequest) -> Result<Page<TraceSummary>> {
        let mut view = self.fetch_trace_summaries()?;
        view.retain(|item| {
            req.window.contains(item.created_at)
                && req
                    .service
                    .as_ref()
                    .map_or(true, |f| f.matches(&item.service))
                && req.status.as_ref().map_or(true, |s| s == &item.status)
        });
        sort_canonical(&mut view);
        paginate(
            &view,
            req.page.limit,
            req.page.cursor.as_ref(),
            req.page.direction,
        )
    }

    pub fn list_alerts(&self, req: &AlertsRequest) -> Result<Page<AlertRecord>> {
        let mut view = self.fetch_alerts()?;
        view.retain(|item| {
            req.window.contains(item.created_at)
                && req
                    .entity
                    .as_ref()
                    .map_or(true, |f| f.matches(&item.entity))
                && req
                    .drift_type
                    .as_ref()
                    .map_or(true, |d| d == &item.drift_type)
                && req.active.map_or(true, |a| a == item.active)
        });
        sort_canonical(&mut view);
        paginate(
            &view,
            req.page.limit,
            req.page.cursor.as_ref(),
            req.page.direction,
        )
    }

    pub fn list_evaluations(&self, req: &EvaluationsRequest) -> Result<Page<EvaluationRecord>> {
        let mut view = self.fetch_evaluations()?;
        view.retain(|item| {
            req.window.contains(item.created_at)
                && req.name.as_ref().map_or(true, |f| f.matches(&item.name))
                && req
                    .evaluation_type
                    .as_ref()
                    .map_or(true, |t| t == &item.evaluation_type)
        });
        sort_canonical(&mut view);
        paginate(
            &view,
            req.page.limit,
            req.page.cursor.as_ref(),
            req.page.direction,
        )
    }

    pub fn list_workflows(&self, req: &WorkflowsRequest) -> Result<Page<WorkflowRecord>> {
        let mut view = self.fetch_workflows()?;
        view.retain(|item| {
            req.window.contains(item.created_at)
                && req.status.as_ref().map_or(true, |s| s == &item.status)
        });
        sort_canonical(&mut view);
        paginate(
            &view,
            req.page.limit,
            req.page.cursor.as_ref(),
            req.page.direction,
        )
    }

    // Absence is an expected condition (the trace may have scrolled out of
    // the retention window), so a missing trace is None rather than an error.
    pub fn get_trace_detail(&self, trace_id: &str) -> Result<Option<TraceDetail>> {
        let spans = self.fetch_trace_spans(trace_id)?;
        if spans.is_empty() {
            return Ok(None);
        }
        Ok(Some(assemble(spans)))
    }

    fn fetch_trace_summaries(&self) -> Result<Vec<TraceSummary>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT s.trace_id, s.name, s.service, s.start_ts, s.end_ts, s.status,
                        (SELECT COUNT(*) FROM spans s2 WHERE s2.trace_id = s.trace_id) AS span_count
                 FROM spans s
                 WHERE s.depth = 0",
            )
            .map_err(|e| TracedeckError::Store(format!("prepare traces failed: {e}")))?;

        let rows = stmt
            .query_map([], |row| {
                let trace_id = row.get::<_, String>(0)?;
                let root_name = row.get::<_, String>(1)?;
                let service = row.get::<_, String>(2)?;
                let start = row.get::<_, NaiveDateTime>(3)?.and_utc();
                let end = row.get::<_, Option<NaiveDateTime>>(4)?.map(|t| t.and_utc());
                let status = row.get::<_, String>(5)?;
                let span_count = row.get::<_, i64>(6)? as usize;
                Ok(TraceSummary {
                    trace_id,
                    root_name,
                    service,
                    created_at: start,
                    duration_ms: end
                        .map(|e| (e - start).num_milliseconds().max(0))
                        .unwrap_or(0),
                    span_count,
                    status,
                })
            })
            .map_err(|e| TracedeckError::Store(format!("query traces failed: {e}")))?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row.map_err(|e| TracedeckError::Store(format!("map trace row failed: {e}")))?);
        }

        // a malformed trace can carry several pseudo-roots; its list row is
        // the earliest one
        let mut by_trace: HashMap<String, TraceSummary> = HashMap::new();
        for item in items {
            match by_trace.get(&item.trace_id) {
                Some(existing) if existing.created_at <= item.created_at => {}
                _ => {
                    by_trace.insert(item.trace_id.clone(), item);
                }
            }
        }
        Ok(by_trace.into_values().collect())
    }

    fn fetch_alerts(&self) -> Result<Vec<AlertRecord>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id, created_at, entity, drift_type, active FROM alerts")
            .map_err(|e| TracedeckError::Store(format!("prepare alerts failed: {e}")))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(AlertRecord {
                    id: row.get::<_, i64>(0)?,
                    created_at: row.get::<_, NaiveDateTime>(1)?.and_utc(),
                    entity: row.get::<_, String>(2)?,
                    drift_type: row.get::<_, String>(3)?,
                    active: row.get::<_, bool>(4)?,
                })
            })
            .map_err(|e| TracedeckError::Store(format!("query alerts failed: {e}")))?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row.map_err(|e| TracedeckError::Store(format!("map alert row failed: {e}")))?);
        }
        Ok(items)
    }

    fn fetch_evaluations(&self) -> Result<Vec<EvaluationRecord>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id, created_at, name, evaluation_type FROM evaluation_records")
            .map_err(|e| TracedeckError::Store(format!("prepare evaluations failed: {e}")))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(EvaluationRecord {
                    id: row.get::<_, i64>(0)?,
                    created_at: row.get::<_, NaiveDateTime>(1)?.and_utc(),
                    name: row.get::<_, String>(2)?,
                    evaluation_type: row.get::<_, String>(3)?,
                })
            })
            .map_err(|e| TracedeckError::Store(format!("query evaluations failed: {e}")))?;

        let mut items = Vec::new();
        for row in rows {
            items.push(
                row.map_err(|e| TracedeckError::Store(format!("map evaluation row failed: {e}")))?,
            );
        }
        Ok(items)
    }

    fn fetch_workflows(&self) -> Result<Vec<WorkflowRecord>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id, created_at, name, status FROM evaluation_workflows")
            .map_err(|e| TracedeckError::Store(format!("prepare workflows failed: {e}")))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(WorkflowRecord {
                    id: row.get::<_, i64>(0)?,
                    created_at: row.get::<_, NaiveDateTime>(1)?.and_utc(),
                    name: row.get::<_, String>(2)?,
                    status: row.get::<_, String>(3)?,
                })
            })
            .map_err(|e| TracedeckError::Store(format!("query workflows failed: {e}")))?;

        let mut items = Vec::new();
        for row in rows {
            items.push(
                row.map_err(|e| TracedeckError::Store(format!("map workflow row failed: {e}")))?,
            );
        }
        Ok(items)
    }

    fn fetch_trace_spans(&self, trace_id: &str) -> Result<Vec<SpanRecord>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT trace_id, span_id, parent_span_id, service, name, start_ts, end_ts,
                        status, attrs_json, events_json, depth, path, root_span_id, span_order
                 FROM spans
                 WHERE trace_id = ?
                 ORDER BY start_ts ASC",
            )
            .map_err(|e| TracedeckError::Store(format!("prepare trace spans failed: {e}")))?;

        let rows = stmt
            .query_map(params![trace_id], |row| {
                let path_raw = row.get::<_, String>(11)?;
                Ok(SpanRecord {
                    trace_id: row.get::<_, String>(0)?,
                    span_id: row.get::<_, String>(1)?,
                    parent_span_id: row.get::<_, Option<String>>(2)?,
                    service: row.get::<_, String>(3)?,
                    name: row.get::<_, String>(4)?,
                    start_ts: row.get::<_, NaiveDateTime>(5)?.and_utc(),
                    end_ts: row.get::<_, Option<NaiveDateTime>>(6)?.map(|t| t.and_utc()),
                    status: row.get::<_, String>(7)?,
                    attrs_json: row.get::<_, String>(8)?,
                    events_json: row.get::<_, String>(9)?,
                    depth: row.get::<_, i64>(10)? as u32,
                    path: if path_raw.is_empty() {
                        Vec::new()
                    } else {
                        path_raw.split('/').map(|p| p.to_string()).collect()
                    },
                    root_span_id: row.get::<_, String>(12)?,
                    span_order: row.get::<_, i64>(13)? as u32,
                })
            })
            .map_err(|e| TracedeckError::Store(format!("query trace spans failed: {e}")))?;

        let mut spans = Vec::new();
        for row in rows {
            spans.push(
                row.map_err(|e| TracedeckError::Store(format!("map trace span failed: {e}")))?,
            );
        }
        Ok(spans)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use tracedeck_core::cursor::Cursor;
    use tracedeck_core::filter::{NameGlob, TimeWindow};
    use tracedeck_core::query::{
        AlertsRequest, EvaluationsRequest, PageRequest, TracesRequest, WorkflowsRequest,
    };
    use tracedeck_synth::records::{generate_alerts, generate_evaluations, generate_workflows};
    use tracedeck_synth::{SynthConfig, generate_traces};

    use crate::Store;

    fn synth_cfg(count: usize) -> SynthConfig {
        SynthConfig {
            count,
            start: Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
            window: Duration::hours(4),
        }
    }

    fn seeded_store(traces: usize) -> Store {
        let store = Store::open_in_memory().unwrap();
        let cfg = synth_cfg(traces);
        for trace in generate_traces(&cfg) {
            store.insert_spans(&trace).unwrap();
        }
        store
    }

    #[test]
    fn trace_pages_enumerate_every_trace_once() {
        let store = seeded_store(12);
        let mut seen = Vec::new();
        let mut cursor: Option<Cursor> = None;
        loop {
            let page = store
                .list_traces(&TracesRequest {
                    page: PageRequest {
                        limit: 5,
                        cursor: cursor.clone(),
                        direction: Default::default(),
                    },
                    ..TracesRequest::default()
                })
                .unwrap();
            for pair in page.items.windows(2) {
                assert!(pair[0].created_at >= pair[1].created_at);
            }
            seen.extend(page.items.iter().map(|t| t.trace_id.clone()));
            if !page.has_next {
                break;
            }
            cursor = page.next_cursor;
        }
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 12);
    }

    #[test]
    fn trace_filters_apply_before_pagination() {
        let store = seeded_store(10);
        let everything = store
            .list_traces(&TracesRequest {
                page: PageRequest {
                    limit: 100,
                    ..PageRequest::default()
                },
                ..TracesRequest::default()
            })
            .unwrap();
        let service = everything.items[0].service.clone();

        let filtered = store
            .list_traces(&TracesRequest {
                service: Some(NameGlob::parse(&service).unwrap()),
                page: PageRequest {
                    limit: 100,
                    ..PageRequest::default()
                },
                ..TracesRequest::default()
            })
            .unwrap();
        assert!(!filtered.items.is_empty());
        assert!(filtered.items.iter().all(|t| t.service == service));
        assert!(filtered.items.len() <= everything.items.len());
    }

    #[test]
    fn window_filter_excludes_out_of_range_traces() {
        let store = seeded_store(10);
        let all = store
            .list_traces(&TracesRequest {
                page: PageRequest {
                    limit: 100,
                    ..PageRequest::default()
                },
                ..TracesRequest::default()
            })
            .unwrap();
        let newest = all.items[0].created_at;

        let page = store
            .list_traces(&TracesRequest {
                window: TimeWindow {
                    since: Some(newest),
                    until: None,
                },
                page: PageRequest {
                    limit: 100,
                    ..PageRequest::default()
                },
                ..TracesRequest::default()
            })
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].created_at, newest);
    }

    #[test]
    fn alert_pages_honor_active_filter() {
        let store = Store::open_in_memory().unwrap();
        let alerts = generate_alerts(&synth_cfg(20));
        store.insert_alerts(&alerts).unwrap();

        let active = store
            .list_alerts(&AlertsRequest {
                active: Some(true),
                page: PageRequest {
                    limit: 100,
                    ..PageRequest::default()
                },
                ..AlertsRequest::default()
            })
            .unwrap();
        let expected = alerts.iter().filter(|a| a.active).count();
        assert_eq!(active.items.len(), expected);
        assert!(active.items.iter().all(|a| a.active));
    }

    #[test]
    fn evaluation_and_workflow_pages_round_trip() {
        let store = Store::open_in_memory().unwrap();
        let cfg = synth_cfg(9);
        store
            .insert_evaluations(&generate_evaluations(&cfg))
            .unwrap();
        store.insert_workflows(&generate_workflows(&cfg)).unwrap();

        let first = store
            .list_evaluations(&EvaluationsRequest {
                page: PageRequest {
                    limit: 4,
                    ..PageRequest::default()
                },
                ..EvaluationsRequest::default()
            })
            .unwrap();
        assert_eq!(first.items.len(), 4);
        assert!(first.has_next);

        let second = store
            .list_evaluations(&EvaluationsRequest {
                page: PageRequest {
                    limit: 4,
                    cursor: first.next_cursor.clone(),
                    ..PageRequest::default()
                },
                ..EvaluationsRequest::default()
            })
            .unwrap();
        assert!(second.items.iter().all(|e| !first.items.contains(e)));

        let workflows = store
            .list_workflows(&WorkflowsRequest {
                page: PageRequest {
                    limit: 100,
                    ..PageRequest::default()
                },
                ..WorkflowsRequest::default()
            })
            .unwrap();
        assert_eq!(workflows.items.len(), 9);
    }

    #[test]
    fn trace_detail_round_trips_through_storage() {
        let store = Store::open_in_memory().unwrap();
        let cfg = synth_cfg(3);
        let trace = tracedeck_synth::generate_trace(1, &cfg);
        store.insert_spans(&trace).unwrap();

        let detail = store
            .get_trace_detail(&trace[0].trace_id)
            .unwrap()
            .expect("trace should exist");
        assert_eq!(detail.span_count, trace.len());
        assert_eq!(detail.root_span.unwrap().span_id, trace[0].span_id);
        assert!(detail.critical_path_duration_ms >= detail.total_duration_ms);
    }

    #[test]
    fn missing_trace_is_none_not_error() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.get_trace_detail("does-not-exist").unwrap().is_none());
    }
}
