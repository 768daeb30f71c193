use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const STATUS_OK: &str = "OK";
pub const STATUS_ERROR: &str = "ERROR";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpanRecord {
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub service: String,
    pub name: String,
    pub start_ts: DateTime<Utc>,
    pub end_ts: Option<DateTime<Utc>>,
    pub status: String,
    pub attrs_json: String,
    pub events_json: String,
    // tree placement, assigned by the generator and recomputed on assembly
    pub depth: u32,
    pub path: Vec<String>,
    pub root_span_id: String,
    pub span_order: u32,
}

impl SpanRecord {
    pub fn duration_ms(&self) -> Option<i64> {
        self.end_ts
            .map(|end| (end - self.start_ts).num_milliseconds().max(0))
    }

    pub fn is_error(&self) -> bool {
        self.status == STATUS_ERROR
    }

    pub fn is_root(&self) -> bool {
        self.parent_span_id.is_none()
    }
}

// Timestamped occurrence inside a span, serialized into `events_json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpanEvent {
    pub name: String,
    pub ts: DateTime<Utc>,
    pub attrs: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn duration_is_none_for_open_spans() {
        let t0 = chrono::Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let span = SpanRecord {
            trace_id: "t".into(),
            span_id: "s".into(),
            parent_span_id: None,
            service: "api".into(),
            name: "op".into(),
            start_ts: t0,
            end_ts: None,
            status: STATUS_OK.into(),
            attrs_json: "{}".into(),
            events_json: "[]".into(),
            depth: 0,
            path: vec!["s".into()],
            root_span_id: "s".into(),
            span_order: 0,
        };
        assert_eq!(span.duration_ms(), None);

        let closed = SpanRecord {
            end_ts: Some(t0 + chrono::Duration::milliseconds(120)),
            ..span
        };
        assert_eq!(closed.duration_ms(), Some(120));
    }
}
