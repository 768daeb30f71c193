pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS spans (
  trace_id TEXT NOT NULL,
  span_id TEXT NOT NULL,
  parent_span_id TEXT,
  service TEXT NOT NULL,
  name TEXT NOT NULL,
  start_ts TIMESTAMP NOT NULL,
  end_ts TIMESTAMP,
  status TEXT NOT NULL,
  attrs_json TEXT NOT NULL,
  events_json TEXT NOT NULL,
  depth INTEGER NOT NULL,
  path TEXT NOT NULL,
  root_span_id TEXT NOT NULL,
  span_order INTEGER NOT NULL,
  PRIMARY KEY(trace_id, span_id)
);

CREATE TABLE IF NOT EXISTS alerts (
  id BIGINT PRIMARY KEY,
  created_at TIMESTAMP NOT NULL,
  entity TEXT NOT NULL,
  drift_type TEXT NOT NULL,
  active BOOLEAN NOT NULL
);

CREATE TABLE IF NOT EXISTS evaluation_records (
  id BIGINT PRIMARY KEY,
  created_at TIMESTAMP NOT NULL,
  name TEXT NOT NULL,
  evaluation_type TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS evaluation_workflows (
  id BIGINT PRIMARY KEY,
  created_at TIMESTAMP NOT NULL,
  name TEXT NOT NULL,
  status TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_spans_trace ON spans(trace_id);
CREATE INDEX IF NOT EXISTS idx_spans_depth_start ON spans(depth, start_ts);
CREATE INDEX IF NOT EXISTS idx_spans_service_start ON spans(service, start_ts);

CREATE INDEX IF NOT EXISTS idx_alerts_created ON alerts(created_at);
CREATE INDEX IF NOT EXISTS idx_evaluations_created ON evaluation_records(created_at);
CREATE INDEX IF NOT EXISTS idx_workflows_created ON evaluation_workflows(created_at);
"#;
