use chrono::{DateTime, Duration, Utc};
use tracedeck_core::model::span::{STATUS_ERROR, STATUS_OK, SpanEvent, SpanRecord};

use crate::rng::Lcg64;

// Total record count plus the time window to fill; nothing else is
// configurable, so any two runs agree span for span.
#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub count: usize,
    pub start: DateTime<Utc>,
    pub window: Duration,
}

const GOLDEN: u64 = 0x9E37_79B9_7F4A_7C15;
const MAX_NESTING: usize = 4;
const PARENT_SLACK: f64 = 0.9;
const MIN_WINDOW_MS: i64 = 1;
const CHILD_CHANCE: f64 = 0.45;
const ERRORING_TRACE_CHANCE: f64 = 0.25;
const SPAN_ERROR_CHANCE: f64 = 0.3;

struct Archetype {
    kind: &'static str,
    services: &'static [&'static str],
    names: &'static [&'static str],
    duration_ms: (u64, u64),
}

const ARCHETYPES: &[Archetype] = &[
    Archetype {
        kind: "http",
        services: &["api-gateway", "dashboard-bff"],
        names: &[
            "GET /v1/traces",
            "GET /v1/alerts",
            "POST /v1/evaluations",
            "GET /v1/workflows",
        ],
        duration_ms: (20, 400),
    },
    Archetype {
        kind: "db",
        services: &["registry-db", "metrics-db"],
        names: &[
            "db.query spans",
            "db.query drift_profiles",
            "db.insert evaluation",
        ],
        duration_ms: (5, 150),
    },
    Archetype {
        kind: "cache",
        services: &["session-cache"],
        names: &["cache.get profile", "cache.set profile", "cache.get card"],
        duration_ms: (1, 15),
    },
    Archetype {
        kind: "queue",
        services: &["event-bus"],
        names: &["queue.publish drift_event", "queue.consume drift_event"],
        duration_ms: (5, 60),
    },
    Archetype {
        kind: "internal",
        services: &["evaluator", "profiler"],
        names: &[
            "score evaluation batch",
            "compute feature stats",
            "render trace summary",
        ],
        duration_ms: (2, 80),
    },
];

pub fn trace_seed(index: usize) -> u64 {
    (index as u64).wrapping_add(1).wrapping_mul(GOLDEN)
}

pub fn generate_traces(cfg: &SynthConfig) -> Vec<Vec<SpanRecord>> {
    (0..cfg.count).map(|i| generate_trace(i, cfg)).collect()
}

pub fn generate_trace(index: usize, cfg: &SynthConfig) -> Vec<SpanRecord> {
    let mut rng = Lcg64::new(trace_seed(index));
    let trace_id = format!("{:016x}{:016x}", rng.next_u64(), rng.next_u64());
    let root_id = format!("{:016x}", rng.next_u64());

    let slots = cfg.count.max(1) as i64;
    let slot_ms = (cfg.window.num_milliseconds() / slots).max(1);
    let jitter_ms = rng.next_range(0, (slot_ms / 2).max(1) as u64) as i64;
    let start = cfg.start + Duration::milliseconds(index as i64 * slot_ms + jitter_ms);

    let root_duration_ms = rng.next_range(80, 2500) as i64;
    let root_end = start + Duration::milliseconds(root_duration_ms);
    let erroring = rng.chance(ERRORING_TRACE_CHANCE);
    let span_target = rng.next_range(4, 18) as usize;

    let entry = &ARCHETYPES[0];
    let mut spans = vec![SpanRecord {
        trace_id: trace_id.clone(),
        span_id: root_id.clone(),
        parent_span_id: None,
        service: rng.pick(entry.services).to_string(),
        name: rng.pick(entry.names).to_string(),
        start_ts: start,
        end_ts: Some(root_end),
        status: if erroring { STATUS_ERROR } else { STATUS_OK }.to_string(),
        attrs_json: attrs_for(entry, erroring, &mut rng),
        events_json: "[]".to_string(),
        depth: 0,
        path: vec![root_id.clone()],
        root_span_id: root_id.clone(),
        span_order: 0,
    }];

    // indexes into spans; the top is the span new work nests under
    let mut parent_stack: Vec<usize> = vec![0];
    let mut cursor_ts = start;

    for _ in 0..span_target.saturating_sub(1) {
        let Some(&parent_idx) = parent_stack.last() else {
            break;
        };
        let Some(parent_end) = spans[parent_idx].end_ts else {
            break;
        };

        let available_ms = (parent_end - cursor_ts).num_milliseconds();
        if available_ms <= MIN_WINDOW_MS {
            // budget spent; climb back out before trying again
            if parent_stack.len() > 1 {
                parent_stack.pop();
            }
            continue;
        }

        let archetype = &ARCHETYPES[rng.next_range(0, ARCHETYPES.len() as u64) as usize];
        let base_ms = rng.next_range(archetype.duration_ms.0, archetype.duration_ms.1) as i64;
        // the 10% slack keeps children off their parent's end boundary so
        // siblings still fit afterwards
        let duration_ms = base_ms
            .min((available_ms as f64 * PARENT_SLACK) as i64)
            .max(1);

        let span_id = format!("{:016x}", rng.next_u64());
        let want_child = rng.chance(CHILD_CHANCE);
        let nest = want_child && parent_stack.len() < MAX_NESTING;

        let span_start = cursor_ts;
        let span_end = span_start + Duration::milliseconds(duration_ms);
        let errored = erroring && rng.chance(SPAN_ERROR_CHANCE);
        let events_json = if errored {
            exception_events(span_end, duration_ms, &mut rng)
        } else {
            "[]".to_string()
        };

        let parent_span_id = spans[parent_idx].span_id.clone();
        let parent_depth = spans[parent_idx].depth;
        let mut path = spans[parent_idx].path.clone();
        path.push(span_id.clone());

        spans.push(SpanRecord {
            trace_id: trace_id.clone(),
            span_id,
            parent_span_id: Some(parent_span_id),
            service: rng.pick(archetype.services).to_string(),
            name: rng.pick(archetype.names).to_string(),
            start_ts: span_start,
            end_ts: Some(span_end),
            status: if errored { STATUS_ERROR } else { STATUS_OK }.to_string(),
            attrs_json: attrs_for(archetype, errored, &mut rng),
            events_json,
            depth: parent_depth + 1,
            path,
            root_span_id: root_id.clone(),
            span_order: spans.len() as u32,
        });

        if nest {
            // children share the parent's window; the cursor stays put
            parent_stack.push(spans.len() - 1);
        } else {
            cursor_ts = span_end + Duration::milliseconds(1);
        }
    }

    spans
}

fn attrs_for(archetype: &Archetype, errored: bool, rng: &mut Lcg64) -> String {
    let attrs = match archetype.kind {
        "http" => serde_json::json!({
            "http.method": *rng.pick(&["GET", "GET", "POST"]),
            "http.status_code": if errored { 500 } else { 200 },
        }),
        "db" => serde_json::json!({
            "db.system": "postgresql",
            "db.rows": rng.next_range(1, 500),
        }),
        "cache" => serde_json::json!({
            "cache.system": "redis",
            "cache.hit": rng.chance(0.8),
        }),
        "queue" => serde_json::json!({
            "messaging.system": "kafka",
            "messaging.batch_size": rng.next_range(1, 64),
        }),
        _ => serde_json::json!({
            "code.namespace": "tracedeck.worker",
        }),
    };
    attrs.to_string()
}

fn exception_events(span_end: DateTime<Utc>, duration_ms: i64, rng: &mut Lcg64) -> String {
    let kind = *rng.pick(&["DeadlineExceeded", "ConnectionReset", "UpstreamError"]);
    let mut attrs = std::collections::BTreeMap::new();
    attrs.insert("exception.type".to_string(), kind.to_string());
    attrs.insert(
        "exception.message".to_string(),
        format!("{kind} while awaiting downstream call"),
    );
    let events = vec![SpanEvent {
        name: "exception".to_string(),
        ts: span_end - Duration::milliseconds(duration_ms.min(3)),
        attrs,
    }];
    serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::TimeZone;
    use tracedeck_core::assemble::assemble;

    use super::*;

    fn cfg() -> SynthConfig {
        SynthConfig {
            count: 8,
            start: Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
            window: Duration::hours(2),
        }
    }

    #[test]
    fn same_seed_produces_identical_traces() {
        let cfg = cfg();
        for index in 0..cfg.count {
            assert_eq!(generate_trace(index, &cfg), generate_trace(index, &cfg));
        }
    }

    #[test]
    fn distinct_indices_produce_distinct_traces() {
        let cfg = cfg();
        let a = generate_trace(0, &cfg);
        let b = generate_trace(1, &cfg);
        assert_ne!(a[0].trace_id, b[0].trace_id);
    }

    #[test]
    fn every_span_nests_inside_its_parent() {
        let cfg = cfg();
        for trace in generate_traces(&cfg) {
            let by_id: HashMap<&str, &SpanRecord> =
                trace.iter().map(|s| (s.span_id.as_str(), s)).collect();
            for span in &trace {
                let Some(parent_id) = &span.parent_span_id else {
                    continue;
                };
                let parent = by_id[parent_id.as_str()];
                assert!(span.start_ts >= parent.start_ts);
                assert!(span.end_ts.unwrap() <= parent.end_ts.unwrap());
            }
        }
    }

    #[test]
    fn single_root_covering_the_trace_window() {
        let cfg = cfg();
        for trace in generate_traces(&cfg) {
            let roots = trace.iter().filter(|s| s.is_root()).count();
            assert_eq!(roots, 1);
            assert!(trace[0].is_root());
            let root_end = trace[0].end_ts.unwrap();
            for span in &trace[1..] {
                assert!(span.end_ts.unwrap() <= root_end);
            }
        }
    }

    #[test]
    fn nesting_depth_is_capped() {
        let cfg = cfg();
        for trace in generate_traces(&cfg) {
            for span in &trace {
                assert!(span.depth as usize <= MAX_NESTING);
            }
        }
    }

    #[test]
    fn errored_child_spans_carry_exception_events() {
        let cfg = SynthConfig { count: 40, ..cfg() };
        let mut saw_error = false;
        for trace in generate_traces(&cfg) {
            for span in trace.iter().filter(|s| !s.is_root()) {
                if span.is_error() {
                    saw_error = true;
                    let events: Vec<SpanEvent> =
                        serde_json::from_str(&span.events_json).unwrap();
                    assert_eq!(events[0].name, "exception");
                    assert!(events[0].ts <= span.end_ts.unwrap());
                }
            }
        }
        assert!(saw_error, "expected at least one errored span across 40 traces");
    }

    #[test]
    fn assembly_agrees_with_generated_tree() {
        let cfg = cfg();
        for trace in generate_traces(&cfg) {
            let generated: HashMap<String, (u32, Vec<String>, String)> = trace
                .iter()
                .map(|s| {
                    (
                        s.span_id.clone(),
                        (s.depth, s.path.clone(), s.root_span_id.clone()),
                    )
                })
                .collect();

            let detail = assemble(trace.clone());
            assert_eq!(detail.span_count, trace.len());
            assert_eq!(detail.root_span.unwrap().span_id, trace[0].span_id);
            for span in &detail.spans {
                let (depth, path, root) = &generated[&span.span_id];
                assert_eq!(span.depth, *depth);
                assert_eq!(&span.path, path);
                assert_eq!(&span.root_span_id, root);
            }
        }
    }
}
