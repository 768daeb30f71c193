use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::model::span::SpanRecord;

// Call tree and aggregates for one trace, recomputed on demand from its
// span set. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceDetail {
    pub trace_id: String,
    pub spans: Vec<SpanRecord>,
    pub root_span: Option<SpanRecord>,
    pub total_duration_ms: i64,
    pub service_count: usize,
    pub span_count: usize,
    pub error_count: usize,
    pub critical_path_duration_ms: i64,
}

#[derive(Debug, Default)]
struct GraphDiagnostics {
    orphaned: usize,
    revisited: usize,
    parent_overflow: usize,
}

// Rebuild the span tree from an unsorted flat list. Dangling parent
// references become pseudo-roots, repeated parent claims keep the first
// discovery, and cycles are broken by the visited guard; none of these
// abort assembly.
pub fn assemble(mut spans: Vec<SpanRecord>) -> TraceDetail {
    let span_count = spans.len();
    let trace_id = spans
        .first()
        .map(|s| s.trace_id.clone())
        .unwrap_or_default();
    let error_count = spans.iter().filter(|s| s.is_error()).count();
    let service_count = spans
        .iter()
        .map(|s| s.service.as_str())
        .collect::<HashSet<_>>()
        .len();

    let ids: HashSet<&str> = spans.iter().map(|s| s.span_id.as_str()).collect();
    let mut children: HashMap<String, Vec<usize>> = HashMap::new();
    let mut roots: Vec<usize> = Vec::new();
    let mut diag = GraphDiagnostics::default();

    for (idx, span) in spans.iter().enumerate() {
        match &span.parent_span_id {
            Some(parent) if ids.contains(parent.as_str()) => {
                children.entry(parent.clone()).or_default().push(idx);
            }
            Some(_) => {
                diag.orphaned += 1;
                roots.push(idx);
            }
            None => roots.push(idx),
        }
    }

    // deterministic sibling order for path/span_order assignment
    for kids in children.values_mut() {
        kids.sort_by(|&a, &b| {
            spans[a]
                .start_ts
                .cmp(&spans[b].start_ts)
                .then_with(|| spans[a].span_id.cmp(&spans[b].span_id))
        });
    }

    let mut visited = vec![false; span_count];
    let mut depth_of = vec![0u32; span_count];
    let mut path_of: Vec<Vec<String>> = vec![Vec::new(); span_count];
    let mut root_of: Vec<String> = vec![String::new(); span_count];
    let mut tree_parent: Vec<Option<usize>> = vec![None; span_count];
    let mut visit_order: Vec<usize> = Vec::with_capacity(span_count);

    for seed in roots {
        if !visited[seed] {
            bfs(
                seed,
                &spans,
                &children,
                &mut visited,
                &mut depth_of,
                &mut path_of,
                &mut root_of,
                &mut tree_parent,
                &mut visit_order,
                &mut diag,
            );
        }
    }

    // components only reachable through a cycle: promote the first member
    // encountered so every input span stays in the output
    for idx in 0..span_count {
        if !visited[idx] {
            diag.orphaned += 1;
            bfs(
                idx,
                &spans,
                &children,
                &mut visited,
                &mut depth_of,
                &mut path_of,
                &mut root_of,
                &mut tree_parent,
                &mut visit_order,
                &mut diag,
            );
        }
    }

    let critical_path_duration_ms = critical_path(&spans, &visit_order, &tree_parent);

    let root_span_idx = visit_order
        .iter()
        .copied()
        .filter(|&idx| depth_of[idx] == 0)
        .min_by(|&a, &b| {
            spans[a]
                .start_ts
                .cmp(&spans[b].start_ts)
                .then_with(|| spans[a].span_id.cmp(&spans[b].span_id))
        });
    let total_duration_ms = root_span_idx
        .and_then(|idx| spans[idx].duration_ms())
        .unwrap_or(0);

    for (order, &idx) in visit_order.iter().enumerate() {
        spans[idx].depth = depth_of[idx];
        spans[idx].path = std::mem::take(&mut path_of[idx]);
        spans[idx].root_span_id = std::mem::take(&mut root_of[idx]);
        spans[idx].span_order = order as u32;
    }

    let root_span = root_span_idx.map(|idx| spans[idx].clone());
    spans.sort_by_key(|s| s.span_order);

    if diag.orphaned > 0 || diag.revisited > 0 || diag.parent_overflow > 0 {
        tracing::debug!(
            trace_id = %trace_id,
            orphaned = diag.orphaned,
            revisited = diag.revisited,
            parent_overflow = diag.parent_overflow,
            "tolerated malformed span graph"
        );
    }

    TraceDetail {
        trace_id,
        spans,
        root_span,
        total_duration_ms,
        service_count,
        span_count,
        error_count,
        critical_path_duration_ms,
    }
}

#[allow(clippy::too_many_arguments)]
fn bfs(
    seed: usize,
    spans: &[SpanRecord],
    children: &HashMap<String, Vec<usize>>,
    visited: &mut [bool],
    depth_of: &mut [u32],
    path_of: &mut [Vec<String>],
    root_of: &mut [String],
    tree_parent: &mut [Option<usize>],
    visit_order: &mut Vec<usize>,
    diag: &mut GraphDiagnostics,
) {
    visited[seed] = true;
    depth_of[seed] = 0;
    path_of[seed] = vec![spans[seed].span_id.clone()];
    root_of[seed] = spans[seed].span_id.clone();

    let mut queue = VecDeque::new();
    queue.push_back(seed);

    while let Some(idx) = queue.pop_front() {
        visit_order.push(idx);
        let Some(kids) = children.get(&spans[idx].span_id) else {
            continue;
        };
        for &kid in kids {
            if visited[kid] {
                // second parent claim or a back edge; first discovery wins
                diag.revisited += 1;
                continue;
            }
            visited[kid] = true;
            depth_of[kid] = depth_of[idx] + 1;
            let mut path = path_of[idx].clone();
            path.push(spans[kid].span_id.clone());
            path_of[kid] = path;
            root_of[kid] = root_of[idx].clone();
            tree_parent[kid] = Some(idx);
            if !contained_in_parent(&spans[kid], &spans[idx]) {
                diag.parent_overflow += 1;
            }
            queue.push_back(kid);
        }
    }
}

fn contained_in_parent(child: &SpanRecord, parent: &SpanRecord) -> bool {
    if child.start_ts < parent.start_ts {
        return false;
    }
    match (child.end_ts, parent.end_ts) {
        (Some(child_end), Some(parent_end)) => child_end <= parent_end,
        _ => true,
    }
}

// Longest root-to-leaf chain by cumulative duration, over the tree edges
// accepted during traversal. Reverse visit order is a post-order here:
// children always appear after their parent.
fn critical_path(
    spans: &[SpanRecord],
    visit_order: &[usize],
    tree_parent: &[Option<usize>],
) -> i64 {
    let mut longest_below = vec![0i64; spans.len()];
    let mut best = 0i64;

    for &idx in visit_order.iter().rev() {
        let chain = spans[idx].duration_ms().unwrap_or(0) + longest_below[idx];
        match tree_parent[idx] {
            Some(parent) => {
                if chain > longest_below[parent] {
                    longest_below[parent] = chain;
                }
            }
            None => best = best.max(chain),
        }
    }

    best
}
