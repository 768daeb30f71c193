use std::collections::{HashMap, HashSet};

use chrono::SecondsFormat;
use owo_colors::OwoColorize;
use tracedeck_core::assemble::TraceDetail;
use tracedeck_core::cursor::HasCursorKey;
use tracedeck_core::model::record::{
    AlertRecord, EvaluationRecord, TraceSummary, WorkflowRecord,
};
use tracedeck_core::model::span::SpanRecord;
use tracedeck_core::page::Page;
use tracedeck_core::query::StatusResponse;

pub fn print_traces_human(page: &Page<TraceSummary>) {
    for item in &page.items {
        println!(
            "trace={} created={} duration={}ms spans={} status={} service={} root=\"{}\"",
            item.trace_id,
            item.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            item.duration_ms,
            item.span_count,
            status_label(&item.status),
            item.service.cyan(),
            item.root_name,
        );
    }
    print_page_footer("traces", page);
}

pub fn print_alerts_human(page: &Page<AlertRecord>) {
    for item in &page.items {
        let active = if item.active {
            "active".yellow().to_string()
        } else {
            "resolved".bright_black().to_string()
        };
        println!(
            "alert={} created={} entity={} drift_type={} {}",
            item.id,
            item.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            item.entity.cyan(),
            item.drift_type,
            active,
        );
    }
    print_page_footer("alerts", page);
}

pub fn print_evaluations_human(page: &Page<EvaluationRecord>) {
    for item in &page.items {
        println!(
            "evaluation={} created={} name={} type={}",
            item.id,
            item.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            item.name,
            item.evaluation_type,
        );
    }
    print_page_footer("evaluations", page);
}

pub fn print_workflows_human(page: &Page<WorkflowRecord>) {
    for item in &page.items {
        println!(
            "workflow={} created={} name={} status={}",
            item.id,
            item.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            item.name,
            status_label(&item.status),
        );
    }
    print_page_footer("workflows", page);
}

pub fn print_trace_detail_human(detail: &Option<TraceDetail>) {
    let Some(detail) = detail else {
        println!("trace not found");
        return;
    };

    println!(
        "TRACE {} duration={}ms critical_path={}ms spans={} services={} errors={}",
        detail.trace_id,
        detail.total_duration_ms,
        detail.critical_path_duration_ms,
        detail.span_count,
        detail.service_count,
        detail.error_count,
    );
    print_span_tree(&detail.spans);
}

pub fn print_status_human(v: &StatusResponse) {
    println!("db_path={}", v.db_path);
    println!("db_size_bytes={}", v.db_size_bytes);
    println!(
        "traces={} spans={} alerts={} evaluations={} workflows={}",
        v.traces_count, v.spans_count, v.alerts_count, v.evaluations_count, v.workflows_count
    );
    if let Some(oldest) = v.oldest_ts {
        println!(
            "oldest={}",
            oldest.to_rfc3339_opts(SecondsFormat::Millis, true)
        );
    }
    if let Some(newest) = v.newest_ts {
        println!(
            "newest={}",
            newest.to_rfc3339_opts(SecondsFormat::Millis, true)
        );
    }
}

fn print_page_footer<T: HasCursorKey>(noun: &str, page: &Page<T>) {
    println!(
        "-- {} {noun} (has_next={}, has_previous={}) --",
        page.items.len(),
        page.has_next,
        page.has_previous
    );
    if let Some(cursor) = &page.next_cursor {
        println!(
            "next: --cursor-created-at {} --cursor-id {} --direction next",
            cursor.created_at.to_rfc3339(),
            cursor.id
        );
    }
    if let Some(cursor) = &page.previous_cursor {
        println!(
            "previous: --cursor-created-at {} --cursor-id {} --direction previous",
            cursor.created_at.to_rfc3339(),
            cursor.id
        );
    }
}

fn status_label(status: &str) -> String {
    match status {
        "OK" | "completed" => status.green().to_string(),
        "ERROR" | "failed" => status.red().to_string(),
        "running" => status.yellow().to_string(),
        _ => status.to_string(),
    }
}

fn print_span_tree(spans: &[SpanRecord]) {
    let ids: HashSet<&str> = spans.iter().map(|s| s.span_id.as_str()).collect();
    let mut children: HashMap<&str, Vec<&SpanRecord>> = HashMap::new();
    for span in spans {
        // pseudo-roots keep depth 0 even when they name a parent
        if span.depth == 0 {
            continue;
        }
        if let Some(parent) = &span.parent_span_id
            && ids.contains(parent.as_str())
        {
            children.entry(parent.as_str()).or_default().push(span);
        }
    }
    for kids in children.values_mut() {
        kids.sort_by_key(|s| s.span_order);
    }

    for root in spans.iter().filter(|s| s.depth == 0) {
        print_node(root, &children, 0);
    }
}

fn print_node(span: &SpanRecord, children: &HashMap<&str, Vec<&SpanRecord>>, indent: usize) {
    let pad = "  ".repeat(indent);
    let duration = span
        .duration_ms()
        .map(|d| format!("{d}ms"))
        .unwrap_or_else(|| "open".to_string());
    println!(
        "{pad}{} {} ({duration}) {}",
        span.service.cyan(),
        span.name,
        status_label(&span.status)
    );

    if let Some(kids) = children.get(span.span_id.as_str()) {
        for child in kids {
            print_node(child, children, indent + 1);
        }
    }
}
