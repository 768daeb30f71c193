mod client;
mod output;
mod protocol;
mod query_server;
mod telemetry;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracedeck_core::config::Config;
use tracedeck_core::cursor::{Cursor, CursorId};
use tracedeck_core::filter::{NameGlob, TimeWindow};
use tracedeck_core::page::Direction;
use tracedeck_core::query::{
    AlertsRequest, DEFAULT_PAGE_LIMIT, EvaluationsRequest, PageRequest, TraceDetailRequest,
    TracesRequest, WorkflowsRequest,
};
use tracedeck_core::time::{parse_duration_str, parse_time_or_relative};
use tracedeck_synth::records::{generate_alerts, generate_evaluations, generate_workflows};
use tracedeck_synth::{SynthConfig, generate_traces};

use crate::client::QueryClient;
use crate::output::{
    print_alerts_human, print_evaluations_human, print_status_human, print_trace_detail_human,
    print_traces_human, print_workflows_human,
};
use crate::protocol::{ApiRequest, ApiResponse};
use crate::telemetry::{init_cli_tracing, init_run_tracing};

#[derive(Parser, Debug)]
#[command(name = "tracedeck")]
#[command(about = "Trace and drift observability query service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true)]
    uds: Option<PathBuf>,

    #[arg(long, global = true)]
    addr: Option<String>,
}

#[derive(Args, Debug)]
struct PageArgs {
    #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
    limit: usize,
    #[arg(long)]
    cursor_created_at: Option<String>,
    #[arg(long)]
    cursor_id: Option<String>,
    #[arg(long, default_value = "next")]
    direction: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Run the query server")]
    Run {
        #[arg(long)]
        db_path: Option<PathBuf>,
        #[arg(long)]
        query_tcp_addr: Option<String>,
        #[arg(long)]
        query_uds_path: Option<PathBuf>,
    },
    #[command(about = "Load deterministic synthetic data into the database")]
    Seed {
        #[arg(long)]
        db_path: Option<PathBuf>,
        #[arg(long, default_value_t = 50)]
        traces: usize,
        #[arg(long, default_value_t = 40)]
        alerts: usize,
        #[arg(long, default_value_t = 30)]
        evaluations: usize,
        #[arg(long, default_value_t = 20)]
        workflows: usize,
        #[arg(long, default_value = "24h", help = "Window ending now to spread records over")]
        window: String,
    },
    #[command(about = "List traces newest-first")]
    Traces {
        #[arg(long)]
        service: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        since: Option<String>,
        #[arg(long)]
        until: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    #[command(about = "List drift alerts newest-first")]
    Alerts {
        #[arg(long)]
        entity: Option<String>,
        #[arg(long)]
        drift_type: Option<String>,
        #[arg(long)]
        active: Option<bool>,
        #[arg(long)]
        since: Option<String>,
        #[arg(long)]
        until: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    #[command(about = "List evaluation records newest-first")]
    Evaluations {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        evaluation_type: Option<String>,
        #[arg(long)]
        since: Option<String>,
        #[arg(long)]
        until: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    #[command(about = "List evaluation workflows newest-first")]
    Workflows {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        since: Option<String>,
        #[arg(long)]
        until: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    #[command(about = "Inspect one trace as an assembled call tree")]
    Trace { trace_id: String },
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            db_path,
            query_tcp_addr,
            query_uds_path,
        } => run_server(db_path, query_tcp_addr, query_uds_path).await,
        Commands::Seed {
            db_path,
            traces,
            alerts,
            evaluations,
            workflows,
            window,
        } => {
            init_cli_tracing();
            seed(db_path, traces, alerts, evaluations, workflows, &window)
        }
        Commands::Traces {
            service,
            status,
            since,
            until,
            page,
        } => {
            init_cli_tracing();
            let mut client = QueryClient::connect(cli.uds, cli.addr).await?;
            let req = TracesRequest {
                service: parse_name_glob(service)?,
                status,
                window: parse_window(since, until)?,
                page: parse_page(page)?,
            };
            let response = client.request(ApiRequest::Traces(req)).await?;
            print_response(response, cli.json)
        }
        Commands::Alerts {
            entity,
            drift_type,
            active,
            since,
            until,
            page,
        } => {
            init_cli_tracing();
            let mut client = QueryClient::connect(cli.uds, cli.addr).await?;
            let req = AlertsRequest {
                entity: parse_name_glob(entity)?,
                drift_type,
                active,
                window: parse_window(since, until)?,
                page: parse_page(page)?,
            };
            let response = client.request(ApiRequest::Alerts(req)).await?;
            print_response(response, cli.json)
        }
        Commands::Evaluations {
            name,
            evaluation_type,
            since,
            until,
            page,
        } => {
            init_cli_tracing();
            let mut client = QueryClient::connect(cli.uds, cli.addr).await?;
            let req = EvaluationsRequest {
                name: parse_name_glob(name)?,
                evaluation_type,
                window: parse_window(since, until)?,
                page: parse_page(page)?,
            };
            let response = client.request(ApiRequest::Evaluations(req)).await?;
            print_response(response, cli.json)
        }
        Commands::Workflows {
            status,
            since,
            until,
            page,
        } => {
            init_cli_tracing();
            let mut client = QueryClient::connect(cli.uds, cli.addr).await?;
            let req = WorkflowsRequest {
                status,
                window: parse_window(since, until)?,
                page: parse_page(page)?,
            };
            let response = client.request(ApiRequest::Workflows(req)).await?;
            print_response(response, cli.json)
        }
        Commands::Trace { trace_id } => {
            init_cli_tracing();
            let mut client = QueryClient::connect(cli.uds, cli.addr).await?;
            let response = client
                .request(ApiRequest::TraceDetail(TraceDetailRequest { trace_id }))
                .await?;
            print_response(response, cli.json)
        }
        Commands::Status => {
            init_cli_tracing();
            let mut client = QueryClient::connect(cli.uds, cli.addr).await?;
            let response = client.request(ApiRequest::Status).await?;
            print_response(response, cli.json)
        }
    }
}

fn seed(
    db_path: Option<PathBuf>,
    traces: usize,
    alerts: usize,
    evaluations: usize,
    workflows: usize,
    window: &str,
) -> anyhow::Result<()> {
    let mut cfg = Config::from_env().context("load config from env")?;
    if let Some(v) = db_path {
        cfg.db_path = v;
    }

    let window = parse_duration_str(window)?;
    let window = chrono::Duration::from_std(window).context("window out of range")?;
    let start = chrono::Utc::now() - window;

    let store = tracedeck_store::Store::open(&cfg.db_path)?;

    let trace_cfg = SynthConfig {
        count: traces,
        start,
        window,
    };
    for trace in generate_traces(&trace_cfg) {
        store.insert_spans(&trace)?;
    }
    store.insert_alerts(&generate_alerts(&SynthConfig {
        count: alerts,
        start,
        window,
    }))?;
    store.insert_evaluations(&generate_evaluations(&SynthConfig {
        count: evaluations,
        start,
        window,
    }))?;
    store.insert_workflows(&generate_workflows(&SynthConfig {
        count: workflows,
        start,
        window,
    }))?;

    println!(
        "seeded traces={traces} alerts={alerts} evaluations={evaluations} workflows={workflows} into {}",
        cfg.db_path.display()
    );
    Ok(())
}

async fn run_server(
    db_path: Option<PathBuf>,
    query_tcp_addr: Option<String>,
    query_uds_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut cfg = Config::load().context("load config")?;
    if let Some(v) = db_path {
        cfg.db_path = v;
    }
    if let Some(v) = query_tcp_addr {
        cfg.query_tcp_addr = v;
    }
    if let Some(v) = query_uds_path {
        cfg.uds_path = v;
    }

    let store = tracedeck_store::Store::open(&cfg.db_path)?;
    init_run_tracing();

    eprintln!("tracedeck run");
    eprintln!("  db: {}", cfg.db_path.display());
    eprintln!("  query uds: {}", cfg.uds_path.display());
    eprintln!("  query tcp: {}", cfg.query_tcp_addr);

    let query_task = tokio::spawn(query_server::run_query_server(
        store.clone(),
        cfg.uds_path.clone(),
        cfg.query_tcp_addr.parse()?,
    ));

    let retention_task = tokio::spawn({
        let store = store.clone();
        let ttl = cfg.retention_ttl;
        let max = cfg.retention_max_bytes;
        async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
            loop {
                interval.tick().await;
                if let Err(err) = store.run_retention(ttl, max) {
                    tracing::warn!(error = ?err, "retention task failed");
                }
            }
        }
    });

    tokio::select! {
        res = query_task => {
            res??;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received ctrl-c, shutting down");
        }
    }

    retention_task.abort();
    Ok(())
}

fn parse_window(since: Option<String>, until: Option<String>) -> anyhow::Result<TimeWindow> {
    let since = since.map(|v| parse_time_or_relative(&v)).transpose()?;
    let until = until.map(|v| parse_time_or_relative(&v)).transpose()?;
    Ok(TimeWindow { since, until })
}

fn parse_name_glob(raw: Option<String>) -> anyhow::Result<Option<NameGlob>> {
    Ok(raw.map(|v| NameGlob::parse(&v)).transpose()?)
}

fn parse_page(args: PageArgs) -> anyhow::Result<PageRequest> {
    let cursor = match (args.cursor_created_at, args.cursor_id) {
        (None, None) => None,
        (Some(created_at), Some(id)) => Some(Cursor {
            created_at: parse_time_or_relative(&created_at)?,
            id: parse_cursor_id(&id),
        }),
        _ => anyhow::bail!("a cursor requires both --cursor-created-at and --cursor-id"),
    };

    Ok(PageRequest {
        limit: args.limit,
        cursor,
        direction: parse_direction(&args.direction)?,
    })
}

fn parse_cursor_id(raw: &str) -> CursorId {
    raw.parse::<i64>()
        .map(CursorId::Int)
        .unwrap_or_else(|_| CursorId::Str(raw.to_string()))
}

fn parse_direction(raw: &str) -> anyhow::Result<Direction> {
    match raw {
        "next" => Ok(Direction::Next),
        "previous" | "prev" => Ok(Direction::Previous),
        other => anyhow::bail!("invalid direction: {other} (expected next or previous)"),
    }
}

fn print_response(response: ApiResponse, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    match response {
        ApiResponse::Traces(v) => print_traces_human(&v),
        ApiResponse::Alerts(v) => print_alerts_human(&v),
        ApiResponse::Evaluations(v) => print_evaluations_human(&v),
        ApiResponse::Workflows(v) => print_workflows_human(&v),
        ApiResponse::TraceDetail(v) => print_trace_detail_human(&v),
        ApiResponse::Status(v) => print_status_human(&v),
        ApiResponse::Error(e) => eprintln!("error: {e}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_direction_variants() {
        assert!(matches!(parse_direction("next").unwrap(), Direction::Next));
        assert!(matches!(
            parse_direction("previous").unwrap(),
            Direction::Previous
        ));
        assert!(matches!(
            parse_direction("prev").unwrap(),
            Direction::Previous
        ));
        assert!(parse_direction("sideways").is_err());
    }

    #[test]
    fn parse_cursor_id_prefers_integers() {
        assert_eq!(parse_cursor_id("42"), CursorId::Int(42));
        assert_eq!(
            parse_cursor_id("4bf92f3577b34da6"),
            CursorId::Str("4bf92f3577b34da6".to_string())
        );
    }

    #[test]
    fn parse_page_requires_both_cursor_halves() {
        let args = PageArgs {
            limit: 25,
            cursor_created_at: Some("2026-03-01T00:00:00Z".to_string()),
            cursor_id: None,
            direction: "next".to_string(),
        };
        assert!(parse_page(args).is_err());

        let args = PageArgs {
            limit: 25,
            cursor_created_at: Some("2026-03-01T00:00:00Z".to_string()),
            cursor_id: Some("7".to_string()),
            direction: "previous".to_string(),
        };
        let page = parse_page(args).unwrap();
        assert!(matches!(page.direction, Direction::Previous));
        assert_eq!(page.cursor.unwrap().id, CursorId::Int(7));
    }
}
