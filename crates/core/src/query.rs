use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cursor::Cursor;
use crate::filter::{NameGlob, TimeWindow};
use crate::page::Direction;

pub const DEFAULT_PAGE_LIMIT: usize = 25;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: usize,
    pub cursor: Option<Cursor>,
    pub direction: Direction,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            cursor: None,
            direction: Direction::Next,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TracesRequest {
    pub service: Option<NameGlob>,
    pub status: Option<String>,
    pub window: TimeWindow,
    pub page: PageRequest,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertsRequest {
    pub entity: Option<NameGlob>,
    pub drift_type: Option<String>,
    pub active: Option<bool>,
    pub window: TimeWindow,
    pub page: PageRequest,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationsRequest {
    pub name: Option<NameGlob>,
    pub evaluation_type: Option<String>,
    pub window: TimeWindow,
    pub page: PageRequest,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowsRequest {
    pub status: Option<String>,
    pub window: TimeWindow,
    pub page: PageRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceDetailRequest {
    pub trace_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub db_path: String,
    pub db_size_bytes: u64,
    pub traces_count: usize,
    pub spans_count: usize,
    pub alerts_count: usize,
    pub evaluations_count: usize,
    pub workflows_count: usize,
    pub oldest_ts: Option<DateTime<Utc>>,
    pub newest_ts: Option<DateTime<Utc>>,
}
