use serde::{Deserialize, Serialize};
use tracedeck_core::assemble::TraceDetail;
use tracedeck_core::model::record::{
    AlertRecord, EvaluationRecord, TraceSummary, WorkflowRecord,
};
use tracedeck_core::page::Page;
use tracedeck_core::query::{
    AlertsRequest, EvaluationsRequest, StatusResponse, TraceDetailRequest, TracesRequest,
    WorkflowsRequest,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ApiRequest {
    Traces(TracesRequest),
    Alerts(AlertsRequest),
    Evaluations(EvaluationsRequest),
    Workflows(WorkflowsRequest),
    TraceDetail(TraceDetailRequest),
    Status,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ApiResponse {
    Traces(Page<TraceSummary>),
    Alerts(Page<AlertRecord>),
    Evaluations(Page<EvaluationRecord>),
    Workflows(Page<WorkflowRecord>),
    TraceDetail(Option<TraceDetail>),
    Status(StatusResponse),
    Error(String),
}
