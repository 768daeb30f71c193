use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cursor::{CursorId, HasCursorKey};

// One row in the trace list, derived from a trace's root span.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceSummary {
    pub trace_id: String,
    pub root_name: String,
    pub service: String,
    pub created_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub span_count: usize,
    pub status: String,
}

impl HasCursorKey for TraceSummary {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn cursor_id(&self) -> CursorId {
        CursorId::Str(self.trace_id.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertRecord {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub entity: String,
    pub drift_type: String,
    pub active: bool,
}

impl HasCursorKey for AlertRecord {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn cursor_id(&self) -> CursorId {
        CursorId::Int(self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationRecord {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub evaluation_type: String,
}

impl HasCursorKey for EvaluationRecord {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn cursor_id(&self) -> CursorId {
        CursorId::Int(self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowRecord {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub status: String,
}

impl HasCursorKey for WorkflowRecord {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn cursor_id(&self) -> CursorId {
        CursorId::Int(self.id)
    }
}
