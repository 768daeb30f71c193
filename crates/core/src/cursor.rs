use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Tie-break half of a cursor. Alerts and evaluation rows key on an integer
// id, traces key on their trace_id string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CursorId {
    Int(i64),
    Str(String),
}

impl Ord for CursorId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CursorId::Int(a), CursorId::Int(b)) => a.cmp(b),
            (CursorId::Str(a), CursorId::Str(b)) => a.cmp(b),
            // mixed ids never occur within one resource type; keep the
            // ordering total anyway
            (CursorId::Int(_), CursorId::Str(_)) => Ordering::Less,
            (CursorId::Str(_), CursorId::Int(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for CursorId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CursorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CursorId::Int(v) => write!(f, "{v}"),
            CursorId::Str(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for CursorId {
    fn from(v: i64) -> Self {
        CursorId::Int(v)
    }
}

impl From<&str> for CursorId {
    fn from(v: &str) -> Self {
        CursorId::Str(v.to_string())
    }
}

impl From<String> for CursorId {
    fn from(v: String) -> Self {
        CursorId::Str(v)
    }
}

// A position in the canonical (created_at desc, id desc) order. Cursors are
// portable across pages of the same resource; they denote the boundary, not
// the record itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub created_at: DateTime<Utc>,
    pub id: CursorId,
}

impl Cursor {
    pub fn matches<T: HasCursorKey>(&self, record: &T) -> bool {
        record.created_at() == self.created_at && record.cursor_id() == self.id
    }
}

pub trait HasCursorKey {
    fn created_at(&self) -> DateTime<Utc>;
    fn cursor_id(&self) -> CursorId;

    fn cursor(&self) -> Cursor {
        Cursor {
            created_at: self.created_at(),
            id: self.cursor_id(),
        }
    }
}

pub fn canonical_cmp<T: HasCursorKey>(a: &T, b: &T) -> Ordering {
    b.created_at()
        .cmp(&a.created_at())
        .then_with(|| b.cursor_id().cmp(&a.cursor_id()))
}

pub fn sort_canonical<T: HasCursorKey>(items: &mut [T]) {
    items.sort_by(|a, b| canonical_cmp(a, b));
}
