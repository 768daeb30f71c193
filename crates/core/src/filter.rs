use chrono::{DateTime, Utc};
use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TracedeckError};

// Glob match over service/entity names, e.g. `--service "api-*"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct NameGlob(String);

impl NameGlob {
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TracedeckError::Parse(
                "name filter cannot be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn matches(&self, value: &str) -> bool {
        Pattern::new(&self.0)
            .map(|p| p.matches(value))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeWindow {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        if let Some(since) = self.since
            && ts < since
        {
            return false;
        }
        if let Some(until) = self.until
            && ts > until
        {
            return false;
        }
        true
    }
}
