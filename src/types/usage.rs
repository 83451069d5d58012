//! Usage events recorded by the gate.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of AI operation a request performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Create a new world element from a prompt.
    Generate,
    /// Stream element content as it is produced.
    Stream,
    /// Analyze existing story text for world elements.
    Analyze,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Generate => "generate",
            OperationKind::Stream => "stream",
            OperationKind::Analyze => "analyze",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generate" => Ok(OperationKind::Generate),
            "stream" => Ok(OperationKind::Stream),
            "analyze" => Ok(OperationKind::Analyze),
            other => Err(format!("unknown operation: {other}")),
        }
    }
}

/// A single allowed request, as appended to the recent-events log.
///
/// Events are immutable once recorded. The log keeps insertion order;
/// the rate check scans it for timestamps inside the trailing window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEvent {
    pub operation: OperationKind,
    pub model: String,
    pub timestamp: DateTime<Utc>,
    pub tokens: u64,
}

impl UsageEvent {
    /// Create an event stamped with the current time.
    pub fn now(operation: OperationKind, model: impl Into<String>, tokens: u64) -> Self {
        Self {
            operation,
            model: model.into(),
            timestamp: Utc::now(),
            tokens,
        }
    }
}
