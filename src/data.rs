use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::tree::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    FalsePositive,
    Possible,
    Likely,
    Confirmed,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::FalsePositive => "false_positive",
            Confidence::Possible => "possible",
            Confidence::Likely => "likely",
            Confidence::Confirmed => "confirmed",
        }
    }
}

/// A security issue attached to one or more tree nodes.
///
/// Findings compare by full value equality; `id` alone identifies the finding
/// when an update replaces an older revision in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub id: i64,
    pub title: String,
    pub severity: Severity,
    pub confidence: Confidence,
    pub icon: String,
    pub evidence: Option<String>, // JSON
}

/// How a request/response record was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordOrigin {
    Proxied,
    User,
    Crawler,
    Scanner,
}

impl RecordOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordOrigin::Proxied => "proxied",
            RecordOrigin::User => "user",
            RecordOrigin::Crawler => "crawler",
            RecordOrigin::Scanner => "scanner",
        }
    }

    /// Proxied and user-driven requests count as a manual visit; they clear
    /// the just-discovered flag and any clear-on-visit annotations.
    pub fn is_manual(self) -> bool {
        matches!(self, RecordOrigin::Proxied | RecordOrigin::User)
    }
}

/// A captured request/response event, owned by the external history store.
///
/// The tree holds `Arc` handles to records; a record in turn carries a
/// back-reference to the node it is current for. Records are identified by
/// their numeric id, which is how the past-history dedup compares them.
#[derive(Debug)]
pub struct RequestRecord {
    id: u64,
    origin: RecordOrigin,
    captured_at: DateTime<Utc>,
    node: Mutex<Option<NodeId>>,
}

impl RequestRecord {
    pub fn new(id: u64, origin: RecordOrigin) -> Self {
        Self {
            id,
            origin,
            captured_at: Utc::now(),
            node: Mutex::new(None),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn origin(&self) -> RecordOrigin {
        self.origin
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// The node this record is the current record of, if any.
    pub fn node(&self) -> Option<NodeId> {
        *self.node.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn set_node(&self, node: Option<NodeId>) {
        *self.node.lock().unwrap_or_else(|e| e.into_inner()) = node;
    }
}
