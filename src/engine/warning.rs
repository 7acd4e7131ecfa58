//! Non-fatal warnings, deduplicated by kind.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Kinds of soft warning. At most one warning of each kind is kept per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    EmptySelection,
    ClipNotFound,
    SessionClipNotSliced,
    SessionClipNotShuffled,
    SyncSkipped,
}

/// A recorded warning: its kind and the message of its first occurrence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Warnings {
    entries: BTreeMap<WarningKind, Warning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning unless one of the same kind already exists.
    pub fn record(&mut self, kind: WarningKind, message: impl Into<String>) {
        self.entries.entry(kind).or_insert_with(|| {
            let message = message.into();
            tracing::warn!(?kind, "{message}");
            Warning { kind, message }
        });
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.entries.into_values().collect()
    }
}
