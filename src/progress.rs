//! Progress reporting for work-items.
//!
//! Work-items report what they are doing through an injected [`ProgressSink`]
//! instead of printing, so the pipeline core stays independent of any output
//! channel.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};

/// What a progress event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressKind {
    Started,
    Completed,
    Failed,
}

/// A single progress report from a work-item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Name of the reporting work-item.
    pub step: String,
    pub kind: ProgressKind,
    pub message: String,
}

impl ProgressEvent {
    pub fn new(step: impl Into<String>, kind: ProgressKind, message: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            kind,
            message: message.into(),
        }
    }
}

/// Receives progress events. Shared across concurrently running work-items.
pub trait ProgressSink: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Forwards progress events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn report(&self, event: ProgressEvent) {
        match event.kind {
            ProgressKind::Failed => {
                warn!(step = %event.step, kind = ?event.kind, "{}", event.message)
            }
            _ => info!(step = %event.step, kind = ?event.kind, "{}", event.message),
        }
    }
}

/// Records progress events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events in arrival order.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of `Started` events reported by `step`.
    pub fn started_count(&self, step: &str) -> usize {
        self.count(step, ProgressKind::Started)
    }

    /// Number of events of `kind` reported by `step`.
    pub fn count(&self, step: &str, kind: ProgressKind) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|event| event.step == step && event.kind == kind)
            .count()
    }

    /// Messages of `Completed` events in arrival order.
    pub fn completed_messages(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|event| event.kind == ProgressKind::Completed)
            .map(|event| event.message.clone())
            .collect()
    }
}

impl ProgressSink for MemorySink {
    fn report(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
