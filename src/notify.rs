//! Change notifications handed to the real-time transport after each write.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// `{event, table, record}` built from a `RETURNING` row.
#[derive(Clone, Debug, Serialize)]
pub struct ChangeEvent {
    pub event: ChangeKind,
    pub table: String,
    pub record: Value,
}

pub trait ChangeSink: Send + Sync {
    fn publish(&self, event: ChangeEvent);
}

/// Logs events; used when no transport is attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingChangeSink;

impl ChangeSink for TracingChangeSink {
    fn publish(&self, event: ChangeEvent) {
        tracing::debug!(event = ?event.event, table = %event.table, "change");
    }
}

/// Fans events out to any number of subscribers. Events published with no subscriber are discarded.
#[derive(Clone, Debug)]
pub struct BroadcastChangeSink {
    tx: broadcast::Sender<ChangeEvent>,
}

impl BroadcastChangeSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        BroadcastChangeSink { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl ChangeSink for BroadcastChangeSink {
    fn publish(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }
}

/// One event per returned row.
pub fn publish_rows(sink: &dyn ChangeSink, kind: ChangeKind, table: &str, rows: &[Value]) {
    for record in rows {
        sink.publish(ChangeEvent {
            event: kind,
            table: table.to_string(),
            record: record.clone(),
        });
    }
}
