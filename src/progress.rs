// Copyright 2026 Chronosweep Contributors
// SPDX-License-Identifier: Apache-2.0

//! Progress event types and broadcast channel for sweep telemetry.
//!
//! The collector emits `SweepEvent`s as it works. They flow through a
//! `tokio::sync::broadcast` channel to all subscribers (CLI progress bar,
//! log sinks). When no subscriber exists, events are silently dropped.

use serde::{Deserialize, Serialize};

/// An event emitted during a sweep. Serialized to JSON for machine output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SweepEvent {
    /// One page was polled and merged into the collected set.
    PageMerged {
        page: u32,
        rows: usize,
        added: usize,
        total: usize,
    },
    /// A navigation attempt failed and will be retried (or gave up).
    NavigationRetry { attempt: u32, error: String },
    /// Collection finished; the set is ready for verification.
    SweepComplete {
        collected: usize,
        pages: u32,
        elapsed_ms: u64,
    },
}

/// Sender handle for emitting sweep events.
///
/// Backed by a `tokio::sync::broadcast` channel so multiple listeners can
/// subscribe independently. `send()` errors when no listener exists, which
/// we silently ignore (zero cost when nobody's watching).
pub type SweepSender = tokio::sync::broadcast::Sender<SweepEvent>;

/// Receiver handle for consuming sweep events.
pub type SweepReceiver = tokio::sync::broadcast::Receiver<SweepEvent>;

/// Create a new sweep broadcast channel with a bounded buffer.
///
/// 64 events covers a typical sweep: one `PageMerged` per page plus the
/// occasional retry.
pub fn channel() -> (SweepSender, SweepReceiver) {
    tokio::sync::broadcast::channel(64)
}

/// Emit an event, silently ignoring send errors (no receivers listening).
pub fn emit(tx: &Option<SweepSender>, event: SweepEvent) {
    if let Some(sender) = tx {
        let _ = sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_event_serialization() {
        let event = SweepEvent::PageMerged {
            page: 2,
            rows: 30,
            added: 28,
            total: 58,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("PageMerged"));
        assert!(json.contains("58"));

        // Roundtrip
        let parsed: SweepEvent = serde_json::from_str(&json).unwrap();
        match parsed {
            SweepEvent::PageMerged { total, .. } => assert_eq!(total, 58),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_channel_no_receivers() {
        let (tx, rx) = channel();
        drop(rx); // No receivers
                  // Should not panic
        emit(
            &Some(tx),
            SweepEvent::NavigationRetry {
                attempt: 1,
                error: "test".to_string(),
            },
        );
    }

    #[test]
    fn test_emit_none_sender() {
        // Should be a no-op
        emit(
            &None,
            SweepEvent::SweepComplete {
                collected: 0,
                pages: 0,
                elapsed_ms: 0,
            },
        );
    }
}
