//! Ledger events and the sinks that receive them
//!
//! The ledger hands every event to an [`EventSink`] after the state change it
//! describes has been applied. What happens to the event afterwards is the
//! sink's business.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::token::{Address, Amount};

/// Default number of records kept by an [`EventLog`]
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 100;

/// Transfer event (emitted when tokens are transferred)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
}

/// Approval event (emitted when allowance is set)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalEvent {
    pub owner: Address,
    pub spender: Address,
    pub amount: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEvent {
    Transfer(TransferEvent),
    Approval(ApprovalEvent),
}

impl From<TransferEvent> for LedgerEvent {
    fn from(event: TransferEvent) -> Self {
        LedgerEvent::Transfer(event)
    }
}

impl From<ApprovalEvent> for LedgerEvent {
    fn from(event: ApprovalEvent) -> Self {
        LedgerEvent::Approval(event)
    }
}

/// Receiver of ledger events
pub trait EventSink {
    fn emit(&mut self, event: LedgerEvent);
}

impl EventSink for Vec<LedgerEvent> {
    fn emit(&mut self, event: LedgerEvent) {
        self.push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: LedgerEvent) {
        (**self).emit(event);
    }
}

/// Discards every event
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: LedgerEvent) {}
}

/// Writes every event to the log at info level
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&mut self, event: LedgerEvent) {
        match event {
            LedgerEvent::Transfer(t) => {
                log::info!("Transfer: {} -> {} ({})", t.from, t.to, t.amount)
            }
            LedgerEvent::Approval(a) => {
                log::info!("Approval: {} allows {} ({})", a.owner, a.spender, a.amount)
            }
        }
    }
}

/// Forwards every event to two sinks, first then second
#[derive(Clone, Debug, Default)]
pub struct Tee<A, B>(pub A, pub B);

impl<A: EventSink, B: EventSink> EventSink for Tee<A, B> {
    fn emit(&mut self, event: LedgerEvent) {
        self.0.emit(event.clone());
        self.1.emit(event);
    }
}

impl<B> AsRef<EventLog> for Tee<EventLog, B> {
    fn as_ref(&self) -> &EventLog {
        &self.0
    }
}

/// An event stamped with its position and time of recording
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub sequence: u64,
    pub recorded_at: DateTime<Utc>,
    pub event: LedgerEvent,
}

/// Bounded in-memory event history
///
/// Keeps the most recent `capacity` events; sequence numbers keep counting
/// across evictions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventLog {
    capacity: usize,
    next_sequence: u64,
    records: VecDeque<RecordedEvent>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_LOG_CAPACITY)
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            next_sequence: 0,
            records: VecDeque::with_capacity(capacity.min(DEFAULT_EVENT_LOG_CAPACITY)),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total number of events ever recorded, including evicted ones
    pub fn total_recorded(&self) -> u64 {
        self.next_sequence
    }

    /// Recorded events, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &RecordedEvent> {
        self.records.iter()
    }

    /// The `count` most recent events, oldest first
    pub fn recent(&self, count: usize) -> Vec<&RecordedEvent> {
        let skip = self.records.len().saturating_sub(count);
        self.records.iter().skip(skip).collect()
    }

    /// Transfer events involving `address` as sender or recipient
    pub fn transfers_for(&self, address: &Address) -> Vec<&TransferEvent> {
        self.records
            .iter()
            .filter_map(|r| match &r.event {
                LedgerEvent::Transfer(t) if t.from == *address || t.to == *address => Some(t),
                _ => None,
            })
            .collect()
    }
}

impl AsRef<EventLog> for EventLog {
    fn as_ref(&self) -> &EventLog {
        self
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: LedgerEvent) {
        if self.capacity == 0 {
            self.next_sequence += 1;
            return;
        }

        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }

        self.records.push_back(RecordedEvent {
            sequence: self.next_sequence,
            recorded_at: Utc::now(),
            event,
        });
        self.next_sequence += 1;
    }
}
