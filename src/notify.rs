//! Notification boundary.
//!
//! Game events are timestamped, logged, and kept in a bounded log for
//! polling clients. Nothing here feeds back into the game.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::info;

use crate::types::GameEvent;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: GameEvent,
}

pub struct Notifier {
    log: VecDeque<EventRecord>,
    capacity: usize,
    next_seq: u64,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        Self {
            log: VecDeque::with_capacity(capacity),
            capacity,
            next_seq: 1,
        }
    }

    pub fn publish(&mut self, event: GameEvent) {
        let record = EventRecord {
            seq: self.next_seq,
            timestamp: Utc::now(),
            event,
        };
        self.next_seq += 1;

        info!(seq = record.seq, "{}", record.event);

        if self.capacity > 0 {
            if self.log.len() == self.capacity {
                self.log.pop_front();
            }
            self.log.push_back(record);
        }
    }

    /// Oldest first.
    pub fn recent(&self) -> Vec<EventRecord> {
        self.log.iter().cloned().collect()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(100)
    }
}
