//! Bounded consensus signal history

use parking_lot::RwLock;
use std::collections::VecDeque;
use tradehive_common::ConsensusSignal;

/// Ring of emitted signals; the oldest is evicted on overflow
pub struct SignalHistory {
    ring: RwLock<VecDeque<ConsensusSignal>>,
    capacity: usize,
}

impl SignalHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append a signal, returning the evicted one on overflow
    pub fn push(&self, signal: ConsensusSignal) -> Option<ConsensusSignal> {
        let mut ring = self.ring.write();
        let evicted = if ring.len() >= self.capacity {
            ring.pop_front()
        } else {
            None
        };
        ring.push_back(signal);
        evicted
    }

    /// Up to `limit` signals, newest first
    pub fn latest(&self, limit: usize) -> Vec<ConsensusSignal> {
        self.ring.read().iter().rev().take(limit).cloned().collect()
    }

    /// Every signal, oldest first
    pub fn to_vec(&self) -> Vec<ConsensusSignal> {
        self.ring.read().iter().cloned().collect()
    }

    /// Replace the contents, keeping the newest `capacity` entries
    pub fn restore(&self, signals: Vec<ConsensusSignal>) {
        let skip = signals.len().saturating_sub(self.capacity);
        *self.ring.write() = signals.into_iter().skip(skip).collect();
    }

    pub fn len(&self) -> usize {
        self.ring.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use tradehive_common::SignalDirection;
    use uuid::Uuid;

    fn signal(ts: i64) -> ConsensusSignal {
        ConsensusSignal {
            id: Uuid::now_v7(),
            direction: SignalDirection::Buy,
            confidence: 0.9,
            contributing_agent_ids: BTreeSet::new(),
            reasoning: String::new(),
            timestamp: ts,
        }
    }

    #[test]
    fn test_latest_is_newest_first() {
        let history = SignalHistory::new(5);
        for ts in 0..3 {
            history.push(signal(ts));
        }
        let stamps: Vec<i64> = history.latest(2).iter().map(|s| s.timestamp).collect();
        assert_eq!(stamps, vec![2, 1]);
    }

    #[test]
    fn test_restore_keeps_newest() {
        let history = SignalHistory::new(2);
        history.restore((0..5).map(signal).collect());
        let stamps: Vec<i64> = history.to_vec().iter().map(|s| s.timestamp).collect();
        assert_eq!(stamps, vec![3, 4]);
    }

    proptest! {
        #[test]
        fn prop_history_bound_and_fifo(pushes in 0i64..60) {
            let history = SignalHistory::new(20);
            for ts in 0..pushes {
                let evicted = history.push(signal(ts));
                if ts >= 20 {
                    prop_assert_eq!(evicted.map(|s| s.timestamp), Some(ts - 20));
                } else {
                    prop_assert!(evicted.is_none());
                }
                prop_assert!(history.len() <= 20);
            }
            let stamps: Vec<i64> = history.to_vec().iter().map(|s| s.timestamp).collect();
            let expected: Vec<i64> = ((pushes - 20).max(0)..pushes).collect();
            prop_assert_eq!(stamps, expected);
        }
    }
}
