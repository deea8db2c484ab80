//! Bounded FIFO learning queue
//!
//! Pushing never blocks and never fails: when the queue is full the oldest
//! event is evicted to make room.

use parking_lot::Mutex;
use std::collections::VecDeque;
use tradehive_common::LearningEvent;
use uuid::Uuid;

pub struct LearningQueue {
    events: Mutex<VecDeque<LearningEvent>>,
    capacity: usize,
}

impl LearningQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append an event, returning the evicted one when the queue was full
    pub fn push(&self, event: LearningEvent) -> Option<LearningEvent> {
        let mut events = self.events.lock();
        let evicted = if events.len() >= self.capacity {
            events.pop_front()
        } else {
            None
        };
        events.push_back(event);
        evicted
    }

    /// Remove up to `max` events, oldest first
    pub fn drain(&self, max: usize) -> Vec<LearningEvent> {
        let mut events = self.events.lock();
        let n = max.min(events.len());
        events.drain(..n).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.events.lock().iter().any(|e| &e.id == id)
    }

    /// Id of the oldest queued event
    pub fn front_id(&self) -> Option<Uuid> {
        self.events.lock().front().map(|e| e.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tradehive_common::LearningEventType;

    fn event() -> LearningEvent {
        LearningEvent::new(LearningEventType::Session, "test")
    }

    #[test]
    fn test_fifo_order() {
        let queue = LearningQueue::new(4);
        let ids: Vec<Uuid> = (0..3)
            .map(|_| {
                let e = event();
                let id = e.id;
                queue.push(e);
                id
            })
            .collect();

        let drained: Vec<Uuid> = queue.drain(10).iter().map(|e| e.id).collect();
        assert_eq!(drained, ids);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_evicts_oldest_when_full() {
        let queue = LearningQueue::new(2);
        let first = event();
        let first_id = first.id;
        assert!(queue.push(first).is_none());
        assert!(queue.push(event()).is_none());

        let evicted = queue.push(event()).unwrap();
        assert_eq!(evicted.id, first_id);
        assert_eq!(queue.len(), 2);
        assert!(!queue.contains(&first_id));
    }

    #[test]
    fn test_partial_drain() {
        let queue = LearningQueue::new(10);
        for _ in 0..5 {
            queue.push(event());
        }
        assert_eq!(queue.drain(2).len(), 2);
        assert_eq!(queue.len(), 3);
    }

    proptest! {
        #[test]
        fn prop_queue_never_exceeds_capacity(capacity in 1usize..32, pushes in 0usize..100) {
            let queue = LearningQueue::new(capacity);
            let mut first = None;
            for i in 0..pushes {
                let e = event();
                if i == 0 {
                    first = Some(e.id);
                }
                queue.push(e);
                prop_assert!(queue.len() <= capacity);
            }
            if pushes > capacity {
                prop_assert!(!queue.contains(&first.unwrap()));
            }
        }
    }
}
