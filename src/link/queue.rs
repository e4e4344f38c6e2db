//! # Outbound Queue
//!
//! Bounded FIFO of reply payloads waiting for a link turn.
//!
//! The queue keeps one of its `capacity` slots in reserve, so at most
//! `capacity - 1` payloads are ever pending. Enqueueing onto a full queue
//! drops the new payload: operators see back-pressure, the link never
//! sends a burst of stale replies.

use std::collections::VecDeque;
use tracing::debug;

use super::protocol::OutboundPayload;

/// Result of an enqueue attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Payload appended
    Queued,
    /// Queue was full; payload discarded
    Dropped,
}

/// Single-producer / single-consumer reply queue
#[derive(Debug, Clone)]
pub struct OutboundQueue {
    items: VecDeque<OutboundPayload>,
    capacity: usize,
}

impl OutboundQueue {
    /// Create a queue with `capacity` slots (`capacity - 1` usable).
    ///
    /// Capacities below two are raised to two so one payload always fits.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            items: VecDeque::with_capacity(capacity - 1),
            capacity,
        }
    }

    /// Append a payload unless the queue is full
    pub fn enqueue(&mut self, payload: OutboundPayload) -> EnqueueOutcome {
        if self.is_full() {
            debug!("Outbound queue full ({} pending), dropping {}", self.items.len(), payload);
            return EnqueueOutcome::Dropped;
        }

        self.items.push_back(payload);
        EnqueueOutcome::Queued
    }

    /// Remove the oldest payload, or hand out the keepalive when empty
    pub fn dequeue(&mut self) -> OutboundPayload {
        self.items.pop_front().unwrap_or_else(OutboundPayload::keepalive)
    }

    /// Drop every pending payload, returning how many were removed
    pub fn clear(&mut self) -> usize {
        let removed = self.items.len();
        self.items.clear();
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.usable_slots()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Configured slot count, including the reserved slot
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Maximum number of pending payloads
    pub fn usable_slots(&self) -> usize {
        self.capacity - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(v: f64) -> OutboundPayload {
        OutboundPayload::set_value(v)
    }

    #[test]
    fn test_new_queue_is_empty() {
        let queue = OutboundQueue::new(10);
        assert!(queue.is_empty());
        assert!(!queue.is_full());
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.capacity(), 10);
        assert_eq!(queue.usable_slots(), 9);
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = OutboundQueue::new(10);
        queue.enqueue(value(1.0));
        queue.enqueue(OutboundPayload::ping_ack());
        queue.enqueue(value(3.0));

        assert_eq!(queue.dequeue().as_str(), "2,1.00");
        assert_eq!(queue.dequeue().as_str(), "1,000.00");
        assert_eq!(queue.dequeue().as_str(), "2,3.00");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_dequeue_empty_returns_keepalive() {
        let mut queue = OutboundQueue::new(5);
        for _ in 0..3 {
            assert_eq!(queue.dequeue(), OutboundPayload::keepalive());
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_never_exceeds_usable_slots() {
        for capacity in 2..=12 {
            let mut queue = OutboundQueue::new(capacity);
            for i in 0..(capacity * 3) {
                let outcome = queue.enqueue(value(i as f64));
                if i < capacity - 1 {
                    assert_eq!(outcome, EnqueueOutcome::Queued);
                } else {
                    assert_eq!(outcome, EnqueueOutcome::Dropped);
                }
                assert!(queue.len() <= capacity - 1);
            }
            assert_eq!(queue.len(), capacity - 1);
            assert!(queue.is_full());
        }
    }

    #[test]
    fn test_full_queue_drops_newest() {
        let mut queue = OutboundQueue::new(3);
        queue.enqueue(value(1.0));
        queue.enqueue(value(2.0));
        assert_eq!(queue.enqueue(value(3.0)), EnqueueOutcome::Dropped);

        // Oldest items survive, the rejected one never appears
        assert_eq!(queue.dequeue().as_str(), "2,1.00");
        assert_eq!(queue.dequeue().as_str(), "2,2.00");
        assert!(queue.dequeue().is_keepalive());
    }

    #[test]
    fn test_space_frees_after_dequeue() {
        let mut queue = OutboundQueue::new(2);
        assert_eq!(queue.enqueue(value(1.0)), EnqueueOutcome::Queued);
        assert_eq!(queue.enqueue(value(2.0)), EnqueueOutcome::Dropped);
        queue.dequeue();
        assert_eq!(queue.enqueue(value(2.0)), EnqueueOutcome::Queued);
    }

    #[test]
    fn test_clear_returns_removed_count() {
        let mut queue = OutboundQueue::new(10);
        queue.enqueue(value(1.0));
        queue.enqueue(value(2.0));
        queue.enqueue(value(3.0));

        assert_eq!(queue.clear(), 3);
        assert!(queue.is_empty());
        assert_eq!(queue.clear(), 0);
    }

    #[test]
    fn test_tiny_capacity_is_raised() {
        let mut queue = OutboundQueue::new(0);
        assert_eq!(queue.capacity(), 2);
        assert_eq!(queue.enqueue(value(1.0)), EnqueueOutcome::Queued);
        assert_eq!(queue.enqueue(value(2.0)), EnqueueOutcome::Dropped);
    }
}
