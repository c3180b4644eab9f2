use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

/// Hands out detection request tokens. Only the most recently started
/// request may apply its result; completion order does not matter.
#[derive(Debug, Clone, Default)]
pub struct DetectionRequests {
    latest: Arc<AtomicU64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DetectionTicket(u64);

impl DetectionTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl DetectionRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) -> DetectionTicket {
        DetectionTicket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_current(&self, ticket: DetectionTicket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }

    /// Runs `apply` with `result` only when `ticket` is still the latest
    /// started request. Returns whether it ran.
    pub fn apply_if_current<T>(
        &self,
        ticket: DetectionTicket,
        result: T,
        apply: impl FnOnce(T),
    ) -> bool {
        if !self.is_current(ticket) {
            debug!(ticket = ticket.id(), "discarding stale detection result");
            return false;
        }
        apply(result);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::DetectionRequests;

    #[test]
    fn later_requests_supersede_earlier_ones() {
        let requests = DetectionRequests::new();
        let first = requests.start();
        let second = requests.start();
        assert!(second > first);
        assert!(!requests.is_current(first));

        let mut applied = Vec::new();
        assert!(!requests.apply_if_current(first, 1, |v| applied.push(v)));
        assert!(requests.apply_if_current(second, 2, |v| applied.push(v)));
        assert_eq!(applied, vec![2]);
    }
}
