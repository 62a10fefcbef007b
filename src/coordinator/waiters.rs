//! FIFO queue of requests blocked on a refresh.

use std::collections::VecDeque;
use tokio::sync::oneshot;

use crate::error::AuthError;

/// What a waiter is resumed with: the new access token, or the reason the
/// refresh failed.
pub type WaiterOutcome = Result<String, AuthError>;

/// Identifies a queued waiter so it can be withdrawn.
pub type WaiterId = u64;

/// Per-tab waiter queue. Insertion order is wake order.
#[derive(Debug, Default)]
pub struct WaiterQueue {
    next_id: WaiterId,
    entries: VecDeque<(WaiterId, oneshot::Sender<WaiterOutcome>)>,
}

impl WaiterQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a waiter.
    pub fn enqueue(&mut self) -> (WaiterId, oneshot::Receiver<WaiterOutcome>) {
        let id = self.next_id;
        self.next_id += 1;
        let (tx, rx) = oneshot::channel();
        self.entries.push_back((id, tx));
        (id, rx)
    }

    /// Remove a waiter whose caller went away. Returns whether it was queued.
    pub fn withdraw(&mut self, id: WaiterId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Resume every waiter with `token`, oldest first. Returns how many were
    /// still listening.
    pub fn resolve_all(&mut self, token: &str) -> usize {
        self.settle_all(|| Ok(token.to_string()))
    }

    /// Fail every waiter with `error`, oldest first.
    pub fn reject_all(&mut self, error: &AuthError) -> usize {
        self.settle_all(|| Err(error.clone()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn settle_all(&mut self, outcome: impl Fn() -> WaiterOutcome) -> usize {
        self.entries
            .drain(..)
            .filter(|(_, tx)| !tx.is_closed())
            .map(|(_, tx)| tx.send(outcome()).is_ok())
            .filter(|delivered| *delivered)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_in_enqueue_order() {
        let mut queue = WaiterQueue::new();
        let mut receivers: Vec<_> = (0..3).map(|_| queue.enqueue().1).collect();
        assert_eq!(queue.len(), 3);

        assert_eq!(queue.resolve_all("token"), 3);
        assert!(queue.is_empty());
        for rx in receivers.iter_mut() {
            assert_eq!(rx.try_recv().unwrap(), Ok("token".to_string()));
        }
    }

    #[test]
    fn test_reject_all() {
        let mut queue = WaiterQueue::new();
        let (_, mut rx) = queue.enqueue();
        assert_eq!(queue.reject_all(&AuthError::SessionExpired), 1);
        assert_eq!(rx.try_recv().unwrap(), Err(AuthError::SessionExpired));
    }

    #[test]
    fn test_withdraw_leaves_others() {
        let mut queue = WaiterQueue::new();
        let (first, _rx1) = queue.enqueue();
        let (_, mut rx2) = queue.enqueue();

        assert!(queue.withdraw(first));
        assert!(!queue.withdraw(first));
        assert_eq!(queue.len(), 1);

        queue.resolve_all("t");
        assert_eq!(rx2.try_recv().unwrap(), Ok("t".to_string()));
    }

    #[test]
    fn test_dropped_receivers_are_not_counted() {
        let mut queue = WaiterQueue::new();
        let (_, rx) = queue.enqueue();
        let (_, _kept) = queue.enqueue();
        drop(rx);
        assert_eq!(queue.resolve_all("t"), 1);
    }
}
