use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::debug;

/// Sequence number handed out when a request starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn seq(self) -> u64 {
        self.0
    }
}

/// Holds the value produced by the most recently *issued* request.
///
/// Requests may complete out of order. A response is only stored if no newer
/// request has been issued since its ticket was taken; late responses from
/// superseded requests are dropped.
pub struct LatestSlot<T> {
    name: &'static str,
    issued: AtomicU64,
    current: RwLock<Option<(Ticket, T)>>,
}

impl<T: Clone> LatestSlot<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            issued: AtomicU64::new(0),
            current: RwLock::new(None),
        }
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_latest(&self, ticket: Ticket) -> bool {
        self.issued.load(Ordering::SeqCst) == ticket.0
    }

    /// Store `value` if `ticket` is still the newest issued. Returns whether it was stored.
    pub async fn publish(&self, ticket: Ticket, value: T) -> bool {
        let mut current = self.current.write().await;
        if !self.is_latest(ticket) {
            debug!(
                slot = self.name,
                seq = ticket.0,
                latest = self.issued.load(Ordering::SeqCst),
                "discarding superseded response"
            );
            return false;
        }
        *current = Some((ticket, value));
        true
    }

    pub async fn snapshot(&self) -> Option<T> {
        self.current.read().await.as_ref().map(|(_, v)| v.clone())
    }

    /// Drop the stored value on behalf of `ticket`, e.g. when a new analysis
    /// starts. A superseded ticket leaves the slot untouched.
    pub async fn clear(&self, ticket: Ticket) -> bool {
        let mut current = self.current.write().await;
        if !self.is_latest(ticket) {
            return false;
        }
        *current = None;
        true
    }
}
