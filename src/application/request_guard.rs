// Guard against out-of-order completion of overlapping polls
use crate::application::log_sink::LogSink;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Consecutive stale completions after which the sink gets a warning, and
/// again at every further multiple.
pub const STALE_WARN_STREAK: u32 = 5;

/// Identifies one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// Tracks the most recently issued request for one group of display fields.
/// A response may only be applied while its ticket is still the latest one.
#[derive(Debug, Default)]
pub struct LatestRequestGuard {
    issued: AtomicU64,
    stale_streak: AtomicU32,
}

impl LatestRequestGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> RequestTicket {
        RequestTicket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_latest(&self, ticket: RequestTicket) -> bool {
        let latest = self.issued.load(Ordering::SeqCst) == ticket.0;
        if latest {
            self.stale_streak.store(0, Ordering::SeqCst);
        } else {
            self.stale_streak.fetch_add(1, Ordering::SeqCst);
        }
        latest
    }

    /// Stale completions since the last accepted one.
    pub fn stale_streak(&self) -> u32 {
        self.stale_streak.load(Ordering::SeqCst)
    }

    /// `is_latest`, warning the sink when `what` keeps arriving too late to
    /// be shown (backend slower than the poll period).
    pub fn admit(&self, ticket: RequestTicket, sink: &LogSink, what: &str) -> bool {
        if self.is_latest(ticket) {
            return true;
        }

        let streak = self.stale_streak();
        tracing::debug!("Dropping stale {} response ({} in a row)", what, streak);
        if streak % STALE_WARN_STREAK == 0 {
            sink.warn(format!(
                "Dropped {} {} responses in a row: the backend answers slower than it is polled",
                streak, what
            ));
        }
        false
    }
}
