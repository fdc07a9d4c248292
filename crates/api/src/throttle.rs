//! Per-client request throttle.
//!
//! A fixed-window counter keyed by client IP: each client gets `limit`
//! requests per 60 second window, counted from its first request in that
//! window. Bursts straddling a window boundary can reach twice the limit.
//!
//! Idle entries are dropped by a background reaper (see
//! [`RequestThrottle::spawn_reaper`]) so memory tracks active clients only.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Length of one counting window.
pub const WINDOW: Duration = Duration::from_secs(60);

/// How often the reaper runs.
pub const REAP_INTERVAL: Duration = Duration::from_secs(60);

/// Entries unseen for longer than this are reaped.
pub const IDLE_TTL: Duration = Duration::from_secs(180);

/// Outcome of a throttle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied,
}

impl Admission {
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

#[derive(Debug, Clone, Copy)]
struct Visitor {
    count: u32,
    window_start: Instant,
    last_seen: Instant,
}

impl Visitor {
    const fn first(now: Instant) -> Self {
        Self {
            count: 1,
            window_start: now,
            last_seen: now,
        }
    }
}

/// Shared fixed-window throttle.
///
/// One mutex guards the whole map; it is never held across an `.await`.
#[derive(Debug)]
pub struct RequestThrottle {
    limit: u32,
    visitors: Mutex<HashMap<IpAddr, Visitor>>,
}

impl RequestThrottle {
    /// Create a throttle admitting `limit` requests per client per window.
    #[must_use]
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            visitors: Mutex::new(HashMap::new()),
        }
    }

    /// Requests admitted per client per window.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Count a request from `key` against the current window.
    pub fn admit(&self, key: IpAddr) -> Admission {
        self.admit_at(key, Instant::now())
    }

    /// [`admit`](Self::admit) with an explicit clock reading.
    ///
    /// A denied request leaves the entry untouched; `last_seen` only moves
    /// on admission.
    pub fn admit_at(&self, key: IpAddr, now: Instant) -> Admission {
        let mut visitors = self.lock();

        match visitors.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(Visitor::first(now));
                Admission::Allowed
            }
            Entry::Occupied(mut slot) => {
                let visitor = slot.get_mut();
                if now.saturating_duration_since(visitor.window_start) >= WINDOW {
                    *visitor = Visitor::first(now);
                    Admission::Allowed
                } else if visitor.count < self.limit {
                    visitor.count += 1;
                    visitor.last_seen = now;
                    Admission::Allowed
                } else {
                    Admission::Denied
                }
            }
        }
    }

    /// Drop entries idle for longer than [`IDLE_TTL`]. Returns how many
    /// were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// [`sweep`](Self::sweep) with an explicit clock reading.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut visitors = self.lock();
        let before = visitors.len();
        visitors.retain(|_, v| now.saturating_duration_since(v.last_seen) <= IDLE_TTL);
        before - visitors.len()
    }

    /// Number of tracked clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start the background reaper.
    ///
    /// The task holds only a weak reference and exits on the first tick
    /// after the last strong reference is dropped.
    #[must_use]
    pub fn spawn_reaper(self: &Arc<Self>) -> JoinHandle<()> {
        let throttle = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval_at(Instant::now() + REAP_INTERVAL, REAP_INTERVAL);

            loop {
                ticker.tick().await;
                let Some(throttle) = throttle.upgrade() else {
                    tracing::debug!("throttle dropped, reaper exiting");
                    break;
                };

                let removed = throttle.sweep();
                if removed > 0 {
                    tracing::debug!(removed, remaining = throttle.len(), "reaped idle clients");
                }
            }
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<IpAddr, Visitor>> {
        // The map only holds plain counters, so a poisoned guard is still usable.
        self.visitors.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
