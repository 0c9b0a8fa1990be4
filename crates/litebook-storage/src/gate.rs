// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide gate in front of new database sessions.
//!
//! While the gate is closed, [`WriteGate::acquire`] waits; sessions that
//! already hold a [`GatePermit`] keep running. [`WriteGate::pause`] closes the
//! gate and waits, up to a timeout, for outstanding permits to be dropped.
//! The drain is cooperative: a session that outlives the timeout is not
//! interrupted, so pausing does not guarantee zero concurrent writers.
//!
//! Acquisition increments the in-flight count before re-checking the gate, and
//! backs out if the gate closed in between. A pause that observes a zero count
//! after closing therefore cannot miss a session that slipped through.

use std::sync::Arc;
use std::time::Duration;

use litebook_core::LitebookError;
use tokio::sync::watch;
use tracing::{debug, warn};

struct GateInner {
    open: watch::Sender<bool>,
    in_flight: watch::Sender<usize>,
}

/// Cloneable handle; all clones share one gate.
#[derive(Clone)]
pub struct WriteGate {
    inner: Arc<GateInner>,
}

impl Default for WriteGate {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WriteGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteGate")
            .field("open", &self.is_open())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl WriteGate {
    /// A new, open gate.
    pub fn new() -> Self {
        let (open, _) = watch::channel(true);
        let (in_flight, _) = watch::channel(0usize);
        Self {
            inner: Arc::new(GateInner { open, in_flight }),
        }
    }

    pub fn is_open(&self) -> bool {
        *self.inner.open.borrow()
    }

    /// Number of permits currently held.
    pub fn in_flight(&self) -> usize {
        *self.inner.in_flight.borrow()
    }

    /// Close the gate and wait up to `timeout` for in-flight sessions to finish.
    ///
    /// Returns whether every session drained in time. Returns either way.
    pub async fn pause(&self, timeout: Duration) -> bool {
        self.inner.open.send_replace(false);

        let mut in_flight = self.inner.in_flight.subscribe();
        let drained = matches!(
            tokio::time::timeout(timeout, in_flight.wait_for(|n| *n == 0)).await,
            Ok(Ok(_))
        );
        if drained {
            debug!("write gate closed and drained");
        } else {
            warn!(
                remaining = self.in_flight(),
                timeout_ms = timeout.as_millis() as u64,
                "write gate closed but sessions still in flight"
            );
        }
        drained
    }

    /// Reopen the gate unconditionally.
    pub fn resume(&self) {
        self.inner.open.send_replace(true);
        debug!("write gate reopened");
    }

    /// Wait for the gate to be open and take a permit.
    ///
    /// Waits indefinitely; use [`WriteGate::acquire_timeout`] to bound the wait.
    pub async fn acquire(&self) -> GatePermit {
        let mut open = self.inner.open.subscribe();
        loop {
            // The sender lives in `self.inner`, so the channel cannot close here.
            let _ = open.wait_for(|is_open| *is_open).await;

            self.inner.in_flight.send_modify(|n| *n += 1);
            if *self.inner.open.borrow() {
                return GatePermit {
                    inner: Arc::clone(&self.inner),
                };
            }
            // Closed between the wait and the increment: back out and wait again.
            self.inner.in_flight.send_modify(|n| *n -= 1);
        }
    }

    /// Like [`WriteGate::acquire`], giving up with `Timeout` after `limit`.
    pub async fn acquire_timeout(&self, limit: Duration) -> Result<GatePermit, LitebookError> {
        tokio::time::timeout(limit, self.acquire())
            .await
            .map_err(|_| LitebookError::Timeout { duration: limit })
    }
}

/// Proof that a session was admitted. Dropping it releases the slot.
pub struct GatePermit {
    inner: Arc<GateInner>,
}

impl std::fmt::Debug for GatePermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GatePermit")
    }
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.inner
            .in_flight
            .send_modify(|n| *n = n.saturating_sub(1));
    }
}
