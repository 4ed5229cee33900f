//! Expiration sweeper — finds lapsed pending proposals and drives them
//! through the shared expire transition.
//!
//! The sweeper owns no transition logic of its own: every lapsed proposal
//! goes through the exact same path as a user-driven resolution, so the
//! check-and-set discipline settles races between a user accepting at the
//! instant of expiry and the sweep (one deterministic winner).
//!
//! The timer lives in [`SweepScheduler`], a separate component with an
//! explicit start/stop lifecycle. [`ExpirationSweeper::force_check`] and
//! the timer call the same [`ExpirationSweeper::tick`]; tests drive ticks
//! directly with no real timers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::Utc;

use stayswap_intake::ProposalBook;

use crate::manager::LifecycleManager;

/// Result of one sweep pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Lapsed pending proposals found.
    pub scanned: usize,
    /// Successfully expired.
    pub processed: usize,
    /// Failed (logged and counted; never aborts the batch).
    pub failed: usize,
}

/// Counters exposed for external health reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweeperHealth {
    pub total_checks_performed: u64,
    pub total_swaps_processed: u64,
    pub last_error: Option<String>,
}

/// Periodic reaper for lapsed pending proposals.
pub struct ExpirationSweeper {
    manager: Arc<LifecycleManager>,
    proposals: Arc<ProposalBook>,
    total_checks: AtomicU64,
    total_processed: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl ExpirationSweeper {
    #[must_use]
    pub fn new(manager: Arc<LifecycleManager>, proposals: Arc<ProposalBook>) -> Self {
        Self {
            manager,
            proposals,
            total_checks: AtomicU64::new(0),
            total_processed: AtomicU64::new(0),
            last_error: Mutex::new(None),
        }
    }

    /// One sweep pass: expire every lapsed pending proposal, continuing
    /// past individual failures.
    pub fn tick(&self) -> SweepOutcome {
        self.total_checks.fetch_add(1, Ordering::Relaxed);
        let now = Utc::now();
        let lapsed = self.proposals.expired_pending(now);
        let scanned = lapsed.len();
        let mut processed = 0;
        let mut failed = 0;

        for proposal in lapsed {
            match self.manager.expire(proposal.id) {
                Ok(_) => {
                    processed += 1;
                    self.total_processed.fetch_add(1, Ordering::Relaxed);
                }
                Err(err) => {
                    failed += 1;
                    tracing::warn!(
                        proposal = %proposal.id,
                        error = %err,
                        "failed to expire lapsed proposal; continuing sweep"
                    );
                    *self
                        .last_error
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner) = Some(err.to_string());
                }
            }
        }

        if scanned > 0 {
            tracing::info!(scanned, processed, failed, "expiration sweep complete");
        }
        SweepOutcome {
            scanned,
            processed,
            failed,
        }
    }

    /// Manual trigger — the identical code path as the timer-driven tick.
    pub fn force_check(&self) -> SweepOutcome {
        self.tick()
    }

    /// Health snapshot.
    #[must_use]
    pub fn health(&self) -> SweeperHealth {
        SweeperHealth {
            total_checks_performed: self.total_checks.load(Ordering::Relaxed),
            total_swaps_processed: self.total_processed.load(Ordering::Relaxed),
            last_error: self
                .last_error
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }
}

/// Owns the sweep timer: injected sweeper, explicit start/stop.
///
/// Stopping (or dropping) the scheduler wakes the loop thread and joins
/// it. A tick already in progress finishes first.
pub struct SweepScheduler {
    stop: Arc<(Mutex<bool>, Condvar)>,
    handle: Option<JoinHandle<()>>,
}

impl SweepScheduler {
    /// Spawn the sweep loop with the given interval.
    #[must_use]
    pub fn start(sweeper: Arc<ExpirationSweeper>, interval: Duration) -> Self {
        let stop = Arc::new((Mutex::new(false), Condvar::new()));
        let loop_stop = Arc::clone(&stop);
        let handle = std::thread::spawn(move || {
            let (flag, condvar) = &*loop_stop;
            loop {
                let stopped = flag.lock().unwrap_or_else(PoisonError::into_inner);
                let (stopped, _timeout) = condvar
                    .wait_timeout(stopped, interval)
                    .unwrap_or_else(PoisonError::into_inner);
                if *stopped {
                    break;
                }
                drop(stopped);
                sweeper.tick();
            }
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Stop the loop and join the thread.
    pub fn stop(&mut self) {
        let (flag, condvar) = &*self.stop;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        condvar.notify_all();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SweepScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
