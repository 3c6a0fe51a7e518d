//! Tracking poller.
//!
//! A small state machine over {Idle, Tracking}. Submitting a valid tracking
//! code moves to Tracking; while simulation is enabled a periodic timer
//! re-reads the shipment by code and advances its status exactly one step
//! along Pending → In Transit → Delivered through the shipment manager.
//! Reaching Delivered or losing the record stops the timer and returns to
//! Idle.
//!
//! At most one timer is ever active: submitting a new code or toggling
//! simulation cancels the previous timer before anything else happens, and
//! cancellation is idempotent. The synchronous [`Tracker::tick`] core is
//! driven by the async [`Tracker::run`] loop, so the state machine is
//! testable without timers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::Result;
use crate::model::Shipment;
use crate::shipments::ShipmentManager;

/// Poller state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerState {
    /// No shipment is being tracked.
    Idle,
    /// A shipment is being tracked by code.
    Tracking {
        /// The canonical tracking code of the shipment.
        code: String,
    },
}

/// Why tracking ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The shipment reached its terminal status.
    Delivered,
    /// The shipment no longer exists in the store.
    Vanished,
}

/// Outcome of a single simulation tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    /// Not tracking, or simulation is disabled; nothing happened.
    Skipped,
    /// The shipment advanced one status step.
    Advanced(Shipment),
    /// Tracking ended and the timer was cancelled.
    Stopped(StopReason),
}

/// Cloneable stop signal for the poller timer.
///
/// Stopping is idempotent; a fresh handle is issued for every new timer so
/// a stale loop can never be resumed by accident.
#[derive(Debug, Clone, Default)]
pub struct TrackerHandle {
    stop: Arc<AtomicBool>,
}

impl TrackerHandle {
    /// Create a new, un-stopped handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the timer to stop.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Check whether the stop signal has been sent.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

/// The tracking poller.
#[derive(Debug)]
pub struct Tracker {
    shipments: ShipmentManager,
    state: TrackerState,
    simulate: bool,
    handle: TrackerHandle,
}

impl Tracker {
    /// Create an idle tracker.
    #[must_use]
    pub fn new(shipments: ShipmentManager, simulate: bool) -> Self {
        Self {
            shipments,
            state: TrackerState::Idle,
            simulate,
            handle: TrackerHandle::new(),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    /// Whether a shipment is currently being tracked.
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        matches!(self.state, TrackerState::Tracking { .. })
    }

    /// Whether simulation is enabled.
    #[must_use]
    pub fn simulate(&self) -> bool {
        self.simulate
    }

    /// A handle controlling the current timer.
    #[must_use]
    pub fn handle(&self) -> TrackerHandle {
        self.handle.clone()
    }

    /// Submit a tracking code.
    ///
    /// Any running timer is cancelled first. A known code moves to Tracking
    /// and returns the shipment for display; an unknown code returns `None`
    /// and leaves the tracker Idle.
    ///
    /// # Errors
    ///
    /// Returns an error if a store operation fails.
    pub fn submit(&mut self, code: &str) -> Result<Option<Shipment>> {
        self.handle.stop();
        self.handle = TrackerHandle::new();

        match self.shipments.find_by_code(code)? {
            Some(shipment) => {
                info!("Tracking shipment {}", shipment.code);
                self.state = TrackerState::Tracking {
                    code: shipment.code.clone(),
                };
                Ok(Some(shipment))
            }
            None => {
                debug!("Tracking code not found: {code}");
                self.state = TrackerState::Idle;
                Ok(None)
            }
        }
    }

    /// Enable or disable simulation.
    ///
    /// Disabling suspends the timer without losing the tracking state;
    /// re-enabling issues a fresh handle so a new [`Tracker::run`] loop can
    /// resume where the previous one stopped.
    pub fn set_simulation(&mut self, enabled: bool) {
        self.simulate = enabled;
        if enabled {
            self.handle = TrackerHandle::new();
        } else {
            self.handle.stop();
        }
    }

    /// Advance the tracked shipment one status step.
    ///
    /// Returns [`Tick::Skipped`] when idle or simulation is disabled. A
    /// missing record or a record already at Delivered cancels the timer and
    /// moves the tracker back to Idle.
    ///
    /// # Errors
    ///
    /// Returns an error if a store operation fails.
    pub fn tick(&mut self) -> Result<Tick> {
        let TrackerState::Tracking { code } = &self.state else {
            return Ok(Tick::Skipped);
        };
        if !self.simulate {
            return Ok(Tick::Skipped);
        }
        let code = code.clone();

        let Some(shipment) = self.shipments.find_by_code(&code)? else {
            self.stop_tracking();
            return Ok(Tick::Stopped(StopReason::Vanished));
        };
        let Some(next) = shipment.status.next() else {
            self.stop_tracking();
            return Ok(Tick::Stopped(StopReason::Delivered));
        };

        match self.shipments.update_status(&shipment.id, next)? {
            Some(updated) => Ok(Tick::Advanced(updated)),
            // Deleted between the read and the write; same as vanished.
            None => {
                self.stop_tracking();
                Ok(Tick::Stopped(StopReason::Vanished))
            }
        }
    }

    /// Run the polling timer until tracking ends or the handle is stopped.
    ///
    /// Each completed tick is passed to `on_tick`. The loop exits when the
    /// tracker leaves the Tracking state, a tick reports a stop, or the
    /// handle held at entry is stopped (new submission, simulation off,
    /// Ctrl-C).
    ///
    /// # Errors
    ///
    /// Returns an error if a store operation fails mid-loop.
    pub async fn run<F>(&mut self, interval: Duration, mut on_tick: F) -> Result<()>
    where
        F: FnMut(&Tick),
    {
        let handle = self.handle.clone();
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first interval tick completes immediately; skip it so the
        // shipment is not advanced at submit time.
        timer.tick().await;

        loop {
            timer.tick().await;
            if handle.is_stopped() {
                debug!("Poller timer cancelled");
                break;
            }

            let tick = self.tick()?;
            on_tick(&tick);

            match tick {
                Tick::Stopped(_) => break,
                Tick::Skipped if !self.is_tracking() => break,
                _ => {}
            }
        }
        Ok(())
    }

    fn stop_tracking(&mut self) {
        self.handle.stop();
        self.state = TrackerState::Idle;
        info!("Tracking stopped");
    }
}
