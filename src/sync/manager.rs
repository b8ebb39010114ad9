// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Central coordinator that turns triggers into reconcile cycles.

use crate::config::Config;
use crate::constants::sync::{CHANNEL_CAPACITY, NAMESPACE_DEBOUNCE_MS};
use crate::sync::reconciler::{ReconcileOutcome, Reconciler};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Events that reconcilers send to the SyncManager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A GonMap was created or updated, or one of its ConfigMaps changed
    GonMapChanged { name: String },
    /// A namespace was created or relabeled
    NamespaceChanged { name: String },
    /// A scheduled retrigger for one GonMap fired
    Requeue { name: String },
}

/// Retry delay policy for failed cycles
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self { initial, max }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial.saturating_mul(1 << exponent).min(self.max)
    }
}

/// An armed retrigger timer and the instant it fires
struct Pending {
    deadline: Instant,
    timer: JoinHandle<()>,
}

/// Central coordinator for reconciling GonMaps.
///
/// Events are drained by a single task, so two cycles for the same GonMap
/// never overlap. Each tracked GonMap has at most one pending retrigger.
pub struct SyncManager {
    reconciler: Arc<Reconciler>,
    event_rx: mpsc::Receiver<SyncEvent>,
    /// Timers only hold a weak sender so the manager stops once every handle is gone
    event_tx: mpsc::WeakSender<SyncEvent>,
    backoff: Backoff,
    tracked: HashSet<String>,
    pending: HashMap<String, Pending>,
    failures: HashMap<String, u32>,
}

/// Handle to send events to the SyncManager
#[derive(Clone)]
pub struct SyncManagerHandle {
    event_tx: mpsc::Sender<SyncEvent>,
}

impl SyncManagerHandle {
    pub async fn send(&self, event: SyncEvent) {
        if let Err(e) = self.event_tx.send(event).await {
            error!("Failed to send event to SyncManager: {}", e);
        }
    }
}

impl SyncManager {
    pub fn new(reconciler: Arc<Reconciler>, config: &Config) -> (Self, SyncManagerHandle) {
        let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let manager = Self {
            reconciler,
            event_rx,
            event_tx: event_tx.downgrade(),
            backoff: Backoff::new(config.error_backoff, config.error_backoff_max),
            tracked: HashSet::new(),
            pending: HashMap::new(),
            failures: HashMap::new(),
        };

        let handle = SyncManagerHandle { event_tx };
        (manager, handle)
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        info!("SyncManager started, listening for events...");

        while let Some(event) = self.event_rx.recv().await {
            self.handle_event(event).await;
        }

        for (_, pending) in self.pending.drain() {
            pending.timer.abort();
        }

        info!("SyncManager stopped");
        Ok(())
    }

    async fn handle_event(&mut self, event: SyncEvent) {
        debug!("Handling event: {:?}", event);

        match event {
            SyncEvent::GonMapChanged { name } => {
                self.tracked.insert(name.clone());
                self.reconcile(&name).await;
            }
            SyncEvent::NamespaceChanged { name } => {
                self.handle_namespace_changed(&name);
            }
            SyncEvent::Requeue { name } => {
                self.pending.remove(&name);
                if self.tracked.contains(&name) {
                    self.reconcile(&name).await;
                }
            }
        }
    }

    /// Pull every tracked GonMap's next cycle forward to shortly from now, so
    /// a burst of namespace events results in a single cycle per GonMap.
    ///
    /// A pending timer is never pushed later, and GonMaps backing off after a
    /// failed cycle keep their backoff delay.
    #[instrument(skip(self))]
    fn handle_namespace_changed(&mut self, namespace: &str) {
        let names: Vec<String> = self
            .tracked
            .iter()
            .filter(|name| !self.failures.contains_key(*name))
            .cloned()
            .collect();
        debug!("Namespace changed, retriggering {} GonMaps", names.len());

        for name in names {
            self.schedule_no_later(&name, Duration::from_millis(NAMESPACE_DEBOUNCE_MS));
        }
    }

    async fn reconcile(&mut self, name: &str) {
        match self.reconciler.run_once(name).await {
            ReconcileOutcome::Stop => {
                debug!("GonMap {} is gone, no longer tracking it", name);
                self.forget(name);
            }
            ReconcileOutcome::RequeueAfter { delay, cause } => {
                if let Some(cause) = cause {
                    warn!("Cycle for GonMap {} incomplete: {}", name, cause);
                }
                self.failures.remove(name);
                self.schedule(name, delay);
            }
            ReconcileOutcome::Error(e) => {
                let attempt = self.failures.entry(name.to_string()).or_insert(0);
                *attempt += 1;
                let delay = self.backoff.delay(*attempt);
                error!(
                    "Cycle for GonMap {} failed (attempt {}), retrying in {:?}: {}",
                    name, attempt, delay, e
                );
                self.schedule(name, delay);
            }
        }
    }

    /// Arm the retrigger timer for `name` unless one already fires within `delay`
    fn schedule_no_later(&mut self, name: &str, delay: Duration) {
        let deadline = Instant::now() + delay;
        match self.pending.get(name) {
            Some(pending) if pending.deadline <= deadline => {}
            _ => self.schedule(name, delay),
        }
    }

    /// Arm the retrigger timer for `name`, replacing any pending one
    fn schedule(&mut self, name: &str, delay: Duration) {
        let deadline = Instant::now() + delay;
        let event_tx = self.event_tx.clone();
        let event = SyncEvent::Requeue {
            name: name.to_string(),
        };

        let timer = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(tx) = event_tx.upgrade() {
                let _ = tx.send(event).await;
            }
        });

        if let Some(previous) = self
            .pending
            .insert(name.to_string(), Pending { deadline, timer })
        {
            previous.timer.abort();
        }
    }

    fn forget(&mut self, name: &str) {
        self.tracked.remove(name);
        self.failures.remove(name);
        if let Some(pending) = self.pending.remove(name) {
            pending.timer.abort();
        }
    }

    /// Number of GonMaps with a pending retrigger
    #[cfg(test)]
    fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
