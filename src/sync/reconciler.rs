// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! One reconcile cycle for one GonMap: fetch, select namespaces, sync ConfigMaps.

use crate::config::Config;
use crate::error::GonMapError;
use crate::store::ConfigStore;
use crate::sync::configmaps::{desired_config_map, is_owned_by, sync_config_map, SyncOutcome};
use crate::sync::selector::select_namespaces;
use crate::types::GonMap;
use k8s_openapi::api::core::v1::Namespace;
use kube::{Resource, ResourceExt};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// What the caller should do after a cycle
#[derive(Debug)]
pub enum ReconcileOutcome {
    /// The GonMap no longer exists; do not retrigger
    Stop,
    /// The cycle was aborted; retry with backoff
    Error(GonMapError),
    /// Run again after `delay`. `cause` is set when the cycle could not
    /// get past namespace resolution.
    RequeueAfter {
        delay: Duration,
        cause: Option<GonMapError>,
    },
}

/// Per-cycle tally, logged at the end of a cycle
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    pub pruned: usize,
}

impl CycleSummary {
    fn record(&mut self, outcome: &SyncOutcome) {
        match outcome {
            SyncOutcome::Created => self.created += 1,
            SyncOutcome::Updated => self.updated += 1,
            SyncOutcome::CreateFailed(_) | SyncOutcome::UpdateFailed(_) => self.failed += 1,
        }
    }
}

pub struct Reconciler {
    store: Arc<dyn ConfigStore>,
    requeue_interval: Duration,
    prune_stale: bool,
}

impl Reconciler {
    pub fn new(store: Arc<dyn ConfigStore>, config: &Config) -> Self {
        Self {
            store,
            requeue_interval: config.requeue_interval,
            prune_stale: config.prune_stale,
        }
    }

    fn requeue(&self, cause: Option<GonMapError>) -> ReconcileOutcome {
        ReconcileOutcome::RequeueAfter {
            delay: self.requeue_interval,
            cause,
        }
    }

    /// Run a single cycle for the GonMap called `name`.
    ///
    /// Callers must not run two cycles for the same name concurrently.
    #[instrument(skip(self))]
    pub async fn run_once(&self, name: &str) -> ReconcileOutcome {
        let gonmap = match self.store.get_gonmap(name).await {
            Ok(gm) => gm,
            Err(e) if e.is_not_found() => {
                info!("GonMap not found, nothing to reconcile");
                return ReconcileOutcome::Stop;
            }
            Err(e) => {
                error!("Could not get GonMap: {}", e);
                return ReconcileOutcome::Error(e.into());
            }
        };

        let namespaces = match self.store.list_namespaces().await {
            Ok(ns) => ns,
            Err(e) => {
                error!("Could not list namespaces: {}", e);
                return self.requeue(Some(e.into()));
            }
        };

        let targets = select_namespaces(&namespaces, &gonmap.match_labels());
        debug!("Selected {} of {} namespaces: {:?}", targets.len(), namespaces.len(), targets);

        let invalid_keys = gonmap.invalid_data_keys();
        if !invalid_keys.is_empty() {
            warn!("GonMap data has keys a ConfigMap will reject: {:?}", invalid_keys);
        }

        let mut summary = CycleSummary::default();

        for namespace in &targets {
            let Some(owner) = gonmap.controller_owner_ref(&()) else {
                error!(namespace = %namespace, "Could not set controller reference");
                return ReconcileOutcome::Error(GonMapError::OwnerReference(name.to_string()));
            };

            let desired = desired_config_map(namespace, name, gonmap.data.clone(), owner);
            let outcome = sync_config_map(&*self.store, &desired).await;
            summary.record(&outcome);
        }

        if self.prune_stale {
            summary.pruned = self.prune(&gonmap, &namespaces, &targets).await;
        }

        info!(
            created = summary.created,
            updated = summary.updated,
            failed = summary.failed,
            pruned = summary.pruned,
            "Cycle complete for {} namespaces",
            targets.len()
        );

        self.requeue(None)
    }

    /// Delete this GonMap's ConfigMaps from namespaces outside the target set.
    /// ConfigMaps not owned by the GonMap are left alone.
    async fn prune(
        &self,
        gonmap: &GonMap,
        namespaces: &[Namespace],
        targets: &BTreeSet<String>,
    ) -> usize {
        let name = gonmap.name_any();
        let Some(uid) = gonmap.meta().uid.as_deref() else {
            return 0;
        };

        let mut pruned = 0;
        for namespace in namespaces.iter().map(|ns| ns.name_any()) {
            if targets.contains(&namespace) {
                continue;
            }

            match self.store.get_config_map(&namespace, &name).await {
                Ok(cm) if is_owned_by(&cm, uid) => {
                    match self.store.delete_config_map(&namespace, &name).await {
                        Ok(()) => {
                            info!(namespace = %namespace, "Pruned ConfigMap from non-matching namespace");
                            pruned += 1;
                        }
                        Err(e) if e.is_not_found() => {}
                        Err(e) => {
                            error!(namespace = %namespace, "Failed to prune ConfigMap: {}", e);
                        }
                    }
                }
                Ok(_) => {
                    debug!(namespace = %namespace, "ConfigMap not owned by this GonMap, keeping it");
                }
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    warn!(namespace = %namespace, "Could not check ConfigMap for pruning: {}", e);
                }
            }
        }

        pruned
    }
}
