// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! GonMap reconciler - watches GonMaps and their ConfigMaps and notifies the sync manager.

use crate::constants::crd::{API_VERSION, KIND};
use crate::error::{GonMapError, Result};
use crate::sync::{SyncEvent, SyncManagerHandle};
use crate::types::GonMap;
use futures::StreamExt;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::{
    runtime::{controller::Action, reflector::ObjectRef, Controller},
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

pub struct GonMapReconciler {
    client: Client,
    sync_handle: SyncManagerHandle,
}

impl GonMapReconciler {
    pub fn new(client: Client, sync_handle: SyncManagerHandle) -> Self {
        Self { client, sync_handle }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let gonmaps: Api<GonMap> = Api::all(self.client.clone());
        let config_maps: Api<ConfigMap> = Api::all(self.client.clone());
        let context = Arc::new(self);

        Controller::new(gonmaps, WatcherConfig::default())
            .watches(config_maps, WatcherConfig::default(), owning_gonmaps)
            .shutdown_on_signal()
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled gonmap: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }
}

/// GonMaps that own the ConfigMap.
///
/// GonMaps are cluster-scoped, so the refs carry no namespace even though the
/// ConfigMap lives in one.
fn owning_gonmaps(config_map: ConfigMap) -> Vec<ObjectRef<GonMap>> {
    config_map
        .owner_references()
        .iter()
        .filter(|owner| owner.kind == KIND && owner.api_version == API_VERSION)
        .map(|owner| ObjectRef::new(&owner.name))
        .collect()
}

async fn reconcile(gonmap: Arc<GonMap>, ctx: Arc<GonMapReconciler>) -> Result<Action> {
    let name = gonmap.name_any();
    debug!("GonMap {} changed", name);

    // The sync manager owns the cycle and its retriggers
    ctx.sync_handle.send(SyncEvent::GonMapChanged { name }).await;

    Ok(Action::await_change())
}

fn error_policy(_gonmap: Arc<GonMap>, error: &GonMapError, _ctx: Arc<GonMapReconciler>) -> Action {
    error!("Reconciliation error: {}", error);
    Action::requeue(Duration::from_secs(60))
}
