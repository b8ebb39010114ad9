// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace reconciler - watches namespaces so label changes reach every GonMap.

use crate::error::{GonMapError, Result};
use crate::sync::{SyncEvent, SyncManagerHandle};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    runtime::{controller::Action, watcher, Controller},
    Api, Client, ResourceExt,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

pub struct NamespaceReconciler {
    client: Client,
    sync_handle: SyncManagerHandle,
}

impl NamespaceReconciler {
    pub fn new(client: Client, sync_handle: SyncManagerHandle) -> Self {
        Self { client, sync_handle }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        let context = Arc::new(self);

        Controller::new(namespaces, watcher::Config::default())
            .shutdown_on_signal()
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled namespace: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }
}

async fn reconcile(namespace: Arc<Namespace>, ctx: Arc<NamespaceReconciler>) -> Result<Action> {
    let name = namespace.name_any();

    // Terminating namespaces reject new objects, nothing to sync into them
    if namespace.metadata.deletion_timestamp.is_some() {
        debug!("Namespace {} is terminating, skipping", name);
        return Ok(Action::await_change());
    }

    ctx.sync_handle
        .send(SyncEvent::NamespaceChanged { name })
        .await;

    Ok(Action::await_change())
}

fn error_policy(
    _namespace: Arc<Namespace>,
    error: &GonMapError,
    _ctx: Arc<NamespaceReconciler>,
) -> Action {
    error!("Reconciliation error: {}", error);
    Action::requeue(Duration::from_secs(60))
}
