// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gonmap::config::Config;
use gonmap::kubernetes::{wait_for_gonmap_crd, KubeStore};
use gonmap::reconcilers::{GonMapReconciler, NamespaceReconciler};
use gonmap::sync::{Reconciler, SyncManager};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting GonMap operator");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: requeue_interval={:?}, prune_stale={}",
        config.requeue_interval, config.prune_stale
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    info!("Waiting for GonMap CRD to become available...");
    wait_for_gonmap_crd(&client).await?;

    let store = Arc::new(KubeStore::new(client.clone()));
    let reconciler = Arc::new(Reconciler::new(store, &config));

    // Create the sync manager and get a handle for reconcilers
    let (sync_manager, sync_handle) = SyncManager::new(reconciler, &config);

    let gonmap_reconciler = GonMapReconciler::new(client.clone(), sync_handle.clone());
    let namespace_reconciler = NamespaceReconciler::new(client, sync_handle);

    info!("Starting reconcilers...");

    // The reconcilers stop on SIGTERM/Ctrl-C, which drops the last handles
    // and lets the sync manager drain and exit.
    tokio::try_join!(
        sync_manager.run(),
        gonmap_reconciler.run(),
        namespace_reconciler.run()
    )?;

    info!("GonMap operator stopped");
    Ok(())
}
