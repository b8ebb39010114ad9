// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Derived ConfigMap construction and create-or-update synchronization

use crate::error::StoreError;
use crate::store::ConfigStore;
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{api::ObjectMeta, ResourceExt};
use std::collections::BTreeMap;
use tracing::{debug, error, info, instrument};

/// Result of synchronizing one derived ConfigMap
#[derive(Debug)]
pub enum SyncOutcome {
    Created,
    Updated,
    CreateFailed(StoreError),
    UpdateFailed(StoreError),
}

impl SyncOutcome {
    #[cfg(test)]
    pub fn is_failure(&self) -> bool {
        matches!(self, SyncOutcome::CreateFailed(_) | SyncOutcome::UpdateFailed(_))
    }
}

/// Build the ConfigMap a GonMap should have in `namespace`
pub fn desired_config_map(
    namespace: &str,
    name: &str,
    data: Option<BTreeMap<String, String>>,
    owner: OwnerReference,
) -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            owner_references: Some(vec![owner]),
            ..Default::default()
        },
        data,
        ..Default::default()
    }
}

/// Check whether the ConfigMap carries an owner reference with the given uid
pub fn is_owned_by(config_map: &ConfigMap, owner_uid: &str) -> bool {
    config_map
        .owner_references()
        .iter()
        .any(|owner| owner.uid == owner_uid)
}

/// Create the ConfigMap, or replace it when it already exists.
///
/// Failures are logged and returned as an outcome rather than an error so
/// the caller can carry on with other namespaces.
#[instrument(
    skip(store, desired),
    fields(
        namespace = %desired.namespace().unwrap_or_default(),
        configmap = %desired.name_any()
    )
)]
pub async fn sync_config_map(store: &dyn ConfigStore, desired: &ConfigMap) -> SyncOutcome {
    match store.create_config_map(desired).await {
        Ok(_) => {
            info!("Created ConfigMap");
            SyncOutcome::Created
        }
        Err(e) if e.is_already_exists() => {
            debug!("ConfigMap already exists, updating");
            match store.update_config_map(desired).await {
                Ok(_) => {
                    info!("Updated existing ConfigMap");
                    SyncOutcome::Updated
                }
                Err(e) => {
                    error!("Failed to update existing ConfigMap: {}", e);
                    SyncOutcome::UpdateFailed(e)
                }
            }
        }
        Err(e) => {
            error!("Failed to create ConfigMap: {}", e);
            SyncOutcome::CreateFailed(e)
        }
    }
}
