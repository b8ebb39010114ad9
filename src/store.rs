// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Object store capabilities the reconciler depends on.

use crate::error::StoreError;
use crate::types::GonMap;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Namespace};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Access to the cluster objects a reconcile cycle reads and writes.
///
/// Implementations report a missing object as [`StoreError::NotFound`] and a
/// create collision as [`StoreError::AlreadyExists`]; the reconciler branches
/// on both. Deleting a GonMap is expected to cascade to every ConfigMap that
/// carries it as owner.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get_gonmap(&self, name: &str) -> StoreResult<GonMap>;

    /// List every namespace in the cluster
    async fn list_namespaces(&self) -> StoreResult<Vec<Namespace>>;

    async fn get_config_map(&self, namespace: &str, name: &str) -> StoreResult<ConfigMap>;

    /// Create a ConfigMap in the namespace set on its metadata
    async fn create_config_map(&self, config_map: &ConfigMap) -> StoreResult<ConfigMap>;

    /// Replace an existing ConfigMap unconditionally
    async fn update_config_map(&self, config_map: &ConfigMap) -> StoreResult<ConfigMap>;

    async fn delete_config_map(&self, namespace: &str, name: &str) -> StoreResult<()>;
}
