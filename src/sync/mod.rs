// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! GonMap to ConfigMap synchronization logic.

pub mod configmaps;
pub mod manager;
pub mod reconciler;
pub mod selector;

pub use configmaps::{desired_config_map, sync_config_map, SyncOutcome};
pub use manager::{SyncEvent, SyncManager, SyncManagerHandle};
pub use reconciler::{ReconcileOutcome, Reconciler};
pub use selector::select_namespaces;
