// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// The operator name, used as the field manager and in log context
pub const OPERATOR_NAME: &str = "gonmap";

/// GonMap custom resource identity
pub mod crd {
    pub const GROUP: &str = "mondo.github.io.clobaa";
    pub const VERSION: &str = "v1";
    pub const API_VERSION: &str = "mondo.github.io.clobaa/v1";
    pub const KIND: &str = "GonMap";
    pub const PLURAL: &str = "gonmaps";

    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}

/// Defaults for the operator configuration
pub mod defaults {
    /// Heartbeat delay between two cycles of the same GonMap
    pub const REQUEUE_INTERVAL_SECS: u64 = 30;
    /// First retry delay after a failed cycle
    pub const ERROR_BACKOFF_SECS: u64 = 5;
    /// Upper bound for the failed-cycle retry delay
    pub const ERROR_BACKOFF_MAX_SECS: u64 = 300;
}

/// Sync manager tuning
pub mod sync {
    /// Capacity of the trigger channel
    pub const CHANNEL_CAPACITY: usize = 256;
    /// Namespace events arriving within this window collapse into one cycle
    pub const NAMESPACE_DEBOUNCE_MS: u64 = 500;
}
