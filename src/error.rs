// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

/// Failures reported by a [`ConfigStore`](crate::store::ConfigStore)
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{kind} \"{name}\" not found")]
    NotFound { kind: &'static str, name: String },

    #[error("{kind} \"{name}\" already exists")]
    AlreadyExists { kind: &'static str, name: String },

    #[error("Invalid object: {0}")]
    Invalid(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }
}

#[derive(Error, Debug)]
pub enum GonMapError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to build owner reference for GonMap {0}")]
    OwnerReference(String),
}

pub type Result<T> = std::result::Result<T, GonMapError>;
