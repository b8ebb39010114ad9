// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace selection by label equality

use k8s_openapi::api::core::v1::Namespace;
use kube::ResourceExt;
use std::collections::{BTreeMap, BTreeSet};

/// Check whether a label set satisfies every required key/value pair.
/// An empty selector matches everything.
pub fn labels_match(labels: &BTreeMap<String, String>, selector: &BTreeMap<String, String>) -> bool {
    selector
        .iter()
        .all(|(key, value)| labels.get(key) == Some(value))
}

/// Names of the namespaces whose labels are a superset of the selector
pub fn select_namespaces(
    namespaces: &[Namespace],
    selector: &BTreeMap<String, String>,
) -> BTreeSet<String> {
    namespaces
        .iter()
        .filter(|ns| labels_match(ns.labels(), selector))
        .map(|ns| ns.name_any())
        .collect()
}
