// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::crd;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::api::{ObjectMeta, TypeMeta};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cluster-scoped resource declaring configuration data and the namespaces it
/// should be replicated to.
///
/// Unlike most custom resources the payload lives at the top level of the
/// object, next to `metadata`, mirroring the layout of a ConfigMap.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GonMap {
    #[serde(flatten, default)]
    pub types: Option<TypeMeta>,
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Configuration data copied verbatim into every derived ConfigMap
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, String>>,
    /// Selects target namespaces; absent or empty matches every namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_selector: Option<LabelSelector>,
}

impl k8s_openapi::Resource for GonMap {
    const API_VERSION: &'static str = crd::API_VERSION;
    const GROUP: &'static str = crd::GROUP;
    const KIND: &'static str = crd::KIND;
    const VERSION: &'static str = crd::VERSION;
    const URL_PATH_SEGMENT: &'static str = crd::PLURAL;
    type Scope = k8s_openapi::ClusterResourceScope;
}

impl k8s_openapi::Metadata for GonMap {
    type Ty = ObjectMeta;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

impl GonMap {
    pub fn new(name: &str) -> Self {
        GonMap {
            types: Some(TypeMeta {
                api_version: crd::API_VERSION.to_string(),
                kind: crd::KIND.to_string(),
            }),
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            data: None,
            namespace_selector: None,
        }
    }

    /// The equality requirements of the namespace selector.
    ///
    /// `matchExpressions` are not evaluated.
    pub fn match_labels(&self) -> BTreeMap<String, String> {
        self.namespace_selector
            .as_ref()
            .and_then(|s| s.match_labels.clone())
            .unwrap_or_default()
    }

    /// Data keys that a ConfigMap would reject
    pub fn invalid_data_keys(&self) -> Vec<&str> {
        self.data
            .iter()
            .flat_map(|d| d.keys())
            .map(String::as_str)
            .filter(|k| !is_valid_data_key(k))
            .collect()
    }
}

/// Keys must consist of alphanumeric characters, '-', '_' or '.'
pub fn is_valid_data_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
