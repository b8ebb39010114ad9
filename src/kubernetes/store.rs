// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! [`ConfigStore`] backed by the Kubernetes API server

use crate::constants::OPERATOR_NAME;
use crate::error::StoreError;
use crate::store::{ConfigStore, StoreResult};
use crate::types::GonMap;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Namespace};
use kube::{
    api::{DeleteParams, ListParams, PostParams},
    Api, Client, ResourceExt,
};
use tracing::instrument;

#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn config_maps(&self, namespace: &str) -> Api<ConfigMap> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn post_params() -> PostParams {
    PostParams {
        field_manager: Some(OPERATOR_NAME.to_string()),
        ..Default::default()
    }
}

/// Translate API status codes into the store error taxonomy
fn classify(kind: &'static str, name: &str, err: kube::Error) -> StoreError {
    match err {
        kube::Error::Api(ref ae) if ae.code == 404 => StoreError::NotFound {
            kind,
            name: name.to_string(),
        },
        kube::Error::Api(ref ae) if ae.code == 409 && ae.reason == "AlreadyExists" => {
            StoreError::AlreadyExists {
                kind,
                name: name.to_string(),
            }
        }
        other => StoreError::Kube(other),
    }
}

fn target_namespace(config_map: &ConfigMap) -> StoreResult<String> {
    config_map.namespace().ok_or_else(|| {
        StoreError::Invalid(format!(
            "ConfigMap {} has no namespace",
            config_map.name_any()
        ))
    })
}

#[async_trait]
impl ConfigStore for KubeStore {
    #[instrument(skip(self))]
    async fn get_gonmap(&self, name: &str) -> StoreResult<GonMap> {
        let gonmaps: Api<GonMap> = Api::all(self.client.clone());
        gonmaps
            .get(name)
            .await
            .map_err(|e| classify("GonMap", name, e))
    }

    #[instrument(skip(self))]
    async fn list_namespaces(&self) -> StoreResult<Vec<Namespace>> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        let list = namespaces.list(&ListParams::default()).await?;
        Ok(list.items)
    }

    #[instrument(skip(self))]
    async fn get_config_map(&self, namespace: &str, name: &str) -> StoreResult<ConfigMap> {
        self.config_maps(namespace)
            .get(name)
            .await
            .map_err(|e| classify("ConfigMap", name, e))
    }

    #[instrument(skip(self, config_map), fields(configmap = %config_map.name_any()))]
    async fn create_config_map(&self, config_map: &ConfigMap) -> StoreResult<ConfigMap> {
        let namespace = target_namespace(config_map)?;
        self.config_maps(&namespace)
            .create(&post_params(), config_map)
            .await
            .map_err(|e| classify("ConfigMap", &config_map.name_any(), e))
    }

    #[instrument(skip(self, config_map), fields(configmap = %config_map.name_any()))]
    async fn update_config_map(&self, config_map: &ConfigMap) -> StoreResult<ConfigMap> {
        let namespace = target_namespace(config_map)?;
        let name = config_map.name_any();
        self.config_maps(&namespace)
            .replace(&name, &post_params(), config_map)
            .await
            .map_err(|e| classify("ConfigMap", &name, e))
    }

    #[instrument(skip(self))]
    async fn delete_config_map(&self, namespace: &str, name: &str) -> StoreResult<()> {
        self.config_maps(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| classify("ConfigMap", name, e))
    }
}
