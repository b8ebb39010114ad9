// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: a mocked API server for [`KubeStore`](crate::kubernetes::KubeStore)
//! and an in-memory [`ConfigStore`] for exercising the reconcile loop.

use crate::error::StoreError;
use crate::store::{ConfigStore, StoreResult};
use crate::types::GonMap;
use async_trait::async_trait;
use http::{Request, Response};
use k8s_openapi::api::core::v1::{ConfigMap, Namespace};
use kube::api::ObjectMeta;
use kube::client::Body;
use kube::{Client, ResourceExt};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses.lock().unwrap().insert(
            (method.to_string(), path.to_string()),
            (status, body.to_string()),
        );
        self
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for POST requests matching the exact path
    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    /// Add a response for PUT requests matching the exact path
    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PUT", path, status, body)
    }

    /// Add a response for DELETE requests matching the exact path
    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, status, body)
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        self.responses
            .lock()
            .unwrap()
            .get(&(method.to_string(), path.to_string()))
            .cloned()
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        let (status, body) = self
            .find_response(&method, &path)
            .unwrap_or_else(|| (404, not_found_json("resource", &path)));

        Box::pin(async move {
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

pub fn gonmap_json(name: &str) -> String {
    serde_json::json!({
        "apiVersion": "mondo.github.io.clobaa/v1",
        "kind": "GonMap",
        "metadata": {
            "name": name,
            "uid": format!("uid-{}", name)
        },
        "data": {
            "ENV": "staging",
            "VERSION": "v1.3"
        }
    })
    .to_string()
}

pub fn namespace_list_json(names: &[&str]) -> String {
    let items: Vec<_> = names
        .iter()
        .map(|name| {
            serde_json::json!({
                "apiVersion": "v1",
                "kind": "Namespace",
                "metadata": { "name": name, "uid": format!("uid-{}", name) }
            })
        })
        .collect();

    serde_json::json!({
        "apiVersion": "v1",
        "kind": "NamespaceList",
        "metadata": { "resourceVersion": "1" },
        "items": items
    })
    .to_string()
}

pub fn config_map_json(namespace: &str, name: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": { "name": name, "namespace": namespace, "resourceVersion": "1" },
        "data": { "ENV": "staging" }
    })
    .to_string()
}

fn status_json(code: u16, reason: &str, message: String) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    status_json(404, "NotFound", format!("{} \"{}\" not found", resource, name))
}

/// Create a 409 already exists response
pub fn already_exists_json(resource: &str, name: &str) -> String {
    status_json(
        409,
        "AlreadyExists",
        format!("{} \"{}\" already exists", resource, name),
    )
}

pub fn make_namespace(name: &str, labels: &[(&str, &str)]) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: (!labels.is_empty()).then(|| string_map(labels)),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn make_gonmap(name: &str, data: &[(&str, &str)], selector: &[(&str, &str)]) -> GonMap {
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;

    let mut gm = GonMap::new(name);
    gm.metadata.uid = Some(format!("uid-{}", name));
    gm.data = Some(string_map(data));
    gm.namespace_selector = Some(LabelSelector {
        match_labels: Some(string_map(selector)),
        match_expressions: None,
    });
    gm
}

pub fn string_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[derive(Default)]
struct MemoryState {
    gonmaps: BTreeMap<String, GonMap>,
    namespaces: BTreeMap<String, Namespace>,
    config_maps: BTreeMap<(String, String), ConfigMap>,
    resource_version: u64,
    fail_get: bool,
    fail_list: bool,
    fail_create_in: HashSet<String>,
    fail_update_in: HashSet<String>,
}

/// In-memory object store.
///
/// Behaves like the API server for the operations the reconciler uses,
/// including the garbage collector's cascade on GonMap deletion.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    gets: AtomicUsize,
    creates: AtomicUsize,
    updates: AtomicUsize,
    deletes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put_gonmap(&self, gonmap: GonMap) {
        let mut state = self.state.lock().unwrap();
        state.gonmaps.insert(gonmap.name_any(), gonmap);
    }

    /// Delete a GonMap and every ConfigMap it owns
    pub fn delete_gonmap(&self, name: &str) {
        let mut state = self.state.lock().unwrap();
        let Some(gonmap) = state.gonmaps.remove(name) else {
            return;
        };
        let uid = gonmap.metadata.uid.unwrap_or_default();
        state.config_maps.retain(|_, cm| {
            !cm.owner_references()
                .iter()
                .any(|owner| owner.uid == uid)
        });
    }

    pub fn put_namespace(&self, namespace: Namespace) {
        let mut state = self.state.lock().unwrap();
        state.namespaces.insert(namespace.name_any(), namespace);
    }

    /// Delete a namespace together with the ConfigMaps inside it
    pub fn delete_namespace(&self, name: &str) {
        let mut state = self.state.lock().unwrap();
        state.namespaces.remove(name);
        state.config_maps.retain(|(ns, _), _| ns != name);
    }

    /// Insert a ConfigMap directly, bypassing failure injection and counters
    pub fn put_config_map(&self, config_map: ConfigMap) {
        let mut state = self.state.lock().unwrap();
        let key = (
            config_map.namespace().unwrap_or_default(),
            config_map.name_any(),
        );
        state.config_maps.insert(key, config_map);
    }

    pub fn config_map(&self, namespace: &str, name: &str) -> Option<ConfigMap> {
        let state = self.state.lock().unwrap();
        state
            .config_maps
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Namespaces holding a ConfigMap with the given name
    pub fn namespaces_with(&self, name: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .config_maps
            .keys()
            .filter(|(_, n)| n == name)
            .map(|(ns, _)| ns.clone())
            .collect()
    }

    pub fn set_fail_get(&self, fail: bool) {
        self.state.lock().unwrap().fail_get = fail;
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.state.lock().unwrap().fail_list = fail;
    }

    pub fn fail_create_in(&self, namespace: &str) {
        let mut state = self.state.lock().unwrap();
        state.fail_create_in.insert(namespace.to_string());
    }

    pub fn fail_update_in(&self, namespace: &str) {
        let mut state = self.state.lock().unwrap();
        state.fail_update_in.insert(namespace.to_string());
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn key_of(config_map: &ConfigMap) -> StoreResult<(String, String)> {
        let namespace = config_map.namespace().ok_or_else(|| {
            StoreError::Invalid(format!("ConfigMap {} has no namespace", config_map.name_any()))
        })?;
        Ok((namespace, config_map.name_any()))
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get_gonmap(&self, name: &str) -> StoreResult<GonMap> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.fail_get {
            return Err(StoreError::Unavailable("get failed".to_string()));
        }
        state
            .gonmaps
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "GonMap",
                name: name.to_string(),
            })
    }

    async fn list_namespaces(&self) -> StoreResult<Vec<Namespace>> {
        let state = self.state.lock().unwrap();
        if state.fail_list {
            return Err(StoreError::Unavailable("list failed".to_string()));
        }
        Ok(state.namespaces.values().cloned().collect())
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> StoreResult<ConfigMap> {
        let state = self.state.lock().unwrap();
        state
            .config_maps
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "ConfigMap",
                name: name.to_string(),
            })
    }

    async fn create_config_map(&self, config_map: &ConfigMap) -> StoreResult<ConfigMap> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let key = Self::key_of(config_map)?;
        let mut state = self.state.lock().unwrap();

        if state.fail_create_in.contains(&key.0) {
            return Err(StoreError::Unavailable(format!("create in {} failed", key.0)));
        }
        if !state.namespaces.contains_key(&key.0) {
            return Err(StoreError::NotFound {
                kind: "Namespace",
                name: key.0,
            });
        }
        if state.config_maps.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                kind: "ConfigMap",
                name: key.1,
            });
        }

        state.resource_version += 1;
        let mut stored = config_map.clone();
        stored.metadata.resource_version = Some(state.resource_version.to_string());
        state.config_maps.insert(key, stored.clone());
        Ok(stored)
    }

    async fn update_config_map(&self, config_map: &ConfigMap) -> StoreResult<ConfigMap> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let key = Self::key_of(config_map)?;
        let mut state = self.state.lock().unwrap();

        if state.fail_update_in.contains(&key.0) {
            return Err(StoreError::Unavailable(format!("update in {} failed", key.0)));
        }
        if !state.config_maps.contains_key(&key) {
            return Err(StoreError::NotFound {
                kind: "ConfigMap",
                name: key.1,
            });
        }

        state.resource_version += 1;
        let mut stored = config_map.clone();
        stored.metadata.resource_version = Some(state.resource_version.to_string());
        state.config_maps.insert(key, stored.clone());
        Ok(stored)
    }

    async fn delete_config_map(&self, namespace: &str, name: &str) -> StoreResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        state
            .config_maps
            .remove(&(namespace.to_string(), name.to_string()))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                kind: "ConfigMap",
                name: name.to_string(),
            })
    }
}
