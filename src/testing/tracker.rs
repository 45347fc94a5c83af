use super::error::{FakeError, FakeResult};
use super::utils::ensure_metadata;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tracing::{debug, trace};

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GVR {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl GVR {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            resource: resource.into(),
        }
    }
}

type ObjectsByName = BTreeMap<String, Value>;
type ObjectsByNamespace = HashMap<String, ObjectsByName>;
/// Objects per (logical cluster path, resource)
type ObjectStorage = HashMap<(String, GVR), ObjectsByNamespace>;

/// In-memory object store spanning every logical cluster of a fake kcp.
///
/// Cluster-scoped objects live under the empty namespace.
pub struct ObjectTracker {
    objects: RwLock<ObjectStorage>,
    cluster_names: RwLock<HashMap<String, String>>,
    resource_version: AtomicU64,
}

impl ObjectTracker {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            cluster_names: RwLock::new(HashMap::new()),
            resource_version: AtomicU64::new(1),
        }
    }

    /// Record the logical cluster name kcp reports for the workspace at `path`.
    pub fn set_cluster_name(&self, path: &str, name: &str) {
        self.cluster_names
            .write()
            .unwrap()
            .insert(path.to_string(), name.to_string());
    }

    /// Logical cluster name of `path`; the path itself unless one was set.
    pub fn cluster_name(&self, path: &str) -> String {
        self.cluster_names
            .read()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_else(|| path.to_string())
    }

    fn next_resource_version(&self) -> String {
        (self.resource_version.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    /// Store a new object, failing if the name is taken.
    pub fn create(
        &self,
        cluster: &str,
        gvr: &GVR,
        mut object: Value,
        namespace: &str,
    ) -> FakeResult<Value> {
        trace!("Creating {:?} in {} namespace {:?}", gvr, cluster, namespace);

        let mut meta = extract_metadata(&object)?;
        let name = meta
            .name
            .clone()
            .ok_or_else(|| FakeError::InvalidRequest("Object name is required".to_string()))?;

        if meta
            .resource_version
            .as_ref()
            .is_some_and(|rv| !rv.is_empty())
        {
            return Err(FakeError::InvalidRequest(
                "resourceVersion can not be set for Create requests".to_string(),
            ));
        }

        if self.get(cluster, gvr, namespace, &name).is_ok() {
            return Err(FakeError::AlreadyExists {
                resource: gvr.resource.clone(),
                name,
            });
        }

        meta.resource_version = Some(self.next_resource_version());
        ensure_metadata(&mut meta, namespace, &self.cluster_name(cluster));
        object["metadata"] = serde_json::to_value(&meta)?;

        let mut objects = self.objects.write().unwrap();
        objects
            .entry((cluster.to_string(), gvr.clone()))
            .or_default()
            .entry(namespace.to_string())
            .or_default()
            .insert(name.clone(), object.clone());

        debug!("Created {} {} in {}", gvr.resource, name, cluster);
        Ok(object)
    }

    pub fn get(&self, cluster: &str, gvr: &GVR, namespace: &str, name: &str) -> FakeResult<Value> {
        trace!("Getting {:?} {} in {}", gvr, name, cluster);

        let objects = self.objects.read().unwrap();
        objects
            .get(&(cluster.to_string(), gvr.clone()))
            .and_then(|by_namespace| by_namespace.get(namespace))
            .and_then(|by_name| by_name.get(name))
            .cloned()
            .ok_or_else(|| not_found(gvr, name))
    }

    /// Replace an existing object, keeping its identity and bumping its resourceVersion.
    pub fn update(
        &self,
        cluster: &str,
        gvr: &GVR,
        mut object: Value,
        namespace: &str,
    ) -> FakeResult<Value> {
        let meta = extract_metadata(&object)?;
        let name = meta
            .name
            .clone()
            .ok_or_else(|| FakeError::InvalidRequest("Object name is required".to_string()))?;

        let existing = extract_metadata(&self.get(cluster, gvr, namespace, &name)?)?;

        let mut new_meta = meta;
        new_meta.resource_version = Some(self.next_resource_version());
        new_meta.uid = existing.uid;
        new_meta.creation_timestamp = existing.creation_timestamp;
        object["metadata"] = serde_json::to_value(&new_meta)?;

        let mut objects = self.objects.write().unwrap();
        let by_name = objects
            .get_mut(&(cluster.to_string(), gvr.clone()))
            .and_then(|by_namespace| by_namespace.get_mut(namespace))
            .ok_or_else(|| not_found(gvr, &name))?;
        by_name.insert(name.clone(), object.clone());

        debug!("Updated {} {} in {}", gvr.resource, name, cluster);
        Ok(object)
    }

    pub fn delete(&self, cluster: &str, gvr: &GVR, namespace: &str, name: &str) -> FakeResult<Value> {
        trace!("Deleting {:?} {} in {}", gvr, name, cluster);

        let mut objects = self.objects.write().unwrap();
        let deleted = objects
            .get_mut(&(cluster.to_string(), gvr.clone()))
            .and_then(|by_namespace| by_namespace.get_mut(namespace))
            .and_then(|by_name| by_name.remove(name))
            .ok_or_else(|| not_found(gvr, name))?;

        debug!("Deleted {} {} in {}", gvr.resource, name, cluster);
        Ok(deleted)
    }

    /// Objects of one resource in a cluster, ordered by name.
    ///
    /// `None` lists across all namespaces.
    pub fn list(&self, cluster: &str, gvr: &GVR, namespace: Option<&str>) -> Vec<Value> {
        let objects = self.objects.read().unwrap();
        let Some(by_namespace) = objects.get(&(cluster.to_string(), gvr.clone())) else {
            return Vec::new();
        };

        match namespace {
            Some(ns) => by_namespace
                .get(ns)
                .map(|by_name| by_name.values().cloned().collect())
                .unwrap_or_default(),
            None => by_namespace
                .values()
                .flat_map(|by_name| by_name.values().cloned())
                .collect(),
        }
    }
}

impl Default for ObjectTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(gvr: &GVR, name: &str) -> FakeError {
    FakeError::NotFound {
        resource: gvr.resource.clone(),
        name: name.to_string(),
    }
}

fn extract_metadata(object: &Value) -> FakeResult<ObjectMeta> {
    let meta = object
        .get("metadata")
        .ok_or_else(|| FakeError::InvalidRequest("Object missing metadata field".to_string()))?;
    serde_json::from_value(meta.clone())
        .map_err(|e| FakeError::InvalidRequest(format!("Failed to parse metadata: {}", e)))
}
