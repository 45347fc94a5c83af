//! A fake kcp server holding many logical clusters

use super::error::FakeResult;
use super::interceptor::Funcs;
use super::mock_service::{FakeState, MockService, RecordedRequest};
use super::tracker::{ObjectTracker, GVR};
use super::utils::gvr_of;
use crate::config::ClientOptions;
use crate::context::Context;
use crate::wait::WaitOptions;
use crate::workspace::{Connect, LogicalCluster};
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Server URL prefix under which the fake kcp serves logical clusters
pub const FAKE_SERVER: &str = "https://kcp.test:6443/clusters";

/// Builder for a [`FakeKcp`]
///
/// ```rust,ignore
/// let kcp = FakeKcp::builder()
///     .with_cluster_name("root:imw1", "2abc")
///     .with_object("root:imw1", SyncTarget::for_location("edge1"))
///     .with_controllers()
///     .build()
///     .unwrap();
/// let workspaces: Api<Workspace> = Api::all(kcp.client("root"));
/// ```
#[derive(Default)]
pub struct FakeKcpBuilder {
    initial_objects: Vec<(String, GVR, String, Value)>,
    cluster_names: Vec<(String, String)>,
    controllers: bool,
    interceptors: Funcs,
}

impl FakeKcpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object into the logical cluster at `cluster`.
    pub fn with_object<K>(mut self, cluster: &str, obj: K) -> Self
    where
        K: Resource<DynamicType = ()> + Serialize,
    {
        let namespace = obj.meta().namespace.clone().unwrap_or_default();
        if let Ok(value) = serde_json::to_value(&obj) {
            self.initial_objects
                .push((cluster.to_string(), gvr_of::<K>(), namespace, value));
        }
        self
    }

    /// Name kcp reports for the workspace at `path` in `kcp.io/cluster` annotations
    pub fn with_cluster_name(mut self, path: &str, name: &str) -> Self {
        self.cluster_names.push((path.to_string(), name.to_string()));
        self
    }

    /// Have new workspaces come up Ready and new APIBindings come up Bound.
    pub fn with_controllers(mut self) -> Self {
        self.controllers = true;
        self
    }

    pub fn with_interceptor_funcs(mut self, interceptors: Funcs) -> Self {
        self.interceptors = interceptors;
        self
    }

    pub fn build(self) -> FakeResult<FakeKcp> {
        let tracker = ObjectTracker::new();
        for (path, name) in &self.cluster_names {
            tracker.set_cluster_name(path, name);
        }
        for (cluster, gvr, namespace, obj) in self.initial_objects {
            tracker.create(&cluster, &gvr, obj, &namespace)?;
        }

        Ok(FakeKcp {
            state: Arc::new(FakeState {
                tracker,
                interceptors: self.interceptors,
                controllers: self.controllers,
                requests: Mutex::new(Vec::new()),
            }),
        })
    }
}

/// In-memory kcp reachable through [`Connect`]
#[derive(Clone)]
pub struct FakeKcp {
    state: Arc<FakeState>,
}

impl FakeKcp {
    pub fn builder() -> FakeKcpBuilder {
        FakeKcpBuilder::new()
    }

    /// Client bound to the logical cluster at `cluster`
    pub fn client(&self, cluster: &str) -> Client {
        Client::new(MockService::new(self.state.clone(), cluster), "default")
    }

    /// Command context backed by this fake, polling quickly
    pub fn context(&self) -> Context {
        Context::new(self.clone(), ClientOptions::default()).with_wait(WaitOptions::new(
            Duration::from_millis(5),
            Duration::from_millis(200),
        ))
    }

    /// Cluster-scoped object straight from the store
    pub fn get<K>(&self, cluster: &str, name: &str) -> Option<K>
    where
        K: Resource<DynamicType = ()> + DeserializeOwned,
    {
        let value = self
            .state
            .tracker
            .get(cluster, &gvr_of::<K>(), "", name)
            .ok()?;
        serde_json::from_value(value).ok()
    }

    /// Names of the cluster-scoped objects of one kind, sorted
    pub fn names<K>(&self, cluster: &str) -> Vec<String>
    where
        K: Resource<DynamicType = ()>,
    {
        self.state
            .tracker
            .list(cluster, &gvr_of::<K>(), Some(""))
            .iter()
            .filter_map(|obj| obj.pointer("/metadata/name")?.as_str().map(str::to_string))
            .collect()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Requests that could have changed state
    pub fn writes(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.method != "GET")
            .collect()
    }
}

impl Connect for FakeKcp {
    fn connect(&self, cluster: &LogicalCluster) -> crate::Result<Client> {
        Ok(self.client(cluster.path()))
    }

    fn server_url(&self, cluster: &LogicalCluster) -> crate::Result<String> {
        Ok(format!("{FAKE_SERVER}/{cluster}"))
    }
}
