use super::tracker::GVR;
use crate::crd::CLUSTER_ANNOTATION;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use kube::Resource;

/// Fill in what the API server sets on every new object.
///
/// `cluster_name` is stamped as the `kcp.io/cluster` annotation, the way
/// kcp marks which logical cluster an object lives in.
pub fn ensure_metadata(meta: &mut ObjectMeta, namespace: &str, cluster_name: &str) {
    if namespace.is_empty() {
        meta.namespace = None;
    } else if meta.namespace.is_none() {
        meta.namespace = Some(namespace.to_string());
    }
    if meta.creation_timestamp.is_none() {
        meta.creation_timestamp = Some(Time(chrono::Utc::now()));
    }
    if meta.uid.is_none() {
        meta.uid = Some(uuid::Uuid::new_v4().to_string());
    }
    meta.annotations
        .get_or_insert_with(Default::default)
        .entry(CLUSTER_ANNOTATION.to_string())
        .or_insert_with(|| cluster_name.to_string());
}

/// Resource coordinates of a statically typed kind
pub fn gvr_of<K>() -> GVR
where
    K: Resource<DynamicType = ()>,
{
    GVR::new(K::group(&()), K::version(&()), K::plural(&()))
}
