//! Idempotent get-or-create and get-or-delete helpers

use crate::Result;
use kube::api::{Api, DeleteParams, Patch, PatchParams, PostParams};
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt::Debug;
use tracing::{debug, info};

/// What `verify_or_create` found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Found,
    Created,
}

/// True when the API server answered 404
pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == 404)
}

/// True when the API server answered 409 because the name is taken
pub fn is_already_exists(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == 409 && resp.reason == "AlreadyExists")
}

fn kind_of<K>() -> String
where
    K: Resource,
    K::DynamicType: Default,
{
    K::kind(&K::DynamicType::default()).into_owned()
}

/// Make sure an object with the name of `obj` exists, creating `obj` if not.
///
/// An existing object is left untouched. Losing a create race to another
/// client counts as found.
pub async fn verify_or_create<K>(api: &Api<K>, obj: &K) -> Result<Outcome>
where
    K: Resource + Clone + DeserializeOwned + Serialize + Debug,
    K::DynamicType: Default,
{
    let kind = kind_of::<K>();
    let name = obj.meta().name.clone().unwrap_or_default();

    if api.get_opt(&name).await?.is_some() {
        info!("Found {} {}", kind, name);
        return Ok(Outcome::Found);
    }

    info!("No {} {}, creating it", kind, name);
    match api.create(&PostParams::default(), obj).await {
        Ok(_) => {
            info!("Created {} {}", kind, name);
            Ok(Outcome::Created)
        }
        Err(err) if is_already_exists(&err) => {
            debug!("{} {} appeared while creating it", kind, name);
            Ok(Outcome::Found)
        }
        Err(err) => Err(err.into()),
    }
}

/// Delete the named object. Returns `false` when it was already absent.
pub async fn delete_if_exists<K>(api: &Api<K>, name: &str) -> Result<bool>
where
    K: Resource + Clone + DeserializeOwned + Debug,
{
    match api.delete(name, &DeleteParams::default()).await {
        Ok(_) => Ok(true),
        Err(err) if is_not_found(&err) => Ok(false),
        Err(err) => Err(err.into()),
    }
}

/// Make sure the named object carries every label in `labels`.
///
/// Returns `true` when a patch was needed.
pub async fn ensure_labels<K>(
    api: &Api<K>,
    name: &str,
    labels: &BTreeMap<String, String>,
) -> Result<bool>
where
    K: Resource + Clone + DeserializeOwned + Debug,
{
    if labels.is_empty() {
        return Ok(false);
    }

    let current = api.get(name).await?;
    let existing = current.meta().labels.clone().unwrap_or_default();
    let missing: BTreeMap<&String, &String> = labels
        .iter()
        .filter(|(key, value)| existing.get(*key) != Some(*value))
        .collect();

    if missing.is_empty() {
        debug!("Labels already present on {}", name);
        return Ok(false);
    }

    debug!("Setting labels {:?} on {}", missing, name);
    let patch = json!({ "metadata": { "labels": missing } });
    api.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    Ok(true)
}
