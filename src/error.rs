use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("Invalid label {label:?}: {reason}")]
    InvalidLabel { label: String, reason: &'static str },

    #[error("Invalid logical cluster path {0:?}")]
    InvalidPath(String),

    #[error("{kind} {name} not found in workspace {workspace}{hint}")]
    Missing {
        kind: &'static str,
        name: String,
        workspace: String,
        hint: &'static str,
    },

    #[error("SyncTarget {name} has no {field}; cannot determine its mailbox workspace")]
    MailboxUnknown { name: String, field: &'static str },

    #[error("Timed out after {timeout:?} waiting for {what}")]
    Timeout { timeout: Duration, what: String },

    #[error("Secret {namespace}/{name} has no key {key}")]
    MissingSecretKey {
        namespace: String,
        name: String,
        key: &'static str,
    },

    #[error("Kubeconfig in key {key} is not valid UTF-8: {source}")]
    InvalidKubeconfigEncoding {
        key: &'static str,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("Invalid server URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: http::uri::InvalidUri,
    },

    #[error("syncer-gen failed with {0}")]
    SyncerGen(ExitStatus),

    #[error("Kubeconfig error: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Invalid kubeconfig document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
