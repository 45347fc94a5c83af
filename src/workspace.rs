//! kcp logical cluster paths and per-workspace client access

use crate::{Error, Result};
use kube::Client;
use std::fmt;

/// Name of the root workspace every path starts from
pub const ROOT: &str = "root";

const MAX_NAME_LEN: usize = 63;

/// Colon-separated workspace path such as `root:imw1`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogicalCluster(String);

impl LogicalCluster {
    pub fn root() -> Self {
        Self(ROOT.to_string())
    }

    /// Parse a full path. Every segment must be a valid workspace name.
    pub fn parse(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(Error::InvalidPath(path.to_string()));
        }
        for segment in path.split(':') {
            check_workspace_name(segment).map_err(|_| Error::InvalidPath(path.to_string()))?;
        }
        Ok(Self(path.to_string()))
    }

    /// Path of a direct child workspace
    pub fn child(&self, name: &str) -> Self {
        Self(format!("{}:{}", self.0, name))
    }

    pub fn path(&self) -> &str {
        &self.0
    }

    /// Segments below the root workspace, in order
    pub fn segments_below_root(&self) -> impl Iterator<Item = &str> {
        self.0.split(':').skip(1)
    }
}

impl fmt::Display for LogicalCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate a workspace name as a DNS-1123 label.
pub fn check_workspace_name(name: &str) -> Result<()> {
    let invalid = |reason| Error::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid("must be no more than 63 characters"));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err(invalid(
            "must consist of lower case alphanumeric characters or '-'",
        ));
    }
    let alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    let bytes = name.as_bytes();
    if !alnum(bytes[0]) || !alnum(bytes[bytes.len() - 1]) {
        return Err(invalid("must start and end with an alphanumeric character"));
    }
    Ok(())
}

/// Source of clients bound to a single kcp workspace.
pub trait Connect {
    /// Client whose requests land in `cluster`
    fn connect(&self, cluster: &LogicalCluster) -> Result<Client>;

    /// Server URL that addresses `cluster`
    fn server_url(&self, cluster: &LogicalCluster) -> Result<String>;
}
