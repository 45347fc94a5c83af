//! `kubectl kubestellar get-external-kubeconfig` / `get-internal-kubeconfig`

use crate::{Error, Result};
use clap::{Args, ValueHint};
use k8s_openapi::api::core::v1::Secret;
use kube::config::Kubeconfig;
use kube::{Api, Client};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Secret in which the KubeStellar deployment publishes its kubeconfigs
pub const SECRET_NAME: &str = "kubestellar";
pub const DEFAULT_NAMESPACE: &str = "kubestellar";

/// Which of the published kubeconfigs to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// For use from outside the hosting cluster
    External,
    /// For use from inside the hosting cluster
    Internal,
}

impl Access {
    pub fn secret_key(self) -> &'static str {
        match self {
            Access::External => "external.kubeconfig",
            Access::Internal => "cluster.kubeconfig",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct GetKubeconfig {
    /// Output path/filename, "-" for standard output
    #[arg(long, short = 'o', value_hint = ValueHint::FilePath)]
    pub output: PathBuf,
    /// Namespace of the KubeStellar deployment in the hosting cluster
    #[arg(long, short = 'n', default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,
}

impl GetKubeconfig {
    pub async fn run(self, client: Client, access: Access) -> Result<()> {
        let kubeconfig = fetch(client, &self.namespace, access).await?;

        if self.output.as_os_str() == "-" {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(kubeconfig.as_bytes()).await?;
            stdout.flush().await?;
        } else {
            write_private(&self.output, kubeconfig.as_bytes()).await?;
            info!("Wrote kubeconfig to {}", self.output.display());
        }
        Ok(())
    }
}

/// Read the published kubeconfig and check that it parses.
pub async fn fetch(client: Client, namespace: &str, access: Access) -> Result<String> {
    let secrets: Api<Secret> = Api::namespaced(client, namespace);
    let secret = secrets.get(SECRET_NAME).await?;

    let key = access.secret_key();
    let bytes = secret
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .map(|value| value.0.clone())
        .ok_or_else(|| Error::MissingSecretKey {
            namespace: namespace.to_string(),
            name: SECRET_NAME.to_string(),
            key,
        })?;

    let text = String::from_utf8(bytes)
        .map_err(|source| Error::InvalidKubeconfigEncoding { key, source })?;
    serde_yaml::from_str::<Kubeconfig>(&text)?;
    Ok(text)
}

/// Write a credential-bearing file readable only by its owner.
async fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);
    let mut file = options.open(path).await?;

    // mode only applies to new files
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .await?;
    }

    file.write_all(contents).await?;
    file.flush().await?;
    Ok(())
}
