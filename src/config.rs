//! Client configuration from kubeconfig and command line flags

use crate::workspace::{Connect, LogicalCluster};
use crate::{Error, Result};
use clap::Args;
use http::Uri;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::PathBuf;
use tracing::debug;

/// kubeconfig context that addresses the kcp root workspace
pub const ROOT_CONTEXT: &str = "root";

/// Connection flags shared by every sub-command
#[derive(Args, Debug, Clone, Default)]
pub struct ClientOptions {
    /// Path to the kubeconfig file to use for CLI requests
    #[arg(global = true, long)]
    pub kubeconfig: Option<PathBuf>,

    /// The name of the kubeconfig context to use
    #[arg(global = true, long)]
    pub context: Option<String>,

    /// The name of the kubeconfig cluster to use
    #[arg(global = true, long)]
    pub cluster: Option<String>,

    /// The name of the kubeconfig user to use
    #[arg(global = true, long)]
    pub user: Option<String>,

    /// The address and port of the Kubernetes API server
    #[arg(global = true, long, short = 's')]
    pub server: Option<String>,

    /// Skip verification of the server's certificate
    #[arg(global = true, long)]
    pub insecure_skip_tls_verify: bool,
}

impl ClientOptions {
    /// Resolve a client config, using `default_context` when no `--context` was given.
    pub async fn load(&self, default_context: Option<&str>) -> Result<Config> {
        let kubeconfig = match &self.kubeconfig {
            Some(path) => Kubeconfig::read_from(path)?,
            None => Kubeconfig::read()?,
        };

        let options = KubeConfigOptions {
            context: self
                .context
                .clone()
                .or_else(|| default_context.map(str::to_string)),
            cluster: self.cluster.clone(),
            user: self.user.clone(),
        };
        debug!("Loading kubeconfig with context {:?}", options.context);

        let mut config = Config::from_custom_kubeconfig(kubeconfig, &options).await?;

        if let Some(server) = &self.server {
            config.cluster_url = server.parse().map_err(|source| Error::InvalidUrl {
                url: server.clone(),
                source,
            })?;
        }
        if self.insecure_skip_tls_verify {
            config.accept_invalid_certs = true;
        }

        debug!("Using server {}", config.cluster_url);
        Ok(config)
    }

    /// Fill in `context` when no `--context` was given.
    pub fn with_default_context(mut self, context: &str) -> Self {
        self.context.get_or_insert_with(|| context.to_string());
        self
    }

    /// Flags to hand to a child `kubectl` so it talks to the same server
    pub fn kubectl_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(kubeconfig) = &self.kubeconfig {
            args.push(format!("--kubeconfig={}", kubeconfig.display()));
        }
        if let Some(context) = &self.context {
            args.push(format!("--context={context}"));
        }
        if let Some(cluster) = &self.cluster {
            args.push(format!("--cluster={cluster}"));
        }
        if let Some(user) = &self.user {
            args.push(format!("--user={user}"));
        }
        if self.insecure_skip_tls_verify {
            args.push("--insecure-skip-tls-verify".to_string());
        }
        args
    }
}

/// Rewrite the root workspace URL so it addresses `cluster`.
///
/// Each path segment below `root` is appended as `:<name>`, so
/// `https://kcp:6443/clusters/root` becomes `https://kcp:6443/clusters/root:imw1`.
pub fn workspace_url(root_url: &Uri, cluster: &LogicalCluster) -> Result<Uri> {
    let mut url = root_url.to_string().trim_end_matches('/').to_string();
    for segment in cluster.segments_below_root() {
        url.push(':');
        url.push_str(segment);
    }
    url.parse().map_err(|source| Error::InvalidUrl { url, source })
}

/// Connects to kcp workspaces relative to the root workspace server
#[derive(Clone)]
pub struct KcpConnector {
    root: Config,
}

impl KcpConnector {
    pub fn new(root: Config) -> Self {
        Self { root }
    }

    fn config_for(&self, cluster: &LogicalCluster) -> Result<Config> {
        let mut config = self.root.clone();
        config.cluster_url = workspace_url(&self.root.cluster_url, cluster)?;
        debug!("Set host to {} for workspace {}", config.cluster_url, cluster);
        Ok(config)
    }
}

impl Connect for KcpConnector {
    fn connect(&self, cluster: &LogicalCluster) -> Result<Client> {
        Ok(Client::try_from(self.config_for(cluster)?)?)
    }

    fn server_url(&self, cluster: &LogicalCluster) -> Result<String> {
        Ok(self.config_for(cluster)?.cluster_url.to_string())
    }
}
