//! Command line surface of `kubectl kubestellar`

use crate::config::{ClientOptions, KcpConnector, ROOT_CONTEXT};
use crate::context::Context;
use crate::ensure::EnsureCommand;
use crate::kubeconfig::{Access, GetKubeconfig};
use crate::remove::RemoveCommand;
use crate::syncer::PrepForSyncer;
use crate::Result;
use clap::{Parser, Subcommand};
use kube::Client;
use tracing::debug;

/// KubeStellar plugin for kubectl
///
/// KubeStellar is a flexible solution for challenges associated with
/// multi-cluster configuration management for edge, multi-cloud, and hybrid
/// cloud. This command provides the kubestellar sub-command for kubectl.
#[derive(Parser, Debug)]
#[command(name = "kubestellar", bin_name = "kubectl kubestellar", version)]
pub struct Cli {
    #[command(flatten)]
    pub client: ClientOptions,

    /// Log level verbosity (0 = info, 1-3 = debug, 4+ = trace)
    #[arg(global = true, short = 'v', long = "v", default_value_t = 0, value_name = "LEVEL")]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ensure a KubeStellar object is correctly set up
    #[command(subcommand)]
    Ensure(EnsureCommand),
    /// Remove a KubeStellar object
    #[command(subcommand, alias = "rm")]
    Remove(RemoveCommand),
    /// Prepare mailbox workspace, output YAML for edge cluster
    #[command(alias = "pfs")]
    PrepForSyncer(PrepForSyncer),
    /// Get KubeStellar kubectl configuration when external to host cluster
    #[command(alias = "gek")]
    GetExternalKubeconfig(GetKubeconfig),
    /// Get KubeStellar kubectl configuration from inside same cluster
    #[command(alias = "gik")]
    GetInternalKubeconfig(GetKubeconfig),
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        debug!("Command line {:?}", self);
        let Cli {
            client, command, ..
        } = self;

        match command {
            Command::Ensure(ensure) => ensure.run(&kcp_context(client).await?).await,
            Command::Remove(remove) => remove.run(&kcp_context(client).await?).await,
            Command::PrepForSyncer(prep) => prep.run(&kcp_context(client).await?).await,
            Command::GetExternalKubeconfig(get) => {
                get.run(host_client(&client).await?, Access::External).await
            }
            Command::GetInternalKubeconfig(get) => {
                get.run(host_client(&client).await?, Access::Internal).await
            }
        }
    }
}

/// Context rooted at the kcp root workspace
async fn kcp_context(options: ClientOptions) -> Result<Context> {
    let options = options.with_default_context(ROOT_CONTEXT);
    let root = options.load(None).await?;
    Ok(Context::new(KcpConnector::new(root), options))
}

/// Client for the cluster hosting KubeStellar, from the current context
async fn host_client(options: &ClientOptions) -> Result<Client> {
    Ok(Client::try_from(options.load(None).await?)?)
}
