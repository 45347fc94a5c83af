//! `kubectl kubestellar prep-for-syncer`
//!
//! For a SyncTarget, checks that its mailbox workspace is ready for a syncer
//! and then has `kubectl kubestellar syncer-gen` write the manifest that
//! installs the syncer in the edge cluster.

use crate::config::ClientOptions;
use crate::context::Context;
use crate::crd::{APIBinding, APIExport, SyncTarget, Workspace, CLUSTER_ANNOTATION, EDGE_EXPORT};
use crate::wait::settle;
use crate::workspace::{check_workspace_name, LogicalCluster};
use crate::{Error, Result};
use clap::{Args, ValueHint};
use kube::{Api, ResourceExt};
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Binding the mailbox controller creates in every mailbox workspace
pub const MAILBOX_EDGE_BINDING: &str = "bind-edge";

const MAILBOX_SETTLE: Duration = Duration::from_secs(5);
const BINDING_SETTLE: Duration = Duration::from_secs(10);

#[derive(Args, Debug, Clone)]
pub struct PrepForSyncer {
    /// SyncTarget name
    pub sync_target: String,
    /// IMW name
    #[arg(long)]
    pub imw: String,
    /// ESPW name
    #[arg(long)]
    pub espw: String,
    /// Syncer container image
    #[arg(long, value_name = "CONTAINER_IMG")]
    pub syncer_image: String,
    /// Output path/filename, defaults to <SYNC_TARGET>-syncer.yaml
    #[arg(long, short = 'o', value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
    /// Skip waiting periods
    #[arg(long)]
    pub fast: bool,
}

/// Result of the checks that precede manifest generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncerPrep {
    pub mailbox: String,
    pub mailbox_url: String,
    pub output: PathBuf,
}

/// Name of the mailbox workspace the mailbox controller makes for `target`.
pub fn mailbox_name(target: &SyncTarget) -> Result<String> {
    let missing = |field| Error::MailboxUnknown {
        name: target.name_any(),
        field,
    };
    let cluster = target
        .annotations()
        .get(CLUSTER_ANNOTATION)
        .ok_or_else(|| missing("kcp.io/cluster annotation"))?;
    let uid = target.uid().ok_or_else(|| missing("UID"))?;
    Ok(format!("{cluster}-mb-{uid}"))
}

impl PrepForSyncer {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}-syncer.yaml", self.sync_target)))
    }

    pub async fn run(self, context: &Context) -> Result<()> {
        let prep = self.prepare(context).await?;

        let mut command = self.syncer_gen_command(&prep, &context.options);
        debug!("Running {:?}", command.as_std());
        let status = command.status().await?;
        if !status.success() {
            return Err(Error::SyncerGen(status));
        }

        info!("Wrote syncer manifest to {}", prep.output.display());
        Ok(())
    }

    /// Locate the mailbox workspace and check it has what a syncer needs.
    pub async fn prepare(&self, context: &Context) -> Result<SyncerPrep> {
        check_workspace_name(&self.imw)?;
        check_workspace_name(&self.espw)?;

        let root = LogicalCluster::root();
        let imw = root.child(&self.imw);
        let espw = root.child(&self.espw);

        let targets: Api<SyncTarget> = Api::all(context.connector.connect(&imw)?);
        let target = targets
            .get_opt(&self.sync_target)
            .await?
            .ok_or_else(|| Error::Missing {
                kind: "SyncTarget",
                name: self.sync_target.clone(),
                workspace: imw.to_string(),
                hint: "",
            })?;
        let mailbox = mailbox_name(&target)?;
        info!("Mailbox name is {} for SyncTarget {}", mailbox, self.sync_target);

        let exports: Api<APIExport> = Api::all(context.connector.connect(&espw)?);
        if exports.get_opt(EDGE_EXPORT).await?.is_none() {
            return Err(Error::Missing {
                kind: "APIExport",
                name: EDGE_EXPORT.to_string(),
                workspace: espw.to_string(),
                hint: "; is this the right workspace?",
            });
        }
        info!("Found APIExport {} in ESPW {}", EDGE_EXPORT, espw);

        let workspaces: Api<Workspace> = Api::all(context.connector.connect(&root)?);
        if workspaces.get_opt(&mailbox).await?.is_none() {
            return Err(Error::Missing {
                kind: "Workspace",
                name: mailbox,
                workspace: root.to_string(),
                hint: "; is the mailbox controller running?",
            });
        }
        info!("Found mailbox {}", mailbox);
        settle(MAILBOX_SETTLE, self.fast).await;

        let mailbox_ws = root.child(&mailbox);
        let bindings: Api<APIBinding> = Api::all(context.connector.connect(&mailbox_ws)?);
        if bindings.get_opt(MAILBOX_EDGE_BINDING).await?.is_none() {
            return Err(Error::Missing {
                kind: "APIBinding",
                name: MAILBOX_EDGE_BINDING.to_string(),
                workspace: mailbox_ws.to_string(),
                hint: "; is this the right workspace?",
            });
        }
        info!("Found APIBinding {} in mailbox workspace {}", MAILBOX_EDGE_BINDING, mailbox);
        settle(BINDING_SETTLE, self.fast).await;

        Ok(SyncerPrep {
            mailbox_url: context.connector.server_url(&mailbox_ws)?,
            mailbox,
            output: self.output_path(),
        })
    }

    /// `kubectl kubestellar syncer-gen` invocation against the mailbox workspace
    pub fn syncer_gen_command(&self, prep: &SyncerPrep, options: &ClientOptions) -> Command {
        let mut command = Command::new("kubectl");
        command
            .arg("kubestellar")
            .arg("syncer-gen")
            .arg(&self.sync_target)
            .arg(format!("--syncer-image={}", self.syncer_image))
            .arg(format!("--output-file={}", prep.output.display()))
            .args(options.kubectl_args())
            .arg(format!("--server={}", prep.mailbox_url));
        command
    }
}
