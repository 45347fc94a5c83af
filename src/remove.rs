//! `kubectl kubestellar remove ...`

use crate::context::Context;
use crate::crd::{Location, SyncTarget, Workspace};
use crate::reconcile::delete_if_exists;
use crate::workspace::{check_workspace_name, LogicalCluster};
use crate::Result;
use clap::{Args, Subcommand};
use kube::Api;
use tracing::{error, info};

#[derive(Subcommand, Debug)]
pub enum RemoveCommand {
    /// Delete an inventory entry for a given WEC
    #[command(alias = "loc")]
    Location(RemoveLocation),
    /// Delete a workload description space (WDS, formerly WMW)
    #[command(alias = "wmw")]
    Wds(RemoveWds),
}

impl RemoveCommand {
    pub async fn run(self, context: &Context) -> Result<()> {
        match self {
            Self::Location(location) => location.run(context).await,
            Self::Wds(wds) => wds.run(context).await,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct RemoveLocation {
    /// IMW name
    #[arg(long)]
    pub imw: String,
    /// Location (and SyncTarget) name
    pub name: String,
}

impl RemoveLocation {
    /// Delete the SyncTarget, then the Location, from the IMW.
    pub async fn run(self, context: &Context) -> Result<()> {
        check_workspace_name(&self.imw)?;
        check_workspace_name(&self.name)?;
        let imw = LogicalCluster::root().child(&self.imw);
        let client = context.connector.connect(&imw)?;

        let targets: Api<SyncTarget> = Api::all(client.clone());
        match delete_if_exists(&targets, &self.name).await {
            Ok(true) => info!("Removed SyncTarget {} from workspace {}", self.name, imw),
            Ok(false) => info!("Verified no SyncTarget {} in workspace {}", self.name, imw),
            Err(err) => {
                error!("Problem removing SyncTarget {} from workspace {}", self.name, imw);
                return Err(err);
            }
        }

        let locations: Api<Location> = Api::all(client);
        match delete_if_exists(&locations, &self.name).await {
            Ok(true) => info!("Removed Location {} from workspace {}", self.name, imw),
            Ok(false) => info!("Verified no Location {} in workspace {}", self.name, imw),
            Err(err) => {
                error!("Problem removing Location {} from workspace {}", self.name, imw);
                return Err(err);
            }
        }

        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub struct RemoveWds {
    /// WDS name
    pub name: String,
}

impl RemoveWds {
    pub async fn run(self, context: &Context) -> Result<()> {
        check_workspace_name(&self.name)?;
        let root = LogicalCluster::root();
        let workspaces: Api<Workspace> = Api::all(context.connector.connect(&root)?);

        if delete_if_exists(&workspaces, &self.name).await? {
            info!("Removed workspace {}", self.name);
        } else {
            info!("Verified no workspace {}", self.name);
        }
        Ok(())
    }
}
