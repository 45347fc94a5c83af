//! `kubectl kubestellar ensure ...`

use crate::context::Context;
use crate::crd::{
    APIBinding, Location, SyncTarget, Workspace, EDGE_EXPORT, ESPW_PATH, ID_LABEL,
};
use crate::reconcile::{delete_if_exists, ensure_labels, verify_or_create, Outcome};
use crate::wait::{poll_until, WaitOptions};
use crate::workspace::{check_workspace_name, LogicalCluster};
use crate::{Error, Result};
use clap::{ArgAction, Args, Subcommand};
use kube::Api;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Binding name for the edge API inside an IMW
pub const IMW_EDGE_BINDING: &str = "edge.kubestellar.io";

/// Binding name for the edge API inside a WDS
pub const WDS_EDGE_BINDING: &str = "bind-espw";

/// Workspace exporting the Kubernetes APIs
pub const COMPUTE_PATH: &str = "root:compute";

/// Kubernetes API exports bound into a WDS created `--with-kube`
pub const KUBE_EXPORTS: &[&str] = &[
    "kubernetes",
    "apiregistration.k8s.io",
    "apps",
    "autoscaling",
    "batch",
    "core.k8s.io",
    "cluster-core.k8s.io",
    "discovery.k8s.io",
    "flowcontrol.apiserver.k8s.io",
    "networking.k8s.io",
    "cluster-networking.k8s.io",
    "node.k8s.io",
    "policy",
    "scheduling.k8s.io",
    "storage.k8s.io",
    "cluster-storage.k8s.io",
    "admissionregistration.k8s.io",
    "certificates.k8s.io",
    "coordination.k8s.io",
    "rbac.authorization.k8s.io",
];

/// Location that kcp creates on its own; it selects every SyncTarget
const DEFAULT_LOCATION: &str = "default";

#[derive(Subcommand, Debug)]
pub enum EnsureCommand {
    /// Ensure existence and configuration of an inventory listing for a WEC
    #[command(alias = "loc")]
    Location(EnsureLocation),
    /// Ensure existence and configuration of a workload description space (WDS, formerly WMW)
    #[command(alias = "wmw")]
    Wds(EnsureWds),
}

impl EnsureCommand {
    pub async fn run(self, context: &Context) -> Result<()> {
        match self {
            Self::Location(location) => location.run(context).await,
            Self::Wds(wds) => wds.run(context).await,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct EnsureLocation {
    /// IMW name
    #[arg(long)]
    pub imw: String,
    /// Location (and SyncTarget) name
    pub name: String,
    /// Labels to set on the Location and SyncTarget
    #[arg(required = true, value_name = "KEY=VALUE")]
    pub labels: Vec<String>,
}

impl EnsureLocation {
    pub async fn run(self, context: &Context) -> Result<()> {
        check_workspace_name(&self.imw)?;
        check_workspace_name(&self.name)?;
        let labels = parse_labels(&self.name, &self.labels)?;

        let imw = LogicalCluster::root().child(&self.imw);
        let client = context.connector.connect(&imw)?;

        let bindings: Api<APIBinding> = Api::all(client.clone());
        ensure_binding(
            &bindings,
            &APIBinding::for_export(IMW_EDGE_BINDING, EDGE_EXPORT, ESPW_PATH),
            context.wait,
        )
        .await?;

        let targets: Api<SyncTarget> = Api::all(client.clone());
        verify_or_create(&targets, &SyncTarget::for_location(&self.name)).await?;
        if ensure_labels(&targets, &self.name, &labels).await? {
            info!("Updated labels on SyncTarget {} in workspace {}", self.name, imw);
        }

        let locations: Api<Location> = Api::all(client);
        verify_or_create(&locations, &Location::for_sync_target(&self.name)).await?;
        if ensure_labels(&locations, &self.name, &labels).await? {
            info!("Updated labels on Location {} in workspace {}", self.name, imw);
        }

        if self.name != DEFAULT_LOCATION && delete_if_exists(&locations, DEFAULT_LOCATION).await? {
            info!("Removed Location {} from workspace {}", DEFAULT_LOCATION, imw);
        }

        Ok(())
    }
}

/// Parse `key=value` arguments into labels for a location.
///
/// The result always carries `id=<location>`; the `id` label belongs to the
/// location itself and may only repeat its name.
pub fn parse_labels(location: &str, args: &[String]) -> Result<BTreeMap<String, String>> {
    let mut labels = BTreeMap::from([(ID_LABEL.to_string(), location.to_string())]);
    for arg in args {
        let invalid = |reason| Error::InvalidLabel {
            label: arg.clone(),
            reason,
        };
        let (key, value) = arg.split_once('=').ok_or_else(|| invalid("expected key=value"))?;
        if key.is_empty() {
            return Err(invalid("label key must not be empty"));
        }
        check_label_key(key).map_err(invalid)?;
        if !value.is_empty() {
            check_label_text(value, LabelPart::Value).map_err(invalid)?;
        }
        if key == ID_LABEL && value != location {
            return Err(invalid("the id label is reserved for the location name"));
        }
        labels.insert(key.to_string(), value.to_string());
    }
    Ok(labels)
}

const MAX_LABEL_NAME_LEN: usize = 63;
const MAX_LABEL_PREFIX_LEN: usize = 253;

/// Label key: an optional DNS-1123 subdomain prefix and `/`, then a name.
fn check_label_key(key: &str) -> std::result::Result<(), &'static str> {
    let name = match key.split_once('/') {
        Some((prefix, name)) => {
            check_label_prefix(prefix)?;
            name
        }
        None => key,
    };
    if name.is_empty() {
        return Err("label key name must not be empty");
    }
    check_label_text(name, LabelPart::Name)
}

fn check_label_prefix(prefix: &str) -> std::result::Result<(), &'static str> {
    if prefix.is_empty() || prefix.len() > MAX_LABEL_PREFIX_LEN {
        return Err("label key prefix must be a DNS subdomain of at most 253 characters");
    }
    let ok = prefix.split('.').all(|part| {
        let bytes = part.as_bytes();
        let alnum = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();
        !bytes.is_empty()
            && bytes.iter().all(|b| alnum(b) || *b == b'-')
            && bytes.first().is_some_and(alnum)
            && bytes.last().is_some_and(alnum)
    });
    if !ok {
        return Err("label key prefix must be a lower case DNS subdomain");
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum LabelPart {
    Name,
    Value,
}

/// Label key name or non-empty value: at most 63 alphanumerics, `-`, `_`
/// or `.`, alphanumeric at both ends.
fn check_label_text(text: &str, part: LabelPart) -> std::result::Result<(), &'static str> {
    let [too_long, bad_chars, bad_ends] = match part {
        LabelPart::Name => [
            "label key name must be no more than 63 characters",
            "label key name may only contain alphanumerics, '-', '_' or '.'",
            "label key name must start and end with an alphanumeric character",
        ],
        LabelPart::Value => [
            "label value must be no more than 63 characters",
            "label value may only contain alphanumerics, '-', '_' or '.'",
            "label value must start and end with an alphanumeric character",
        ],
    };
    if text.len() > MAX_LABEL_NAME_LEN {
        return Err(too_long);
    }
    let bytes = text.as_bytes();
    if !bytes
        .iter()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
    {
        return Err(bad_chars);
    }
    let alnum = |b: Option<&u8>| b.is_some_and(u8::is_ascii_alphanumeric);
    if !alnum(bytes.first()) || !alnum(bytes.last()) {
        return Err(bad_ends);
    }
    Ok(())
}

#[derive(Args, Debug, Clone)]
pub struct EnsureWds {
    /// WDS name
    pub name: String,
    /// Include Kubernetes API bindings
    #[arg(
        long,
        action = ArgAction::Set,
        default_value_t = true,
        num_args = 0..=1,
        default_missing_value = "true",
        value_name = "TRUE/FALSE"
    )]
    pub with_kube: bool,
}

impl EnsureWds {
    pub async fn run(self, context: &Context) -> Result<()> {
        check_workspace_name(&self.name)?;

        let root = LogicalCluster::root();
        let workspaces: Api<Workspace> = Api::all(context.connector.connect(&root)?);
        verify_or_create(&workspaces, &Workspace::universal(&self.name)).await?;
        wait_for_workspace(&workspaces, &self.name, context.wait).await?;

        let wds = root.child(&self.name);
        let bindings: Api<APIBinding> = Api::all(context.connector.connect(&wds)?);
        ensure_binding(
            &bindings,
            &APIBinding::for_export(WDS_EDGE_BINDING, EDGE_EXPORT, ESPW_PATH),
            context.wait,
        )
        .await?;

        ensure_kube_bindings(&bindings, self.with_kube).await
    }
}

/// Verify or create a binding, waiting for kcp to bind it when it is new.
async fn ensure_binding(
    api: &Api<APIBinding>,
    binding: &APIBinding,
    wait: WaitOptions,
) -> Result<()> {
    let name = binding.metadata.name.clone().unwrap_or_default();
    if verify_or_create(api, binding).await? == Outcome::Created {
        let name = name.as_str();
        poll_until(wait, &format!("APIBinding {name} to be bound"), move || async move {
            Ok::<_, Error>(api.get(name).await?.is_bound())
        })
        .await?;
        info!("APIBinding {} is bound", name);
    }
    Ok(())
}

async fn wait_for_workspace(api: &Api<Workspace>, name: &str, wait: WaitOptions) -> Result<()> {
    if api.get(name).await?.is_ready() {
        return Ok(());
    }
    info!("Waiting for workspace {} to be ready", name);
    poll_until(wait, &format!("workspace {name} to be ready"), move || async move {
        Ok::<_, Error>(api.get(name).await?.is_ready())
    })
    .await
}

/// Bind every Kubernetes API export, or remove those bindings when `with_kube` is off.
async fn ensure_kube_bindings(api: &Api<APIBinding>, with_kube: bool) -> Result<()> {
    for export in KUBE_EXPORTS {
        let bind_name = format!("bind-{export}");
        if with_kube {
            verify_or_create(api, &APIBinding::for_export(&bind_name, export, COMPUTE_PATH))
                .await?;
        } else if delete_if_exists(api, &bind_name).await? {
            info!("Removed APIBinding {}", bind_name);
        } else {
            debug!("Verified no APIBinding {}", bind_name);
        }
    }
    Ok(())
}
