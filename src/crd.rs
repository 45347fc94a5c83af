//! kcp and KubeStellar resources touched by the plugin.
//!
//! Only the fields the plugin reads or writes are modelled; the schemas are
//! owned by the kcp and KubeStellar CRDs.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Annotation kcp stamps on every object with its logical cluster name
pub const CLUSTER_ANNOTATION: &str = "kcp.io/cluster";

/// Label tying a Location to its SyncTarget
pub const ID_LABEL: &str = "id";

pub const EDGE_GROUP: &str = "edge.kubestellar.io";
pub const EDGE_VERSION: &str = "v2alpha1";

/// APIExport of the KubeStellar edge API, served from the ESPW
pub const EDGE_EXPORT: &str = EDGE_GROUP;

/// Default path of the edge service provider workspace
pub const ESPW_PATH: &str = "root:espw";

// --- tenancy.kcp.io ---

#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "tenancy.kcp.io",
    version = "v1alpha1",
    kind = "Workspace",
    status = "WorkspaceStatus"
)]
pub struct WorkspaceSpec {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<WorkspaceTypeReference>,
    #[serde(rename = "URL", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct WorkspaceTypeReference {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct WorkspaceStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

impl Workspace {
    /// A workspace of the `universal` type from the root workspace
    pub fn universal(name: &str) -> Self {
        Workspace::new(
            name,
            WorkspaceSpec {
                type_: Some(WorkspaceTypeReference {
                    name: "universal".to_string(),
                    path: Some("root".to_string()),
                }),
                url: None,
            },
        )
    }

    pub fn is_ready(&self) -> bool {
        self.status.as_ref().and_then(|s| s.phase.as_deref()) == Some("Ready")
    }
}

// --- apis.kcp.io ---

#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "apis.kcp.io",
    version = "v1alpha1",
    kind = "APIBinding",
    status = "APIBindingStatus"
)]
pub struct APIBindingSpec {
    pub reference: BindingReference,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct BindingReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export: Option<ExportBindingReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct ExportBindingReference {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct APIBindingStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

impl APIBinding {
    pub fn for_export(bind_name: &str, export_name: &str, export_path: &str) -> Self {
        APIBinding::new(
            bind_name,
            APIBindingSpec {
                reference: BindingReference {
                    export: Some(ExportBindingReference {
                        path: export_path.to_string(),
                        name: export_name.to_string(),
                    }),
                },
            },
        )
    }

    pub fn is_bound(&self) -> bool {
        self.status.as_ref().and_then(|s| s.phase.as_deref()) == Some("Bound")
    }
}

#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(group = "apis.kcp.io", version = "v1alpha1", kind = "APIExport")]
#[serde(rename_all = "camelCase")]
pub struct APIExportSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub latest_resource_schemas: Vec<String>,
}

// --- edge.kubestellar.io ---

#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(group = "edge.kubestellar.io", version = "v2alpha1", kind = "SyncTarget")]
pub struct SyncTargetSpec {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cells: BTreeMap<String, String>,
}

impl SyncTarget {
    /// Inventory entry for a location, labelled so its Location can select it
    pub fn for_location(name: &str) -> Self {
        let mut target = SyncTarget::new(name, SyncTargetSpec::default());
        target.metadata.labels = Some(BTreeMap::from([(
            ID_LABEL.to_string(),
            name.to_string(),
        )]));
        target
    }
}

#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(group = "edge.kubestellar.io", version = "v2alpha1", kind = "Location")]
#[serde(rename_all = "camelCase")]
pub struct LocationSpec {
    pub resource: GroupVersionResource,
    #[serde(default)]
    pub instance_selector: LabelSelector,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct GroupVersionResource {
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub resource: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,
}

impl Location {
    /// Location selecting the SyncTarget of the same name
    pub fn for_sync_target(name: &str) -> Self {
        Location::new(
            name,
            LocationSpec {
                resource: GroupVersionResource {
                    group: EDGE_GROUP.to_string(),
                    version: EDGE_VERSION.to_string(),
                    resource: "synctargets".to_string(),
                },
                instance_selector: LabelSelector {
                    match_labels: BTreeMap::from([(ID_LABEL.to_string(), name.to_string())]),
                },
            },
        )
    }
}
