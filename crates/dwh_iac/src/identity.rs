//! Service identities and permission bindings.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use dwh_config::defaults;
use dwh_graph::{OutputRef, ResourceDecl, ResourceGraph, ResourceId};

use crate::error::IacResult;

/// A managed policy attached to a service role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Permission {
    /// Appended to the role name to form the attachment's logical name.
    pub suffix: String,
    pub policy_arn: String,
}

impl Permission {
    pub fn new(suffix: impl Into<String>, policy_arn: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            policy_arn: policy_arn.into(),
        }
    }

    /// Read-only S3 access for `COPY` loads.
    pub fn s3_read_only() -> Self {
        Self::new("s3-read-only", defaults::S3_READ_ONLY_POLICY_ARN)
    }
}

/// The role a warehouse assumes to reach other services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub role_name: String,
    pub trust_principal: String,
    pub attached_permissions: Vec<Permission>,
}

/// The attachment resources a compute resource must wait for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttachmentHandle {
    attachments: BTreeSet<ResourceId>,
}

impl AttachmentHandle {
    pub fn single(id: ResourceId) -> Self {
        Self {
            attachments: BTreeSet::from([id]),
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &ResourceId> {
        self.attachments.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.attachments.len()
    }
}

impl IntoIterator for AttachmentHandle {
    type Item = ResourceId;
    type IntoIter = std::collections::btree_set::IntoIter<ResourceId>;

    fn into_iter(self) -> Self::IntoIter {
        self.attachments.into_iter()
    }
}

/// A role declared in a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundIdentity {
    pub role: ResourceId,
    pub role_arn: OutputRef,
    pub attachments: AttachmentHandle,
}

impl Identity {
    /// A role assumable by Redshift with read-only S3 access.
    pub fn redshift(role_name: impl Into<String>) -> Self {
        Self {
            role_name: role_name.into(),
            trust_principal: defaults::REDSHIFT_SERVICE_PRINCIPAL.to_string(),
            attached_permissions: vec![Permission::s3_read_only()],
        }
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.attached_permissions.push(permission);
        self
    }

    /// Trust policy letting only the service principal assume the role.
    pub fn trust_policy(&self) -> serde_json::Value {
        json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Action": "sts:AssumeRole",
                "Effect": "Allow",
                "Principal": {
                    "Service": self.trust_principal
                }
            }]
        })
    }

    /// Declare the role and one attachment per permission.
    pub fn bind(&self, graph: &mut ResourceGraph) -> IacResult<BoundIdentity> {
        let policy = serde_json::to_string(&self.trust_policy())?;
        let role = graph.add(
            ResourceDecl::new("aws_iam_role", &self.role_name)
                .with_property("name", self.role_name.as_str())
                .with_property("assume_role_policy", policy),
        )?;

        let mut attachments = BTreeSet::new();
        for permission in &self.attached_permissions {
            let name = format!("{}-{}", self.role_name, permission.suffix);
            debug!("Attaching {} to {}", permission.policy_arn, self.role_name);
            let id = graph.add(
                ResourceDecl::new("aws_iam_role_policy_attachment", name)
                    .with_property("role", role.output("name"))
                    .with_property("policy_arn", permission.policy_arn.as_str()),
            )?;
            attachments.insert(id);
        }

        Ok(BoundIdentity {
            role_arn: role.output("arn"),
            role,
            attachments: AttachmentHandle { attachments },
        })
    }
}

/// Grant the workspace's managed identity write access to its data lake.
pub fn bind_synapse_storage(
    graph: &mut ResourceGraph,
    storage_account: &ResourceId,
    workspace: &ResourceId,
) -> IacResult<AttachmentHandle> {
    let id = graph.add(
        ResourceDecl::new("azurerm_role_assignment", "synapse-storage-contributor")
            .with_property("scope", storage_account.output("id"))
            .with_property("role_definition_name", defaults::STORAGE_BLOB_CONTRIBUTOR_ROLE)
            .with_property("principal_id", workspace.output("identity[0].principal_id")),
    )?;
    Ok(AttachmentHandle::single(id))
}

/// Grant a service account edit access on a dataset, after the dataset exists.
pub fn bind_dataset_editor(
    graph: &mut ResourceGraph,
    dataset: &ResourceId,
    service_account_email: &str,
    placeholder: bool,
) -> IacResult<ResourceId> {
    if placeholder {
        warn!(
            "Granting {} to placeholder principal {}",
            defaults::DATASET_EDITOR_ROLE,
            service_account_email
        );
    }
    let id = graph.add(
        ResourceDecl::new("google_bigquery_dataset_iam_member", "dataset_editor_access")
            .with_property("dataset_id", dataset.output("dataset_id"))
            .with_property("role", defaults::DATASET_EDITOR_ROLE)
            .with_property("member", format!("serviceAccount:{}", service_account_email))
            .with_depends_on(dataset.clone()),
    )?;
    Ok(id)
}
