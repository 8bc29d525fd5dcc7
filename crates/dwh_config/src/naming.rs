//! Platform naming rules for declared resources.

use regex::Regex;

use crate::error::{ConfigError, ConfigResult};

/// A naming constraint enforced before submission.
#[derive(Debug, Clone)]
pub struct NamingRule {
    pub id: &'static str,
    pub pattern: &'static str,
    pub hint: &'static str,
}

impl NamingRule {
    pub const fn new(id: &'static str, pattern: &'static str, hint: &'static str) -> Self {
        Self { id, pattern, hint }
    }

    /// Check `value`, returning a human readable violation if it does not match.
    pub fn check(&self, field: &str, value: &str) -> ConfigResult<Option<String>> {
        let regex = Regex::new(self.pattern).map_err(|e| ConfigError::ValidationFailed(format!(
            "naming rule {} has an invalid pattern: {}",
            self.id, e
        )))?;

        if regex.is_match(value) {
            Ok(None)
        } else {
            Ok(Some(format!(
                "{} '{}' violates {}: {}",
                field, value, self.id, self.hint
            )))
        }
    }
}

pub const REDSHIFT_CLUSTER_ID: NamingRule = NamingRule::new(
    "redshift-cluster-identifier",
    r"^[a-z]([a-z0-9]|-[a-z0-9]){0,62}$",
    "1-63 lowercase letters, digits or single hyphens, starting with a letter",
);

pub const REDSHIFT_SERVERLESS_NAME: NamingRule = NamingRule::new(
    "redshift-serverless-name",
    r"^[a-z0-9-]{3,64}$",
    "3-64 lowercase letters, digits or hyphens",
);

pub const REDSHIFT_DATABASE: NamingRule = NamingRule::new(
    "redshift-database-name",
    r"^[a-z_][a-z0-9_$]{0,63}$",
    "1-64 lowercase letters, digits, underscores or $, not starting with a digit",
);

pub const ADMIN_USERNAME: NamingRule = NamingRule::new(
    "admin-username",
    r"^[A-Za-z][A-Za-z0-9_]{0,127}$",
    "starts with a letter, then letters, digits or underscores",
);

pub const AZURE_STORAGE_ACCOUNT: NamingRule = NamingRule::new(
    "azure-storage-account",
    r"^[a-z0-9]{3,24}$",
    "3-24 lowercase letters or digits",
);

pub const SYNAPSE_WORKSPACE: NamingRule = NamingRule::new(
    "synapse-workspace",
    r"^[a-z0-9]([a-z0-9-]{0,48}[a-z0-9])?$",
    "1-50 lowercase letters, digits or hyphens, not starting or ending with a hyphen",
);

pub const AZURE_RESOURCE_GROUP: NamingRule = NamingRule::new(
    "azure-resource-group",
    r"^[-\w.()]{0,89}[-\w()]$",
    "1-90 word characters, hyphens, periods or parentheses, not ending with a period",
);

pub const BIGQUERY_ID: NamingRule = NamingRule::new(
    "bigquery-identifier",
    r"^[A-Za-z0-9_]{1,1024}$",
    "letters, digits or underscores",
);

pub const SERVICE_ACCOUNT_EMAIL: NamingRule = NamingRule::new(
    "service-account-email",
    r"^[^@\s]+@[^@\s]+\.[^@\s]+$",
    "a valid e-mail address",
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_identifier_rule() {
        assert!(REDSHIFT_CLUSTER_ID
            .check("clusterIdentifier", "my-redshift-cluster")
            .unwrap()
            .is_none());
        assert!(REDSHIFT_CLUSTER_ID
            .check("clusterIdentifier", "My_Cluster")
            .unwrap()
            .is_some());
        assert!(REDSHIFT_CLUSTER_ID
            .check("clusterIdentifier", "double--hyphen")
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_storage_account_rule() {
        assert!(AZURE_STORAGE_ACCOUNT
            .check("storageAccountName", "synapsedatalake")
            .unwrap()
            .is_none());
        let violation = AZURE_STORAGE_ACCOUNT
            .check("storageAccountName", "Synapse-Data-Lake")
            .unwrap()
            .unwrap();
        assert!(violation.contains("azure-storage-account"));
    }

    #[test]
    fn test_email_rule() {
        assert!(SERVICE_ACCOUNT_EMAIL
            .check("sa_email", "loader@proj.iam.gserviceaccount.com")
            .unwrap()
            .is_none());
        assert!(SERVICE_ACCOUNT_EMAIL.check("sa_email", "loader").unwrap().is_some());
    }
}
