//! Every externally overridable default, in one place.
//!
//! Each constant is paired with the configuration key that overrides it
//! (see [`crate::keys`]).

/// Listener port for Redshift-protocol warehouses.
pub const WAREHOUSE_PORT: u16 = 5439;

/// `databaseName`.
pub const DATABASE_NAME: &str = "analytics_db";
/// `adminUsername` (Redshift variants).
pub const ADMIN_USERNAME: &str = "admin_user";

/// `clusterIdentifier`.
pub const CLUSTER_IDENTIFIER: &str = "my-redshift-cluster";
/// `nodeType`. Cheapest node class, intended for development.
pub const NODE_TYPE: &str = "dc2.large";

/// `namespaceName`.
pub const NAMESPACE_NAME: &str = "my-redshift-namespace";
/// `workgroupName`.
pub const WORKGROUP_NAME: &str = "my-redshift-workgroup";
/// `baseCapacity`, in Redshift Processing Units.
pub const BASE_CAPACITY: u32 = 32;
/// Lowest accepted serverless base capacity.
pub const MIN_BASE_CAPACITY: u32 = 8;
/// Highest accepted serverless base capacity.
pub const MAX_BASE_CAPACITY: u32 = 512;

/// Managed policy granting read-only access to S3 for `COPY` loads.
pub const S3_READ_ONLY_POLICY_ARN: &str = "arn:aws:iam::aws:policy/AmazonS3ReadOnlyAccess";
/// Service principal allowed to assume the warehouse role.
pub const REDSHIFT_SERVICE_PRINCIPAL: &str = "redshift.amazonaws.com";

/// `resourceGroupName`.
pub const SYNAPSE_RESOURCE_GROUP: &str = "synapse-rg";
/// `sqlAdmin`.
pub const SYNAPSE_ADMIN_LOGIN: &str = "sqladminuser";
/// `storageAccountName`. Must stay globally unique in Azure; override per tenant.
pub const SYNAPSE_STORAGE_ACCOUNT: &str = "synapsedatalake";
/// Data-lake filesystem used as the workspace default storage target.
pub const SYNAPSE_FILESYSTEM: &str = "users";
/// `workspaceName`.
pub const SYNAPSE_WORKSPACE: &str = "synapse-workspace";
/// Suffix appended to the resource group name for the managed resource group.
pub const SYNAPSE_MANAGED_RG_SUFFIX: &str = "-synapse-managed";
/// Dedicated SQL pool name.
pub const SYNAPSE_SQL_POOL: &str = "sqlpool";
/// Smallest dedicated SQL pool SKU.
pub const SYNAPSE_SQL_POOL_SKU: &str = "DW100c";
/// Spark pool name.
pub const SYNAPSE_SPARK_POOL: &str = "sparkpool";
pub const SPARK_NODE_SIZE: &str = "Small";
pub const SPARK_NODE_SIZE_FAMILY: &str = "MemoryOptimized";
pub const SPARK_MIN_NODES: u32 = 3;
pub const SPARK_MAX_NODES: u32 = 3;
pub const SPARK_AUTO_PAUSE_MINUTES: u32 = 15;
pub const SPARK_VERSION: &str = "3.4";
/// Role granted to the workspace identity on its data lake.
pub const STORAGE_BLOB_CONTRIBUTOR_ROLE: &str = "Storage Blob Data Contributor";
/// Length of the generated SQL administrator password.
pub const GENERATED_PASSWORD_LENGTH: u32 = 16;

/// `dataset_id`.
pub const DATASET_ID: &str = "app_analytics_dwh";
/// `location`.
pub const DATASET_LOCATION: &str = "asia-northeast1";
pub const DATASET_FRIENDLY_NAME: &str = "App Analytics DWH";
pub const DATASET_DESCRIPTION: &str = "Dataset accumulating application event logs for analysis";
/// `table_id`.
pub const TABLE_ID: &str = "user_events";
pub const TABLE_DESCRIPTION: &str = "User behaviour event log";
/// Timestamp column carrying the mandatory day partition.
pub const PARTITION_FIELD: &str = "event_timestamp";
/// `clustering`.
pub const CLUSTERING_COLUMNS: [&str; 2] = ["event_name", "user_id"];
/// BigQuery accepts at most four clustering columns.
pub const MAX_CLUSTERING_COLUMNS: usize = 4;
/// Role granted to the dataset principal.
pub const DATASET_EDITOR_ROLE: &str = "roles/bigquery.dataEditor";
/// `sa_email`. A placeholder that must be overridden before production use.
pub const PLACEHOLDER_SA_EMAIL: &str = "my-batch-job@my-project.iam.gserviceaccount.com";
