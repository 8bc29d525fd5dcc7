//! Recognised configuration keys.

pub const DB_PASSWORD: &str = "dbPassword";
pub const ALLOWED_CIDR: &str = "allowedCidr";
pub const ALLOWED_IP_START: &str = "allowedIpStart";
pub const ALLOWED_IP_END: &str = "allowedIpEnd";

pub const PROFILE: &str = "profile";
pub const REGION: &str = "region";
pub const DATABASE_NAME: &str = "databaseName";
pub const ADMIN_USERNAME: &str = "adminUsername";
pub const VPC_ID: &str = "vpcId";
pub const SUBNET_IDS: &str = "subnetIds";

pub const CLUSTER_IDENTIFIER: &str = "clusterIdentifier";
pub const NODE_TYPE: &str = "nodeType";
pub const CLUSTER_TYPE: &str = "clusterType";
pub const NUMBER_OF_NODES: &str = "numberOfNodes";
pub const PUBLICLY_ACCESSIBLE: &str = "publiclyAccessible";
pub const SKIP_FINAL_SNAPSHOT: &str = "skipFinalSnapshot";

pub const NAMESPACE_NAME: &str = "namespaceName";
pub const WORKGROUP_NAME: &str = "workgroupName";
pub const BASE_CAPACITY: &str = "baseCapacity";

pub const SQL_ADMIN: &str = "sqlAdmin";
pub const RESOURCE_GROUP_NAME: &str = "resourceGroupName";
pub const STORAGE_ACCOUNT_NAME: &str = "storageAccountName";
pub const WORKSPACE_NAME: &str = "workspaceName";

pub const PROJECT: &str = "project";
pub const DATASET_ID: &str = "dataset_id";
pub const LOCATION: &str = "location";
pub const SA_EMAIL: &str = "sa_email";
pub const TABLE_ID: &str = "table_id";
pub const DELETION_PROTECTION: &str = "deletionProtection";
pub const DELETE_CONTENTS_ON_DESTROY: &str = "deleteContentsOnDestroy";
pub const CLUSTERING: &str = "clustering";

/// Every key the deployment builder reads.
pub const ALL: &[&str] = &[
    DB_PASSWORD,
    ALLOWED_CIDR,
    ALLOWED_IP_START,
    ALLOWED_IP_END,
    PROFILE,
    REGION,
    DATABASE_NAME,
    ADMIN_USERNAME,
    VPC_ID,
    SUBNET_IDS,
    CLUSTER_IDENTIFIER,
    NODE_TYPE,
    CLUSTER_TYPE,
    NUMBER_OF_NODES,
    PUBLICLY_ACCESSIBLE,
    SKIP_FINAL_SNAPSHOT,
    NAMESPACE_NAME,
    WORKGROUP_NAME,
    BASE_CAPACITY,
    SQL_ADMIN,
    RESOURCE_GROUP_NAME,
    STORAGE_ACCOUNT_NAME,
    WORKSPACE_NAME,
    PROJECT,
    DATASET_ID,
    LOCATION,
    SA_EMAIL,
    TABLE_ID,
    DELETION_PROTECTION,
    DELETE_CONTENTS_ON_DESTROY,
    CLUSTERING,
];
