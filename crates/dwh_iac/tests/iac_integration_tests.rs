//! Integration tests for warehouse composition and rendering.

use std::fs;
use std::sync::Arc;

use proptest::prelude::*;
use tempfile::tempdir;

use dwh_config::{
    keys, ConfigError, ConfigStore, DeploymentConfig, DeploymentFile, WarehousePlatform,
};
use dwh_graph::{PropertyValue, ReconcileStatus, ResourceId, ScriptedApplier};
use dwh_iac::{
    ensure_reconciled, simulate, DeploymentPipeline, DeploymentPlan, ExportValue, IacError,
    StaticInventory, TerraformRenderer,
};

const PASSWORD: &str = "Sup3r-Secret-Pw";

fn inventory() -> Arc<StaticInventory> {
    Arc::new(StaticInventory::new().with_region(
        "us-east-1",
        "vpc-0a1b2c",
        ["subnet-b", "subnet-a"],
    ))
}

fn config_from(platform: WarehousePlatform, store: ConfigStore) -> DeploymentConfig {
    DeploymentConfig::from_store(platform, &store).unwrap()
}

fn aws_store() -> ConfigStore {
    ConfigStore::new().with_secret(keys::DB_PASSWORD, PASSWORD)
}

async fn plan(config: &DeploymentConfig) -> DeploymentPlan {
    DeploymentPipeline::new(inventory()).plan(config).await.unwrap()
}

fn security_group_ingress(plan: &DeploymentPlan, name: &str) -> usize {
    plan.graph
        .get(&ResourceId::new("aws_security_group", name))
        .and_then(|sg| sg.property("ingress"))
        .and_then(PropertyValue::as_blocks)
        .map(|rules| rules.len())
        .unwrap()
}

fn rendered_text(plan: &DeploymentPlan) -> String {
    TerraformRenderer::new()
        .render(plan)
        .unwrap()
        .into_iter()
        .map(|f| f.content)
        .collect::<Vec<_>>()
        .join("\n")
}

/// The documented cluster scenario: one ingress rule, development defaults,
/// three standard outputs and no password anywhere in the outputs.
#[tokio::test]
async fn test_cluster_scenario() {
    let config = config_from(
        WarehousePlatform::RedshiftCluster,
        aws_store().with(keys::ALLOWED_CIDR, "203.0.113.0/24"),
    );
    let plan = plan(&config).await;

    let sg = plan
        .graph
        .get(&ResourceId::new("aws_security_group", "redshift-sg"))
        .unwrap();
    let ingress = sg.property("ingress").and_then(PropertyValue::as_blocks).unwrap();
    assert_eq!(ingress.len(), 1);
    assert_eq!(ingress[0]["protocol"].as_str(), Some("tcp"));
    assert_eq!(ingress[0]["from_port"].as_int(), Some(5439));
    assert_eq!(ingress[0]["to_port"].as_int(), Some(5439));
    assert_eq!(
        ingress[0]["cidr_blocks"],
        PropertyValue::list_of_str(["203.0.113.0/24"])
    );

    let egress = sg.property("egress").and_then(PropertyValue::as_blocks).unwrap();
    assert_eq!(egress.len(), 1);
    assert_eq!(egress[0]["protocol"].as_str(), Some("-1"));

    let cluster = plan
        .graph
        .get(&ResourceId::new("aws_redshift_cluster", "my-cluster"))
        .unwrap();
    assert_eq!(
        cluster.property("publicly_accessible").and_then(PropertyValue::as_bool),
        Some(true)
    );
    assert_eq!(
        cluster.property("skip_final_snapshot").and_then(PropertyValue::as_bool),
        Some(true)
    );
    assert!(cluster.property("master_password").unwrap().contains_secret());

    let keys: Vec<&str> = plan.outputs.keys().collect();
    assert_eq!(
        keys,
        vec!["cluster_identifier", "database_name", "endpoint", "username"]
    );
    assert_eq!(
        plan.outputs.get("database_name"),
        Some(&ExportValue::literal("analytics_db"))
    );
    assert_eq!(
        plan.outputs.get("username"),
        Some(&ExportValue::literal("admin_user"))
    );
}

#[tokio::test]
async fn test_no_cidr_means_no_ingress() {
    for platform in [
        WarehousePlatform::RedshiftCluster,
        WarehousePlatform::RedshiftServerless,
    ] {
        let plan = plan(&config_from(platform, aws_store())).await;
        let sg = match platform {
            WarehousePlatform::RedshiftCluster => "redshift-sg",
            _ => "redshift-serverless-sg",
        };
        assert_eq!(security_group_ingress(&plan, sg), 0, "{}", platform);
    }
}

#[tokio::test]
async fn test_attachment_precedes_compute() {
    let attachment = |role: &str| {
        ResourceId::new(
            "aws_iam_role_policy_attachment",
            format!("{}-s3-read-only", role),
        )
    };

    let cluster = plan(&config_from(WarehousePlatform::RedshiftCluster, aws_store())).await;
    assert!(cluster.graph.is_ordered_before(
        &attachment("redshift-role"),
        &ResourceId::new("aws_redshift_cluster", "my-cluster"),
    ));

    let serverless = plan(&config_from(WarehousePlatform::RedshiftServerless, aws_store())).await;
    let namespace = ResourceId::new("aws_redshiftserverless_namespace", "my-namespace");
    let workgroup = ResourceId::new("aws_redshiftserverless_workgroup", "my-workgroup");
    assert!(serverless
        .graph
        .is_ordered_before(&attachment("redshift-serverless-role"), &workgroup));
    assert!(serverless.graph.is_ordered_before(&namespace, &workgroup));
}

#[tokio::test]
async fn test_synapse_without_firewall() {
    let plan = plan(&config_from(WarehousePlatform::Synapse, ConfigStore::new())).await;

    assert_eq!(plan.graph.of_kind("azurerm_synapse_firewall_rule").count(), 0);

    let storage = ResourceId::new("azurerm_storage_account", "datalake");
    let filesystem = ResourceId::new("azurerm_storage_data_lake_gen2_filesystem", "filesystem");
    let role_assignment =
        ResourceId::new("azurerm_role_assignment", "synapse-storage-contributor");
    for (kind, name) in [
        ("azurerm_synapse_workspace", "synapseWorkspace"),
        ("azurerm_synapse_sql_pool", "sqlPool"),
        ("azurerm_synapse_spark_pool", "sparkPool"),
    ] {
        let id = ResourceId::new(kind, name);
        assert!(plan.graph.is_ordered_before(&storage, &id), "{}", id);
        assert!(plan.graph.is_ordered_before(&filesystem, &id), "{}", id);
    }
    for pool in [
        ResourceId::new("azurerm_synapse_sql_pool", "sqlPool"),
        ResourceId::new("azurerm_synapse_spark_pool", "sparkPool"),
    ] {
        assert!(plan.graph.is_ordered_before(&role_assignment, &pool), "{}", pool);
        assert!(plan.graph.get(&pool).unwrap().depends_on.contains(&role_assignment));
    }

    // No password configured: one is generated and never exported.
    assert!(plan
        .graph
        .contains(&ResourceId::new("random_password", "sqlAdminPassword")));
    assert!(plan.outputs.keys().all(|k| !k.contains("password")));
    assert!(plan.warnings.iter().any(|w| w.contains("firewall")));
}

#[tokio::test]
async fn test_synapse_with_firewall() {
    let store = ConfigStore::new()
        .with(keys::ALLOWED_IP_START, "10.0.0.1")
        .with(keys::ALLOWED_IP_END, "10.0.0.254");
    let plan = plan(&config_from(WarehousePlatform::Synapse, store)).await;

    let rule = plan
        .graph
        .get(&ResourceId::new("azurerm_synapse_firewall_rule", "allowSpecificRange"))
        .unwrap();
    assert_eq!(
        rule.property("start_ip_address").and_then(PropertyValue::as_str),
        Some("10.0.0.1")
    );
    assert_eq!(
        rule.property("end_ip_address").and_then(PropertyValue::as_str),
        Some("10.0.0.254")
    );
}

#[test]
fn test_half_ip_range_rejected() {
    let store = ConfigStore::new().with(keys::ALLOWED_IP_START, "10.0.0.1");
    let err = DeploymentConfig::from_store(WarehousePlatform::Synapse, &store).unwrap_err();
    assert!(matches!(err, ConfigError::IncompleteRange { .. }));
}

#[test]
fn test_capacity_out_of_range_rejected() {
    for capacity in ["4", "1024"] {
        let store = aws_store().with(keys::BASE_CAPACITY, capacity);
        let err = DeploymentConfig::from_store(WarehousePlatform::RedshiftServerless, &store)
            .unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref key, .. } if key == keys::BASE_CAPACITY),
            "{}",
            capacity
        );
    }
}

#[tokio::test]
async fn test_bigquery_binding_after_dataset() {
    let plan = plan(&config_from(WarehousePlatform::BigQuery, ConfigStore::new())).await;

    let dataset = ResourceId::new("google_bigquery_dataset", "analytics_dataset");
    let table = ResourceId::new("google_bigquery_table", "events_table");
    let member = ResourceId::new("google_bigquery_dataset_iam_member", "dataset_editor_access");
    assert!(plan.graph.is_ordered_before(&dataset, &member));
    assert!(plan.graph.is_ordered_before(&dataset, &table));
    assert!(plan.graph.get(&member).unwrap().depends_on.contains(&dataset));

    let table_decl = plan.graph.get(&table).unwrap();
    let partitioning = table_decl
        .property("time_partitioning")
        .and_then(PropertyValue::as_blocks)
        .unwrap();
    assert_eq!(partitioning[0]["type"].as_str(), Some("DAY"));
    assert_eq!(partitioning[0]["field"].as_str(), Some("event_timestamp"));

    assert!(plan.outputs.get("table_full_path").is_some());
}

#[tokio::test]
async fn test_dataset_contents_purge_flag() {
    let dataset = ResourceId::new("google_bigquery_dataset", "analytics_dataset");

    let defaults = plan(&config_from(WarehousePlatform::BigQuery, ConfigStore::new())).await;
    assert_eq!(
        defaults
            .graph
            .get(&dataset)
            .and_then(|d| d.property("delete_contents_on_destroy"))
            .and_then(PropertyValue::as_bool),
        Some(false)
    );
    assert!(rendered_text(&defaults).contains("delete_contents_on_destroy = false"));

    let store = ConfigStore::new().with(keys::DELETE_CONTENTS_ON_DESTROY, "true");
    let purging = plan(&config_from(WarehousePlatform::BigQuery, store)).await;
    assert!(rendered_text(&purging).contains("delete_contents_on_destroy = true"));
}

#[tokio::test]
async fn test_password_never_rendered() {
    for platform in [
        WarehousePlatform::RedshiftCluster,
        WarehousePlatform::RedshiftServerless,
    ] {
        let plan = plan(&config_from(platform, aws_store())).await;
        let rendered = rendered_text(&plan);
        assert!(!rendered.contains(PASSWORD), "{}", platform);
        assert!(rendered.contains("var.db_password"), "{}", platform);
        assert!(rendered.contains("sensitive   = true"), "{}", platform);

        let json = serde_json::to_string(&plan).unwrap();
        assert!(!json.contains(PASSWORD), "{}", platform);
    }

    let synapse = config_from(
        WarehousePlatform::Synapse,
        ConfigStore::new().with_secret(keys::DB_PASSWORD, PASSWORD),
    );
    let rendered = rendered_text(&plan(&synapse).await);
    assert!(!rendered.contains(PASSWORD));
}

#[tokio::test]
async fn test_render_to_directory() {
    let temp = tempdir().unwrap();
    let out = temp.path().join("infrastructure");
    let plan = plan(&config_from(WarehousePlatform::Synapse, ConfigStore::new())).await;

    let written = TerraformRenderer::new().write(&plan, &out).unwrap();
    assert_eq!(written.len(), 6);

    let main = fs::read_to_string(out.join("main.tf")).unwrap();
    assert!(main.contains("resource \"azurerm_synapse_workspace\" \"synapseWorkspace\""));
    assert!(main.contains(
        "managed_resource_group_name = \"${azurerm_resource_group.synapse-rg.name}-synapse-managed\""
    ));
    assert!(main.contains("depends_on = [azurerm_role_assignment.synapse-storage-contributor]"));

    let versions = fs::read_to_string(out.join("versions.tf")).unwrap();
    assert!(versions.contains("hashicorp/azurerm"));
    assert!(versions.contains("hashicorp/random"));

    let outputs = fs::read_to_string(out.join("outputs.tf")).unwrap();
    assert!(outputs.contains("output \"endpoint\""));
}

#[tokio::test]
async fn test_yaml_file_to_plan() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("deploy.yaml");
    fs::write(
        &path,
        r#"
platform: redshift-serverless
config:
  dbPassword:
    secure: Sup3r-Secret-Pw
  baseCapacity: 64
  vpcId: vpc-explicit
  subnetIds: [subnet-z, subnet-y]
"#,
    )
    .unwrap();

    let config = DeploymentFile::read(&path).unwrap().into_config().unwrap();
    let plan = DeploymentPipeline::new(Arc::new(StaticInventory::new()))
        .plan(&config)
        .await
        .unwrap();

    let workgroup = plan
        .graph
        .get(&ResourceId::new("aws_redshiftserverless_workgroup", "my-workgroup"))
        .unwrap();
    assert_eq!(
        workgroup.property("base_capacity").and_then(PropertyValue::as_int),
        Some(64)
    );
    assert_eq!(
        workgroup.property("subnet_ids"),
        Some(&PropertyValue::list_of_str(["subnet-y", "subnet-z"]))
    );
}

#[tokio::test]
async fn test_missing_default_vpc_is_resolution_error() {
    let config = config_from(WarehousePlatform::RedshiftCluster, aws_store());
    let err = DeploymentPipeline::new(Arc::new(StaticInventory::new()))
        .plan(&config)
        .await
        .unwrap_err();
    assert!(matches!(err, IacError::Resolution { .. }));
}

#[tokio::test]
async fn test_simulated_failure_skips_dependents() {
    let plan = plan(&config_from(WarehousePlatform::Synapse, ConfigStore::new())).await;
    let storage = ResourceId::new("azurerm_storage_account", "datalake");
    let report = simulate(
        &plan,
        Arc::new(ScriptedApplier::new().fail_with(storage.clone(), "StorageAccountAlreadyTaken")),
    )
    .await
    .unwrap();

    assert_eq!(
        report.status_of(&ResourceId::new("azurerm_synapse_sql_pool", "sqlPool")),
        Some(&ReconcileStatus::Skipped {
            blocked_by: storage.clone()
        })
    );
    assert_eq!(
        report.status_of(&ResourceId::new("azurerm_resource_group", "synapse-rg")),
        Some(&ReconcileStatus::Applied)
    );
    assert!(matches!(
        ensure_reconciled(&report),
        Err(IacError::Provider { .. })
    ));
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Identical input yields an identical graph and identical files.
    #[test]
    fn prop_planning_is_deterministic(
        platform in prop::sample::select(WarehousePlatform::all()),
        cidr in prop::option::of((0u8..=255, 0u8..=255, 8u8..=32)),
    ) {
        let mut store = ConfigStore::new();
        if platform != WarehousePlatform::BigQuery {
            store.set_secret(keys::DB_PASSWORD, PASSWORD);
        }
        if let Some((a, b, prefix)) = cidr {
            if platform.needs_vpc() {
                store.set(keys::ALLOWED_CIDR, format!("10.{}.{}.0/{}", a, b, prefix.max(24)));
            }
        }
        let config = DeploymentConfig::from_store(platform, &store).unwrap();

        let rt = runtime();
        let first = rt.block_on(plan(&config));
        let second = rt.block_on(plan(&config));
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(rendered_text(&first), rendered_text(&second));
    }

    /// Ingress has exactly one rule with a CIDR and none without.
    #[test]
    fn prop_ingress_is_deny_by_default(cidr in prop::option::of((1u8..=223, 0u8..=255))) {
        let mut store = aws_store();
        if let Some((a, b)) = cidr {
            store.set(keys::ALLOWED_CIDR, format!("{}.{}.0.0/16", a, b));
        }
        let config = DeploymentConfig::from_store(WarehousePlatform::RedshiftCluster, &store).unwrap();
        let plan = runtime().block_on(plan(&config));
        prop_assert_eq!(security_group_ingress(&plan, "redshift-sg"), usize::from(cidr.is_some()));
    }

    /// Synapse gets a firewall rule only for a configured range, and both pools
    /// wait for the storage role assignment either way.
    #[test]
    fn prop_synapse_firewall_is_deny_by_default(range in prop::option::of((1u8..=223, 1u8..=127))) {
        let mut store = ConfigStore::new();
        if let Some((a, last)) = range {
            store.set(keys::ALLOWED_IP_START, format!("{}.0.0.1", a));
            store.set(keys::ALLOWED_IP_END, format!("{}.0.0.{}", a, u16::from(last) + 1));
        }
        let config = DeploymentConfig::from_store(WarehousePlatform::Synapse, &store).unwrap();
        let plan = runtime().block_on(plan(&config));

        prop_assert_eq!(
            plan.graph.of_kind("azurerm_synapse_firewall_rule").count(),
            usize::from(range.is_some())
        );
        let role_assignment =
            ResourceId::new("azurerm_role_assignment", "synapse-storage-contributor");
        for pool in [
            ResourceId::new("azurerm_synapse_sql_pool", "sqlPool"),
            ResourceId::new("azurerm_synapse_spark_pool", "sparkPool"),
        ] {
            prop_assert!(plan.graph.is_ordered_before(&role_assignment, &pool), "{}", pool);
        }
    }
}
