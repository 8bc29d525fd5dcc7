//! BigQuery dataset, event table and editor binding.

use tracing::info;

use dwh_config::WarehousePlatform;
use dwh_graph::{InterpolationPart, Properties, PropertyValue, ResourceDecl, ResourceGraph};

use super::{ComputeDescriptor, ProvisionedWarehouse, WarehouseProvisioner, WarehouseSpec};
use crate::error::{IacError, IacResult};
use crate::exporter::ExportValue;
use crate::identity::bind_dataset_editor;

pub(crate) const DATASET: &str = "analytics_dataset";
pub(crate) const TABLE: &str = "events_table";

/// Partitioning granularity. BigQuery tables built here are always day-partitioned.
const PARTITION_TYPE: &str = "DAY";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BigQueryDataset;

impl WarehouseProvisioner for BigQueryDataset {
    fn platform(&self) -> WarehousePlatform {
        WarehousePlatform::BigQuery
    }

    fn provision(
        &self,
        spec: &WarehouseSpec,
        graph: &mut ResourceGraph,
    ) -> IacResult<ProvisionedWarehouse> {
        let ComputeDescriptor::Dataset(settings) = &spec.compute else {
            return Err(IacError::validation(&spec.identifier, "not a dataset spec"));
        };

        info!(
            "Declaring BigQuery dataset {} in {}",
            settings.dataset_id, settings.location
        );

        let dataset = graph.add(
            ResourceDecl::new("google_bigquery_dataset", DATASET)
                .with_property("dataset_id", settings.dataset_id.as_str())
                .with_property("friendly_name", settings.friendly_name.as_str())
                .with_property("description", settings.description.as_str())
                .with_property("location", settings.location.as_str())
                .with_property("delete_contents_on_destroy", settings.delete_contents_on_destroy)
                .with_optional_property("project", settings.project.as_deref()),
        )?;

        let schema = serde_json::to_string(&settings.schema)?;

        let mut partitioning = Properties::new();
        partitioning.insert("type".into(), PropertyValue::str(PARTITION_TYPE));
        partitioning.insert("field".into(), PropertyValue::str(&settings.partition_field));

        let table = graph.add(
            ResourceDecl::new("google_bigquery_table", TABLE)
                .with_property("dataset_id", dataset.output("dataset_id"))
                .with_property("table_id", settings.table_id.as_str())
                .with_property("description", settings.table_description.as_str())
                .with_property("deletion_protection", settings.deletion_protection)
                .with_property("schema", schema)
                .with_property("time_partitioning", PropertyValue::Block(vec![partitioning]))
                .with_property(
                    "clustering",
                    PropertyValue::list_of_str(settings.clustering.iter().cloned()),
                )
                .with_optional_property("project", settings.project.as_deref()),
        )?;

        bind_dataset_editor(
            graph,
            &dataset,
            &settings.editor_email,
            settings.uses_placeholder_principal(),
        )?;

        let full_path = ExportValue::Concat(vec![
            InterpolationPart::Ref(dataset.output("project")),
            InterpolationPart::Text(".".to_string()),
            InterpolationPart::Ref(dataset.output("dataset_id")),
            InterpolationPart::Text(".".to_string()),
            InterpolationPart::Ref(table.output("table_id")),
        ]);

        Ok(ProvisionedWarehouse::new(
            dataset.output("self_link"),
            ExportValue::literal(&spec.database_name),
            ExportValue::literal(&spec.admin_username),
        )
        .with_extra("dataset_id", dataset.output("dataset_id"))
        .with_extra("table_id", table.output("table_id"))
        .with_extra("table_full_path", full_path))
    }
}
