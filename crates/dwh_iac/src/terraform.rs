//! Terraform HCL rendering.
//!
//! A [`DeploymentPlan`] is written as a Terraform root module an external
//! engine can apply. Explicit ordering edges become `depends_on`; property
//! references become attribute traversals, which Terraform orders on its own.
//! Secrets from configuration become `sensitive` input variables and are
//! never written into the files.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use dwh_config::CloudProvider;
use dwh_graph::{InterpolationPart, Properties, PropertyValue, ResourceDecl, SecretRef};

use crate::deployment::DeploymentPlan;
use crate::error::IacResult;
use crate::exporter::ExportValue;

const INDENT: &str = "  ";

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub name: String,
    pub content: String,
}

impl RenderedFile {
    fn new(name: &str, content: String) -> Self {
        Self {
            name: name.to_string(),
            content,
        }
    }
}

/// Renders plans as Terraform configuration.
pub struct TerraformRenderer {
    required_version: String,
}

impl Default for TerraformRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TerraformRenderer {
    pub fn new() -> Self {
        Self {
            required_version: ">= 1.6.0".to_string(),
        }
    }

    /// Set the `required_version` constraint.
    pub fn with_required_version(mut self, constraint: impl Into<String>) -> Self {
        self.required_version = constraint.into();
        self
    }

    /// Render every file of the module. The output only depends on the plan.
    pub fn render(&self, plan: &DeploymentPlan) -> IacResult<Vec<RenderedFile>> {
        let cloud = plan.platform.cloud();
        Ok(vec![
            RenderedFile::new("versions.tf", self.versions_tf(plan, cloud)),
            RenderedFile::new("provider.tf", provider_tf(cloud)),
            RenderedFile::new("variables.tf", variables_tf(plan, cloud)),
            RenderedFile::new("main.tf", main_tf(plan)?),
            RenderedFile::new("outputs.tf", outputs_tf(plan)),
            RenderedFile::new(".gitignore", GITIGNORE.to_string()),
        ])
    }

    /// Render into `dir`, creating it if needed.
    pub fn write(&self, plan: &DeploymentPlan, dir: &Path) -> IacResult<Vec<PathBuf>> {
        info!("Rendering Terraform module at {:?}", dir);
        fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        for file in self.render(plan)? {
            let path = dir.join(&file.name);
            debug!("Writing {:?}", path);
            fs::write(&path, file.content)?;
            written.push(path);
        }
        Ok(written)
    }

    fn versions_tf(&self, plan: &DeploymentPlan, cloud: CloudProvider) -> String {
        let mut providers = vec![(cloud.provider_name(), cloud.provider_source(), provider_version(cloud))];
        if plan.graph.of_kind("random_password").next().is_some() {
            providers.push(("random", "hashicorp/random", "~> 3.0"));
        }

        let mut out = String::from("terraform {\n");
        out.push_str(&format!(
            "{}required_version = {}\n",
            INDENT,
            quote(&self.required_version)
        ));
        out.push('\n');
        out.push_str(&format!("{}required_providers {{\n", INDENT));
        for (name, source, version) in providers {
            out.push_str(&format!("{0}{0}{1} = {{\n", INDENT, name));
            out.push_str(&format!("{0}{0}{0}source  = {1}\n", INDENT, quote(source)));
            out.push_str(&format!("{0}{0}{0}version = {1}\n", INDENT, quote(version)));
            out.push_str(&format!("{0}{0}}}\n", INDENT));
        }
        out.push_str(&format!("{}}}\n", INDENT));
        out.push_str("}\n");
        out
    }
}

fn provider_version(cloud: CloudProvider) -> &'static str {
    match cloud {
        CloudProvider::Aws => "~> 5.0",
        CloudProvider::Azure => "~> 3.0",
        CloudProvider::Gcp => "~> 5.0",
    }
}

fn provider_tf(cloud: CloudProvider) -> String {
    match cloud {
        CloudProvider::Aws => "provider \"aws\" {\n  region = var.region\n}\n".to_string(),
        CloudProvider::Azure => "provider \"azurerm\" {\n  features {}\n}\n".to_string(),
        CloudProvider::Gcp => {
            "provider \"google\" {\n  project = var.project\n  region  = var.region\n}\n"
                .to_string()
        }
    }
}

fn variables_tf(plan: &DeploymentPlan, cloud: CloudProvider) -> String {
    let mut out = String::new();

    if cloud != CloudProvider::Azure {
        out.push_str("variable \"region\" {\n");
        out.push_str("  type    = string\n");
        out.push_str(&format!("  default = {}\n", quote(&plan.region)));
        out.push_str("}\n");
    }
    if cloud == CloudProvider::Gcp {
        out.push_str("\nvariable \"project\" {\n");
        out.push_str("  type    = string\n");
        out.push_str("  default = null\n");
        out.push_str("}\n");
    }

    let mut keys = BTreeSet::new();
    for decl in plan.graph.resources() {
        for value in decl.properties.values() {
            collect_secret_keys(value, &mut keys);
        }
    }
    for key in keys {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("variable \"{}\" {{\n", variable_name(&key)));
        let description = format!("Value of the {} secret", key);
        out.push_str(&format!("  description = {}\n", quote(&description)));
        out.push_str("  type        = string\n");
        out.push_str("  sensitive   = true\n");
        out.push_str("}\n");
    }
    out
}

fn main_tf(plan: &DeploymentPlan) -> IacResult<String> {
    let mut out = String::new();
    for (i, id) in plan.graph.execution_order()?.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        render_resource(&mut out, plan.graph.require(id)?);
    }
    Ok(out)
}

fn outputs_tf(plan: &DeploymentPlan) -> String {
    let mut out = String::new();
    for (i, (key, value)) in plan.outputs.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let expression = match value {
            ExportValue::Literal(s) => quote(s),
            ExportValue::Ref(r) => r.to_string(),
            ExportValue::Concat(parts) => interpolate(parts),
        };
        out.push_str(&format!("output \"{}\" {{\n", key));
        out.push_str(&format!("  value = {}\n", expression));
        out.push_str("}\n");
    }
    out
}

fn render_resource(out: &mut String, decl: &ResourceDecl) {
    out.push_str(&format!(
        "resource \"{}\" \"{}\" {{\n",
        decl.id.kind(),
        decl.id.name()
    ));
    render_body(out, &decl.properties, 1);
    if !decl.depends_on.is_empty() {
        let deps: Vec<String> = decl.depends_on.iter().map(ToString::to_string).collect();
        out.push('\n');
        out.push_str(&format!("{}depends_on = [{}]\n", INDENT, deps.join(", ")));
    }
    out.push_str("}\n");
}

fn render_body(out: &mut String, properties: &Properties, depth: usize) {
    let pad = INDENT.repeat(depth);
    for (key, value) in properties {
        match value {
            // Non-empty blocks use nested block syntax; an empty one is an
            // explicit empty list so the provider removes unmanaged entries.
            PropertyValue::Block(blocks) if !blocks.is_empty() => {
                for block in blocks {
                    out.push_str(&format!("{}{} {{\n", pad, key));
                    render_body(out, block, depth + 1);
                    out.push_str(&format!("{}}}\n", pad));
                }
            }
            _ => out.push_str(&format!("{}{} = {}\n", pad, key, expression(value))),
        }
    }
}

fn expression(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Str(s) => quote(s),
        PropertyValue::Int(i) => i.to_string(),
        PropertyValue::Bool(b) => b.to_string(),
        PropertyValue::List(items) => {
            let items: Vec<String> = items.iter().map(expression).collect();
            format!("[{}]", items.join(", "))
        }
        PropertyValue::Map(map) => object(map),
        PropertyValue::Block(blocks) => {
            let items: Vec<String> = blocks.iter().map(object).collect();
            format!("[{}]", items.join(", "))
        }
        PropertyValue::Ref(r) => r.to_string(),
        PropertyValue::Secret(SecretRef::Config { key }) => format!("var.{}", variable_name(key)),
        PropertyValue::Secret(SecretRef::Output(r)) => r.to_string(),
        PropertyValue::Interpolate(parts) => interpolate(parts),
    }
}

fn object(map: &Properties) -> String {
    let fields: Vec<String> = map
        .iter()
        .map(|(k, v)| format!("{} = {}", k, expression(v)))
        .collect();
    format!("{{ {} }}", fields.join(", "))
}

fn interpolate(parts: &[InterpolationPart]) -> String {
    let mut body = String::new();
    for part in parts {
        match part {
            InterpolationPart::Text(text) => body.push_str(&escape(text)),
            InterpolationPart::Ref(r) => body.push_str(&format!("${{{}}}", r)),
        }
    }
    format!("\"{}\"", body)
}

fn quote(value: &str) -> String {
    format!("\"{}\"", escape(value))
}

/// Escape a string literal, including template sequences.
fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace("${", "$${")
        .replace("%{", "%%{")
}

/// `dbPassword` -> `db_password`.
fn variable_name(key: &str) -> String {
    let mut name = String::with_capacity(key.len() + 4);
    for (i, c) in key.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                name.push('_');
            }
            name.push(c.to_ascii_lowercase());
        } else if c.is_ascii_alphanumeric() {
            name.push(c);
        } else {
            name.push('_');
        }
    }
    name
}

fn collect_secret_keys(value: &PropertyValue, out: &mut BTreeSet<String>) {
    match value {
        PropertyValue::Secret(SecretRef::Config { key }) => {
            out.insert(key.clone());
        }
        PropertyValue::List(items) => items.iter().for_each(|v| collect_secret_keys(v, out)),
        PropertyValue::Map(map) => map.values().for_each(|v| collect_secret_keys(v, out)),
        PropertyValue::Block(blocks) => blocks
            .iter()
            .flat_map(|b| b.values())
            .for_each(|v| collect_secret_keys(v, out)),
        _ => {}
    }
}

const GITIGNORE: &str = r#"# Local .terraform directories
**/.terraform/*

# State files
*.tfstate
*.tfstate.*

# Crash log files
crash.log
crash.*.log

# Variable files may hold the database password
*.tfvars
*.tfvars.json

# Override files
override.tf
override.tf.json
*_override.tf
*_override.tf.json
"#;
