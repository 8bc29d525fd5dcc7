//! Network access policy.
//!
//! Ingress is deny-by-default: without a configured allow-list the security
//! group carries no inbound rule at all. Egress is always open.

use serde::Serialize;
use tracing::{debug, warn};

use dwh_config::{Cidr, IpRange};
use dwh_graph::{Properties, PropertyValue, ResourceDecl, ResourceId};

/// Any protocol, as understood by AWS security groups.
pub const ALL_PROTOCOLS: &str = "-1";
pub const ANY_IPV4: &str = "0.0.0.0/0";

/// One security group rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityRule {
    pub protocol: String,
    pub from_port: u16,
    pub to_port: u16,
    pub cidr_blocks: Vec<String>,
    pub description: Option<String>,
}

impl SecurityRule {
    /// Allow TCP on a single port from one block.
    pub fn tcp(port: u16, cidr: &Cidr) -> Self {
        Self {
            protocol: "tcp".to_string(),
            from_port: port,
            to_port: port,
            cidr_blocks: vec![cidr.to_string()],
            description: None,
        }
    }

    /// Allow everything to anywhere.
    pub fn allow_all() -> Self {
        Self {
            protocol: ALL_PROTOCOLS.to_string(),
            from_port: 0,
            to_port: 0,
            cidr_blocks: vec![ANY_IPV4.to_string()],
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn to_block(&self) -> Properties {
        let mut block = Properties::new();
        block.insert("protocol".into(), PropertyValue::str(&self.protocol));
        block.insert("from_port".into(), u32::from(self.from_port).into());
        block.insert("to_port".into(), u32::from(self.to_port).into());
        block.insert(
            "cidr_blocks".into(),
            PropertyValue::list_of_str(self.cidr_blocks.iter().cloned()),
        );
        if let Some(description) = &self.description {
            block.insert("description".into(), PropertyValue::str(description));
        }
        block
    }
}

/// Inbound and outbound rules for a warehouse endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessPolicy {
    pub ingress_rules: Vec<SecurityRule>,
    pub egress_rules: Vec<SecurityRule>,
}

impl AccessPolicy {
    /// Build the policy for the warehouse listener `port`.
    ///
    /// `None` yields zero ingress rules. `Some(cidr)` yields exactly one.
    pub fn build(allowed: Option<&Cidr>, port: u16) -> Self {
        let ingress_rules = match allowed {
            Some(cidr) => {
                if cidr.is_any() {
                    warn!("Ingress on port {} is open to {}", port, cidr);
                }
                debug!("Allowing tcp/{} from {}", port, cidr);
                vec![SecurityRule::tcp(port, cidr)]
            }
            None => {
                debug!("No allowed CIDR configured; ingress denied");
                Vec::new()
            }
        };

        Self {
            ingress_rules,
            egress_rules: vec![SecurityRule::allow_all()],
        }
    }

    /// Label every ingress rule, as shown in the cloud console.
    pub fn with_ingress_description(mut self, description: &str) -> Self {
        for rule in &mut self.ingress_rules {
            rule.description = Some(description.to_string());
        }
        self
    }

    pub fn denies_all_ingress(&self) -> bool {
        self.ingress_rules.is_empty()
    }

    /// Declare the policy as an `aws_security_group` in `vpc_id`.
    ///
    /// The ingress attribute is always set, so an empty policy removes any
    /// inbound rule added outside of this declaration.
    pub fn security_group(&self, name: &str, description: &str, vpc_id: &str) -> ResourceDecl {
        ResourceDecl::new("aws_security_group", name)
            .with_property("name", name)
            .with_property("description", description)
            .with_property("vpc_id", vpc_id)
            .with_property(
                "ingress",
                PropertyValue::Block(self.ingress_rules.iter().map(SecurityRule::to_block).collect()),
            )
            .with_property(
                "egress",
                PropertyValue::Block(self.egress_rules.iter().map(SecurityRule::to_block).collect()),
            )
    }
}

/// Declare a Synapse workspace firewall rule for an address range.
pub fn synapse_firewall_rule(name: &str, range: &IpRange, workspace: &ResourceId) -> ResourceDecl {
    debug!("Allowing workspace access from {}", range);
    ResourceDecl::new("azurerm_synapse_firewall_rule", name)
        .with_property("name", name)
        .with_property("synapse_workspace_id", workspace.output("id"))
        .with_property("start_ip_address", range.start().to_string())
        .with_property("end_ip_address", range.end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_cidr_denies_ingress() {
        let policy = AccessPolicy::build(None, 5439);
        assert!(policy.denies_all_ingress());
        assert_eq!(policy.egress_rules, vec![SecurityRule::allow_all()]);
    }

    #[test]
    fn test_cidr_yields_single_rule() {
        let cidr: Cidr = "203.0.113.0/24".parse().unwrap();
        let policy = AccessPolicy::build(Some(&cidr), 5439);
        assert_eq!(policy.ingress_rules.len(), 1);
        let rule = &policy.ingress_rules[0];
        assert_eq!(rule.protocol, "tcp");
        assert_eq!((rule.from_port, rule.to_port), (5439, 5439));
        assert_eq!(rule.cidr_blocks, vec!["203.0.113.0/24"]);
    }

    #[test]
    fn test_egress_is_allow_all() {
        let rule = SecurityRule::allow_all();
        assert_eq!(rule.protocol, "-1");
        assert_eq!((rule.from_port, rule.to_port), (0, 0));
        assert_eq!(rule.cidr_blocks, vec!["0.0.0.0/0"]);
    }

    #[test]
    fn test_security_group_declaration() {
        let decl = AccessPolicy::build(None, 5439).security_group("redshift-sg", "Allow Redshift access", "vpc-1");
        assert_eq!(decl.id.to_string(), "aws_security_group.redshift-sg");
        assert_eq!(decl.property("ingress").unwrap().as_blocks().unwrap().len(), 0);
        assert_eq!(decl.property("egress").unwrap().as_blocks().unwrap().len(), 1);
    }

    #[test]
    fn test_firewall_rule() {
        let range = IpRange::new("10.0.0.1".parse().unwrap(), "10.0.0.9".parse().unwrap()).unwrap();
        let workspace = ResourceId::new("azurerm_synapse_workspace", "synapseWorkspace");
        let decl = synapse_firewall_rule("allowSpecificRange", &range, &workspace);
        assert_eq!(decl.property("start_ip_address").unwrap().as_str(), Some("10.0.0.1"));
        assert!(decl.dependencies().contains(&workspace));
    }
}
