//! The declared resource graph.
//!
//! Resources are kept in a `BTreeMap` keyed by [`ResourceId`], so two graphs
//! built from the same input compare equal and iterate in the same order.
//! Ordering queries build a `petgraph` view with an edge from each
//! dependency to its dependent.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::resource::{ResourceDecl, ResourceId};

/// A set of resource declarations and the edges between them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceGraph {
    resources: BTreeMap<ResourceId, ResourceDecl>,
}

struct Indexed {
    graph: DiGraph<ResourceId, ()>,
    indices: HashMap<ResourceId, NodeIndex>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a resource. Each id may be declared once.
    pub fn add(&mut self, decl: ResourceDecl) -> GraphResult<ResourceId> {
        let id = decl.id.clone();
        if self.resources.contains_key(&id) {
            return Err(GraphError::DuplicateResource(id.to_string()));
        }
        debug!("Declared resource {}", id);
        self.resources.insert(id.clone(), decl);
        Ok(id)
    }

    pub fn get(&self, id: &ResourceId) -> Option<&ResourceDecl> {
        self.resources.get(id)
    }

    pub fn require(&self, id: &ResourceId) -> GraphResult<&ResourceDecl> {
        self.get(id)
            .ok_or_else(|| GraphError::ResourceNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.resources.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// All declarations in id order.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceDecl> {
        self.resources.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ResourceId> {
        self.resources.keys()
    }

    /// Declarations of one kind, e.g. `aws_security_group`.
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a ResourceDecl> + 'a {
        self.resources.values().filter(move |r| r.id.kind() == kind)
    }

    pub fn edge_count(&self) -> usize {
        self.resources.values().map(|r| r.dependencies().len()).sum()
    }

    /// Check that every dependency is declared and that there are no cycles.
    pub fn validate(&self) -> GraphResult<()> {
        for decl in self.resources.values() {
            for dep in decl.dependencies() {
                if dep == decl.id {
                    return Err(GraphError::Cycle(vec![decl.id.to_string()]));
                }
                if !self.resources.contains_key(&dep) {
                    return Err(GraphError::UnknownDependency {
                        resource: decl.id.to_string(),
                        dependency: dep.to_string(),
                    });
                }
            }
        }

        if let Some(cycle) = self.cycles().into_iter().next() {
            return Err(GraphError::Cycle(cycle));
        }
        Ok(())
    }

    /// Every dependency cycle, as lists of resource ids.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let indexed = self.index();
        tarjan_scc(&indexed.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                let mut ids: Vec<String> = scc
                    .into_iter()
                    .filter_map(|idx| indexed.graph.node_weight(idx).map(|id| id.to_string()))
                    .collect();
                ids.sort();
                ids
            })
            .collect()
    }

    /// Order in which resources can be created, dependencies first.
    pub fn execution_order(&self) -> GraphResult<Vec<ResourceId>> {
        self.validate()?;
        let indexed = self.index();
        let order = toposort(&indexed.graph, None).map_err(|cycle| {
            let id = indexed
                .graph
                .node_weight(cycle.node_id())
                .map(|id| id.to_string())
                .unwrap_or_default();
            GraphError::Cycle(vec![id])
        })?;
        Ok(order
            .into_iter()
            .filter_map(|idx| indexed.graph.node_weight(idx).cloned())
            .collect())
    }

    /// Direct dependencies of a resource.
    pub fn direct_dependencies(&self, id: &ResourceId) -> GraphResult<BTreeSet<ResourceId>> {
        Ok(self.require(id)?.dependencies())
    }

    /// All resources `id` depends on, directly or transitively.
    pub fn dependencies_of(&self, id: &ResourceId) -> BTreeSet<ResourceId> {
        self.walk(id, Direction::Incoming)
    }

    /// All resources that depend on `id`, directly or transitively.
    pub fn dependents_of(&self, id: &ResourceId) -> BTreeSet<ResourceId> {
        self.walk(id, Direction::Outgoing)
    }

    /// Whether `before` must be created before `after`.
    pub fn is_ordered_before(&self, before: &ResourceId, after: &ResourceId) -> bool {
        self.dependencies_of(after).contains(before)
    }

    fn walk(&self, start: &ResourceId, direction: Direction) -> BTreeSet<ResourceId> {
        let indexed = self.index();
        let mut found = BTreeSet::new();
        let mut queue = VecDeque::new();

        if let Some(&start_idx) = indexed.indices.get(start) {
            queue.push_back(start_idx);

            while let Some(current) = queue.pop_front() {
                for neighbor in indexed.graph.neighbors_directed(current, direction) {
                    if let Some(id) = indexed.graph.node_weight(neighbor) {
                        if found.insert(id.clone()) {
                            queue.push_back(neighbor);
                        }
                    }
                }
            }
        }

        found
    }

    fn index(&self) -> Indexed {
        let mut graph = DiGraph::new();
        let mut indices = HashMap::new();

        for id in self.resources.keys() {
            let idx = graph.add_node(id.clone());
            indices.insert(id.clone(), idx);
        }

        for decl in self.resources.values() {
            let Some(&to) = indices.get(&decl.id) else {
                continue;
            };
            for dep in decl.dependencies() {
                if let Some(&from) = indices.get(&dep) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        Indexed { graph, indices }
    }

    /// Generate a DOT format representation for visualization.
    pub fn to_dot(&self) -> String {
        let indexed = self.index();
        let mut output = String::new();
        output.push_str("digraph resources {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [shape=box];\n\n");

        for idx in indexed.graph.node_indices() {
            if let Some(id) = indexed.graph.node_weight(idx) {
                output.push_str(&format!(
                    "  \"{}\" [label=\"{}\\n{}\"];\n",
                    id,
                    id.kind(),
                    id.name()
                ));
            }
        }

        output.push('\n');

        for edge in indexed.graph.edge_references() {
            let source = indexed.graph.node_weight(edge.source());
            let target = indexed.graph.node_weight(edge.target());
            if let (Some(source), Some(target)) = (source, target) {
                let explicit = self
                    .get(target)
                    .is_some_and(|decl| decl.depends_on.contains(source));
                let style = if explicit { "dashed" } else { "solid" };
                output.push_str(&format!(
                    "  \"{}\" -> \"{}\" [style={}];\n",
                    source, target, style
                ));
            }
        }

        output.push_str("}\n");
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::PropertyValue;

    fn chain() -> ResourceGraph {
        let mut graph = ResourceGraph::new();
        let sg = graph.add(ResourceDecl::new("aws_security_group", "sg")).unwrap();
        let role = graph.add(ResourceDecl::new("aws_iam_role", "role")).unwrap();
        let attach = graph
            .add(
                ResourceDecl::new("aws_iam_role_policy_attachment", "s3")
                    .with_property("role", role.output("name")),
            )
            .unwrap();
        graph
            .add(
                ResourceDecl::new("aws_redshift_cluster", "main")
                    .with_property(
                        "vpc_security_group_ids",
                        PropertyValue::List(vec![sg.output("id").into()]),
                    )
                    .with_property("iam_roles", PropertyValue::List(vec![role.output("arn").into()]))
                    .with_depends_on(attach),
            )
            .unwrap();
        graph
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let mut graph = ResourceGraph::new();
        graph.add(ResourceDecl::new("a", "x")).unwrap();
        let err = graph.add(ResourceDecl::new("a", "x")).unwrap_err();
        assert_eq!(err, GraphError::DuplicateResource("a.x".into()));
    }

    #[test]
    fn test_unknown_dependency() {
        let mut graph = ResourceGraph::new();
        graph
            .add(ResourceDecl::new("a", "x").with_depends_on(ResourceId::new("b", "missing")))
            .unwrap();
        assert!(matches!(
            graph.validate(),
            Err(GraphError::UnknownDependency { .. })
        ));
    }

    #[test]
    fn test_cycle_detection() {
        let mut graph = ResourceGraph::new();
        graph
            .add(ResourceDecl::new("a", "x").with_depends_on(ResourceId::new("a", "y")))
            .unwrap();
        graph
            .add(ResourceDecl::new("a", "y").with_depends_on(ResourceId::new("a", "x")))
            .unwrap();
        assert_eq!(graph.cycles(), vec![vec!["a.x".to_string(), "a.y".to_string()]]);
        assert!(matches!(graph.execution_order(), Err(GraphError::Cycle(_))));
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let mut graph = ResourceGraph::new();
        let id = ResourceId::new("a", "x");
        graph
            .add(ResourceDecl::new("a", "x").with_property("me", id.output("id")))
            .unwrap();
        assert_eq!(graph.validate(), Err(GraphError::Cycle(vec!["a.x".into()])));
    }

    #[test]
    fn test_execution_order_respects_edges() {
        let graph = chain();
        let order = graph.execution_order().unwrap();
        let pos = |kind: &str| order.iter().position(|id| id.kind() == kind).unwrap();

        assert!(pos("aws_iam_role") < pos("aws_iam_role_policy_attachment"));
        assert!(pos("aws_iam_role_policy_attachment") < pos("aws_redshift_cluster"));
        assert!(pos("aws_security_group") < pos("aws_redshift_cluster"));
    }

    #[test]
    fn test_transitive_queries() {
        let graph = chain();
        let role = ResourceId::new("aws_iam_role", "role");
        let cluster = ResourceId::new("aws_redshift_cluster", "main");
        let sg = ResourceId::new("aws_security_group", "sg");

        assert!(graph.is_ordered_before(&role, &cluster));
        assert!(!graph.is_ordered_before(&cluster, &role));
        assert_eq!(graph.dependents_of(&role).len(), 2);
        assert!(graph.dependencies_of(&sg).is_empty());
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn test_to_dot() {
        let dot = chain().to_dot();
        assert!(dot.starts_with("digraph resources {"));
        assert!(dot.contains("\"aws_iam_role.role\" -> \"aws_iam_role_policy_attachment.s3\" [style=solid]"));
        assert!(dot.contains(
            "\"aws_iam_role_policy_attachment.s3\" -> \"aws_redshift_cluster.main\" [style=dashed]"
        ));
    }

    #[test]
    fn test_graphs_compare_equal_regardless_of_insertion_order() {
        let mut a = ResourceGraph::new();
        a.add(ResourceDecl::new("k", "one")).unwrap();
        a.add(ResourceDecl::new("k", "two")).unwrap();
        let mut b = ResourceGraph::new();
        b.add(ResourceDecl::new("k", "two")).unwrap();
        b.add(ResourceDecl::new("k", "one")).unwrap();
        assert_eq!(a, b);
    }
}
