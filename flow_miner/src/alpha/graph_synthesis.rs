use std::collections::BTreeSet;

use itertools::Itertools;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    boundary::BoundarySets,
    relations::{AlphaRelations, CausalitySet, ParallelPairs},
};
use crate::{
    event_log::ActivityLabel,
    graph::graph_model::{
        activity_id, GatewayType, GraphModel, Node, PseudoEvent, END_EVENT_ID, START_EVENT_ID,
    },
};

/// Name of graphs synthesized from alpha relations
pub const ALPHA_GRAPH_NAME: &str = "Alpha Miner BPMN";

/// Default line weight of synthesized edges
pub const ALPHA_EDGE_PEN_WIDTH: f64 = 1.5;

/// Separation between nodes of the same rank (in inches)
pub const ALPHA_NODE_SEPARATION: f64 = 0.6;

///
/// How the type of inserted split/merge gateways is chosen
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum GatewayPolicy {
    /// AND if any pair of the gateway's neighbors is parallel, XOR otherwise
    #[default]
    Auto,
    /// Always AND
    And,
    /// Always XOR
    Xor,
}

impl GatewayPolicy {
    /// Prefix of gateway identifiers created under this policy
    pub fn prefix(&self) -> &'static str {
        match self {
            GatewayPolicy::Auto => "AUTO",
            GatewayPolicy::And => "AND",
            GatewayPolicy::Xor => "XOR",
        }
    }
}

///
/// Synthesizes a gateway-annotated [`GraphModel`] from causality, parallelism and boundary sets
///
/// Gateway identifiers are `{policy}{s|m}_{counter}_{hint}` (`s` for split, `m` for merge), where
/// the counter is increasing over the whole graph, so identifiers never collide.
///
#[derive(Debug)]
pub struct GraphSynthesizer<'a> {
    activities: &'a BTreeSet<ActivityLabel>,
    causality: &'a CausalitySet,
    inverse_causality: &'a CausalitySet,
    parallel: &'a ParallelPairs,
    policy: GatewayPolicy,
    gateway_count: usize,
    graph: GraphModel,
}

impl<'a> GraphSynthesizer<'a> {
    /// Create new [`GraphSynthesizer`] (using [`GatewayPolicy::Auto`])
    pub fn new(
        activities: &'a BTreeSet<ActivityLabel>,
        causality: &'a CausalitySet,
        inverse_causality: &'a CausalitySet,
        parallel: &'a ParallelPairs,
    ) -> Self {
        let mut graph = GraphModel::new(ALPHA_GRAPH_NAME);
        graph.default_pen_width = Some(ALPHA_EDGE_PEN_WIDTH);
        graph.node_separation = Some(ALPHA_NODE_SEPARATION);
        Self {
            activities,
            causality,
            inverse_causality,
            parallel,
            policy: GatewayPolicy::default(),
            gateway_count: 0,
            graph,
        }
    }

    /// Create new [`GraphSynthesizer`] for the given [`AlphaRelations`]
    pub fn from_relations(relations: &'a AlphaRelations) -> Self {
        Self::new(
            &relations.activities,
            &relations.causality,
            &relations.inverse_causality,
            &relations.parallel,
        )
    }

    /// Use a different [`GatewayPolicy`]
    pub fn with_gateway_policy(mut self, policy: GatewayPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the graph, connecting the start/end pseudo-events to the given boundary sets
    pub fn synthesize(mut self, boundary: &BoundarySets) -> GraphModel {
        for act in self.activities {
            self.graph.add_node(Node::activity(act.as_str()));
        }

        let mut direct_edges: BTreeSet<(&ActivityLabel, &ActivityLabel)> = BTreeSet::new();
        for (source, targets) in self.causality {
            if targets.len() > 1 {
                self.add_split_gateway(&activity_id(source), source, targets);
            } else if let Some(target) = targets.first() {
                direct_edges.insert((source, target));
            }
        }

        for (target, sources) in self.inverse_causality {
            if sources.len() > 1 {
                self.add_merge_gateway(sources, &activity_id(target), target);
                for source in sources {
                    direct_edges.remove(&(source, target));
                }
            }
        }

        for (source, target) in direct_edges {
            self.graph.add_edge(activity_id(source), activity_id(target));
        }

        self.graph.add_node(Node::pseudo_event(PseudoEvent::Start));
        if boundary.formal_start.len() > 1 {
            self.add_split_gateway(START_EVENT_ID, START_EVENT_ID, &boundary.formal_start);
        } else if let Some(start) = boundary.formal_start.first() {
            self.graph.add_edge(START_EVENT_ID, activity_id(start));
        }

        self.graph.add_node(Node::pseudo_event(PseudoEvent::End));
        if boundary.formal_end.len() > 1 {
            self.add_merge_gateway(&boundary.formal_end, END_EVENT_ID, END_EVENT_ID);
        } else if let Some(end) = boundary.formal_end.first() {
            self.graph.add_edge(activity_id(end), END_EVENT_ID);
        }

        debug!(
            nodes = self.graph.nodes.len(),
            edges = self.graph.edges.len(),
            gateways = self.gateway_count,
            "Synthesized alpha graph"
        );
        self.graph
    }

    fn unique_gateway_name(&mut self, kind: char, hint: &str) -> String {
        self.gateway_count += 1;
        format!(
            "{}{}_{}_{}",
            self.policy.prefix(),
            kind,
            self.gateway_count,
            hint
        )
    }

    fn gateway_type(&self, neighbors: &BTreeSet<ActivityLabel>) -> GatewayType {
        match self.policy {
            GatewayPolicy::Auto => {
                GatewayType::from_parallelism(self.parallel.any_pair_parallel(neighbors))
            }
            GatewayPolicy::And => GatewayType::And,
            GatewayPolicy::Xor => GatewayType::Xor,
        }
    }

    /// Split gateway from the node `source_id` (named `source_label` in the hint) to activities
    fn add_split_gateway(
        &mut self,
        source_id: &str,
        source_label: &str,
        targets: &BTreeSet<ActivityLabel>,
    ) {
        let hint = format!("{}->{}", source_label, targets.iter().join("_"));
        let id = self.unique_gateway_name('s', &hint);
        let gateway_type = self.gateway_type(targets);
        self.graph.add_node(Node::gateway(id.as_str(), gateway_type));
        self.graph.add_edge(source_id, id.as_str());
        for target in targets {
            self.graph.add_edge(id.as_str(), activity_id(target));
        }
    }

    /// Merge gateway from activities to the node `target_id` (named `target_label` in the hint)
    fn add_merge_gateway(
        &mut self,
        sources: &BTreeSet<ActivityLabel>,
        target_id: &str,
        target_label: &str,
    ) {
        let hint = format!("{}->{}", sources.iter().join("_"), target_label);
        let id = self.unique_gateway_name('m', &hint);
        let gateway_type = self.gateway_type(sources);
        self.graph.add_node(Node::gateway(id.as_str(), gateway_type));
        self.graph.add_edge(id.as_str(), target_id);
        for source in sources {
            self.graph.add_edge(activity_id(source), id.as_str());
        }
    }
}

///
/// Synthesize the gateway-annotated [`GraphModel`] of [`AlphaRelations`] and their [`BoundarySets`]
///
/// Uses [`GatewayPolicy::Auto`]. An empty activity set yields a graph with only the
/// start and end pseudo-events.
///
pub fn synthesize_alpha_graph(relations: &AlphaRelations, boundary: &BoundarySets) -> GraphModel {
    GraphSynthesizer::from_relations(relations).synthesize(boundary)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use petgraph::algo::is_isomorphic_matching;

    use super::*;
    use crate::{event_log::WorkflowLog, graph::graph_model::ACTIVITY_ID_PREFIX};

    fn mine(traces: Vec<Vec<&str>>) -> GraphModel {
        let rel = AlphaRelations::from_log(&WorkflowLog::new(traces));
        let boundary = BoundarySets::from_footprint(&rel.footprint);
        synthesize_alpha_graph(&rel, &boundary)
    }

    fn act(label: &str) -> String {
        activity_id(label)
    }

    fn gateway_between<'a>(g: &'a GraphModel, from: &str, to: &str) -> Option<&'a Node> {
        g.gateways()
            .find(|gw| g.contains_edge(from, &gw.id) && g.contains_edge(&gw.id, to))
    }

    #[test]
    fn concurrent_branches_get_and_split() {
        let g = mine(vec![vec!["A", "B", "C"], vec!["A", "C", "B"]]);
        let split = gateway_between(&g, &act("A"), &act("B")).unwrap();
        assert_eq!(split.gateway_type(), Some(GatewayType::And));
        assert_eq!(split.id, "AUTOs_1_A->B_C");
        assert!(g.contains_edge(&split.id, &act("C")));
        assert!(g.contains_edge(START_EVENT_ID, &act("A")));
        // B || C: neither is a formal end activity, so `end` stays unconnected
        assert_eq!(g.predecessors(END_EVENT_ID).count(), 0);
        assert_eq!(g.gateways().count(), 1);
    }

    #[test]
    fn exclusive_branches_get_xor_split_and_merge() {
        let g = mine(vec![vec!["A", "B", "D"], vec!["A", "C", "D"]]);
        let split = gateway_between(&g, &act("A"), &act("B")).unwrap();
        assert_eq!(split.gateway_type(), Some(GatewayType::Xor));
        assert!(g.contains_edge(&split.id, &act("C")));
        let merge = gateway_between(&g, &act("B"), &act("D")).unwrap();
        assert_eq!(merge.gateway_type(), Some(GatewayType::Xor));
        assert_eq!(merge.id, "AUTOm_2_B_C->D");
        assert!(g.contains_edge(&act("C"), &merge.id));
        // Subsumed by the merge gateway
        assert!(!g.contains_edge(&act("B"), &act("D")));
        assert!(!g.contains_edge(&act("C"), &act("D")));
        assert!(g.contains_edge(START_EVENT_ID, &act("A")));
        assert!(g.contains_edge(&act("D"), END_EVENT_ID));
    }

    #[test]
    fn sequence_uses_direct_edges() {
        let g = mine(vec![vec!["a", "b", "c"]]);
        assert_eq!(g.gateways().count(), 0);
        let edges: Vec<(&str, &str)> = g
            .edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect();
        assert_eq!(
            edges,
            vec![
                ("act:a", "act:b"),
                ("act:b", "act:c"),
                ("start", "act:a"),
                ("act:c", "end")
            ]
        );
    }

    #[test]
    fn multiple_boundary_activities_get_gateways() {
        let g = mine(vec![vec!["x"], vec!["y"]]);
        let start_gw = gateway_between(&g, START_EVENT_ID, &act("x")).unwrap();
        assert_eq!(start_gw.id, "AUTOs_1_start->x_y");
        assert_eq!(start_gw.gateway_type(), Some(GatewayType::Xor));
        let end_gw = gateway_between(&g, &act("y"), END_EVENT_ID).unwrap();
        assert_eq!(end_gw.id, "AUTOm_2_x_y->end");
        assert!(g.contains_edge(&act("x"), &end_gw.id));
    }

    #[test]
    fn mixed_branch_relations_yield_and() {
        // b || c, but d is exclusive to both: any parallel pair makes it an AND split
        let g = mine(vec![
            vec!["a", "b", "c", "e"],
            vec!["a", "c", "b", "e"],
            vec!["a", "d", "e"],
        ]);
        let split = gateway_between(&g, &act("a"), &act("d")).unwrap();
        assert_eq!(split.gateway_type(), Some(GatewayType::And));
    }

    #[test]
    fn empty_activity_set_only_has_pseudo_events() {
        let rel = AlphaRelations::default();
        let g = synthesize_alpha_graph(&rel, &BoundarySets::default());
        assert_eq!(g.nodes.len(), 2);
        assert!(g.contains_node(START_EVENT_ID));
        assert!(g.contains_node(END_EVENT_ID));
        assert!(g.edges.is_empty());
    }

    #[test]
    fn gateway_identifiers_are_unique_and_deterministic() {
        let traces = vec![
            vec!["a", "b", "d", "f"],
            vec!["a", "c", "d", "g"],
            vec!["a", "b", "e", "f"],
            vec!["h", "c", "e", "g"],
        ];
        let g1 = mine(traces.clone());
        let g2 = mine(traces.into_iter().rev().collect());
        let ids: Vec<&str> = g1.gateways().map(|n| n.id.as_str()).collect();
        assert!(ids.len() > 2);
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());
        assert_eq!(g1, g2);
        assert_eq!(g1.to_json().unwrap(), g2.to_json().unwrap());
        assert!(is_isomorphic_matching(
            &g1.to_petgraph(),
            &g2.to_petgraph(),
            |a, b| a == b,
            |a, b| a == b
        ));
    }

    #[test]
    fn forced_gateway_policy() {
        let rel = AlphaRelations::from_log(&WorkflowLog::new(vec![
            vec!["A", "B", "C"],
            vec!["A", "C", "B"],
        ]));
        let boundary = BoundarySets::from_footprint(&rel.footprint);
        let g = GraphSynthesizer::from_relations(&rel)
            .with_gateway_policy(GatewayPolicy::Xor)
            .synthesize(&boundary);
        let split = g.gateways().next().unwrap();
        assert_eq!(split.gateway_type(), Some(GatewayType::Xor));
        assert!(split.id.starts_with("XORs_1_"));
    }

    #[test]
    fn gateway_type_iff_parallel_pair_among_neighbors() {
        let rel = AlphaRelations::from_log(&WorkflowLog::new(vec![
            vec!["s", "p", "q", "t"],
            vec!["s", "q", "p", "t"],
            vec!["s", "r", "t"],
            vec!["u", "r"],
        ]));
        let g = synthesize_alpha_graph(&rel, &BoundarySets::from_footprint(&rel.footprint));
        assert_eq!(g.gateways().count(), 4);
        for gw in g.gateways() {
            // Activities on the branching side of the gateway
            let neighbors: Vec<&str> = if gw.id.starts_with("AUTOs_") {
                g.successors(&gw.id).collect()
            } else {
                g.predecessors(&gw.id).collect()
            };
            let branches: BTreeSet<ActivityLabel> = neighbors
                .iter()
                .filter_map(|id| id.strip_prefix(ACTIVITY_ID_PREFIX))
                .map(String::from)
                .collect();
            assert!(branches.len() > 1);
            assert_eq!(
                gw.gateway_type() == Some(GatewayType::And),
                rel.parallel.any_pair_parallel(&branches)
            );
        }
    }

    #[test]
    fn activities_named_like_pseudo_events_stay_distinct() {
        let g = mine(vec![vec!["start", "work", "end"]]);
        let ids: Vec<&str> = g.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids.len(), 5);
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());
        assert!(g.edges.iter().all(|e| e.source != e.target));
        assert!(g.contains_edge(START_EVENT_ID, &act("start")));
        assert!(g.contains_edge(&act("start"), &act("work")));
        assert!(g.contains_edge(&act("work"), &act("end")));
        assert!(g.contains_edge(&act("end"), END_EVENT_ID));
        assert_eq!(g.node(&act("end")).unwrap().label, "end");
    }

    #[test]
    fn activities_named_like_gateways_stay_distinct() {
        let g = mine(vec![vec!["x", "y"], vec!["x", "z"], vec!["AUTOs_1_x->y_z"]]);
        let split = gateway_between(&g, &act("x"), &act("y")).unwrap();
        assert_eq!(split.id, "AUTOs_1_x->y_z");
        let activity = g.node(&act("AUTOs_1_x->y_z")).unwrap();
        assert_eq!(activity.gateway_type(), None);
        let ids: Vec<&str> = g.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());
    }
}
