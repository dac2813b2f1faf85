//! Hierarchy projection: browse a cyclic graph as a drill-down tree.
//!
//! The source graph may contain cycles and multiple paths between
//! nodes; the projection is a visited-set-guarded spanning forest.
//! First visit wins, so edges outside the spanning tree are dropped
//! from the tree on purpose; this is a modeling decision of the
//! hierarchy view, not data loss (the matrix view shows every edge).

use std::cmp::Reverse;
use std::collections::HashMap;
use std::collections::HashSet;

use crate::model::GraphData;

/// Id of the synthetic root injected when the forest has several trees.
/// Never selectable in the UI.
pub const VIRTUAL_ROOT_ID: &str = "virtual-root";

/// Node type for sessions, the natural hierarchy roots.
const SESSION_TYPE: &str = "Session";

/// How many high-degree nodes to promote to roots when the graph has
/// no session nodes at all.
const FALLBACK_ROOT_COUNT: usize = 5;

/// Depth below which nodes start collapsed in the view.
const AUTO_EXPAND_DEPTH: u32 = 2;

/// A node of the derived tree. Owns its children; the parent relation
/// is positional (walk from the root), never a back-pointer.
#[derive(Clone, Debug, PartialEq)]
pub struct HierarchyNode {
    pub id: String,
    pub name: String,
    pub node_type: String,
    /// Depth from the result root (root = 0).
    pub level: u32,
    /// Undirected degree in the *source graph*, not the tree.
    pub connection_count: usize,
    /// Initial expansion state for the view (level < 2 starts open).
    pub expanded: bool,
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    /// Total nodes in this subtree, including self.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(HierarchyNode::node_count).sum::<usize>()
    }

    /// The synthetic wrapper root is a UI affordance, not a graph node.
    pub fn is_virtual(&self) -> bool {
        self.id == VIRTUAL_ROOT_ID
    }
}

/// Project the graph into a rooted tree. Returns `None` iff the graph
/// has zero nodes.
///
/// Root selection: every `Session` node is a candidate root; if there
/// are none, the five highest-degree nodes stand in (ties broken by
/// original node order, keeping the heuristic stable).
/// Components unreachable from any candidate are swept up afterwards
/// in node order, so the tree always contains every node exactly once.
/// A single tree is returned as-is; a forest is wrapped in a
/// `virtual-root`.
pub fn build_hierarchy(graph: &GraphData) -> Option<HierarchyNode> {
    if graph.nodes.is_empty() {
        return None;
    }

    let adjacency = graph.adjacency();
    let degrees: HashMap<&str, usize> = adjacency
        .iter()
        .map(|(id, neighbors)| (*id, neighbors.len()))
        .collect();

    let mut candidates: Vec<&str> = graph
        .nodes
        .iter()
        .filter(|n| n.node_type == SESSION_TYPE)
        .map(|n| n.id.as_str())
        .collect();
    if candidates.is_empty() {
        let mut by_degree: Vec<(usize, &str)> = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (i, n.id.as_str()))
            .collect();
        by_degree.sort_by_key(|&(i, id)| (Reverse(degrees[id]), i));
        candidates = by_degree
            .into_iter()
            .take(FALLBACK_ROOT_COUNT)
            .map(|(_, id)| id)
            .collect();
    }

    let mut visited: HashSet<&str> = HashSet::with_capacity(graph.nodes.len());
    let mut subtrees: Vec<HierarchyNode> = Vec::new();

    for root in candidates {
        if !visited.contains(root) {
            subtrees.push(build_subtree(root, 0, graph, &adjacency, &degrees, &mut visited));
        }
    }

    // Sweep components the candidates never reached.
    for node in &graph.nodes {
        if !visited.contains(node.id.as_str()) {
            subtrees.push(build_subtree(
                node.id.as_str(),
                0,
                graph,
                &adjacency,
                &degrees,
                &mut visited,
            ));
        }
    }

    if subtrees.len() == 1 {
        return subtrees.pop();
    }

    Some(HierarchyNode {
        id: VIRTUAL_ROOT_ID.to_string(),
        name: "All Sessions".to_string(),
        node_type: "Root".to_string(),
        level: 0,
        connection_count: subtrees.len(),
        expanded: true,
        children: subtrees,
    })
}

/// Depth-first spanning-tree construction. Marks `id` visited on
/// entry, so a node reachable by several paths attaches only where it
/// was first seen (cycle safety).
fn build_subtree<'a>(
    id: &'a str,
    level: u32,
    graph: &GraphData,
    adjacency: &indexmap::IndexMap<&'a str, Vec<&'a str>>,
    degrees: &HashMap<&'a str, usize>,
    visited: &mut HashSet<&'a str>,
) -> HierarchyNode {
    visited.insert(id);

    let mut children = Vec::new();
    if let Some(neighbors) = adjacency.get(id) {
        for &neighbor in neighbors {
            // Re-check per neighbor: an earlier sibling's subtree may
            // have consumed this one through a cycle.
            if !visited.contains(neighbor) && adjacency.contains_key(neighbor) {
                children.push(build_subtree(neighbor, level + 1, graph, adjacency, degrees, visited));
            }
        }
    }
    children.sort_by(|a, b| {
        a.node_type
            .cmp(&b.node_type)
            .then(b.connection_count.cmp(&a.connection_count))
    });

    // The node is guaranteed present: adjacency is keyed on graph.nodes.
    let (name, node_type) = graph
        .node_by_id(id)
        .map(|n| (n.name.clone(), n.node_type.clone()))
        .unwrap_or_else(|| (id.to_string(), crate::model::UNKNOWN_LABEL.to_string()));

    HierarchyNode {
        id: id.to_string(),
        name,
        node_type,
        level,
        connection_count: degrees.get(id).copied().unwrap_or(0),
        expanded: level < AUTO_EXPAND_DEPTH,
        children,
    }
}

/// Prune the tree to nodes matching `query` (case-insensitive name/id
/// substring) and `type_filter`, keeping any node with a matching
/// descendant. Returns `None` when nothing under `root` matches.
pub fn filter_hierarchy(
    root: &HierarchyNode,
    query: &str,
    type_filter: Option<&str>,
) -> Option<HierarchyNode> {
    let query_lower = query.to_lowercase();

    let name_matches = query.is_empty()
        || root.name.to_lowercase().contains(&query_lower)
        || root.id.to_lowercase().contains(&query_lower);
    let type_matches = type_filter.is_none_or(|t| root.node_type == t);
    let self_matches = name_matches && type_matches;

    let children: Vec<HierarchyNode> = root
        .children
        .iter()
        .filter_map(|c| filter_hierarchy(c, query, type_filter))
        .collect();

    if self_matches || !children.is_empty() {
        Some(HierarchyNode {
            children,
            ..root.clone()
        })
    } else {
        None
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GraphLink, GraphNode};

    fn session_with_thoughts() -> GraphData {
        GraphData {
            nodes: vec![
                GraphNode::new("s", "Session 1", "Session"),
                GraphNode::new("t1", "First thought", "Thought"),
                GraphNode::new("t2", "Second thought", "Thought"),
            ],
            links: vec![
                GraphLink::new("s", "t1", "CONTAINS"),
                GraphLink::new("s", "t2", "CONTAINS"),
            ],
        }
    }

    fn collect_ids(node: &HierarchyNode, out: &mut Vec<String>) {
        out.push(node.id.clone());
        for child in &node.children {
            collect_ids(child, out);
        }
    }

    #[test]
    fn test_empty_graph_is_none() {
        assert!(build_hierarchy(&GraphData::default()).is_none());
    }

    #[test]
    fn test_session_root_with_two_thoughts() {
        let root = build_hierarchy(&session_with_thoughts()).unwrap();

        assert_eq!(root.id, "s");
        assert_eq!(root.level, 0);
        assert_eq!(root.connection_count, 2);
        let child_ids: Vec<&str> = root.children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(child_ids.len(), 2);
        assert!(child_ids.contains(&"t1") && child_ids.contains(&"t2"));
        assert!(root.children.iter().all(|c| c.level == 1));
    }

    #[test]
    fn test_disconnected_sessions_get_virtual_root() {
        let graph = GraphData {
            nodes: vec![
                GraphNode::new("s1", "Session 1", "Session"),
                GraphNode::new("s2", "Session 2", "Session"),
            ],
            links: vec![],
        };
        let root = build_hierarchy(&graph).unwrap();

        assert!(root.is_virtual());
        assert_eq!(root.id, VIRTUAL_ROOT_ID);
        let child_ids: Vec<&str> = root.children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(child_ids, vec!["s1", "s2"]);
    }

    #[test]
    fn test_totality_and_acyclicity_on_cyclic_graph() {
        // Triangle plus a pendant, all reachable from one session.
        let graph = GraphData {
            nodes: vec![
                GraphNode::new("s", "S", "Session"),
                GraphNode::new("a", "A", "Thought"),
                GraphNode::new("b", "B", "Thought"),
                GraphNode::new("e", "E", "Entity"),
            ],
            links: vec![
                GraphLink::new("s", "a", "CONTAINS"),
                GraphLink::new("a", "b", "REASONING_FLOW"),
                GraphLink::new("b", "s", "CONTAINS"),
                GraphLink::new("b", "e", "MENTIONS"),
            ],
        };
        let root = build_hierarchy(&graph).unwrap();

        let mut ids = Vec::new();
        collect_ids(&root, &mut ids);
        ids.sort();
        // Every node exactly once despite the s-a-b cycle.
        assert_eq!(ids, vec!["a", "b", "e", "s"]);
        assert_eq!(root.node_count(), 4);
    }

    #[test]
    fn test_sessionless_graph_falls_back_to_degree_roots() {
        let graph = GraphData {
            nodes: vec![
                GraphNode::new("hub", "Hub", "Entity"),
                GraphNode::new("a", "A", "Entity"),
                GraphNode::new("b", "B", "Entity"),
            ],
            links: vec![
                GraphLink::new("hub", "a", "MENTIONS"),
                GraphLink::new("hub", "b", "MENTIONS"),
            ],
        };
        let root = build_hierarchy(&graph).unwrap();

        // The hub has the highest degree, so its tree consumes the
        // rest and no virtual root is needed.
        assert_eq!(root.id, "hub");
        assert_eq!(root.node_count(), 3);
    }

    #[test]
    fn test_degree_ties_break_by_node_order() {
        let graph = GraphData {
            nodes: vec![
                GraphNode::new("x", "X", "Entity"),
                GraphNode::new("y", "Y", "Entity"),
            ],
            links: vec![],
        };
        let root = build_hierarchy(&graph).unwrap();

        let child_ids: Vec<&str> = root.children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(child_ids, vec!["x", "y"]);
    }

    #[test]
    fn test_unreached_component_is_swept_in() {
        // One session, plus an island of entities with no path to it.
        let graph = GraphData {
            nodes: vec![
                GraphNode::new("s", "S", "Session"),
                GraphNode::new("i1", "Island 1", "Entity"),
                GraphNode::new("i2", "Island 2", "Entity"),
            ],
            links: vec![GraphLink::new("i1", "i2", "MENTIONS")],
        };
        let root = build_hierarchy(&graph).unwrap();

        assert!(root.is_virtual());
        let mut ids = Vec::new();
        collect_ids(&root, &mut ids);
        assert_eq!(ids.len(), 4); // virtual root + 3 graph nodes
    }

    #[test]
    fn test_children_sorted_by_type_then_degree() {
        let graph = GraphData {
            nodes: vec![
                GraphNode::new("s", "S", "Session"),
                GraphNode::new("t", "T", "Thought"),
                GraphNode::new("e_busy", "Busy", "Entity"),
                GraphNode::new("e_quiet", "Quiet", "Entity"),
                GraphNode::new("x", "X", "Thought"),
            ],
            links: vec![
                GraphLink::new("s", "t", "CONTAINS"),
                GraphLink::new("s", "e_busy", "MENTIONS"),
                GraphLink::new("s", "e_quiet", "MENTIONS"),
                GraphLink::new("e_busy", "x", "MENTIONS"),
            ],
        };
        let root = build_hierarchy(&graph).unwrap();

        let order: Vec<&str> = root.children.iter().map(|c| c.id.as_str()).collect();
        // Entity < Thought alphabetically; within Entity, higher degree first.
        assert_eq!(order, vec!["e_busy", "e_quiet", "t"]);
    }

    #[test]
    fn test_auto_expand_below_level_two() {
        let graph = GraphData {
            nodes: vec![
                GraphNode::new("s", "S", "Session"),
                GraphNode::new("t", "T", "Thought"),
                GraphNode::new("e", "E", "Entity"),
                GraphNode::new("deep", "D", "Entity"),
            ],
            links: vec![
                GraphLink::new("s", "t", "CONTAINS"),
                GraphLink::new("t", "e", "MENTIONS"),
                GraphLink::new("e", "deep", "MENTIONS"),
            ],
        };
        let root = build_hierarchy(&graph).unwrap();

        assert!(root.expanded); // level 0
        let t = &root.children[0];
        assert!(t.expanded); // level 1
        let e = &t.children[0];
        assert!(!e.expanded); // level 2
    }

    #[test]
    fn test_filter_keeps_ancestors_of_matches() {
        let root = build_hierarchy(&session_with_thoughts()).unwrap();

        let filtered = filter_hierarchy(&root, "second", None).unwrap();
        // Root kept because a descendant matches; only that branch survives.
        assert_eq!(filtered.id, "s");
        assert_eq!(filtered.children.len(), 1);
        assert_eq!(filtered.children[0].id, "t2");
    }

    #[test]
    fn test_filter_by_type() {
        let root = build_hierarchy(&session_with_thoughts()).unwrap();

        let filtered = filter_hierarchy(&root, "", Some("Thought")).unwrap();
        assert_eq!(filtered.children.len(), 2);

        assert!(filter_hierarchy(&root, "", Some("Tool")).is_none());
    }

    #[test]
    fn test_filter_no_match_is_none() {
        let root = build_hierarchy(&session_with_thoughts()).unwrap();
        assert!(filter_hierarchy(&root, "zzz-no-such-node", None).is_none());
    }
}
