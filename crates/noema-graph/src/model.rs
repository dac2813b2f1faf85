//! Canonical graph model: the snapshot every projection reads from.
//!
//! Mirrors the graph-data endpoint's wire format: `{ nodes, links }`
//! with `type` tags on both. Nodes carry an opaque `properties` bag
//! which may include a timestamp in any of several shapes; the
//! projectors never reject a node over a missing or garbled field;
//! everything defaults in place.

use chrono::DateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Label substituted for a missing `name` or `type`.
pub const UNKNOWN_LABEL: &str = "Unknown";

fn default_unknown() -> String {
    UNKNOWN_LABEL.to_string()
}

fn default_link_value() -> f32 {
    1.0
}

/// A typed node. Identity is `id`; everything else is display data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(default = "default_unknown")]
    pub name: String,
    #[serde(rename = "type", default = "default_unknown")]
    pub node_type: String,
    /// Opaque property bag from the store. May carry `timestamp`.
    #[serde(default)]
    pub properties: serde_json::Map<String, Value>,
}

impl GraphNode {
    /// Construct a node with no properties (test and tooling helper).
    pub fn new(id: impl Into<String>, name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type: node_type.into(),
            properties: serde_json::Map::new(),
        }
    }

    /// Parse `properties.timestamp` into a tagged result.
    ///
    /// Accepts RFC 3339 strings and numeric epochs. Absent and
    /// unparsable collapse to [`Timestamp::Unknown`]; callers
    /// substitute "now" so a bad timestamp can never crash a
    /// projection.
    pub fn timestamp(&self) -> Timestamp {
        match self.properties.get("timestamp") {
            Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
                .map(|dt| Timestamp::Known(dt.timestamp_millis()))
                .unwrap_or(Timestamp::Unknown),
            Some(Value::Number(n)) => match n.as_i64() {
                // Heuristic: epochs below ~2001-09 in millis terms are
                // taken as seconds.
                Some(v) if v >= 1_000_000_000_000 => Timestamp::Known(v),
                Some(v) if v > 0 => Timestamp::Known(v * 1000),
                _ => Timestamp::Unknown,
            },
            _ => Timestamp::Unknown,
        }
    }
}

/// Result of coercing a timestamp out of the properties bag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timestamp {
    /// Unix milliseconds.
    Known(i64),
    /// Absent or unparsable.
    Unknown,
}

impl Timestamp {
    /// Collapse to a concrete instant, substituting `now` when unknown.
    pub fn or_now(self, now: i64) -> i64 {
        match self {
            Timestamp::Known(ms) => ms,
            Timestamp::Unknown => now,
        }
    }
}

/// A typed, weighted link. Undirected unless a projector says otherwise.
///
/// Multiple links between the same pair are permitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    #[serde(rename = "type", default = "default_unknown")]
    pub link_type: String,
    /// Strength/weight, ≥ 0. The wire format omits it for weight 1.
    #[serde(default = "default_link_value")]
    pub value: f32,
}

impl GraphLink {
    pub fn new(source: impl Into<String>, target: impl Into<String>, link_type: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            link_type: link_type.into(),
            value: 1.0,
        }
    }

    pub fn with_value(mut self, value: f32) -> Self {
        self.value = value;
        self
    }
}

/// One canonical graph snapshot. Owned by the host; read-only to every
/// projector.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub links: Vec<GraphLink>,
}

impl GraphData {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_by_id(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Undirected adjacency in node order, then link order.
    ///
    /// Every node gets an entry (possibly empty) so degree lookups are
    /// total. Links touching unknown ids still contribute entries for
    /// the endpoint that exists.
    pub fn adjacency(&self) -> IndexMap<&str, Vec<&str>> {
        let mut adj: IndexMap<&str, Vec<&str>> = IndexMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            adj.insert(node.id.as_str(), Vec::new());
        }
        for link in &self.links {
            if let Some(neighbors) = adj.get_mut(link.source.as_str()) {
                neighbors.push(link.target.as_str());
            }
            if let Some(neighbors) = adj.get_mut(link.target.as_str()) {
                neighbors.push(link.source.as_str());
            }
        }
        adj
    }
}

// ============================================================================
// Tests
// ============================================================================
