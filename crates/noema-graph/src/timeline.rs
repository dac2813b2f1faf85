//! Timeline projection: type-banded, time-ordered node sequences.
//!
//! Nodes group into one band per type (first-seen order); each band is
//! sorted ascending by the timestamp coerced out of the properties
//! bag. A node with no usable timestamp lands at "now" rather than
//! failing the projection.

use indexmap::IndexMap;

use crate::model::GraphData;

/// Fixed band colors (sRGB), cycled by band index.
pub const BAND_PALETTE: [[f32; 3]; 8] = [
    [0.290, 0.565, 0.886], // blue
    [0.314, 0.784, 0.471], // green
    [1.000, 0.420, 0.420], // red
    [0.886, 0.753, 0.290], // amber
    [0.608, 0.427, 0.890], // purple
    [0.290, 0.831, 0.820], // teal
    [0.890, 0.475, 0.761], // pink
    [0.596, 0.655, 0.718], // slate
];

/// Milliseconds per period preset unit.
const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// A node placed on the time axis.
#[derive(Clone, Debug, PartialEq)]
pub struct TimelineNode {
    pub id: String,
    pub name: String,
    /// Unix millis; "now" when the source node had no usable timestamp.
    pub timestamp: i64,
    pub node_type: String,
    /// Nearest `Session` neighbor, when one exists.
    pub session_id: Option<String>,
    /// Undirected neighbor ids, in link order.
    pub connections: Vec<String>,
}

/// One horizontal band: all nodes of a single type, time-ordered.
#[derive(Clone, Debug, PartialEq)]
pub struct TimelineBand {
    /// Band identity and label are both the node type.
    pub id: String,
    pub label: String,
    /// Ascending by timestamp; ties keep original node order.
    pub nodes: Vec<TimelineNode>,
    pub color: [f32; 3],
}

/// Group the graph into type bands. `now` substitutes for missing
/// timestamps, passed in so a single snapshot projects identically on
/// every recomputation within a frame.
pub fn build_bands(graph: &GraphData, now: i64) -> Vec<TimelineBand> {
    let adjacency = graph.adjacency();

    let mut bands: IndexMap<&str, Vec<TimelineNode>> = IndexMap::new();
    for node in &graph.nodes {
        let connections: Vec<String> = adjacency
            .get(node.id.as_str())
            .map(|neighbors| neighbors.iter().map(|n| n.to_string()).collect())
            .unwrap_or_default();
        let session_id = connections
            .iter()
            .find(|id| {
                graph
                    .node_by_id(id)
                    .is_some_and(|n| n.node_type == "Session")
            })
            .cloned();

        bands
            .entry(node.node_type.as_str())
            .or_default()
            .push(TimelineNode {
                id: node.id.clone(),
                name: node.name.clone(),
                timestamp: node.timestamp().or_now(now),
                node_type: node.node_type.clone(),
                session_id,
                connections,
            });
    }

    bands
        .into_iter()
        .enumerate()
        .map(|(index, (node_type, mut nodes))| {
            nodes.sort_by_key(|n| n.timestamp);
            TimelineBand {
                id: node_type.to_string(),
                label: node_type.to_string(),
                nodes,
                color: BAND_PALETTE[index % BAND_PALETTE.len()],
            }
        })
        .collect()
}

// ============================================================================
// Time scale
// ============================================================================

/// Effective `[start, end]` of the time axis, in unix millis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeScale {
    pub start: i64,
    pub end: i64,
}

impl TimeScale {
    /// Compute the axis range. An explicit period is used verbatim;
    /// otherwise the min/max node timestamp expanded by 10% padding on
    /// both ends. Degenerate ranges get a fixed ±30 s guard so
    /// position mapping never divides by zero.
    pub fn from_bands(bands: &[TimelineBand], explicit: Option<(i64, i64)>, now: i64) -> TimeScale {
        let (start, end) = match explicit {
            Some(period) => period,
            None => {
                let timestamps = bands.iter().flat_map(|b| b.nodes.iter().map(|n| n.timestamp));
                match (timestamps.clone().min(), timestamps.max()) {
                    (Some(min), Some(max)) => {
                        let pad = ((max - min) as f64 * 0.1) as i64;
                        (min - pad, max + pad)
                    }
                    _ => (now - DAY_MS, now),
                }
            }
        };

        if start >= end {
            TimeScale {
                start: start - 30_000,
                end: end + 30_000,
            }
        } else {
            TimeScale { start, end }
        }
    }

    pub fn span_millis(&self) -> i64 {
        self.end - self.start
    }

    /// Horizontal position of `timestamp` along a track of
    /// `track_width` logical pixels at the given zoom.
    pub fn position(&self, timestamp: i64, track_width: f32, zoom: f32) -> f32 {
        let fraction = (timestamp - self.start) as f32 / self.span_millis() as f32;
        fraction * track_width * zoom
    }

    /// The instant under the playback cursor at progress `p ∈ [0,1)`.
    pub fn cursor_time(&self, progress: f32) -> i64 {
        self.start + (progress as f64 * self.span_millis() as f64) as i64
    }
}

/// Quick period selections for the time axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PeriodPreset {
    Day,
    Week,
    Month,
    /// Data-driven bounds (clears the explicit period).
    #[default]
    All,
}

impl PeriodPreset {
    pub fn label(&self) -> &'static str {
        match self {
            PeriodPreset::Day => "day",
            PeriodPreset::Week => "week",
            PeriodPreset::Month => "month",
            PeriodPreset::All => "all",
        }
    }

    /// Explicit `[now − Δ, now]` range, or `None` for data-driven.
    pub fn range(&self, now: i64) -> Option<(i64, i64)> {
        match self {
            PeriodPreset::Day => Some((now - DAY_MS, now)),
            PeriodPreset::Week => Some((now - 7 * DAY_MS, now)),
            PeriodPreset::Month => Some((now - 30 * DAY_MS, now)),
            PeriodPreset::All => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GraphLink, GraphNode};
    use serde_json::Value;

    const NOW: i64 = 1_700_000_000_000;

    fn stamped(id: &str, node_type: &str, millis: i64) -> GraphNode {
        let mut node = GraphNode::new(id, id.to_uppercase(), node_type);
        node.properties.insert("timestamp".into(), Value::from(millis));
        node
    }

    #[test]
    fn test_bands_group_by_type_in_first_seen_order() {
        let graph = GraphData {
            nodes: vec![
                stamped("t1", "Thought", NOW - 100),
                stamped("e1", "Entity", NOW - 50),
                stamped("t2", "Thought", NOW - 200),
            ],
            links: vec![],
        };
        let bands = build_bands(&graph, NOW);

        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0].id, "Thought");
        assert_eq!(bands[1].id, "Entity");
        assert_eq!(bands[0].color, BAND_PALETTE[0]);
        assert_eq!(bands[1].color, BAND_PALETTE[1]);
    }

    #[test]
    fn test_band_nodes_sorted_ascending() {
        let graph = GraphData {
            nodes: vec![
                stamped("late", "Thought", NOW - 10),
                stamped("early", "Thought", NOW - 500),
                stamped("mid", "Thought", NOW - 100),
            ],
            links: vec![],
        };
        let bands = build_bands(&graph, NOW);

        let ids: Vec<&str> = bands[0].nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "mid", "late"]);
        for pair in bands[0].nodes.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn test_missing_timestamp_lands_at_now() {
        let graph = GraphData {
            nodes: vec![GraphNode::new("t", "T", "Thought")],
            links: vec![],
        };
        let bands = build_bands(&graph, NOW);
        assert_eq!(bands[0].nodes[0].timestamp, NOW);
    }

    #[test]
    fn test_session_attribution_and_connections() {
        let graph = GraphData {
            nodes: vec![
                stamped("s", "Session", NOW - 300),
                stamped("t", "Thought", NOW - 200),
                stamped("e", "Entity", NOW - 100),
            ],
            links: vec![
                GraphLink::new("s", "t", "CONTAINS"),
                GraphLink::new("t", "e", "MENTIONS"),
            ],
        };
        let bands = build_bands(&graph, NOW);

        let thought = &bands.iter().find(|b| b.id == "Thought").unwrap().nodes[0];
        assert_eq!(thought.session_id.as_deref(), Some("s"));
        assert_eq!(thought.connections, vec!["s", "e"]);

        let entity = &bands.iter().find(|b| b.id == "Entity").unwrap().nodes[0];
        assert_eq!(entity.session_id, None);
    }

    #[test]
    fn test_palette_cycles_past_its_length() {
        let nodes: Vec<GraphNode> = (0..10)
            .map(|i| stamped(&format!("n{i}"), &format!("Type{i}"), NOW - i))
            .collect();
        let graph = GraphData { nodes, links: vec![] };
        let bands = build_bands(&graph, NOW);

        assert_eq!(bands.len(), 10);
        assert_eq!(bands[8].color, BAND_PALETTE[0]);
        assert_eq!(bands[9].color, BAND_PALETTE[1]);
    }

    #[test]
    fn test_scale_pads_data_bounds_ten_percent() {
        let graph = GraphData {
            nodes: vec![
                stamped("a", "Thought", 1000),
                stamped("b", "Thought", 2000),
            ],
            links: vec![],
        };
        let bands = build_bands(&graph, NOW);
        let scale = TimeScale::from_bands(&bands, None, NOW);

        assert_eq!(scale.start, 900);
        assert_eq!(scale.end, 2100);
    }

    #[test]
    fn test_scale_explicit_period_used_verbatim() {
        let scale = TimeScale::from_bands(&[], Some((5000, 9000)), NOW);
        assert_eq!(scale.start, 5000);
        assert_eq!(scale.end, 9000);
    }

    #[test]
    fn test_scale_degenerate_range_guard() {
        let graph = GraphData {
            nodes: vec![stamped("only", "Thought", 5000)],
            links: vec![],
        };
        let bands = build_bands(&graph, NOW);
        let scale = TimeScale::from_bands(&bands, None, NOW);

        assert!(scale.span_millis() > 0);
        assert!(scale.start < 5000 && 5000 < scale.end);
    }

    #[test]
    fn test_position_mapping() {
        let scale = TimeScale { start: 0, end: 1000 };
        assert_eq!(scale.position(0, 800.0, 1.0), 0.0);
        assert_eq!(scale.position(500, 800.0, 1.0), 400.0);
        assert_eq!(scale.position(1000, 800.0, 1.0), 800.0);
        // Zoom scales linearly.
        assert_eq!(scale.position(500, 800.0, 2.0), 800.0);
    }

    #[test]
    fn test_cursor_time_tracks_progress() {
        let scale = TimeScale { start: 0, end: 1000 };
        assert_eq!(scale.cursor_time(0.0), 0);
        assert_eq!(scale.cursor_time(0.5), 500);
    }

    #[test]
    fn test_period_presets() {
        assert_eq!(PeriodPreset::Day.range(NOW), Some((NOW - DAY_MS, NOW)));
        assert_eq!(PeriodPreset::Week.range(NOW), Some((NOW - 7 * DAY_MS, NOW)));
        assert_eq!(PeriodPreset::Month.range(NOW), Some((NOW - 30 * DAY_MS, NOW)));
        assert_eq!(PeriodPreset::All.range(NOW), None);
    }

    #[test]
    fn test_empty_graph_projects_to_no_bands() {
        let bands = build_bands(&GraphData::default(), NOW);
        assert!(bands.is_empty());
        // The scale still yields a sane window.
        let scale = TimeScale::from_bands(&bands, None, NOW);
        assert_eq!(scale.span_millis(), DAY_MS);
    }
}
