//! Matrix projection: the graph as a dense weighted adjacency matrix.
//!
//! Dense on purpose: the view renders "no connection" as a first-class
//! cell, so every ordered pair materializes even at weight zero.
//! Callers bound the O(K²) cost by type-filtering *before* projection;
//! above [`MATRIX_WARN_NODES`] nodes a warning is logged but the build
//! proceeds.

use indexmap::IndexMap;
use tracing::warn;

use crate::model::GraphData;

/// Node count above which the dense build logs a size warning.
pub const MATRIX_WARN_NODES: usize = 200;

/// Axis entry: the filtered node set, in original node order.
#[derive(Clone, Debug, PartialEq)]
pub struct MatrixAxisNode {
    pub id: String,
    pub name: String,
    pub node_type: String,
}

/// One cell of the dense matrix. `link_type` is empty for zero-valued
/// (no-connection) cells.
#[derive(Clone, Debug, PartialEq)]
pub struct MatrixCell {
    pub row: String,
    pub col: String,
    pub value: f32,
    pub link_type: String,
}

impl MatrixCell {
    pub fn is_connected(&self) -> bool {
        self.value > 0.0
    }
}

/// Dense adjacency matrix over a (possibly type-filtered) node set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatrixData {
    pub nodes: Vec<MatrixAxisNode>,
    /// Row-major; a full build holds exactly `nodes.len()²` cells.
    /// A thresholded view drops sub-threshold connected cells.
    pub cells: Vec<MatrixCell>,
    /// Largest non-zero cell value (0 when the matrix has no links).
    pub max_value: f32,
    /// Smallest non-zero cell value (0 when the matrix has no links).
    pub min_value: f32,
}

impl MatrixData {
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Normalized intensity for color mapping.
    pub fn intensity(&self, value: f32) -> f32 {
        if self.max_value > 0.0 {
            (value / self.max_value).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Row-per-connection CSV of the non-zero cells.
    pub fn to_csv(&self) -> String {
        let mut out = String::from("Source,Target,Value,Type\n");
        for cell in self.cells.iter().filter(|c| c.is_connected()) {
            out.push_str(&format!(
                "{},{},{},{}\n",
                cell.row, cell.col, cell.value, cell.link_type
            ));
        }
        out
    }
}

/// Project the graph into a dense matrix, keeping only nodes whose
/// type equals `type_filter` when one is given.
///
/// For each link with both endpoints in the node set, the forward cell
/// takes the link's value and type; the mirrored cell is filled only
/// if still zero (idempotent symmetrization; a later link between the
/// same pair never overwrites an already-set reverse cell).
pub fn build_matrix(graph: &GraphData, type_filter: Option<&str>) -> MatrixData {
    let nodes: Vec<MatrixAxisNode> = graph
        .nodes
        .iter()
        .filter(|n| type_filter.is_none_or(|t| n.node_type == t))
        .map(|n| MatrixAxisNode {
            id: n.id.clone(),
            name: n.name.clone(),
            node_type: n.node_type.clone(),
        })
        .collect();

    let k = nodes.len();
    if k > MATRIX_WARN_NODES {
        warn!(nodes = k, cells = k * k, "dense matrix build over large node set; consider a type filter");
    }

    let index: IndexMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    let mut cells: Vec<MatrixCell> = Vec::with_capacity(k * k);
    for row in &nodes {
        for col in &nodes {
            cells.push(MatrixCell {
                row: row.id.clone(),
                col: col.id.clone(),
                value: 0.0,
                link_type: String::new(),
            });
        }
    }

    let mut max_value: f32 = 0.0;
    let mut min_value = f32::MAX;
    let mut any_link = false;

    for link in &graph.links {
        let (Some(&s), Some(&t)) = (index.get(link.source.as_str()), index.get(link.target.as_str()))
        else {
            continue;
        };
        let value = link.value.max(0.0);

        let forward = &mut cells[s * k + t];
        forward.value = value;
        forward.link_type = link.link_type.clone();

        let mirror = &mut cells[t * k + s];
        if !mirror.is_connected() {
            mirror.value = value;
            mirror.link_type = link.link_type.clone();
        }

        if value > 0.0 {
            any_link = true;
            max_value = max_value.max(value);
            min_value = min_value.min(value);
        }
    }

    MatrixData {
        nodes,
        cells,
        max_value,
        min_value: if any_link { min_value } else { 0.0 },
    }
}

/// Drop connected cells below `threshold`, keeping zero cells as
/// first-class "no connection" entries. Pure: the source matrix is
/// untouched, so re-filtering at a new threshold always starts from
/// the full dense build. The intensity scale (`max_value`/`min_value`)
/// stays anchored to the source so cell colors don't shift as the
/// threshold moves.
pub fn filter_by_threshold(matrix: &MatrixData, threshold: f32) -> MatrixData {
    MatrixData {
        nodes: matrix.nodes.clone(),
        cells: matrix
            .cells
            .iter()
            .filter(|c| !c.is_connected() || c.value >= threshold)
            .cloned()
            .collect(),
        max_value: matrix.max_value,
        min_value: matrix.min_value,
    }
}

// ============================================================================
// Color schemes
// ============================================================================

/// Named cell color schemes. Each maps a normalized intensity to RGBA
/// with alpha `0.3 + 0.7*i`; stateless and deterministic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorScheme {
    #[default]
    Heat,
    Blues,
    Greens,
    Viridis,
}

impl ColorScheme {
    pub const ALL: [ColorScheme; 4] = [
        ColorScheme::Heat,
        ColorScheme::Blues,
        ColorScheme::Greens,
        ColorScheme::Viridis,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ColorScheme::Heat => "heat",
            ColorScheme::Blues => "blues",
            ColorScheme::Greens => "greens",
            ColorScheme::Viridis => "viridis",
        }
    }

    /// The next scheme in cycle order (for the scheme-cycle key).
    pub fn next(&self) -> ColorScheme {
        match self {
            ColorScheme::Heat => ColorScheme::Blues,
            ColorScheme::Blues => ColorScheme::Greens,
            ColorScheme::Greens => ColorScheme::Viridis,
            ColorScheme::Viridis => ColorScheme::Heat,
        }
    }

    /// RGBA for intensity `i ∈ [0,1]`.
    pub fn color(&self, intensity: f32) -> [f32; 4] {
        let i = intensity.clamp(0.0, 1.0);
        let alpha = 0.3 + 0.7 * i;
        let [r, g, b] = match self {
            // Yellow → red.
            ColorScheme::Heat => [1.0, 1.0 - i, 0.0],
            // Pale → saturated blue.
            ColorScheme::Blues => [(1.0 - i) * 0.8, (1.0 - i) * 0.9, 1.0],
            // Pale → saturated green.
            ColorScheme::Greens => [(1.0 - i) * 0.8, 1.0 - 0.3 * i, (1.0 - i) * 0.8],
            // Three-stop lerp through the viridis anchors.
            ColorScheme::Viridis => viridis_approx(i),
        };
        [r, g, b, alpha]
    }
}

/// Piecewise-linear pass through viridis at i = 0, 0.5, 1.
fn viridis_approx(i: f32) -> [f32; 3] {
    const LOW: [f32; 3] = [0.267, 0.005, 0.329];
    const MID: [f32; 3] = [0.128, 0.567, 0.551];
    const HIGH: [f32; 3] = [0.993, 0.906, 0.144];

    let (from, to, t) = if i < 0.5 {
        (LOW, MID, i * 2.0)
    } else {
        (MID, HIGH, (i - 0.5) * 2.0)
    };
    [
        from[0] + (to[0] - from[0]) * t,
        from[1] + (to[1] - from[1]) * t,
        from[2] + (to[2] - from[2]) * t,
    ]
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GraphLink, GraphNode};

    fn two_node_graph() -> GraphData {
        GraphData {
            nodes: vec![
                GraphNode::new("a", "A", "Entity"),
                GraphNode::new("b", "B", "Entity"),
            ],
            links: vec![GraphLink::new("a", "b", "MENTIONS").with_value(0.7)],
        }
    }

    fn cell<'m>(m: &'m MatrixData, row: &str, col: &str) -> &'m MatrixCell {
        m.cells
            .iter()
            .find(|c| c.row == row && c.col == col)
            .unwrap()
    }

    #[test]
    fn test_density_is_k_squared() {
        let graph = GraphData {
            nodes: vec![
                GraphNode::new("a", "A", "Entity"),
                GraphNode::new("b", "B", "Thought"),
                GraphNode::new("c", "C", "Entity"),
            ],
            links: vec![],
        };
        assert_eq!(build_matrix(&graph, None).cells.len(), 9);
        // Type filter bounds the node set before densification.
        assert_eq!(build_matrix(&graph, Some("Entity")).cells.len(), 4);
    }

    #[test]
    fn test_two_node_scenario() {
        let matrix = build_matrix(&two_node_graph(), None);

        assert_eq!(cell(&matrix, "a", "a").value, 0.0);
        assert_eq!(cell(&matrix, "a", "b").value, 0.7);
        assert_eq!(cell(&matrix, "b", "a").value, 0.7);
        assert_eq!(cell(&matrix, "b", "b").value, 0.0);
        assert_eq!(matrix.max_value, 0.7);
        assert_eq!(matrix.min_value, 0.7);
        assert_eq!(cell(&matrix, "a", "b").link_type, "MENTIONS");
    }

    #[test]
    fn test_symmetrization_is_idempotent() {
        // A second link on the same pair updates the forward cell but
        // must not clobber the already-set reverse cell.
        let graph = GraphData {
            nodes: vec![
                GraphNode::new("a", "A", "Entity"),
                GraphNode::new("b", "B", "Entity"),
            ],
            links: vec![
                GraphLink::new("a", "b", "MENTIONS").with_value(0.7),
                GraphLink::new("b", "a", "USES_TOOL").with_value(0.2),
            ],
        };
        let matrix = build_matrix(&graph, None);

        assert_eq!(cell(&matrix, "b", "a").value, 0.2);
        assert_eq!(cell(&matrix, "b", "a").link_type, "USES_TOOL");
        // Mirror of the second link found (a,b) already set.
        assert_eq!(cell(&matrix, "a", "b").value, 0.7);
        assert_eq!(cell(&matrix, "a", "b").link_type, "MENTIONS");
    }

    #[test]
    fn test_empty_matrix_min_max_default_zero() {
        let graph = GraphData {
            nodes: vec![GraphNode::new("a", "A", "Entity")],
            links: vec![],
        };
        let matrix = build_matrix(&graph, None);
        assert_eq!(matrix.max_value, 0.0);
        assert_eq!(matrix.min_value, 0.0);
        assert_eq!(matrix.intensity(0.0), 0.0);
    }

    #[test]
    fn test_threshold_keeps_zero_cells_drops_weak_links() {
        let graph = GraphData {
            nodes: vec![
                GraphNode::new("a", "A", "Entity"),
                GraphNode::new("b", "B", "Entity"),
                GraphNode::new("c", "C", "Entity"),
            ],
            links: vec![
                GraphLink::new("a", "b", "MENTIONS").with_value(0.7),
                GraphLink::new("b", "c", "MENTIONS").with_value(0.3),
            ],
        };
        let full = build_matrix(&graph, None);
        let filtered = filter_by_threshold(&full, 0.5);

        // Strong pair retained in both directions.
        assert_eq!(cell(&filtered, "a", "b").value, 0.7);
        assert_eq!(cell(&filtered, "b", "a").value, 0.7);
        // Weak pair removed entirely.
        assert!(!filtered.cells.iter().any(|c| c.row == "b" && c.col == "c"));
        // Zero cells survive as explicit no-connection entries.
        assert_eq!(cell(&filtered, "a", "c").value, 0.0);
        // Source untouched.
        assert_eq!(full.cells.len(), 9);
        assert_eq!(cell(&full, "b", "c").value, 0.3);
    }

    #[test]
    fn test_threshold_filter_is_idempotent() {
        let full = build_matrix(&two_node_graph(), None);
        let once = filter_by_threshold(&full, 0.5);
        let twice = filter_by_threshold(&once, 0.5);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_csv_export() {
        let csv = build_matrix(&two_node_graph(), None).to_csv();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Source,Target,Value,Type");
        assert!(lines.contains(&"a,b,0.7,MENTIONS"));
        assert!(lines.contains(&"b,a,0.7,MENTIONS"));
        // Header + two connected cells; zero cells never exported.
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_color_alpha_tracks_intensity() {
        for scheme in ColorScheme::ALL {
            let low = scheme.color(0.0);
            let high = scheme.color(1.0);
            assert!((low[3] - 0.3).abs() < 1e-6);
            assert!((high[3] - 1.0).abs() < 1e-6);
            for channel in &high[..3] {
                assert!((0.0..=1.0).contains(channel));
            }
        }
    }

    #[test]
    fn test_scheme_cycle_returns_home() {
        let mut scheme = ColorScheme::Heat;
        for _ in 0..ColorScheme::ALL.len() {
            scheme = scheme.next();
        }
        assert_eq!(scheme, ColorScheme::Heat);
    }
}
