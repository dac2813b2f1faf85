//! Graph snapshot loading and lifecycle.
//!
//! The host owns the canonical [`GraphData`]; projectors only ever see
//! the current [`GraphSnapshot`] resource. Snapshots are generation
//! tagged: a load result carrying an older generation than the one
//! already applied is discarded, never applied. Stale responses must
//! not clobber newer state, even after a view was torn down.

use std::path::PathBuf;
use std::sync::Arc;

use bevy::prelude::*;
use noema_graph::GraphData;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read graph file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse graph JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where the snapshot comes from. `None` starts the viewer empty.
#[derive(Resource)]
pub struct GraphSource {
    pub path: Option<PathBuf>,
    /// Generation handed to the next load.
    next_generation: u64,
}

impl GraphSource {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            next_generation: 1,
        }
    }

    fn take_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }
}

/// The current canonical snapshot, read-only to every view.
#[derive(Resource, Default)]
pub struct GraphSnapshot {
    data: Arc<GraphData>,
    generation: u64,
}

impl GraphSnapshot {
    pub fn data(&self) -> &GraphData {
        &self.data
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Apply a load result unless it is stale. Returns whether it was
    /// applied.
    pub fn apply(&mut self, data: GraphData, generation: u64) -> bool {
        if generation <= self.generation {
            debug!(
                stale = generation,
                current = self.generation,
                "discarding stale graph snapshot"
            );
            return false;
        }
        self.data = Arc::new(data);
        self.generation = generation;
        true
    }
}

/// Parse a `{ nodes, links }` document from disk.
pub fn load_graph(path: &std::path::Path) -> Result<GraphData, SnapshotError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Plugin wiring the snapshot resource and its reload key.
pub struct SnapshotPlugin;

impl Plugin for SnapshotPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GraphSnapshot>()
            .add_systems(Startup, initial_load)
            .add_systems(Update, handle_reload_key);
    }
}

fn initial_load(mut source: ResMut<GraphSource>, mut snapshot: ResMut<GraphSnapshot>) {
    load_into(&mut source, &mut snapshot);
}

/// F5 re-reads the snapshot file and bumps the generation.
fn handle_reload_key(
    keys: Res<ButtonInput<KeyCode>>,
    mut source: ResMut<GraphSource>,
    mut snapshot: ResMut<GraphSnapshot>,
) {
    if keys.just_pressed(KeyCode::F5) {
        load_into(&mut source, &mut snapshot);
    }
}

fn load_into(source: &mut GraphSource, snapshot: &mut GraphSnapshot) {
    let Some(path) = source.path.clone() else {
        info!("no graph file given; starting with an empty snapshot");
        return;
    };
    let generation = source.take_generation();
    match load_graph(&path) {
        Ok(data) => {
            let applied = snapshot.apply(data, generation);
            if applied {
                info!(
                    path = %path.display(),
                    generation,
                    nodes = snapshot.data().nodes.len(),
                    links = snapshot.data().links.len(),
                    "graph snapshot loaded"
                );
            }
        }
        Err(err) => {
            // Keep the previous snapshot; the shell shows the error.
            error!(path = %path.display(), %err, "graph snapshot load failed");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use noema_graph::{GraphLink, GraphNode};
    use std::io::Write;

    fn sample() -> GraphData {
        GraphData {
            nodes: vec![GraphNode::new("a", "A", "Entity")],
            links: vec![GraphLink::new("a", "a", "SELF")],
        }
    }

    #[test]
    fn test_apply_accepts_newer_generation() {
        let mut snapshot = GraphSnapshot::default();
        assert!(snapshot.apply(sample(), 1));
        assert_eq!(snapshot.generation(), 1);
        assert_eq!(snapshot.data().nodes.len(), 1);
    }

    #[test]
    fn test_apply_discards_stale_generation() {
        let mut snapshot = GraphSnapshot::default();
        assert!(snapshot.apply(sample(), 2));

        let newer = snapshot.data().clone();
        assert!(!snapshot.apply(GraphData::default(), 1));
        assert!(!snapshot.apply(GraphData::default(), 2));
        assert_eq!(snapshot.data(), &newer);
    }

    #[test]
    fn test_generations_increase() {
        let mut source = GraphSource::new(None);
        assert_eq!(source.take_generation(), 1);
        assert_eq!(source.take_generation(), 2);
    }

    #[test]
    fn test_load_graph_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "nodes": [{{ "id": "x", "name": "X", "type": "Thought" }}], "links": [] }}"#
        )
        .unwrap();

        let data = load_graph(file.path()).unwrap();
        assert_eq!(data.nodes[0].id, "x");
    }

    #[test]
    fn test_load_graph_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            load_graph(file.path()),
            Err(SnapshotError::Parse(_))
        ));
    }
}
