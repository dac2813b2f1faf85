//! View shell state.
//!
//! One `States` enum decides which projection of the graph is on
//! screen. Each view spawns its UI in `OnEnter` and tears everything
//! down in `OnExit` (entities and any timers it created), so switching
//! views never leaks resources.

use bevy::prelude::*;

/// Which projection is currently displayed.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum ViewMode {
    /// Force-directed 3D scene
    #[default]
    Scene,
    /// Drill-down tree of sessions and their reachable nodes
    Hierarchy,
    /// Dense weighted adjacency matrix
    Matrix,
    /// Per-type bands over a time axis
    Timeline,
}

impl ViewMode {
    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Scene => "3D Scene",
            ViewMode::Hierarchy => "Hierarchy",
            ViewMode::Matrix => "Matrix",
            ViewMode::Timeline => "Timeline",
        }
    }
}

/// Set while a view owns raw keyboard input (e.g. the hierarchy search
/// field). Global key handlers skip processing while this is on.
#[derive(Resource, Default)]
pub struct InputCapture(pub bool);

/// Keys 1-4 switch between the four projections.
pub fn handle_view_keys(
    keys: Res<ButtonInput<KeyCode>>,
    capture: Res<InputCapture>,
    current: Res<State<ViewMode>>,
    mut next: ResMut<NextState<ViewMode>>,
) {
    if capture.0 {
        return;
    }

    let target = if keys.just_pressed(KeyCode::Digit1) {
        Some(ViewMode::Scene)
    } else if keys.just_pressed(KeyCode::Digit2) {
        Some(ViewMode::Hierarchy)
    } else if keys.just_pressed(KeyCode::Digit3) {
        Some(ViewMode::Matrix)
    } else if keys.just_pressed(KeyCode::Digit4) {
        Some(ViewMode::Timeline)
    } else {
        None
    };

    if let Some(mode) = target {
        if mode != *current.get() {
            info!("switching view: {:?} -> {:?}", current.get(), mode);
            next.set(mode);
        }
    }
}
