//! Messages shared between the views and the shell.

use bevy::prelude::*;
use noema_graph::PeriodPreset;

/// A node was picked in any view. The shell shows its summary.
#[derive(Message, Debug, Clone)]
pub struct NodeSelected {
    pub node_id: String,
}

/// A matrix cell was clicked.
#[derive(Message, Debug, Clone, Copy)]
pub struct CellClicked {
    pub row: usize,
    pub col: usize,
}

/// A hierarchy row was expanded or collapsed.
#[derive(Message, Debug, Clone)]
pub struct NodeToggled {
    pub node_id: String,
    pub expanded: bool,
}

/// The matrix connection-strength threshold moved.
#[derive(Message, Debug, Clone, Copy)]
pub struct ThresholdChanged(pub f32);

/// A timeline period preset was chosen.
#[derive(Message, Debug, Clone, Copy)]
pub struct PeriodSelected(pub PeriodPreset);

/// The timeline zoom factor changed.
#[derive(Message, Debug, Clone, Copy)]
pub struct ZoomChanged(pub f32);

/// Timeline playback was started (true) or paused (false).
#[derive(Message, Debug, Clone, Copy)]
pub struct PlayToggled(pub bool);

/// The 3D scene could not be built; a static summary is shown instead.
#[derive(Message, Debug, Clone)]
pub struct RenderFallback {
    pub reason: String,
}
