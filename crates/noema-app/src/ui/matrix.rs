//! Adjacency matrix view.
//!
//! Renders the dense matrix as a cell grid. Threshold keys re-filter
//! from the full matrix on every change (the full build is never
//! mutated), `C` cycles the color scheme, `F` the type filter, and `E`
//! writes the CSV export to disk. Zero-valued cells are rendered as
//! first-class "no connection" cells; cells dropped by the threshold
//! disappear entirely.

use std::path::PathBuf;

use bevy::prelude::*;

use noema_graph::{build_matrix, filter_by_threshold, ColorScheme, MatrixData};

use crate::snapshot::GraphSnapshot;
use crate::theme::Theme;
use crate::ui::events::{CellClicked, NodeSelected, ThresholdChanged};
use crate::ui::state::{InputCapture, ViewMode};

const TYPE_FILTERS: [Option<&str>; 5] = [
    None,
    Some("Session"),
    Some("Thought"),
    Some("Entity"),
    Some("Tool"),
];

/// Axis nodes shown at most; the projection itself is unbounded.
const MAX_DISPLAY: usize = 24;
const CELL_PX: f32 = 22.0;
const LABEL_PX: f32 = 110.0;
const THRESHOLD_STEP: f32 = 0.1;

#[derive(Resource, Default)]
pub struct MatrixView {
    full: MatrixData,
    threshold: f32,
    scheme: ColorScheme,
    type_filter: usize,
    generation: u64,
    dirty: bool,
}

#[derive(Component)]
struct MatrixRoot;

#[derive(Component)]
struct StatusLine;

#[derive(Component)]
struct GridContainer;

#[derive(Component)]
struct GridEntry;

#[derive(Component)]
struct CellButton {
    row: usize,
    col: usize,
}

pub struct MatrixViewPlugin;

impl Plugin for MatrixViewPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MatrixView>()
            .add_systems(OnEnter(ViewMode::Matrix), enter_matrix)
            .add_systems(OnExit(ViewMode::Matrix), exit_matrix)
            .add_systems(
                Update,
                (
                    sync_with_snapshot,
                    handle_keys,
                    handle_cell_clicks,
                    refresh_grid,
                )
                    .chain()
                    .run_if(in_state(ViewMode::Matrix)),
            );
    }
}

fn enter_matrix(
    mut commands: Commands,
    snapshot: Res<GraphSnapshot>,
    theme: Res<Theme>,
    mut view: ResMut<MatrixView>,
) {
    view.full = build_matrix(snapshot.data(), TYPE_FILTERS[view.type_filter]);
    view.generation = snapshot.generation();
    view.threshold = 0.0;
    view.dirty = true;

    commands
        .spawn((
            MatrixRoot,
            Name::new("MatrixPanel"),
            Node {
                position_type: PositionType::Absolute,
                top: Val::Px(12.0),
                left: Val::Px(12.0),
                right: Val::Px(12.0),
                bottom: Val::Px(40.0),
                flex_direction: FlexDirection::Column,
                padding: UiRect::all(Val::Px(12.0)),
                row_gap: Val::Px(6.0),
                ..default()
            },
            BackgroundColor(theme.panel_bg.with_alpha(0.92)),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(
                    "Matrix  |  Up/Down: threshold  C: colors  F: type filter  E: export CSV",
                ),
                TextFont {
                    font_size: 12.0,
                    ..default()
                },
                TextColor(theme.fg_dim),
            ));
            parent.spawn((
                StatusLine,
                Text::new(String::new()),
                TextFont {
                    font_size: 12.0,
                    ..default()
                },
                TextColor(theme.accent),
            ));
            parent.spawn((
                GridContainer,
                Node {
                    flex_direction: FlexDirection::Column,
                    overflow: Overflow::clip(),
                    flex_grow: 1.0,
                    ..default()
                },
            ));
        });
}

fn exit_matrix(mut commands: Commands, roots: Query<Entity, With<MatrixRoot>>) {
    for entity in roots.iter() {
        commands.entity(entity).despawn();
    }
}

fn sync_with_snapshot(snapshot: Res<GraphSnapshot>, mut view: ResMut<MatrixView>) {
    if view.generation == snapshot.generation() {
        return;
    }
    view.full = build_matrix(snapshot.data(), TYPE_FILTERS[view.type_filter]);
    view.generation = snapshot.generation();
    view.threshold = 0.0;
    view.dirty = true;
}

fn handle_keys(
    keys: Res<ButtonInput<KeyCode>>,
    capture: Res<InputCapture>,
    snapshot: Res<GraphSnapshot>,
    mut view: ResMut<MatrixView>,
    mut thresholds: MessageWriter<ThresholdChanged>,
) {
    if capture.0 {
        return;
    }

    if keys.just_pressed(KeyCode::ArrowUp) || keys.just_pressed(KeyCode::ArrowDown) {
        let delta = if keys.just_pressed(KeyCode::ArrowUp) {
            THRESHOLD_STEP
        } else {
            -THRESHOLD_STEP
        };
        let next = step_threshold(view.threshold, delta, view.full.max_value);
        if (next - view.threshold).abs() > f32::EPSILON {
            view.threshold = next;
            view.dirty = true;
            thresholds.write(ThresholdChanged(next));
        }
    }

    if keys.just_pressed(KeyCode::KeyC) {
        view.scheme = view.scheme.next();
        view.dirty = true;
    }

    if keys.just_pressed(KeyCode::KeyF) {
        view.type_filter = (view.type_filter + 1) % TYPE_FILTERS.len();
        view.full = build_matrix(snapshot.data(), TYPE_FILTERS[view.type_filter]);
        view.threshold = 0.0;
        view.dirty = true;
    }

    if keys.just_pressed(KeyCode::KeyE) {
        let shown = filter_by_threshold(&view.full, view.threshold);
        let path = export_path();
        match std::fs::write(&path, shown.to_csv()) {
            Ok(()) => info!(path = %path.display(), "matrix CSV exported"),
            Err(err) => error!(path = %path.display(), %err, "matrix CSV export failed"),
        }
    }
}

fn handle_cell_clicks(
    interactions: Query<(&Interaction, &CellButton), (Changed<Interaction>, With<Button>)>,
    view: Res<MatrixView>,
    mut cells: MessageWriter<CellClicked>,
    mut selections: MessageWriter<NodeSelected>,
) {
    for (interaction, cell) in interactions.iter() {
        if *interaction != Interaction::Pressed {
            continue;
        }
        cells.write(CellClicked {
            row: cell.row,
            col: cell.col,
        });
        if let Some(node) = view.full.nodes.get(cell.row) {
            selections.write(NodeSelected {
                node_id: node.id.clone(),
            });
        }
    }
}

fn refresh_grid(
    mut commands: Commands,
    mut view: ResMut<MatrixView>,
    theme: Res<Theme>,
    containers: Query<Entity, With<GridContainer>>,
    entries: Query<Entity, With<GridEntry>>,
    mut status_lines: Query<&mut Text, With<StatusLine>>,
) {
    if !view.dirty {
        return;
    }
    view.dirty = false;

    let Ok(container) = containers.single() else {
        return;
    };
    for entity in entries.iter() {
        commands.entity(entity).despawn();
    }

    let shown = filter_by_threshold(&view.full, view.threshold);
    let size = shown.size();
    let display = size.min(MAX_DISPLAY);

    for mut text in status_lines.iter_mut() {
        text.0 = status_line(&view, size, display);
    }

    if size == 0 {
        commands.entity(container).with_children(|parent| {
            parent.spawn((
                GridEntry,
                Text::new("no nodes to display"),
                TextFont {
                    font_size: 13.0,
                    ..default()
                },
                TextColor(theme.fg_dim),
            ));
        });
        return;
    }

    // Index retained cells; threshold-dropped pairs stay None.
    let mut lookup = vec![None; size * size];
    for cell in &shown.cells {
        let row = shown.nodes.iter().position(|n| n.id == cell.row);
        let col = shown.nodes.iter().position(|n| n.id == cell.col);
        if let (Some(row), Some(col)) = (row, col) {
            lookup[row * size + col] = Some(cell);
        }
    }

    commands.entity(container).with_children(|parent| {
        for row in 0..display {
            parent
                .spawn((
                    GridEntry,
                    Node {
                        flex_direction: FlexDirection::Row,
                        align_items: AlignItems::Center,
                        column_gap: Val::Px(1.0),
                        margin: UiRect::bottom(Val::Px(1.0)),
                        ..default()
                    },
                ))
                .with_children(|line| {
                    let node = &shown.nodes[row];
                    line.spawn((
                        Node {
                            width: Val::Px(LABEL_PX),
                            ..default()
                        },
                        Text::new(truncate(&node.name, 14)),
                        TextFont {
                            font_size: 11.0,
                            ..default()
                        },
                        TextColor(theme.node_type_color(&node.node_type)),
                    ));
                    for col in 0..display {
                        let color = match lookup[row * size + col] {
                            Some(cell) if cell.is_connected() => {
                                let [r, g, b, a] =
                                    view.scheme.color(shown.intensity(cell.value));
                                Color::srgba(r, g, b, a)
                            }
                            // Dense zero cell: visible but muted.
                            Some(_) => theme.fg_dim.with_alpha(0.08),
                            // Dropped by the threshold.
                            None => Color::NONE,
                        };
                        line.spawn((
                            CellButton { row, col },
                            Button,
                            Node {
                                width: Val::Px(CELL_PX),
                                height: Val::Px(CELL_PX),
                                ..default()
                            },
                            BackgroundColor(color),
                        ));
                    }
                });
        }
    });
}

// ============================================================================
// Helpers
// ============================================================================

fn status_line(view: &MatrixView, size: usize, display: usize) -> String {
    let clip = if display < size {
        format!("  (showing first {display} of {size})")
    } else {
        String::new()
    };
    format!(
        "scheme: {}  |  threshold: {:.1} (max {:.1})  |  type: {}{}",
        view.scheme.label(),
        view.threshold,
        view.full.max_value,
        TYPE_FILTERS[view.type_filter].unwrap_or("all"),
        clip
    )
}

fn step_threshold(current: f32, delta: f32, max_value: f32) -> f32 {
    (current + delta).clamp(0.0, max_value.max(0.0))
}

fn truncate(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        name.to_string()
    } else {
        let head: String = name.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{head}\u{2026}")
    }
}

fn export_path() -> PathBuf {
    std::env::temp_dir().join("noema-matrix.csv")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_threshold_clamps_to_range() {
        assert_eq!(step_threshold(0.0, -0.1, 3.0), 0.0);
        assert!((step_threshold(0.0, 0.1, 3.0) - 0.1).abs() < 1e-6);
        assert_eq!(step_threshold(2.95, 0.1, 3.0), 3.0);
        // A linkless matrix pins the threshold at zero.
        assert_eq!(step_threshold(0.0, 0.1, 0.0), 0.0);
    }

    #[test]
    fn test_truncate_keeps_short_names() {
        assert_eq!(truncate("short", 14), "short");
        let long = truncate("a very long node name indeed", 14);
        assert_eq!(long.chars().count(), 14);
        assert!(long.ends_with('\u{2026}'));
    }

    #[test]
    fn test_export_path_is_stable() {
        assert_eq!(export_path().file_name().unwrap(), "noema-matrix.csv");
    }
}
