//! Drill-down hierarchy view.
//!
//! Projects the snapshot into a rooted tree and renders the expanded
//! portion as indented rows. Click a parent row to toggle it, a leaf
//! row to select it. `/` opens an incremental name search, `F` cycles
//! the node-type filter. The projection is rebuilt from scratch on
//! every snapshot or filter change.

use bevy::input::keyboard::{Key, KeyboardInput};
use bevy::prelude::*;

use noema_graph::{build_hierarchy, filter_hierarchy, HierarchyNode};

use crate::snapshot::GraphSnapshot;
use crate::theme::Theme;
use crate::ui::events::{NodeSelected, NodeToggled};
use crate::ui::state::{InputCapture, ViewMode};

const TYPE_FILTERS: [Option<&str>; 5] = [
    None,
    Some("Session"),
    Some("Thought"),
    Some("Entity"),
    Some("Tool"),
];

const INDENT_PX: f32 = 18.0;

/// Projection state for the hierarchy view.
#[derive(Resource, Default)]
pub struct HierarchyView {
    root: Option<HierarchyNode>,
    query: String,
    search_active: bool,
    type_filter: usize,
    generation: u64,
    dirty: bool,
}

#[derive(Component)]
struct HierarchyRoot;

#[derive(Component)]
struct RowsContainer;

#[derive(Component)]
struct FilterLine;

/// Marker for everything spawned into the rows container, so a
/// refresh can clear it wholesale.
#[derive(Component)]
struct RowsEntry;

#[derive(Component)]
struct RowButton {
    node_id: String,
    has_children: bool,
    is_virtual: bool,
    expanded: bool,
}

pub struct HierarchyViewPlugin;

impl Plugin for HierarchyViewPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HierarchyView>()
            .add_systems(OnEnter(ViewMode::Hierarchy), enter_hierarchy)
            .add_systems(OnExit(ViewMode::Hierarchy), exit_hierarchy)
            .add_systems(
                Update,
                (
                    sync_with_snapshot,
                    handle_keys,
                    handle_search_input,
                    handle_row_clicks,
                    refresh_rows,
                )
                    .chain()
                    .run_if(in_state(ViewMode::Hierarchy)),
            );
    }
}

fn enter_hierarchy(
    mut commands: Commands,
    snapshot: Res<GraphSnapshot>,
    theme: Res<Theme>,
    mut view: ResMut<HierarchyView>,
) {
    view.root = build_hierarchy(snapshot.data());
    view.generation = snapshot.generation();
    view.dirty = true;

    commands
        .spawn((
            HierarchyRoot,
            Name::new("HierarchyPanel"),
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
                Text::new("Hierarchy  |  click: expand/select  /: search  F: type filter"),
                TextFont {
                    font_size: 12.0,
                    ..default()
                },
                TextColor(theme.fg_dim),
            ));
            parent.spawn((
                FilterLine,
                Text::new(String::new()),
                TextFont {
                    font_size: 12.0,
                    ..default()
                },
                TextColor(theme.accent),
            ));
            parent.spawn((
                RowsContainer,
                Node {
                    flex_direction: FlexDirection::Column,
                    overflow: Overflow::clip_y(),
                    flex_grow: 1.0,
                    ..default()
                },
            ));
        });
}

fn exit_hierarchy(
    mut commands: Commands,
    roots: Query<Entity, With<HierarchyRoot>>,
    mut view: ResMut<HierarchyView>,
    mut capture: ResMut<InputCapture>,
) {
    for entity in roots.iter() {
        commands.entity(entity).despawn();
    }
    view.search_active = false;
    capture.0 = false;
}

fn sync_with_snapshot(snapshot: Res<GraphSnapshot>, mut view: ResMut<HierarchyView>) {
    if view.generation == snapshot.generation() {
        return;
    }
    view.root = build_hierarchy(snapshot.data());
    view.generation = snapshot.generation();
    view.dirty = true;
}

fn handle_keys(
    keys: Res<ButtonInput<KeyCode>>,
    mut view: ResMut<HierarchyView>,
    mut capture: ResMut<InputCapture>,
) {
    if view.search_active {
        return;
    }
    if keys.just_pressed(KeyCode::Slash) {
        view.search_active = true;
        capture.0 = true;
        view.dirty = true;
    }
    if keys.just_pressed(KeyCode::KeyF) {
        view.type_filter = (view.type_filter + 1) % TYPE_FILTERS.len();
        view.dirty = true;
    }
}

fn handle_search_input(
    mut keyboard: MessageReader<KeyboardInput>,
    mut view: ResMut<HierarchyView>,
    mut capture: ResMut<InputCapture>,
) {
    if !view.search_active {
        keyboard.clear();
        return;
    }

    for event in keyboard.read() {
        if !event.state.is_pressed() {
            continue;
        }
        match (&event.logical_key, &event.text) {
            (Key::Backspace, _) => {
                view.query.pop();
                view.dirty = true;
            }
            (Key::Enter, _) => {
                view.search_active = false;
                capture.0 = false;
                view.dirty = true;
            }
            (Key::Escape, _) => {
                view.query.clear();
                view.search_active = false;
                capture.0 = false;
                view.dirty = true;
            }
            (_, Some(text)) => {
                for ch in text.chars().filter(|ch| !ch.is_control()) {
                    view.query.push(ch);
                    view.dirty = true;
                }
            }
            _ => {}
        }
    }
}

fn handle_row_clicks(
    interactions: Query<(&Interaction, &RowButton), (Changed<Interaction>, With<Button>)>,
    mut view: ResMut<HierarchyView>,
    mut selections: MessageWriter<NodeSelected>,
    mut toggles: MessageWriter<NodeToggled>,
) {
    for (interaction, row) in interactions.iter() {
        if *interaction != Interaction::Pressed || row.is_virtual {
            continue;
        }
        if row.has_children {
            let expanded = !row.expanded;
            if let Some(root) = view.root.as_mut() {
                if set_expanded(root, &row.node_id, expanded) {
                    toggles.write(NodeToggled {
                        node_id: row.node_id.clone(),
                        expanded,
                    });
                    view.dirty = true;
                }
            }
        } else {
            selections.write(NodeSelected {
                node_id: row.node_id.clone(),
            });
        }
    }
}

fn refresh_rows(
    mut commands: Commands,
    mut view: ResMut<HierarchyView>,
    theme: Res<Theme>,
    containers: Query<Entity, With<RowsContainer>>,
    entries: Query<Entity, With<RowsEntry>>,
    mut filter_lines: Query<&mut Text, With<FilterLine>>,
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

    let type_filter = TYPE_FILTERS[view.type_filter];
    for mut text in filter_lines.iter_mut() {
        text.0 = filter_line(&view.query, view.search_active, type_filter);
    }

    let display = view.root.as_ref().and_then(|root| {
        if view.query.is_empty() && type_filter.is_none() {
            Some(root.clone())
        } else {
            filter_hierarchy(root, &view.query, type_filter)
        }
    });

    let Some(display) = display else {
        let line = if view.root.is_none() {
            "graph is empty"
        } else {
            "no nodes match the current filter"
        };
        commands.entity(container).with_children(|parent| {
            parent.spawn((
                RowsEntry,
                Text::new(line),
                TextFont {
                    font_size: 13.0,
                    ..default()
                },
                TextColor(theme.fg_dim),
            ));
        });
        return;
    };

    let mut rows = Vec::new();
    flatten(&display, &mut rows);

    commands.entity(container).with_children(|parent| {
        for node in rows {
            let arrow = if node.children.is_empty() {
                "  "
            } else if node.expanded {
                "v "
            } else {
                "> "
            };
            parent
                .spawn((
                    RowsEntry,
                    RowButton {
                        node_id: node.id.clone(),
                        has_children: !node.children.is_empty(),
                        is_virtual: node.is_virtual(),
                        expanded: node.expanded,
                    },
                    Button,
                    Node {
                        margin: UiRect::left(Val::Px(node.level as f32 * INDENT_PX)),
                        padding: UiRect::axes(Val::Px(6.0), Val::Px(2.0)),
                        ..default()
                    },
                    BackgroundColor(Color::NONE),
                ))
                .with_children(|row| {
                    row.spawn((
                        Text::new(format!(
                            "{arrow}{} ({})",
                            node.name, node.connection_count
                        )),
                        TextFont {
                            font_size: 13.0,
                            ..default()
                        },
                        TextColor(if node.is_virtual() {
                            theme.fg_dim
                        } else {
                            theme.node_type_color(&node.node_type)
                        }),
                    ));
                });
        }
    });
}

// ============================================================================
// Helpers
// ============================================================================

fn filter_line(query: &str, search_active: bool, type_filter: Option<&str>) -> String {
    let search = if search_active {
        format!("search: {query}_")
    } else if query.is_empty() {
        "search: (none)".to_string()
    } else {
        format!("search: {query}")
    };
    format!("{search}  |  type: {}", type_filter.unwrap_or("all"))
}

/// Visible rows in display order: a node, then its children if it is
/// expanded.
fn flatten<'a>(node: &'a HierarchyNode, out: &mut Vec<&'a HierarchyNode>) {
    out.push(node);
    if node.expanded {
        for child in &node.children {
            flatten(child, out);
        }
    }
}

/// Set the expansion flag on the node with `id`. Returns whether it
/// was found.
fn set_expanded(node: &mut HierarchyNode, id: &str, expanded: bool) -> bool {
    if node.id == id {
        node.expanded = expanded;
        return true;
    }
    node.children
        .iter_mut()
        .any(|child| set_expanded(child, id, expanded))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: &str) -> HierarchyNode {
        HierarchyNode {
            id: id.to_string(),
            name: id.to_string(),
            node_type: "Thought".to_string(),
            level: 1,
            connection_count: 0,
            expanded: false,
            children: Vec::new(),
        }
    }

    fn sample_tree() -> HierarchyNode {
        HierarchyNode {
            id: "root".to_string(),
            name: "root".to_string(),
            node_type: "Session".to_string(),
            level: 0,
            connection_count: 2,
            expanded: true,
            children: vec![leaf("a"), leaf("b")],
        }
    }

    #[test]
    fn test_flatten_respects_expansion() {
        let mut tree = sample_tree();
        let mut rows = Vec::new();
        flatten(&tree, &mut rows);
        assert_eq!(rows.len(), 3);

        tree.expanded = false;
        let mut rows = Vec::new();
        flatten(&tree, &mut rows);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_set_expanded_finds_nested_node() {
        let mut tree = sample_tree();
        assert!(set_expanded(&mut tree, "b", true));
        assert!(tree.children[1].expanded);
        assert!(!set_expanded(&mut tree, "missing", true));
    }

    #[test]
    fn test_filter_line_formats() {
        assert_eq!(filter_line("", false, None), "search: (none)  |  type: all");
        assert_eq!(
            filter_line("foo", true, Some("Tool")),
            "search: foo_  |  type: Tool"
        );
    }
}
