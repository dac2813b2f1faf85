//! Force-directed 3D scene view.
//!
//! One sphere per node, colored by node type with an emissive tint
//! derived from a stable hash of the node name. Links are drawn every
//! frame as gizmo lines (stronger links render brighter) with a
//! floating type label at the midpoint. The layout relaxes
//! continuously while the view is active.
//!
//! Scene setup is fallible: when mesh or material assets are
//! unavailable (no render capability), the view logs, emits
//! [`RenderFallback`], and shows a static node/link count summary
//! instead. It never panics.

use bevy::prelude::*;

use noema_graph::GraphData;

use crate::snapshot::GraphSnapshot;
use crate::theme::Theme;
use crate::ui::events::RenderFallback;
use crate::ui::state::ViewMode;
use crate::ui::ShellCamera;

pub mod camera;
pub mod layout;
pub mod lights;

use layout::ForceLayout;

/// Marker for everything the scene view spawns.
#[derive(Component)]
pub struct SceneEntity;

/// Marker for entities rebuilt on snapshot change (spheres, labels,
/// fallback summary). Lights live outside this set.
#[derive(Component)]
pub struct GraphEntity;

/// A node sphere.
#[derive(Component)]
pub struct SceneNode {
    pub id: String,
    pub index: usize,
    pub radius: f32,
}

/// Floating name label for a node, positioned from its projected
/// screen coordinates.
#[derive(Component)]
struct NodeLabel {
    index: usize,
}

/// Link-type label pinned to an edge midpoint.
#[derive(Component)]
struct LinkLabel {
    index: usize,
}

/// Snapshot generation the current scene was built from.
#[derive(Resource, Default)]
struct SceneState {
    generation: u64,
}

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ForceLayout>()
            .init_resource::<SceneState>()
            .add_systems(OnEnter(ViewMode::Scene), enter_scene)
            .add_systems(OnExit(ViewMode::Scene), exit_scene)
            .add_systems(
                Update,
                (
                    rebuild_on_snapshot_change,
                    step_layout,
                    draw_links,
                    update_node_labels,
                    update_link_labels,
                    lights::animate_lights,
                    camera::handle_scene_click,
                    camera::tween_camera,
                )
                    .run_if(in_state(ViewMode::Scene)),
            );
    }
}

// ============================================================================
// Setup / teardown
// ============================================================================

#[allow(clippy::too_many_arguments)]
fn enter_scene(
    mut commands: Commands,
    snapshot: Res<GraphSnapshot>,
    theme: Res<Theme>,
    meshes: Option<ResMut<Assets<Mesh>>>,
    materials: Option<ResMut<Assets<StandardMaterial>>>,
    mut layout: ResMut<ForceLayout>,
    mut scene_state: ResMut<SceneState>,
    mut fallbacks: MessageWriter<RenderFallback>,
) {
    lights::spawn_lights(&mut commands);
    scene_state.generation = snapshot.generation();
    build_graph(
        &mut commands,
        snapshot.data(),
        &theme,
        meshes,
        materials,
        &mut layout,
        &mut fallbacks,
    );
}

fn exit_scene(
    mut commands: Commands,
    entities: Query<Entity, With<SceneEntity>>,
    mut cameras: Query<&mut Transform, With<ShellCamera>>,
) {
    for entity in entities.iter() {
        commands.entity(entity).despawn();
    }
    commands.insert_resource(GlobalAmbientLight::default());
    commands.remove_resource::<camera::CameraFocus>();

    // Leave the camera where the next visit expects it.
    if let Ok(mut transform) = cameras.single_mut() {
        *transform = Transform::from_xyz(0.0, 18.0, 60.0).looking_at(Vec3::ZERO, Vec3::Y);
    }
}

#[allow(clippy::too_many_arguments)]
fn rebuild_on_snapshot_change(
    mut commands: Commands,
    snapshot: Res<GraphSnapshot>,
    theme: Res<Theme>,
    meshes: Option<ResMut<Assets<Mesh>>>,
    materials: Option<ResMut<Assets<StandardMaterial>>>,
    mut layout: ResMut<ForceLayout>,
    mut scene_state: ResMut<SceneState>,
    mut fallbacks: MessageWriter<RenderFallback>,
    existing: Query<Entity, With<GraphEntity>>,
) {
    if scene_state.generation == snapshot.generation() {
        return;
    }
    scene_state.generation = snapshot.generation();

    for entity in existing.iter() {
        commands.entity(entity).despawn();
    }
    build_graph(
        &mut commands,
        snapshot.data(),
        &theme,
        meshes,
        materials,
        &mut layout,
        &mut fallbacks,
    );
}

fn build_graph(
    commands: &mut Commands,
    data: &GraphData,
    theme: &Theme,
    meshes: Option<ResMut<Assets<Mesh>>>,
    materials: Option<ResMut<Assets<StandardMaterial>>>,
    layout: &mut ForceLayout,
    fallbacks: &mut MessageWriter<RenderFallback>,
) {
    layout.rebuild(data);
    info!(
        nodes = data.nodes.len(),
        links = data.links.len(),
        "building 3D scene"
    );

    let (Some(mut meshes), Some(mut materials)) = (meshes, materials) else {
        let reason = "mesh/material assets unavailable".to_string();
        error!(%reason, "falling back to static summary");
        fallbacks.write(RenderFallback {
            reason: reason.clone(),
        });
        spawn_fallback_summary(commands, data, theme);
        return;
    };

    for (index, node) in data.nodes.iter().enumerate() {
        let radius = theme.node_type_radius(&node.node_type);
        let base = theme.node_type_color(&node.node_type);
        let tint = Color::hsl(layout::name_hue(&node.name), 0.7, 0.45);

        commands.spawn((
            SceneEntity,
            GraphEntity,
            SceneNode {
                id: node.id.clone(),
                index,
                radius,
            },
            Name::new(format!("Node:{}", node.id)),
            Mesh3d(meshes.add(Sphere::new(radius))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: base,
                emissive: tint.to_linear() * 0.15,
                perceptual_roughness: 0.55,
                ..default()
            })),
            Transform::from_translation(layout.positions[index]),
        ));

        commands.spawn((
            SceneEntity,
            GraphEntity,
            NodeLabel { index },
            Text::new(node.name.clone()),
            TextFont {
                font_size: 11.0,
                ..default()
            },
            TextColor(theme.fg),
            Node {
                position_type: PositionType::Absolute,
                ..default()
            },
            ZIndex(10),
        ));
    }

    for (index, edge) in layout.edges.iter().enumerate() {
        commands.spawn((
            SceneEntity,
            GraphEntity,
            LinkLabel { index },
            Text::new(edge.link_type.clone()),
            TextFont {
                font_size: 9.0,
                ..default()
            },
            TextColor(theme.fg_dim),
            Node {
                position_type: PositionType::Absolute,
                ..default()
            },
            ZIndex(5),
        ));
    }
}

/// Static replacement when 3D rendering is unavailable.
fn spawn_fallback_summary(commands: &mut Commands, data: &GraphData, theme: &Theme) {
    commands
        .spawn((
            SceneEntity,
            GraphEntity,
            Name::new("SceneFallback"),
            Node {
                position_type: PositionType::Absolute,
                left: Val::Percent(50.0),
                top: Val::Percent(40.0),
                margin: UiRect {
                    left: Val::Px(-160.0),
                    ..default()
                },
                width: Val::Px(320.0),
                flex_direction: FlexDirection::Column,
                align_items: AlignItems::Center,
                row_gap: Val::Px(8.0),
                padding: UiRect::all(Val::Px(16.0)),
                ..default()
            },
            BackgroundColor(theme.panel_bg),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("3D rendering unavailable"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(theme.warning),
            ));
            parent.spawn((
                Text::new(format!(
                    "{} nodes, {} links loaded",
                    data.nodes.len(),
                    data.links.len()
                )),
                TextFont {
                    font_size: 13.0,
                    ..default()
                },
                TextColor(theme.fg),
            ));
        });
}

// ============================================================================
// Per-frame systems
// ============================================================================

fn step_layout(
    time: Res<Time>,
    mut layout: ResMut<ForceLayout>,
    mut nodes: Query<(&SceneNode, &mut Transform)>,
) {
    layout.step(time.delta_secs().min(0.05));
    for (node, mut transform) in nodes.iter_mut() {
        if let Some(position) = layout.positions.get(node.index) {
            transform.translation = *position;
        }
    }
}

/// Draw every link as a gizmo line; stronger links render brighter.
fn draw_links(layout: Res<ForceLayout>, theme: Res<Theme>, mut gizmos: Gizmos) {
    let max_value = layout
        .edges
        .iter()
        .map(|edge| edge.value)
        .fold(1.0_f32, f32::max);

    for edge in &layout.edges {
        let (Some(a), Some(b)) = (
            layout.positions.get(edge.a),
            layout.positions.get(edge.b),
        ) else {
            continue;
        };
        let strength = (edge.value / max_value).clamp(0.0, 1.0);
        let color = theme
            .link_type_color(&edge.link_type)
            .with_alpha(0.25 + 0.55 * strength);
        gizmos.line(*a, *b, color);
    }
}

fn update_node_labels(
    layout: Res<ForceLayout>,
    cameras: Query<(&Camera, &GlobalTransform), With<ShellCamera>>,
    mut labels: Query<(&NodeLabel, &mut Node, &mut Visibility)>,
) {
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };
    for (label, mut node, mut visibility) in labels.iter_mut() {
        let Some(position) = layout.positions.get(label.index) else {
            *visibility = Visibility::Hidden;
            continue;
        };
        let world = *position + Vec3::Y * 2.8;
        match camera.world_to_viewport(camera_transform, world) {
            Ok(screen) => {
                node.left = Val::Px(screen.x - 30.0);
                node.top = Val::Px(screen.y);
                *visibility = Visibility::Inherited;
            }
            Err(_) => *visibility = Visibility::Hidden,
        }
    }
}

/// Reposition link-type labels at the current edge midpoints.
fn update_link_labels(
    layout: Res<ForceLayout>,
    cameras: Query<(&Camera, &GlobalTransform), With<ShellCamera>>,
    mut labels: Query<(&LinkLabel, &mut Node, &mut Visibility), Without<NodeLabel>>,
) {
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };
    for (label, mut node, mut visibility) in labels.iter_mut() {
        let Some(edge) = layout.edges.get(label.index) else {
            *visibility = Visibility::Hidden;
            continue;
        };
        let (Some(a), Some(b)) = (
            layout.positions.get(edge.a),
            layout.positions.get(edge.b),
        ) else {
            *visibility = Visibility::Hidden;
            continue;
        };
        let midpoint = (*a + *b) * 0.5;
        match camera.world_to_viewport(camera_transform, midpoint) {
            Ok(screen) => {
                node.left = Val::Px(screen.x - 20.0);
                node.top = Val::Px(screen.y);
                *visibility = Visibility::Inherited;
            }
            Err(_) => *visibility = Visibility::Hidden,
        }
    }
}
