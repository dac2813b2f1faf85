//! Camera focus and click picking for the 3D scene.
//!
//! Picking is a manual ray cast against the node spheres; no picking
//! plugin. Clicking a node starts an eased camera tween toward a
//! viewpoint behind the node along its radial direction.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use super::SceneNode;
use crate::theme::Theme;
use crate::ui::events::NodeSelected;
use crate::ui::ShellCamera;

/// Seconds the focus tween takes.
const FOCUS_DURATION: f32 = 0.6;

/// In-flight camera tween. Removed when it completes.
#[derive(Resource)]
pub struct CameraFocus {
    pub from: Vec3,
    pub to: Vec3,
    pub look_at: Vec3,
    pub elapsed: f32,
}

/// Ray/sphere intersection; returns the nearest positive hit distance.
pub fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    let t = -b - sqrt_disc;
    if t >= 0.0 {
        return Some(t);
    }
    let t = -b + sqrt_disc;
    (t >= 0.0).then_some(t)
}

/// Viewpoint for focusing a node: stay on the origin-to-node axis,
/// `distance` beyond the node, looking back at it. Nodes at the origin
/// get an arbitrary fixed direction.
pub fn focus_position(node_pos: Vec3, distance: f32) -> Vec3 {
    let dir = if node_pos.length_squared() > 1e-6 {
        node_pos.normalize()
    } else {
        Vec3::Z
    };
    node_pos + dir * distance
}

/// Left click: cast a ray through the cursor and pick the nearest
/// sphere. Emits [`NodeSelected`] and starts the focus tween.
pub fn handle_scene_click(
    mut commands: Commands,
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform, &Transform), With<ShellCamera>>,
    nodes: Query<(&SceneNode, &Transform), Without<ShellCamera>>,
    theme: Res<Theme>,
    mut selections: MessageWriter<NodeSelected>,
) {
    if !buttons.just_pressed(MouseButton::Left) {
        return;
    }
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    let Ok((camera, camera_global, camera_transform)) = cameras.single() else {
        return;
    };
    let Ok(ray) = camera.viewport_to_world(camera_global, cursor) else {
        return;
    };

    let dir: Vec3 = ray.direction.into();
    let mut best: Option<(f32, &SceneNode, Vec3)> = None;
    for (node, transform) in nodes.iter() {
        if let Some(t) = ray_sphere(ray.origin, dir, transform.translation, node.radius) {
            if best.as_ref().is_none_or(|(bt, _, _)| t < *bt) {
                best = Some((t, node, transform.translation));
            }
        }
    }

    let Some((_, node, position)) = best else {
        return;
    };

    debug!(node_id = %node.id, "scene pick");
    selections.write(NodeSelected {
        node_id: node.id.clone(),
    });
    commands.insert_resource(CameraFocus {
        from: camera_transform.translation,
        to: focus_position(position, theme.camera_view_distance * 0.5),
        look_at: position,
        elapsed: 0.0,
    });
}

/// Advance the focus tween with a smoothstep ease.
pub fn tween_camera(
    mut commands: Commands,
    time: Res<Time>,
    focus: Option<ResMut<CameraFocus>>,
    mut cameras: Query<&mut Transform, With<ShellCamera>>,
) {
    let Some(mut focus) = focus else {
        return;
    };
    let Ok(mut transform) = cameras.single_mut() else {
        return;
    };

    focus.elapsed += time.delta_secs();
    let t = (focus.elapsed / FOCUS_DURATION).clamp(0.0, 1.0);
    let eased = t * t * (3.0 - 2.0 * t);

    transform.translation = focus.from.lerp(focus.to, eased);
    transform.look_at(focus.look_at, Vec3::Y);

    if t >= 1.0 {
        commands.remove_resource::<CameraFocus>();
    }
}

// ============================================================================
// Tests
// ============================================================================
