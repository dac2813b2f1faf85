//! Scene lighting.
//!
//! Ambient fill plus a directional key light plus three point lights.
//! The point lights pulse sinusoidally every frame, and two of them
//! orbit the graph. Animation runs in `Update` off `Res<Time>` and only
//! while the scene view is active.

use bevy::prelude::*;

use super::SceneEntity;

/// Per-light animation parameters.
#[derive(Component)]
pub struct AnimatedLight {
    pub base_intensity: f32,
    /// Pulse phase offset in radians.
    pub phase: f32,
    pub pulse_speed: f32,
    /// Orbit radius; `None` keeps the light in place.
    pub orbit_radius: Option<f32>,
    pub orbit_speed: f32,
    pub height: f32,
}

pub fn spawn_lights(commands: &mut Commands) {
    commands.insert_resource(GlobalAmbientLight {
        color: Color::WHITE,
        brightness: 120.0,
        ..default()
    });

    commands.spawn((
        SceneEntity,
        Name::new("KeyLight"),
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(30.0, 50.0, 30.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let accents = [
        // (color, phase, orbit radius)
        (Color::srgb(0.45, 0.60, 1.00), 0.0, Some(40.0)),
        (Color::srgb(1.00, 0.55, 0.45), 2.1, Some(52.0)),
        (Color::srgb(0.55, 1.00, 0.70), 4.2, None),
    ];
    for (i, (color, phase, orbit_radius)) in accents.into_iter().enumerate() {
        commands.spawn((
            SceneEntity,
            Name::new(format!("AccentLight{i}")),
            PointLight {
                color,
                intensity: 600_000.0,
                range: 140.0,
                shadows_enabled: false,
                ..default()
            },
            AnimatedLight {
                base_intensity: 600_000.0,
                phase,
                pulse_speed: 0.8 + i as f32 * 0.3,
                orbit_radius,
                orbit_speed: 0.25 + i as f32 * 0.1,
                height: 18.0 - i as f32 * 12.0,
            },
            Transform::from_xyz(0.0, 18.0, orbit_radius.unwrap_or(35.0)),
        ));
    }
}

pub fn animate_lights(
    time: Res<Time>,
    mut lights: Query<(&AnimatedLight, &mut PointLight, &mut Transform)>,
) {
    let t = time.elapsed_secs();
    for (anim, mut light, mut transform) in lights.iter_mut() {
        let pulse = 0.7 + 0.3 * (t * anim.pulse_speed + anim.phase).sin();
        light.intensity = anim.base_intensity * pulse;

        if let Some(radius) = anim.orbit_radius {
            let angle = t * anim.orbit_speed + anim.phase;
            transform.translation =
                Vec3::new(radius * angle.cos(), anim.height, radius * angle.sin());
        }
    }
}
