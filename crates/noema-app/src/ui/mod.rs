//! View shell: the four projection views plus the chrome around them.
//!
//! The shell owns the single camera, the status bar, the view-switch
//! keys, and the shared selection messages. Each view is its own
//! plugin gated on [`state::ViewMode`].

use bevy::prelude::*;

use crate::snapshot::GraphSnapshot;
use crate::theme::Theme;

pub mod events;
pub mod hierarchy;
pub mod matrix;
pub mod scene;
pub mod state;
pub mod timeline;

use events::{NodeSelected, RenderFallback};
use state::ViewMode;

/// Root plugin for the whole UI.
pub struct ViewShellPlugin;

impl Plugin for ViewShellPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<ViewMode>()
            .init_resource::<state::InputCapture>();

        app.add_message::<events::NodeSelected>()
            .add_message::<events::CellClicked>()
            .add_message::<events::NodeToggled>()
            .add_message::<events::ThresholdChanged>()
            .add_message::<events::PeriodSelected>()
            .add_message::<events::ZoomChanged>()
            .add_message::<events::PlayToggled>()
            .add_message::<events::RenderFallback>();

        app.add_plugins((
            scene::ScenePlugin,
            hierarchy::HierarchyViewPlugin,
            matrix::MatrixViewPlugin,
            timeline::TimelineViewPlugin,
        ));

        app.add_systems(Startup, (spawn_camera, spawn_status_bar))
            .add_systems(
                Update,
                (
                    state::handle_view_keys,
                    update_mode_text,
                    update_selection_summary,
                    show_fallback_notice,
                ),
            );
    }
}

// ============================================================================
// Camera
// ============================================================================

/// The one camera. The scene view moves it; the other views only use
/// it as the UI render target.
#[derive(Component)]
pub struct ShellCamera;

fn spawn_camera(mut commands: Commands, theme: Res<Theme>) {
    commands.spawn((
        ShellCamera,
        Name::new("ShellCamera"),
        Camera3d::default(),
        Camera {
            clear_color: ClearColorConfig::Custom(theme.bg),
            ..default()
        },
        Transform::from_xyz(0.0, 18.0, 60.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

// ============================================================================
// Status bar
// ============================================================================

#[derive(Component)]
struct ModeText;

#[derive(Component)]
struct SelectionText;

fn spawn_status_bar(mut commands: Commands, theme: Res<Theme>) {
    commands
        .spawn((
            Name::new("StatusBar"),
            Node {
                position_type: PositionType::Absolute,
                bottom: Val::Px(0.0),
                left: Val::Px(0.0),
                width: Val::Percent(100.0),
                height: Val::Px(28.0),
                flex_direction: FlexDirection::Row,
                align_items: AlignItems::Center,
                justify_content: JustifyContent::SpaceBetween,
                padding: UiRect::horizontal(Val::Px(12.0)),
                ..default()
            },
            BackgroundColor(theme.panel_bg.with_alpha(0.95)),
            ZIndex(100),
        ))
        .with_children(|parent| {
            parent.spawn((
                ModeText,
                Text::new(mode_line(ViewMode::default())),
                TextFont {
                    font_size: 12.0,
                    ..default()
                },
                TextColor(theme.fg),
            ));
            parent.spawn((
                SelectionText,
                Text::new("nothing selected"),
                TextFont {
                    font_size: 12.0,
                    ..default()
                },
                TextColor(theme.fg_dim),
            ));
        });
}

fn mode_line(mode: ViewMode) -> String {
    format!("[{}]  1-4 views | F5 reload", mode.label())
}

fn update_mode_text(
    mode: Res<State<ViewMode>>,
    mut query: Query<&mut Text, With<ModeText>>,
) {
    if !mode.is_changed() {
        return;
    }
    for mut text in query.iter_mut() {
        text.0 = mode_line(*mode.get());
    }
}

/// Show id, name, type, and degree of the last selected node.
fn update_selection_summary(
    mut selections: MessageReader<NodeSelected>,
    snapshot: Res<GraphSnapshot>,
    theme: Res<Theme>,
    mut query: Query<(&mut Text, &mut TextColor), With<SelectionText>>,
) {
    let Some(selected) = selections.read().last() else {
        return;
    };

    let data = snapshot.data();
    let line = match data.node_by_id(&selected.node_id) {
        Some(node) => {
            let degree = data
                .adjacency()
                .get(node.id.as_str())
                .map(|n| n.len())
                .unwrap_or(0);
            format!(
                "{} ({}) - {} link{}  [{}]",
                node.name,
                node.node_type,
                degree,
                if degree == 1 { "" } else { "s" },
                node.id
            )
        }
        None => format!("unknown node: {}", selected.node_id),
    };

    for (mut text, mut color) in query.iter_mut() {
        text.0 = line.clone();
        color.0 = theme.fg;
    }
}

fn show_fallback_notice(
    mut fallbacks: MessageReader<RenderFallback>,
    theme: Res<Theme>,
    mut query: Query<(&mut Text, &mut TextColor), With<SelectionText>>,
) {
    let Some(fallback) = fallbacks.read().last() else {
        return;
    };
    warn!(reason = %fallback.reason, "3D scene unavailable, showing summary");
    for (mut text, mut color) in query.iter_mut() {
        text.0 = format!("3D rendering unavailable: {}", fallback.reason);
        color.0 = theme.warning;
    }
}
