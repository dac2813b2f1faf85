//! Timeline view.
//!
//! One horizontal band per node type, nodes positioned on a shared
//! time axis. `D`/`W`/`M`/`A` pick a period preset, `+`/`-` zoom, and
//! `Space` toggles playback: a repeating timer advances a cursor
//! across the axis, wrapping at the end. The timer resource only
//! exists while playing and is removed on view exit.

use bevy::prelude::*;

use noema_graph::{build_bands, now_millis, PeriodPreset, TimeScale, TimelineBand};

use crate::snapshot::GraphSnapshot;
use crate::theme::Theme;
use crate::ui::events::{NodeSelected, PeriodSelected, PlayToggled, ZoomChanged};
use crate::ui::state::{InputCapture, ViewMode};

const TRACK_WIDTH: f32 = 900.0;
const LABEL_PX: f32 = 110.0;
const DOT_PX: f32 = 10.0;
const ROW_PX: f32 = 26.0;

/// Playback advances by this much progress per tick.
const PLAYBACK_STEP: f32 = 0.005;
const PLAYBACK_TICK_SECS: f32 = 0.05;

const MIN_ZOOM: f32 = 0.25;
const MAX_ZOOM: f32 = 8.0;

#[derive(Resource)]
pub struct TimelineView {
    bands: Vec<TimelineBand>,
    scale: TimeScale,
    preset: PeriodPreset,
    zoom: f32,
    playing: bool,
    progress: f32,
    now: i64,
    generation: u64,
    dirty: bool,
}

impl Default for TimelineView {
    fn default() -> Self {
        Self {
            bands: Vec::new(),
            scale: TimeScale::from_bands(&[], None, 0),
            preset: PeriodPreset::default(),
            zoom: 1.0,
            playing: false,
            progress: 0.0,
            now: 0,
            generation: 0,
            dirty: false,
        }
    }
}

/// Exists only while playback runs.
#[derive(Resource)]
pub struct PlaybackTicker(pub Timer);

#[derive(Component)]
struct TimelineRoot;

#[derive(Component)]
struct StatusLine;

#[derive(Component)]
struct BandsContainer;

#[derive(Component)]
struct BandEntry;

#[derive(Component)]
struct NodeDot {
    node_id: String,
}

#[derive(Component)]
struct Cursor;

pub struct TimelineViewPlugin;

impl Plugin for TimelineViewPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TimelineView>()
            .add_systems(OnEnter(ViewMode::Timeline), enter_timeline)
            .add_systems(OnExit(ViewMode::Timeline), exit_timeline)
            .add_systems(
                Update,
                (
                    sync_with_snapshot,
                    handle_keys,
                    handle_dot_clicks,
                    tick_playback,
                    refresh_bands,
                )
                    .chain()
                    .run_if(in_state(ViewMode::Timeline)),
            );
    }
}

fn enter_timeline(
    mut commands: Commands,
    snapshot: Res<GraphSnapshot>,
    theme: Res<Theme>,
    mut view: ResMut<TimelineView>,
) {
    view.now = now_millis();
    view.bands = build_bands(snapshot.data(), view.now);
    view.scale = TimeScale::from_bands(&view.bands, view.preset.range(view.now), view.now);
    view.generation = snapshot.generation();
    view.playing = false;
    view.progress = 0.0;
    view.dirty = true;

    commands
        .spawn((
            TimelineRoot,
            Name::new("TimelinePanel"),
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
                    "Timeline  |  Space: play  D/W/M/A: period  +/-: zoom",
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
            parent
                .spawn((
                    BandsContainer,
                    Node {
                        flex_direction: FlexDirection::Column,
                        overflow: Overflow::clip(),
                        flex_grow: 1.0,
                        ..default()
                    },
                ))
                .with_children(|container| {
                    container.spawn((
                        Cursor,
                        Node {
                            position_type: PositionType::Absolute,
                            left: Val::Px(LABEL_PX),
                            top: Val::Px(0.0),
                            width: Val::Px(2.0),
                            height: Val::Percent(100.0),
                            ..default()
                        },
                        BackgroundColor(theme.accent.with_alpha(0.8)),
                        ZIndex(5),
                        Visibility::Hidden,
                    ));
                });
        });
}

fn exit_timeline(
    mut commands: Commands,
    roots: Query<Entity, With<TimelineRoot>>,
    mut view: ResMut<TimelineView>,
) {
    for entity in roots.iter() {
        commands.entity(entity).despawn();
    }
    // Timer must not outlive the view.
    commands.remove_resource::<PlaybackTicker>();
    view.playing = false;
}

fn sync_with_snapshot(snapshot: Res<GraphSnapshot>, mut view: ResMut<TimelineView>) {
    if view.generation == snapshot.generation() {
        return;
    }
    view.now = now_millis();
    view.bands = build_bands(snapshot.data(), view.now);
    view.scale = TimeScale::from_bands(&view.bands, view.preset.range(view.now), view.now);
    view.generation = snapshot.generation();
    view.dirty = true;
}

#[allow(clippy::too_many_arguments)]
fn handle_keys(
    mut commands: Commands,
    keys: Res<ButtonInput<KeyCode>>,
    capture: Res<InputCapture>,
    mut view: ResMut<TimelineView>,
    mut plays: MessageWriter<PlayToggled>,
    mut periods: MessageWriter<PeriodSelected>,
    mut zooms: MessageWriter<ZoomChanged>,
) {
    if capture.0 {
        return;
    }

    if keys.just_pressed(KeyCode::Space) {
        view.playing = !view.playing;
        if view.playing {
            commands.insert_resource(PlaybackTicker(Timer::from_seconds(
                PLAYBACK_TICK_SECS,
                TimerMode::Repeating,
            )));
        } else {
            commands.remove_resource::<PlaybackTicker>();
        }
        plays.write(PlayToggled(view.playing));
        view.dirty = true;
    }

    let preset = if keys.just_pressed(KeyCode::KeyD) {
        Some(PeriodPreset::Day)
    } else if keys.just_pressed(KeyCode::KeyW) {
        Some(PeriodPreset::Week)
    } else if keys.just_pressed(KeyCode::KeyM) {
        Some(PeriodPreset::Month)
    } else if keys.just_pressed(KeyCode::KeyA) {
        Some(PeriodPreset::All)
    } else {
        None
    };
    if let Some(preset) = preset {
        view.preset = preset;
        view.scale = TimeScale::from_bands(&view.bands, preset.range(view.now), view.now);
        view.progress = 0.0;
        view.dirty = true;
        periods.write(PeriodSelected(preset));
    }

    let zoom_factor = if keys.just_pressed(KeyCode::Equal)
        || keys.just_pressed(KeyCode::NumpadAdd)
    {
        Some(1.25)
    } else if keys.just_pressed(KeyCode::Minus) || keys.just_pressed(KeyCode::NumpadSubtract) {
        Some(0.8)
    } else {
        None
    };
    if let Some(factor) = zoom_factor {
        let next = clamp_zoom(view.zoom * factor);
        if (next - view.zoom).abs() > f32::EPSILON {
            view.zoom = next;
            view.dirty = true;
            zooms.write(ZoomChanged(next));
        }
    }
}

fn handle_dot_clicks(
    interactions: Query<(&Interaction, &NodeDot), (Changed<Interaction>, With<Button>)>,
    mut selections: MessageWriter<NodeSelected>,
) {
    for (interaction, dot) in interactions.iter() {
        if *interaction == Interaction::Pressed {
            selections.write(NodeSelected {
                node_id: dot.node_id.clone(),
            });
        }
    }
}

/// Advance the playback cursor while the ticker exists.
fn tick_playback(
    time: Res<Time>,
    ticker: Option<ResMut<PlaybackTicker>>,
    mut view: ResMut<TimelineView>,
    mut cursors: Query<(&mut Node, &mut Visibility), With<Cursor>>,
    mut status_lines: Query<&mut Text, With<StatusLine>>,
) {
    let Some(mut ticker) = ticker else {
        return;
    };
    ticker.0.tick(time.delta());
    if !ticker.0.just_finished() {
        return;
    }

    view.progress = advance_progress(view.progress, PLAYBACK_STEP);

    let (progress, zoom) = (view.progress, view.zoom);
    for (mut node, mut visibility) in cursors.iter_mut() {
        node.left = Val::Px(LABEL_PX + progress * TRACK_WIDTH * zoom);
        *visibility = Visibility::Inherited;
    }
    for mut text in status_lines.iter_mut() {
        text.0 = status_line(&view);
    }
}

fn refresh_bands(
    mut commands: Commands,
    mut view: ResMut<TimelineView>,
    theme: Res<Theme>,
    containers: Query<Entity, With<BandsContainer>>,
    entries: Query<Entity, With<BandEntry>>,
    mut cursors: Query<&mut Visibility, With<Cursor>>,
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
    for mut visibility in cursors.iter_mut() {
        *visibility = if view.playing {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
    }
    for mut text in status_lines.iter_mut() {
        text.0 = status_line(&view);
    }

    if view.bands.is_empty() {
        commands.entity(container).with_children(|parent| {
            parent.spawn((
                BandEntry,
                Text::new("no nodes on the timeline"),
                TextFont {
                    font_size: 13.0,
                    ..default()
                },
                TextColor(theme.fg_dim),
            ));
        });
        return;
    }

    let track_px = TRACK_WIDTH * view.zoom;
    commands.entity(container).with_children(|parent| {
        for band in &view.bands {
            let [r, g, b] = band.color;
            let band_color = Color::srgb(r, g, b);
            parent
                .spawn((
                    BandEntry,
                    Node {
                        flex_direction: FlexDirection::Row,
                        align_items: AlignItems::Center,
                        height: Val::Px(ROW_PX),
                        ..default()
                    },
                ))
                .with_children(|row| {
                    row.spawn((
                        Node {
                            width: Val::Px(LABEL_PX),
                            ..default()
                        },
                        Text::new(format!("{} ({})", band.label, band.nodes.len())),
                        TextFont {
                            font_size: 12.0,
                            ..default()
                        },
                        TextColor(band_color),
                    ));
                    row.spawn((
                        Node {
                            width: Val::Px(track_px),
                            height: Val::Px(ROW_PX - 8.0),
                            ..default()
                        },
                        BackgroundColor(band_color.with_alpha(0.10)),
                    ))
                    .with_children(|track| {
                        for node in &band.nodes {
                            let x = view.scale.position(node.timestamp, TRACK_WIDTH, view.zoom);
                            if !(0.0..=track_px).contains(&x) {
                                continue;
                            }
                            track.spawn((
                                NodeDot {
                                    node_id: node.id.clone(),
                                },
                                Button,
                                Node {
                                    position_type: PositionType::Absolute,
                                    left: Val::Px(x - DOT_PX / 2.0),
                                    top: Val::Px((ROW_PX - 8.0 - DOT_PX) / 2.0),
                                    width: Val::Px(DOT_PX),
                                    height: Val::Px(DOT_PX),
                                    border_radius: BorderRadius::all(Val::Percent(50.0)),
                                    ..default()
                                },
                                BackgroundColor(band_color),
                            ));
                        }
                    });
                });
        }
    });
}

// ============================================================================
// Helpers
// ============================================================================

fn advance_progress(progress: f32, step: f32) -> f32 {
    let next = progress + step;
    if next >= 1.0 {
        next - 1.0
    } else {
        next
    }
}

fn clamp_zoom(zoom: f32) -> f32 {
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

fn format_millis(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}

fn status_line(view: &TimelineView) -> String {
    let playback = if view.playing {
        format!("playing @ {}", format_millis(view.scale.cursor_time(view.progress)))
    } else {
        "paused".to_string()
    };
    format!(
        "period: {}  |  zoom: {:.2}x  |  {}  |  {} .. {}",
        view.preset.label(),
        view.zoom,
        playback,
        format_millis(view.scale.start),
        format_millis(view.scale.end),
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_progress_wraps() {
        assert!((advance_progress(0.0, 0.005) - 0.005).abs() < 1e-6);
        let wrapped = advance_progress(0.998, 0.005);
        assert!(wrapped < 0.005, "expected wrap, got {wrapped}");
    }

    #[test]
    fn test_clamp_zoom_bounds() {
        assert_eq!(clamp_zoom(0.01), MIN_ZOOM);
        assert_eq!(clamp_zoom(1.0), 1.0);
        assert_eq!(clamp_zoom(100.0), MAX_ZOOM);
    }

    #[test]
    fn test_format_millis_renders_utc() {
        assert_eq!(format_millis(0), "1970-01-01 00:00");
    }
}
