//! Theme for the noema viewer.
//!
//! One resource holding every color the views use: base UI chrome,
//! the node-type palette the backend established, link-type line
//! colors, and sizing constants for the 3D scene.

use bevy::prelude::*;

/// Application theme resource.
#[derive(Resource, Clone)]
pub struct Theme {
    // Base UI colors
    pub bg: Color,
    pub panel_bg: Color,
    pub fg: Color,
    pub fg_dim: Color,
    pub accent: Color,
    pub warning: Color,

    // Node type colors (matches the backend's visualization palette)
    pub node_session: Color,
    pub node_thought: Color,
    pub node_entity: Color,
    pub node_tool: Color,
    pub node_unknown: Color,

    // Link type colors
    pub link_contains: Color,
    pub link_mentions: Color,
    pub link_uses_tool: Color,
    pub link_reasoning: Color,
    pub link_default: Color,

    // 3D scene sizing
    pub node_radius: f32,
    pub session_node_radius: f32,
    pub camera_view_distance: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            bg: Color::srgb(0.06, 0.07, 0.10),
            panel_bg: Color::srgb(0.10, 0.11, 0.15),
            fg: Color::srgb(0.85, 0.87, 0.90),
            fg_dim: Color::srgb(0.48, 0.51, 0.58),
            accent: Color::srgb(0.48, 0.64, 0.97),
            warning: Color::srgb(0.89, 0.79, 0.49),

            node_session: Color::srgb_u8(0x4a, 0x90, 0xe2),
            node_thought: Color::srgb_u8(0x35, 0x7a, 0xbd),
            node_entity: Color::srgb_u8(0x50, 0xc8, 0x78),
            node_tool: Color::srgb_u8(0xff, 0x6b, 0x6b),
            node_unknown: Color::srgb_u8(0x88, 0x88, 0x88),

            link_contains: Color::srgb(0.48, 0.64, 0.97),
            link_mentions: Color::srgb(0.31, 0.78, 0.47),
            link_uses_tool: Color::srgb(1.00, 0.42, 0.42),
            link_reasoning: Color::srgb(0.61, 0.43, 0.89),
            link_default: Color::srgb(0.55, 0.55, 0.55),

            node_radius: 1.2,
            session_node_radius: 2.0,
            camera_view_distance: 60.0,
        }
    }
}

impl Theme {
    /// Color for a node type tag.
    pub fn node_type_color(&self, node_type: &str) -> Color {
        match node_type {
            "Session" => self.node_session,
            "Thought" => self.node_thought,
            "Entity" => self.node_entity,
            "Tool" => self.node_tool,
            _ => self.node_unknown,
        }
    }

    /// Line color for a link type tag; gray when unrecognized.
    pub fn link_type_color(&self, link_type: &str) -> Color {
        match link_type {
            "CONTAINS" => self.link_contains,
            "MENTIONS" => self.link_mentions,
            "USES_TOOL" => self.link_uses_tool,
            "REASONING_FLOW" => self.link_reasoning,
            _ => self.link_default,
        }
    }

    /// Sphere radius for a node type (sessions render larger).
    pub fn node_type_radius(&self, node_type: &str) -> f32 {
        if node_type == "Session" {
            self.session_node_radius
        } else {
            self.node_radius
        }
    }
}
