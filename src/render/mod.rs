//! Drawing
//!
//! The render surface is a collaborator: it only knows its size and how to
//! paint a handful of primitives. Everything the visualization shows is
//! expressed through [`Primitive`] and [`Style`].

pub mod hud;
pub mod shapes;

use glam::Vec2;

use crate::particles::ParticleSystem;
use crate::theme::Theme;

pub use shapes::{routine_for, DrawRoutine, Sprite};

/// RGBA color, components in 0.0-1.0
pub type Rgba = [f32; 4];

/// Geometry in canvas pixels
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Ellipse centered at `center` with full diameters `size`, rotated by `rotation` radians
    Ellipse {
        center: Vec2,
        size: Vec2,
        rotation: f32,
    },
    /// Axis-aligned rectangle from its top-left corner
    Rect {
        origin: Vec2,
        size: Vec2,
        corner_radius: f32,
    },
    /// Closed polygon
    Polygon { points: Vec<Vec2> },
    Line { from: Vec2, to: Vec2 },
    /// Open elliptical arc between two angles, stroke only
    Arc {
        center: Vec2,
        size: Vec2,
        rotation: f32,
        start: f32,
        end: f32,
    },
    Text {
        position: Vec2,
        content: String,
        font_size: f32,
    },
}

/// Fill and stroke for a primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    pub fill: Option<Rgba>,
    pub stroke: Option<Rgba>,
    pub stroke_width: f32,
}

impl Style {
    pub fn filled(color: Rgba) -> Self {
        Self {
            fill: Some(color),
            stroke: None,
            stroke_width: 0.0,
        }
    }

    pub fn stroked(color: Rgba, width: f32) -> Self {
        Self {
            fill: None,
            stroke: Some(color),
            stroke_width: width,
        }
    }

    pub fn with_stroke(mut self, color: Rgba, width: f32) -> Self {
        self.stroke = Some(color);
        self.stroke_width = width;
        self
    }
}

/// Something that can be drawn on
pub trait RenderSurface {
    /// Canvas size in pixels
    fn size(&self) -> Vec2;

    fn draw(&mut self, primitive: &Primitive, style: &Style);
}

/// Translucent black wash over the whole canvas; leaves short trails
pub fn fade_background(surface: &mut dyn RenderSurface) {
    let size = surface.size();
    surface.draw(
        &Primitive::Rect {
            origin: Vec2::ZERO,
            size,
            corner_radius: 0.0,
        },
        &Style::filled([0.0, 0.0, 0.0, 25.0 / 255.0]),
    );
}

/// Draw every particle of a pool with one theme
pub fn draw_particles(surface: &mut dyn RenderSurface, system: &ParticleSystem, theme: &Theme) {
    let routine = routine_for(theme.texture);
    let initial_life = system.params().initial_life;
    for particle in system.particles() {
        let sprite = Sprite {
            position: particle.position,
            size: particle.size,
            rotation: particle.rotation,
            color: theme.color,
            alpha: particle.alpha(initial_life),
        };
        routine(surface, &sprite);
    }
}
