//! Particle shapes, one draw routine per texture
//!
//! Routines work in the particle's local frame (origin at its position,
//! rotated by its rotation) and emit canvas-space primitives.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec2;

use super::{Primitive, RenderSurface, Rgba, Style};
use crate::theme::{Rgb, TextureTag};

/// Everything a routine needs to draw one particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub position: Vec2,
    pub size: f32,
    pub rotation: f32,
    pub color: Rgb,
    /// Opacity from remaining life (0.0-1.0)
    pub alpha: f32,
}

impl Sprite {
    /// Local point to canvas space
    fn at(&self, local: Vec2) -> Vec2 {
        self.position + Vec2::from_angle(self.rotation).rotate(local)
    }

    fn points(&self, local: &[Vec2]) -> Vec<Vec2> {
        local.iter().map(|p| self.at(*p)).collect()
    }

    fn ellipse(&self, offset: Vec2, size: Vec2) -> Primitive {
        Primitive::Ellipse {
            center: self.at(offset),
            size,
            rotation: self.rotation,
        }
    }

    fn line(&self, from: Vec2, to: Vec2) -> Primitive {
        Primitive::Line {
            from: self.at(from),
            to: self.at(to),
        }
    }

    /// Body fill with a darker outline
    fn body_style(&self) -> Style {
        Style::filled(self.color.to_rgba_f32(self.alpha * 200.0 / 255.0))
            .with_stroke(self.color.scaled(0.8).to_rgba_f32(self.alpha), 1.0)
    }

    fn tint(&self, color: [u8; 3], opacity: f32) -> Rgba {
        Rgb(color).to_rgba_f32(self.alpha * opacity)
    }
}

/// Draws one particle
pub type DrawRoutine = fn(&mut dyn RenderSurface, &Sprite);

/// Draw routine for a texture
pub fn routine_for(texture: TextureTag) -> DrawRoutine {
    match texture {
        TextureTag::Basic | TextureTag::Sharp | TextureTag::Creamy => draw_basic,
        TextureTag::Holey => draw_holey,
        TextureTag::Veiny => draw_veiny,
        TextureTag::Herby => draw_herby,
        TextureTag::Stretchy => draw_stretchy,
        TextureTag::Granular => draw_granular,
        TextureTag::Wedge => draw_wedge,
        TextureTag::Brie => draw_brie,
        TextureTag::SmoothSlice => draw_smooth_slice,
    }
}

fn draw_basic(surface: &mut dyn RenderSurface, s: &Sprite) {
    let h = s.size / 2.0;
    let q = s.size / 4.0;
    let points = s.points(&[Vec2::new(0.0, -h), Vec2::new(h, q), Vec2::new(0.0, h), Vec2::new(-h, q)]);
    surface.draw(&Primitive::Polygon { points }, &s.body_style());
}

fn draw_holey(surface: &mut dyn RenderSurface, s: &Sprite) {
    surface.draw(&s.ellipse(Vec2::ZERO, Vec2::splat(s.size)), &s.body_style());
    let hole = Style::filled(s.tint([50, 50, 50], 1.0));
    surface.draw(
        &s.ellipse(Vec2::new(-s.size / 4.0, -s.size / 6.0), Vec2::splat(s.size / 5.0)),
        &hole,
    );
    surface.draw(
        &s.ellipse(Vec2::new(s.size / 4.0, s.size / 6.0), Vec2::splat(s.size / 6.0)),
        &hole,
    );
}

fn draw_veiny(surface: &mut dyn RenderSurface, s: &Sprite) {
    let h = s.size / 2.0;
    let block = s.points(&[Vec2::new(-h, -h), Vec2::new(h, -h), Vec2::new(h, h), Vec2::new(-h, h)]);
    surface.draw(&Primitive::Polygon { points: block }, &s.body_style());

    let vein = Style::stroked(s.tint([100, 100, 200], 0.8), 2.0);
    let t = s.size / 3.0;
    surface.draw(&s.line(Vec2::new(-t, -t), Vec2::new(t, t)), &vein);
    surface.draw(&s.line(Vec2::new(t, -t), Vec2::new(-t, t)), &vein);
}

fn draw_herby(surface: &mut dyn RenderSurface, s: &Sprite) {
    surface.draw(&s.ellipse(Vec2::ZERO, Vec2::splat(s.size)), &s.body_style());
    let fleck = Style::filled(s.tint([50, 100, 50], 1.0));
    surface.draw(&s.ellipse(Vec2::new(-s.size / 3.0, 0.0), Vec2::splat(s.size / 8.0)), &fleck);
    surface.draw(
        &s.ellipse(Vec2::new(s.size / 4.0, -s.size / 4.0), Vec2::splat(s.size / 10.0)),
        &fleck,
    );
}

fn draw_stretchy(surface: &mut dyn RenderSurface, s: &Sprite) {
    surface.draw(&s.ellipse(Vec2::ZERO, Vec2::new(s.size, s.size * 0.6)), &s.body_style());
    let t = s.size / 3.0;
    surface.draw(
        &s.line(Vec2::new(-t, 0.0), Vec2::new(t, 0.0)),
        &Style::stroked(s.tint([255, 255, 255], 0.6), 1.0),
    );
}

/// Shards fan out around the particle; count and length derive from its
/// size and rotation so a particle keeps its shape from frame to frame.
fn draw_granular(surface: &mut dyn RenderSurface, s: &Sprite) {
    let count = 3 + (s.size.max(0.0) as usize % 3);
    let style = Style::filled(s.color.to_rgba_f32(s.alpha * 200.0 / 255.0));
    for i in 0..count {
        let angle = i as f32 * TAU / count as f32;
        let spread = (i as f32 * 1.7 + s.rotation).sin().abs();
        let r = s.size * (0.2 + 0.4 * spread);
        let turn = Vec2::from_angle(angle);
        let local = [Vec2::ZERO, Vec2::new(r, -r * 0.5), Vec2::new(r * 0.4, r * 0.6)].map(|p| turn.rotate(p));
        surface.draw(&Primitive::Polygon { points: s.points(&local) }, &style);
    }
}

fn draw_wedge(surface: &mut dyn RenderSurface, s: &Sprite) {
    let w = s.size;
    let h = s.size * 0.7;
    let points = s.points(&[
        Vec2::new(-w * 0.5, -h * 0.2),
        Vec2::new(w * 0.4, -h * 0.4),
        Vec2::new(w * 0.5, 0.0),
        Vec2::new(w * 0.4, h * 0.4),
        Vec2::new(-w * 0.5, h * 0.2),
    ]);
    let rind = s.tint([0, 0, 0], 0.8);
    let body = Style::filled(s.color.to_rgba_f32(s.alpha * 200.0 / 255.0)).with_stroke(rind, 1.5);
    surface.draw(&Primitive::Polygon { points }, &body);
    surface.draw(
        &Primitive::Arc {
            center: s.position,
            size: Vec2::new(w * 1.1, h * 1.1),
            rotation: s.rotation,
            start: -FRAC_PI_2,
            end: FRAC_PI_2,
        },
        &Style::stroked(rind, 1.5),
    );
}

fn draw_brie(surface: &mut dyn RenderSurface, s: &Sprite) {
    let w = s.size * 1.1;
    let h = s.size * 0.8;
    let wheel = Style::filled(s.color.to_rgba_f32(s.alpha * 0.8)).with_stroke(s.tint([255, 255, 255], 1.0), 2.0);
    surface.draw(&s.ellipse(Vec2::ZERO, Vec2::new(w, h)), &wheel);
    surface.draw(
        &s.line(Vec2::new(-w * 0.35, 0.0), Vec2::new(w * 0.35, 0.0)),
        &Style::stroked(s.tint([230, 220, 200], 0.7), 1.0),
    );
}

fn draw_smooth_slice(surface: &mut dyn RenderSurface, s: &Sprite) {
    let w = s.size;
    let h = s.size * 0.7;
    let rim = s.tint([220, 210, 160], 0.8);
    let slice = Style::filled(s.color.to_rgba_f32(s.alpha * 0.9)).with_stroke(rim, 1.0);
    surface.draw(&s.ellipse(Vec2::ZERO, Vec2::new(w, h)), &slice);
    surface.draw(
        &s.line(Vec2::new(-w * 0.25, -h * 0.25), Vec2::new(-w * 0.25, h * 0.25)),
        &Style::stroked(rim, 1.0),
    );
}
