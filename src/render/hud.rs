//! Status overlay: text readouts and transition progress bars

use glam::Vec2;

use super::{Primitive, RenderSurface, Style};
use crate::theme::Rgb;

const BAR_WIDTH: f32 = 200.0;
const BAR_HEIGHT: f32 = 10.0;
const BAR_MARGIN: f32 = 20.0;
const BAR_SPACING: f32 = 20.0;
const LINE_HEIGHT: f32 = 20.0;

/// One progress bar in the top-right corner
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionBar {
    pub label: String,
    /// 0.0-1.0
    pub progress: f32,
    pub color: Rgb,
}

/// Stacked progress bars, right-aligned, one per entry
pub fn draw_transition_bars(surface: &mut dyn RenderSurface, bars: &[TransitionBar]) {
    let x = surface.size().x - BAR_WIDTH - BAR_MARGIN;
    for (i, bar) in bars.iter().enumerate() {
        let y = BAR_MARGIN + i as f32 * BAR_SPACING;
        let progress = if bar.progress.is_nan() { 0.0 } else { bar.progress.clamp(0.0, 1.0) };

        surface.draw(
            &Primitive::Rect {
                origin: Vec2::new(x, y),
                size: Vec2::new(BAR_WIDTH, BAR_HEIGHT),
                corner_radius: 0.0,
            },
            &Style::filled(Rgb::new(100, 100, 100).to_rgba_f32(1.0)),
        );
        surface.draw(
            &Primitive::Rect {
                origin: Vec2::new(x, y),
                size: Vec2::new(BAR_WIDTH * progress, BAR_HEIGHT),
                corner_radius: 0.0,
            },
            &Style::filled(bar.color.to_rgba_f32(1.0)),
        );
        surface.draw(
            &Primitive::Text {
                position: Vec2::new(x, y - 5.0),
                content: bar.label.clone(),
                font_size: 12.0,
            },
            &Style::filled(Rgb::WHITE.to_rgba_f32(1.0)),
        );
    }
}

/// Left-aligned white text lines from the top-left corner
pub fn draw_text_lines(surface: &mut dyn RenderSurface, lines: &[String]) {
    let style = Style::filled(Rgb::WHITE.to_rgba_f32(1.0));
    for (i, line) in lines.iter().enumerate() {
        surface.draw(
            &Primitive::Text {
                position: Vec2::new(10.0, LINE_HEIGHT * (i + 1) as f32),
                content: line.clone(),
                font_size: 14.0,
            },
            &style,
        );
    }
}

/// Headline at the bottom of the canvas
pub fn draw_summary(surface: &mut dyn RenderSurface, text: &str, color: Rgb) {
    let bottom = surface.size().y;
    surface.draw(
        &Primitive::Text {
            position: Vec2::new(10.0, bottom - LINE_HEIGHT),
            content: text.to_string(),
            font_size: 18.0,
        },
        &Style::filled(color.to_rgba_f32(1.0)),
    );
}
