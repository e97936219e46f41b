//! User input
//!
//! Whatever owns the window pushes events through an [`InputQueue`]; the
//! render loop drains it once per tick.

use crossbeam_channel::{Receiver, Sender};
use glam::Vec2;

use crate::channel::{Channel, ChannelId};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A printable key was pressed
    Key(char),
    /// Pointer position in canvas pixels
    PointerMoved { x: f32, y: f32 },
}

impl InputEvent {
    pub fn pointer(position: Vec2) -> Self {
        InputEvent::PointerMoved {
            x: position.x,
            y: position.y,
        }
    }
}

/// Unbounded event queue between the window and the render loop
#[derive(Debug, Clone)]
pub struct InputQueue {
    tx: Sender<InputEvent>,
    rx: Receiver<InputEvent>,
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InputQueue {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    /// Handle for producers
    pub fn sender(&self) -> Sender<InputEvent> {
        self.tx.clone()
    }

    pub fn push(&self, event: InputEvent) {
        // The queue owns a receiver, so the send cannot fail
        let _ = self.tx.send(event);
    }

    /// Every event queued since the last drain, oldest first
    pub fn drain(&self) -> Vec<InputEvent> {
        self.rx.try_iter().collect()
    }
}

/// Apply a key press as a manual override on the first channel that binds
/// it. The target is set and progress restarts without consulting the gate.
pub fn manual_override(channels: &[Channel], key: char) -> Option<(ChannelId, String)> {
    channels.iter().find_map(|channel| {
        let theme_key = channel.binding_for(key)?.to_string();
        channel.handle.force_target(theme_key.clone());
        tracing::info!(channel = %channel.id, key = %key, target = %theme_key, "Manual override");
        Some((channel.id, theme_key))
    })
}
