//! Rendering query over a channel's transition state

use super::state::ChannelState;
use crate::theme::{Theme, ThemeRegistry};

/// Progress at which texture and display name flip to the target theme.
/// Color blends continuously over the whole transition.
pub const DISCRETE_SWITCH_AT: f32 = 0.5;

/// Theme to draw for `state` right now.
///
/// Stable channels return the committed theme. Transitioning channels
/// interpolate RGB from current to target by `progress`; the texture tag,
/// key and display name switch discretely at [`DISCRETE_SWITCH_AT`].
pub fn blended_theme(registry: &ThemeRegistry, state: &ChannelState) -> Theme {
    let from = registry.lookup(state.current_key());
    if state.is_stable() {
        return from.clone();
    }

    let to = registry.lookup(state.target_key());
    let t = state.progress();
    let discrete = if t >= DISCRETE_SWITCH_AT { to } else { from };

    Theme {
        key: discrete.key.clone(),
        display_name: discrete.display_name.clone(),
        color: from.color.lerp(to.color, t),
        texture: discrete.texture,
    }
}
