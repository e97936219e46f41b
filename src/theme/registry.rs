//! Theme registry for one visual channel
//!
//! Themes are registered at startup and never change afterwards. Lookups are
//! pure and always produce a fully populated theme: unknown keys fall back to
//! the first registered entry, broken entries are patched with placeholder
//! fields when they are registered.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Rgb, TextureTag, Theme, UNKNOWN_NAME};
use crate::label::normalize;

/// Raw theme entry as written in a theme table or config file.
///
/// Every field except the key is optional so that a malformed entry still
/// deserializes; [`ThemeRegistry::register`] substitutes placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeSpec {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Expected to be `[r, g, b]` with components in 0-255
    #[serde(default)]
    pub color: Option<serde_json::Value>,
    #[serde(default)]
    pub texture: Option<String>,
}

impl ThemeSpec {
    pub fn new(key: &str, name: &str, color: [u8; 3], texture: TextureTag) -> Self {
        Self {
            key: key.to_string(),
            name: Some(name.to_string()),
            color: Some(serde_json::json!(color)),
            texture: Some(texture.as_str().to_string()),
        }
    }

    /// Validate into a theme, patching any missing or malformed field.
    ///
    /// Returns the theme and whether a substitution happened.
    fn into_theme(self) -> (Theme, bool) {
        let key = normalize(&self.key);
        let mut patched = false;

        let display_name = match self.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => {
                patched = true;
                UNKNOWN_NAME.to_string()
            }
        };

        let color = match self.color.as_ref().and_then(parse_color) {
            Some(color) => color,
            None => {
                patched = true;
                Rgb::WHITE
            }
        };

        let texture = match self.texture.as_deref().and_then(TextureTag::parse) {
            Some(texture) => texture,
            None => {
                patched = true;
                TextureTag::Basic
            }
        };

        (Theme { key, display_name, color, texture }, patched)
    }
}

fn parse_color(value: &serde_json::Value) -> Option<Rgb> {
    let components = value.as_array()?;
    if components.len() != 3 {
        return None;
    }
    let mut rgb = [0u8; 3];
    for (slot, component) in rgb.iter_mut().zip(components) {
        let v = component.as_f64()?;
        if !v.is_finite() || !(0.0..=255.0).contains(&v) {
            return None;
        }
        *slot = v.round() as u8;
    }
    Some(Rgb(rgb))
}

/// Registry of themes for a single channel
#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    /// Themes by normalized key
    themes: HashMap<String, Theme>,
    /// Keys in registration order; the first one is the fallback
    order: Vec<String>,
    /// Normalized classifier label -> theme key
    aliases: HashMap<String, String>,
    placeholder: Theme,
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ThemeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            themes: HashMap::new(),
            order: Vec::new(),
            aliases: HashMap::new(),
            placeholder: Theme::placeholder(),
        }
    }

    /// Build a registry from theme entries and label aliases
    pub fn from_specs<I, A>(specs: I, aliases: A) -> Self
    where
        I: IntoIterator<Item = ThemeSpec>,
        A: IntoIterator<Item = (String, String)>,
    {
        let mut registry = Self::new();
        for spec in specs {
            registry.register(spec);
        }
        for (label, key) in aliases {
            registry.add_alias(&label, &key);
        }
        registry
    }

    /// Register a theme entry. Entries with an empty key are ignored.
    pub fn register(&mut self, spec: ThemeSpec) {
        let raw_key = spec.key.clone();
        let (theme, patched) = spec.into_theme();
        if theme.key.is_empty() {
            tracing::warn!(key = %raw_key, "Ignoring theme entry with empty key");
            return;
        }
        if patched {
            tracing::warn!(
                key = %theme.key,
                color = ?theme.color,
                texture = %theme.texture,
                "Theme entry was malformed; substituted placeholder fields"
            );
        }

        if !self.themes.contains_key(&theme.key) {
            self.order.push(theme.key.clone());
        }
        self.themes.insert(theme.key.clone(), theme);
    }

    /// Map a classifier label onto an existing theme key
    pub fn add_alias(&mut self, label: &str, key: &str) {
        let label = normalize(label);
        let key = normalize(key);
        if label.is_empty() || key.is_empty() {
            return;
        }
        self.aliases.insert(label, key);
    }

    /// Theme for `key`, falling back to the first registered theme.
    ///
    /// An empty registry yields the placeholder theme.
    pub fn lookup(&self, key: &str) -> &Theme {
        self.get(key)
            .or_else(|| self.first())
            .unwrap_or(&self.placeholder)
    }

    /// Theme for `key` without fallback
    pub fn get(&self, key: &str) -> Option<&Theme> {
        if let Some(theme) = self.themes.get(key) {
            return Some(theme);
        }
        let normalized = normalize(key);
        if normalized.is_empty() {
            return None;
        }
        self.themes.get(&normalized)
    }

    /// Resolve a normalized classifier label to a theme key.
    ///
    /// Direct theme keys win over aliases. The empty label never resolves.
    pub fn resolve(&self, label: &str) -> Option<&str> {
        if label.is_empty() {
            return None;
        }
        if let Some((key, _)) = self.themes.get_key_value(label) {
            return Some(key.as_str());
        }
        let target = self.aliases.get(label)?;
        self.themes.get_key_value(target).map(|(key, _)| key.as_str())
    }

    /// First registered theme (the fallback)
    pub fn first(&self) -> Option<&Theme> {
        self.order.first().and_then(|key| self.themes.get(key))
    }

    /// Key of the first registered theme
    pub fn first_key(&self) -> Option<&str> {
        self.order.first().map(|s| s.as_str())
    }

    /// Check if a key is registered
    pub fn contains(&self, key: &str) -> bool {
        self.themes.contains_key(key)
    }

    /// Keys in registration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Key registered at position `index`
    pub fn key_at(&self, index: usize) -> Option<&str> {
        self.order.get(index).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ThemeRegistry {
        ThemeRegistry::from_specs(
            vec![
                ThemeSpec::new("red", "Cheddar", [255, 150, 0], TextureTag::Sharp),
                ThemeSpec::new("blue", "Gorgonzola", [200, 220, 255], TextureTag::Veiny),
            ],
            vec![("Crimson".to_string(), "red".to_string())],
        )
    }

    #[test]
    fn test_lookup_known_key() {
        let registry = sample();
        let theme = registry.lookup("blue");
        assert_eq!(theme.display_name, "Gorgonzola");
        assert_eq!(theme.color, Rgb::new(200, 220, 255));
        assert_eq!(theme.texture, TextureTag::Veiny);
    }

    #[test]
    fn test_lookup_falls_back_to_first_registered() {
        let registry = sample();
        assert_eq!(registry.lookup("purple").key, "red");
        assert_eq!(registry.lookup("").key, "red");
        assert_eq!(registry.lookup("  \t").key, "red");
    }

    #[test]
    fn test_lookup_normalizes_keys() {
        let registry = sample();
        assert_eq!(registry.lookup(" Blue ").key, "blue");
    }

    #[test]
    fn test_empty_registry_yields_placeholder() {
        let registry = ThemeRegistry::new();
        let theme = registry.lookup("red");
        assert_eq!(theme.color, Rgb::WHITE);
        assert_eq!(theme.texture, TextureTag::Basic);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_malformed_entries_are_patched() {
        let mut registry = ThemeRegistry::new();
        registry.register(ThemeSpec {
            key: "odd".to_string(),
            name: None,
            color: Some(json!([255, 300, 0])),
            texture: Some("glittery".to_string()),
        });
        registry.register(ThemeSpec {
            key: "short".to_string(),
            name: Some("Short".to_string()),
            color: Some(json!([1, 2])),
            texture: None,
        });
        registry.register(ThemeSpec {
            key: "text".to_string(),
            name: Some("Text".to_string()),
            color: Some(json!("red")),
            texture: Some("holey".to_string()),
        });

        let odd = registry.lookup("odd");
        assert_eq!(odd.display_name, UNKNOWN_NAME);
        assert_eq!(odd.color, Rgb::WHITE);
        assert_eq!(odd.texture, TextureTag::Basic);

        let short = registry.lookup("short");
        assert_eq!(short.display_name, "Short");
        assert_eq!(short.color, Rgb::WHITE);

        let text = registry.lookup("text");
        assert_eq!(text.color, Rgb::WHITE);
        assert_eq!(text.texture, TextureTag::Holey);
    }

    #[test]
    fn test_empty_key_is_ignored() {
        let mut registry = ThemeRegistry::new();
        registry.register(ThemeSpec::new("  ", "Nothing", [0, 0, 0], TextureTag::Basic));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_resolve_keys_and_aliases() {
        let registry = sample();
        assert_eq!(registry.resolve("red"), Some("red"));
        assert_eq!(registry.resolve("crimson"), Some("red"));
        assert_eq!(registry.resolve("green"), None);
        assert_eq!(registry.resolve(""), None);
    }

    #[test]
    fn test_alias_to_missing_theme_does_not_resolve() {
        let mut registry = sample();
        registry.add_alias("teal", "cyan");
        assert_eq!(registry.resolve("teal"), None);
    }

    #[test]
    fn test_registration_order() {
        let registry = sample();
        let keys: Vec<&str> = registry.keys().collect();
        assert_eq!(keys, vec!["red", "blue"]);
        assert_eq!(registry.key_at(1), Some("blue"));
        assert_eq!(registry.first_key(), Some("red"));
    }
}
