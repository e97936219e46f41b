//! Built-in cheese theme tables

use super::{TextureTag, ThemeSpec};

/// Shirt color classes
pub fn color_themes() -> Vec<ThemeSpec> {
    vec![
        ThemeSpec::new("red", "Cheddar", [255, 150, 0], TextureTag::Sharp),
        ThemeSpec::new("blue", "Gorgonzola", [200, 220, 255], TextureTag::Veiny),
        ThemeSpec::new("yellow", "Swiss", [255, 255, 150], TextureTag::Holey),
        ThemeSpec::new("green", "Pesto", [150, 255, 150], TextureTag::Herby),
        ThemeSpec::new("white", "Mozzarella", [255, 255, 255], TextureTag::Stretchy),
    ]
}

/// Hairstyle classes
pub fn hair_themes() -> Vec<ThemeSpec> {
    vec![
        ThemeSpec::new("kinky", "Roquefort", [185, 210, 230], TextureTag::Veiny),
        ThemeSpec::new("dreadlocks", "Parmesan", [250, 240, 200], TextureTag::Granular),
        ThemeSpec::new("curly", "Gouda", [255, 210, 120], TextureTag::Wedge),
        ThemeSpec::new("wavy", "Brie", [255, 255, 240], TextureTag::Brie),
        ThemeSpec::new("straight", "Provolone", [255, 245, 180], TextureTag::SmoothSlice),
    ]
}

/// Hair classifier labels that do not match a theme key verbatim
pub fn hair_aliases() -> Vec<(String, String)> {
    [
        ("kinkyhair", "kinky"),
        ("dreads", "dreadlocks"),
        ("curlyhair", "curly"),
        ("wavyhair", "wavy"),
        ("straighthair", "straight"),
    ]
    .into_iter()
    .map(|(label, key)| (label.to_string(), key.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::{Rgb, ThemeRegistry};

    #[test]
    fn test_builtin_tables_are_well_formed() {
        let color = ThemeRegistry::from_specs(color_themes(), Vec::new());
        let hair = ThemeRegistry::from_specs(hair_themes(), hair_aliases());
        assert_eq!(color.len(), 5);
        assert_eq!(hair.len(), 5);
        assert_eq!(color.first_key(), Some("red"));
        assert_eq!(hair.first_key(), Some("kinky"));
        assert_eq!(color.lookup("red").color, Rgb::new(255, 150, 0));
        assert_eq!(hair.lookup("curly").texture, TextureTag::Wedge);
    }

    #[test]
    fn test_hair_aliases_resolve() {
        let hair = ThemeRegistry::from_specs(hair_themes(), hair_aliases());
        assert_eq!(hair.resolve("kinkyhair"), Some("kinky"));
        assert_eq!(hair.resolve("straight"), Some("straight"));
    }
}
