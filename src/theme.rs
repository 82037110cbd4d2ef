//! UI colors, with an optional override file in the config directory
//! (`~/.config/menseki/theme.conf`, kitty.conf-style `key #hex` lines).

use ratatui::style::Color;
use std::collections::HashMap;
use std::fs;

use crate::map::surface::MarkerStyles;

/// Theme colors for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,      // Active borders, key hints
    pub inactive: Color,    // Inactive borders
    pub text: Color,        // Primary text
    pub text_dim: Color,    // Dimmed text
    #[allow(dead_code)]
    pub bg_selected: Color, // Selection background - reserved for future use
    pub danger: Color,      // Delete controls, warnings
    pub danger_bright: Color, // Hovered delete controls
    pub label: Color,       // Area labels over the map
    pub shape: Color,       // Drawn shape outlines
    pub water: Color,       // Map base layer
}

impl Default for Theme {
    fn default() -> Self {
        // Leaflet-inspired fallback: blue shapes and labels, red delete
        // affordance.
        Self {
            accent: Color::Rgb(250, 179, 135),
            inactive: Color::Rgb(88, 91, 112),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            bg_selected: Color::Rgb(69, 71, 90),
            danger: Color::Rgb(211, 95, 95),
            danger_bright: Color::Rgb(255, 120, 120),
            label: Color::Rgb(51, 136, 255),
            shape: Color::Rgb(51, 136, 255),
            water: Color::Rgb(60, 70, 90),
        }
    }
}

impl Theme {
    /// Load theme, applying any override file over the defaults.
    pub fn load() -> Self {
        Self::load_override().unwrap_or_default()
    }

    fn load_override() -> Option<Self> {
        let theme_path = dirs::config_dir()?.join("menseki/theme.conf");
        let content = fs::read_to_string(&theme_path).ok()?;
        let colors = Self::parse_theme_conf(&content);

        if colors.is_empty() {
            return None;
        }

        let defaults = Self::default();
        let pick = |key: &str, fallback: Color| colors.get(key).copied().unwrap_or(fallback);

        Some(Self {
            accent: pick("accent", defaults.accent),
            inactive: pick("inactive", defaults.inactive),
            text: pick("foreground", defaults.text),
            text_dim: pick("text_dim", defaults.text_dim),
            bg_selected: pick("selection_background", defaults.bg_selected),
            danger: pick("danger", defaults.danger),
            danger_bright: pick("danger_bright", defaults.danger_bright),
            label: pick("label", defaults.label),
            shape: pick("shape", defaults.shape),
            water: pick("water", defaults.water),
        })
    }

    /// The decoration styles registered on the map surface.
    pub fn marker_styles(&self) -> MarkerStyles {
        MarkerStyles {
            delete_fg: self.danger,
            delete_hover: self.danger_bright,
            label_fg: self.label,
            shape_outline: self.shape,
        }
    }

    /// Parse `key value` lines where value is a hex color
    fn parse_theme_conf(content: &str) -> HashMap<String, Color> {
        let mut colors = HashMap::new();

        for line in content.lines() {
            let line = line.trim();

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.splitn(2, char::is_whitespace).collect();
            if parts.len() == 2 {
                if let Some(color) = parse_hex_color(parts[1].trim()) {
                    colors.insert(parts[0].trim().to_string(), color);
                }
            }
        }

        colors
    }
}

/// Parse a hex color string (#RRGGBB or #RGB)
pub fn parse_hex_color(s: &str) -> Option<Color> {
    let s = s.trim().trim_start_matches('#');

    if s.len() == 6 {
        let r = u8::from_str_radix(&s[0..2], 16).ok()?;
        let g = u8::from_str_radix(&s[2..4], 16).ok()?;
        let b = u8::from_str_radix(&s[4..6], 16).ok()?;
        Some(Color::Rgb(r, g, b))
    } else if s.len() == 3 {
        let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
        let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
        let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
        Some(Color::Rgb(r, g, b))
    } else {
        None
    }
}

/// Resolve a configured color: a few CSS-ish names, else hex.
pub fn parse_color(s: &str) -> Option<Color> {
    match s.to_ascii_lowercase().as_str() {
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "blue" => Some(Color::Blue),
        "yellow" => Some(Color::Yellow),
        "magenta" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "white" => Some(Color::White),
        "black" => Some(Color::Black),
        _ => parse_hex_color(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#3388ff"), Some(Color::Rgb(51, 136, 255)));
        assert_eq!(parse_hex_color("3388ff"), Some(Color::Rgb(51, 136, 255)));
        assert_eq!(parse_hex_color("#f00"), Some(Color::Rgb(255, 0, 0)));
        assert_eq!(parse_hex_color("not-a-color"), None);
        assert_eq!(parse_hex_color("#12345"), None);
    }

    #[test]
    fn test_parse_named_color() {
        assert_eq!(parse_color("red"), Some(Color::Red));
        assert_eq!(parse_color("RED"), Some(Color::Red));
        assert_eq!(parse_color("#00ff00"), Some(Color::Rgb(0, 255, 0)));
        assert_eq!(parse_color("mauve"), None);
    }

    #[test]
    fn test_theme_conf_parsing() {
        let conf = "# comment\n\nlabel #3388ff\ndanger #f00\nbogus nothex\n";
        let colors = Theme::parse_theme_conf(conf);
        assert_eq!(colors.get("label"), Some(&Color::Rgb(51, 136, 255)));
        assert_eq!(colors.get("danger"), Some(&Color::Rgb(255, 0, 0)));
        assert!(!colors.contains_key("bogus"));
    }
}
