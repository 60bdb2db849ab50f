use std::collections::BTreeMap;
use std::str::FromStr;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::config::StudyConfig;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let rgb: Srgb = Hsl::new(hue, 0.75, 0.55).into_color();
            let rgb: Srgb<u8> = rgb.into_format();
            Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
        })
        .collect()
}

/// Parse a `#rrggbb` (or `rrggbb`) colour token.
pub fn parse_color(token: &str) -> Option<Color32> {
    let rgb = Srgb::<u8>::from_str(token.trim()).ok()?;
    Some(Color32::from_rgb(rgb.red, rgb.green, rgb.blue))
}

// ---------------------------------------------------------------------------
// School → Color32
// ---------------------------------------------------------------------------

/// Display colour of every configured school.
#[derive(Debug, Clone)]
pub struct SchoolColors {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl SchoolColors {
    /// Use each school's configured token; unparseable tokens fall back to
    /// a generated palette entry.
    pub fn new(config: &StudyConfig) -> Self {
        let fallback = generate_palette(config.schools().len());
        let mapping = config
            .schools()
            .iter()
            .zip(fallback)
            .map(|(school, generated)| {
                let color = parse_color(&school.color).unwrap_or_else(|| {
                    log::warn!("{}: invalid colour '{}'", school.name, school.color);
                    generated
                });
                (school.name.clone(), color)
            })
            .collect();

        SchoolColors {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    pub fn color_for(&self, school: &str) -> Color32 {
        self.mapping
            .get(school)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchoolProfile;

    #[test]
    fn parses_hex_tokens() {
        assert_eq!(parse_color("#1f77b4"), Some(Color32::from_rgb(0x1f, 0x77, 0xb4)));
        assert_eq!(parse_color("d62728"), Some(Color32::from_rgb(0xd6, 0x27, 0x28)));
        assert_eq!(parse_color("blue-ish"), None);
    }

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let colors = generate_palette(4);
        assert_eq!(colors.len(), 4);
        assert_ne!(colors[0], colors[2]);
    }

    #[test]
    fn invalid_token_falls_back_to_palette() {
        let config = StudyConfig::new(
            vec![
                SchoolProfile::new("A", 1.0, "#ff0000"),
                SchoolProfile::new("B", 2.0, "not a colour"),
                SchoolProfile::new("C", 3.0, "#00ff00"),
                SchoolProfile::new("D", 4.0, "#0000ff"),
            ],
            "unused",
        )
        .unwrap();
        let colors = SchoolColors::new(&config);
        assert_eq!(colors.color_for("A"), Color32::from_rgb(255, 0, 0));
        assert_eq!(colors.color_for("B"), generate_palette(4)[1]);
        assert_eq!(colors.color_for("Z"), Color32::GRAY);
    }
}
