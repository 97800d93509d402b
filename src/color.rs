use serde::{Deserialize, Serialize};

/// 24-bit color, serialized as a `#RRGGBB` string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` or `RRGGBB`
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Linear blend toward `other` (t = 0 keeps self, t = 1 gives other)
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    /// Perceived brightness in [0, 1]
    #[cfg(test)]
    pub fn luminance(self) -> f32 {
        (0.2126 * self.r as f32 + 0.7152 * self.g as f32 + 0.0722 * self.b as f32) / 255.0
    }

    pub fn to_ratatui(self) -> ratatui::style::Color {
        ratatui::style::Color::Rgb(self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::from_hex(&value).ok_or_else(|| format!("invalid color '{}', expected #RRGGBB", value))
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_hex()
    }
}

/// Named color sets for the field
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Palette {
    /// Indigo and cyan on near-black
    #[default]
    Neural,
    Ember,
    Aurora,
    Mono,
}

/// Concrete colors resolved from a [`Palette`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteColors {
    /// The two ambient colors a particle is born with
    pub ambient: [Rgb; 2],
    pub energized: Rgb,
    pub ambient_link: Rgb,
    pub pointer_link: Rgb,
    pub background: Rgb,
}

impl Palette {
    pub fn name(&self) -> &str {
        match self {
            Palette::Neural => "Neural",
            Palette::Ember => "Ember",
            Palette::Aurora => "Aurora",
            Palette::Mono => "Mono",
        }
    }

    pub fn next(&self) -> Palette {
        match self {
            Palette::Neural => Palette::Ember,
            Palette::Ember => Palette::Aurora,
            Palette::Aurora => Palette::Mono,
            Palette::Mono => Palette::Neural,
        }
    }

    pub fn prev(&self) -> Palette {
        match self {
            Palette::Neural => Palette::Mono,
            Palette::Ember => Palette::Neural,
            Palette::Aurora => Palette::Ember,
            Palette::Mono => Palette::Aurora,
        }
    }

    pub fn colors(&self) -> PaletteColors {
        match self {
            Palette::Neural => PaletteColors {
                ambient: [Rgb::new(0x5D, 0x5F, 0xEF), Rgb::new(0x00, 0xF0, 0xFF)],
                energized: Rgb::WHITE,
                ambient_link: Rgb::new(93, 95, 239),
                pointer_link: Rgb::new(0, 240, 255),
                background: Rgb::new(0x05, 0x05, 0x10),
            },
            Palette::Ember => PaletteColors {
                ambient: [Rgb::new(0xFF, 0x6B, 0x35), Rgb::new(0xF7, 0xC5, 0x48)],
                energized: Rgb::new(0xFF, 0xF4, 0xE0),
                ambient_link: Rgb::new(200, 80, 40),
                pointer_link: Rgb::new(255, 190, 90),
                background: Rgb::new(0x12, 0x06, 0x04),
            },
            Palette::Aurora => PaletteColors {
                ambient: [Rgb::new(0x3D, 0xDC, 0x97), Rgb::new(0xB3, 0x88, 0xFF)],
                energized: Rgb::new(0xE8, 0xFF, 0xF4),
                ambient_link: Rgb::new(61, 220, 151),
                pointer_link: Rgb::new(179, 136, 255),
                background: Rgb::new(0x03, 0x0B, 0x10),
            },
            Palette::Mono => PaletteColors {
                ambient: [Rgb::new(0x9A, 0x9A, 0x9A), Rgb::new(0xD0, 0xD0, 0xD0)],
                energized: Rgb::WHITE,
                ambient_link: Rgb::new(150, 150, 150),
                pointer_link: Rgb::new(230, 230, 230),
                background: Rgb::BLACK,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing() {
        assert_eq!(Rgb::from_hex("#5D5FEF"), Some(Rgb::new(0x5D, 0x5F, 0xEF)));
        assert_eq!(Rgb::from_hex("00f0ff"), Some(Rgb::new(0, 240, 255)));
        assert_eq!(Rgb::from_hex("#12345"), None);
        assert_eq!(Rgb::from_hex("#GGGGGG"), None);
        assert_eq!(Rgb::new(1, 2, 255).to_hex(), "#0102FF");
    }

    #[test]
    fn test_color_serializes_as_hex() {
        let json = serde_json::to_string(&Rgb::new(0, 240, 255)).unwrap();
        assert_eq!(json, "\"#00F0FF\"");

        let parsed: Rgb = serde_json::from_str("\"#5d5fef\"").unwrap();
        assert_eq!(parsed, Rgb::new(0x5D, 0x5F, 0xEF));

        assert!(serde_json::from_str::<Rgb>("\"blue\"").is_err());
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = Rgb::new(0, 100, 200);
        let b = Rgb::new(200, 100, 0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Rgb::new(100, 100, 100));
    }

    #[test]
    fn test_palette_cycle_returns_home() {
        let mut palette = Palette::default();
        for _ in 0..4 {
            palette = palette.next();
        }
        assert_eq!(palette, Palette::Neural);
        assert_eq!(Palette::Neural.prev(), Palette::Mono);
    }

    #[test]
    fn test_energized_stands_out() {
        for palette in [Palette::Neural, Palette::Ember, Palette::Aurora, Palette::Mono] {
            let colors = palette.colors();
            for ambient in colors.ambient {
                assert!(colors.energized.luminance() > ambient.luminance(), "{}", palette.name());
            }
        }
    }
}
