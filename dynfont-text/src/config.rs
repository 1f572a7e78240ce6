//! Construction options for [`DynamicFont`](crate::DynamicFont).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Full-width CJK punctuation that gets extra trailing space.
pub const DEFAULT_WIDE_PUNCTUATION: &str = "！？；：（）、，。》《“”「」";

/// Cornflower blue. Opaque on purpose: unused atlas space stays visible.
pub const DEFAULT_BACKGROUND: [u8; 4] = [100, 149, 237, 255];

/// Largest accepted atlas side length. A 16384² RGBA8 atlas is 1 GiB.
pub const MAX_ATLAS_SIZE: u32 = 16_384;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Atlas size must be greater than zero")]
    ZeroAtlasSize,
    #[error("Atlas size {size} exceeds the maximum of {max}")]
    AtlasTooLarge { size: u32, max: u32 },
    #[error("Font size must be a positive number of points, got {0}")]
    InvalidFontSize(f32),
    #[error("Invalid font config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which glyphs get the wide-punctuation extra width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidePunctuation {
    /// Every glyph is flagged, regardless of the punctuation set.
    #[default]
    Always,
    /// Only characters in [`FontConfig::wide_punctuation`] are flagged.
    Members,
}

/// Font and atlas configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Atlas texture width and height in pixels (always square).
    pub atlas_size: u32,
    /// Font size in points (converted to pixels at 96 DPI).
    pub font_size: f32,
    /// Pixels added after every glyph.
    pub character_spacing: i32,
    /// Extra pixels after an ASCII space.
    pub space_width: i32,
    /// Extra pixels after a wide-punctuation glyph.
    pub wide_punctuation_width: i32,
    /// Characters treated as wide punctuation.
    pub wide_punctuation: String,
    pub wide_punctuation_mode: WidePunctuation,
    /// RGBA fill for atlas space not holding a glyph.
    pub background: [u8; 4],
    /// Substitutes for codepoints the font cannot render, tried in order.
    pub placeholders: Vec<char>,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            atlas_size: 128,
            font_size: 18.0,
            character_spacing: 1,
            space_width: 5,
            wide_punctuation_width: 10,
            wide_punctuation: DEFAULT_WIDE_PUNCTUATION.to_string(),
            wide_punctuation_mode: WidePunctuation::Always,
            background: DEFAULT_BACKGROUND,
            placeholders: vec!['□', '_'],
        }
    }
}

impl FontConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.atlas_size == 0 {
            return Err(ConfigError::ZeroAtlasSize);
        }
        if self.atlas_size > MAX_ATLAS_SIZE {
            return Err(ConfigError::AtlasTooLarge {
                size: self.atlas_size,
                max: MAX_ATLAS_SIZE,
            });
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(ConfigError::InvalidFontSize(self.font_size));
        }
        Ok(())
    }

    /// Whether `ch` gets the wide-punctuation width under this config.
    pub fn is_wide_punctuation(&self, ch: char) -> bool {
        match self.wide_punctuation_mode {
            WidePunctuation::Always => true,
            WidePunctuation::Members => self.wide_punctuation.contains(ch),
        }
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = FontConfig::default();
        assert_eq!(config.atlas_size, 128);
        assert_eq!(config.font_size, 18.0);
        assert_eq!(config.character_spacing, 1);
        assert_eq!(config.space_width, 5);
        assert_eq!(config.wide_punctuation_width, 10);
        assert_eq!(config.background, DEFAULT_BACKGROUND);
        assert_eq!(config.placeholders, vec!['□', '_']);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = FontConfig::from_json(
            r#"{ "atlas_size": 2048, "wide_punctuation_mode": "members" }"#,
        )
        .unwrap();
        assert_eq!(config.atlas_size, 2048);
        assert_eq!(config.wide_punctuation_mode, WidePunctuation::Members);
        assert_eq!(config.font_size, 18.0);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(matches!(
            FontConfig::from_json(r#"{ "atlas_size": 0 }"#),
            Err(ConfigError::ZeroAtlasSize)
        ));
        assert!(matches!(
            FontConfig::from_json(r#"{ "font_size": -3.0 }"#),
            Err(ConfigError::InvalidFontSize(_))
        ));
        assert!(matches!(
            FontConfig::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_oversized_atlas() {
        assert!(matches!(
            FontConfig::from_json(r#"{ "atlas_size": 4294967295 }"#),
            Err(ConfigError::AtlasTooLarge { size: 4294967295, max: MAX_ATLAS_SIZE })
        ));
        assert!(matches!(
            FontConfig::from_json(r#"{ "atlas_size": 16385 }"#),
            Err(ConfigError::AtlasTooLarge { .. })
        ));
        let config = FontConfig::from_json(r#"{ "atlas_size": 16384 }"#).unwrap();
        assert_eq!(config.atlas_size, MAX_ATLAS_SIZE);
    }

    #[test]
    fn test_wide_punctuation_modes() {
        let mut config = FontConfig::default();
        assert!(config.is_wide_punctuation('a'));
        assert!(config.is_wide_punctuation('，'));

        config.wide_punctuation_mode = WidePunctuation::Members;
        assert!(!config.is_wide_punctuation('a'));
        assert!(config.is_wide_punctuation('，'));
        assert!(config.is_wide_punctuation('。'));
        assert!(!config.is_wide_punctuation(','));
    }
}
