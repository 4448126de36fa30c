use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Result, SlideshowError};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tempo_bpm: f64,
    pub image: ImageTiming,
    pub text: TextTiming,
    pub playback: PlaybackConfig,
    pub assets: AssetConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tempo_bpm: 120.0,
            image: ImageTiming::default(),
            text: TextTiming::default(),
            playback: PlaybackConfig::default(),
            assets: AssetConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parses a JSON document. Missing sections fall back to their defaults.
    pub fn from_json_str(input: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Checks the values that cannot be expressed through the type system.
    /// Timelines repeat these checks when they are constructed directly.
    pub fn validate(&self) -> Result<()> {
        if !self.tempo_bpm.is_finite() || self.tempo_bpm <= 0.0 {
            return Err(SlideshowError::config(format!(
                "tempo must be a positive number of beats per minute, got {}",
                self.tempo_bpm
            )));
        }
        self.image.validate()?;
        self.text.validate()?;
        self.playback.validate()?;
        self.assets.validate()
    }
}

/// Beat counts for the three image phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageTiming {
    pub fade_in_beats: f64,
    pub stay_beats: f64,
    pub fade_out_beats: f64,
}

impl Default for ImageTiming {
    fn default() -> Self {
        Self {
            fade_in_beats: 8.0,
            stay_beats: 0.0,
            fade_out_beats: 8.0,
        }
    }
}

impl ImageTiming {
    pub fn validate(&self) -> Result<()> {
        check_beats("image.fade_in_beats", self.fade_in_beats)?;
        check_beats("image.stay_beats", self.stay_beats)?;
        check_beats("image.fade_out_beats", self.fade_out_beats)?;
        check_cycle("image", self.fade_in_beats + self.stay_beats + self.fade_out_beats)
    }
}

/// Beat counts for the five text phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextTiming {
    pub fade_in_beats: f64,
    pub stay_beats: f64,
    pub add_new_text_beats: f64,
    pub both_stay_beats: f64,
    pub both_out_beats: f64,
}

impl Default for TextTiming {
    fn default() -> Self {
        Self {
            fade_in_beats: 2.0,
            stay_beats: 2.0,
            add_new_text_beats: 2.0,
            both_stay_beats: 2.0,
            both_out_beats: 4.0,
        }
    }
}

impl TextTiming {
    pub fn validate(&self) -> Result<()> {
        check_beats("text.fade_in_beats", self.fade_in_beats)?;
        check_beats("text.stay_beats", self.stay_beats)?;
        check_beats("text.add_new_text_beats", self.add_new_text_beats)?;
        check_beats("text.both_stay_beats", self.both_stay_beats)?;
        check_beats("text.both_out_beats", self.both_out_beats)?;
        check_cycle(
            "text",
            self.fade_in_beats
                + self.stay_beats
                + self.add_new_text_beats
                + self.both_stay_beats
                + self.both_out_beats,
        )
    }
}

/// Settings for the driver loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Step rate used by headless playback.
    pub fps: u32,
    /// Largest delta a single tick may feed into the timelines.
    pub max_delta_seconds: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            max_delta_seconds: 0.1,
        }
    }
}

impl PlaybackConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(SlideshowError::config("playback.fps must be at least 1"));
        }
        if !self.max_delta_seconds.is_finite() || self.max_delta_seconds <= 0.0 {
            return Err(SlideshowError::config(format!(
                "playback.max_delta_seconds must be positive, got {}",
                self.max_delta_seconds
            )));
        }
        Ok(())
    }

    pub fn frame_seconds(&self) -> f64 {
        1.0 / f64::from(self.fps.max(1))
    }
}

/// Ordered asset handles handed to the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub images: Vec<String>,
    pub texts: Vec<String>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            images: (1..=6).map(|i| format!("images/page-{i}.png")).collect(),
            texts: (1..=12).map(|i| format!("text/text-{i}.png")).collect(),
        }
    }
}

impl AssetConfig {
    pub fn validate(&self) -> Result<()> {
        if self.images.is_empty() {
            return Err(SlideshowError::config("at least one image asset is required"));
        }
        if self.texts.is_empty() {
            return Err(SlideshowError::config("at least one text asset is required"));
        }
        Ok(())
    }
}

fn check_beats(name: &str, beats: f64) -> Result<()> {
    if beats.is_finite() && beats >= 0.0 {
        Ok(())
    } else {
        Err(SlideshowError::config(format!(
            "{name} must be a non-negative beat count, got {beats}"
        )))
    }
}

/// A cycle with no length would advance on every update, even `update(0)`.
pub(crate) fn check_cycle(name: &str, total_beats: f64) -> Result<()> {
    if total_beats > 0.0 {
        Ok(())
    } else {
        Err(SlideshowError::config(format!("{name} phases must add up to more than zero beats")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.assets.images.len(), 6);
        assert_eq!(config.assets.texts.len(), 12);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            AppConfig::from_json_str(r#"{ "tempo_bpm": 125, "image": { "stay_beats": 4 } }"#)
                .unwrap();

        assert_eq!(config.tempo_bpm, 125.0);
        assert_eq!(config.image.stay_beats, 4.0);
        assert_eq!(config.image.fade_in_beats, 8.0);
        assert_eq!(config.text, TextTiming::default());
    }

    #[test]
    fn rejects_non_positive_tempo() {
        let err = AppConfig::from_json_str(r#"{ "tempo_bpm": 0 }"#).unwrap_err();
        assert!(matches!(err, SlideshowError::Config(_)));
    }

    #[test]
    fn rejects_negative_beats() {
        let err = AppConfig::from_json_str(r#"{ "text": { "both_out_beats": -1 } }"#).unwrap_err();
        assert!(format!("{err}").contains("text.both_out_beats"));
    }

    #[test]
    fn rejects_zero_length_cycles() {
        let err = AppConfig::from_json_str(
            r#"{ "image": { "fade_in_beats": 0, "stay_beats": 0, "fade_out_beats": 0 } }"#,
        )
        .unwrap_err();
        assert!(format!("{err}").contains("image phases"));

        let mut config = AppConfig::default();
        config.text = TextTiming {
            fade_in_beats: 0.0,
            stay_beats: 0.0,
            add_new_text_beats: 0.0,
            both_stay_beats: 0.0,
            both_out_beats: 0.0,
        };
        assert!(matches!(config.validate(), Err(SlideshowError::Config(_))));

        config.text.stay_beats = 1.0;
        config.validate().unwrap();
    }

    #[test]
    fn rejects_empty_asset_lists() {
        let err = AppConfig::from_json_str(r#"{ "assets": { "images": [] } }"#).unwrap_err();
        assert!(format!("{err}").contains("image asset"));
    }

    #[test]
    fn malformed_json_surfaces_as_json_error() {
        let err = AppConfig::from_json_str("{ tempo").unwrap_err();
        assert!(matches!(err, SlideshowError::Json(_)));
    }
}
