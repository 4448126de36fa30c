use serde::{Deserialize, Serialize};

use crate::{config::AssetConfig, Result, SlideshowError};

/// Handle to an image the renderer draws behind the text overlays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub path: String,
}

/// Handle to a pre-rendered text overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextAsset {
    pub path: String,
}

/// Ordered registry of the handles a session plays through. The core only
/// hands out indices; decoding the files is the renderer's job.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    images: Vec<ImageAsset>,
    texts: Vec<TextAsset>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self {
            images: Vec::new(),
            texts: Vec::new(),
        }
    }

    pub fn from_config(config: &AssetConfig) -> Result<Self> {
        let mut store = Self::new();
        for path in &config.images {
            store.register_image(ImageAsset { path: path.clone() });
        }
        for path in &config.texts {
            store.register_text(TextAsset { path: path.clone() });
        }
        store.validate()?;
        Ok(store)
    }

    pub fn register_image(&mut self, asset: ImageAsset) {
        self.images.push(asset);
    }

    pub fn register_text(&mut self, asset: TextAsset) {
        self.texts.push(asset);
    }

    /// Both sequences must hold at least one handle before playback starts.
    pub fn validate(&self) -> Result<()> {
        if self.images.is_empty() {
            return Err(SlideshowError::config("no image assets registered"));
        }
        if self.texts.is_empty() {
            return Err(SlideshowError::config("no text assets registered"));
        }
        Ok(())
    }

    pub fn image(&self, index: usize) -> Option<&ImageAsset> {
        self.images.get(index)
    }

    pub fn text(&self, index: usize) -> Option<&TextAsset> {
        self.texts.get(index)
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn text_count(&self) -> usize {
        self.texts.len()
    }
}
