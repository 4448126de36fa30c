use serde::{Deserialize, Serialize};

/// Scalar parameters the image surface reads every frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageParams {
    pub blur_strength: f32,
    /// Cross-fade weight of `next_asset` over `active_asset`.
    pub transition_progress: f32,
    pub active_asset: usize,
    /// Set while fading out, once the incoming asset is known.
    pub next_asset: Option<usize>,
}

impl ImageParams {
    pub fn fully_blurred(active_asset: usize) -> Self {
        Self {
            blur_strength: 1.0,
            transition_progress: 0.0,
            active_asset,
            next_asset: None,
        }
    }
}

/// One text overlay position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextSlot {
    pub asset: usize,
    pub progress: f32,
    pub visible: bool,
}

impl TextSlot {
    pub fn hidden(asset: usize) -> Self {
        Self {
            asset,
            progress: 0.0,
            visible: false,
        }
    }
}

/// Parameters for both text surfaces: `primary` shows the even member of
/// the current pair, `secondary` the odd one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextParams {
    pub primary: TextSlot,
    pub secondary: TextSlot,
}

/// Rendering collaborator. The session writes both parameter sets after
/// every tick and never reads anything back.
pub trait RenderSink {
    fn apply_image(&mut self, params: &ImageParams);
    fn apply_text(&mut self, params: &TextParams);
}

/// Rendering backend stand-in. Keeps the most recent parameters and counts
/// the frames it has been handed.
#[derive(Debug, Default)]
pub struct RenderGraph {
    image: Option<ImageParams>,
    text: Option<TextParams>,
    frames: u64,
}

impl RenderGraph {
    pub fn new() -> Self {
        Self {
            image: None,
            text: None,
            frames: 0,
        }
    }

    pub fn image(&self) -> Option<&ImageParams> {
        self.image.as_ref()
    }

    pub fn text(&self) -> Option<&TextParams> {
        self.text.as_ref()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl RenderSink for RenderGraph {
    fn apply_image(&mut self, params: &ImageParams) {
        self.image = Some(*params);
        self.frames += 1;
    }

    fn apply_text(&mut self, params: &TextParams) {
        self.text = Some(*params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_latest_parameters() {
        let mut graph = RenderGraph::new();
        assert!(graph.image().is_none());

        graph.apply_image(&ImageParams::fully_blurred(0));
        let mut faded = ImageParams::fully_blurred(1);
        faded.blur_strength = 0.25;
        graph.apply_image(&faded);
        graph.apply_text(&TextParams {
            primary: TextSlot {
                asset: 0,
                progress: 1.0,
                visible: true,
            },
            secondary: TextSlot::hidden(1),
        });

        assert_eq!(graph.frames(), 2);
        assert_eq!(graph.image().unwrap().active_asset, 1);
        assert_eq!(graph.image().unwrap().blur_strength, 0.25);
        assert!(!graph.text().unwrap().secondary.visible);
    }
}
