use serde::{Deserialize, Serialize};

use super::{ramp, sanitize_delta, valid_elapsed, Tempo};
use crate::{config::{check_cycle, ImageTiming}, render::ImageParams, Result, SlideshowError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImagePhase {
    /// Blur clears from 1 to 0.
    FadeIn,
    /// Image held sharp.
    Stay,
    /// Blur returns to 1 while the next image cross-fades in over the
    /// second half of the phase.
    FadeOut,
}

/// Phase lengths in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageDurations {
    pub fade_in: f64,
    pub stay: f64,
    pub fade_out: f64,
}

impl ImageDurations {
    /// Fails on negative beat counts and on a cycle of zero total length.
    pub fn from_timing(tempo: &Tempo, timing: &ImageTiming) -> Result<Self> {
        let durations = Self {
            fade_in: tempo.beats(timing.fade_in_beats)?,
            stay: tempo.beats(timing.stay_beats)?,
            fade_out: tempo.beats(timing.fade_out_beats)?,
        };
        check_cycle("image", durations.residency())?;
        Ok(durations)
    }

    pub fn of(&self, phase: ImagePhase) -> f64 {
        match phase {
            ImagePhase::FadeIn => self.fade_in,
            ImagePhase::Stay => self.stay,
            ImagePhase::FadeOut => self.fade_out,
        }
    }

    /// Time each image stays the active one.
    pub fn residency(&self) -> f64 {
        self.fade_in + self.stay + self.fade_out
    }
}

/// Serializable copy of the image timeline position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSnapshot {
    pub current_index: usize,
    pub phase: ImagePhase,
    pub phase_elapsed: f64,
    /// Highest image that has finished fading out since the last reset.
    #[serde(default)]
    pub finished_through: Option<usize>,
}

/// What happened during one [`ImageTimeline::advance`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageEvents {
    /// The fade-out finished and the next image became active.
    pub advanced: bool,
    /// The image that just finished was the last one in the sequence.
    pub cycle_finished: bool,
}

#[derive(Debug, Clone)]
pub struct ImageTimeline {
    durations: ImageDurations,
    asset_count: usize,
    current_index: usize,
    phase: ImagePhase,
    phase_elapsed: f64,
    finished_through: Option<usize>,
    params: ImageParams,
}

impl ImageTimeline {
    pub fn new(tempo: &Tempo, timing: &ImageTiming, asset_count: usize) -> Result<Self> {
        if asset_count == 0 {
            return Err(SlideshowError::config("image timeline needs at least one asset"));
        }
        let durations = ImageDurations::from_timing(tempo, timing)?;
        Ok(Self {
            durations,
            asset_count,
            current_index: 0,
            phase: ImagePhase::FadeIn,
            phase_elapsed: 0.0,
            finished_through: None,
            params: ImageParams::fully_blurred(0),
        })
    }

    /// Advances by `delta` seconds and returns true iff the timeline moved
    /// on to the next image during this call.
    pub fn update(&mut self, delta: f64) -> bool {
        self.advance(delta).advanced
    }

    /// Advances by `delta` seconds. Time left over when a phase ends is
    /// carried into the following phase; at most one image advance happens
    /// per call. Individual phases may be zero-length and are passed through
    /// without consuming time; the whole cycle is guaranteed non-zero at
    /// construction.
    pub fn advance(&mut self, delta: f64) -> ImageEvents {
        let mut events = ImageEvents::default();
        self.phase_elapsed += sanitize_delta(delta);

        loop {
            let duration = self.durations.of(self.phase);
            if self.phase_elapsed < duration {
                break;
            }
            let overflow = self.phase_elapsed - duration;

            match self.phase {
                ImagePhase::FadeIn => self.enter(ImagePhase::Stay, overflow),
                ImagePhase::Stay => self.enter(ImagePhase::FadeOut, overflow),
                ImagePhase::FadeOut => {
                    let finished = self.current_index;
                    self.finished_through = Some(
                        self.finished_through
                            .map_or(finished, |through| through.max(finished)),
                    );
                    events.cycle_finished = finished + 1 == self.asset_count;

                    self.current_index = (finished + 1) % self.asset_count;
                    self.enter(ImagePhase::FadeIn, overflow);
                    events.advanced = true;

                    tracing::info!(
                        from = finished,
                        to = self.current_index,
                        cycle_finished = events.cycle_finished,
                        "image advanced"
                    );
                    break;
                }
            }
        }

        self.params = self.derive_params();
        events
    }

    fn enter(&mut self, phase: ImagePhase, elapsed: f64) {
        tracing::debug!(index = self.current_index, from = ?self.phase, to = ?phase, "image phase");
        self.phase = phase;
        self.phase_elapsed = elapsed;
    }

    fn derive_params(&self) -> ImageParams {
        let active_asset = self.current_index;
        match self.phase {
            ImagePhase::FadeIn => ImageParams {
                blur_strength: 1.0 - ramp(self.phase_elapsed, self.durations.fade_in),
                transition_progress: 0.0,
                active_asset,
                next_asset: None,
            },
            ImagePhase::Stay => ImageParams {
                blur_strength: 0.0,
                transition_progress: 0.0,
                active_asset,
                next_asset: None,
            },
            ImagePhase::FadeOut => {
                let progress = ramp(self.phase_elapsed, self.durations.fade_out);
                ImageParams {
                    blur_strength: progress,
                    transition_progress: ((progress - 0.5) * 2.0).max(0.0),
                    active_asset,
                    next_asset: Some((active_asset + 1) % self.asset_count),
                }
            }
        }
    }

    pub fn snapshot(&self) -> ImageSnapshot {
        ImageSnapshot {
            current_index: self.current_index,
            phase: self.phase,
            phase_elapsed: self.phase_elapsed,
            finished_through: self.finished_through,
        }
    }

    /// Restores a previously captured position. An invalid snapshot resets
    /// the timeline and is reported as [`SlideshowError::InvalidSnapshot`].
    pub fn restore_snapshot(&mut self, snapshot: &ImageSnapshot) -> Result<()> {
        if let Err(err) = self.check_snapshot(snapshot) {
            tracing::warn!(%err, "rejecting image snapshot, resetting timeline");
            self.reset();
            return Err(err);
        }

        self.current_index = snapshot.current_index;
        self.phase = snapshot.phase;
        self.phase_elapsed = snapshot.phase_elapsed;
        self.finished_through = snapshot.finished_through;
        self.params = self.derive_params();
        Ok(())
    }

    fn check_snapshot(&self, snapshot: &ImageSnapshot) -> Result<()> {
        if snapshot.current_index >= self.asset_count {
            return Err(SlideshowError::invalid_snapshot(format!(
                "image index {} out of range for {} assets",
                snapshot.current_index, self.asset_count
            )));
        }
        if !valid_elapsed(snapshot.phase_elapsed) {
            return Err(SlideshowError::invalid_snapshot(format!(
                "image phase time {} is not a non-negative number",
                snapshot.phase_elapsed
            )));
        }
        if let Some(through) = snapshot.finished_through {
            if through >= self.asset_count {
                return Err(SlideshowError::invalid_snapshot(format!(
                    "finished image {through} out of range for {} assets",
                    self.asset_count
                )));
            }
        }
        Ok(())
    }

    /// Switches the active image without touching phase or elapsed time.
    pub fn set_asset(&mut self, index: usize) -> Result<()> {
        if index >= self.asset_count {
            return Err(SlideshowError::msg(format!(
                "image index {index} out of range for {} assets",
                self.asset_count
            )));
        }
        self.current_index = index;
        self.params = self.derive_params();
        Ok(())
    }

    pub fn reset(&mut self) {
        self.current_index = 0;
        self.phase = ImagePhase::FadeIn;
        self.phase_elapsed = 0.0;
        self.finished_through = None;
        self.params = self.derive_params();
    }

    /// True once the last of `total` images has finished fading out. The
    /// check is made at the moment the fade-out ends, before the index
    /// wraps back to the first image.
    pub fn is_cycle_complete(&self, total: usize) -> bool {
        let Some(last) = total.checked_sub(1) else {
            return false;
        };
        self.finished_through.is_some_and(|through| through >= last)
            || (self.current_index == last
                && self.phase == ImagePhase::FadeOut
                && self.phase_elapsed >= self.durations.fade_out)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn phase(&self) -> ImagePhase {
        self.phase
    }

    pub fn phase_elapsed(&self) -> f64 {
        self.phase_elapsed
    }

    pub fn durations(&self) -> &ImageDurations {
        &self.durations
    }

    pub fn params(&self) -> &ImageParams {
        &self.params
    }

    pub fn asset_count(&self) -> usize {
        self.asset_count
    }
}
