//! Beat-paced phase timers.
//!
//! Both timelines share the same mechanics: a phase enum, a per-phase
//! duration derived from the [`Tempo`], and an elapsed counter that is
//! advanced by the driver. Everything here is pure arithmetic so it can be
//! exercised without a renderer.

use std::f32::consts::FRAC_PI_2;
use std::time::Instant;

use crate::{Result, SlideshowError};

pub mod image;
pub mod text;

pub use image::{ImageDurations, ImageEvents, ImagePhase, ImageSnapshot, ImageTimeline};
pub use text::{TextDurations, TextEvents, TextPhase, TextSnapshot, TextTimeline};

/// Tolerance used when checking restored progress values against the ones
/// implied by phase and elapsed time.
pub(crate) const PROGRESS_TOLERANCE: f32 = 1e-4;

/// Shared musical tempo, converted once into a beat length in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
    beat_seconds: f64,
}

impl Tempo {
    pub fn from_bpm(bpm: f64) -> Result<Self> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(SlideshowError::config(format!(
                "tempo must be a positive number of beats per minute, got {bpm}"
            )));
        }
        Ok(Self {
            bpm,
            beat_seconds: 60.0 / bpm,
        })
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn beat_seconds(&self) -> f64 {
        self.beat_seconds
    }

    /// Converts a beat count into seconds.
    pub fn beats(&self, beats: f64) -> Result<f64> {
        if !beats.is_finite() || beats < 0.0 {
            return Err(SlideshowError::config(format!(
                "phase length must be a non-negative beat count, got {beats}"
            )));
        }
        Ok(beats * self.beat_seconds)
    }
}

/// Linear progress through a phase, clamped to `[0, 1]`. Zero-length phases
/// are always complete.
pub fn ramp(elapsed: f64, duration: f64) -> f32 {
    if duration <= 0.0 {
        return 1.0;
    }
    (elapsed / duration).clamp(0.0, 1.0) as f32
}

/// Ease-out curve used for the second text slot.
pub fn ease_out(progress: f32) -> f32 {
    (progress.clamp(0.0, 1.0) * FRAC_PI_2).sin().clamp(0.0, 1.0)
}

/// A bad tick never moves time backwards or poisons the timeline.
pub fn sanitize_delta(delta: f64) -> f64 {
    if delta.is_finite() && delta > 0.0 {
        delta
    } else {
        0.0
    }
}

pub(crate) fn valid_elapsed(elapsed: f64) -> bool {
    elapsed.is_finite() && elapsed >= 0.0
}

pub(crate) fn valid_progress(progress: f32) -> bool {
    progress.is_finite() && (0.0..=1.0).contains(&progress)
}

/// Wall-clock delta source for real-time playback.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<Instant>,
    max_delta: f64,
}

impl FrameClock {
    pub fn new(max_delta: f64) -> Self {
        Self {
            last: None,
            max_delta: sanitize_delta(max_delta),
        }
    }

    /// Forgets the previous timestamp so the next delta is zero.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Seconds since the previous call, capped at `max_delta`.
    pub fn delta(&mut self, now: Instant) -> f64 {
        let delta = match self.last {
            Some(last) => now.saturating_duration_since(last).as_secs_f64(),
            None => 0.0,
        };
        self.last = Some(now);
        delta.min(self.max_delta)
    }

    pub fn max_delta(&self) -> f64 {
        self.max_delta
    }
}
