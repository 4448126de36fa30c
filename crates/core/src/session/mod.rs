//! Driver loop tying the two timelines to a render sink.
//!
//! Each tick feeds the same delta to the image timeline and then to the
//! text timeline, writes both parameter sets to the sink and checks whether
//! both sequences have completed a full cycle. A finished session stays
//! finished until it is reset.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::{
    assets::AssetStore,
    config::AppConfig,
    render::RenderSink,
    timeline::{
        sanitize_delta, FrameClock, ImageSnapshot, ImageTimeline, Tempo, TextSnapshot,
        TextTimeline,
    },
    Result, SlideshowError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Playing,
    Paused,
    Finished,
}

/// Everything needed to resume playback at the same point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub image: ImageSnapshot,
    pub text: TextSnapshot,
    pub elapsed_seconds: f64,
}

impl SessionSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }
}

/// Outcome of a single [`Session::tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    /// Seconds actually fed to the timelines after capping.
    pub delta: f64,
    pub image_advanced: bool,
    pub text_pair_changed: bool,
    /// Set on the tick where both sequences completed.
    pub finished: bool,
}

#[derive(Debug)]
pub struct Session {
    tempo: Tempo,
    assets: AssetStore,
    image: ImageTimeline,
    text: TextTimeline,
    clock: FrameClock,
    state: SessionState,
    paused: Option<SessionSnapshot>,
    elapsed: f64,
}

impl Session {
    pub fn new(config: &AppConfig) -> Result<Self> {
        config.validate()?;

        let tempo = Tempo::from_bpm(config.tempo_bpm)?;
        let assets = AssetStore::from_config(&config.assets)?;
        let mut image = ImageTimeline::new(&tempo, &config.image, assets.image_count())?;
        image.set_asset(0)?;
        let mut text = TextTimeline::new(&tempo, &config.text, assets.text_count())?;
        text.initialize();

        tracing::debug!(
            bpm = tempo.bpm(),
            images = assets.image_count(),
            texts = assets.text_count(),
            "session created"
        );

        Ok(Self {
            tempo,
            assets,
            image,
            text,
            clock: FrameClock::new(config.playback.max_delta_seconds),
            state: SessionState::Playing,
            paused: None,
            elapsed: 0.0,
        })
    }

    /// Advances both timelines by `delta` seconds and pushes the resulting
    /// parameters into `sink`. Paused or finished sessions ignore the call.
    pub fn tick<S: RenderSink + ?Sized>(&mut self, delta: f64, sink: &mut S) -> TickReport {
        if self.state != SessionState::Playing {
            return TickReport::default();
        }

        let requested = sanitize_delta(delta);
        let delta = requested.min(self.clock.max_delta());
        if requested > delta {
            tracing::warn!(requested, capped = delta, "clamping oversized frame delta");
        }

        let image_events = self.image.advance(delta);
        let text_events = self.text.update(delta, self.image.current_index());

        sink.apply_image(self.image.params());
        sink.apply_text(self.text.params());
        self.elapsed += delta;

        let finished = self.is_complete();
        if finished {
            self.state = SessionState::Finished;
            tracing::info!(elapsed = self.elapsed, "slideshow cycle complete");
        }

        TickReport {
            delta,
            image_advanced: image_events.advanced,
            text_pair_changed: text_events.pair_changed,
            finished,
        }
    }

    /// Real-time variant of [`Session::tick`] that reads the delta from the
    /// session clock.
    pub fn frame<S: RenderSink + ?Sized>(&mut self, now: Instant, sink: &mut S) -> TickReport {
        let delta = self.clock.delta(now);
        self.tick(delta, sink)
    }

    /// Joint completion: both sequences have shown their last asset.
    pub fn is_complete(&self) -> bool {
        self.image.is_cycle_complete(self.assets.image_count())
            && self.text.is_cycle_complete(self.assets.text_count())
    }

    /// Freezes playback and returns the captured position. Returns `None`
    /// unless the session was playing.
    pub fn pause(&mut self) -> Option<SessionSnapshot> {
        if self.state != SessionState::Playing {
            return None;
        }
        let snapshot = self.snapshot();
        self.paused = Some(snapshot.clone());
        self.state = SessionState::Paused;
        tracing::info!(elapsed = self.elapsed, "playback paused");
        Some(snapshot)
    }

    /// Restores the position captured by [`Session::pause`]. The clock is
    /// reset so the paused time is never fed into the timelines.
    pub fn resume(&mut self) -> Result<()> {
        let Some(snapshot) = self.paused.take() else {
            return Err(SlideshowError::msg("session is not paused"));
        };
        self.restore(&snapshot)?;
        tracing::info!(elapsed = self.elapsed, "playback resumed");
        Ok(())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            image: self.image.snapshot(),
            text: self.text.snapshot(),
            elapsed_seconds: self.elapsed,
        }
    }

    /// Restores both timelines. If either half is rejected the whole
    /// session starts over from the beginning and the error is returned.
    pub fn restore(&mut self, snapshot: &SessionSnapshot) -> Result<()> {
        let restored = self
            .image
            .restore_snapshot(&snapshot.image)
            .and_then(|()| self.text.restore_snapshot(&snapshot.text));

        self.paused = None;
        self.clock.reset();
        if let Err(err) = restored {
            self.reset();
            return Err(err);
        }

        self.elapsed = sanitize_delta(snapshot.elapsed_seconds);
        self.state = if self.is_complete() {
            SessionState::Finished
        } else {
            SessionState::Playing
        };
        Ok(())
    }

    /// Starts over from the first image and the first text pair.
    pub fn reset(&mut self) {
        self.image.reset();
        self.text.initialize();
        self.clock.reset();
        self.paused = None;
        self.elapsed = 0.0;
        self.state = SessionState::Playing;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn tempo(&self) -> &Tempo {
        &self.tempo
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn image(&self) -> &ImageTimeline {
        &self.image
    }

    pub fn text(&self) -> &TextTimeline {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{AssetConfig, PlaybackConfig},
        render::RenderGraph,
        timeline::{ImagePhase, TextPhase},
    };

    fn small_config() -> AppConfig {
        AppConfig {
            assets: AssetConfig {
                images: vec!["a.png".into(), "b.png".into()],
                texts: (0..4).map(|i| format!("t{i}.png")).collect(),
            },
            playback: PlaybackConfig {
                fps: 60,
                max_delta_seconds: 1.0,
            },
            ..AppConfig::default()
        }
    }

    #[test]
    fn stops_once_both_sequences_complete() {
        let mut session = Session::new(&small_config()).unwrap();
        let mut graph = RenderGraph::new();

        let mut finished_on = None;
        for tick in 1..=100 {
            let report = session.tick(0.25, &mut graph);
            if report.finished {
                finished_on = Some(tick);
                break;
            }
        }

        // Text finishes its two pairs after 12s, images their two slides after 16s.
        assert_eq!(finished_on, Some(64));
        assert_eq!(session.state(), SessionState::Finished);
        assert_eq!(graph.frames(), 64);

        let report = session.tick(0.25, &mut graph);
        assert_eq!(report, TickReport::default());
        assert_eq!(graph.frames(), 64);
    }

    #[test]
    fn writes_parameters_every_tick() {
        let mut session = Session::new(&small_config()).unwrap();
        let mut graph = RenderGraph::new();

        session.tick(0.05, &mut graph);
        let image = graph.image().unwrap();
        assert_eq!(image.active_asset, 0);
        assert!(image.blur_strength < 1.0);
        let text = graph.text().unwrap();
        assert!(text.primary.visible);
        assert!(!text.secondary.visible);
    }

    #[test]
    fn caps_oversized_deltas() {
        let mut session = Session::new(&small_config()).unwrap();
        let mut graph = RenderGraph::new();

        let report = session.tick(30.0, &mut graph);
        assert_eq!(report.delta, 1.0);
        assert_eq!(session.elapsed(), 1.0);
        assert_eq!(session.image().phase(), ImagePhase::FadeIn);

        let report = session.tick(f64::NAN, &mut graph);
        assert_eq!(report.delta, 0.0);
    }

    #[test]
    fn pause_and_resume_keep_position() {
        let mut session = Session::new(&small_config()).unwrap();
        let mut reference = Session::new(&small_config()).unwrap();
        let mut graph = RenderGraph::new();
        let mut reference_graph = RenderGraph::new();

        for _ in 0..30 {
            session.tick(0.1, &mut graph);
            reference.tick(0.1, &mut reference_graph);
        }

        let captured = session.pause().unwrap();
        assert_eq!(session.state(), SessionState::Paused);
        assert!(session.pause().is_none());
        for _ in 0..50 {
            assert_eq!(session.tick(0.1, &mut graph), TickReport::default());
        }
        assert_eq!(session.snapshot(), captured);

        session.resume().unwrap();
        assert_eq!(session.state(), SessionState::Playing);
        assert!(session.resume().is_err());

        for _ in 0..40 {
            session.tick(0.1, &mut graph);
            reference.tick(0.1, &mut reference_graph);
        }
        assert_eq!(graph.image(), reference_graph.image());
        assert_eq!(graph.text(), reference_graph.text());
        assert_eq!(session.snapshot(), reference.snapshot());
    }

    #[test]
    fn snapshot_survives_json() {
        let mut session = Session::new(&small_config()).unwrap();
        let mut graph = RenderGraph::new();
        for _ in 0..23 {
            session.tick(0.25, &mut graph);
        }

        let json = session.snapshot().to_json().unwrap();
        let parsed = SessionSnapshot::from_json(&json).unwrap();
        assert_eq!(parsed, session.snapshot());

        let mut other = Session::new(&small_config()).unwrap();
        other.restore(&parsed).unwrap();
        assert_eq!(other.text().phase(), session.text().phase());
        assert_eq!(other.image().current_index(), session.image().current_index());
    }

    #[test]
    fn rejected_snapshot_restarts_both_timelines() {
        let mut session = Session::new(&small_config()).unwrap();
        let mut graph = RenderGraph::new();
        for _ in 0..20 {
            session.tick(0.25, &mut graph);
        }

        let mut bad = session.snapshot();
        bad.text.slot_b_active = !bad.text.slot_b_active;
        let err = session.restore(&bad).unwrap_err();

        assert!(matches!(err, SlideshowError::InvalidSnapshot(_)));
        assert_eq!(session.elapsed(), 0.0);
        assert_eq!(session.image().phase(), ImagePhase::FadeIn);
        assert_eq!(session.image().phase_elapsed(), 0.0);
        assert_eq!(session.text().phase(), TextPhase::FadeInEven);
        assert_eq!(session.state(), SessionState::Playing);
    }

    #[test]
    fn first_frame_after_resume_has_no_delta() {
        let mut session = Session::new(&small_config()).unwrap();
        let mut graph = RenderGraph::new();
        let start = Instant::now();

        assert_eq!(session.frame(start, &mut graph).delta, 0.0);
        session.pause();
        session.resume().unwrap();

        let later = start + std::time::Duration::from_secs(5);
        assert_eq!(session.frame(later, &mut graph).delta, 0.0);
    }

    #[test]
    fn rejects_invalid_configuration() {
        let mut config = small_config();
        config.tempo_bpm = -10.0;
        assert!(matches!(
            Session::new(&config).unwrap_err(),
            SlideshowError::Config(_)
        ));

        let mut config = small_config();
        config.assets.texts.clear();
        assert!(Session::new(&config).is_err());
    }
}
