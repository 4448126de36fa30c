use serde::{Deserialize, Serialize};

use super::{
    ease_out, ramp, sanitize_delta, valid_elapsed, valid_progress, Tempo, PROGRESS_TOLERANCE,
};
use crate::{
    config::{check_cycle, TextTiming},
    render::{TextParams, TextSlot},
    Result, SlideshowError,
};

/// Phases of one text pair. The pair is `(base, base + 1)`; the even
/// member lives in the primary slot and the odd member in the secondary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextPhase {
    FadeInEven,
    Stay,
    FadeInOdd,
    BothStay,
    BothOut,
}

impl TextPhase {
    /// Whether the secondary slot contributes to the composited output.
    pub fn has_secondary(self) -> bool {
        matches!(
            self,
            TextPhase::FadeInOdd | TextPhase::BothStay | TextPhase::BothOut
        )
    }
}

/// Phase lengths in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextDurations {
    pub fade_in: f64,
    pub stay: f64,
    pub add_new_text: f64,
    pub both_stay: f64,
    pub both_out: f64,
}

impl TextDurations {
    pub fn from_timing(tempo: &Tempo, timing: &TextTiming) -> Result<Self> {
        let durations = Self {
            fade_in: tempo.beats(timing.fade_in_beats)?,
            stay: tempo.beats(timing.stay_beats)?,
            add_new_text: tempo.beats(timing.add_new_text_beats)?,
            both_stay: tempo.beats(timing.both_stay_beats)?,
            both_out: tempo.beats(timing.both_out_beats)?,
        };
        check_cycle("text", durations.pair_length())?;
        Ok(durations)
    }

    pub fn of(&self, phase: TextPhase) -> f64 {
        match phase {
            TextPhase::FadeInEven => self.fade_in,
            TextPhase::Stay => self.stay,
            TextPhase::FadeInOdd => self.add_new_text,
            TextPhase::BothStay => self.both_stay,
            TextPhase::BothOut => self.both_out,
        }
    }

    /// Time one pair occupies the screen.
    pub fn pair_length(&self) -> f64 {
        self.fade_in + self.stay + self.add_new_text + self.both_stay + self.both_out
    }
}

/// Serializable copy of the text timeline position. Slot activity is stored
/// explicitly and must agree with the phase on restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSnapshot {
    pub base_index: usize,
    pub phase: TextPhase,
    pub phase_elapsed: f64,
    pub slot_a_progress: f32,
    pub slot_b_progress: f32,
    pub slot_b_active: bool,
    /// Highest pair base that has finished fading out since initialization.
    #[serde(default)]
    pub finished_through: Option<usize>,
}

/// What happened during one [`TextTimeline::advance`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextEvents {
    pub pair_changed: bool,
    /// The pair that just cleared was the last one in the sequence.
    pub cycle_finished: bool,
}

#[derive(Debug, Clone)]
pub struct TextTimeline {
    durations: TextDurations,
    asset_count: usize,
    base_index: usize,
    phase: TextPhase,
    phase_elapsed: f64,
    slot_a_progress: f32,
    slot_b_progress: f32,
    slot_b_active: bool,
    finished_through: Option<usize>,
    params: TextParams,
}

impl TextTimeline {
    pub fn new(tempo: &Tempo, timing: &TextTiming, asset_count: usize) -> Result<Self> {
        if asset_count == 0 {
            return Err(SlideshowError::config("text timeline needs at least one asset"));
        }
        let durations = TextDurations::from_timing(tempo, timing)?;
        let mut timeline = Self {
            durations,
            asset_count,
            base_index: 0,
            phase: TextPhase::FadeInEven,
            phase_elapsed: 0.0,
            slot_a_progress: 0.0,
            slot_b_progress: 0.0,
            slot_b_active: false,
            finished_through: None,
            params: TextParams {
                primary: TextSlot::hidden(0),
                secondary: TextSlot::hidden(0),
            },
        };
        timeline.initialize();
        Ok(timeline)
    }

    /// Advances by `delta` seconds. `sync_hint` is the image timeline's
    /// current index and is only used for logging.
    pub fn update(&mut self, delta: f64, sync_hint: usize) -> TextEvents {
        let events = self.advance(delta);
        if events.pair_changed {
            tracing::info!(
                base = self.base_index,
                image = sync_hint,
                cycle_finished = events.cycle_finished,
                "text pair advanced"
            );
        }
        events
    }

    /// Advances by `delta` seconds, carrying overflow across phase
    /// boundaries. At most one pair advance happens per call.
    pub fn advance(&mut self, delta: f64) -> TextEvents {
        let mut events = TextEvents::default();
        self.phase_elapsed += sanitize_delta(delta);

        loop {
            let duration = self.durations.of(self.phase);
            if self.phase_elapsed < duration {
                break;
            }
            let overflow = self.phase_elapsed - duration;

            match self.phase {
                TextPhase::FadeInEven => self.enter(TextPhase::Stay, overflow),
                TextPhase::Stay => self.enter(TextPhase::FadeInOdd, overflow),
                TextPhase::FadeInOdd => self.enter(TextPhase::BothStay, overflow),
                TextPhase::BothStay => self.enter(TextPhase::BothOut, overflow),
                TextPhase::BothOut => {
                    let finished = self.base_index;
                    self.finished_through = Some(
                        self.finished_through
                            .map_or(finished, |through| through.max(finished)),
                    );
                    events.cycle_finished = last_base(self.asset_count) == Some(finished);

                    self.base_index += 2;
                    if self.base_index >= self.asset_count {
                        self.base_index = 0;
                    }
                    self.enter(TextPhase::FadeInEven, overflow);
                    events.pair_changed = true;
                    break;
                }
            }
        }

        self.refresh();
        events
    }

    fn enter(&mut self, phase: TextPhase, elapsed: f64) {
        tracing::debug!(base = self.base_index, from = ?self.phase, to = ?phase, "text phase");
        self.phase = phase;
        self.phase_elapsed = elapsed;
    }

    fn refresh(&mut self) {
        let (a, b) = self.slot_progress(self.phase, self.phase_elapsed);
        self.slot_a_progress = a;
        self.slot_b_progress = b;
        self.slot_b_active = self.phase.has_secondary();
        self.params = TextParams {
            primary: TextSlot {
                asset: self.base_index,
                progress: a,
                visible: true,
            },
            secondary: TextSlot {
                asset: self.secondary_asset(),
                progress: b,
                visible: self.slot_b_active,
            },
        };
    }

    fn slot_progress(&self, phase: TextPhase, elapsed: f64) -> (f32, f32) {
        match phase {
            TextPhase::FadeInEven => (ramp(elapsed, self.durations.fade_in), 0.0),
            TextPhase::Stay => (1.0, 0.0),
            TextPhase::FadeInOdd => (1.0, ease_out(ramp(elapsed, self.durations.add_new_text))),
            TextPhase::BothStay => (1.0, 1.0),
            TextPhase::BothOut => {
                let out = 1.0 - ramp(elapsed, self.durations.both_out);
                (out, out)
            }
        }
    }

    /// An odd-length sequence pairs its last text with the first one.
    fn secondary_asset(&self) -> usize {
        (self.base_index + 1) % self.asset_count
    }

    pub fn snapshot(&self) -> TextSnapshot {
        TextSnapshot {
            base_index: self.base_index,
            phase: self.phase,
            phase_elapsed: self.phase_elapsed,
            slot_a_progress: self.slot_a_progress,
            slot_b_progress: self.slot_b_progress,
            slot_b_active: self.slot_b_active,
            finished_through: self.finished_through,
        }
    }

    /// Restores a previously captured position. An inconsistent snapshot
    /// re-initializes the timeline and is reported as
    /// [`SlideshowError::InvalidSnapshot`].
    pub fn restore_snapshot(&mut self, snapshot: &TextSnapshot) -> Result<()> {
        if let Err(err) = self.check_snapshot(snapshot) {
            tracing::warn!(%err, "rejecting text snapshot, re-initializing timeline");
            self.initialize();
            return Err(err);
        }

        self.base_index = snapshot.base_index;
        self.phase = snapshot.phase;
        self.phase_elapsed = snapshot.phase_elapsed;
        self.finished_through = snapshot.finished_through;
        self.refresh();
        Ok(())
    }

    fn check_snapshot(&self, snapshot: &TextSnapshot) -> Result<()> {
        let reject = |msg: String| -> Result<()> { Err(SlideshowError::invalid_snapshot(msg)) };

        if snapshot.base_index >= self.asset_count || snapshot.base_index % 2 != 0 {
            return reject(format!(
                "text base index {} must be even and below {}",
                snapshot.base_index, self.asset_count
            ));
        }
        if !valid_elapsed(snapshot.phase_elapsed) {
            return reject(format!(
                "text phase time {} is not a non-negative number",
                snapshot.phase_elapsed
            ));
        }
        if !valid_progress(snapshot.slot_a_progress) || !valid_progress(snapshot.slot_b_progress) {
            return reject(format!(
                "slot progress ({}, {}) outside [0, 1]",
                snapshot.slot_a_progress, snapshot.slot_b_progress
            ));
        }
        if snapshot.slot_b_active != snapshot.phase.has_secondary() {
            return reject(format!(
                "secondary slot active={} contradicts phase {:?}",
                snapshot.slot_b_active, snapshot.phase
            ));
        }
        if !snapshot.slot_b_active && snapshot.slot_b_progress != 0.0 {
            return reject(format!(
                "inactive secondary slot carries progress {}",
                snapshot.slot_b_progress
            ));
        }

        let (a, b) = self.slot_progress(snapshot.phase, snapshot.phase_elapsed);
        if (a - snapshot.slot_a_progress).abs() > PROGRESS_TOLERANCE
            || (b - snapshot.slot_b_progress).abs() > PROGRESS_TOLERANCE
        {
            return reject(format!(
                "slot progress ({}, {}) does not match phase {:?} at {}s",
                snapshot.slot_a_progress,
                snapshot.slot_b_progress,
                snapshot.phase,
                snapshot.phase_elapsed
            ));
        }

        if let Some(through) = snapshot.finished_through {
            if through >= self.asset_count || through % 2 != 0 {
                return reject(format!("finished pair base {through} is not a valid base"));
            }
        }
        Ok(())
    }

    /// Back to the first pair with only the primary slot showing.
    pub fn initialize(&mut self) {
        self.base_index = 0;
        self.phase = TextPhase::FadeInEven;
        self.phase_elapsed = 0.0;
        self.finished_through = None;
        self.refresh();
    }

    /// True once the last pair of `total` texts has finished fading out.
    pub fn is_cycle_complete(&self, total: usize) -> bool {
        let Some(last) = last_base(total) else {
            return false;
        };
        self.finished_through.is_some_and(|through| through >= last)
            || (self.base_index == last
                && self.phase == TextPhase::BothOut
                && self.phase_elapsed >= self.durations.both_out)
    }

    pub fn current_index(&self) -> usize {
        self.base_index
    }

    /// Text shown in the secondary slot for the current pair.
    pub fn next_index(&self) -> usize {
        self.secondary_asset()
    }

    pub fn phase(&self) -> TextPhase {
        self.phase
    }

    pub fn phase_elapsed(&self) -> f64 {
        self.phase_elapsed
    }

    pub fn durations(&self) -> &TextDurations {
        &self.durations
    }

    pub fn params(&self) -> &TextParams {
        &self.params
    }

    pub fn asset_count(&self) -> usize {
        self.asset_count
    }
}

/// Base index of the final pair: `total - 2` when even, `total - 1` when odd.
fn last_base(total: usize) -> Option<usize> {
    if total == 0 {
        return None;
    }
    Some(if total % 2 == 0 { total - 2 } else { total - 1 })
}
