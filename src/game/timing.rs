use crate::config::TimelineConfig;
use crate::game::beat::{
    Beat, FALLBACK_TEMPO_BPM, TICKS_PER_BEAT, Tempo, TempoChange, Time, convert_range, sign,
};
use log::{debug, trace};
use std::borrow::Cow;

/// How `time_to_beat` settles on a tick when the query falls between two tabulated times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BeatRounding {
    /// Closest tabulated tick. Equal distances resolve to the earlier tick.
    #[default]
    Nearest,
    /// The tick at or before the query.
    Truncate,
}

/// Dense per-tick lookup tables built from a sorted tempo map.
///
/// `time_at_tick[t]` is the time of tick `t` and `hb_scroll_tick_at_tick[t]` its
/// HBScroll position. Ticks outside `[0, len)` are extrapolated using the first or
/// last tempo. The tables are replaced wholesale by `rebuild`; queries never mutate.
#[derive(Debug, Clone)]
pub struct TempoTimelineIndex {
    time_at_tick: Vec<Time>,
    hb_scroll_tick_at_tick: Vec<f64>,
    first_tempo_bpm: f64,
    last_tempo_bpm: f64,
    fallback_tempo: Tempo,
}

impl Default for TempoTimelineIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl TempoTimelineIndex {
    /// An index over an empty tempo map: a single tick at the fallback tempo.
    pub fn new() -> Self {
        Self::with_fallback_tempo(Tempo::new(FALLBACK_TEMPO_BPM))
    }

    pub fn with_fallback_tempo(fallback_tempo: Tempo) -> Self {
        let mut index = Self {
            time_at_tick: Vec::new(),
            hb_scroll_tick_at_tick: Vec::new(),
            first_tempo_bpm: fallback_tempo.bpm,
            last_tempo_bpm: fallback_tempo.bpm,
            fallback_tempo,
        };
        index.rebuild(&[]);
        index
    }

    pub fn from_config(config: &TimelineConfig) -> Self {
        Self::with_fallback_tempo(config.fallback_tempo())
    }

    pub fn from_tempo_changes(tempo_changes: &[TempoChange]) -> Self {
        let mut index = Self::new();
        index.rebuild(tempo_changes);
        index
    }

    #[inline(always)]
    pub const fn fallback_tempo(&self) -> Tempo {
        self.fallback_tempo
    }

    /// Replaces both tables. `tempo_changes` must be sorted by beat and carry
    /// sanitized (finite, nonzero) BPM values; nothing is validated here.
    pub fn rebuild(&mut self, tempo_changes: &[TempoChange]) {
        let tempo_changes: Cow<'_, [TempoChange]> = match tempo_changes.first() {
            Some(first) if first.beat == Beat::zero() => Cow::Borrowed(tempo_changes),
            _ => {
                trace!(
                    "Tempo map does not start at tick 0; prepending fallback {} BPM.",
                    self.fallback_tempo.bpm
                );
                let mut adjusted = Vec::with_capacity(tempo_changes.len() + 1);
                adjusted.push(TempoChange::new(Beat::zero(), self.fallback_tempo));
                adjusted.extend_from_slice(tempo_changes);
                Cow::Owned(adjusted)
            }
        };
        let tempo_count = tempo_changes.len();

        let tick_count = tempo_changes
            .last()
            .map_or(0, |last| last.beat.ticks.max(0) as usize + 1);
        self.time_at_tick.clear();
        self.time_at_tick.resize(tick_count, Time::zero());
        self.hb_scroll_tick_at_tick.clear();
        self.hb_scroll_tick_at_tick.resize(tick_count, 0.0);

        let mut last_end_time = 0.0_f64;
        let mut last_end_hb_scroll_tick = 0.0_f64;
        for (tempo_index, change) in tempo_changes.iter().enumerate() {
            let bpm = change.tempo.bpm;
            let beat_duration = 60.0 / bpm;
            let tick_duration = change.tempo.tick_duration().to_sec();
            let tick_sign = sign(beat_duration);

            let start = (change.beat.ticks.max(0) as usize).min(tick_count);
            let end = tempo_changes
                .get(tempo_index + 1)
                .map_or(tick_count, |next| (next.beat.ticks.max(0) as usize).min(tick_count));

            for (i, t) in (start..end).enumerate() {
                self.time_at_tick[t] = Time::from_sec(tick_duration * i as f64 + last_end_time);
                self.hb_scroll_tick_at_tick[t] = tick_sign * i as f64 + last_end_hb_scroll_tick;
            }

            // Carry one step past the segment end so the next segment starts seamlessly.
            if tempo_count > 1 && end > start {
                last_end_time = self.time_at_tick[end - 1].to_sec() + tick_duration;
                last_end_hb_scroll_tick = self.hb_scroll_tick_at_tick[end - 1] + tick_sign;
            }

            if tempo_index == 0 {
                self.first_tempo_bpm = bpm;
            }
            self.last_tempo_bpm = bpm;
        }

        debug!(
            "TempoTimelineIndex rebuilt: {} ticks from {} tempo changes.",
            tick_count, tempo_count
        );
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.time_at_tick.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.time_at_tick.is_empty()
    }

    #[inline(always)]
    pub fn first_tempo_bpm(&self) -> f64 {
        self.first_tempo_bpm
    }

    #[inline(always)]
    pub fn last_tempo_bpm(&self) -> f64 {
        self.last_tempo_bpm
    }

    pub fn time_at_tick(&self) -> &[Time] {
        &self.time_at_tick
    }

    pub fn hb_scroll_tick_at_tick(&self) -> &[f64] {
        &self.hb_scroll_tick_at_tick
    }

    #[inline(always)]
    pub fn last_calculated_time(&self) -> Time {
        self.time_at_tick.last().copied().unwrap_or_default()
    }

    #[inline(always)]
    pub fn last_calculated_hb_scroll_tick(&self) -> f64 {
        self.hb_scroll_tick_at_tick.last().copied().unwrap_or(0.0)
    }

    #[inline(always)]
    fn first_tick_duration(&self) -> Time {
        Tempo::new(self.first_tempo_bpm).tick_duration()
    }

    #[inline(always)]
    fn last_tick_duration(&self) -> Time {
        Tempo::new(self.last_tempo_bpm).tick_duration()
    }

    pub fn beat_to_time(&self, beat: Beat) -> Time {
        let tick_count = self.time_at_tick.len() as i64;
        let ticks = beat.ticks as i64;

        if ticks < 0 {
            // Tempo changes only live on positive ticks, so the first tempo extends backwards.
            self.first_tick_duration() * beat.ticks
        } else if ticks >= tick_count {
            let remaining_ticks = (ticks - tick_count + 1) as f64;
            self.last_calculated_time() + self.last_tick_duration() * remaining_ticks
        } else {
            self.time_at_tick[ticks as usize]
        }
    }

    #[inline(always)]
    pub fn time_to_beat(&self, time: Time) -> Beat {
        self.time_to_beat_with(time, BeatRounding::Nearest)
    }

    #[inline(always)]
    pub fn time_to_beat_truncated(&self, time: Time) -> Beat {
        self.time_to_beat_with(time, BeatRounding::Truncate)
    }

    pub fn time_to_beat_with(&self, time: Time, rounding: BeatRounding) -> Beat {
        let tick_count = self.time_at_tick.len() as i64;
        let last_time = self.last_calculated_time();

        if time < Time::zero() {
            let ticks = (time / self.first_tick_duration()).floor();
            return Beat::from_ticks(ticks as i32);
        }
        if time >= last_time {
            let ticks_past_last = ((time - last_time) / self.last_tick_duration()).floor();
            // Float-to-int casts saturate, so far-off times pin to the i32 range.
            return Beat::from_ticks(((tick_count - 1) as f64 + ticks_past_last) as i32);
        }

        let times = &self.time_at_tick;
        let (mut left, mut right) = (0_i64, tick_count - 1);
        while left <= right {
            let mid = (left + right) / 2;
            let mid_time = times[mid as usize];
            if time < mid_time {
                right = mid - 1;
            } else if time > mid_time {
                left = mid + 1;
            } else {
                return Beat::from_ticks(mid as i32);
            }
        }

        // left == right + 1; time lies strictly between times[right] and times[left].
        let tick = match rounding {
            BeatRounding::Truncate => right,
            BeatRounding::Nearest => {
                let to_left = times[left as usize] - time;
                let to_right = time - times[right as usize];
                if to_left < to_right { left } else { right }
            }
        };
        Beat::from_ticks(tick as i32)
    }

    /// Continuous HBScroll position for `time`, anchored on the integer tick `beat`.
    ///
    /// `time` is remapped through the tabulated pair at `beat` and `beat + 1` and may
    /// fall outside that pair, in which case the segment's slope is extrapolated
    /// rather than switching to the neighbouring tempo, matching TaikoJiro for notes
    /// whose time offset crosses a tempo change.
    pub fn beat_and_time_to_hb_scroll_tick(&self, beat: Beat, time: Time) -> f64 {
        let tick_count = self.time_at_tick.len() as i64;
        let ticks = beat.ticks as i64;

        if ticks < 0 {
            time / Tempo::new(self.first_tempo_bpm).signed_tick_duration()
        } else if ticks + 1 >= tick_count {
            let time_past_last = time - self.last_calculated_time();
            let ticks_past_last =
                time_past_last / Tempo::new(self.last_tempo_bpm).signed_tick_duration();
            self.last_calculated_hb_scroll_tick() + ticks_past_last
        } else {
            let t = ticks as usize;
            convert_range(
                self.time_at_tick[t].to_sec(),
                self.time_at_tick[t + 1].to_sec(),
                self.hb_scroll_tick_at_tick[t],
                self.hb_scroll_tick_at_tick[t + 1],
                time.to_sec(),
            )
        }
    }

    /// HBScroll position at `time`, anchored on the tick at or before it.
    #[inline(always)]
    pub fn time_to_hb_scroll_tick(&self, time: Time) -> f64 {
        self.beat_and_time_to_hb_scroll_tick(self.time_to_beat_truncated(time), time)
    }

    #[inline(always)]
    pub fn time_to_hb_scroll_beat(&self, time: Time) -> f64 {
        self.time_to_hb_scroll_tick(time) / TICKS_PER_BEAT as f64
    }
}
