use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Resolution of the beat axis. Every `Beat` is an integer multiple of `1 / TICKS_PER_BEAT`.
pub const TICKS_PER_BEAT: i32 = 192;

/// Tempo used to synthesize a tick-0 change when a tempo map does not start at zero.
pub const FALLBACK_TEMPO_BPM: f64 = 160.0;

#[inline(always)]
pub fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Linearly remaps `v` from `[in_start, in_end]` onto `[out_start, out_end]`.
/// Values outside the input range are extrapolated.
#[inline(always)]
pub fn convert_range(in_start: f64, in_end: f64, out_start: f64, out_end: f64, v: f64) -> f64 {
    (v - in_start) / (in_end - in_start) * (out_end - out_start) + out_start
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Beat {
    pub ticks: i32,
}

impl Beat {
    #[inline(always)]
    pub const fn zero() -> Self {
        Self { ticks: 0 }
    }

    #[inline(always)]
    pub const fn from_ticks(ticks: i32) -> Self {
        Self { ticks }
    }

    #[inline(always)]
    pub const fn from_beats(beats: i32) -> Self {
        Self { ticks: beats * TICKS_PER_BEAT }
    }

    /// Rounds a fractional beat position to the nearest tick.
    #[inline(always)]
    pub fn from_beats_fraction(beats: f64) -> Self {
        Self { ticks: (beats * TICKS_PER_BEAT as f64).round() as i32 }
    }

    #[inline(always)]
    pub fn to_beats(self) -> f64 {
        self.ticks as f64 / TICKS_PER_BEAT as f64
    }
}

/// A point on the continuous time axis, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Time {
    pub seconds: f64,
}

impl Time {
    #[inline(always)]
    pub const fn zero() -> Self {
        Self { seconds: 0.0 }
    }

    #[inline(always)]
    pub const fn from_sec(seconds: f64) -> Self {
        Self { seconds }
    }

    #[inline(always)]
    pub fn from_ms(ms: f64) -> Self {
        Self { seconds: ms / 1000.0 }
    }

    #[inline(always)]
    pub const fn to_sec(self) -> f64 {
        self.seconds
    }

    #[inline(always)]
    pub fn to_ms(self) -> f64 {
        self.seconds * 1000.0
    }
}

impl Add for Time {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { seconds: self.seconds + rhs.seconds }
    }
}

impl Sub for Time {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self { seconds: self.seconds - rhs.seconds }
    }
}

impl Neg for Time {
    type Output = Self;
    fn neg(self) -> Self {
        Self { seconds: -self.seconds }
    }
}

impl Mul<f64> for Time {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self { seconds: self.seconds * rhs }
    }
}

impl Mul<i32> for Time {
    type Output = Self;
    fn mul(self, rhs: i32) -> Self {
        Self { seconds: self.seconds * rhs as f64 }
    }
}

/// Ratio of two durations.
impl Div for Time {
    type Output = f64;
    fn div(self, rhs: Self) -> f64 {
        self.seconds / rhs.seconds
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Tempo {
    pub bpm: f64,
}

impl Default for Tempo {
    fn default() -> Self {
        Self { bpm: FALLBACK_TEMPO_BPM }
    }
}

impl Tempo {
    #[inline(always)]
    pub const fn new(bpm: f64) -> Self {
        Self { bpm }
    }

    /// Signed length of one beat. Negative for reverse-scrolling tempos.
    #[inline(always)]
    pub fn beat_duration(self) -> Time {
        Time::from_sec(60.0 / self.bpm)
    }

    /// Unsigned length of one tick. Time always advances, whatever the sign of the BPM.
    #[inline(always)]
    pub fn tick_duration(self) -> Time {
        Time::from_sec((60.0 / self.bpm.abs()) / TICKS_PER_BEAT as f64)
    }

    #[inline(always)]
    pub fn signed_tick_duration(self) -> Time {
        Time::from_sec((60.0 / self.bpm) / TICKS_PER_BEAT as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoChange {
    pub beat: Beat,
    pub tempo: Tempo,
}

impl TempoChange {
    #[inline(always)]
    pub const fn new(beat: Beat, tempo: Tempo) -> Self {
        Self { beat, tempo }
    }

    #[inline(always)]
    pub const fn at_tick(ticks: i32, bpm: f64) -> Self {
        Self { beat: Beat::from_ticks(ticks), tempo: Tempo::new(bpm) }
    }
}
