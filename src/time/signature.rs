//! Time signatures and conversion between musical and raw beats.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Note value of one raw (storage) beat: a quarter note.
pub const RAW_BEAT_DENOMINATOR: u32 = 4;

/// A time signature such as 4/4 or 6/8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}

impl TimeSignature {
    pub const COMMON: TimeSignature = TimeSignature {
        numerator: 4,
        denominator: 4,
    };

    /// Create a time signature. Returns `None` if either part is zero.
    pub fn new(numerator: u32, denominator: u32) -> Option<Self> {
        if numerator == 0 || denominator == 0 {
            None
        } else {
            Some(Self {
                numerator,
                denominator,
            })
        }
    }

    /// Raw beats per musical beat (0.5 in 6/8, 2.0 in 2/2).
    pub fn raw_per_beat(self) -> f64 {
        RAW_BEAT_DENOMINATOR as f64 / self.denominator as f64
    }

    /// Musical beats per bar.
    pub fn beats_per_bar(self) -> f64 {
        self.numerator as f64
    }

    /// Convert a raw-beat value to musical beats.
    pub fn to_musical(self, raw: f64) -> f64 {
        raw / self.raw_per_beat()
    }

    /// Convert a musical-beat value to raw beats.
    pub fn to_raw(self, musical: f64) -> f64 {
        musical * self.raw_per_beat()
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::COMMON
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl FromStr for TimeSignature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (num, den) = s
            .split_once('/')
            .ok_or_else(|| format!("expected N/D time signature, got '{s}'"))?;
        let numerator: u32 = num
            .trim()
            .parse()
            .map_err(|_| format!("invalid numerator in '{s}'"))?;
        let denominator: u32 = den
            .trim()
            .parse()
            .map_err(|_| format!("invalid denominator in '{s}'"))?;
        TimeSignature::new(numerator, denominator)
            .ok_or_else(|| format!("time signature parts must be > 0, got '{s}'"))
    }
}

/// A period literal: `bars:beats` followed by `t` (`1:0t`, `0:0.5t`), or `Nt`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Period {
    pub bars: u64,
    pub beats: f64,
}

/// Resolve a period literal to musical beats in the given time signature.
///
/// One bar is `numerator` musical beats, so `1:0t` is 4 beats in 4/4 and
/// 6 beats in 6/8.
pub fn beats_from_period(period: Period, ts: TimeSignature) -> f64 {
    period.bars as f64 * ts.beats_per_bar() + period.beats
}
