//! `bar|beat` positions and beat windows.
//!
//! Bars and beats are 1-based, matching how sequencers display positions:
//! `1|1` is the very start, `2|1.5` is half a beat into the second bar.

use std::fmt;
use std::str::FromStr;

use super::signature::TimeSignature;

/// A 1-based `bar|beat` position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarBeat {
    pub bar: u32,
    pub beat: f64,
}

impl BarBeat {
    /// Create a position. Returns `None` unless `bar >= 1` and `beat >= 1`.
    pub fn new(bar: u32, beat: f64) -> Option<Self> {
        if bar >= 1 && beat >= 1.0 && beat.is_finite() {
            Some(Self { bar, beat })
        } else {
            None
        }
    }

    /// Offset from `1|1` in musical beats.
    pub fn to_beats(self, ts: TimeSignature) -> f64 {
        (self.bar - 1) as f64 * ts.beats_per_bar() + (self.beat - 1.0)
    }

    /// Build a position from a musical-beat offset (negative offsets clamp to `1|1`).
    pub fn from_beats(beats: f64, ts: TimeSignature) -> Self {
        let beats = beats.max(0.0);
        let per_bar = ts.beats_per_bar();
        let bar = (beats / per_bar).floor();
        Self {
            bar: bar as u32 + 1,
            beat: beats - bar * per_bar + 1.0,
        }
    }

    /// Orders positions without needing a time signature.
    pub fn is_before(self, other: BarBeat) -> bool {
        self.bar < other.bar || (self.bar == other.bar && self.beat < other.beat)
    }
}

impl fmt::Display for BarBeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.beat.fract() == 0.0 {
            write!(f, "{}|{}", self.bar, self.beat as u64)
        } else {
            write!(f, "{}|{}", self.bar, self.beat)
        }
    }
}

impl FromStr for BarBeat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (bar, beat) = s
            .split_once('|')
            .ok_or_else(|| format!("expected bar|beat, got '{s}'"))?;
        let bar: u32 = bar
            .trim()
            .parse()
            .map_err(|_| format!("invalid bar in '{s}'"))?;
        let beat: f64 = beat
            .trim()
            .parse()
            .map_err(|_| format!("invalid beat in '{s}'"))?;
        BarBeat::new(bar, beat).ok_or_else(|| format!("bar and beat are 1-based, got '{s}'"))
    }
}

/// A `bar|beat-bar|beat` time-range selector as written in transform source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatRange {
    pub start: BarBeat,
    pub end: BarBeat,
}

impl BeatRange {
    /// Resolve to a musical-beat window for the given time signature.
    pub fn window(self, ts: TimeSignature) -> BeatWindow {
        BeatWindow {
            start: self.start.to_beats(ts),
            end: self.end.to_beats(ts),
        }
    }
}

impl fmt::Display for BeatRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A half-open window `[start, end)` in beats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatWindow {
    pub start: f64,
    pub end: f64,
}

impl BeatWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn length(self) -> f64 {
        self.end - self.start
    }

    pub fn contains(self, position: f64) -> bool {
        position >= self.start && position < self.end
    }

    /// True if `[start, start + length)` intersects this window.
    pub fn overlaps(self, start: f64, length: f64) -> bool {
        start < self.end && start + length > self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn first_beat_is_zero() {
        let pos = BarBeat::new(1, 1.0).unwrap();
        assert_approx_eq!(pos.to_beats(TimeSignature::COMMON), 0.0);
    }

    #[test]
    fn second_bar_in_4_4_and_6_8() {
        let pos = BarBeat::new(2, 1.0).unwrap();
        assert_approx_eq!(pos.to_beats(TimeSignature::COMMON), 4.0);
        assert_approx_eq!(pos.to_beats(TimeSignature::new(6, 8).unwrap()), 6.0);
    }

    #[test]
    fn from_beats_inverts_to_beats() {
        let ts = TimeSignature::new(3, 4).unwrap();
        let pos = BarBeat::from_beats(4.5, ts);
        assert_eq!(pos.bar, 2);
        assert_approx_eq!(pos.beat, 2.5);
        assert_approx_eq!(pos.to_beats(ts), 4.5);
    }

    #[test]
    fn zero_based_positions_rejected() {
        assert!(BarBeat::new(0, 1.0).is_none());
        assert!(BarBeat::new(1, 0.5).is_none());
    }

    #[test]
    fn parse_and_display() {
        let pos: BarBeat = "3|2.5".parse().unwrap();
        assert_eq!(pos.bar, 3);
        assert_approx_eq!(pos.beat, 2.5);
        assert_eq!(pos.to_string(), "3|2.5");
        assert_eq!(BarBeat::new(2, 1.0).unwrap().to_string(), "2|1");
        assert!("3:2".parse::<BarBeat>().is_err());
    }

    #[test]
    fn window_is_half_open() {
        let range = BeatRange {
            start: BarBeat::new(1, 1.0).unwrap(),
            end: BarBeat::new(2, 1.0).unwrap(),
        };
        let window = range.window(TimeSignature::COMMON);
        assert!(window.contains(0.0));
        assert!(window.contains(3.99));
        assert!(!window.contains(4.0));
        assert_approx_eq!(window.length(), 4.0);
    }

    #[test]
    fn overlap_detection() {
        let window = BeatWindow::new(4.0, 8.0);
        assert!(window.overlaps(2.0, 4.0));
        assert!(!window.overlaps(0.0, 4.0));
        assert!(!window.overlaps(8.0, 1.0));
    }

    #[test]
    fn ordering_without_signature() {
        let a = BarBeat::new(1, 3.0).unwrap();
        let b = BarBeat::new(2, 1.0).unwrap();
        assert!(a.is_before(b));
        assert!(!b.is_before(a));
        assert!(!a.is_before(a));
    }
}
