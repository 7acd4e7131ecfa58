//! Musical time — time signatures, musical vs. raw beats, periods, and `bar|beat` positions.
//!
//! Two units are in play. A *musical beat* is one denominator note value of the
//! clip's time signature (an eighth note in 6/8). A *raw beat* is the host's
//! storage unit and is always a quarter note. Expressions only ever see musical
//! beats; conversion to raw beats happens when values are committed.

pub mod bar_beat;
pub mod signature;

pub use bar_beat::{BarBeat, BeatRange, BeatWindow};
pub use signature::{beats_from_period, Period, TimeSignature, RAW_BEAT_DENOMINATOR};
