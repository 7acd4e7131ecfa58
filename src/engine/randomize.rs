//! Randomized-range transforms.
//!
//! An alternative to a transform block: each configured parameter gets a
//! uniform draw from its range, applied through the same operator/clamp
//! pipeline as a statement would.

use serde::{Deserialize, Serialize};

use super::error::TransformError;
use super::params::write;
use crate::clip::{AudioProps, Note};
use crate::dsl::ast::{AssignOp, Parameter};
use crate::rng::TransformRng;
use crate::time::TimeSignature;

/// Inclusive `[min, max]` range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn validate(&self, name: &str) -> Result<(), TransformError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(TransformError::InvalidRequest(format!(
                "{name} range must be finite"
            )));
        }
        if self.min > self.max {
            return Err(TransformError::InvalidRequest(format!(
                "{name} range min {} is above max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }

    fn draw(&self, rng: &mut TransformRng) -> f64 {
        rng.range(self.min, self.max)
    }
}

impl std::str::FromStr for ValueRange {
    type Err = String;

    /// Parse `min:max`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (min, max) = s
            .split_once(':')
            .ok_or_else(|| format!("expected min:max, got '{s}'"))?;
        let min: f64 = min.trim().parse().map_err(|_| format!("bad min in '{s}'"))?;
        let max: f64 = max.trim().parse().map_err(|_| format!("bad max in '{s}'"))?;
        Ok(Self { min, max })
    }
}

/// Transposition: a semitone range or a list of discrete semitone offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transpose {
    Range(ValueRange),
    Values(Vec<f64>),
}

impl Transpose {
    fn draw(&self, rng: &mut TransformRng) -> f64 {
        match self {
            Transpose::Range(r) => r.draw(rng),
            Transpose::Values(values) if values.is_empty() => 0.0,
            Transpose::Values(values) => values[rng.index(values.len())],
        }
    }
}

/// Per-parameter random ranges for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RandomizeSpec {
    pub velocity: Option<ValueRange>,
    pub deviation: Option<ValueRange>,
    pub probability: Option<ValueRange>,
    /// Multiplier range for note duration.
    pub duration: Option<ValueRange>,
    pub transpose: Option<Transpose>,
    /// dB offset range for audio clips.
    pub gain: Option<ValueRange>,
}

impl RandomizeSpec {
    pub fn is_empty(&self) -> bool {
        self.velocity.is_none()
            && self.deviation.is_none()
            && self.probability.is_none()
            && self.duration.is_none()
            && self.transpose.is_none()
            && self.gain.is_none()
    }

    pub fn validate(&self) -> Result<(), TransformError> {
        let ranges = [
            ("velocity", self.velocity),
            ("deviation", self.deviation),
            ("probability", self.probability),
            ("duration", self.duration),
            ("gain", self.gain),
        ];
        for (name, range) in ranges {
            if let Some(r) = range {
                r.validate(name)?;
            }
        }
        match &self.transpose {
            Some(Transpose::Range(r)) => r.validate("transpose")?,
            Some(Transpose::Values(values)) => {
                if values.is_empty() {
                    return Err(TransformError::InvalidRequest(
                        "transpose value list is empty".into(),
                    ));
                }
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(TransformError::InvalidRequest(
                        "transpose values must be finite".into(),
                    ));
                }
            }
            None => {}
        }
        Ok(())
    }

    /// True if anything here applies to MIDI notes.
    pub fn touches_notes(&self) -> bool {
        self.velocity.is_some()
            || self.deviation.is_some()
            || self.probability.is_some()
            || self.duration.is_some()
            || self.transpose.is_some()
    }

    /// True if anything here applies to audio clips.
    pub fn touches_audio(&self) -> bool {
        self.gain.is_some() || self.transpose.is_some()
    }

    /// Draw and apply every note range. Draw order is fixed: velocity,
    /// deviation, probability, duration, transpose.
    pub fn apply_to_note(&self, note: &mut Note, ts: TimeSignature, rng: &mut TransformRng) {
        let offsets = [
            (Parameter::Velocity, self.velocity),
            (Parameter::Deviation, self.deviation),
            (Parameter::Probability, self.probability),
        ];
        for (parameter, range) in offsets {
            if let Some(r) = range {
                let v = r.draw(rng);
                write(note, parameter, AssignOp::Add, v, ts);
            }
        }
        if let Some(r) = self.duration {
            let v = r.draw(rng);
            write(note, Parameter::Duration, AssignOp::Multiply, v, ts);
        }
        if let Some(t) = &self.transpose {
            let v = t.draw(rng);
            write(note, Parameter::Pitch, AssignOp::Add, v, ts);
        }
    }

    /// Draw and apply gain then transpose to an audio clip.
    pub fn apply_to_audio(&self, props: &mut AudioProps, ts: TimeSignature, rng: &mut TransformRng) {
        if let Some(r) = self.gain {
            let v = r.draw(rng);
            write(props, Parameter::Gain, AssignOp::Add, v, ts);
        }
        if let Some(t) = &self.transpose {
            let v = t.draw(rng);
            write(props, Parameter::PitchShift, AssignOp::Add, v, ts);
        }
    }
}
