//! Parameter pipeline — operator application followed by a single clamp.
//!
//! Every committed write goes through [`clamp`]. Note time values (`timing`,
//! `duration`) are read and written in musical beats; conversion to raw beats
//! happens inside the [`Parameterized`] implementations.

use crate::clip::{AudioProps, Note};
use crate::dsl::ast::{AssignOp, BinaryOp, Parameter};
use crate::dsl::eval::binary;
use crate::time::TimeSignature;

/// Valid range and rounding for a parameter. `None` bounds are open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampRule {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub round: bool,
}

/// The clamp table.
pub fn clamp_rule(parameter: Parameter) -> ClampRule {
    let (min, max, round) = match parameter {
        Parameter::Velocity => (Some(1.0), Some(127.0), false),
        Parameter::Probability => (Some(0.0), Some(1.0), false),
        Parameter::Duration => (Some(0.001), None, false),
        Parameter::Deviation => (Some(-127.0), Some(127.0), false),
        Parameter::Pitch => (Some(0.0), Some(127.0), true),
        Parameter::Timing => (None, None, false),
        Parameter::Gain => (Some(-70.0), Some(24.0), false),
        Parameter::PitchShift => (Some(-48.0), Some(48.0), false),
    };
    ClampRule { min, max, round }
}

/// Clamp (and round, where required) a value for `parameter`.
pub fn clamp(parameter: Parameter, value: f64) -> f64 {
    let rule = clamp_rule(parameter);
    let mut v = value;
    if let Some(min) = rule.min {
        v = v.max(min);
    }
    if let Some(max) = rule.max {
        v = v.min(max);
    }
    if rule.round {
        v = v.round();
    }
    v
}

/// Combine the evaluated expression with the current value.
///
/// `*=` and `/=` are `current * expr` and `current / expr`, with the
/// language's divide-by-zero rule. Returns `None` (skip the write) when the
/// result is not a finite number.
pub fn apply(op: AssignOp, evaluated: f64, current: f64) -> Option<f64> {
    let v = match op {
        AssignOp::Set => evaluated,
        AssignOp::Add => current + evaluated,
        AssignOp::Subtract => current - evaluated,
        AssignOp::Multiply => binary(BinaryOp::Mul, current, evaluated),
        AssignOp::Divide => binary(BinaryOp::Div, current, evaluated),
    };
    v.is_finite().then_some(v)
}

/// Apply then clamp, once per statement.
pub fn apply_clamped(parameter: Parameter, op: AssignOp, evaluated: f64, current: f64) -> Option<f64> {
    apply(op, evaluated, current).map(|v| clamp(parameter, v))
}

/// Something whose parameters a statement can read and write.
pub trait Parameterized {
    /// Current value in expression units, or `None` if the parameter doesn't apply.
    fn get(&self, parameter: Parameter, ts: TimeSignature) -> Option<f64>;

    /// Store an already-clamped value. Ignores parameters that don't apply.
    fn set(&mut self, parameter: Parameter, value: f64, ts: TimeSignature);
}

impl Parameterized for Note {
    fn get(&self, parameter: Parameter, ts: TimeSignature) -> Option<f64> {
        match parameter {
            Parameter::Velocity => Some(self.velocity),
            Parameter::Timing => Some(ts.to_musical(self.start)),
            Parameter::Duration => Some(ts.to_musical(self.duration)),
            Parameter::Probability => Some(self.probability),
            Parameter::Deviation => Some(self.deviation),
            Parameter::Pitch => Some(self.pitch as f64),
            Parameter::Gain | Parameter::PitchShift => None,
        }
    }

    fn set(&mut self, parameter: Parameter, value: f64, ts: TimeSignature) {
        match parameter {
            Parameter::Velocity => self.velocity = value,
            Parameter::Timing => self.start = ts.to_raw(value),
            Parameter::Duration => self.duration = ts.to_raw(value),
            Parameter::Probability => self.probability = value,
            Parameter::Deviation => self.deviation = value,
            Parameter::Pitch => self.pitch = value.round().clamp(0.0, 127.0) as u8,
            Parameter::Gain | Parameter::PitchShift => {}
        }
    }
}

impl Parameterized for AudioProps {
    fn get(&self, parameter: Parameter, _ts: TimeSignature) -> Option<f64> {
        match parameter {
            Parameter::Gain => Some(self.gain_db),
            Parameter::PitchShift => Some(self.pitch_shift),
            _ => None,
        }
    }

    fn set(&mut self, parameter: Parameter, value: f64, _ts: TimeSignature) {
        match parameter {
            Parameter::Gain => self.gain_db = value,
            Parameter::PitchShift => self.pitch_shift = value,
            _ => {}
        }
    }
}

/// Run one operator write against a target. Returns `true` if a value was committed.
pub fn write<T: Parameterized>(
    target: &mut T,
    parameter: Parameter,
    op: AssignOp,
    evaluated: f64,
    ts: TimeSignature,
) -> bool {
    let Some(current) = target.get(parameter, ts) else {
        return false;
    };
    match apply_clamped(parameter, op, evaluated, current) {
        Some(v) => {
            target.set(parameter, v, ts);
            true
        }
        None => false,
    }
}
