//! Expression evaluator.
//!
//! [`evaluate`] walks an [`Expr`] against a read-only [`Env`] describing the
//! current note or audio clip, drawing from the invocation's [`TransformRng`].
//! Division and modulo by zero yield `0`; `%` is a floored modulo, so
//! `-1 % 4 == 3`.

use super::ast::{BinaryOp, Expr, Function, Variable};
use super::error::EvalError;
use super::waveform::{self, Waveform};
use crate::rng::TransformRng;
use crate::time::{beats_from_period, BeatWindow, TimeSignature};

/// Note properties, in musical beats where time is involved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteVars {
    pub pitch: f64,
    pub start: f64,
    pub velocity: f64,
    pub deviation: f64,
    pub duration: f64,
    pub probability: f64,
    pub index: usize,
}

/// Audio clip properties.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioVars {
    pub gain: f64,
    pub pitch_shift: f64,
}

/// Clip-level context, in musical beats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipVars {
    pub duration: f64,
    pub index: usize,
    /// Arrangement start; `None` for session clips.
    pub position: Option<f64>,
    pub bar_duration: f64,
}

/// Everything an expression may read while evaluating one note or audio clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Env {
    pub time_signature: TimeSignature,
    pub note: Option<NoteVars>,
    pub audio: Option<AudioVars>,
    pub clip: ClipVars,
    /// Span that `ramp`/`curve` progress across: the statement's time range
    /// or the whole clip.
    pub span: BeatWindow,
}

impl Env {
    /// Clip-relative position used for waveform phase.
    fn local_position(&self) -> f64 {
        self.note.map_or(0.0, |n| n.start)
    }

    /// Fraction of the ramp span elapsed at the current note (0 for audio clips).
    fn span_fraction(&self) -> f64 {
        let length = self.span.length();
        if length <= 0.0 {
            return 0.0;
        }
        match self.note {
            Some(n) => (n.start - self.span.start) / length,
            None => 0.0,
        }
    }
}

/// Evaluate `expr` to a number.
pub fn evaluate(expr: &Expr, env: &Env, rng: &mut TransformRng) -> Result<f64, EvalError> {
    match expr {
        Expr::Number(v) => Ok(*v),
        Expr::Period(p) => Ok(beats_from_period(*p, env.time_signature)),
        Expr::Variable(var) => read_variable(*var, env),
        Expr::Negate(inner) => Ok(-evaluate(inner, env, rng)?),
        Expr::Group(inner) => evaluate(inner, env, rng),
        Expr::Binary { op, lhs, rhs } => {
            let l = evaluate(lhs, env, rng)?;
            let r = evaluate(rhs, env, rng)?;
            Ok(binary(*op, l, r))
        }
        Expr::Call {
            function,
            args,
            sync,
        } => {
            let values = args
                .iter()
                .map(|a| evaluate(a, env, rng))
                .collect::<Result<Vec<f64>, EvalError>>()?;
            call(*function, &values, *sync, env, rng)
        }
    }
}

/// Apply a binary operator with the language's zero-divisor rules.
pub fn binary(op: BinaryOp, l: f64, r: f64) -> f64 {
    match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mul => l * r,
        BinaryOp::Div => {
            if r == 0.0 {
                0.0
            } else {
                l / r
            }
        }
        BinaryOp::Mod => {
            if r == 0.0 {
                0.0
            } else {
                l - r * (l / r).floor()
            }
        }
    }
}

fn read_variable(var: Variable, env: &Env) -> Result<f64, EvalError> {
    let note = |f: fn(&NoteVars) -> f64| {
        env.note.as_ref().map(f).ok_or_else(|| EvalError::Context {
            variable: var.path(),
            reason: "the current clip is not a MIDI clip".to_string(),
        })
    };
    let audio = |f: fn(&AudioVars) -> f64| {
        env.audio.as_ref().map(f).ok_or_else(|| EvalError::Context {
            variable: var.path(),
            reason: "the current clip is not an audio clip".to_string(),
        })
    };

    match var {
        Variable::NotePitch => note(|n| n.pitch),
        Variable::NoteStart => note(|n| n.start),
        Variable::NoteVelocity => note(|n| n.velocity),
        Variable::NoteDeviation => note(|n| n.deviation),
        Variable::NoteDuration => note(|n| n.duration),
        Variable::NoteProbability => note(|n| n.probability),
        Variable::NoteIndex => note(|n| n.index as f64),
        Variable::AudioGain => audio(|a| a.gain),
        Variable::AudioPitchShift => audio(|a| a.pitch_shift),
        Variable::ClipDuration => Ok(env.clip.duration),
        Variable::ClipIndex => Ok(env.clip.index as f64),
        Variable::ClipPosition => arrangement_position(var.path(), env),
        Variable::ClipBarDuration => Ok(env.clip.bar_duration),
    }
}

fn arrangement_position(variable: &'static str, env: &Env) -> Result<f64, EvalError> {
    env.clip.position.ok_or_else(|| EvalError::Context {
        variable,
        reason: "session clips have no arrangement position".to_string(),
    })
}

fn call(
    function: Function,
    args: &[f64],
    sync: bool,
    env: &Env,
    rng: &mut TransformRng,
) -> Result<f64, EvalError> {
    let arg = |i: usize, default: f64| args.get(i).copied().unwrap_or(default);

    match function {
        Function::Cos | Function::Tri | Function::Saw | Function::Square => {
            let period = arg(0, 1.0);
            if period <= 0.0 {
                return Err(EvalError::Range {
                    function: function.name(),
                    parameter: "frequency",
                    value: period,
                });
            }
            let shape = match function {
                Function::Cos => Waveform::Cos,
                Function::Tri => Waveform::Tri,
                Function::Saw => Waveform::Saw,
                _ => Waveform::Square {
                    pulse_width: arg(2, 0.5),
                },
            };
            let mut position = env.local_position();
            if sync {
                position += arrangement_position("sync", env)?;
            }
            Ok(waveform::sample(shape, position / period + arg(1, 0.0)))
        }
        Function::Ramp => {
            let position = waveform::wrap_phase(env.span_fraction() * arg(2, 1.0));
            Ok(interpolate(arg(0, 0.0), arg(1, 0.0), position))
        }
        Function::Curve => {
            let exponent = arg(2, 1.0);
            if exponent <= 0.0 {
                return Err(EvalError::Range {
                    function: "curve",
                    parameter: "exponent",
                    value: exponent,
                });
            }
            let position = waveform::wrap_phase(env.span_fraction());
            Ok(interpolate(arg(0, 0.0), arg(1, 0.0), position.powf(exponent)))
        }
        Function::Rand => Ok(match args.len() {
            0 => rng.range(-1.0, 1.0),
            1 => rng.range(0.0, args[0]),
            _ => rng.range(args[0], args[1]),
        }),
        Function::Choose => Ok(args[rng.index(args.len())]),
        Function::Round => Ok(arg(0, 0.0).round()),
        Function::Floor => Ok(arg(0, 0.0).floor()),
        Function::Ceil => Ok(arg(0, 0.0).ceil()),
        Function::Abs => Ok(arg(0, 0.0).abs()),
        Function::Clamp => Ok(arg(0, 0.0).max(arg(1, 0.0)).min(arg(2, 0.0))),
        Function::Min => Ok(args.iter().copied().fold(f64::INFINITY, f64::min)),
        Function::Max => Ok(args.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        Function::Pow => Ok(arg(0, 0.0).powf(arg(1, 1.0))),
    }
}

fn interpolate(start: f64, end: f64, t: f64) -> f64 {
    start + (end - start) * t
}
