//! Abstract Syntax Tree for the transform language.
//!
//! A transform block is an ordered list of [`TransformStatement`]s, one per
//! source line. Trees are immutable once parsed.

use std::fmt;

use super::note::note_name;
use crate::time::{BeatRange, Period};

/// One line of transform source: `[pitch] [time] parameter op expression`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformStatement {
    pub pitch: Option<PitchRange>,
    pub time: Option<BeatRange>,
    pub parameter: Parameter,
    pub op: AssignOp,
    pub expr: Expr,
    /// Source line, for diagnostics.
    pub line: usize,
}

impl TransformStatement {
    /// True if the statement only applies to notes matching a selector.
    pub fn has_selector(&self) -> bool {
        self.pitch.is_some() || self.time.is_some()
    }
}

/// Inclusive MIDI pitch range from a `C3` or `C3-C5` selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PitchRange {
    pub low: u8,
    pub high: u8,
}

impl PitchRange {
    pub fn contains(self, pitch: u8) -> bool {
        pitch >= self.low && pitch <= self.high
    }
}

impl fmt::Display for PitchRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.low == self.high {
            f.write_str(&note_name(self.low))
        } else {
            write!(f, "{}-{}", note_name(self.low), note_name(self.high))
        }
    }
}

/// A parameter a statement can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Parameter {
    Velocity,
    Timing,
    Duration,
    Probability,
    Deviation,
    Pitch,
    Gain,
    PitchShift,
}

impl Parameter {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "velocity" => Some(Parameter::Velocity),
            "timing" => Some(Parameter::Timing),
            "duration" => Some(Parameter::Duration),
            "probability" => Some(Parameter::Probability),
            "deviation" => Some(Parameter::Deviation),
            "pitch" => Some(Parameter::Pitch),
            "gain" => Some(Parameter::Gain),
            "pitchShift" => Some(Parameter::PitchShift),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Parameter::Velocity => "velocity",
            Parameter::Timing => "timing",
            Parameter::Duration => "duration",
            Parameter::Probability => "probability",
            Parameter::Deviation => "deviation",
            Parameter::Pitch => "pitch",
            Parameter::Gain => "gain",
            Parameter::PitchShift => "pitchShift",
        }
    }

    /// True for parameters that live on audio clips rather than notes.
    pub fn is_audio(self) -> bool {
        matches!(self, Parameter::Gain | Parameter::PitchShift)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Assignment operator of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl AssignOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Set => "=",
            AssignOp::Add => "+=",
            AssignOp::Subtract => "-=",
            AssignOp::Multiply => "*=",
            AssignOp::Divide => "/=",
        }
    }
}

/// Binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// A variable readable from an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    NotePitch,
    NoteStart,
    NoteVelocity,
    NoteDeviation,
    NoteDuration,
    NoteProbability,
    NoteIndex,
    AudioGain,
    AudioPitchShift,
    ClipDuration,
    ClipIndex,
    ClipPosition,
    ClipBarDuration,
}

impl Variable {
    /// Resolve a `scope.name` path.
    pub fn from_path(scope: &str, name: &str) -> Option<Self> {
        let var = match (scope, name) {
            ("note", "pitch") => Variable::NotePitch,
            ("note", "start") => Variable::NoteStart,
            ("note", "velocity") => Variable::NoteVelocity,
            ("note", "deviation") => Variable::NoteDeviation,
            ("note", "duration") => Variable::NoteDuration,
            ("note", "probability") => Variable::NoteProbability,
            ("note", "index") => Variable::NoteIndex,
            ("audio", "gain") => Variable::AudioGain,
            ("audio", "pitchShift") => Variable::AudioPitchShift,
            ("clip", "duration") => Variable::ClipDuration,
            ("clip", "index") => Variable::ClipIndex,
            ("clip", "position") => Variable::ClipPosition,
            ("clip", "barDuration") => Variable::ClipBarDuration,
            _ => return None,
        };
        Some(var)
    }

    pub fn path(self) -> &'static str {
        match self {
            Variable::NotePitch => "note.pitch",
            Variable::NoteStart => "note.start",
            Variable::NoteVelocity => "note.velocity",
            Variable::NoteDeviation => "note.deviation",
            Variable::NoteDuration => "note.duration",
            Variable::NoteProbability => "note.probability",
            Variable::NoteIndex => "note.index",
            Variable::AudioGain => "audio.gain",
            Variable::AudioPitchShift => "audio.pitchShift",
            Variable::ClipDuration => "clip.duration",
            Variable::ClipIndex => "clip.index",
            Variable::ClipPosition => "clip.position",
            Variable::ClipBarDuration => "clip.barDuration",
        }
    }
}

/// Built-in functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Cos,
    Tri,
    Saw,
    Square,
    Ramp,
    Curve,
    Rand,
    Choose,
    Round,
    Floor,
    Ceil,
    Abs,
    Clamp,
    Min,
    Max,
    Pow,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        let f = match name {
            "cos" => Function::Cos,
            "tri" => Function::Tri,
            "saw" => Function::Saw,
            "square" => Function::Square,
            "ramp" => Function::Ramp,
            "curve" => Function::Curve,
            "rand" => Function::Rand,
            "choose" => Function::Choose,
            "round" => Function::Round,
            "floor" => Function::Floor,
            "ceil" => Function::Ceil,
            "abs" => Function::Abs,
            "clamp" => Function::Clamp,
            "min" => Function::Min,
            "max" => Function::Max,
            "pow" => Function::Pow,
            _ => return None,
        };
        Some(f)
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Cos => "cos",
            Function::Tri => "tri",
            Function::Saw => "saw",
            Function::Square => "square",
            Function::Ramp => "ramp",
            Function::Curve => "curve",
            Function::Rand => "rand",
            Function::Choose => "choose",
            Function::Round => "round",
            Function::Floor => "floor",
            Function::Ceil => "ceil",
            Function::Abs => "abs",
            Function::Clamp => "clamp",
            Function::Min => "min",
            Function::Max => "max",
            Function::Pow => "pow",
        }
    }

    /// Accepted argument counts, not counting a trailing `sync`.
    /// `None` as the upper bound means variadic.
    pub fn arity(self) -> (usize, Option<usize>) {
        match self {
            Function::Cos | Function::Tri | Function::Saw => (1, Some(2)),
            Function::Square => (1, Some(3)),
            Function::Ramp => (2, Some(3)),
            Function::Curve => (3, Some(3)),
            Function::Rand => (0, Some(2)),
            Function::Choose => (1, None),
            Function::Round | Function::Floor | Function::Ceil | Function::Abs => (1, Some(1)),
            Function::Clamp => (3, Some(3)),
            Function::Min | Function::Max => (2, None),
            Function::Pow => (2, Some(2)),
        }
    }

    /// Periodic waveforms are the only functions that accept `sync`.
    pub fn is_waveform(self) -> bool {
        matches!(
            self,
            Function::Cos | Function::Tri | Function::Saw | Function::Square
        )
    }
}

/// Expression tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Period(Period),
    Variable(Variable),
    Negate(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        function: Function,
        args: Vec<Expr>,
        sync: bool,
    },
    Group(Box<Expr>),
}

impl Expr {
    /// True if any waveform call in this tree carries `sync`.
    pub fn uses_sync(&self) -> bool {
        match self {
            Expr::Number(_) | Expr::Period(_) | Expr::Variable(_) => false,
            Expr::Negate(inner) | Expr::Group(inner) => inner.uses_sync(),
            Expr::Binary { lhs, rhs, .. } => lhs.uses_sync() || rhs.uses_sync(),
            Expr::Call { args, sync, .. } => *sync || args.iter().any(Expr::uses_sync),
        }
    }
}
