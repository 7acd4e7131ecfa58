//! Periodic waveform shapes used by `cos`, `tri`, `saw` and `square`.
//!
//! All shapes start at +1.0 at phase 0 and span [-1.0, 1.0].

use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    Cos,
    Tri,
    Saw,
    Square { pulse_width: f64 },
}

/// Wrap any real number into `[0, 1)`.
pub fn wrap_phase(x: f64) -> f64 {
    let p = x - x.floor();
    // x - floor(x) can round up to exactly 1.0 for tiny negative x
    if p >= 1.0 {
        0.0
    } else {
        p
    }
}

/// Sample `waveform` at `phase`, which is wrapped into `[0, 1)` first.
pub fn sample(waveform: Waveform, phase: f64) -> f64 {
    let phase = wrap_phase(phase);
    match waveform {
        Waveform::Cos => (phase * 2.0 * PI).cos(),
        Waveform::Tri => {
            if phase < 0.5 {
                1.0 - 4.0 * phase
            } else {
                4.0 * phase - 3.0
            }
        }
        Waveform::Saw => 1.0 - 2.0 * phase,
        Waveform::Square { pulse_width } => {
            if phase < pulse_width {
                1.0
            } else {
                -1.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-10;

    #[test]
    fn all_shapes_start_high() {
        for w in [
            Waveform::Cos,
            Waveform::Tri,
            Waveform::Saw,
            Waveform::Square { pulse_width: 0.5 },
        ] {
            assert!((sample(w, 0.0) - 1.0).abs() < EPSILON, "{w:?}");
        }
    }

    #[test]
    fn cos_quarter_and_half() {
        assert!(sample(Waveform::Cos, 0.25).abs() < EPSILON);
        assert!((sample(Waveform::Cos, 0.5) + 1.0).abs() < EPSILON);
    }

    #[test]
    fn tri_is_piecewise_linear() {
        assert!(sample(Waveform::Tri, 0.25).abs() < EPSILON);
        assert!((sample(Waveform::Tri, 0.5) + 1.0).abs() < EPSILON);
        assert!(sample(Waveform::Tri, 0.75).abs() < EPSILON);
    }

    #[test]
    fn saw_ramps_down_then_resets() {
        assert!(sample(Waveform::Saw, 0.5).abs() < EPSILON);
        assert!(sample(Waveform::Saw, 0.999) < -0.99);
        assert!((sample(Waveform::Saw, 1.0) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn square_follows_pulse_width() {
        let w = Waveform::Square { pulse_width: 0.25 };
        assert_eq!(sample(w, 0.2), 1.0);
        assert_eq!(sample(w, 0.25), -1.0);
        assert_eq!(sample(w, 0.9), -1.0);
    }

    #[test]
    fn phase_wraps() {
        assert!((sample(Waveform::Cos, 1.25) - sample(Waveform::Cos, 0.25)).abs() < EPSILON);
        assert!((sample(Waveform::Saw, -0.25) - sample(Waveform::Saw, 0.75)).abs() < EPSILON);
    }

    #[test]
    fn wrap_phase_range() {
        assert_eq!(wrap_phase(1.0), 0.0);
        assert!((wrap_phase(-0.25) - 0.75).abs() < EPSILON);
        assert!(wrap_phase(-1e-20) < 1.0);
    }
}
