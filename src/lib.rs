//! Clipshaper — a transform language and clip-transformation engine for
//! sequencer clips.

pub mod clip;
pub mod config;
pub mod dsl;
pub mod engine;
pub mod rng;
pub mod time;
