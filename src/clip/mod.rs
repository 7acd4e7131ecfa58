//! Clip and note data model.
//!
//! Clips are what the host hands the engine and what it gets back. All time
//! values here are in *raw* beats (quarter notes); the engine converts to
//! musical beats before expressions see them.

pub mod store;

use serde::{Deserialize, Serialize};

use crate::time::TimeSignature;

pub use store::{ChangeSet, ClipStore, MemoryStore};

/// Stable opaque clip identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(pub u64);

impl std::fmt::Display for ClipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a note by clip and its index in the clip's (start, pitch) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NoteRef {
    pub clip: ClipId,
    pub index: usize,
}

fn default_velocity() -> f64 {
    100.0
}

fn default_probability() -> f64 {
    1.0
}

/// A MIDI note. `start` is relative to the clip start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub pitch: u8,
    pub start: f64,
    pub duration: f64,
    #[serde(default = "default_velocity")]
    pub velocity: f64,
    /// Random velocity range applied by the host at playback.
    #[serde(default)]
    pub deviation: f64,
    #[serde(default = "default_probability")]
    pub probability: f64,
}

impl Note {
    pub fn new(pitch: u8, start: f64, duration: f64, velocity: f64) -> Self {
        Self {
            pitch,
            start,
            duration,
            velocity,
            deviation: 0.0,
            probability: 1.0,
        }
    }
}

/// Audio clip properties the engine can modulate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioProps {
    #[serde(default)]
    pub gain_db: f64,
    #[serde(default)]
    pub pitch_shift: f64,
    /// Where in the source audio this clip starts playing, in raw beats.
    #[serde(default)]
    pub content_offset: f64,
}

/// What a clip contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClipContent {
    Midi {
        #[serde(default)]
        notes: Vec<Note>,
    },
    Audio(AudioProps),
}

/// A clip in the session or on the arrangement timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: ClipId,
    pub track: u32,
    /// Arrangement start in raw beats; `None` for session clips.
    #[serde(default)]
    pub position: Option<f64>,
    /// Length in raw beats.
    pub length: f64,
    #[serde(default)]
    pub time_signature: TimeSignature,
    #[serde(default)]
    pub name: String,
    pub content: ClipContent,
}

impl Clip {
    pub fn midi(id: ClipId, track: u32, position: Option<f64>, length: f64, notes: Vec<Note>) -> Self {
        Self {
            id,
            track,
            position,
            length,
            time_signature: TimeSignature::COMMON,
            name: String::new(),
            content: ClipContent::Midi { notes },
        }
    }

    pub fn audio(id: ClipId, track: u32, position: Option<f64>, length: f64, props: AudioProps) -> Self {
        Self {
            id,
            track,
            position,
            length,
            time_signature: TimeSignature::COMMON,
            name: String::new(),
            content: ClipContent::Audio(props),
        }
    }

    pub fn with_time_signature(mut self, ts: TimeSignature) -> Self {
        self.time_signature = ts;
        self
    }

    pub fn is_arrangement(&self) -> bool {
        self.position.is_some()
    }

    pub fn is_audio(&self) -> bool {
        matches!(self.content, ClipContent::Audio(_))
    }

    pub fn notes(&self) -> &[Note] {
        match &self.content {
            ClipContent::Midi { notes } => notes,
            ClipContent::Audio(_) => &[],
        }
    }

    pub fn note_count(&self) -> usize {
        self.notes().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_clip_has_no_position() {
        let clip = Clip::midi(ClipId(1), 0, None, 4.0, vec![]);
        assert!(!clip.is_arrangement());
        assert!(!clip.is_audio());
    }

    #[test]
    fn yaml_defaults_fill_note_fields() {
        let yaml = r#"
id: 7
track: 1
position: 8.0
length: 4.0
content:
  kind: midi
  notes:
    - pitch: 60
      start: 0.0
      duration: 1.0
"#;
        let clip: Clip = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(clip.id, ClipId(7));
        assert_eq!(clip.time_signature, TimeSignature::COMMON);
        let note = &clip.notes()[0];
        assert_eq!(note.velocity, 100.0);
        assert_eq!(note.probability, 1.0);
        assert_eq!(note.deviation, 0.0);
    }

    #[test]
    fn audio_clip_yaml() {
        let yaml = r#"
id: 3
track: 2
length: 8.0
time_signature: { numerator: 6, denominator: 8 }
content:
  kind: audio
  gain_db: -3.0
"#;
        let clip: Clip = serde_yaml::from_str(yaml).unwrap();
        assert!(clip.is_audio());
        assert!(clip.position.is_none());
        assert_eq!(clip.note_count(), 0);
        match clip.content {
            ClipContent::Audio(props) => assert_eq!(props.gain_db, -3.0),
            other => panic!("expected audio, got {other:?}"),
        }
    }
}
