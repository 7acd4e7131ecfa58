//! The boundary between the engine and whatever holds the clips.
//!
//! The engine reads clips out through [`ClipStore`], works on owned copies,
//! and hands back a single [`ChangeSet`] once every phase has succeeded.
//! [`MemoryStore`] is an in-memory implementation persisted as YAML.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Clip, ClipId};
use crate::time::BeatWindow;

/// Structural and value changes produced by one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    /// Clips that no longer exist (e.g. replaced by slices).
    pub removed: Vec<ClipId>,
    /// Clips to insert or overwrite by id.
    pub upserted: Vec<Clip>,
}

/// Read/write access to the host's clips.
pub trait ClipStore {
    /// Fetch a copy of a clip by id.
    fn clip(&self, id: ClipId) -> Option<Clip>;

    /// Arrangement clips on `track` overlapping `window` (raw beats), ordered by position.
    fn arrangement_clips(&self, track: u32, window: BeatWindow) -> Vec<ClipId>;

    /// Lowest id never handed out by this store. Reading it reserves nothing;
    /// the id is taken once a [`ChangeSet`] carrying it is committed.
    fn next_clip_id(&self) -> ClipId;

    /// Apply all changes of an invocation at once.
    fn commit(&mut self, changes: ChangeSet);
}

/// A flat list of clips, serializable as YAML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStore {
    #[serde(default)]
    pub clips: Vec<Clip>,
    /// Highest id ever committed, so removed ids are never reused.
    #[serde(skip)]
    high_water: u64,
}

impl MemoryStore {
    pub fn new(clips: Vec<Clip>) -> Self {
        Self { clips, high_water: 0 }
    }

    /// Load a store from a YAML file.
    pub fn load(path: &Path) -> Result<Self, io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Save the store as YAML, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self).map_err(io::Error::other)?;
        std::fs::write(path, yaml)
    }

    pub fn get(&self, id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == id)
    }
}

impl ClipStore for MemoryStore {
    fn clip(&self, id: ClipId) -> Option<Clip> {
        self.get(id).cloned()
    }

    fn arrangement_clips(&self, track: u32, window: BeatWindow) -> Vec<ClipId> {
        let mut found: Vec<(f64, ClipId)> = self
            .clips
            .iter()
            .filter(|c| c.track == track)
            .filter_map(|c| c.position.map(|p| (p, c)))
            .filter(|(p, c)| window.overlaps(*p, c.length))
            .map(|(p, c)| (p, c.id))
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        found.into_iter().map(|(_, id)| id).collect()
    }

    fn next_clip_id(&self) -> ClipId {
        let max_existing = self.clips.iter().map(|c| c.id.0).max().unwrap_or(0);
        ClipId(self.high_water.max(max_existing) + 1)
    }

    fn commit(&mut self, changes: ChangeSet) {
        let ids = changes.removed.iter().chain(changes.upserted.iter().map(|c| &c.id));
        if let Some(max) = ids.map(|id| id.0).max() {
            self.high_water = self.high_water.max(max);
        }
        self.clips.retain(|c| !changes.removed.contains(&c.id));
        for clip in changes.upserted {
            match self.clips.iter_mut().find(|c| c.id == clip.id) {
                Some(existing) => *existing = clip,
                None => self.clips.push(clip),
            }
        }
    }
}
