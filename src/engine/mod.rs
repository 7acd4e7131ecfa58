//! Transform engine — runs one invocation against a [`ClipStore`].
//!
//! ```text
//! SELECT → SLICE? → SHUFFLE? → PARAMETER_TRANSFORM → AGGREGATE
//! ```
//!
//! All phases work on an owned copy of the selected clips. The store sees a
//! single [`ChangeSet`] at the end, so any error leaves it untouched.

pub mod error;
pub mod params;
pub mod randomize;
pub mod shuffle;
pub mod slice;
pub mod warning;

use std::collections::BTreeSet;

use serde::Serialize;

pub use error::TransformError;
pub use randomize::{RandomizeSpec, Transpose, ValueRange};
pub use warning::{Warning, WarningKind, Warnings};

use crate::clip::{ChangeSet, Clip, ClipContent, ClipId, ClipStore, NoteRef};
use crate::config::EngineConfig;
use crate::dsl::{evaluate, AudioVars, ClipVars, Env, NoteVars, TransformParser, TransformStatement};
use crate::rng::{resolve_seed, TransformRng};
use crate::time::{BarBeat, BeatWindow};

/// Which clips an invocation targets.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Explicit ids, processed in the given order.
    Clips(Vec<ClipId>),
    /// Arrangement clips on a track overlapping a raw-beat window.
    Arrangement { track: u32, window: BeatWindow },
}

/// Parameters of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformRequest {
    pub selection: Selection,
    /// Transform source, one statement per line.
    pub transform: Option<String>,
    /// Slice size in musical beats.
    pub slice: Option<f64>,
    pub shuffle: bool,
    pub randomize: RandomizeSpec,
    pub seed: Option<u64>,
}

impl TransformRequest {
    pub fn new(selection: Selection) -> Self {
        Self {
            selection,
            transform: None,
            slice: None,
            shuffle: false,
            randomize: RandomizeSpec::default(),
            seed: None,
        }
    }

    pub fn with_transform(mut self, source: impl Into<String>) -> Self {
        self.transform = Some(source.into());
        self
    }

    pub fn with_slice(mut self, beats: f64) -> Self {
        self.slice = Some(beats);
        self
    }

    pub fn with_shuffle(mut self) -> Self {
        self.shuffle = true;
        self
    }

    pub fn with_randomize(mut self, spec: RandomizeSpec) -> Self {
        self.randomize = spec;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// What an invocation did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformOutcome {
    /// Clips that exist after the invocation and were part of it.
    pub clip_ids: Vec<ClipId>,
    /// Notes written at least once.
    pub notes: Vec<NoteRef>,
    /// Clips removed by slicing.
    pub removed: Vec<ClipId>,
    /// Seed actually used; pass it back to replay.
    pub seed: u64,
    pub warnings: Vec<Warning>,
}

pub struct TransformEngine {
    config: EngineConfig,
}

impl TransformEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one invocation. On error the store is not modified.
    pub fn run(
        &self,
        store: &mut dyn ClipStore,
        request: &TransformRequest,
    ) -> Result<TransformOutcome, TransformError> {
        let statements = match &request.transform {
            Some(source) => TransformParser::parse(source)?,
            None => Vec::new(),
        };
        self.validate(request)?;

        let seed = resolve_seed(request.seed.or(self.config.default_seed));
        let mut rng = TransformRng::new(seed);
        let mut warnings = Warnings::new();
        tracing::debug!(seed, statements = statements.len(), "starting transform");

        // SELECT
        let mut clips = select(&*store, &request.selection, &mut warnings);
        if clips.is_empty() {
            warnings.record(WarningKind::EmptySelection, "selection matched no clips");
            return Ok(TransformOutcome {
                clip_ids: Vec::new(),
                notes: Vec::new(),
                removed: Vec::new(),
                seed,
                warnings: warnings.into_vec(),
            });
        }
        let note_count: usize = clips.iter().map(Clip::note_count).sum();
        if note_count > self.config.max_notes {
            return Err(TransformError::NoteLimit {
                count: note_count,
                limit: self.config.max_notes,
            });
        }
        tracing::debug!(clips = clips.len(), notes = note_count, "selected");

        // SLICE
        let mut removed = Vec::new();
        if let Some(beats) = request.slice {
            let (sliced, gone) = self.slice(&*store, clips, beats, &mut warnings)?;
            clips = sliced;
            removed = gone;
            shuffle::sort_by_slot(&mut clips);
        }

        // SHUFFLE
        if request.shuffle {
            shuffle_arrangement(&mut clips, &mut rng, &mut warnings);
        }

        // PARAMETER_TRANSFORM
        let mut touched = BTreeSet::new();
        for clip in &mut clips {
            sort_notes(clip);
        }
        for statement in &statements {
            apply_statement(statement, &mut clips, &mut rng, &mut warnings, &mut touched)?;
        }
        if !request.randomize.is_empty() {
            apply_randomize(&request.randomize, &mut clips, &mut rng, &mut touched);
        }

        // AGGREGATE
        let clip_ids: Vec<ClipId> = clips.iter().map(|c| c.id).collect();
        store.commit(ChangeSet {
            removed: removed.clone(),
            upserted: clips,
        });
        let outcome = TransformOutcome {
            clip_ids,
            notes: touched.into_iter().collect(),
            removed,
            seed,
            warnings: warnings.into_vec(),
        };
        tracing::info!(
            seed,
            clips = outcome.clip_ids.len(),
            notes = outcome.notes.len(),
            warnings = outcome.warnings.len(),
            "transform complete"
        );
        Ok(outcome)
    }

    fn validate(&self, request: &TransformRequest) -> Result<(), TransformError> {
        if let Some(beats) = request.slice {
            if !beats.is_finite() || beats <= 0.0 {
                return Err(TransformError::InvalidRequest(format!(
                    "slice size must be a positive number of beats, got {beats}"
                )));
            }
        }
        request.randomize.validate()?;
        if let Selection::Arrangement { window, .. } = request.selection {
            if !window.start.is_finite() || !window.end.is_finite() || window.start >= window.end {
                return Err(TransformError::InvalidRequest(format!(
                    "arrangement window start {} must be before end {}",
                    window.start, window.end
                )));
            }
        }
        let nothing_to_do = request.transform.is_none()
            && request.slice.is_none()
            && !request.shuffle
            && request.randomize.is_empty();
        if nothing_to_do {
            return Err(TransformError::InvalidRequest(
                "request has no transform, slice, shuffle or randomize".into(),
            ));
        }
        Ok(())
    }

    /// Slice every arrangement clip, returning the new working set and the ids
    /// of clips replaced by their segments. New ids count up from the store's
    /// next free id; nothing is reserved until commit.
    fn slice(
        &self,
        store: &dyn ClipStore,
        clips: Vec<Clip>,
        beats: f64,
        warnings: &mut Warnings,
    ) -> Result<(Vec<Clip>, Vec<ClipId>), TransformError> {
        let limit = self.config.max_slices;
        let requested = clips
            .iter()
            .filter(|c| c.is_arrangement())
            .map(|c| slice::segment_count(c.length, slice::raw_slice_size(c, beats)))
            .try_fold(0usize, |total, n| total.checked_add(n));
        let requested = match requested {
            Some(n) if n <= limit => n,
            over => {
                return Err(TransformError::SliceLimit {
                    requested: over.unwrap_or(usize::MAX),
                    limit,
                })
            }
        };

        let mut out = Vec::with_capacity(requested.max(clips.len()));
        let mut removed = Vec::new();
        let mut next = store.next_clip_id().0;
        let mut next_id = || {
            let id = ClipId(next);
            next += 1;
            id
        };
        for clip in clips {
            if !clip.is_arrangement() {
                warnings.record(
                    WarningKind::SessionClipNotSliced,
                    format!("clip {} has no arrangement position and was not sliced", clip.id),
                );
                out.push(clip);
                continue;
            }
            let segments = slice::slice_clip(&clip, beats, &mut next_id);
            if segments.len() > 1 {
                let ts = clip.time_signature;
                let at = BarBeat::from_beats(ts.to_musical(clip.position.unwrap_or_default()), ts);
                tracing::debug!(
                    clip = %clip.id,
                    at = %at,
                    segments = segments.len(),
                    "sliced"
                );
                removed.push(clip.id);
            }
            out.extend(segments);
        }
        Ok((out, removed))
    }
}

/// Resolve the selection to owned clips, dropping unknown ids.
fn select(store: &dyn ClipStore, selection: &Selection, warnings: &mut Warnings) -> Vec<Clip> {
    let ids: Vec<ClipId> = match selection {
        Selection::Clips(ids) => {
            let mut seen = BTreeSet::new();
            ids.iter().copied().filter(|id| seen.insert(*id)).collect()
        }
        Selection::Arrangement { track, window } => store.arrangement_clips(*track, *window),
    };
    let mut clips = Vec::with_capacity(ids.len());
    for id in ids {
        match store.clip(id) {
            Some(clip) => clips.push(clip),
            None => warnings.record(WarningKind::ClipNotFound, format!("clip {id} not found")),
        }
    }
    clips
}

/// Shuffle the arrangement clips of the working set among their own slots.
fn shuffle_arrangement(clips: &mut Vec<Clip>, rng: &mut TransformRng, warnings: &mut Warnings) {
    let (mut arranged, session): (Vec<Clip>, Vec<Clip>) =
        std::mem::take(clips).into_iter().partition(Clip::is_arrangement);
    if !session.is_empty() {
        warnings.record(
            WarningKind::SessionClipNotShuffled,
            "session clips have no arrangement position and were not shuffled",
        );
    }
    let perm = shuffle::shuffle(&mut arranged, rng);
    tracing::debug!(?perm, "shuffled");
    clips.extend(arranged);
    clips.extend(session);
}

/// Order notes by (start, pitch) so `note.index` and draw order are stable.
fn sort_notes(clip: &mut Clip) {
    if let ClipContent::Midi { notes } = &mut clip.content {
        notes.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.pitch.cmp(&b.pitch)));
    }
}

fn clip_vars(clip: &Clip, index: usize) -> ClipVars {
    let ts = clip.time_signature;
    ClipVars {
        duration: ts.to_musical(clip.length),
        index,
        position: clip.position.map(|p| ts.to_musical(p)),
        bar_duration: ts.beats_per_bar(),
    }
}

fn apply_statement(
    statement: &TransformStatement,
    clips: &mut [Clip],
    rng: &mut TransformRng,
    warnings: &mut Warnings,
    touched: &mut BTreeSet<NoteRef>,
) -> Result<(), TransformError> {
    let synced = statement.expr.uses_sync();
    let eval_err = |source| TransformError::Eval {
        line: statement.line,
        source,
    };

    for (index, clip) in clips.iter_mut().enumerate() {
        // audio clips have no note start, so they always evaluate at position 0
        if synced && (!clip.is_arrangement() || clip.is_audio()) {
            let reason = if clip.is_audio() {
                "is audio and evaluated at position 0"
            } else {
                "has no arrangement position"
            };
            warnings.record(
                WarningKind::SyncSkipped,
                format!("sync skipped on line {}: clip {} {reason}", statement.line, clip.id),
            );
            continue;
        }
        let ts = clip.time_signature;
        let vars = clip_vars(clip, index);
        let span = match statement.time {
            Some(range) => range.window(ts),
            None => BeatWindow::new(0.0, vars.duration),
        };
        let clip_id = clip.id;

        match &mut clip.content {
            ClipContent::Midi { notes } => {
                if statement.parameter.is_audio() {
                    continue;
                }
                for (i, note) in notes.iter_mut().enumerate() {
                    if let Some(pitch) = statement.pitch {
                        if !pitch.contains(note.pitch) {
                            continue;
                        }
                    }
                    let start = ts.to_musical(note.start);
                    if statement.time.is_some() && !span.contains(start) {
                        continue;
                    }
                    let env = Env {
                        time_signature: ts,
                        note: Some(NoteVars {
                            pitch: note.pitch as f64,
                            start,
                            velocity: note.velocity,
                            deviation: note.deviation,
                            duration: ts.to_musical(note.duration),
                            probability: note.probability,
                            index: i,
                        }),
                        audio: None,
                        clip: vars,
                        span,
                    };
                    let value = evaluate(&statement.expr, &env, rng).map_err(eval_err)?;
                    if params::write(note, statement.parameter, statement.op, value, ts) {
                        touched.insert(NoteRef { clip: clip_id, index: i });
                    }
                }
            }
            ClipContent::Audio(props) => {
                if !statement.parameter.is_audio() || statement.has_selector() {
                    continue;
                }
                let env = Env {
                    time_signature: ts,
                    note: None,
                    audio: Some(AudioVars {
                        gain: props.gain_db,
                        pitch_shift: props.pitch_shift,
                    }),
                    clip: vars,
                    span,
                };
                let value = evaluate(&statement.expr, &env, rng).map_err(eval_err)?;
                params::write(props, statement.parameter, statement.op, value, ts);
            }
        }
    }
    Ok(())
}

fn apply_randomize(
    spec: &RandomizeSpec,
    clips: &mut [Clip],
    rng: &mut TransformRng,
    touched: &mut BTreeSet<NoteRef>,
) {
    for clip in clips.iter_mut() {
        let ts = clip.time_signature;
        let clip_id = clip.id;
        match &mut clip.content {
            ClipContent::Midi { notes } if spec.touches_notes() => {
                for (i, note) in notes.iter_mut().enumerate() {
                    spec.apply_to_note(note, ts, rng);
                    touched.insert(NoteRef { clip: clip_id, index: i });
                }
            }
            ClipContent::Audio(props) if spec.touches_audio() => {
                spec.apply_to_audio(props, ts, rng);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::{AudioProps, MemoryStore, Note};
    use assert_approx_eq::assert_approx_eq;

    fn store() -> MemoryStore {
        let notes = vec![
            Note::new(72, 4.0, 1.0, 100.0),
            Note::new(60, 0.0, 1.0, 100.0),
            Note::new(40, 2.0, 1.0, 100.0),
        ];
        MemoryStore::new(vec![
            Clip::midi(ClipId(1), 0, Some(0.0), 8.0, notes),
            Clip::midi(ClipId(2), 0, None, 4.0, vec![Note::new(60, 0.0, 1.0, 90.0)]),
            Clip::audio(ClipId(3), 1, Some(0.0), 8.0, AudioProps::default()),
        ])
    }

    fn engine() -> TransformEngine {
        TransformEngine::new(EngineConfig::default())
    }

    #[test]
    fn notes_are_sorted_before_transform() {
        let mut s = store();
        let req = TransformRequest::new(Selection::Clips(vec![ClipId(1)]))
            .with_transform("velocity = note.index")
            .with_seed(1);
        engine().run(&mut s, &req).unwrap();
        let notes = s.get(ClipId(1)).unwrap().notes();
        assert_eq!(notes[0].pitch, 60);
        assert_eq!(notes[0].velocity, 1.0); // index 0 clamps up to 1
        assert_eq!(notes[1].velocity, 1.0);
        assert_eq!(notes[2].velocity, 2.0);
    }

    #[test]
    fn missing_clip_ids_warn() {
        let mut s = store();
        let req = TransformRequest::new(Selection::Clips(vec![ClipId(1), ClipId(99)]))
            .with_transform("velocity += 1")
            .with_seed(1);
        let out = engine().run(&mut s, &req).unwrap();
        assert_eq!(out.clip_ids, vec![ClipId(1)]);
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].kind, WarningKind::ClipNotFound);
    }

    #[test]
    fn empty_selection_is_soft() {
        let mut s = store();
        let req = TransformRequest::new(Selection::Arrangement {
            track: 7,
            window: BeatWindow::new(0.0, 16.0),
        })
        .with_transform("velocity += 1");
        let out = engine().run(&mut s, &req).unwrap();
        assert!(out.clip_ids.is_empty());
        assert_eq!(out.warnings[0].kind, WarningKind::EmptySelection);
        assert_eq!(s, store());
    }

    #[test]
    fn inverted_window_is_invalid() {
        let mut s = store();
        let req = TransformRequest::new(Selection::Arrangement {
            track: 0,
            window: BeatWindow::new(8.0, 4.0),
        })
        .with_transform("velocity += 1");
        assert!(matches!(
            engine().run(&mut s, &req),
            Err(TransformError::InvalidRequest(_))
        ));
    }

    #[test]
    fn empty_request_is_invalid() {
        let mut s = store();
        let req = TransformRequest::new(Selection::Clips(vec![ClipId(1)]));
        assert!(engine().run(&mut s, &req).is_err());
    }

    #[test]
    fn sync_skips_session_clips_once() {
        let mut s = store();
        let req = TransformRequest::new(Selection::Clips(vec![ClipId(1), ClipId(2)]))
            .with_transform("velocity = 64 + 20 * cos(4t, sync)\nvelocity += cos(2t, sync)")
            .with_seed(1);
        let out = engine().run(&mut s, &req).unwrap();
        let kinds: Vec<WarningKind> = out.warnings.iter().map(|w| w.kind).collect();
        assert_eq!(kinds, vec![WarningKind::SyncSkipped]);
        assert_eq!(s.get(ClipId(2)).unwrap().notes()[0].velocity, 90.0);
        assert_ne!(s.get(ClipId(1)).unwrap().notes()[0].velocity, 100.0);
    }

    #[test]
    fn audio_statements_skip_midi_and_vice_versa() {
        let mut s = store();
        let req = TransformRequest::new(Selection::Clips(vec![ClipId(1), ClipId(3)]))
            .with_transform("gain -= 6\nvelocity = 50")
            .with_seed(1);
        let out = engine().run(&mut s, &req).unwrap();
        match &s.get(ClipId(3)).unwrap().content {
            ClipContent::Audio(p) => assert_approx_eq!(p.gain_db, -6.0),
            other => panic!("expected audio, got {other:?}"),
        }
        assert!(s.get(ClipId(1)).unwrap().notes().iter().all(|n| n.velocity == 50.0));
        assert_eq!(out.notes.len(), 3);
    }

    #[test]
    fn note_limit_fails_before_mutation() {
        let mut s = store();
        let engine = TransformEngine::new(EngineConfig {
            max_notes: 2,
            ..EngineConfig::default()
        });
        let req = TransformRequest::new(Selection::Clips(vec![ClipId(1)])).with_transform("velocity = 1");
        assert!(matches!(
            engine.run(&mut s, &req),
            Err(TransformError::NoteLimit { count: 3, limit: 2 })
        ));
        assert_eq!(s, store());
    }

    #[test]
    fn slice_limit_fails_before_mutation() {
        let mut s = store();
        let engine = TransformEngine::new(EngineConfig {
            max_slices: 3,
            ..EngineConfig::default()
        });
        let req = TransformRequest::new(Selection::Clips(vec![ClipId(1)])).with_slice(2.0);
        assert!(matches!(
            engine.run(&mut s, &req),
            Err(TransformError::SliceLimit { requested: 4, limit: 3 })
        ));
        assert_eq!(s, store());
    }

    #[test]
    fn slicing_session_clip_warns() {
        let mut s = store();
        let req = TransformRequest::new(Selection::Clips(vec![ClipId(1), ClipId(2)])).with_slice(4.0);
        let out = engine().run(&mut s, &req).unwrap();
        assert_eq!(out.removed, vec![ClipId(1)]);
        assert!(out.clip_ids.contains(&ClipId(2)));
        assert_eq!(out.clip_ids.len(), 3);
        assert!(out
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::SessionClipNotSliced));
        assert!(s.get(ClipId(1)).is_none());
    }

    #[test]
    fn configured_default_seed_is_used() {
        let engine = TransformEngine::new(EngineConfig {
            default_seed: Some(1234),
            ..EngineConfig::default()
        });
        let req = TransformRequest::new(Selection::Clips(vec![ClipId(1)])).with_transform("velocity = rand(1, 127)");
        let out = engine.run(&mut store(), &req).unwrap();
        assert_eq!(out.seed, 1234);
        let out = engine.run(&mut store(), &req.with_seed(5)).unwrap();
        assert_eq!(out.seed, 5);
    }
}
