//! Slicing, shuffling and randomized ranges through the engine, plus the
//! YAML project round trip the CLI relies on.

use assert_approx_eq::assert_approx_eq;
use clipshaper::clip::{AudioProps, Clip, ClipContent, ClipId, ClipStore, MemoryStore, Note};
use clipshaper::config::EngineConfig;
use clipshaper::engine::{
    RandomizeSpec, Selection, TransformEngine, TransformError, TransformRequest, Transpose,
    ValueRange, WarningKind,
};
use clipshaper::time::BeatWindow;

fn engine() -> TransformEngine {
    TransformEngine::new(EngineConfig::default())
}

/// Four bars of sixteenth-ish notes on track 0 at bar 3.
fn four_bar_store() -> MemoryStore {
    let notes = (0..16)
        .map(|i| Note::new(48 + (i * 3 % 24) as u8, i as f64, 0.75, 80.0 + i as f64))
        .collect();
    MemoryStore::new(vec![Clip::midi(ClipId(1), 0, Some(8.0), 16.0, notes)])
}

fn arrangement(store: &MemoryStore, track: u32) -> Vec<Clip> {
    store
        .arrangement_clips(track, BeatWindow::new(0.0, 1e9))
        .into_iter()
        .filter_map(|id| store.clip(id))
        .collect()
}

#[test]
fn slicing_four_bars_by_one_bar_reconstructs_content() {
    let mut store = four_bar_store();
    let original = store.get(ClipId(1)).unwrap().notes().to_vec();
    let req = TransformRequest::new(Selection::Clips(vec![ClipId(1)])).with_slice(4.0);
    let out = engine().run(&mut store, &req).unwrap();

    assert_eq!(out.clip_ids.len(), 4);
    assert_eq!(out.removed, vec![ClipId(1)]);
    assert!(store.get(ClipId(1)).is_none());

    let slices = arrangement(&store, 0);
    assert_eq!(slices.len(), 4);
    let mut rebuilt = Vec::new();
    for (i, clip) in slices.iter().enumerate() {
        assert_approx_eq!(clip.position.unwrap(), 8.0 + 4.0 * i as f64);
        assert_approx_eq!(clip.length, 4.0);
        let offset = clip.position.unwrap() - 8.0;
        rebuilt.extend(clip.notes().iter().map(|n| Note {
            start: n.start + offset,
            ..n.clone()
        }));
    }
    assert_eq!(rebuilt, original);
}

#[test]
fn uneven_slice_leaves_short_final_segment() {
    let mut store = four_bar_store();
    let req = TransformRequest::new(Selection::Clips(vec![ClipId(1)])).with_slice(6.0);
    engine().run(&mut store, &req).unwrap();
    let lengths: Vec<f64> = arrangement(&store, 0).iter().map(|c| c.length).collect();
    assert_eq!(lengths, vec![6.0, 6.0, 4.0]);
}

#[test]
fn slice_then_transform_sees_new_clips() {
    let mut store = four_bar_store();
    let req = TransformRequest::new(Selection::Clips(vec![ClipId(1)]))
        .with_slice(4.0)
        .with_transform("velocity = 10 * (clip.index + 1)")
        .with_seed(3);
    engine().run(&mut store, &req).unwrap();
    for (i, clip) in arrangement(&store, 0).iter().enumerate() {
        assert!(clip.notes().iter().all(|n| n.velocity == 10.0 * (i + 1) as f64));
    }
}

#[test]
fn slice_cap_fails_fast() {
    let mut store = four_bar_store();
    let before = store.clone();
    let engine = TransformEngine::new(EngineConfig {
        max_slices: 10,
        ..EngineConfig::default()
    });
    let req = TransformRequest::new(Selection::Clips(vec![ClipId(1)])).with_slice(1.0);
    let err = engine.run(&mut store, &req).unwrap_err();
    assert!(matches!(err, TransformError::SliceLimit { requested: 16, limit: 10 }));
    assert_eq!(store, before);
}

#[test]
fn tiny_slice_size_hits_the_cap_without_overflow() {
    let mut store = MemoryStore::new(vec![
        Clip::midi(ClipId(1), 0, Some(0.0), 16.0, vec![]),
        Clip::midi(ClipId(2), 0, Some(16.0), 16.0, vec![]),
    ]);
    let before = store.clone();
    let req = TransformRequest::new(Selection::Clips(vec![ClipId(1), ClipId(2)])).with_slice(1e-300);
    let err = engine().run(&mut store, &req).unwrap_err();
    assert!(matches!(
        err,
        TransformError::SliceLimit { requested: usize::MAX, limit: 100 }
    ));
    assert_eq!(store, before);
}

#[test]
fn failed_statement_after_slice_leaves_store_untouched() {
    let mut store = MemoryStore::new(vec![Clip::midi(
        ClipId(1),
        0,
        Some(0.0),
        8.0,
        vec![Note::new(60, 0.0, 1.0, 100.0), Note::new(62, 5.0, 1.0, 100.0)],
    )]);
    let before = store.clone();
    let req = TransformRequest::new(Selection::Clips(vec![ClipId(1)]))
        .with_slice(4.0)
        .with_transform("velocity = cos(0)");
    let err = engine().run(&mut store, &req).unwrap_err();
    assert!(err.is_range_error(), "got {err}");
    assert_eq!(store, before);
    assert_eq!(store.next_clip_id(), ClipId(2));
}

#[test]
fn zero_slice_size_is_invalid() {
    let mut store = four_bar_store();
    let req = TransformRequest::new(Selection::Clips(vec![ClipId(1)])).with_slice(0.0);
    assert!(matches!(
        engine().run(&mut store, &req),
        Err(TransformError::InvalidRequest(_))
    ));
}

#[test]
fn shuffle_preserves_positions_and_span() {
    let clips: Vec<Clip> = (0..8)
        .map(|i| Clip::midi(ClipId(i + 1), 0, Some(i as f64 * 4.0), 4.0, vec![]))
        .collect();
    let mut store = MemoryStore::new(clips);
    let req = TransformRequest::new(Selection::Arrangement {
        track: 0,
        window: BeatWindow::new(0.0, 32.0),
    })
    .with_shuffle()
    .with_seed(77);
    engine().run(&mut store, &req).unwrap();

    let after = arrangement(&store, 0);
    let positions: Vec<f64> = after.iter().map(|c| c.position.unwrap()).collect();
    assert_eq!(positions, (0..8).map(|i| i as f64 * 4.0).collect::<Vec<_>>());
    let total: f64 = after.iter().map(|c| c.length).sum();
    assert_approx_eq!(total, 32.0);
    let mut ids: Vec<ClipId> = after.iter().map(|c| c.id).collect();
    ids.sort();
    assert_eq!(ids, (1..=8).map(ClipId).collect::<Vec<_>>());
}

#[test]
fn shuffle_is_reproducible() {
    let build = || {
        MemoryStore::new(
            (0..10)
                .map(|i| Clip::midi(ClipId(i + 1), 0, Some(i as f64 * 2.0), 2.0, vec![]))
                .collect(),
        )
    };
    let req = TransformRequest::new(Selection::Clips((1..=10).map(ClipId).collect()))
        .with_shuffle()
        .with_seed(2024);
    let mut a = build();
    let mut b = build();
    engine().run(&mut a, &req).unwrap();
    engine().run(&mut b, &req).unwrap();
    let order = |s: &MemoryStore| arrangement(s, 0).iter().map(|c| c.id).collect::<Vec<_>>();
    assert_eq!(order(&a), order(&b));
}

#[test]
fn shuffle_keeps_clips_on_their_tracks() {
    let build = || {
        let mut clips: Vec<Clip> = (0..4)
            .map(|i| Clip::midi(ClipId(i + 1), 0, Some(i as f64 * 4.0), 4.0, vec![]))
            .collect();
        clips.extend((0..4).map(|i| {
            Clip::audio(ClipId(i + 5), 1, Some(i as f64 * 4.0 + 2.0), 4.0, AudioProps::default())
        }));
        MemoryStore::new(clips)
    };
    for seed in 0..10 {
        let mut store = build();
        let req = TransformRequest::new(Selection::Clips((1..=8).map(ClipId).collect()))
            .with_shuffle()
            .with_seed(seed);
        engine().run(&mut store, &req).unwrap();

        let midi = arrangement(&store, 0);
        let audio = arrangement(&store, 1);
        assert_eq!(midi.len(), 4, "seed {seed}");
        assert_eq!(audio.len(), 4, "seed {seed}");
        assert!(midi.iter().all(|c| !c.is_audio()), "seed {seed}");
        assert!(audio.iter().all(Clip::is_audio), "seed {seed}");
        let positions: Vec<f64> = audio.iter().map(|c| c.position.unwrap()).collect();
        assert_eq!(positions, vec![2.0, 6.0, 10.0, 14.0]);
    }
}

#[test]
fn session_clips_are_left_out_of_shuffle() {
    let mut store = MemoryStore::new(vec![
        Clip::midi(ClipId(1), 0, Some(0.0), 4.0, vec![]),
        Clip::midi(ClipId(2), 0, Some(4.0), 4.0, vec![]),
        Clip::midi(ClipId(3), 0, None, 4.0, vec![]),
    ]);
    let req = TransformRequest::new(Selection::Clips(vec![ClipId(1), ClipId(2), ClipId(3)]))
        .with_shuffle()
        .with_seed(1);
    let out = engine().run(&mut store, &req).unwrap();
    assert!(out
        .warnings
        .iter()
        .any(|w| w.kind == WarningKind::SessionClipNotShuffled));
    assert!(store.get(ClipId(3)).unwrap().position.is_none());
}

#[test]
fn randomized_ranges_respect_clamps() {
    let mut store = four_bar_store();
    store.clips.push(Clip::audio(ClipId(2), 1, Some(0.0), 8.0, AudioProps::default()));
    let spec = RandomizeSpec {
        velocity: Some(ValueRange::new(-300.0, 300.0)),
        probability: Some(ValueRange::new(-0.5, 0.0)),
        transpose: Some(Transpose::Values(vec![-12.0, 0.0, 12.0])),
        gain: Some(ValueRange::new(-100.0, -90.0)),
        ..RandomizeSpec::default()
    };
    let req = TransformRequest::new(Selection::Clips(vec![ClipId(1), ClipId(2)]))
        .with_randomize(spec)
        .with_seed(9);
    let out = engine().run(&mut store, &req).unwrap();
    assert_eq!(out.notes.len(), 16);

    for n in store.get(ClipId(1)).unwrap().notes() {
        assert!((1.0..=127.0).contains(&n.velocity));
        assert!((0.5..=1.0).contains(&n.probability));
    }
    match &store.get(ClipId(2)).unwrap().content {
        ClipContent::Audio(p) => {
            assert_eq!(p.gain_db, -70.0);
            assert!([-12.0, 0.0, 12.0].contains(&p.pitch_shift));
        }
        other => panic!("expected audio, got {other:?}"),
    }
}

#[test]
fn inverted_random_range_is_rejected() {
    let mut store = four_bar_store();
    let req = TransformRequest::new(Selection::Clips(vec![ClipId(1)])).with_randomize(RandomizeSpec {
        duration: Some(ValueRange::new(2.0, 0.5)),
        ..RandomizeSpec::default()
    });
    assert!(matches!(
        engine().run(&mut store, &req),
        Err(TransformError::InvalidRequest(_))
    ));
}

#[test]
fn project_round_trip_after_transform() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.yaml");
    let mut store = four_bar_store();
    let req = TransformRequest::new(Selection::Clips(vec![ClipId(1)]))
        .with_slice(8.0)
        .with_transform("C3-B3 velocity -= 20")
        .with_seed(5);
    engine().run(&mut store, &req).unwrap();
    store.save(&path).unwrap();

    let loaded = MemoryStore::load(&path).unwrap();
    assert_eq!(loaded.clips, store.clips);
    // ids handed out after a reload must not collide with slices
    let fresh = loaded.next_clip_id();
    assert!(loaded.get(fresh).is_none());
}
