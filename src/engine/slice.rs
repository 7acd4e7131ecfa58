//! Slicing — split arrangement clips into consecutive fixed-length segments.
//!
//! Every segment starts at its original absolute position. The last segment is
//! shorter when the clip length isn't a multiple of the slice size. Notes go to
//! the segment containing their start and keep their duration; audio segments
//! advance their content offset.

use crate::clip::{Clip, ClipContent, ClipId, Note};

/// Length tolerance (raw beats) so 4.0000000001 / 1.0 doesn't produce a fifth sliver.
const LENGTH_EPSILON: f64 = 1e-9;

/// Number of segments `length` splits into at `size`. Always at least 1,
/// saturating at `usize::MAX` for sizes too small to count.
pub fn segment_count(length: f64, size: f64) -> usize {
    if size <= 0.0 || length <= size + LENGTH_EPSILON {
        return 1;
    }
    let count = ((length - LENGTH_EPSILON) / size).ceil();
    if count >= usize::MAX as f64 {
        usize::MAX
    } else {
        count.max(1.0) as usize
    }
}

/// `(offset, length)` of each segment, in raw beats relative to the clip start.
pub fn segments(length: f64, size: f64) -> Vec<(f64, f64)> {
    let count = segment_count(length, size);
    (0..count)
        .map(|i| {
            let offset = i as f64 * size;
            let len = if i + 1 == count {
                length - offset
            } else {
                size
            };
            (offset, len)
        })
        .collect()
}

/// Slice size for `clip` in raw beats, from a size given in musical beats.
pub fn raw_slice_size(clip: &Clip, slice_beats: f64) -> f64 {
    clip.time_signature.to_raw(slice_beats)
}

/// Split one arrangement clip. `next_id` supplies an id per segment.
///
/// Returns the clip unchanged (same id) if it fits in a single segment.
pub fn slice_clip(clip: &Clip, slice_beats: f64, next_id: &mut impl FnMut() -> ClipId) -> Vec<Clip> {
    let Some(position) = clip.position else {
        return vec![clip.clone()];
    };
    let size = raw_slice_size(clip, slice_beats);
    let parts = segments(clip.length, size);
    if parts.len() <= 1 {
        return vec![clip.clone()];
    }

    let last = parts.len() - 1;
    let mut buckets: Vec<Vec<Note>> = vec![Vec::new(); parts.len()];
    for note in clip.notes() {
        let idx = ((note.start / size).floor().max(0.0) as usize).min(last);
        let mut moved = note.clone();
        moved.start -= parts[idx].0;
        buckets[idx].push(moved);
    }

    parts
        .iter()
        .zip(buckets)
        .enumerate()
        .map(|(i, (&(offset, len), notes))| {
            let content = match &clip.content {
                ClipContent::Midi { .. } => ClipContent::Midi { notes },
                ClipContent::Audio(props) => {
                    let mut props = props.clone();
                    props.content_offset += offset;
                    ClipContent::Audio(props)
                }
            };
            Clip {
                id: next_id(),
                track: clip.track,
                position: Some(position + offset),
                length: len,
                time_signature: clip.time_signature,
                name: if clip.name.is_empty() {
                    String::new()
                } else {
                    format!("{} {}", clip.name, i + 1)
                },
                content,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::AudioProps;
    use crate::time::TimeSignature;
    use assert_approx_eq::assert_approx_eq;

    fn ids() -> impl FnMut() -> ClipId {
        let mut n = 100;
        move || {
            n += 1;
            ClipId(n)
        }
    }

    #[test]
    fn exact_multiple() {
        assert_eq!(segment_count(16.0, 4.0), 4);
        assert_eq!(segments(16.0, 4.0).last().copied(), Some((12.0, 4.0)));
    }

    #[test]
    fn remainder_makes_short_final_segment() {
        let parts = segments(10.0, 4.0);
        assert_eq!(parts.len(), 3);
        assert_approx_eq!(parts[2].0, 8.0);
        assert_approx_eq!(parts[2].1, 2.0);
    }

    #[test]
    fn tiny_overshoot_is_ignored() {
        assert_eq!(segment_count(4.0 + 1e-12, 1.0), 4);
    }

    #[test]
    fn vanishing_size_saturates() {
        assert_eq!(segment_count(16.0, 1e-300), usize::MAX);
    }

    #[test]
    fn short_clip_is_one_segment() {
        assert_eq!(segment_count(2.0, 4.0), 1);
        assert_eq!(segment_count(4.0, 4.0), 1);
    }

    #[test]
    fn four_bars_into_four_one_bar_clips() {
        let notes: Vec<Note> = (0..16)
            .map(|i| Note::new(60 + (i % 4) as u8, i as f64, 0.5, 100.0))
            .collect();
        let clip = Clip::midi(ClipId(1), 0, Some(32.0), 16.0, notes.clone());
        let slices = slice_clip(&clip, 4.0, &mut ids());
        assert_eq!(slices.len(), 4);

        let mut rebuilt = Vec::new();
        for s in &slices {
            assert_approx_eq!(s.length, 4.0);
            let offset = s.position.unwrap() - 32.0;
            for n in s.notes() {
                let mut n = n.clone();
                n.start += offset;
                rebuilt.push(n);
            }
        }
        assert_eq!(rebuilt, notes);
        assert_approx_eq!(slices[3].position.unwrap(), 44.0);
    }

    #[test]
    fn segments_get_new_ids() {
        let clip = Clip::midi(ClipId(1), 0, Some(0.0), 8.0, vec![]);
        let slices = slice_clip(&clip, 4.0, &mut ids());
        let got: Vec<ClipId> = slices.iter().map(|c| c.id).collect();
        assert_eq!(got, vec![ClipId(101), ClipId(102)]);
    }

    #[test]
    fn slice_size_is_musical_beats() {
        // 6/8: 3 musical beats = 1.5 raw beats, 6 raw beats -> 4 segments
        let clip = Clip::midi(ClipId(1), 0, Some(0.0), 6.0, vec![])
            .with_time_signature(TimeSignature::new(6, 8).unwrap());
        assert_eq!(slice_clip(&clip, 3.0, &mut ids()).len(), 4);
    }

    #[test]
    fn audio_segments_advance_content_offset() {
        let clip = Clip::audio(
            ClipId(1),
            0,
            Some(4.0),
            8.0,
            AudioProps {
                gain_db: -3.0,
                pitch_shift: 0.0,
                content_offset: 1.0,
            },
        );
        let slices = slice_clip(&clip, 4.0, &mut ids());
        match &slices[1].content {
            ClipContent::Audio(props) => {
                assert_approx_eq!(props.content_offset, 5.0);
                assert_approx_eq!(props.gain_db, -3.0);
            }
            other => panic!("expected audio, got {other:?}"),
        }
        assert_approx_eq!(slices[1].position.unwrap(), 8.0);
    }

    #[test]
    fn session_clip_is_returned_unchanged() {
        let clip = Clip::midi(ClipId(1), 0, None, 16.0, vec![]);
        assert_eq!(slice_clip(&clip, 4.0, &mut ids()), vec![clip]);
    }
}
