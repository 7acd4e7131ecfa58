//! Shuffling — permute which clip occupies which arrangement slot.
//!
//! Slots are the positions the input clips occupy on each track. Clips only
//! trade positions with clips on their own track, so every track keeps its
//! slots and its kind of content.

use std::collections::BTreeMap;

use crate::clip::Clip;
use crate::rng::TransformRng;

/// Uniform Fisher–Yates permutation of `0..n` drawn from `rng`.
pub fn permutation(n: usize, rng: &mut TransformRng) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    for i in (1..n).rev() {
        let j = rng.index(i + 1);
        order.swap(i, j);
    }
    order
}

/// Sort arrangement clips by (position, track, id).
pub fn sort_by_slot(clips: &mut [Clip]) {
    clips.sort_by(|a, b| {
        let pa = a.position.unwrap_or(f64::INFINITY);
        let pb = b.position.unwrap_or(f64::INFINITY);
        pa.total_cmp(&pb)
            .then(a.track.cmp(&b.track))
            .then(a.id.cmp(&b.id))
    });
}

/// Reassign positions among clips sharing a track and return the permutation
/// drawn for each track, in ascending track order. Within a track, clip `i`
/// (in slot order) moved to slot `perm[i]`.
pub fn shuffle(clips: &mut [Clip], rng: &mut TransformRng) -> Vec<Vec<usize>> {
    sort_by_slot(clips);
    let mut tracks: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (i, clip) in clips.iter().enumerate() {
        tracks.entry(clip.track).or_default().push(i);
    }

    let mut perms = Vec::with_capacity(tracks.len());
    for members in tracks.values() {
        let slots: Vec<Option<f64>> = members.iter().map(|&i| clips[i].position).collect();
        let perm = permutation(members.len(), rng);
        for (&i, &target) in members.iter().zip(&perm) {
            clips[i].position = slots[target];
        }
        perms.push(perm);
    }
    sort_by_slot(clips);
    perms
}
