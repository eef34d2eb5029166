//! Renumbers the indices of primitive groups in first use order, so that the
//! caller can lay the vertex buffer out in the exact order the GPU will
//! fetch it.

use crate::PrimitiveGroup;

use alloc::vec::Vec;

const UNMAPPED: u32 = u32::MAX;

/// Returns a copy of `groups` in which vertex indices are renumbered in
/// first-touch order: the first index encountered becomes 0, the next unseen
/// one 1, and so on across all groups.
///
/// The caller is expected to permute its vertex buffer to match. Every index
/// in `groups` must be smaller than `num_vertices`.
pub fn remap_indices(groups: &[PrimitiveGroup], num_vertices: u32) -> Vec<PrimitiveGroup> {
    let mut index_cache = Vec::new();
    index_cache.resize(num_vertices as usize, UNMAPPED);

    let mut next_index = 0;
    let mut remapped = Vec::with_capacity(groups.len());
    for group in groups {
        let mut indices = Vec::with_capacity(group.indices.len());
        for &index in &group.indices {
            let entry = &mut index_cache[index as usize];
            if *entry == UNMAPPED {
                *entry = next_index;
                next_index += 1;
            }
            indices.push(*entry);
        }
        remapped.push(PrimitiveGroup {
            kind: group.kind,
            indices,
        });
    }

    remapped
}
