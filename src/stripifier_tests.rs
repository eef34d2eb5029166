use crate::{
    generate_strips, remap_indices, PrimitiveGroup, PrimitiveKind, StripError, StripOptions,
    Stripifier, Warning, WarningSink,
};

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use std::vec;

/// Rotates a triangle so its smallest index comes first, which makes
/// triangles comparable without losing their orientation.
fn rotated(tri: [u32; 3]) -> [u32; 3] {
    let mut min = 0;
    for i in 1..3 {
        if tri[i] < tri[min] {
            min = i;
        }
    }

    [tri[min], tri[(min + 1) % 3], tri[(min + 2) % 3]]
}

fn input_triangles(indices: &[u32]) -> Vec<[u32; 3]> {
    let mut triangles: Vec<[u32; 3]> = indices
        .chunks_exact(3)
        .map(|t| [t[0], t[1], t[2]])
        .filter(|t| t[0] != t[1] && t[1] != t[2] && t[2] != t[0])
        .map(rotated)
        .collect();
    triangles.sort();

    triangles
}

fn output_triangles(groups: &[PrimitiveGroup]) -> Vec<[u32; 3]> {
    let mut triangles: Vec<[u32; 3]> = groups
        .iter()
        .flat_map(|group| group.triangles())
        .map(rotated)
        .collect();
    triangles.sort();

    triangles
}

/// Stripifies and checks the output against the input: every input triangle
/// must come out exactly once, in the same orientation, and no group may
/// contain the reserved separator value.
fn stripify_and_check(indices: &[u32], options: &StripOptions) -> Vec<PrimitiveGroup> {
    let groups = generate_strips(indices, options).unwrap();

    for group in &groups {
        assert!(!group.indices.contains(&u32::MAX));
        if options.lists_only {
            assert_eq!(group.kind, PrimitiveKind::TriangleList);
        }
    }
    if options.lists_only {
        assert_eq!(groups.len(), 1);
    }

    assert_eq!(
        output_triangles(&groups),
        input_triangles(indices),
        "coverage or winding broken for options {:?}",
        options
    );

    groups
}

#[test]
fn single_triangle() {
    let groups = stripify_and_check(&[0, 1, 2], &StripOptions::DEFAULT);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].kind, PrimitiveKind::TriangleStrip);
    assert_eq!(groups[0].indices, vec![0, 1, 2]);
}

#[test]
fn quad() {
    let groups = stripify_and_check(&[0, 1, 2, 2, 1, 3], &StripOptions::DEFAULT);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].kind, PrimitiveKind::TriangleStrip);
    assert_eq!(groups[0].indices, vec![0, 1, 2, 3]);
}

#[test]
fn four_triangle_ribbon() {
    let groups = stripify_and_check(
        &[0, 1, 2, 2, 1, 3, 2, 3, 4, 4, 3, 5],
        &StripOptions::DEFAULT,
    );

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].kind, PrimitiveKind::TriangleStrip);
    assert_eq!(groups[0].indices, vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn disjoint_triangles_unstitched() {
    let options = StripOptions::DEFAULT.with_stitch_strips(false);
    let groups = stripify_and_check(&[0, 1, 2, 3, 4, 5], &options);

    assert_eq!(groups.len(), 2);
    for group in &groups {
        assert_eq!(group.kind, PrimitiveKind::TriangleStrip);
        assert_eq!(group.indices.len(), 3);
    }
}

#[test]
fn disjoint_triangles_stitched() {
    let groups = stripify_and_check(&[0, 1, 2, 3, 4, 5], &StripOptions::DEFAULT);

    // One strip: the two triangles bridged by degenerates, with one extra
    // tap to restore the winding parity.
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].indices, vec![0, 1, 2, 2, 3, 3, 3, 4, 5]);
    assert_eq!(groups[0].triangles().count(), 2);
}

#[test]
fn lists_only_quad() {
    let options = StripOptions::DEFAULT.with_lists_only(true);
    let groups = stripify_and_check(&[0, 1, 2, 2, 1, 3], &options);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].kind, PrimitiveKind::TriangleList);
    assert_eq!(groups[0].indices, vec![0, 1, 2, 2, 1, 3]);
}

#[test]
fn empty_input() {
    let groups = generate_strips(&[], &StripOptions::DEFAULT).unwrap();
    assert!(groups.is_empty());
}

#[test]
fn bad_index_count() {
    assert_eq!(
        generate_strips(&[0, 1, 2, 3], &StripOptions::DEFAULT),
        Err(StripError::IndexCountNotMultipleOfThree)
    );
}

#[test]
fn reserved_index() {
    assert_eq!(
        generate_strips(&[0, 1, u32::MAX], &StripOptions::DEFAULT),
        Err(StripError::ReservedIndex)
    );
}

#[test]
fn degenerate_input_is_filtered() {
    // The two degenerate triangles disappear, the real one survives.
    let groups = stripify_and_check(&[0, 0, 1, 0, 1, 2, 2, 2, 2], &StripOptions::DEFAULT);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].indices, vec![0, 1, 2]);
}

#[test]
fn swapped_strip_keeps_winding() {
    // This mesh dead-ends half way and forces a degenerate swap into the
    // strip; the flipped continuation must still come out with the original
    // orientations.
    stripify_and_check(&[0, 1, 2, 2, 1, 3, 1, 4, 3], &StripOptions::DEFAULT);
}

#[test]
fn min_strip_length_demotes_fragments() {
    // A ribbon that strips well plus an island triangle: with a minimum
    // strip length the island must end up in the trailing list group.
    let indices = [0, 1, 2, 2, 1, 3, 2, 3, 4, 4, 3, 5, 10, 11, 12];
    let options = StripOptions::DEFAULT.with_min_strip_length(2);
    let groups = stripify_and_check(&indices, &options);

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].kind, PrimitiveKind::TriangleStrip);
    assert_eq!(groups[0].triangles().count(), 4);
    assert_eq!(groups[1].kind, PrimitiveKind::TriangleList);
    assert_eq!(groups[1].indices, vec![10, 11, 12]);
}

#[test]
fn min_strip_length_applies_per_group() {
    let indices = [0, 1, 2, 2, 1, 3, 2, 3, 4, 4, 3, 5, 10, 11, 12];
    let options = StripOptions::DEFAULT
        .with_min_strip_length(2)
        .with_stitch_strips(false);
    let groups = stripify_and_check(&indices, &options);

    for group in &groups {
        match group.kind {
            PrimitiveKind::TriangleStrip => assert!(group.triangles().count() >= 2),
            PrimitiveKind::TriangleList => {}
        }
    }
}

fn grid_indices(cells: u32) -> Vec<u32> {
    let stride = cells + 1;
    let mut indices = Vec::new();
    for y in 0..cells {
        for x in 0..cells {
            let a = y * stride + x;
            let b = a + 1;
            let c = a + stride;
            let d = c + 1;
            indices.extend_from_slice(&[a, b, c, c, b, d]);
        }
    }

    indices
}

#[test]
fn grid_with_default_options() {
    stripify_and_check(&grid_indices(4), &StripOptions::DEFAULT);
}

#[test]
fn grid_with_every_option_combination() {
    let grid = grid_indices(4);
    for &cache_size in &[0u32, 7, 16, 24] {
        for &stitch in &[true, false] {
            for &min_length in &[0u32, 3] {
                for &lists_only in &[true, false] {
                    let options = StripOptions::cache_size(cache_size)
                        .with_stitch_strips(stitch)
                        .with_min_strip_length(min_length)
                        .with_lists_only(lists_only);
                    stripify_and_check(&grid, &options);
                }
            }
        }
    }
}

#[test]
fn lists_only_is_idempotent() {
    let options = StripOptions::DEFAULT.with_lists_only(true);

    let first = stripify_and_check(&grid_indices(3), &options);
    let second = stripify_and_check(&first[0].indices, &options);

    assert_eq!(output_triangles(&first), output_triangles(&second));
}

#[test]
fn remap_round_trip() {
    let groups = generate_strips(&[5, 4, 3, 3, 4, 1], &StripOptions::DEFAULT).unwrap();
    let remapped = remap_indices(&groups, 6);

    // Recover the permutation and check that inverting it restores the
    // original index streams exactly.
    let mut old_of_new = vec![u32::MAX; 6];
    for (group, remapped_group) in groups.iter().zip(remapped.iter()) {
        assert_eq!(group.kind, remapped_group.kind);
        assert_eq!(group.indices.len(), remapped_group.indices.len());
        for (&old, &new) in group.indices.iter().zip(remapped_group.indices.iter()) {
            if old_of_new[new as usize] == u32::MAX {
                old_of_new[new as usize] = old;
            } else {
                assert_eq!(old_of_new[new as usize], old);
            }
        }
    }

    for (group, remapped_group) in groups.iter().zip(remapped.iter()) {
        let restored: Vec<u32> = remapped_group
            .indices
            .iter()
            .map(|&new| old_of_new[new as usize])
            .collect();
        assert_eq!(restored, group.indices);
    }

    // New indices are handed out in first-touch order.
    let mut seen = vec![false; 6];
    let mut next_expected = 0;
    for group in &remapped {
        for &index in &group.indices {
            if !seen[index as usize] {
                assert_eq!(index, next_expected);
                seen[index as usize] = true;
                next_expected += 1;
            }
        }
    }
}

struct SharedSink(Rc<RefCell<Vec<Warning>>>);

impl WarningSink for SharedSink {
    fn warning(&mut self, warning: Warning) {
        self.0.borrow_mut().push(warning);
    }
}

#[test]
fn warnings_reach_the_handler() {
    let warnings = Rc::new(RefCell::new(Vec::new()));

    let mut stripifier = Stripifier::new();
    stripifier.set_warning_handler(Box::new(SharedSink(warnings.clone())));

    // Three triangles on one edge: non-manifold.
    let groups = stripifier
        .stripify(&[0, 1, 2, 1, 0, 3, 0, 1, 4], &StripOptions::DEFAULT)
        .unwrap();

    assert!(!groups.is_empty());
    assert!(warnings
        .borrow()
        .contains(&Warning::NonManifoldEdge { v0: 0, v1: 1 }));

    // All three triangles still made it to the output.
    assert_eq!(output_triangles(&groups).len(), 3);

    stripifier.clear_warning_handler();
}
