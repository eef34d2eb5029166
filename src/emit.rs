//! Linearizes an ordered sequence of strips into the final index stream,
//! taking care of winding polarity and of the degenerate bookkeeping.

use crate::mesh::Connectivity;
use crate::strip::Strip;

use alloc::vec::Vec;

/// Separates two strips in the emitted stream when stitching is disabled.
/// Never appears at the start or the end of the stream, nor inside a strip.
pub(crate) const STRIP_SEPARATOR: u32 = u32::MAX;

/// Returns the first vertex of `b` that does not appear in `a`.
pub(crate) fn unique_vertex_in_second(a: [u32; 3], b: [u32; 3]) -> Option<u32> {
    for i in 0..3 {
        if !a.contains(&b[i]) {
            return Some(b[i]);
        }
    }

    None
}

/// Returns the vertices of `face` that appear in `other`, in `face` order.
pub(crate) fn shared_vertices(face: [u32; 3], other: [u32; 3]) -> (Option<u32>, Option<u32>) {
    let mut shared0 = None;
    let mut shared1 = None;
    for i in 0..3 {
        if other.contains(&face[i]) {
            if shared0.is_none() {
                shared0 = Some(face[i]);
            } else {
                shared1 = Some(face[i]);
            }
        }
    }

    (shared0, shared1)
}

/// Whether the edge `v0 -> v1` runs along `face`'s stored orientation.
pub(crate) fn is_cw(face: [u32; 3], v0: u32, v1: u32) -> bool {
    if face[0] == v0 {
        face[1] == v1
    } else if face[1] == v0 {
        face[2] == v1
    } else {
        face[0] == v1
    }
}

/// Whether the triangle starting at index position `num_indices` of a strip
/// has the even (non flipped) winding.
pub(crate) fn next_is_cw(num_indices: usize) -> bool {
    num_indices % 2 == 0
}

/// The vertex order in which a strip's first triangle should be emitted: the
/// vertex not shared with the second triangle comes first, and when a third
/// triangle exists, the vertex shared with it goes last.
pub(crate) fn canonical_first_face(mesh: &Connectivity, strip: &Strip) -> [u32; 3] {
    let mut first = strip.faces[0].vertices(mesh);
    if strip.faces.len() > 1 {
        let second = strip.faces[1].vertices(mesh);
        if let Some(unique) = unique_vertex_in_second(second, first) {
            if unique == first[1] {
                first.swap(0, 1);
            } else if unique == first[2] {
                first.swap(0, 2);
            }
        }
        if strip.faces.len() > 2 {
            if strip.faces[1].is_filler() {
                // The second triangle flips the strip in place; pivot around
                // its middle vertex instead of looking at the third face.
                let pivot = second[1];
                if first[1] == pivot {
                    first.swap(1, 2);
                }
            } else {
                let third = strip.faces[2].vertices(mesh);
                let (shared0, shared1) = shared_vertices(first, third);
                if shared0 == Some(first[1]) && shared1.is_none() {
                    first.swap(1, 2);
                }
            }
        }
    }

    first
}

/// Emits `strips` as one index stream. When `stitch` is set the strips are
/// bridged with duplicated indices ("double-taps") into a single strip,
/// otherwise they are separated by `STRIP_SEPARATOR` sentinels.
pub(crate) fn create_strip_stream(
    mesh: &Connectivity,
    strips: &[Strip],
    stitch: bool,
) -> Vec<u32> {
    let mut out = Vec::new();
    for (i, strip) in strips.iter().enumerate() {
        debug_assert!(!strip.faces.is_empty());

        let first = canonical_first_face(mesh, strip);
        let face0 = strip.faces[0].vertices(mesh);
        if i == 0 || !stitch {
            // Start the strip on the right polarity.
            if !is_cw(face0, first[0], first[1]) {
                out.push(first[0]);
            }
        } else {
            // Double-tap the first vertex to bridge from the previous strip,
            // and tap once more if the polarity comes out wrong.
            out.push(first[0]);
            if next_is_cw(out.len()) != is_cw(face0, first[0], first[1]) {
                out.push(first[0]);
            }
        }

        out.push(first[0]);
        out.push(first[1]);
        out.push(first[2]);
        let mut last_face = first;

        for j in 1..strip.faces.len() {
            let face = strip.faces[j].vertices(mesh);
            match unique_vertex_in_second(last_face, face) {
                Some(unique) => {
                    out.push(unique);
                    last_face = [last_face[1], last_face[2], unique];
                }
                None => {
                    // A degenerate: emitting its closing vertex flips the
                    // winding, and the rolling triangle restarts from it.
                    out.push(face[2]);
                    last_face = face;
                }
            }
        }

        if i + 1 != strips.len() {
            if stitch {
                out.push(last_face[2]);
            } else {
                out.push(STRIP_SEPARATOR);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyclic_edge_orientation() {
        let face = [3, 7, 9];

        assert!(is_cw(face, 3, 7));
        assert!(is_cw(face, 7, 9));
        assert!(is_cw(face, 9, 3));
        assert!(!is_cw(face, 7, 3));
        assert!(!is_cw(face, 9, 7));
        assert!(!is_cw(face, 3, 9));
    }

    #[test]
    fn vertex_set_helpers() {
        assert_eq!(unique_vertex_in_second([0, 1, 2], [2, 1, 3]), Some(3));
        assert_eq!(unique_vertex_in_second([0, 1, 2], [1, 2, 0]), None);
        assert_eq!(shared_vertices([0, 1, 2], [2, 3, 4]), (Some(2), None));
        assert_eq!(shared_vertices([0, 1, 2], [2, 1, 3]), (Some(1), Some(2)));
        assert_eq!(shared_vertices([0, 1, 2], [4, 5, 6]), (None, None));
    }
}
