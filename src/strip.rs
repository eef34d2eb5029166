//! A provisional triangle strip under construction: it grows forward then
//! backward from a seed edge, claiming faces as it takes them.

use crate::error::WarningSink;
use crate::mesh::{Connectivity, EdgeId, FaceId};

use alloc::vec::Vec;

/// Where a strip starts: a face, one of its edges, and the direction the
/// edge is traversed in (`to_v1` picks `v0 -> v1`).
#[derive(Copy, Clone, Debug)]
pub(crate) struct StartInfo {
    pub start_face: FaceId,
    pub start_edge: EdgeId,
    pub to_v1: bool,
}

impl StartInfo {
    pub const INVALID: StartInfo = StartInfo {
        start_face: FaceId::INVALID,
        start_edge: EdgeId::INVALID,
        to_v1: false,
    };
}

/// One face of a strip, either a real triangle of the mesh or a synthesized
/// degenerate `(v0, v1, v0)` used to swap the growth direction.
///
/// Fillers are owned by the strip holding them: a discarded strip takes its
/// fillers with it, a committed one carries them through to emission.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum StripFace {
    Mesh(FaceId),
    Filler { v0: u32, v1: u32 },
}

impl StripFace {
    #[inline]
    pub fn vertices(self, mesh: &Connectivity) -> [u32; 3] {
        match self {
            StripFace::Mesh(face) => mesh.face(face).v,
            StripFace::Filler { v0, v1 } => [v0, v1, v0],
        }
    }

    #[inline]
    pub fn is_filler(self) -> bool {
        match self {
            StripFace::Mesh(..) => false,
            StripFace::Filler { .. } => true,
        }
    }
}

pub(crate) struct Strip {
    pub start: StartInfo,
    pub faces: Vec<StripFace>,
    pub strip_id: i32,
    /// -1 once the strip is committed (or was never part of an experiment).
    pub experiment_id: i32,
    /// Used by the cache aware reordering pass.
    pub visited: bool,
    pub num_degenerates: u32,
}

impl Strip {
    pub fn new(start: StartInfo, strip_id: i32, experiment_id: i32) -> Self {
        Strip {
            start,
            faces: Vec::new(),
            strip_id,
            experiment_id,
            visited: false,
            num_degenerates: 0,
        }
    }

    /// A strip piece that did not grow from a seed edge (used when splitting
    /// committed strips).
    pub fn detached() -> Self {
        Strip::new(StartInfo::INVALID, 0, -1)
    }

    #[inline]
    fn is_experiment(&self) -> bool {
        self.experiment_id >= 0
    }

    /// Whether `face` belongs to this very strip.
    pub fn is_in_strip(&self, mesh: &Connectivity, face: FaceId) -> bool {
        if !face.is_valid() {
            return false;
        }

        let face = mesh.face(face);
        if self.is_experiment() {
            face.test_strip_id == self.strip_id
        } else {
            face.strip_id == self.strip_id
        }
    }

    /// Whether `face` is claimed, either permanently or by this strip's
    /// experiment.
    pub fn is_marked(&self, mesh: &Connectivity, face: FaceId) -> bool {
        let face = mesh.face(face);

        face.strip_id >= 0 || (self.is_experiment() && face.experiment_id == self.experiment_id)
    }

    /// Claims `face` for this strip, permanently if the strip is committed.
    pub fn mark(&self, mesh: &mut Connectivity, face: FaceId) {
        debug_assert!(!self.is_marked(mesh, face));
        let face = mesh.face_mut(face);
        if self.is_experiment() {
            face.experiment_id = self.experiment_id;
            face.test_strip_id = self.strip_id;
        } else {
            debug_assert_eq!(face.strip_id, -1);
            face.experiment_id = -1;
            face.strip_id = self.strip_id;
        }
    }

    /// Whether `face` shares at least one edge with this strip.
    pub fn shares_edge(&self, mesh: &Connectivity, face: FaceId) -> bool {
        let v = mesh.face(face).v;
        let edges = [(v[0], v[1]), (v[1], v[2]), (v[2], v[0])];
        for &(a, b) in edges.iter() {
            let edge = mesh.find_edge(a, b);
            if !edge.is_valid() {
                continue;
            }
            let edge = mesh.edge(edge);
            if self.is_in_strip(mesh, edge.face0) || self.is_in_strip(mesh, edge.face1) {
                return true;
            }
        }

        false
    }

    /// Grows the strip from its seed edge, first forward then backward, and
    /// stores the combined face list (reversed backward faces followed by the
    /// forward ones).
    pub fn build(&mut self, mesh: &mut Connectivity, warnings: &mut dyn WarningSink) {
        let mut forward = Vec::new();
        let mut backward = Vec::new();

        forward.push(StripFace::Mesh(self.start.start_face));
        self.mark(mesh, self.start.start_face);

        let edge = mesh.edge(self.start.start_edge);
        let (v0, v1) = if self.start.to_v1 {
            (edge.v0, edge.v1)
        } else {
            (edge.v1, edge.v0)
        };
        let v2 = mesh.next_index(v0, v1, self.start.start_face, warnings);

        self.grow(mesh, warnings, (v1, v2), &mut forward, None);

        // The union of both halves, used to keep the backward growth from
        // wrapping the strip onto itself.
        let mut all_faces = forward.clone();
        self.grow(mesh, warnings, (v1, v0), &mut backward, Some(&mut all_faces));

        self.faces.clear();
        self.faces.extend(backward.iter().rev().cloned());
        self.faces.extend_from_slice(&forward);
    }

    /// One growth direction: follow the open edge `(nv0, nv1)` face by face,
    /// inserting a degenerate filler whenever that keeps a dead end at bay.
    fn grow(
        &mut self,
        mesh: &mut Connectivity,
        warnings: &mut dyn WarningSink,
        tail: (u32, u32),
        out: &mut Vec<StripFace>,
        mut all_faces: Option<&mut Vec<StripFace>>,
    ) {
        let (mut nv0, mut nv1) = tail;
        let mut next_face = mesh.other_face(nv0, nv1, self.start.start_face);
        while next_face.is_valid() && !self.is_marked(mesh, next_face) {
            if let Some(ref all) = all_faces {
                if !is_unique(mesh, all.as_slice(), next_face) {
                    break;
                }
            }

            let mut testnv0 = nv1;
            let testnv1 = mesh.next_index(nv0, nv1, next_face, warnings);

            // Peek one face ahead; if the straight continuation is blocked,
            // swapping over to the other free edge may keep the strip going.
            let next_next_face = mesh.other_face(nv1, testnv1, next_face);
            if !next_next_face.is_valid() || self.is_marked(mesh, next_next_face) {
                let swap_face = mesh.other_face(nv0, testnv1, next_face);
                if swap_face.is_valid() && !self.is_marked(mesh, swap_face) {
                    out.push(StripFace::Filler { v0: nv0, v1: nv1 });
                    testnv0 = nv0;
                    self.num_degenerates += 1;
                }
            }

            out.push(StripFace::Mesh(next_face));
            if let Some(all_faces) = all_faces.as_mut() {
                all_faces.push(StripFace::Mesh(next_face));
            }
            self.mark(mesh, next_face);

            nv0 = testnv0;
            nv1 = testnv1;
            next_face = mesh.other_face(nv0, nv1, next_face);
        }
    }
}

/// Whether at least one of `face`'s vertices appears in none of `faces`.
fn is_unique(mesh: &Connectivity, faces: &[StripFace], face: FaceId) -> bool {
    let v = mesh.face(face).v;
    let mut seen = [false; 3];
    for &other in faces {
        let ov = other.vertices(mesh);
        for i in 0..3 {
            seen[i] = seen[i] || ov.contains(&v[i]);
        }
        if seen[0] && seen[1] && seen[2] {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Connectivity;

    use alloc::vec::Vec;

    fn build_strip(indices: &[u32], v0: u32, v1: u32) -> (Connectivity, Strip) {
        let max_index = indices.iter().cloned().max().unwrap();
        let mut warnings = Vec::new();
        let mut mesh = Connectivity::new(indices, max_index, &mut warnings);
        assert!(warnings.is_empty());

        let edge = mesh.find_edge(v0, v1);
        let to_v1 = mesh.edge(edge).v0 == v0;
        let mut strip = Strip::new(
            StartInfo {
                start_face: FaceId(0),
                start_edge: edge,
                to_v1,
            },
            0,
            0,
        );
        strip.build(&mut mesh, &mut warnings);
        assert!(warnings.is_empty());

        (mesh, strip)
    }

    #[test]
    fn forward_chain() {
        let (_, strip) = build_strip(&[0, 1, 2, 2, 1, 3, 2, 3, 4, 4, 3, 5], 0, 1);

        let expected: Vec<StripFace> = (0..4).map(|i| StripFace::Mesh(FaceId(i))).collect();
        assert_eq!(strip.faces, expected);
        assert_eq!(strip.num_degenerates, 0);
    }

    #[test]
    fn backward_faces_come_reversed_in_front() {
        // Same chain, but seeded from the middle.
        let (_, strip) = build_strip(&[2, 1, 3, 0, 1, 2, 2, 3, 4, 4, 3, 5], 3, 2);

        // Forward runs 0 -> 1, backward picks up 2 and 3.
        assert_eq!(
            strip.faces,
            alloc::vec![
                StripFace::Mesh(FaceId(3)),
                StripFace::Mesh(FaceId(2)),
                StripFace::Mesh(FaceId(0)),
                StripFace::Mesh(FaceId(1)),
            ]
        );
    }

    #[test]
    fn swap_insertion_continues_across_far_edge() {
        // Following (0,1,2) -> (2,1,3) dead-ends at the edge (2,3), but the
        // face across (1,3) is free: the builder inserts a filler and swaps.
        let (_, strip) = build_strip(&[0, 1, 2, 2, 1, 3, 1, 4, 3], 0, 1);

        assert_eq!(
            strip.faces,
            alloc::vec![
                StripFace::Mesh(FaceId(0)),
                StripFace::Filler { v0: 1, v1: 2 },
                StripFace::Mesh(FaceId(1)),
                StripFace::Mesh(FaceId(2)),
            ]
        );
        assert_eq!(strip.num_degenerates, 1);
    }

    #[test]
    fn closed_fan_claims_each_face_once() {
        // A closed fan around vertex 0: growth must stop when it runs into
        // its own claimed territory.
        let indices = [0, 1, 2, 0, 2, 3, 0, 3, 4, 0, 4, 1];
        let (_, strip) = build_strip(&indices, 1, 2);

        let mut claimed = [0u32; 4];
        for &face in &strip.faces {
            if let StripFace::Mesh(f) = face {
                claimed[f.to_usize()] += 1;
            }
        }
        assert!(claimed.iter().all(|&c| c <= 1));
    }
}
