//! Face and edge tables giving constant time access to the triangles
//! incident to any edge of the mesh.

use crate::error::{Warning, WarningSink};

use alloc::vec::Vec;

/// Identifier of a face in the connectivity tables.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct FaceId(pub u32);

impl FaceId {
    pub const INVALID: FaceId = FaceId(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    #[inline]
    pub fn to_usize(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of an edge in the connectivity tables.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct EdgeId(pub u32);

impl EdgeId {
    pub const INVALID: EdgeId = EdgeId(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    #[inline]
    pub fn to_usize(self) -> usize {
        self.0 as usize
    }
}

pub(crate) struct FaceInfo {
    pub v: [u32; 3],
    /// Strip owning this face, -1 while unassigned.
    pub strip_id: i32,
    /// Same as `strip_id` but scoped to an in-progress experiment.
    pub test_strip_id: i32,
    /// Experiment that last wrote `test_strip_id`, -1 for none.
    pub experiment_id: i32,
}

impl FaceInfo {
    fn new(v0: u32, v1: u32, v2: u32) -> Self {
        FaceInfo {
            v: [v0, v1, v2],
            strip_id: -1,
            test_strip_id: -1,
            experiment_id: -1,
        }
    }
}

/// An undirected edge and its (at most two) incident faces.
///
/// Edges are threaded through two singly linked chains at once, one per
/// endpoint, so that all edges incident to a vertex can be walked from
/// `Connectivity::edge_heads`. The two vertex slots are symmetric: there is
/// no ordering requirement between `v0` and `v1`.
pub(crate) struct EdgeInfo {
    pub v0: u32,
    pub v1: u32,
    pub face0: FaceId,
    pub face1: FaceId,
    pub next_v0: EdgeId,
    pub next_v1: EdgeId,
}

pub(crate) struct Connectivity {
    pub faces: Vec<FaceInfo>,
    pub edges: Vec<EdgeInfo>,
    /// Head of the edge chain of each vertex, indexed by vertex id.
    pub edge_heads: Vec<EdgeId>,
}

impl Connectivity {
    /// Builds the face and edge tables from a triangle list.
    ///
    /// Degenerate input triangles are skipped. Exact duplicates of a triangle
    /// already in the table are dropped as well, and an edge shared by more
    /// than two triangles keeps its first two faces and emits a warning.
    pub fn new(indices: &[u32], max_index: u32, warnings: &mut dyn WarningSink) -> Self {
        let mut mesh = Connectivity {
            faces: Vec::with_capacity(indices.len() / 3),
            edges: Vec::new(),
            edge_heads: Vec::new(),
        };
        mesh.edge_heads.resize(max_index as usize + 1, EdgeId::INVALID);

        for triangle in indices.chunks_exact(3) {
            let (v0, v1, v2) = (triangle[0], triangle[1], triangle[2]);
            if v0 == v1 || v1 == v2 || v2 == v0 {
                continue;
            }

            // The triangle can only be a duplicate if all three of its edges
            // were already in the table, which is why edge updates are not
            // short-circuited on the first hit.
            let face = FaceId(mesh.faces.len() as u32);
            let mut might_already_exist = true;
            let mut face_updated = [false; 3];
            let mut face_edges = [EdgeId::INVALID; 3];
            let edge_vertices = [(v0, v1), (v1, v2), (v2, v0)];
            for i in 0..3 {
                let (a, b) = edge_vertices[i];
                let edge = mesh.find_edge(a, b);
                if edge.is_valid() {
                    if mesh.edges[edge.to_usize()].face1.is_valid() {
                        warnings.warning(Warning::NonManifoldEdge { v0: a, v1: b });
                    } else {
                        mesh.edges[edge.to_usize()].face1 = face;
                        face_updated[i] = true;
                    }
                    face_edges[i] = edge;
                } else {
                    might_already_exist = false;
                    face_edges[i] = mesh.add_edge(a, b, face);
                }
            }

            if might_already_exist && mesh.already_exists(v0, v1, v2) {
                // Drop the duplicate and detach it from the edges it grabbed.
                for i in 0..3 {
                    if face_updated[i] {
                        mesh.edges[face_edges[i].to_usize()].face1 = FaceId::INVALID;
                    }
                }
            } else {
                mesh.faces.push(FaceInfo::new(v0, v1, v2));
            }
        }

        mesh
    }

    fn add_edge(&mut self, v0: u32, v1: u32, face: FaceId) -> EdgeId {
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(EdgeInfo {
            v0,
            v1,
            face0: face,
            face1: FaceId::INVALID,
            next_v0: self.edge_heads[v0 as usize],
            next_v1: self.edge_heads[v1 as usize],
        });
        self.edge_heads[v0 as usize] = id;
        self.edge_heads[v1 as usize] = id;

        id
    }

    fn already_exists(&self, v0: u32, v1: u32, v2: u32) -> bool {
        self.faces
            .iter()
            .any(|face| face.v[0] == v0 && face.v[1] == v1 && face.v[2] == v2)
    }

    #[inline]
    pub fn face(&self, id: FaceId) -> &FaceInfo {
        &self.faces[id.to_usize()]
    }

    #[inline]
    pub fn face_mut(&mut self, id: FaceId) -> &mut FaceInfo {
        &mut self.faces[id.to_usize()]
    }

    #[inline]
    pub fn edge(&self, id: EdgeId) -> &EdgeInfo {
        &self.edges[id.to_usize()]
    }

    /// Looks up the undirected edge `(v0, v1)` by walking `v0`'s edge chain.
    pub fn find_edge(&self, v0: u32, v1: u32) -> EdgeId {
        let mut iter = self.edge_heads[v0 as usize];
        while iter.is_valid() {
            let edge = self.edge(iter);
            if edge.v0 == v0 {
                if edge.v1 == v1 {
                    return iter;
                }
                iter = edge.next_v0;
            } else {
                debug_assert_eq!(edge.v1, v0);
                if edge.v0 == v1 {
                    return iter;
                }
                iter = edge.next_v1;
            }
        }

        EdgeId::INVALID
    }

    /// Returns the face on the other side of the edge `(v0, v1)`.
    pub fn other_face(&self, v0: u32, v1: u32, face: FaceId) -> FaceId {
        let edge = self.find_edge(v0, v1);
        if !edge.is_valid() {
            // Happens when probing the self-edge of a degenerate.
            return FaceId::INVALID;
        }

        let edge = self.edge(edge);
        if edge.face0 == face {
            edge.face1
        } else {
            edge.face0
        }
    }

    /// Number of faces adjacent to the triangle `v`, excluding `face` itself.
    pub fn num_neighbors(&self, v: [u32; 3], face: FaceId) -> u32 {
        let mut neighbors = 0;
        if self.other_face(v[0], v[1], face).is_valid() {
            neighbors += 1;
        }
        if self.other_face(v[1], v[2], face).is_valid() {
            neighbors += 1;
        }
        if self.other_face(v[2], v[0], face).is_valid() {
            neighbors += 1;
        }

        neighbors
    }

    /// Given the last two emitted indices `(v0, v1)`, returns the index that
    /// `face` contributes next to the strip.
    ///
    /// If the face turns out not to contain the edge, a warning is emitted
    /// and the least bad vertex is returned so that the caller can carry on.
    pub fn next_index(
        &self,
        v0: u32,
        v1: u32,
        face: FaceId,
        warnings: &mut dyn WarningSink,
    ) -> u32 {
        let fv = self.face(face).v;

        for i in 0..3 {
            if fv[i] != v0 && fv[i] != v1 {
                let others = [fv[(i + 1) % 3], fv[(i + 2) % 3]];
                if others.iter().any(|&o| o != v0 && o != v1) {
                    warnings.warning(Warning::BrokenAdjacency { v0, v1 });
                }
                return fv[i];
            }
        }

        warnings.warning(Warning::BrokenAdjacency { v0, v1 });

        v0
    }
}
