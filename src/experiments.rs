//! The outer strip discovery heuristic: each round spawns a batch of
//! speculative strip chains from a handful of reset points, scores them, and
//! commits the most promising one.

use crate::error::WarningSink;
use crate::mesh::{Connectivity, EdgeId, FaceId};
use crate::strip::{StartInfo, Strip, StripFace};

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

/// Number of reset points evaluated per round.
const NUM_SAMPLES: usize = 10;

pub(crate) struct ExperimentDriver<'l> {
    mesh: &'l mut Connectivity,
    warnings: &'l mut dyn WarningSink,
    pub log: bool,
    /// Fraction of the face table to jump to for the next reset point.
    mesh_jump: f32,
    first_reset_point: bool,
    next_strip_id: i32,
    next_experiment_id: i32,
}

impl<'l> ExperimentDriver<'l> {
    pub fn new(
        mesh: &'l mut Connectivity,
        warnings: &'l mut dyn WarningSink,
        log: bool,
    ) -> Self {
        ExperimentDriver {
            mesh,
            warnings,
            log,
            mesh_jump: 0.0,
            first_reset_point: true,
            next_strip_id: 0,
            next_experiment_id: 0,
        }
    }

    /// Runs rounds of experiments until every face is claimed, returning the
    /// committed strips in commit order.
    pub fn find_all_strips(mut self) -> Vec<Strip> {
        let mut all_strips = Vec::new();
        let mut round = 0;
        let mut done = false;
        while !done {
            round += 1;

            // Pick up to NUM_SAMPLES distinct reset points and set up six
            // experiments per point, one per directed edge of the seed face.
            let mut experiments: Vec<Vec<Strip>> = Vec::new();
            let mut reset_points: BTreeSet<FaceId> = BTreeSet::new();
            for _ in 0..NUM_SAMPLES {
                let seed = self.find_good_reset_point();
                if !seed.is_valid() {
                    done = true;
                    break;
                }
                if !reset_points.insert(seed) {
                    continue;
                }
                debug_assert!(self.mesh.face(seed).strip_id < 0);

                let v = self.mesh.face(seed).v;
                let seed_edges = [(v[0], v[1]), (v[1], v[2]), (v[2], v[0])];
                for &(a, b) in seed_edges.iter() {
                    let edge = self.mesh.find_edge(a, b);
                    experiments.push(alloc::vec![self.new_strip(seed, edge, true)]);
                    experiments.push(alloc::vec![self.new_strip(seed, edge, false)]);
                }
            }

            // Grow each experiment into a chain of strips, hopping to an
            // adjacent unclaimed face whenever the current strip runs out.
            for experiment in &mut experiments {
                let experiment_id = experiment[0].experiment_id;
                experiment[0].build(self.mesh, self.warnings);
                loop {
                    let start = match self.find_traversal(&experiment[experiment.len() - 1]) {
                        Some(start) => start,
                        None => break,
                    };
                    let mut strip = Strip::new(start, self.next_strip_id, experiment_id);
                    self.next_strip_id += 1;
                    strip.build(self.mesh, self.warnings);
                    experiment.push(strip);
                }
            }

            // Keep the chain with the best average strip size; ties go to the
            // first one found.
            let mut best_index = 0;
            let mut best_value = 0.0;
            for (i, experiment) in experiments.iter().enumerate() {
                let value = avg_strip_size(experiment);
                if value > best_value {
                    best_value = value;
                    best_index = i;
                }
            }

            if experiments.is_empty() {
                continue;
            }

            strip_log!(
                self,
                "round {}: committing {} strips (avg size {})",
                round,
                experiments[best_index].len(),
                best_value
            );

            // The winner's faces become permanently claimed; the losers are
            // dropped wholesale, their filler faces with them.
            let winner = experiments.swap_remove(best_index);
            self.commit(&mut all_strips, winner);
        }

        all_strips
    }

    fn new_strip(&mut self, face: FaceId, edge: EdgeId, to_v1: bool) -> Strip {
        let strip = Strip::new(
            StartInfo {
                start_face: face,
                start_edge: edge,
                to_v1,
            },
            self.next_strip_id,
            self.next_experiment_id,
        );
        self.next_strip_id += 1;
        self.next_experiment_id += 1;

        strip
    }

    /// Picks the face to seed the next batch of experiments with.
    ///
    /// The first time around this looks for a mesh boundary; afterwards it
    /// hops to pseudo-random spots of the face table so that different areas
    /// of the mesh get covered. Small patches left behind simply end up in
    /// the leftover triangle list.
    fn find_good_reset_point(&mut self) -> FaceId {
        let num_faces = self.mesh.faces.len();
        if num_faces == 0 {
            return FaceId::INVALID;
        }

        let start = if self.first_reset_point {
            self.first_reset_point = false;
            self.find_start_point()
        } else {
            None
        };
        let start = match start {
            Some(index) => index,
            None => ((num_faces - 1) as f32 * self.mesh_jump) as usize,
        };

        let mut result = FaceId::INVALID;
        let mut i = start;
        loop {
            if self.mesh.faces[i].strip_id < 0 {
                result = FaceId(i as u32);
                break;
            }
            i += 1;
            if i >= num_faces {
                i = 0;
            }
            if i == start {
                break;
            }
        }

        self.mesh_jump += 0.1;
        if self.mesh_jump > 1.0 {
            self.mesh_jump = 0.05;
        }

        result
    }

    /// Looks for a face on the boundary of the mesh, i.e. with as few
    /// neighbors as possible. Returns `None` when every face has three.
    fn find_start_point(&self) -> Option<usize> {
        let mut best_ctr = -1;
        let mut best_index = 0;
        for (i, face) in self.mesh.faces.iter().enumerate() {
            let ctr = 3 - self.mesh.num_neighbors(face.v, FaceId(i as u32)) as i32;
            if ctr > best_ctr {
                best_ctr = ctr;
                best_index = i;
            }
        }

        if best_ctr == 0 {
            None
        } else {
            Some(best_index)
        }
    }

    /// Finds an unclaimed face to continue from once `strip` is done: walk
    /// the edges around the strip's exit vertex for one that joins a face of
    /// the strip with a free one.
    fn find_traversal(&self, strip: &Strip) -> Option<StartInfo> {
        let edge = self.mesh.edge(strip.start.start_edge);
        let v = if strip.start.to_v1 { edge.v1 } else { edge.v0 };

        let mut untouched = FaceId::INVALID;
        let mut edge_iter = self.mesh.edge_heads[v as usize];
        while edge_iter.is_valid() {
            let edge = self.mesh.edge(edge_iter);
            let (face0, face1) = (edge.face0, edge.face1);
            if face0.is_valid()
                && face1.is_valid()
                && strip.is_in_strip(self.mesh, face0)
                && !strip.is_marked(self.mesh, face1)
            {
                untouched = face1;
                break;
            }
            if face0.is_valid()
                && face1.is_valid()
                && strip.is_in_strip(self.mesh, face1)
                && !strip.is_marked(self.mesh, face0)
            {
                untouched = face0;
                break;
            }

            edge_iter = if edge.v0 == v {
                edge.next_v0
            } else {
                edge.next_v1
            };
        }

        if !untouched.is_valid() {
            return None;
        }

        // Aim the new strip's first directed edge out of the exit vertex; a
        // face already adjacent to the strip needs the opposite orientation.
        let edge = self.mesh.edge(edge_iter);
        let to_v1 = if strip.shares_edge(self.mesh, untouched) {
            edge.v0 == v
        } else {
            edge.v1 == v
        };

        Some(StartInfo {
            start_face: untouched,
            start_edge: edge_iter,
            to_v1,
        })
    }

    fn commit(&mut self, all_strips: &mut Vec<Strip>, experiment: Vec<Strip>) {
        for mut strip in experiment {
            strip.experiment_id = -1;
            for i in 0..strip.faces.len() {
                if let StripFace::Mesh(face) = strip.faces[i] {
                    strip.mark(self.mesh, face);
                }
            }
            all_strips.push(strip);
        }
    }
}

/// Average number of real faces per strip of an experiment.
fn avg_strip_size(strips: &[Strip]) -> f32 {
    let mut size_accum = 0;
    for strip in strips {
        size_accum += strip.faces.len() as i64 - i64::from(strip.num_degenerates);
    }

    size_accum as f32 / strips.len() as f32
}
