//! Second pass over the committed strips: cut them into cache sized pieces,
//! demote the pieces that are too short to be worth a strip, and reorder
//! what remains for simulated cache reuse.

use crate::cache::VertexCache;
use crate::emit::{canonical_first_face, is_cw};
use crate::mesh::{Connectivity, FaceId};
use crate::strip::{Strip, StripFace};

use alloc::vec::Vec;

/// Cuts every committed strip into pieces of at most `threshold` real faces.
///
/// Degenerate fillers survive the cut except on piece boundaries, where they
/// carry no information: a piece neither starts nor ends with a filler. A
/// tail of one to three real faces is merged into the preceding piece
/// instead of becoming a fragment of its own.
pub(crate) fn split_strips(all_strips: Vec<Strip>, threshold: usize) -> Vec<Strip> {
    let mut pieces = Vec::with_capacity(all_strips.len());
    for strip in &all_strips {
        let real_count = strip
            .faces
            .iter()
            .filter(|face| !face.is_filler())
            .count();
        if real_count <= threshold {
            let mut piece = Strip::detached();
            piece.faces.extend_from_slice(&strip.faces);
            piece.num_degenerates = strip.num_degenerates;
            pieces.push(piece);
            continue;
        }

        let num_times = real_count / threshold;
        let num_leftover = real_count % threshold;
        let merge_tail = num_leftover > 0 && num_leftover < 4;

        let mut cursor = 0;
        for j in 0..num_times {
            let mut quota = threshold;
            if merge_tail && j + 1 == num_times {
                quota += num_leftover;
            }
            pieces.push(take_piece(&strip.faces, &mut cursor, quota));
        }
        if num_leftover > 0 && !merge_tail {
            pieces.push(take_piece(&strip.faces, &mut cursor, num_leftover));
        }
    }

    pieces
}

/// Takes faces from `faces[*cursor..]` until `quota` real faces are
/// collected. Leading fillers are dropped; so are trailing ones, by virtue
/// of stopping right after the last real face.
fn take_piece(faces: &[StripFace], cursor: &mut usize, quota: usize) -> Strip {
    let mut piece = Strip::detached();
    let mut real = 0;
    while real < quota {
        let face = faces[*cursor];
        *cursor += 1;
        if face.is_filler() {
            if !piece.faces.is_empty() {
                piece.faces.push(face);
                piece.num_degenerates += 1;
            }
        } else {
            piece.faces.push(face);
            real += 1;
        }
    }

    piece
}

/// Demotes pieces shorter than `min_strip_length` to the leftover triangle
/// list, then orders that list so each triangle scores as many cache hits as
/// possible against the triangles before it.
pub(crate) fn remove_small_strips(
    mesh: &Connectivity,
    pieces: Vec<Strip>,
    min_strip_length: usize,
    cache_size: usize,
) -> (Vec<Strip>, Vec<FaceId>) {
    let mut big = Vec::with_capacity(pieces.len());
    let mut spilled = Vec::new();
    for piece in pieces {
        if piece.faces.len() < min_strip_length {
            for &face in &piece.faces {
                // Fillers are meaningless outside a strip; only the real
                // faces move to the list.
                if let StripFace::Mesh(f) = face {
                    spilled.push(f);
                }
            }
        } else {
            big.push(piece);
        }
    }

    if spilled.is_empty() {
        return (big, spilled);
    }

    let mut cache = VertexCache::new(cache_size);
    let mut visited = Vec::new();
    visited.resize(spilled.len(), false);
    let mut ordered = Vec::with_capacity(spilled.len());
    loop {
        let mut best_hits = -1;
        let mut best_index = 0;
        for (i, &face) in spilled.iter().enumerate() {
            if visited[i] {
                continue;
            }
            let hits = calc_num_hits_face(&cache, mesh.face(face).v) as i32;
            if hits > best_hits {
                best_hits = hits;
                best_index = i;
            }
        }
        if best_hits < 0 {
            break;
        }

        visited[best_index] = true;
        update_cache_face(&mut cache, mesh.face(spilled[best_index]).v);
        ordered.push(spilled[best_index]);
    }

    (big, ordered)
}

/// Greedily reorders the pieces so that each one reuses as much of the
/// simulated cache as possible, starting from the most isolated piece.
///
/// Ties go to a piece whose first triangle already matches the winding
/// polarity the strip sequence wants next, saving a flip at emission.
pub(crate) fn reorder_for_cache(
    mesh: &Connectivity,
    pieces: Vec<Strip>,
    cache_size: usize,
) -> Vec<Strip> {
    if pieces.is_empty() {
        return pieces;
    }

    let mut pieces = pieces;
    let mut cache = VertexCache::new(cache_size);
    let mut order = Vec::with_capacity(pieces.len());

    let mut min_cost = f32::MAX;
    let mut first_index = 0;
    for (i, piece) in pieces.iter().enumerate() {
        let mut num_neighbors = 0;
        for &face in &piece.faces {
            let (v, id) = face_key(mesh, face);
            num_neighbors += mesh.num_neighbors(v, id);
        }
        let cost = num_neighbors as f32 / piece.faces.len() as f32;
        if cost < min_cost {
            min_cost = cost;
            first_index = i;
        }
    }

    update_cache_strip(&mut cache, mesh, &pieces[first_index]);
    pieces[first_index].visited = true;
    order.push(first_index);
    let mut wants_cw = pieces[first_index].faces.len() % 2 == 0;

    loop {
        let mut best_hits = -1.0;
        let mut best_index = 0;
        for (i, piece) in pieces.iter().enumerate() {
            if piece.visited {
                continue;
            }
            let hits = calc_num_hits_strip(&cache, mesh, piece);
            if hits > best_hits {
                best_hits = hits;
                best_index = i;
            } else if hits >= best_hits {
                let first = canonical_first_face(mesh, piece);
                let face0 = piece.faces[0].vertices(mesh);
                if wants_cw == is_cw(face0, first[0], first[1]) {
                    best_index = i;
                }
            }
        }
        if best_hits < 0.0 {
            break;
        }

        pieces[best_index].visited = true;
        update_cache_strip(&mut cache, mesh, &pieces[best_index]);
        order.push(best_index);
        if pieces[best_index].faces.len() % 2 != 0 {
            wants_cw = !wants_cw;
        }
    }

    let mut slots: Vec<Option<Strip>> = pieces.into_iter().map(Some).collect();
    order.iter().filter_map(|&i| slots[i].take()).collect()
}

fn face_key(mesh: &Connectivity, face: StripFace) -> ([u32; 3], FaceId) {
    match face {
        StripFace::Mesh(id) => (mesh.face(id).v, id),
        StripFace::Filler { v0, v1 } => ([v0, v1, v0], FaceId::INVALID),
    }
}

fn calc_num_hits_face(cache: &VertexCache, v: [u32; 3]) -> u32 {
    let mut hits = 0;
    for i in 0..3 {
        if cache.contains(v[i]) {
            hits += 1;
        }
    }

    hits
}

/// Average number of cache hits per face of the strip.
fn calc_num_hits_strip(cache: &VertexCache, mesh: &Connectivity, strip: &Strip) -> f32 {
    let mut hits = 0;
    for &face in &strip.faces {
        hits += calc_num_hits_face(cache, face.vertices(mesh));
    }

    hits as f32 / strip.faces.len() as f32
}

fn update_cache_face(cache: &mut VertexCache, v: [u32; 3]) {
    for i in 0..3 {
        if !cache.contains(v[i]) {
            cache.push_front(v[i]);
        }
    }
}

fn update_cache_strip(cache: &mut VertexCache, mesh: &Connectivity, strip: &Strip) {
    for &face in &strip.faces {
        update_cache_face(cache, face.vertices(mesh));
    }
}
