#![deny(bare_trait_objects)]
#![deny(unconditional_recursion)]
#![allow(clippy::too_many_arguments)]
#![no_std]

//! Generation of cache friendly triangle strips from indexed triangle meshes.
//!
//! ## Overview
//!
//! GPUs keep a small cache of post-transform vertices, so index buffers that
//! reference a vertex again shortly after its first use are cheaper to render.
//! This crate takes a plain triangle list (three indices per triangle) and
//! turns it into a set of triangle strips tuned for a post-transform cache of
//! a configurable size, plus a triangle list holding whatever did not strip
//! well.
//!
//! The most interesting types of this crate are:
//!
//! * [Stripifier](struct.Stripifier.html) - The strip generator itself.
//! * [StripOptions](struct.StripOptions.html) - Parameters for the generator.
//! * [PrimitiveGroup](struct.PrimitiveGroup.html) - A strip or list of the
//!   output.
//!
//! ## The stripification pipeline
//!
//! Stripification happens in four stages, each feeding the next:
//!
//! * Connectivity: the index buffer is turned into face and edge tables so
//!   that the two triangles incident to any edge can be found in constant
//!   time.
//! * Strip discovery: starting from heuristically chosen reset points, several
//!   speculative strips are grown per seed face (one per directed edge), the
//!   best scoring batch is committed and the rest discarded.
//! * Cache scheduling: committed strips are cut into cache sized pieces,
//!   pieces below the configured minimum length fall back to a triangle list,
//!   and the remaining pieces are reordered to maximize simulated cache hits.
//! * Emission: the ordered pieces are linearized into index streams, stitching
//!   strips together with degenerate triangles when requested.
//!
//! The heuristic favors long strips with good cache reuse; it does not attempt
//! to compute an optimal stripification.
//!
//! ## Examples
//!
//! ```
//! use tri_stripper::{generate_strips, PrimitiveKind, StripOptions};
//!
//! // A quad made of two triangles sharing the edge (1, 2).
//! let indices = [0u32, 1, 2, 2, 1, 3];
//!
//! let groups = generate_strips(&indices, &StripOptions::DEFAULT).unwrap();
//!
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].kind, PrimitiveKind::TriangleStrip);
//! assert_eq!(groups[0].indices, vec![0, 1, 2, 3]);
//! ```
//!
//! Vertex buffers are not this crate's concern: the caller is expected to
//! render the emitted groups against the same vertex buffer the input indices
//! referred to, or to renumber them with
//! [remap_indices](fn.remap_indices.html) first.

#![allow(dead_code)]

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

#[cfg(feature = "serialization")]
#[macro_use]
pub extern crate serde;

#[cfg(all(debug_assertions, feature = "std"))]
macro_rules! strip_log {
    ($obj:ident, $fmt:expr) => (
        if $obj.log {
            std::println!($fmt);
        }
    );
    ($obj:ident, $fmt:expr, $($arg:tt)*) => (
        if $obj.log {
            std::println!($fmt, $($arg)*);
        }
    );
}

#[cfg(not(all(debug_assertions, feature = "std")))]
macro_rules! strip_log {
    ($obj:ident, $fmt:expr) => {};
    ($obj:ident, $fmt:expr, $($arg:tt)*) => {};
}

mod cache;
mod emit;
mod error;
mod experiments;
mod mesh;
mod optimize;
mod remap;
mod strip;
mod stripifier;

#[cfg(test)]
mod stripifier_tests;

#[doc(inline)]
pub use crate::error::*;

#[doc(inline)]
pub use crate::remap::remap_indices;

#[doc(inline)]
pub use crate::stripifier::{generate_strips, Stripifier};

use alloc::vec::Vec;

/// The type of primitive held by a [PrimitiveGroup](struct.PrimitiveGroup.html).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum PrimitiveKind {
    /// Independent triangles, three indices each.
    TriangleList,
    /// A triangle strip: after the first triangle, every index forms a new
    /// triangle with the two indices preceding it, with alternating winding.
    TriangleStrip,
}

/// A contiguous run of output indices sharing one primitive type.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct PrimitiveGroup {
    pub kind: PrimitiveKind,
    pub indices: Vec<u32>,
}

impl PrimitiveGroup {
    /// Returns an iterator over the non-degenerate triangles of this group.
    ///
    /// Strips are expanded using the standard strip rule: the triangle at
    /// position `i` is wound `(a, b, c)` for even `i` and `(b, a, c)` for odd
    /// `i`. Triangles with repeated indices (the degenerate stitches) are
    /// skipped without affecting the parity of the ones that follow.
    pub fn triangles(&self) -> Triangles {
        Triangles {
            kind: self.kind,
            indices: &self.indices,
            cursor: 0,
        }
    }
}

/// Iterator over the non-degenerate triangles of a [PrimitiveGroup](struct.PrimitiveGroup.html).
pub struct Triangles<'l> {
    kind: PrimitiveKind,
    indices: &'l [u32],
    cursor: usize,
}

impl<'l> Iterator for Triangles<'l> {
    type Item = [u32; 3];

    fn next(&mut self) -> Option<[u32; 3]> {
        match self.kind {
            PrimitiveKind::TriangleList => {
                while self.cursor + 3 <= self.indices.len() {
                    let i = self.cursor;
                    self.cursor += 3;
                    let tri = [self.indices[i], self.indices[i + 1], self.indices[i + 2]];
                    if tri[0] != tri[1] && tri[1] != tri[2] && tri[2] != tri[0] {
                        return Some(tri);
                    }
                }

                None
            }
            PrimitiveKind::TriangleStrip => {
                while self.cursor + 3 <= self.indices.len() {
                    let i = self.cursor;
                    self.cursor += 1;
                    let (a, b, c) = (self.indices[i], self.indices[i + 1], self.indices[i + 2]);
                    if a == b || b == c || c == a {
                        continue;
                    }

                    return Some(if i % 2 == 0 { [a, b, c] } else { [b, a, c] });
                }

                None
            }
        }
    }
}

/// Parameters for the stripifier.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct StripOptions {
    /// Number of entries of the post-transform vertex cache to optimize for.
    ///
    /// The simulation internally keeps a few entries of headroom, so the
    /// value should be the full hardware cache size.
    ///
    /// Default value: `StripOptions::DEFAULT_CACHE_SIZE`.
    pub cache_size: u32,

    /// Whether to stitch all strips into a single strip, bridging them with
    /// degenerate triangles.
    ///
    /// Default value: `true`.
    pub stitch_strips: bool,

    /// Strips with fewer faces than this are emitted as part of the leftover
    /// triangle list instead.
    ///
    /// Default value: `0` (keep everything in strips).
    pub min_strip_length: u32,

    /// Emit a single triangle list and no strips at all.
    ///
    /// Default value: `false`.
    pub lists_only: bool,
}

impl StripOptions {
    /// Default post-transform cache size, a safe value for early cache
    /// equipped GPUs. Newer hardware tends to have larger caches.
    pub const DEFAULT_CACHE_SIZE: u32 = 16;

    pub const DEFAULT: Self = StripOptions {
        cache_size: Self::DEFAULT_CACHE_SIZE,
        stitch_strips: true,
        min_strip_length: 0,
        lists_only: false,
    };

    #[inline]
    pub fn cache_size(cache_size: u32) -> Self {
        Self::DEFAULT.with_cache_size(cache_size)
    }

    #[inline]
    pub const fn with_cache_size(mut self, cache_size: u32) -> Self {
        self.cache_size = cache_size;
        self
    }

    #[inline]
    pub const fn with_stitch_strips(mut self, stitch_strips: bool) -> Self {
        self.stitch_strips = stitch_strips;
        self
    }

    #[inline]
    pub const fn with_min_strip_length(mut self, min_strip_length: u32) -> Self {
        self.min_strip_length = min_strip_length;
        self
    }

    #[inline]
    pub const fn with_lists_only(mut self, lists_only: bool) -> Self {
        self.lists_only = lists_only;
        self
    }
}

impl Default for StripOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[test]
fn default_options() {
    let options = StripOptions::default();

    assert_eq!(options.cache_size, 16);
    assert_eq!(options.stitch_strips, true);
    assert_eq!(options.min_strip_length, 0);
    assert_eq!(options.lists_only, false);
}

#[test]
fn option_builders() {
    let options = StripOptions::cache_size(24)
        .with_stitch_strips(false)
        .with_min_strip_length(2);

    assert_eq!(options.cache_size, 24);
    assert_eq!(options.stitch_strips, false);
    assert_eq!(options.min_strip_length, 2);
    assert_eq!(options.lists_only, false);
}

#[test]
fn strip_triangle_iterator() {
    let group = PrimitiveGroup {
        kind: PrimitiveKind::TriangleStrip,
        indices: alloc::vec![0, 1, 2, 2, 3, 3, 4, 5],
    };

    // The second triangle sits at an odd position, so the strip rule flips it.
    let triangles: Vec<[u32; 3]> = group.triangles().collect();
    assert_eq!(triangles, alloc::vec![[0, 1, 2], [4, 3, 5]]);
}
