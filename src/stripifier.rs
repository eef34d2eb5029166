//! The stripifier itself, tying connectivity analysis, strip discovery,
//! cache scheduling and emission together.

use crate::emit::{create_strip_stream, STRIP_SEPARATOR};
use crate::error::{StripError, StripResult, WarningSink};
use crate::experiments::ExperimentDriver;
use crate::mesh::Connectivity;
use crate::optimize::{remove_small_strips, reorder_for_cache, split_strips};
use crate::strip::StripFace;
use crate::{PrimitiveGroup, PrimitiveKind, StripOptions};

use alloc::boxed::Box;
use alloc::vec::Vec;

/// Headroom subtracted from the declared cache size before simulation,
/// accounting for the eviction behavior observed on real hardware.
const CACHE_INEFFICIENCY: u32 = 6;

/// Computes the strips for an index buffer in one go.
///
/// This is a shorthand for creating a [Stripifier](struct.Stripifier.html)
/// and calling [stripify](struct.Stripifier.html#method.stripify) on it.
pub fn generate_strips(indices: &[u32], options: &StripOptions) -> StripResult {
    Stripifier::new().stripify(indices, options)
}

/// Turns indexed triangle lists into cache friendly triangle strips.
///
/// # Examples
///
/// ```
/// use tri_stripper::{PrimitiveKind, StripOptions, Stripifier};
///
/// let indices = [0u32, 1, 2, 2, 1, 3, 2, 3, 4, 4, 3, 5];
///
/// let mut stripifier = Stripifier::new();
/// let groups = stripifier
///     .stripify(&indices, &StripOptions::DEFAULT)
///     .unwrap();
///
/// assert_eq!(groups.len(), 1);
/// assert_eq!(groups[0].kind, PrimitiveKind::TriangleStrip);
/// assert_eq!(groups[0].indices, vec![0, 1, 2, 3, 4, 5]);
/// ```
pub struct Stripifier {
    log: bool,
    warning_handler: Option<Box<dyn WarningSink>>,
}

impl Default for Stripifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Stripifier {
    /// Constructor.
    pub fn new() -> Self {
        #[cfg(all(debug_assertions, feature = "std"))]
        let log = std::env::var("TRI_STRIPPER_FORCE_LOGGING").is_ok();
        #[cfg(not(all(debug_assertions, feature = "std")))]
        let log = false;

        Stripifier {
            log,
            warning_handler: None,
        }
    }

    /// Enable or disable printing debug messages (debug builds only).
    pub fn set_logging(&mut self, log: bool) {
        self.log = log;
    }

    /// Routes the [Warning](enum.Warning.html)s emitted while analyzing the
    /// input geometry to `handler`. Without a handler they are discarded.
    pub fn set_warning_handler(&mut self, handler: Box<dyn WarningSink>) {
        self.warning_handler = Some(handler);
    }

    pub fn clear_warning_handler(&mut self) {
        self.warning_handler = None;
    }

    /// Computes a set of primitive groups covering every (non-degenerate)
    /// triangle of `indices`, three indices per triangle.
    ///
    /// Depending on the options the result is one stitched strip, one strip
    /// group per generated strip, or a single triangle list; strips may be
    /// followed by a triangle list holding whatever did not strip well. An
    /// empty input produces no groups. See
    /// [StripOptions](struct.StripOptions.html).
    pub fn stripify(&mut self, indices: &[u32], options: &StripOptions) -> StripResult {
        if indices.is_empty() {
            return Ok(Vec::new());
        }
        if indices.len() % 3 != 0 {
            return Err(StripError::IndexCountNotMultipleOfThree);
        }

        let mut max_index = 0;
        for &index in indices {
            if index == u32::MAX {
                return Err(StripError::ReservedIndex);
            }
            if index > max_index {
                max_index = index;
            }
        }

        let cache_size = u32::max(1, options.cache_size.saturating_sub(CACHE_INEFFICIENCY));
        let cache_size = cache_size as usize;
        let min_strip_length = options.min_strip_length as usize;

        let mut discard = ();
        let warnings: &mut dyn WarningSink = match self.warning_handler.as_mut() {
            Some(handler) => handler.as_mut(),
            None => &mut discard,
        };

        let mut mesh = Connectivity::new(indices, max_index, warnings);

        let all_strips = ExperimentDriver::new(&mut mesh, warnings, self.log).find_all_strips();

        let pieces = split_strips(all_strips, cache_size);
        let (pieces, leftover) = remove_small_strips(&mesh, pieces, min_strip_length, cache_size);
        let pieces = reorder_for_cache(&mesh, pieces, cache_size);

        strip_log!(
            self,
            "stripify: {} faces -> {} strips + {} leftover triangles",
            mesh.faces.len(),
            pieces.len(),
            leftover.len()
        );

        if options.lists_only {
            // Flatten everything into one list; fillers are of no use there.
            let mut list = Vec::new();
            for piece in &pieces {
                for &face in &piece.faces {
                    if let StripFace::Mesh(f) = face {
                        list.extend_from_slice(&mesh.face(f).v);
                    }
                }
            }
            for &face in &leftover {
                list.extend_from_slice(&mesh.face(face).v);
            }

            return Ok(alloc::vec![PrimitiveGroup {
                kind: PrimitiveKind::TriangleList,
                indices: list,
            }]);
        }

        let mut groups = Vec::new();
        if !pieces.is_empty() {
            let stream = create_strip_stream(&mesh, &pieces, options.stitch_strips);
            if options.stitch_strips {
                groups.push(PrimitiveGroup {
                    kind: PrimitiveKind::TriangleStrip,
                    indices: stream,
                });
            } else {
                for strip in stream.split(|&index| index == STRIP_SEPARATOR) {
                    groups.push(PrimitiveGroup {
                        kind: PrimitiveKind::TriangleStrip,
                        indices: strip.to_vec(),
                    });
                }
            }
        }

        if !leftover.is_empty() {
            let mut list = Vec::with_capacity(leftover.len() * 3);
            for &face in &leftover {
                list.extend_from_slice(&mesh.face(face).v);
            }
            groups.push(PrimitiveGroup {
                kind: PrimitiveKind::TriangleList,
                indices: list,
            });
        }

        Ok(groups)
    }
}
