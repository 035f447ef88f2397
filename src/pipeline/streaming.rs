//! Piece-based streaming over structured outputs.

use std::sync::Arc;

use crate::dataset::{DataObject, ImageData};
use crate::foundation::core::Extent;
use crate::foundation::error::{VoxflowError, VoxflowResult};
use crate::pipeline::algorithm::as_image;
use crate::pipeline::executive::UpdateRequest;
use crate::pipeline::keys::WHOLE_EXTENT;
use crate::pipeline::node::Node;

/// Splits structured extents into pieces.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExtentTranslator;

impl ExtentTranslator {
    /// Extent of `piece` out of `pieces` over `whole`, grown by `ghost_levels` and clamped
    /// to `whole`. Pieces without points come back empty.
    pub fn piece_extent(whole: Extent, piece: usize, pieces: usize, ghost_levels: i32) -> Extent {
        grown(Self::split(whole, piece, pieces), ghost_levels, whole)
    }

    /// Point-disjoint piece of `base` without ghost layers.
    ///
    /// Halves the piece count at each level and cuts the longest axis proportionally, so
    /// the pieces tile `base` exactly.
    pub fn split(base: Extent, piece: usize, pieces: usize) -> Extent {
        if base.is_empty() || piece >= pieces.max(1) {
            return Extent::EMPTY;
        }
        let mut ext = base;
        let mut piece = piece;
        let mut n = pieces.max(1);
        while n > 1 {
            let dims = ext.dimensions();
            let axis = (0..3).max_by_key(|&a| (dims[a], std::cmp::Reverse(a))).unwrap_or(0);
            let len = dims[axis];
            if len < 2 {
                return if piece == 0 { ext } else { Extent::EMPTY };
            }
            let n1 = n / 2;
            let cut = ((len * n1) / n) as i32;
            let (lo, _) = ext.axis(axis);
            if piece < n1 {
                ext.0[2 * axis + 1] = lo + cut - 1;
                n = n1;
            } else {
                ext.0[2 * axis] = lo + cut;
                piece -= n1;
                n -= n1;
            }
            if ext.is_empty() {
                return Extent::EMPTY;
            }
        }
        ext
    }
}

fn grown(ext: Extent, ghost_levels: i32, clip: Extent) -> Extent {
    if ext.is_empty() {
        return Extent::EMPTY;
    }
    ext.grow_within(ghost_levels.max(0), clip)
}

/// One produced piece.
#[derive(Clone, Debug)]
pub struct StreamedPiece {
    /// Piece number.
    pub piece: usize,
    /// Extent produced, ghost layers included.
    pub extent: Extent,
    /// Extent this piece owns (no ghosts).
    pub owned_extent: Extent,
    /// Produced data.
    pub data: Arc<DataObject>,
}

impl StreamedPiece {
    /// The piece's image with ghost layers removed.
    pub fn trimmed(&self) -> VoxflowResult<ImageData> {
        let img = as_image(&self.data)?;
        img.crop(self.owned_extent.intersect(img.extent()))
    }
}

/// Run the three-pass protocol once per piece of `node:port`.
pub(crate) fn update_pieces(
    node: &Arc<Node>,
    port: usize,
    pieces: usize,
    ghost_levels: usize,
) -> VoxflowResult<Vec<StreamedPiece>> {
    if pieces == 0 {
        return Err(VoxflowError::bad_input("piece count must be at least 1"));
    }
    let info = node.update_information()?;
    let whole = info
        .get(port)
        .and_then(|i| i.get(&WHOLE_EXTENT))
        .ok_or_else(|| {
            VoxflowError::bad_input(format!(
                "'{}' output {port} has no whole extent to stream",
                node.name()
            ))
        })?;
    let ghost = i32::try_from(ghost_levels).unwrap_or(i32::MAX);

    let mut out = Vec::with_capacity(pieces);
    for piece in 0..pieces {
        let req = UpdateRequest::whole()
            .with_piece(piece, pieces)
            .with_ghost_levels(ghost_levels);
        let data = node.update_port(port, &req)?;
        tracing::debug!(algorithm = node.name(), piece, pieces, "streamed piece");
        out.push(StreamedPiece {
            piece,
            extent: ExtentTranslator::piece_extent(whole, piece, pieces, ghost),
            owned_extent: ExtentTranslator::split(whole, piece, pieces),
            data,
        });
    }
    Ok(out)
}

/// Paste the trimmed pieces into one image covering their union.
pub fn assemble_image(pieces: &[StreamedPiece]) -> VoxflowResult<ImageData> {
    let first = pieces
        .first()
        .ok_or_else(|| VoxflowError::bad_input("no pieces to assemble"))?;
    let geometry = as_image(&first.data)?;
    let extent = pieces
        .iter()
        .fold(Extent::EMPTY, |acc, p| acc.union(p.owned_extent));
    let mut out = ImageData::new(extent).with_geometry(geometry.origin(), geometry.spacing());
    for p in pieces {
        out.paste(&p.trimmed()?)?;
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/streaming.rs"]
mod tests;
