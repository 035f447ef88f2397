use std::sync::Arc;

use crate::array::DataArray;
use crate::dataset::field_data::FieldData;
use crate::foundation::core::{Extent, TimeStamp};
use crate::foundation::error::{VoxflowError, VoxflowResult};

/// Regular grid: origin, spacing and an inclusive extent.
#[derive(Clone, Debug)]
pub struct ImageData {
    extent: Extent,
    origin: [f64; 3],
    spacing: [f64; 3],
    point_data: FieldData,
    cell_data: FieldData,
    mtime: TimeStamp,
}

impl ImageData {
    /// Image covering `extent` with origin 0 and unit spacing.
    pub fn new(extent: Extent) -> Self {
        Self {
            extent,
            origin: [0.0; 3],
            spacing: [1.0; 3],
            point_data: FieldData::new(extent.num_points()),
            cell_data: FieldData::new(extent.num_cells()),
            mtime: TimeStamp::now(),
        }
    }

    /// Builder-style geometry.
    pub fn with_geometry(mut self, origin: [f64; 3], spacing: [f64; 3]) -> Self {
        self.origin = origin;
        self.spacing = spacing;
        self
    }

    /// Index extent.
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Change the extent; attribute arrays are dropped when the counts change.
    pub fn set_extent(&mut self, extent: Extent) {
        self.extent = extent;
        self.point_data.set_tuples(extent.num_points());
        self.cell_data.set_tuples(extent.num_cells());
        self.mtime.modified();
    }

    /// World position of index `(0, 0, 0)`.
    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    /// Set the origin.
    pub fn set_origin(&mut self, origin: [f64; 3]) {
        self.origin = origin;
        self.mtime.modified();
    }

    /// Distance between neighbouring points along each axis.
    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    /// Set the spacing.
    pub fn set_spacing(&mut self, spacing: [f64; 3]) {
        self.spacing = spacing;
        self.mtime.modified();
    }

    /// Points per axis.
    pub fn dimensions(&self) -> [usize; 3] {
        self.extent.dimensions()
    }

    /// Number of points.
    pub fn number_of_points(&self) -> usize {
        self.extent.num_points()
    }

    /// Number of cells.
    pub fn number_of_cells(&self) -> usize {
        self.extent.num_cells()
    }

    /// World position of structured index `ijk`.
    pub fn point(&self, ijk: [i32; 3]) -> [f64; 3] {
        std::array::from_fn(|a| self.origin[a] + f64::from(ijk[a]) * self.spacing[a])
    }

    /// World bounds `[xmin, xmax, ymin, ymax, zmin, zmax]` (handles negative spacing).
    pub fn bounds(&self) -> [f64; 6] {
        let mut b = [0.0; 6];
        for a in 0..3 {
            let (lo, hi) = self.extent.axis(a);
            let p0 = self.origin[a] + f64::from(lo) * self.spacing[a];
            let p1 = self.origin[a] + f64::from(hi) * self.spacing[a];
            b[2 * a] = p0.min(p1);
            b[2 * a + 1] = p0.max(p1);
        }
        b
    }

    /// Point attributes.
    pub fn point_data(&self) -> &FieldData {
        &self.point_data
    }

    /// Mutable point attributes.
    pub fn point_data_mut(&mut self) -> &mut FieldData {
        self.mtime.modified();
        &mut self.point_data
    }

    /// Cell attributes.
    pub fn cell_data(&self) -> &FieldData {
        &self.cell_data
    }

    /// Mutable cell attributes.
    pub fn cell_data_mut(&mut self) -> &mut FieldData {
        self.mtime.modified();
        &mut self.cell_data
    }

    /// Active point scalars.
    pub fn scalars(&self) -> Option<&Arc<dyn DataArray>> {
        self.point_data.active_scalars()
    }

    /// Insert a point array and make it the active scalars.
    pub fn set_scalars(&mut self, array: Arc<dyn DataArray>) -> VoxflowResult<()> {
        let name = array.name().to_owned();
        self.point_data_mut().insert(array)?;
        self.point_data.set_active_scalars(&name)
    }

    /// Latest of the image's own stamp and its arrays' stamps.
    pub fn mtime(&self) -> u64 {
        self.mtime
            .get()
            .max(self.point_data.mtime())
            .max(self.cell_data.mtime())
    }

    /// Same geometry and array layout with no tuples.
    pub fn clone_empty(&self) -> VoxflowResult<Self> {
        let mut out = Self::new(Extent::EMPTY).with_geometry(self.origin, self.spacing);
        out.point_data = self.point_data.empty_like(0)?;
        out.cell_data = self.cell_data.empty_like(0)?;
        Ok(out)
    }

    /// Sub-image covering `extent`, which must lie inside this image's extent.
    ///
    /// Used to trim ghost layers and to hand out the requested sub-extent of a larger
    /// image. An empty `extent` yields an image with zero-tuple arrays.
    pub fn crop(&self, extent: Extent) -> VoxflowResult<Self> {
        if extent.is_empty() {
            let mut out = self.clone_empty()?;
            out.extent = extent;
            return Ok(out);
        }
        if !self.extent.contains(extent) {
            return Err(VoxflowError::bad_input(format!(
                "crop extent {extent} is outside image extent {}",
                self.extent
            )));
        }
        if extent == self.extent {
            return Ok(self.clone());
        }

        let points: Vec<usize> = (0..extent.num_points())
            .map(|i| self.extent.point_index(extent.point_ijk(i)))
            .collect();

        let parent_cells = self.extent.cell_extent();
        let sub_cells = extent.cell_extent();
        let cells: Vec<usize> = (0..sub_cells.num_points())
            .map(|i| {
                let ijk = sub_cells.point_ijk(i);
                let clamped = std::array::from_fn(|a| {
                    let (lo, hi) = parent_cells.axis(a);
                    ijk[a].clamp(lo, hi)
                });
                parent_cells.point_index(clamped)
            })
            .collect();

        Ok(Self {
            extent,
            origin: self.origin,
            spacing: self.spacing,
            point_data: self.point_data.gather(&points)?,
            cell_data: self.cell_data.gather(&cells)?,
            mtime: TimeStamp::now(),
        })
    }

    /// Copy the point arrays of `piece` (matched by name) into the overlapping region.
    pub fn paste(&mut self, piece: &ImageData) -> VoxflowResult<()> {
        let pe = piece.extent();
        if pe.is_empty() {
            return Ok(());
        }
        if !self.extent.contains(pe) {
            return Err(VoxflowError::bad_input(format!(
                "piece extent {pe} is outside image extent {}",
                self.extent
            )));
        }
        let pairs: Vec<(usize, usize)> = (0..pe.num_points())
            .map(|i| (self.extent.point_index(pe.point_ijk(i)), i))
            .collect();
        for (name, src) in piece.point_data().iter() {
            let src = Arc::clone(src);
            match self.point_data.array_mut(name) {
                Some(dst) => dst.copy_tuples_from(src.as_ref(), &pairs)?,
                None => {
                    let mut dst = src.empty_like(self.number_of_points())?;
                    dst.copy_tuples_from(src.as_ref(), &pairs)?;
                    self.point_data.insert(Arc::from(dst))?;
                }
            }
        }
        if let Some(active) = piece.point_data().active_scalars_name()
            && self.point_data.active_scalars_name().is_none()
        {
            self.point_data.set_active_scalars(active)?;
        }
        self.mtime.modified();
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dataset/image.rs"]
mod tests;
