use std::sync::Arc;

use crate::array::{AosArray, DataArray};
use crate::dataset::field_data::FieldData;
use crate::foundation::core::{Extent, TimeStamp};
use crate::foundation::error::{VoxflowError, VoxflowResult};

/// Axis-aligned grid with explicit per-axis coordinates.
#[derive(Clone, Debug)]
pub struct RectilinearGrid {
    extent: Extent,
    coords: [Arc<AosArray<f64>>; 3],
    point_data: FieldData,
    cell_data: FieldData,
    mtime: TimeStamp,
}

impl RectilinearGrid {
    /// Grid over `extent`; each coordinate array must have as many values as points on its axis.
    pub fn new(extent: Extent, coords: [AosArray<f64>; 3]) -> VoxflowResult<Self> {
        let dims = extent.dimensions();
        for (a, c) in coords.iter().enumerate() {
            if c.len() != dims[a] {
                return Err(VoxflowError::bad_input(format!(
                    "axis {a} has {} coordinates, extent {extent} needs {}",
                    c.len(),
                    dims[a]
                )));
            }
        }
        let [x, y, z] = coords;
        Ok(Self {
            extent,
            coords: [Arc::new(x), Arc::new(y), Arc::new(z)],
            point_data: FieldData::new(extent.num_points()),
            cell_data: FieldData::new(extent.num_cells()),
            mtime: TimeStamp::now(),
        })
    }

    /// Index extent.
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Coordinates along axis `a`.
    pub fn coordinates(&self, a: usize) -> &AosArray<f64> {
        &self.coords[a]
    }

    /// World position of structured index `ijk`.
    pub fn point(&self, ijk: [i32; 3]) -> [f64; 3] {
        std::array::from_fn(|a| {
            let lo = self.extent.axis(a).0;
            self.coords[a].get((ijk[a] - lo) as usize, 0)
        })
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

    pub(crate) fn clone_empty(&self) -> VoxflowResult<Self> {
        Ok(Self {
            extent: Extent::EMPTY,
            coords: std::array::from_fn(|_| Arc::new(AosArray::new(1))),
            point_data: self.point_data.empty_like(0)?,
            cell_data: self.cell_data.empty_like(0)?,
            mtime: TimeStamp::now(),
        })
    }

    pub(crate) fn mtime(&self) -> u64 {
        self.coords
            .iter()
            .map(|c| c.mtime())
            .chain([self.mtime.get(), self.point_data.mtime(), self.cell_data.mtime()])
            .max()
            .unwrap_or(0)
    }
}

/// Curvilinear grid: implicit structured topology with explicit points.
#[derive(Clone, Debug)]
pub struct StructuredGrid {
    extent: Extent,
    points: Arc<AosArray<f64>>,
    point_data: FieldData,
    cell_data: FieldData,
    mtime: TimeStamp,
}

impl StructuredGrid {
    /// Grid over `extent` with one 3-component point per structured index.
    pub fn new(extent: Extent, points: AosArray<f64>) -> VoxflowResult<Self> {
        if points.components() != 3 || points.len() != extent.num_points() {
            return Err(VoxflowError::bad_input(format!(
                "structured grid over {extent} needs {} 3-component points, got {} x {}",
                extent.num_points(),
                points.len(),
                points.components()
            )));
        }
        Ok(Self {
            extent,
            points: Arc::new(points),
            point_data: FieldData::new(extent.num_points()),
            cell_data: FieldData::new(extent.num_cells()),
            mtime: TimeStamp::now(),
        })
    }

    /// Index extent.
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Point coordinates, x-fastest.
    pub fn points(&self) -> &AosArray<f64> {
        &self.points
    }

    /// World position of structured index `ijk`.
    pub fn point(&self, ijk: [i32; 3]) -> [f64; 3] {
        let t = self.points.tuple(self.extent.point_index(ijk));
        [t[0], t[1], t[2]]
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

    pub(crate) fn clone_empty(&self) -> VoxflowResult<Self> {
        Ok(Self {
            extent: Extent::EMPTY,
            points: Arc::new(AosArray::new(3)),
            point_data: self.point_data.empty_like(0)?,
            cell_data: self.cell_data.empty_like(0)?,
            mtime: TimeStamp::now(),
        })
    }

    pub(crate) fn mtime(&self) -> u64 {
        self.mtime
            .get()
            .max(self.points.mtime())
            .max(self.point_data.mtime())
            .max(self.cell_data.mtime())
    }
}
