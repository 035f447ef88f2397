use std::sync::Arc;

use crate::array::{AosArray, DataArray};
use crate::dataset::field_data::FieldData;
use crate::foundation::core::TimeStamp;
use crate::foundation::error::{VoxflowError, VoxflowResult};

/// Cell connectivity stored as offsets into a flat point-id list.
///
/// Cell `i` uses `connectivity[offsets[i]..offsets[i + 1]]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellArray {
    offsets: Vec<usize>,
    connectivity: Vec<i64>,
}

impl Default for CellArray {
    fn default() -> Self {
        Self {
            offsets: vec![0],
            connectivity: Vec::new(),
        }
    }
}

impl CellArray {
    /// No cells.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from offsets (`n_cells + 1` entries, starting at 0, non-decreasing) and
    /// connectivity.
    pub fn from_parts(offsets: Vec<usize>, connectivity: Vec<i64>) -> VoxflowResult<Self> {
        if offsets.first() != Some(&0)
            || offsets.windows(2).any(|w| w[1] < w[0])
            || offsets.last() != Some(&connectivity.len())
        {
            return Err(VoxflowError::bad_input(
                "cell offsets must start at 0, be non-decreasing and end at the connectivity length",
            ));
        }
        Ok(Self {
            offsets,
            connectivity,
        })
    }

    /// Append a cell; returns its id.
    pub fn push(&mut self, point_ids: &[i64]) -> usize {
        self.connectivity.extend_from_slice(point_ids);
        self.offsets.push(self.connectivity.len());
        self.offsets.len() - 2
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    /// `true` without cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Point ids of cell `i`.
    pub fn cell(&self, i: usize) -> &[i64] {
        &self.connectivity[self.offsets[i]..self.offsets[i + 1]]
    }

    /// Iterate cells in order.
    pub fn iter(&self) -> impl Iterator<Item = &[i64]> {
        self.offsets
            .windows(2)
            .map(|w| &self.connectivity[w[0]..w[1]])
    }

    /// Offsets (`len() + 1` entries).
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Flat point-id list.
    pub fn connectivity(&self) -> &[i64] {
        &self.connectivity
    }

    /// Largest referenced point id.
    pub fn max_point_id(&self) -> Option<i64> {
        self.connectivity.iter().copied().max()
    }
}

/// Shared storage of explicit point coordinates plus point/cell attributes.
#[derive(Clone, Debug)]
pub struct PointSet {
    points: Arc<AosArray<f64>>,
    point_data: FieldData,
    mtime: TimeStamp,
}

impl PointSet {
    /// Wrap 3-component coordinates.
    pub fn new(points: AosArray<f64>) -> VoxflowResult<Self> {
        if points.components() != 3 {
            return Err(VoxflowError::bad_input(format!(
                "points need 3 components, got {}",
                points.components()
            )));
        }
        let n = points.len();
        Ok(Self {
            points: Arc::new(points),
            point_data: FieldData::new(n),
            mtime: TimeStamp::now(),
        })
    }

    /// Coordinates.
    pub fn points(&self) -> &AosArray<f64> {
        &self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// `true` without points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
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

    pub(crate) fn mtime(&self) -> u64 {
        self.mtime
            .get()
            .max(self.points.mtime())
            .max(self.point_data.mtime())
    }

    pub(crate) fn clone_empty(&self) -> VoxflowResult<Self> {
        Ok(Self {
            points: Arc::new(AosArray::new(3)),
            point_data: self.point_data.empty_like(0)?,
            mtime: TimeStamp::now(),
        })
    }

    fn check_ids(&self, cells: &CellArray, what: &str) -> VoxflowResult<()> {
        match cells.max_point_id() {
            Some(id) if id < 0 || id as usize >= self.len() => Err(VoxflowError::bad_input(format!(
                "{what} reference point {id}, only {} points",
                self.len()
            ))),
            _ => Ok(()),
        }
    }
}

/// Explicit cells of mixed types.
#[derive(Clone, Debug)]
pub struct UnstructuredGrid {
    points: PointSet,
    cells: CellArray,
    cell_types: Vec<u8>,
    cell_data: FieldData,
}

impl UnstructuredGrid {
    /// Grid with points and no cells.
    pub fn new(points: AosArray<f64>) -> VoxflowResult<Self> {
        Ok(Self {
            points: PointSet::new(points)?,
            cells: CellArray::new(),
            cell_types: Vec::new(),
            cell_data: FieldData::new(0),
        })
    }

    /// Append a cell of VTK cell type `cell_type`.
    pub fn insert_cell(&mut self, cell_type: u8, point_ids: &[i64]) -> VoxflowResult<usize> {
        if let Some(&bad) = point_ids
            .iter()
            .find(|&&id| id < 0 || id as usize >= self.points.len())
        {
            return Err(VoxflowError::bad_input(format!(
                "cell references point {bad}, only {} points",
                self.points.len()
            )));
        }
        self.cell_types.push(cell_type);
        let id = self.cells.push(point_ids);
        self.cell_data.set_tuples(self.cells.len());
        Ok(id)
    }

    /// Points and point attributes.
    pub fn point_set(&self) -> &PointSet {
        &self.points
    }

    /// Mutable points and point attributes.
    pub fn point_set_mut(&mut self) -> &mut PointSet {
        &mut self.points
    }

    /// Connectivity.
    pub fn cells(&self) -> &CellArray {
        &self.cells
    }

    /// Type of cell `i`.
    pub fn cell_type(&self, i: usize) -> u8 {
        self.cell_types[i]
    }

    /// Cell attributes.
    pub fn cell_data(&self) -> &FieldData {
        &self.cell_data
    }

    /// Mutable cell attributes.
    pub fn cell_data_mut(&mut self) -> &mut FieldData {
        &mut self.cell_data
    }

    pub(crate) fn clone_empty(&self) -> VoxflowResult<Self> {
        Ok(Self {
            points: self.points.clone_empty()?,
            cells: CellArray::new(),
            cell_types: Vec::new(),
            cell_data: self.cell_data.empty_like(0)?,
        })
    }

    pub(crate) fn mtime(&self) -> u64 {
        self.points.mtime().max(self.cell_data.mtime())
    }
}

/// Points with vertex, line, polygon and triangle-strip cells.
#[derive(Clone, Debug)]
pub struct PolyData {
    points: PointSet,
    verts: CellArray,
    lines: CellArray,
    polys: CellArray,
    strips: CellArray,
    cell_data: FieldData,
}

/// Cell category of [`PolyData`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolyCells {
    /// Vertices.
    Verts,
    /// Polylines.
    Lines,
    /// Polygons.
    Polys,
    /// Triangle strips.
    Strips,
}

impl PolyData {
    /// Points without cells.
    pub fn new(points: AosArray<f64>) -> VoxflowResult<Self> {
        Ok(Self {
            points: PointSet::new(points)?,
            verts: CellArray::new(),
            lines: CellArray::new(),
            polys: CellArray::new(),
            strips: CellArray::new(),
            cell_data: FieldData::new(0),
        })
    }

    /// Replace one cell category. Cell data is reset to the new cell count.
    pub fn set_cells(&mut self, which: PolyCells, cells: CellArray) -> VoxflowResult<()> {
        self.points.check_ids(&cells, "cells")?;
        *self.cells_slot(which) = cells;
        let n = self.number_of_cells();
        self.cell_data.set_tuples(n);
        Ok(())
    }

    /// One cell category.
    pub fn cells(&self, which: PolyCells) -> &CellArray {
        match which {
            PolyCells::Verts => &self.verts,
            PolyCells::Lines => &self.lines,
            PolyCells::Polys => &self.polys,
            PolyCells::Strips => &self.strips,
        }
    }

    fn cells_slot(&mut self, which: PolyCells) -> &mut CellArray {
        match which {
            PolyCells::Verts => &mut self.verts,
            PolyCells::Lines => &mut self.lines,
            PolyCells::Polys => &mut self.polys,
            PolyCells::Strips => &mut self.strips,
        }
    }

    /// Cells across all four categories (verts, lines, polys, strips order).
    pub fn number_of_cells(&self) -> usize {
        self.verts.len() + self.lines.len() + self.polys.len() + self.strips.len()
    }

    /// Points and point attributes.
    pub fn point_set(&self) -> &PointSet {
        &self.points
    }

    /// Mutable points and point attributes.
    pub fn point_set_mut(&mut self) -> &mut PointSet {
        &mut self.points
    }

    /// Cell attributes.
    pub fn cell_data(&self) -> &FieldData {
        &self.cell_data
    }

    /// Mutable cell attributes.
    pub fn cell_data_mut(&mut self) -> &mut FieldData {
        &mut self.cell_data
    }

    pub(crate) fn clone_empty(&self) -> VoxflowResult<Self> {
        Ok(Self {
            points: self.points.clone_empty()?,
            verts: CellArray::new(),
            lines: CellArray::new(),
            polys: CellArray::new(),
            strips: CellArray::new(),
            cell_data: self.cell_data.empty_like(0)?,
        })
    }

    pub(crate) fn mtime(&self) -> u64 {
        self.points.mtime().max(self.cell_data.mtime())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dataset/cells.rs"]
mod tests;
