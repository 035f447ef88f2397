//! Datasets: closed variants over typed arrays.

/// Point sets and explicit cells.
pub mod cells;
/// Trees of datasets.
pub mod composite;
/// Named attribute arrays.
pub mod field_data;
/// Rectilinear and curvilinear grids.
pub mod grids;
/// Regular grids.
pub mod image;
/// The dataset enum.
pub mod object;

pub use cells::{CellArray, PointSet, PolyCells, PolyData, UnstructuredGrid};
pub use composite::{Block, BlockNode, CompositeDataSet, LeafRef};
pub use field_data::FieldData;
pub use grids::{RectilinearGrid, StructuredGrid};
pub use image::ImageData;
pub use object::{DataKind, DataObject};
