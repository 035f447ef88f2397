use crate::dataset::cells::{PolyData, UnstructuredGrid};
use crate::dataset::composite::CompositeDataSet;
use crate::dataset::field_data::FieldData;
use crate::dataset::grids::{RectilinearGrid, StructuredGrid};
use crate::dataset::image::ImageData;
use crate::foundation::core::Extent;
use crate::foundation::error::VoxflowResult;

/// Variant tag of a [`DataObject`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    /// Regular grid.
    Image,
    /// Axis-aligned grid with per-axis coordinates.
    Rectilinear,
    /// Curvilinear grid.
    Structured,
    /// Explicit mixed cells.
    Unstructured,
    /// Points, verts, lines, polys and strips.
    Poly,
    /// Tree of datasets.
    Composite,
}

impl DataKind {
    /// Name stored under `DATA_TYPE_NAME`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Rectilinear => "rectilinear",
            Self::Structured => "structured",
            Self::Unstructured => "unstructured",
            Self::Poly => "poly",
            Self::Composite => "composite",
        }
    }

    /// Inverse of [`DataKind::as_str`].
    pub fn parse(s: &str) -> Option<Self> {
        [
            Self::Image,
            Self::Rectilinear,
            Self::Structured,
            Self::Unstructured,
            Self::Poly,
            Self::Composite,
        ]
        .into_iter()
        .find(|k| k.as_str() == s)
    }

    /// `true` for variants with an index extent.
    pub fn is_structured(self) -> bool {
        matches!(self, Self::Image | Self::Rectilinear | Self::Structured)
    }
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dataset: one of six closed variants.
#[derive(Clone, Debug)]
pub enum DataObject {
    /// Regular grid.
    Image(ImageData),
    /// Axis-aligned grid with per-axis coordinates.
    Rectilinear(RectilinearGrid),
    /// Curvilinear grid.
    Structured(StructuredGrid),
    /// Explicit mixed cells.
    Unstructured(UnstructuredGrid),
    /// Polygonal data.
    Poly(PolyData),
    /// Tree of datasets.
    Composite(CompositeDataSet),
}

impl DataObject {
    /// Variant tag.
    pub fn kind(&self) -> DataKind {
        match self {
            Self::Image(_) => DataKind::Image,
            Self::Rectilinear(_) => DataKind::Rectilinear,
            Self::Structured(_) => DataKind::Structured,
            Self::Unstructured(_) => DataKind::Unstructured,
            Self::Poly(_) => DataKind::Poly,
            Self::Composite(_) => DataKind::Composite,
        }
    }

    /// Index extent of structured variants.
    pub fn extent(&self) -> Option<Extent> {
        match self {
            Self::Image(d) => Some(d.extent()),
            Self::Rectilinear(d) => Some(d.extent()),
            Self::Structured(d) => Some(d.extent()),
            _ => None,
        }
    }

    /// Point attributes (none for composites).
    pub fn point_data(&self) -> Option<&FieldData> {
        match self {
            Self::Image(d) => Some(d.point_data()),
            Self::Rectilinear(d) => Some(d.point_data()),
            Self::Structured(d) => Some(d.point_data()),
            Self::Unstructured(d) => Some(d.point_set().point_data()),
            Self::Poly(d) => Some(d.point_set().point_data()),
            Self::Composite(_) => None,
        }
    }

    /// Cell attributes (none for composites).
    pub fn cell_data(&self) -> Option<&FieldData> {
        match self {
            Self::Image(d) => Some(d.cell_data()),
            Self::Rectilinear(d) => Some(d.cell_data()),
            Self::Structured(d) => Some(d.cell_data()),
            Self::Unstructured(d) => Some(d.cell_data()),
            Self::Poly(d) => Some(d.cell_data()),
            Self::Composite(_) => None,
        }
    }

    /// Same variant and array layout, no points or cells.
    pub fn clone_empty(&self) -> VoxflowResult<Self> {
        Ok(match self {
            Self::Image(d) => Self::Image(d.clone_empty()?),
            Self::Rectilinear(d) => Self::Rectilinear(d.clone_empty()?),
            Self::Structured(d) => Self::Structured(d.clone_empty()?),
            Self::Unstructured(d) => Self::Unstructured(d.clone_empty()?),
            Self::Poly(d) => Self::Poly(d.clone_empty()?),
            Self::Composite(d) => Self::Composite(d.clone_empty()),
        })
    }

    /// Number of points.
    pub fn number_of_points(&self) -> usize {
        match self {
            Self::Image(d) => d.number_of_points(),
            Self::Rectilinear(d) => d.extent().num_points(),
            Self::Structured(d) => d.extent().num_points(),
            Self::Unstructured(d) => d.point_set().len(),
            Self::Poly(d) => d.point_set().len(),
            Self::Composite(d) => d.number_of_points(),
        }
    }

    /// Number of cells.
    pub fn number_of_cells(&self) -> usize {
        match self {
            Self::Image(d) => d.number_of_cells(),
            Self::Rectilinear(d) => d.extent().num_cells(),
            Self::Structured(d) => d.extent().num_cells(),
            Self::Unstructured(d) => d.cells().len(),
            Self::Poly(d) => d.number_of_cells(),
            Self::Composite(d) => d.number_of_cells(),
        }
    }

    /// Latest modified stamp of the object and its arrays.
    pub fn mtime(&self) -> u64 {
        match self {
            Self::Image(d) => d.mtime(),
            Self::Rectilinear(d) => d.mtime(),
            Self::Structured(d) => d.mtime(),
            Self::Unstructured(d) => d.mtime(),
            Self::Poly(d) => d.mtime(),
            Self::Composite(d) => d.mtime(),
        }
    }

    /// The image variant, if this is one.
    pub fn as_image(&self) -> Option<&ImageData> {
        match self {
            Self::Image(d) => Some(d),
            _ => None,
        }
    }

    /// The composite variant, if this is one.
    pub fn as_composite(&self) -> Option<&CompositeDataSet> {
        match self {
            Self::Composite(d) => Some(d),
            _ => None,
        }
    }
}

impl From<ImageData> for DataObject {
    fn from(d: ImageData) -> Self {
        Self::Image(d)
    }
}

impl From<CompositeDataSet> for DataObject {
    fn from(d: CompositeDataSet) -> Self {
        Self::Composite(d)
    }
}

impl From<PolyData> for DataObject {
    fn from(d: PolyData) -> Self {
        Self::Poly(d)
    }
}

impl From<UnstructuredGrid> for DataObject {
    fn from(d: UnstructuredGrid) -> Self {
        Self::Unstructured(d)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dataset/object.rs"]
mod tests;
