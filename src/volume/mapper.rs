//! Tiled, multi-threaded fixed-point ray casting.

use std::sync::Arc;

use crate::dataset::ImageData;
use crate::foundation::abort::AbortFlag;
use crate::foundation::diagnostics::{self, Severity};
use crate::foundation::error::{VoxflowError, VoxflowResult};
use crate::pipeline::{Node, UpdateRequest, as_image};
use crate::smp::{self, SmpContext, ThreadLocal};
use crate::volume::camera::{Camera, ViewBasis};
use crate::volume::image::RayCastImage;
use crate::volume::kernels::{Kernel, RayCaster};
use crate::volume::property::{BlendMode, VolumeProperty};
use crate::volume::sampler::SampledVolume;
use crate::volume::shading::ShadingTable;
use crate::volume::tables::RayCastTables;

/// Largest `image_sample_distance`.
pub const MAX_IMAGE_SAMPLE_DISTANCE: u32 = 16;

/// Render options.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RayCastOpts {
    /// World-space distance between samples along a ray.
    pub sample_distance: f64,
    /// Rays are cast for every n-th viewport pixel in each direction (1..=16).
    pub image_sample_distance: u32,
    /// Edge length of the square work items.
    pub tile_size: usize,
}

impl Default for RayCastOpts {
    fn default() -> Self {
        Self {
            sample_distance: 1.0,
            image_sample_distance: 1,
            tile_size: 8,
        }
    }
}

impl RayCastOpts {
    /// Reject options a render cannot honour.
    pub fn validate(&self) -> VoxflowResult<()> {
        if !(self.sample_distance.is_finite() && self.sample_distance > 0.0) {
            return Err(VoxflowError::validation(format!(
                "sample distance must be positive, got {}",
                self.sample_distance
            )));
        }
        if !(1..=MAX_IMAGE_SAMPLE_DISTANCE).contains(&self.image_sample_distance) {
            return Err(VoxflowError::validation(format!(
                "image sample distance must be in 1..={MAX_IMAGE_SAMPLE_DISTANCE}, got {}",
                self.image_sample_distance
            )));
        }
        if self.tile_size == 0 {
            return Err(VoxflowError::validation("tile size must be at least 1"));
        }
        Ok(())
    }
}

/// Counters of the last render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct RayCastStats {
    /// Rays cast.
    pub rays: u64,
    /// Samples that landed inside the volume.
    pub samples: u64,
    /// Composite rays stopped by the opacity threshold.
    pub early_terminations: u64,
    /// Tiles left transparent after an error.
    pub failed_tiles: u64,
}

impl RayCastStats {
    fn merge(mut self, o: Self) -> Self {
        self.rays += o.rays;
        self.samples += o.samples;
        self.early_terminations += o.early_terminations;
        self.failed_tiles += o.failed_tiles;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct VolumeKey {
    mtime: u64,
    extent: [i32; 6],
    origin: [u64; 3],
    spacing: [u64; 3],
}

impl VolumeKey {
    fn of(image: &ImageData) -> Self {
        Self {
            mtime: image.mtime(),
            extent: image.extent().0,
            origin: image.origin().map(f64::to_bits),
            spacing: image.spacing().map(f64::to_bits),
        }
    }
}

enum TileOutcome {
    Done(Vec<[u16; 4]>),
    Failed(VoxflowError),
}

struct TileGrid {
    width: usize,
    height: usize,
    size: usize,
    across: usize,
}

impl TileGrid {
    fn new(width: usize, height: usize, size: usize) -> Self {
        Self {
            width,
            height,
            size,
            across: width.div_ceil(size),
        }
    }

    fn count(&self) -> usize {
        self.across * self.height.div_ceil(self.size)
    }

    /// `(x0, y0, w, h)` of tile `t`.
    fn rect(&self, t: usize) -> (usize, usize, usize, usize) {
        let (x0, y0) = ((t % self.across) * self.size, (t / self.across) * self.size);
        (
            x0,
            y0,
            self.size.min(self.width - x0),
            self.size.min(self.height - y0),
        )
    }
}

/// Volume ray caster over image data with fixed-point tables.
pub struct FixedPointRayCastMapper {
    opts: RayCastOpts,
    property: VolumeProperty,
    blend: BlendMode,
    tables: RayCastTables,
    volume: Option<(VolumeKey, SampledVolume)>,
    abort: AbortFlag,
    ctx: Option<Arc<SmpContext>>,
    last_stats: RayCastStats,
}

impl Default for FixedPointRayCastMapper {
    fn default() -> Self {
        Self::new(VolumeProperty::default())
    }
}

impl FixedPointRayCastMapper {
    /// Composite mapper with default options, polling the global abort flag.
    pub fn new(property: VolumeProperty) -> Self {
        Self {
            opts: RayCastOpts::default(),
            property,
            blend: BlendMode::default(),
            tables: RayCastTables::new(),
            volume: None,
            abort: AbortFlag::global().clone(),
            ctx: None,
            last_stats: RayCastStats::default(),
        }
    }

    /// Builder: render options.
    pub fn with_opts(mut self, opts: RayCastOpts) -> Self {
        self.opts = opts;
        self
    }

    /// Builder: blending rule.
    pub fn with_blend_mode(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    /// Builder: run on `ctx` instead of the global SMP context.
    pub fn with_context(mut self, ctx: Arc<SmpContext>) -> Self {
        self.ctx = Some(ctx);
        self
    }

    /// Builder: poll `abort` instead of the global flag.
    pub fn with_abort_flag(mut self, abort: AbortFlag) -> Self {
        self.abort = abort;
        self
    }

    /// Render options.
    pub fn opts(&self) -> &RayCastOpts {
        &self.opts
    }

    /// Mutable render options.
    pub fn opts_mut(&mut self) -> &mut RayCastOpts {
        &mut self.opts
    }

    /// Appearance.
    pub fn property(&self) -> &VolumeProperty {
        &self.property
    }

    /// Mutable appearance; edits to the transfer functions rebuild the tables on the next
    /// render.
    pub fn property_mut(&mut self) -> &mut VolumeProperty {
        &mut self.property
    }

    /// Blending rule.
    pub fn blend_mode(&self) -> BlendMode {
        self.blend
    }

    /// Set the blending rule.
    pub fn set_blend_mode(&mut self, blend: BlendMode) {
        self.blend = blend;
    }

    /// Kernel the next render will use.
    pub fn kernel(&self) -> Kernel {
        Kernel::select(self.blend, &self.property)
    }

    /// Flag polled once per pixel row.
    pub fn abort_flag(&self) -> &AbortFlag {
        &self.abort
    }

    /// Lookup tables of the last render.
    pub fn tables(&self) -> &RayCastTables {
        &self.tables
    }

    /// Counters of the last render.
    pub fn last_stats(&self) -> RayCastStats {
        self.last_stats
    }

    fn context(&self) -> VoxflowResult<Arc<SmpContext>> {
        match &self.ctx {
            Some(ctx) => Ok(Arc::clone(ctx)),
            None => smp::try_global(),
        }
    }

    fn sampled(&mut self, ctx: &SmpContext, image: &ImageData) -> VoxflowResult<SampledVolume> {
        let key = VolumeKey::of(image);
        if let Some((k, v)) = &self.volume
            && *k == key
        {
            return Ok(v.clone());
        }
        let v = SampledVolume::from_image(ctx, image)?;
        self.volume = Some((key, v.clone()));
        Ok(v)
    }

    /// Ray cast `image` as seen by `camera` into a `viewport[0] x viewport[1]` view.
    ///
    /// The returned image is `ceil(viewport / image_sample_distance)` pixels and carries
    /// the sample distance as its display `pixel_scale`. A tile whose rays fail is left
    /// transparent and counted in [`RayCastStats::failed_tiles`]; an abort or an
    /// allocation failure of the output image fails the whole pass.
    #[tracing::instrument(level = "debug", skip_all, fields(kernel = ?self.kernel()))]
    pub fn render(
        &mut self,
        image: &ImageData,
        camera: &Camera,
        viewport: [usize; 2],
    ) -> VoxflowResult<RayCastImage> {
        self.opts.validate()?;
        if viewport[0] == 0 || viewport[1] == 0 {
            return Err(VoxflowError::validation(format!(
                "viewport {}x{} is empty",
                viewport[0], viewport[1]
            )));
        }
        let isd = self.opts.image_sample_distance;
        let (w, h) = (
            viewport[0].div_ceil(isd as usize),
            viewport[1].div_ceil(isd as usize),
        );
        let mut out = RayCastImage::new(w, h, isd)?;
        self.last_stats = RayCastStats::default();

        let ctx = self.context()?;
        let volume = self.sampled(&ctx, image)?;
        let range = volume.range();
        if !(range.0 <= range.1) {
            tracing::debug!("volume has no finite samples; nothing to draw");
            return Ok(out);
        }
        self.tables
            .update(&self.property, range, self.opts.sample_distance, self.blend)?;
        let basis = camera.basis()?;

        let kernel = self.kernel();
        let shading = self.property.shade.then(|| ShadingTable::new(&self.property));
        let caster = RayCaster {
            volume: &volume,
            tables: &self.tables,
            shading: shading.as_ref(),
            interpolation: self.property.interpolation,
            sample_distance: self.opts.sample_distance,
            kernel,
            bounds: volume.bounds(),
        };
        let grid = TileGrid::new(w, h, self.opts.tile_size);
        let stats = ThreadLocal::new(&ctx, RayCastStats::default);
        let abort = &self.abort;

        let tiles = ctx.parallel_map(0, grid.count(), 1, |b, e, tid| {
            let mut done = Vec::with_capacity(e - b);
            for t in b..e {
                match render_tile(&caster, camera, &basis, &grid, t, abort, &stats, tid) {
                    Ok(px) => done.push(TileOutcome::Done(px)),
                    Err(VoxflowError::Aborted) => return Err(VoxflowError::Aborted),
                    Err(err) => done.push(TileOutcome::Failed(err)),
                }
            }
            Ok(done)
        })?;

        let mut totals = stats.combine(RayCastStats::default(), RayCastStats::merge);
        for (t, outcome) in tiles.into_iter().flatten().enumerate() {
            let (x0, y0, tw, _) = grid.rect(t);
            match outcome {
                TileOutcome::Done(px) => out.write_block(x0, y0, tw, &px),
                TileOutcome::Failed(err) => {
                    totals.failed_tiles += 1;
                    diagnostics::emit(
                        Severity::Warning,
                        "raycast",
                        format!("tile {t} at ({x0}, {y0}) left transparent: {err}"),
                    );
                }
            }
        }
        self.last_stats = totals;
        tracing::debug!(
            rays = totals.rays,
            samples = totals.samples,
            early = totals.early_terminations,
            failed = totals.failed_tiles,
            "ray cast finished"
        );
        Ok(out)
    }

    /// Update output `port` of `node` for its whole extent and render it.
    pub fn render_port(
        &mut self,
        node: &Arc<Node>,
        port: usize,
        camera: &Camera,
        viewport: [usize; 2],
    ) -> VoxflowResult<RayCastImage> {
        let data = node.update_port(port, &UpdateRequest::whole())?;
        self.render(as_image(&data)?, camera, viewport)
    }
}

#[allow(clippy::too_many_arguments)]
fn render_tile(
    caster: &RayCaster<'_>,
    camera: &Camera,
    basis: &ViewBasis,
    grid: &TileGrid,
    t: usize,
    abort: &AbortFlag,
    stats: &ThreadLocal<RayCastStats>,
    tid: usize,
) -> VoxflowResult<Vec<[u16; 4]>> {
    let (x0, y0, tw, th) = grid.rect(t);
    let mut px = Vec::with_capacity(tw * th);
    let mut local = RayCastStats::default();
    for y in y0..y0 + th {
        abort.check()?;
        for x in x0..x0 + tw {
            let ray = camera
                .ray(basis, x, y, grid.width, grid.height)
                .ok_or_else(|| VoxflowError::numeric_domain(format!("degenerate ray at ({x}, {y})")))?;
            let r = caster.cast(&ray);
            local.rays += 1;
            local.samples += u64::from(r.samples);
            local.early_terminations += u64::from(r.early);
            px.push(r.pixel);
        }
    }
    stats.with(tid, |s| *s = s.merge(local));
    Ok(px)
}

#[cfg(test)]
#[path = "../../tests/unit/volume/mapper.rs"]
mod tests;
