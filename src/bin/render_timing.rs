use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
    time::Instant,
};

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use voxflow::{
    array::{AosArray, DataArray},
    display::{ImageDisplayHelper, Rect, Rgba8Surface},
    filters::{AnalyticImageSource, ImageBoxSmooth},
    pipeline::{Executive, ExecutiveOpts, Node, assemble_image, as_image},
    smp::{self, BackendKind, SmpContext, SmpOpts},
    volume::{
        BlendMode, Camera, ColorTransferFunction, FixedPointRayCastMapper, PiecewiseFunction,
        RayCastImage, RayCastOpts, RayCastStats, VolumeProperty,
    },
};

#[derive(Parser, Debug)]
#[command(name = "render-timing", version, about = "Time voxflow rendering and pipeline workloads")]
struct Cli {
    /// Workload to run.
    #[arg(value_enum)]
    test: TestName,

    /// Worker threads (0 = backend default).
    #[arg(long, default_value_t = 0)]
    cores: usize,

    /// Timed repetitions.
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
    frames: u32,

    /// Viewport as WIDTHxHEIGHT.
    #[arg(long, default_value = "256x256", value_parser = parse_size)]
    size: Size,

    /// SMP backend (sequential, pool or omp); defaults to VTK_SMP_BACKEND, then pool.
    #[arg(long, value_parser = parse_backend)]
    backend: Option<BackendKind>,

    /// Edge length of the generated volume.
    #[arg(long, default_value_t = 64, value_parser = clap::value_parser!(i32).range(2..=1024))]
    volume: i32,

    /// Write the last rendered frame as a PNG.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
enum TestName {
    Composite,
    CompositeShaded,
    GradientOpacity,
    Mip,
    Stream,
    Range,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Size {
    width: usize,
    height: usize,
}

fn parse_size(s: &str) -> Result<Size, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=16384).contains(n))
            .ok_or_else(|| format!("invalid dimension '{v}' in '{s}' (expected 1..=16384)"))
    };
    Ok(Size {
        width: parse(w)?,
        height: parse(h)?,
    })
}

fn parse_backend(s: &str) -> Result<BackendKind, String> {
    BackendKind::parse(s).map_err(|e| e.to_string())
}

#[derive(Debug, serde::Serialize)]
struct Summary {
    test: TestName,
    backend: BackendKind,
    threads: usize,
    size: [usize; 2],
    frames_ms: Vec<f64>,
    mean_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    raycast: Option<RayCastStats>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let ctx = match init_smp(&cli) {
        Ok(ctx) => ctx,
        Err(err) => {
            eprintln!("{err:#}");
            return ExitCode::from(3);
        }
    };

    match run(&cli, &ctx) {
        Ok(summary) => match serde_json::to_string_pretty(&summary) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("serialize summary: {err}");
                ExitCode::from(1)
            }
        },
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn init_smp(cli: &Cli) -> anyhow::Result<Arc<SmpContext>> {
    match cli.backend {
        Some(backend) => smp::initialize_with(SmpOpts {
            backend,
            threads: cli.cores,
        }),
        None => smp::initialize(cli.cores),
    }
    .context("initialise SMP backend")?;
    Ok(smp::try_global()?)
}

fn run(cli: &Cli, ctx: &Arc<SmpContext>) -> anyhow::Result<Summary> {
    tracing::info!(
        test = ?cli.test,
        backend = ctx.backend().as_str(),
        threads = ctx.estimated_thread_count(),
        "starting"
    );
    let (frames_ms, raycast) = match cli.test {
        TestName::Stream => (time_stream(cli)?, None),
        TestName::Range => (time_range(cli, ctx)?, None),
        render => {
            let (ms, stats) = time_render(cli, ctx, render)?;
            (ms, Some(stats))
        }
    };
    let mean_ms = frames_ms.iter().sum::<f64>() / frames_ms.len().max(1) as f64;
    Ok(Summary {
        test: cli.test,
        backend: ctx.backend(),
        threads: ctx.estimated_thread_count(),
        size: [cli.size.width, cli.size.height],
        frames_ms,
        mean_ms,
        raycast,
    })
}

fn elapsed_ms(t0: Instant) -> f64 {
    t0.elapsed().as_secs_f64() * 1000.0
}

fn property_for(test: TestName, range: (f64, f64)) -> VolumeProperty {
    let (lo, hi) = range;
    let mid = lo + 0.5 * (hi - lo);
    let mut color = ColorTransferFunction::new();
    color.add_rgb_point(lo, [0.1, 0.2, 0.8]);
    color.add_rgb_point(mid, [0.9, 0.9, 0.9]);
    color.add_rgb_point(hi, [0.9, 0.3, 0.1]);
    let mut opacity = PiecewiseFunction::new();
    opacity.add_point(lo, 0.0);
    opacity.add_point(mid, 0.05);
    opacity.add_point(hi, 0.6);
    let mut prop = VolumeProperty {
        color,
        scalar_opacity: opacity,
        ..VolumeProperty::default()
    };
    match test {
        TestName::CompositeShaded => prop.shade = true,
        TestName::GradientOpacity => {
            prop.shade = true;
            prop.gradient_opacity = Some(PiecewiseFunction::linear(0.0, 0.0, 0.1 * (hi - lo), 1.0));
        }
        _ => {}
    }
    prop
}

fn time_render(
    cli: &Cli,
    ctx: &Arc<SmpContext>,
    test: TestName,
) -> anyhow::Result<(Vec<f64>, RayCastStats)> {
    let source = Node::with_opts(
        AnalyticImageSource::cube(cli.volume).with_context(Arc::clone(ctx)),
        ExecutiveOpts::in_memory(),
    );
    let data = source.update().context("generate volume")?;
    let image = as_image(&data)?;
    let range = image
        .scalars()
        .map(|s| s.finite_range(0))
        .context("generated volume has no scalars")?;

    let blend = if test == TestName::Mip {
        BlendMode::MaximumIntensity
    } else {
        BlendMode::Composite
    };
    let mut mapper = FixedPointRayCastMapper::new(property_for(test, range))
        .with_blend_mode(blend)
        .with_context(Arc::clone(ctx))
        .with_opts(RayCastOpts {
            sample_distance: 0.5,
            ..RayCastOpts::default()
        });

    let bounds = image.bounds();
    let base = Camera::framing(bounds);
    let viewport = [cli.size.width, cli.size.height];
    let mut frames_ms = Vec::with_capacity(cli.frames as usize);
    let mut totals = RayCastStats::default();
    let mut last = None;
    for f in 0..cli.frames {
        let camera = orbit(&base, 360.0 * f64::from(f) / f64::from(cli.frames));
        let t0 = Instant::now();
        let frame = mapper
            .render(image, &camera, viewport)
            .with_context(|| format!("render frame {f}"))?;
        frames_ms.push(elapsed_ms(t0));

        let stats = mapper.last_stats();
        totals.rays += stats.rays;
        totals.samples += stats.samples;
        totals.early_terminations += stats.early_terminations;
        totals.failed_tiles += stats.failed_tiles;
        if frame.covered_pixels() == 0 {
            anyhow::bail!("frame {f} rendered nothing");
        }
        last = Some(frame);
    }
    if totals.failed_tiles > 0 {
        anyhow::bail!("{} tile(s) failed to render", totals.failed_tiles);
    }
    if let (Some(path), Some(frame)) = (&cli.out, &last) {
        write_png(frame, viewport, path)?;
    }
    Ok((frames_ms, totals))
}

/// `base` rotated about its focal point's vertical axis by `degrees`.
fn orbit(base: &Camera, degrees: f64) -> Camera {
    let (s, c) = degrees.to_radians().sin_cos();
    let fp = base.focal_point;
    let d = [
        base.position[0] - fp[0],
        base.position[1] - fp[1],
        base.position[2] - fp[2],
    ];
    Camera {
        position: [fp[0] + c * d[0] + s * d[2], base.position[1], fp[2] - s * d[0] + c * d[2]],
        ..*base
    }
}

fn write_png(frame: &RayCastImage, viewport: [usize; 2], path: &Path) -> anyhow::Result<()> {
    let (w, h) = (u32::try_from(viewport[0])?, u32::try_from(viewport[1])?);
    let mut surface = Rgba8Surface::new(w, h)?;
    surface.clear([0, 0, 0, 255]);
    let mut helper = ImageDisplayHelper::new();
    helper.set_pixel_scale(frame.pixel_scale())?;
    helper.blit(&mut surface, &frame.as_tile()?, Rect::new(0, 0, w, h), (w, h))?;
    surface.save_png(path)?;
    tracing::info!(path = %path.display(), "wrote frame");
    Ok(())
}

fn time_stream(cli: &Cli) -> anyhow::Result<Vec<f64>> {
    let source = Node::with_opts(AnalyticImageSource::cube(cli.volume), ExecutiveOpts::in_memory());
    let smooth = Node::with_opts(ImageBoxSmooth::new(1), ExecutiveOpts::in_memory());
    smooth.set_input_connection(0, &source, 0)?;

    let whole = smooth.update().context("whole-extent update")?;
    let reference = as_image(&whole)?
        .scalars()
        .cloned()
        .context("smoothed image has no scalars")?;
    let pieces = smp::estimated_thread_count().max(2) * 2;

    let mut frames_ms = Vec::with_capacity(cli.frames as usize);
    for f in 0..cli.frames {
        source.modified();
        let t0 = Instant::now();
        let streamed = Executive::update_pieces(&smooth, 0, pieces, 1)
            .with_context(|| format!("stream frame {f}"))?;
        let assembled = assemble_image(&streamed)?;
        frames_ms.push(elapsed_ms(t0));

        let got = assembled
            .scalars()
            .context("assembled image has no scalars")?;
        if got.number_of_tuples() != reference.number_of_tuples() {
            anyhow::bail!(
                "assembled {} points, expected {}",
                got.number_of_tuples(),
                reference.number_of_tuples()
            );
        }
        let worst = (0..got.number_of_tuples())
            .map(|t| (got.component(t, 0) - reference.component(t, 0)).abs())
            .fold(0.0, f64::max);
        if worst > 1e-9 {
            anyhow::bail!("streamed result differs from the whole-extent result by {worst}");
        }
    }
    Ok(frames_ms)
}

fn time_range(cli: &Cli, ctx: &SmpContext) -> anyhow::Result<Vec<f64>> {
    let n = cli.size.width * cli.size.height * 16;
    let values: Vec<f64> = (0..n)
        .map(|i| ((i as f64) * 0.618_033_988_7).fract() * 2000.0 - 1000.0)
        .collect();
    let expected = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let mut array = AosArray::from_vec(1, values)?.named("range");

    let mut frames_ms = Vec::with_capacity(cli.frames as usize);
    for f in 0..cli.frames {
        array.modified();
        let t0 = Instant::now();
        let got = array.range(0);
        frames_ms.push(elapsed_ms(t0));
        if got != expected {
            anyhow::bail!("frame {f}: range {got:?}, expected {expected:?}");
        }
    }
    tracing::debug!(values = n, threads = ctx.estimated_thread_count(), "range test done");
    Ok(frames_ms)
}
