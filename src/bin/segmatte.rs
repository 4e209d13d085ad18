use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use segmatte::{
    BackendKind, BackgroundRequest, EffectConfig, FsBackgroundLoader, MattePipeline,
    ModelPolarity, Rgba8, SegmentationMasks, VideoFrame,
};

#[derive(Parser, Debug)]
#[command(name = "segmatte", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a single frame as a PNG.
    Frame(FrameArgs),
    /// Composite every PNG of a directory in name order, keeping temporal state.
    Sequence(SequenceArgs),
}

#[derive(Args, Debug)]
struct EffectArgs {
    /// Effect configuration JSON; missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Background image (or video with the `media-ffmpeg` feature).
    #[arg(long, conflicts_with = "color")]
    background: Option<String>,

    /// Solid background colour, `#RRGGBB` or `#RRGGBBAA`.
    #[arg(long)]
    color: Option<String>,

    /// Blur the background instead of replacing it: gaussian sigma in pixels.
    #[arg(long, requires = "blur_radius")]
    blur_intensity: Option<f32>,

    /// Blur sampling extent in pixels.
    #[arg(long, requires = "blur_intensity")]
    blur_radius: Option<f32>,

    /// Masks come from a binary selfie model (inverted polarity).
    #[arg(long)]
    binary_model: bool,

    /// Backend to use (`cpu`, or `gpu` when built with the `gpu` feature).
    #[arg(long, default_value = "cpu")]
    backend: String,
}

#[derive(Args, Debug)]
struct FrameArgs {
    /// Input frame (any format the `image` crate reads).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Category plane as 8-bit grayscale.
    #[arg(long)]
    category: PathBuf,

    /// Confidence plane as 8-bit grayscale.
    #[arg(long)]
    confidence: PathBuf,

    /// Feed the same input this many times before writing, to let the mask settle.
    #[arg(long, default_value_t = 1)]
    warmup: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Also write the smoothed mask as a grayscale PNG.
    #[arg(long)]
    mask_out: Option<PathBuf>,

    #[command(flatten)]
    effect: EffectArgs,
}

#[derive(Args, Debug)]
struct SequenceArgs {
    /// Directory of frame PNGs.
    #[arg(long)]
    frames: PathBuf,

    /// Directory of category PNGs, named like the frames. Missing files mean "no mask yet".
    #[arg(long)]
    categories: PathBuf,

    /// Directory of confidence PNGs, named like the frames.
    #[arg(long)]
    confidences: PathBuf,

    /// Output directory.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    effect: EffectArgs,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Sequence(args) => cmd_sequence(args),
    }
}

fn build_pipeline(args: &EffectArgs) -> anyhow::Result<(MattePipeline, ModelPolarity)> {
    let mut config = match &args.config {
        Some(path) => EffectConfig::from_json_path(path)?,
        None => EffectConfig::default(),
    };
    if let (Some(intensity), Some(radius)) = (args.blur_intensity, args.blur_radius) {
        config.blur_intensity = intensity;
        config.blur_kernel_radius = radius;
    }

    let kind: BackendKind = args.backend.parse()?;
    let backend = segmatte::create_backend(kind)?;
    let mut pipeline =
        MattePipeline::new(backend, Arc::new(FsBackgroundLoader::new(".")), config)?;

    let request = match (&args.background, &args.color) {
        (Some(url), _) => Some(BackgroundRequest::from_url(url.as_str())),
        (None, Some(hex)) => Some(BackgroundRequest::Color(Rgba8::parse_hex(hex)?)),
        (None, None) => None,
    };
    if let Some(request) = request {
        pipeline.set_background(&request)?;
        for report in pipeline.background_reports() {
            eprintln!("warning: {}", report.error);
        }
    }

    let polarity = if args.binary_model {
        ModelPolarity::Binary
    } else {
        ModelPolarity::Multiclass
    };
    Ok((pipeline, polarity))
}

fn read_frame(path: &Path) -> anyhow::Result<VideoFrame> {
    let img = image::open(path)
        .with_context(|| format!("read frame '{}'", path.display()))?
        .to_rgba8();
    let (w, h) = img.dimensions();
    Ok(VideoFrame::new(w, h, img.into_raw())?)
}

fn read_masks(
    category: &Path,
    confidence: &Path,
    polarity: ModelPolarity,
) -> anyhow::Result<SegmentationMasks> {
    let cat = image::open(category)
        .with_context(|| format!("read category plane '{}'", category.display()))?
        .to_luma8();
    let conf = image::open(confidence)
        .with_context(|| format!("read confidence plane '{}'", confidence.display()))?
        .to_luma8();
    if cat.dimensions() != conf.dimensions() {
        anyhow::bail!(
            "category plane is {:?} but confidence plane is {:?}",
            cat.dimensions(),
            conf.dimensions()
        );
    }
    let (w, h) = cat.dimensions();
    Ok(SegmentationMasks::from_gray8(
        w,
        h,
        cat.as_raw(),
        conf.as_raw(),
        polarity,
    )?)
}

fn write_png(
    path: &Path,
    data: &[u8],
    width: u32,
    height: u32,
    color: image::ColorType,
) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(path, data, width, height, color, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", path.display()))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (mut pipeline, polarity) = build_pipeline(&args.effect)?;
    let frame = read_frame(&args.in_path)?;
    let masks = read_masks(&args.category, &args.confidence, polarity)?;

    for _ in 1..args.warmup {
        pipeline.render(frame.clone(), Some(&masks))?;
    }
    let out = pipeline.render(frame, Some(&masks))?;

    write_png(
        &args.out,
        out.data(),
        out.width(),
        out.height(),
        image::ColorType::Rgba8,
    )?;
    if let Some(mask_out) = &args.mask_out {
        let mask = pipeline
            .mask_snapshot()?
            .context("no mask was produced (effects disabled?)")?;
        write_png(
            mask_out,
            &mask.to_gray8(),
            mask.size().width,
            mask.size().height,
            image::ColorType::L8,
        )?;
    }

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_sequence(args: SequenceArgs) -> anyhow::Result<()> {
    let (mut pipeline, polarity) = build_pipeline(&args.effect)?;

    let mut names: Vec<_> = std::fs::read_dir(&args.frames)
        .with_context(|| format!("list frames in '{}'", args.frames.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
        })
        .filter_map(|p| p.file_name().map(|n| n.to_owned()))
        .collect();
    names.sort();
    if names.is_empty() {
        anyhow::bail!("no PNG frames found in '{}'", args.frames.display());
    }

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;

    let mut masked = 0usize;
    for name in &names {
        let frame = read_frame(&args.frames.join(name))?;
        let category = args.categories.join(name);
        let confidence = args.confidences.join(name);
        let masks = if category.is_file() && confidence.is_file() {
            masked += 1;
            Some(read_masks(&category, &confidence, polarity)?)
        } else {
            None
        };

        let out = pipeline.render(frame, masks.as_ref())?;
        write_png(
            &args.out.join(name),
            out.data(),
            out.width(),
            out.height(),
            image::ColorType::Rgba8,
        )?;
    }

    let stats = pipeline.backend_stats();
    eprintln!(
        "wrote {} frames to {} ({masked} with masks, {} composited on {})",
        names.len(),
        args.out.display(),
        stats.composites,
        pipeline.backend_name()
    );
    Ok(())
}
