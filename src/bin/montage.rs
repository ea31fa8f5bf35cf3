use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use montage::{
    Automatable, Clip, EngineConfig, Fps, FrameSpan, ParamValue, ParameterRegistry, Playback,
    Rect, RenderPipeline, Rgba8Premul, Serializer, SolidColour, Timeline, Track, TransformEffect,
    Vec2,
};

#[derive(Parser, Debug)]
#[command(name = "montage", version)]
struct Cli {
    /// Engine configuration JSON. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame of a timeline as a PNG.
    Frame(FrameArgs),
    /// Run the playback clock over a timeline and report timing.
    Play(PlayArgs),
    /// Write a small sample timeline.
    Demo(DemoArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input timeline JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    frame: i64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Override render worker threads.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Input timeline JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Wall-clock seconds to play for.
    #[arg(long, default_value_t = 2.0)]
    seconds: f64,

    /// First frame.
    #[arg(long, default_value_t = 0)]
    from: i64,
}

#[derive(Parser, Debug)]
struct DemoArgs {
    /// Output timeline JSON path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    let registry = ParameterRegistry::with_builtins()?;
    match cli.cmd {
        Command::Frame(args) => cmd_frame(&registry, config, args),
        Command::Play(args) => cmd_play(&registry, config, args),
        Command::Demo(args) => cmd_demo(&registry, args),
    }
}

fn cmd_frame(
    registry: &ParameterRegistry,
    config: EngineConfig,
    args: FrameArgs,
) -> anyhow::Result<()> {
    let mut timeline = Serializer::new(registry)
        .from_path(&args.in_path)
        .with_context(|| format!("load timeline '{}'", args.in_path.display()))?;
    timeline.set_playhead(args.frame)?;

    let mut opts = config.render;
    if args.threads.is_some() {
        opts.threads = args.threads;
    }
    let pipeline = RenderPipeline::new(opts)?;
    let (frame, stats) = pipeline.render_frame(&mut timeline)?;
    tracing::info!(?stats, "frame rendered");

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_rgba(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_play(
    registry: &ParameterRegistry,
    config: EngineConfig,
    args: PlayArgs,
) -> anyhow::Result<()> {
    let mut timeline = Serializer::new(registry)
        .from_path(&args.in_path)
        .with_context(|| format!("load timeline '{}'", args.in_path.display()))?;
    let mut opts = config.playback;
    opts.fps = timeline.fps();

    let mut playback = Playback::new(&opts)?;
    playback.play(&mut timeline, args.from)?;

    let budget = Duration::from_secs_f64(args.seconds.max(0.0));
    let wait = playback.clock().interval() * 4;
    let started = Instant::now();
    let mut ticks = 0usize;
    let mut worst = Duration::ZERO;
    let mut total_late = Duration::ZERO;
    while started.elapsed() < budget {
        let Some(tick) = playback.clock().recv_timeout(wait) else {
            continue;
        };
        ticks += 1;
        worst = worst.max(tick.late);
        total_late += tick.late;
        if playback.advance(&mut timeline, 1)? == 0 {
            break;
        }
    }
    let reached = timeline.playhead();
    playback.stop(&mut timeline)?;

    let mean = if ticks == 0 {
        Duration::ZERO
    } else {
        total_late / u32::try_from(ticks).unwrap_or(u32::MAX)
    };
    eprintln!(
        "{ticks} ticks in {:.2?}, playhead reached {reached}, mean late {mean:?}, \
         worst late {worst:?}",
        started.elapsed()
    );
    Ok(())
}

fn cmd_demo(registry: &ParameterRegistry, args: DemoArgs) -> anyhow::Result<()> {
    let mut timeline = Timeline::with_length(150, Fps::new(30, 1)?)?;

    let mut background = Track::new(registry).with_name("Background");
    background.add_clip(
        Clip::new(
            registry,
            FrameSpan::new(0, 150)?,
            Box::new(SolidColour::new(Rgba8Premul::from_straight_rgba(24, 32, 64, 255))),
        )
        .with_name("Backdrop"),
    );

    let mut shapes = Track::new(registry).with_name("Shapes");
    let mut square = Clip::new(
        registry,
        FrameSpan::new(15, 120)?,
        Box::new(SolidColour::with_rect(
            Rgba8Premul::from_straight_rgba(240, 180, 40, 255),
            Rect::new(0.0, 0.0, 120.0, 120.0),
        )),
    )
    .with_name("Square");
    let mut slide = TransformEffect::new(registry);
    slide.set_translation(Vec2::new(40.0, 120.0))?;
    {
        let seq = slide
            .automation_mut()
            .require_mut(&TransformEffect::TRANSLATE_X)?;
        seq.add_keyframe(0, ParamValue::Float(40.0))?;
        seq.add_keyframe(119, ParamValue::Float(480.0))?;
    }
    square.effects_mut().push(Box::new(slide));
    {
        let seq = square.automation_mut().require_mut(&Clip::OPACITY)?;
        seq.add_keyframe(0, ParamValue::Double(0.0))?;
        seq.add_keyframe(30, ParamValue::Double(1.0))?;
    }
    shapes.add_clip(square);

    timeline.add_track(background);
    timeline.add_track(shapes);

    let json = Serializer::new(registry).to_json_string(&timeline)?;
    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, json)
        .with_context(|| format!("write timeline '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}
