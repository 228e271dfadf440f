use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use reelcast::{
    CaptureState, ControllerEvent, DirectorySaver, FfmpegRecorder, FixedStep, PlayOrigin, Player,
    Production, Suggestions, is_ffmpeg_on_path, probe_video,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reelcast", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a production through once and record it as WebM (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Composite the frame at a timeline position as a PNG.
    Frame(FrameArgs),
    /// Print a production's clip sequence, or a media file's metadata, as JSON.
    Probe(ProbeArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input production JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output WebM path.
    #[arg(long)]
    out: PathBuf,

    /// Suggestion JSON merged over the production before rendering.
    #[arg(long)]
    suggestions: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input production JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Timeline position in seconds.
    #[arg(long, default_value_t = 0.0)]
    at: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Suggestion JSON merged over the production.
    #[arg(long)]
    suggestions: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    /// Production JSON or media file.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(serde::Serialize)]
struct ProbedClip {
    index: usize,
    name: String,
    start_secs: f64,
    duration_secs: f64,
    width: u32,
    height: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("reelcast=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Probe(args) => cmd_probe(args),
    }
}

fn load_production(path: &Path, suggestions: Option<&Path>) -> anyhow::Result<Production> {
    let mut production = Production::from_path(path)?;
    if let Some(s) = suggestions {
        let text = std::fs::read_to_string(s)
            .with_context(|| format!("read suggestions '{}'", s.display()))?;
        production.apply_suggestions(Suggestions::from_json_str(&text)?);
        production.validate()?;
    }
    Ok(production)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    anyhow::ensure!(is_ffmpeg_on_path(), "render requires `ffmpeg` on PATH");
    let mut production = load_production(&args.in_path, args.suggestions.as_deref())?;
    let file_name = args
        .out
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .context("output path must name a file")?;
    let out_dir = args
        .out
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    production.settings.export_file_name = file_name;

    let mut controller = production
        .build_controller()?
        .with_recorder(Box::new(FfmpegRecorder::new()))
        .with_saver(Box::new(DirectorySaver::new(out_dir)));

    let total = controller.registry().total_duration_secs();
    let mut scheduler = FixedStep::from_fps(controller.settings().capture_fps);
    controller.start_recording(PlayOrigin::UserGesture)?;
    let frames = controller.run(&mut scheduler, total + 1.0)?;
    if controller.capture_state() == CaptureState::Recording {
        controller.stop_recording()?;
    }

    for event in controller.drain_events() {
        match event {
            ControllerEvent::RecordingSaved { file_name, bytes } => {
                tracing::info!(file_name = %file_name, bytes, frames, "render finished");
            }
            ControllerEvent::RecordingFailed { reason } => {
                anyhow::bail!("recording failed: {reason}");
            }
            _ => {}
        }
    }

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let production = load_production(&args.in_path, args.suggestions.as_deref())?;
    let mut controller = production.build_controller()?;
    controller.seek(args.at)?;
    let frame = controller.tick(0.0)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_probe(args: ProbeArgs) -> anyhow::Result<()> {
    let is_production = args
        .in_path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if !is_production {
        let info = probe_video(&args.in_path)?;
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    let production = load_production(&args.in_path, None)?;
    let registry = production.build_registry()?;
    let clips: Vec<ProbedClip> = registry
        .iter()
        .enumerate()
        .map(|(index, clip)| {
            let (width, height) = clip.source().dimensions();
            ProbedClip {
                index,
                name: clip.display_name().to_string(),
                start_secs: registry.start_offset_secs(index),
                duration_secs: clip.duration_secs(),
                width,
                height,
            }
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&clips)?);
    Ok(())
}
