//! CLI for replaying recorded face-tracker output through a mask and
//! exporting the resulting mesh.
//!
//! Usage:
//!   masked-face profiles                          # List available masks
//!   masked-face profiles --json                   # Same, as JSON
//!   masked-face replay capture.bin --mask mask-A  # Deform and export output.obj
//!   masked-face replay capture.json -o face.obj --color-frame frame.png

use clap::{Args as ClapArgs, Parser, Subcommand};
use masked_face::{
    FrameStatus, ImageSize, ProfileSet, Recording, Session, SessionConfig, SkipReason,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "masked-face")]
#[command(author, version, about = "Face mesh masks and OBJ export", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the deformation profiles
    Profiles {
        /// Profile table (default: built-in masks)
        #[arg(long)]
        profiles: Option<PathBuf>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Run a recorded tracking session and export the final mesh
    Replay(ReplayArgs),
}

#[derive(ClapArgs, Debug)]
struct ReplayArgs {
    /// Recording file (.json, .bin or .bz2)
    #[arg(required = true)]
    recording: PathBuf,

    /// Mask to apply
    #[arg(short, long)]
    mask: Option<String>,

    /// OBJ output path (default: from config, else output.obj)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Profile table (default: built-in masks)
    #[arg(long)]
    profiles: Option<PathBuf>,

    /// Session config file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Color frame whose dimensions override the recording's image size
    #[arg(long, conflicts_with_all = ["width", "height"])]
    color_frame: Option<PathBuf>,

    /// Color image width override
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Color image height override
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Print the replay summary as JSON
    #[arg(short, long)]
    json: bool,
}

#[derive(Serialize)]
struct ProfileOutput {
    name: String,
    keywords: Vec<String>,
    tint: [u8; 3],
    scale_x: f32,
    scale_y: f32,
    vertices_moved: usize,
}

#[derive(Serialize, Default)]
struct ReplaySummary {
    recording: String,
    output: String,
    mask: String,
    width: u32,
    height: u32,
    frames: usize,
    deformed: usize,
    not_tracked: usize,
    rejected: usize,
    vertices: usize,
    triangles: usize,
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match &args.command {
        Commands::Profiles { profiles, json } => list_profiles(profiles.as_deref(), *json),
        Commands::Replay(replay_args) => replay(replay_args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_profiles(path: Option<&Path>) -> masked_face::Result<ProfileSet> {
    match path {
        Some(path) => {
            log::info!("Loading profiles from {:?}", path);
            ProfileSet::load(path)
        }
        None => ProfileSet::builtin(),
    }
}

fn list_profiles(path: Option<&Path>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let profiles = load_profiles(path)?;

    let output: Vec<ProfileOutput> = profiles
        .iter()
        .map(|p| ProfileOutput {
            name: p.name.clone(),
            keywords: p.keywords.clone(),
            tint: p.tint,
            scale_x: p.scale.x,
            scale_y: p.scale.y,
            vertices_moved: p.entries().len(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for p in &output {
        println!(
            "{:<10} keywords: {:<12} tint: #{:02x}{:02x}{:02x}  scale: ({}, {})  vertices: {}",
            p.name,
            p.keywords.join(","),
            p.tint[0],
            p.tint[1],
            p.tint[2],
            p.scale_x,
            p.scale_y,
            p.vertices_moved
        );
    }
    Ok(())
}

fn replay(args: &ReplayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let ReplayArgs {
        recording: recording_path,
        mask,
        output,
        profiles,
        config,
        color_frame,
        width,
        height,
        json,
    } = args;

    let config = match config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };

    let mut builder = Session::builder()
        .profiles(load_profiles(profiles.as_deref())?)
        .config(config);
    if let Some(mask) = mask {
        builder = builder.initial_profile(mask.clone());
    }
    if let Some(output) = output {
        builder = builder.export_path(output.clone());
    }
    let mut session = builder.build()?;

    log::info!("Loading recording {:?}", recording_path);
    let recording = Recording::load(recording_path)?;

    let image = match (color_frame, width, height) {
        (Some(path), _, _) => {
            let (w, h) = image::image_dimensions(path)?;
            ImageSize::new(w, h)
        }
        (None, Some(w), Some(h)) => ImageSize::new(*w, *h),
        _ => recording.image,
    };

    let mut summary = ReplaySummary {
        recording: recording_path.display().to_string(),
        output: session.config().export_path.display().to_string(),
        mask: session.active_profile().name.clone(),
        width: image.width,
        height: image.height,
        frames: recording.num_frames(),
        ..Default::default()
    };

    for frame in &recording.frames {
        match session.process_frame(frame, image) {
            FrameStatus::Deformed { first_track } => {
                if first_track {
                    log::info!("Face recognized");
                }
                summary.deformed += 1;
            }
            FrameStatus::Skipped(SkipReason::NotTracked) => summary.not_tracked += 1,
            FrameStatus::Skipped(_) => summary.rejected += 1,
        }
    }

    session.export_default()?;

    if let Some(mesh) = session.output() {
        summary.vertices = mesh.num_vertices();
        summary.triangles = mesh.num_triangles();
    }

    if *json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", format_human_readable(&summary));
    }

    Ok(())
}

fn format_human_readable(summary: &ReplaySummary) -> String {
    let mut s = String::new();

    s.push_str(&format!("Recording: {} ({}x{})\n", summary.recording, summary.width, summary.height));
    s.push_str(&format!("Mask: {}\n", summary.mask));
    s.push_str(&format!(
        "Frames: {} ({} deformed, {} not tracked, {} rejected)\n",
        summary.frames, summary.deformed, summary.not_tracked, summary.rejected
    ));
    s.push_str(&format!(
        "Mesh: {} vertices, {} triangles -> {}",
        summary.vertices, summary.triangles, summary.output
    ));

    s
}
