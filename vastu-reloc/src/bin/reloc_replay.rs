//! Offline replay of recorded relocalization sessions.
//!
//! Feeds a JSON-lines frame log through the engine and prints state
//! transitions, corrections and the final snapshot.
//!
//! # Usage
//!
//! ```bash
//! # Replay against a saved mesh snapshot
//! reloc_replay --frames session.jsonl --mesh-artifact kitchen.mesh.json
//!
//! # With room signature and custom tuning, snapshot every 30 frames
//! reloc_replay --frames session.jsonl --mesh-artifact kitchen.mesh.json \
//!     --room-artifact kitchen.room.json --config configs/config.yaml --every 30
//! ```

use std::path::PathBuf;

use clap::Parser;
use env_logger::{Builder, Env};

use vastu_reloc::io::{FrameLogReader, load_mesh_artifact, load_room_artifact};
use vastu_reloc::{EngineEffect, RelocConfig, RelocalizationEngine};

#[derive(Parser)]
#[command(name = "reloc_replay")]
#[command(about = "Replay a recorded frame log through the relocalization engine")]
struct Args {
    /// JSON-lines frame log
    #[arg(short, long)]
    frames: PathBuf,

    /// Saved mesh snapshot artifact
    #[arg(short, long)]
    mesh_artifact: Option<PathBuf>,

    /// Saved room signature artifact
    #[arg(short, long)]
    room_artifact: Option<PathBuf>,

    /// YAML config (defaults to configs/config.yaml, then built-in defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print a snapshot every N frames (0 disables)
    #[arg(long, default_value_t = 0)]
    every: u64,
}

fn main() {
    Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => RelocConfig::load(path)?,
        None => RelocConfig::load_default()?,
    };

    let mesh = args
        .mesh_artifact
        .as_deref()
        .map(load_mesh_artifact)
        .transpose()?;
    let room = args
        .room_artifact
        .as_deref()
        .map(load_room_artifact)
        .transpose()?;
    if mesh.is_none() && room.is_none() {
        log::warn!("No artifacts given; only the native tracker can localize");
    }

    let mut engine = RelocalizationEngine::new(config);
    let mut loaded = false;
    let mut frames = 0u64;
    let mut corrections = 0u32;

    for frame in FrameLogReader::open(&args.frames)? {
        let frame = frame?;
        if !loaded {
            engine.load_map(mesh.clone(), room.clone(), frame.timestamp);
            loaded = true;
        }

        let output = engine.process_frame(&frame);
        frames += 1;

        if let Some(transition) = output.transition {
            println!(
                "[{:8.2}s] {:?} -> {:?}",
                frame.timestamp, transition.from, transition.to
            );
        }
        for effect in &output.effects {
            match effect {
                EngineEffect::ApplyWorldOriginCorrection(t) => {
                    corrections += 1;
                    println!(
                        "[{:8.2}s] correction yaw={:.1}° t=({:.2}, {:.2})",
                        frame.timestamp, t.yaw_deg, t.tx, t.tz
                    );
                }
            }
        }
        if args.every > 0 && frames % args.every == 0 {
            println!("{}", serde_json::to_string(&output.snapshot)?);
        }
    }

    println!();
    println!("Replay Summary");
    println!("==============");
    println!("Frames: {}", frames);
    println!("Corrections: {}", corrections);
    println!(
        "Final snapshot:\n{}",
        serde_json::to_string_pretty(&engine.snapshot())?
    );
    Ok(())
}
