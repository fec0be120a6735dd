//! Tank Waves - headless driver
//!
//! Runs the game with the demo pilot at the keys, rendering every frame into
//! a vertex buffer, and logs what happens.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use tank_waves::GameConfig;
use tank_waves::input::{InputOutcome, apply_key_event};
use tank_waves::pilot::DemoPilot;
use tank_waves::renderer::{VertexCanvas, draw_frame};
use tank_waves::sim::{GameEvent, Session, Team, format_mm_ss, tick};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Variant {
    /// Small arena with timed enemy waves
    Arena,
    /// Larger field with a fixed starting roster
    Roster,
}

#[derive(Parser, Debug)]
#[command(name = "tank-waves")]
#[command(about = "Top-down tank survival, played by a seeded demo pilot")]
struct Cli {
    /// JSON config file; overrides --variant
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Variant::Arena)]
    variant: Variant,
    /// Frames to run
    #[arg(long, default_value_t = 4_000)]
    frames: u32,
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Pace frames at the tick length instead of running flat out
    #[arg(long)]
    realtime: bool,
}

fn load_config(cli: &Cli) -> Result<GameConfig> {
    match &cli.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(match cli.variant {
            Variant::Arena => GameConfig::arena(),
            Variant::Roster => GameConfig::roster(),
        }),
    }
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::Started => log::info!("Round started"),
        GameEvent::WaveSpawned { wave, enemies } => {
            log::info!("Wave {wave} incoming ({enemies} enemies)")
        }
        GameEvent::GameOver { survived_ms } => {
            log::info!("GAME OVER after {}", format_mm_ss(*survived_ms))
        }
        GameEvent::ReinforcementsArrived { scrap, allies } => {
            log::info!("{allies} allies rose from scrap {scrap}")
        }
        GameEvent::EnemyScrapped(id) => log::debug!("Enemy {id} ran out of fuel"),
        GameEvent::AllyExpired(id) => log::debug!("Ally {id} expired"),
        GameEvent::ShotFired { shooter, bullet } => log::trace!("{shooter} fired {bullet}"),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::info!("Tank Waves starting (seed {})", cli.seed);

    let config = load_config(&cli)?;
    let frame_time = Duration::from_millis(u64::from(config.tick_ms));
    let mut session = Session::new(config).context("failed to create session")?;
    let mut pilot = DemoPilot::new(cli.seed);
    let mut canvas = VertexCanvas::new();
    let mut games = 0u32;

    let mut frame = 0;
    'frames: while frame < cli.frames {
        let frame_start = Instant::now();

        for event in pilot.next_events(&session) {
            if apply_key_event(&mut session, event) == InputOutcome::Quit {
                log::info!("Quit requested");
                break 'frames;
            }
        }

        draw_frame(&mut canvas, &session);
        tick(&mut session);

        for event in session.drain_events() {
            if matches!(event, GameEvent::GameOver { .. }) {
                games += 1;
            }
            log_event(&event);
        }

        if cli.realtime {
            if let Some(rest) = frame_time.checked_sub(frame_start.elapsed()) {
                std::thread::sleep(rest);
            }
        }
        frame += 1;
    }

    let clock = session.clock();
    println!("frames run:      {frame}");
    println!("games lost:      {games}");
    println!("current time:    {}", format_mm_ss(clock.survival_ms()));
    println!("waves this game: {}", session.waves().wave_count);
    println!(
        "live entities:   {} ({} enemies, {} allies)",
        session.entity_count(),
        session.team_count(Team::Enemy),
        session.team_count(Team::Ally)
    );
    println!("last frame:      {} triangles", canvas.triangle_count());
    Ok(())
}
