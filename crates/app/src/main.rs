use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use beat_slideshow_core::{AppConfig, RenderGraph, Session, SessionState};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

fn main() -> beat_slideshow_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            config,
            fps,
            realtime,
            max_seconds,
            pause_at,
            pause_for,
            dump_snapshot,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(fps) = fps {
                config.playback.fps = fps;
                config.validate()?;
            }
            let options = PlayOptions {
                realtime,
                max_seconds,
                pause: pause_at.map(|at| (at, pause_for)),
                dump_snapshot,
            };
            run_play(&config, &options)
        }
        Commands::Timing { config } => run_timing(&load_config(config.as_deref())?),
    }
}

struct PlayOptions {
    realtime: bool,
    max_seconds: f64,
    pause: Option<(f64, f64)>,
    dump_snapshot: bool,
}

fn run_play(config: &AppConfig, options: &PlayOptions) -> beat_slideshow_core::Result<()> {
    let mut session = Session::new(config)?;
    let mut render = RenderGraph::new();
    let step = config.playback.frame_seconds();
    let mut pending_pause = options.pause;

    tracing::info!(
        bpm = config.tempo_bpm,
        images = session.assets().image_count(),
        texts = session.assets().text_count(),
        realtime = options.realtime,
        "starting playback"
    );

    while session.state() == SessionState::Playing && session.elapsed() < options.max_seconds {
        let report = if options.realtime {
            std::thread::sleep(Duration::from_secs_f64(step));
            session.frame(Instant::now(), &mut render)
        } else {
            session.tick(step, &mut render)
        };

        if report.image_advanced {
            let index = session.image().current_index();
            let path = session.assets().image(index).map(|asset| asset.path.as_str());
            tracing::info!(index, ?path, elapsed = session.elapsed(), "showing image");
        }
        if report.text_pair_changed {
            let index = session.text().current_index();
            let path = session.assets().text(index).map(|asset| asset.path.as_str());
            tracing::info!(index, ?path, elapsed = session.elapsed(), "showing text pair");
        }

        if let Some((at, hold)) = pending_pause {
            if session.elapsed() >= at {
                pending_pause = None;
                pause_and_resume(&mut session, hold, options.realtime)?;
            }
        }
    }

    tracing::info!(
        state = ?session.state(),
        elapsed = session.elapsed(),
        frames = render.frames(),
        "playback stopped"
    );

    if options.dump_snapshot {
        println!("{}", session.snapshot().to_json()?);
    }
    Ok(())
}

fn pause_and_resume(
    session: &mut Session,
    hold_seconds: f64,
    realtime: bool,
) -> beat_slideshow_core::Result<()> {
    let Some(snapshot) = session.pause() else {
        return Ok(());
    };
    tracing::debug!(
        image = ?snapshot.image.phase,
        text = ?snapshot.text.phase,
        "captured snapshot"
    );
    if realtime {
        std::thread::sleep(Duration::from_secs_f64(hold_seconds.max(0.0)));
    }
    session.resume()
}

fn run_timing(config: &AppConfig) -> beat_slideshow_core::Result<()> {
    let session = Session::new(config)?;
    let image = session.image().durations();
    let text = session.text().durations();

    println!("tempo: {} bpm, beat {:.3}s", config.tempo_bpm, session.tempo().beat_seconds());
    println!(
        "image: fade in {:.3}s, stay {:.3}s, fade out {:.3}s ({:.3}s per image, {} images)",
        image.fade_in,
        image.stay,
        image.fade_out,
        image.residency(),
        session.assets().image_count()
    );
    println!(
        "text: fade in {:.3}s, stay {:.3}s, add {:.3}s, both stay {:.3}s, both out {:.3}s ({:.3}s per pair, {} texts)",
        text.fade_in,
        text.stay,
        text.add_new_text,
        text.both_stay,
        text.both_out,
        text.pair_length(),
        session.assets().text_count()
    );
    Ok(())
}

fn load_config(path: Option<&Path>) -> beat_slideshow_core::Result<AppConfig> {
    match path {
        Some(path) => {
            tracing::debug!(?path, "loading configuration");
            AppConfig::load(path)
        }
        None => Ok(AppConfig::default()),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Tempo-paced image and text slideshow", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play the slideshow until every image and text has been shown once.
    Play {
        /// JSON configuration file. Built-in defaults are used when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the frame rate used for stepping.
        #[arg(long)]
        fps: Option<u32>,
        /// Pace frames against the wall clock instead of stepping headless.
        #[arg(long)]
        realtime: bool,
        /// Stop after this many seconds of playback.
        #[arg(long, default_value_t = 600.0)]
        max_seconds: f64,
        /// Pause once playback reaches this many seconds.
        #[arg(long)]
        pause_at: Option<f64>,
        /// How long to stay paused (real-time mode only).
        #[arg(long, default_value_t = 1.0)]
        pause_for: f64,
        /// Print the final session snapshot as JSON.
        #[arg(long)]
        dump_snapshot: bool,
    },
    /// Print the beat length and every phase duration.
    Timing {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
