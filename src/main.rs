use seqplay::cli::Args;
use seqplay::{Callbacks, Player, PlayerConfig, SequenceEvent};

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{select, unbounded};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::Duration;

/// How often the main thread reports progress while waiting
const STATUS_INTERVAL: Duration = Duration::from_secs(1);

fn init_logging(args: &Args) -> Result<()> {
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .clone()
            .unwrap_or_else(|| PathBuf::from("seqplay.log"));
        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging, respects RUST_LOG if set
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<PlayerConfig> {
    let mut config = match &args.config {
        Some(path) => PlayerConfig::load(path)?,
        None => PlayerConfig::default(),
    };

    if let Some(looping) = args.looping() {
        config.looping = looping;
    }
    if let Some(ms) = args.interval_ms {
        anyhow::ensure!(ms > 0, "--interval must be positive, got {}", ms);
        config.tick_interval_ms = ms as u64;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    info!("Seqplay starting...");
    debug!("Command-line args: {:?}", args);

    let config = load_config(&args)?;
    let (finished_tx, finished_rx) = unbounded::<()>();

    let callbacks = Callbacks::new()
        .on(SequenceEvent::FirstFrameReady, |seq| {
            seq.play();
            Ok(())
        })
        .on(SequenceEvent::SequenceLoaded, |seq| {
            info!("All {} frames of '{}' loaded", seq.total_frames(), seq.name());
            Ok(())
        })
        .on(SequenceEvent::SequenceFinished, move |_| {
            finished_tx.send(()).context("main thread gone")
        });

    let mut player = Player::with_callbacks(config, callbacks);
    player.init_from_folder(&args.folder)?;

    if player.total_frames() == 0 {
        warn!("No images found in {}", args.folder.display());
        player.dispose();
        return Ok(());
    }

    if let Some(start) = args.start_frame {
        if start < player.total_frames() {
            player.jump(start);
        } else {
            warn!("--frame {} out of range (0..{})", start, player.total_frames());
        }
    }

    let mut laps = 0;
    while laps < args.laps {
        select! {
            recv(finished_rx) -> msg => {
                if msg.is_err() {
                    break;
                }
                laps += 1;
                info!("Lap {}/{} finished", laps, args.laps);
                // Not looping: the sequence stopped at frame 0, run it again
                if laps < args.laps && !player.is_playing() {
                    player.play();
                }
            }
            default(STATUS_INTERVAL) => {
                if !player.is_running() {
                    warn!("Tick loop halted");
                    break;
                }
                debug!(
                    "'{}' frame {}/{} ({:?}, loaded {:.0}%)",
                    player.name(),
                    player.current_frame(),
                    player.total_frames(),
                    player.mode(),
                    player.load_progress() * 100.0
                );
            }
        }
    }

    let (width, height) = player.with_output(|out| (out.width(), out.height()));
    info!("Done: '{}', {} laps, output {}x{}", player.name(), laps, width, height);
    player.dispose();
    Ok(())
}
