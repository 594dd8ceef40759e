//! Gaze tracker shell wiring stdin features to stdout coordinates.
//!
//! The landmark front-end writes one line per frame (`lx ly rx ry nx ny`,
//! or `-` when no face was detected) and the cursor actuator reads the
//! emitted `x y` lines. Lines starting with `:` are control commands,
//! mirroring the keyboard surface of the interactive tracker:
//! `:c [points]` recalibrate, `:d` delete calibration, `:s` toggle cursor
//! control, `:x` toggle smoothing, `:+`/`:-` adjust gain, `:z` reset
//! filters, `:q` save and quit.

use anyhow::Result;
use clap::Parser;
use gaze_tracker::config::Config;
use gaze_tracker::features::GazeFeatures;
use gaze_tracker::session::{command_channel, CalibrationProgress, Command, SessionState, TrackerSession};
use log::{info, warn};
use std::io::{self, BufRead, Write};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Active screen width in pixels
    #[arg(long, default_value = "1920")]
    width: u32,

    /// Active screen height in pixels
    #[arg(long, default_value = "1080")]
    height: u32,

    /// Calibration point count (9, 15 or 21)
    #[arg(short, long, default_value = "9")]
    points: usize,

    /// Filter type (blend, kalman, moving_average, exponential, none)
    #[arg(short, long)]
    filter: Option<String>,

    /// Directory holding the calibration artifacts
    #[arg(long, default_value = ".")]
    data_dir: String,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    let mut config = if let Some(config_path) = &args.config {
        info!("loading configuration from: {config_path}");
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("failed to load config file: {e}. Using defaults.");
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    if let Some(filter) = args.filter {
        config.filter.default_filter = filter;
    }
    config.calibration.default_points = args.points;
    let default_points = config.calibration.default_points;

    let mut session = TrackerSession::new(config, args.width, args.height, &args.data_dir)?;
    let (commands, command_queue) = command_channel();

    info!(
        "gaze tracker ready ({}x{}), state: {:?}",
        args.width,
        args.height,
        session.state()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();

        if let Some(rest) = line.strip_prefix(':') {
            if let Some(command) = parse_command(rest, default_points) {
                commands.send(command)?;
            } else {
                warn!("unknown command: :{rest}");
            }
            session.drain_commands(&command_queue);
            if !session.is_running() {
                break;
            }
            continue;
        }

        let features = parse_frame(line);

        if session.state() == SessionState::Calibrating {
            if let Some(f) = features {
                match session.calibration_frame(&f) {
                    Ok(CalibrationProgress::Collecting { point, total, collected, needed: _ }) => {
                        if collected == 1 {
                            info!("collecting target {}/{total}", point + 1);
                        }
                    }
                    Ok(CalibrationProgress::PointComplete { completed, total }) => {
                        info!("target {completed}/{total} done");
                    }
                    Ok(CalibrationProgress::Finished { train_error_x, train_error_y }) => {
                        info!("calibration complete, MAE x={train_error_x:.1}px y={train_error_y:.1}px");
                    }
                    Err(e) => warn!("calibration error: {e}"),
                }
            }
            continue;
        }

        if let Some((x, y)) = session.process_frame(features.as_ref()) {
            writeln!(stdout, "{x} {y}")?;
            stdout.flush()?;
        }
    }

    info!("session ended");
    Ok(())
}

/// Parse a `:` command line into a session command
fn parse_command(input: &str, default_points: usize) -> Option<Command> {
    let mut parts = input.split_whitespace();
    match parts.next()? {
        "c" => {
            let points = parts.next().and_then(|p| p.parse().ok()).unwrap_or(default_points);
            Some(Command::Recalibrate(points))
        }
        "d" => Some(Command::DeleteCalibration),
        "s" => Some(Command::ToggleCursorControl),
        "x" => Some(Command::ToggleSmoothing),
        "+" | "=" => Some(Command::AdjustGain(gaze_tracker::constants::GAIN_STEP)),
        "-" | "_" => Some(Command::AdjustGain(-gaze_tracker::constants::GAIN_STEP)),
        "z" => Some(Command::ResetFilters),
        "q" => Some(Command::QuitAndSave),
        _ => None,
    }
}

/// Parse a frame line into features; `-` or malformed lines mean no face
fn parse_frame(line: &str) -> Option<GazeFeatures> {
    if line.is_empty() || line == "-" {
        return None;
    }

    let values: Vec<f64> = line
        .split_whitespace()
        .filter_map(|v| v.parse().ok())
        .collect();
    if values.len() != 6 {
        return None;
    }

    Some(GazeFeatures::new(
        (values[0], values[1]),
        (values[2], values[3]),
        (values[4], values[5]),
    ))
}
