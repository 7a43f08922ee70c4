use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use gesture_link_core::classification::domain::classifier_dispatch::ClassifierDispatch;
use gesture_link_core::classification::infrastructure::model_loader::{
    default_model_dir, load_models, LoadedModels,
};
use gesture_link_core::pipeline::track_gestures_use_case::{
    FrameObserver, FrameReport, TrackGesturesUseCase,
};
use gesture_link_core::shared::settings::Settings;
use gesture_link_core::source::domain::keypoint_source::KeypointSource;
use gesture_link_core::source::infrastructure::json_lines_source::JsonLinesSource;
use gesture_link_core::stabilization::domain::gesture_stabilizer::GestureStabilizer;
use gesture_link_core::stabilization::domain::liveness_tracker::LivenessTracker;
use gesture_link_core::transport::domain::network_emitter::{EmitterConfig, NetworkEmitter};
use gesture_link_core::transport::infrastructure::udp_listener::{
    GestureChangeFilter, UdpListener,
};
use gesture_link_core::transport::infrastructure::udp_sink::UdpSink;

/// Stable hand-gesture signals over UDP from a hand-keypoint stream.
#[derive(Parser)]
#[command(name = "gesture-link", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify keypoint frames and send gestures, positions and liveness.
    ///
    /// The session drains and logs its summary when the input ends. Ctrl-C
    /// terminates the process at once, without the drain or the summary; to
    /// stop a piped session cleanly, close its input instead.
    Track(TrackArgs),
    /// Print datagrams received on a port.
    Listen(ListenArgs),
}

#[derive(Args)]
struct TrackArgs {
    /// JSON-lines keypoint file (reads stdin when omitted).
    #[arg(long)]
    input: Option<PathBuf>,

    /// Settings file (defaults to the per-user settings.json if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Destination host for all datagrams.
    #[arg(long)]
    host: Option<String>,

    /// Port for gesture and liveness messages.
    #[arg(long)]
    gesture_port: Option<u16>,

    /// Port for position messages.
    #[arg(long)]
    position_port: Option<u16>,

    /// Directory holding the ONNX gesture models and their class lists.
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Stabilizer window in seconds.
    #[arg(long)]
    window: Option<f64>,

    /// Share of the window a label needs to become stable (0.5-1.0).
    #[arg(long)]
    threshold: Option<f64>,

    /// Minimum trained-model confidence (0.0-1.0).
    #[arg(long)]
    confidence_floor: Option<f64>,

    /// Seconds without a hand before it is reported lost.
    #[arg(long)]
    liveness_threshold: Option<f64>,

    /// Also send `<label>|<x>|<y>|<confidence>` on each gesture change.
    #[arg(long)]
    combined: bool,

    /// Print every frame's decision to stdout.
    #[arg(long)]
    show_frames: bool,

    /// Write the resolved settings to the settings file before tracking.
    #[arg(long)]
    save_config: bool,
}

#[derive(Args)]
struct ListenArgs {
    /// Port to listen on.
    #[arg(long, default_value = "8000")]
    port: u16,

    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Stop after this many seconds.
    #[arg(long)]
    timeout: Option<f64>,

    /// Print every datagram instead of gesture changes only.
    #[arg(long)]
    all: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Track(args) => run_track(args),
        Command::Listen(args) => run_listen(args),
    }
}

fn run_track(args: TrackArgs) -> Result<(), Box<dyn std::error::Error>> {
    validate_track(&args)?;
    let settings = resolve_settings(&args)?;
    if args.save_config {
        save_settings(&settings, args.config.as_deref())?;
    }

    let models = match resolve_model_dir(&settings) {
        Some(dir) => load_models(&dir),
        None => LoadedModels::default(),
    };
    let dispatch = ClassifierDispatch::new(
        models.single_hand,
        models.two_hands,
        settings.frame_size(),
        settings.frame_size(),
    )
    .with_confidence_floor(settings.confidence_floor);
    if !dispatch.has_single_hand_model() && !dispatch.has_two_hands_model() {
        log::info!("No trained models loaded; classifying with the rule-based fallback");
    }

    let emitter = NetworkEmitter::new(
        Box::new(UdpSink::connect(&settings.host, settings.gesture_port)?),
        Box::new(UdpSink::connect(&settings.host, settings.position_port)?),
        EmitterConfig {
            position_interval: settings.position_interval(),
            position_epsilon: settings.position_epsilon,
            emit_combined: settings.emit_combined,
        },
    );

    let source: Box<dyn KeypointSource> = match &args.input {
        Some(path) => Box::new(JsonLinesSource::from_path(path)?),
        None => Box::new(JsonLinesSource::stdin()),
    };

    let on_frame: Option<FrameObserver> = if args.show_frames {
        Some(Box::new(print_frame))
    } else {
        None
    };

    let mut use_case = TrackGesturesUseCase::new(
        source,
        dispatch,
        GestureStabilizer::new(settings.stabilizer_window(), settings.stabilizer_threshold),
        LivenessTracker::new(settings.liveness_threshold(), settings.liveness_interval()),
        emitter,
        on_frame,
        None,
    );
    use_case.execute()?;
    log::info!("Final gesture: {}", use_case.current_gesture());
    Ok(())
}

fn run_listen(args: ListenArgs) -> Result<(), Box<dyn std::error::Error>> {
    let timeout = args.timeout.map(parse_timeout).transpose()?;

    let listener = UdpListener::bind(&args.host, args.port)?;
    log::info!("Listening on {}", listener.local_addr()?);

    let mut filter = GestureChangeFilter::default();
    let cancelled = Arc::new(AtomicBool::new(false));
    let report = listener.listen(timeout, &cancelled, |datagram| {
        if args.all {
            match &datagram.message {
                Ok(message) => println!("{} {message:?}", datagram.from),
                Err(_) => println!("{} {}", datagram.from, datagram.payload),
            }
        } else if let Some(label) = filter.changed(datagram) {
            println!("Gesture: {label}");
        }
    })?;

    log::info!(
        "Received {} packets in {:.1}s ({:.1} packets/s)",
        report.packets,
        report.elapsed.as_secs_f64(),
        report.packets_per_second()
    );
    Ok(())
}

fn parse_timeout(secs: f64) -> Result<Duration, Box<dyn std::error::Error>> {
    match Duration::try_from_secs_f64(secs) {
        Ok(timeout) if secs > 0.0 => Ok(timeout),
        _ => Err(format!("Timeout must be a positive number of seconds, got {secs}").into()),
    }
}

fn print_frame(report: &FrameReport) {
    let marker = if report.stable_changed { "*" } else { " " };
    println!(
        "{:>6} {:>8.3}s hands={} raw={} ({:.2}) stable={}{marker}",
        report.frame_index,
        report.timestamp.as_secs_f64(),
        report.hand_count,
        report.classification.label,
        report.classification.confidence,
        report.stable
    );
}

/// Settings file, then command-line overrides, then validation.
fn resolve_settings(args: &TrackArgs) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::load_or_default()?,
    };

    if let Some(host) = &args.host {
        settings.host = host.clone();
    }
    if let Some(port) = args.gesture_port {
        settings.gesture_port = port;
    }
    if let Some(port) = args.position_port {
        settings.position_port = port;
    }
    if let Some(dir) = &args.model_dir {
        settings.model_dir = Some(dir.clone());
    }
    if let Some(window) = args.window {
        settings.stabilizer_window_secs = window;
    }
    if let Some(threshold) = args.threshold {
        settings.stabilizer_threshold = threshold;
    }
    if let Some(floor) = args.confidence_floor {
        settings.confidence_floor = floor;
    }
    if let Some(secs) = args.liveness_threshold {
        settings.liveness_threshold_secs = secs;
    }
    if args.combined {
        settings.emit_combined = true;
    }

    settings.validate()?;
    Ok(settings)
}

/// Saves to `explicit`, or to the per-user settings file.
fn save_settings(
    settings: &Settings,
    explicit: Option<&Path>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => Settings::default_path().ok_or("Could not determine the settings directory")?,
    };
    settings.save(&path)?;
    log::info!("Settings saved to {}", path.display());
    Ok(path)
}

fn resolve_model_dir(settings: &Settings) -> Option<PathBuf> {
    if let Some(dir) = &settings.model_dir {
        return Some(dir.clone());
    }
    match default_model_dir() {
        Ok(dir) => Some(dir),
        Err(e) => {
            log::warn!("{e}; using rule-based fallback");
            None
        }
    }
}

fn validate_track(args: &TrackArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(input) = &args.input {
        require_file(input, "Input file")?;
    }
    if let Some(config) = &args.config {
        require_file(config, "Settings file")?;
    }
    if let Some(dir) = &args.model_dir {
        if !dir.is_dir() {
            return Err(format!("Model directory not found: {}", dir.display()).into());
        }
    }
    Ok(())
}

fn require_file(path: &Path, what: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("{what} not found: {}", path.display()).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_track_help_explains_interrupt() {
        let mut cli = Cli::command();
        let track = cli.find_subcommand_mut("track").unwrap();
        let help = track.render_long_help().to_string();
        assert!(help.contains("Ctrl-C"));
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout(1.5).unwrap(), Duration::from_millis(1500));
        assert!(parse_timeout(0.0).is_err());
        assert!(parse_timeout(-2.0).is_err());
        assert!(parse_timeout(f64::NAN).is_err());
        assert!(parse_timeout(1e20).is_err());
    }

    #[test]
    fn test_save_settings_writes_resolved_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            gesture_port: 9100,
            emit_combined: true,
            ..Settings::default()
        };

        let written = save_settings(&settings, Some(&path)).unwrap();
        assert_eq!(written, path);
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }
}
