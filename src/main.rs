//! Cheese Vision - headless demo
//!
//! Runs the full engine against simulated collaborators for a fixed number
//! of frames and logs what it would show.
//!
//! Usage: `cheese-vision [config.json] [--frames N]`

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use cheese_vision::pose::{Keypoint, Pose};
use cheese_vision::sim::{RecordingSurface, ScriptedPoseEstimator, ScriptedPredictor, SyntheticCamera};
use cheese_vision::telemetry::init_logging;
use cheese_vision::{AppConfig, ChannelId, CheeseApp, Collaborators, InputEvent, PredictError, Prediction, TokioClock};

const DEFAULT_FRAMES: u64 = 600;
const FRAME_TIME: Duration = Duration::from_micros(16_667);

struct Args {
    config: Option<PathBuf>,
    frames: u64,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        config: None,
        frames: DEFAULT_FRAMES,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--frames" {
            let value = iter.next().ok_or("--frames needs a value")?;
            args.frames = value.parse().map_err(|_| format!("invalid frame count: {}", value))?;
        } else if args.config.is_none() {
            args.config = Some(PathBuf::from(arg));
        } else {
            return Err(format!("unexpected argument: {}", arg));
        }
    }
    Ok(args)
}

/// Shirt classifier that wanders between a few colors, with the odd dropout
fn color_script() -> ScriptedPredictor {
    let step = |label: &str, p: f32| -> Result<Vec<Prediction>, PredictError> {
        Ok(vec![Prediction::new(label, p), Prediction::new("White", 1.0 - p)])
    };
    ScriptedPredictor::new(vec![
        step("Red", 0.92),
        step("Red", 0.88),
        step("Blue", 0.55),
        step("Blue", 0.81),
        Err(PredictError::Inference("simulated dropout".to_string())),
        step("Green", 0.77),
        step("Yellow", 0.95),
    ])
}

fn hair_script() -> ScriptedPredictor {
    let step = |label: &str, p: f32| -> Result<Vec<Prediction>, PredictError> { Ok(vec![Prediction::new(label, p)]) };
    ScriptedPredictor::new(vec![
        step("Curly Hair", 0.9),
        step("Wavy Hair", 0.6),
        step("Dreads", 0.8),
        step("Straight Hair", 0.99),
    ])
}

fn pose_script() -> ScriptedPoseEstimator {
    let body = |offset: f32| {
        Some(Pose::new(vec![
            Keypoint::new("nose", 100.0, 40.0, 0.95),
            Keypoint::new("left_wrist", 40.0 + offset, 120.0, 0.8),
            Keypoint::new("right_wrist", 160.0 - offset, 120.0, 0.75),
            Keypoint::new("left_elbow", 60.0, 100.0, 0.2),
            Keypoint::new("right_elbow", 140.0, 100.0, 0.6),
        ]))
    };
    ScriptedPoseEstimator::new(vec![Ok(body(0.0)), Ok(body(20.0)), Ok(None), Ok(body(40.0))])
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = parse_args()?;
    let config = AppConfig::load_or_default(args.config.as_deref())?;
    let _log_guard = init_logging(&config.logging)?;

    tracing::info!(frames = args.frames, "Starting Cheese Vision demo");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("cheese-worker")
        .enable_all()
        .build()?;

    let camera = Arc::new(SyntheticCamera::new(
        config.canvas_width as u32,
        config.canvas_height as u32,
    ));
    let collaborators = Collaborators::new(camera, Arc::new(TokioClock))
        .with_predictor(ChannelId::Color, Arc::new(color_script()))
        .with_predictor(ChannelId::Hair, Arc::new(hair_script()))
        .with_pose(Arc::new(pose_script()));

    let mut app = CheeseApp::new(config, collaborators, runtime.handle().clone());
    app.start()?;

    let canvas = app.config().canvas_size();
    let mut surface = RecordingSurface::new(canvas.x, canvas.y);
    let started = Instant::now();

    for frame in 0..args.frames {
        let tick_start = Instant::now();

        match frame {
            120 => app.input().push(InputEvent::pointer(canvas * 0.25)),
            240 => app.input().push(InputEvent::Key('5')),
            360 => app.input().push(InputEvent::Key('t')),
            _ => {}
        }

        app.update();
        surface.clear();
        app.render(&mut surface);

        if frame % 60 == 0 {
            for line in app.status_lines() {
                tracing::info!("{}", line);
            }
            tracing::debug!(draw_calls = surface.calls().len(), "Frame rendered");
        }

        if let Some(remaining) = FRAME_TIME.checked_sub(tick_start.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    app.stop();

    let metrics = app.metrics().snapshot();
    tracing::info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        color_accepted = metrics.channel(ChannelId::Color).accepted,
        hair_accepted = metrics.channel(ChannelId::Hair).accepted,
        pose_estimates = metrics.pose_estimates,
        failures = metrics.total_failures(),
        "{}",
        app.summary().text
    );

    Ok(())
}
