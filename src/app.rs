//! Application: ties channels, scheduler, pose tracking and particles together
//!
//! The render loop owns a [`CheeseApp`] and calls [`CheeseApp::update`] and
//! [`CheeseApp::render`] once per frame on its own thread. Classifier lanes
//! and pose estimates run on the tokio runtime handed to [`CheeseApp::new`].

use std::sync::Arc;
use std::time::Duration;

use glam::Vec2;

use crate::channel::{Channel, ChannelId};
use crate::config::AppConfig;
use crate::error::SetupError;
use crate::input::{manual_override, InputEvent, InputQueue};
use crate::particles::ParticleSystem;
use crate::pose::{PoseDriver, PoseEstimator, PoseMapper};
use crate::predict::{CameraSource, Clock, PredictionScheduler, Predictor, SchedulerHandle};
use crate::render::hud::{self, TransitionBar};
use crate::render::{draw_particles, fade_background, RenderSurface};
use crate::telemetry::{report_failure, FailureSource, PipelineMetrics};
use crate::theme::Rgb;

/// Particles of every channel that follow the pointer
const POINTER_LEADERS: usize = 3;

/// Lifecycle of the app
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Stopped,
    Loading,
    Running,
    Error(String),
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Stopped => f.write_str("Stopped"),
            Status::Loading => f.write_str("Loading models..."),
            Status::Running => f.write_str("Running"),
            Status::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

/// Headline naming both committed themes
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub text: String,
    /// Even mix of the two committed theme colors
    pub color: Rgb,
}

/// External devices and models the app drives
pub struct Collaborators {
    pub camera: Arc<dyn CameraSource>,
    pub clock: Arc<dyn Clock>,
    predictors: [Option<Arc<dyn Predictor>>; 2],
    pose: Option<Arc<dyn PoseEstimator>>,
}

impl Collaborators {
    pub fn new(camera: Arc<dyn CameraSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            camera,
            clock,
            predictors: [None, None],
            pose: None,
        }
    }

    pub fn with_predictor(mut self, channel: ChannelId, predictor: Arc<dyn Predictor>) -> Self {
        self.predictors[channel.index()] = Some(predictor);
        self
    }

    pub fn with_pose(mut self, estimator: Arc<dyn PoseEstimator>) -> Self {
        self.pose = Some(estimator);
        self
    }
}

pub struct CheeseApp {
    config: AppConfig,
    runtime: tokio::runtime::Handle,
    camera: Arc<dyn CameraSource>,
    clock: Arc<dyn Clock>,
    predictors: [Option<Arc<dyn Predictor>>; 2],
    pose_estimator: Option<Arc<dyn PoseEstimator>>,

    channels: [Channel; 2],
    pools: [ParticleSystem; 2],
    pose: Option<PoseDriver>,
    mapper: PoseMapper,
    input: InputQueue,
    metrics: Arc<PipelineMetrics>,

    scheduler: Option<SchedulerHandle>,
    status: Status,
    summary: Summary,
    frame_count: u64,
}

impl CheeseApp {
    /// Build a stopped app. `config` is validated first.
    pub fn new(mut config: AppConfig, collaborators: Collaborators, runtime: tokio::runtime::Handle) -> Self {
        config.validate();
        let canvas = config.canvas_size();
        let metrics = Arc::new(PipelineMetrics::new());

        let channels = ChannelId::ALL.map(|id| config.channel(id).build(id));
        let pools = ChannelId::ALL.map(|_| ParticleSystem::new(canvas, config.particles.clone()));

        let pose_estimator = collaborators.pose.filter(|_| config.pose.enabled);
        let pose = pose_estimator.as_ref().map(|estimator| {
            PoseDriver::new(
                Arc::clone(estimator),
                Arc::clone(&collaborators.camera),
                config.pose.every_n_ticks,
                Arc::clone(&metrics),
            )
        });
        let mapper = PoseMapper::from_params(&config.pose, canvas);

        let summary = summarize(&channels);

        Self {
            runtime,
            camera: collaborators.camera,
            clock: collaborators.clock,
            predictors: collaborators.predictors,
            pose_estimator,
            channels,
            pools,
            pose,
            mapper,
            input: InputQueue::new(),
            metrics,
            scheduler: None,
            status: Status::Stopped,
            summary,
            frame_count: 0,
            config,
        }
    }

    /// Open the camera, load every model and start polling.
    ///
    /// On failure the error is shown in the status, everything stays stopped
    /// and `start` may be called again.
    pub fn start(&mut self) -> Result<(), SetupError> {
        if self.is_running() {
            return Err(SetupError::AlreadyRunning);
        }

        self.status = Status::Loading;
        tracing::info!("Starting camera and loading models");

        let predictors = match self.setup() {
            Ok(predictors) => predictors,
            Err(error) => {
                if matches!(error, SetupError::Camera(_)) {
                    report_failure(&self.metrics, FailureSource::Camera, &error);
                }
                tracing::error!("Startup failed: {}", error);
                self.status = Status::Error(error.to_string());
                return Err(error);
            }
        };

        let mut scheduler = PredictionScheduler::new(
            Arc::clone(&self.camera),
            Arc::clone(&self.clock),
            Duration::from_millis(self.config.poll_interval_ms),
            Arc::clone(&self.metrics),
        );
        for (channel, predictor) in self.channels.iter().zip(predictors) {
            scheduler = scheduler.with_lane(channel.clone(), predictor);
        }
        self.scheduler = Some(scheduler.start(&self.runtime));

        if let Some(pose) = &self.pose {
            pose.set_running(true);
        }
        self.status = Status::Running;
        tracing::info!(pose = self.pose.is_some(), "Running");
        Ok(())
    }

    /// Bring up every collaborator, releasing the camera if a later step fails
    fn setup(&self) -> Result<[Arc<dyn Predictor>; 2], SetupError> {
        self.camera.start()?;

        let loaded = self.load_models();
        if loaded.is_err() {
            self.camera.stop();
        }
        loaded
    }

    fn load_models(&self) -> Result<[Arc<dyn Predictor>; 2], SetupError> {
        let [color, hair] = ChannelId::ALL.map(|id| {
            self.predictors[id.index()]
                .clone()
                .ok_or(SetupError::MissingPredictor(id))
        });
        let predictors = [color?, hair?];
        for predictor in &predictors {
            predictor.load()?;
        }
        if let Some(estimator) = &self.pose_estimator {
            estimator.load()?;
        }
        Ok(predictors)
    }

    /// Stop polling and pose tracking. Calls already in flight finish and
    /// their results are dropped.
    pub fn stop(&mut self) {
        let Some(scheduler) = self.scheduler.take() else {
            return;
        };
        scheduler.stop();
        if let Some(pose) = &self.pose {
            pose.set_running(false);
        }
        self.camera.stop();
        self.status = Status::Stopped;

        let metrics = self.metrics.snapshot();
        tracing::info!(
            frames = self.frame_count,
            color_cycles = metrics.channel(ChannelId::Color).cycles,
            hair_cycles = metrics.channel(ChannelId::Hair).cycles,
            failures = metrics.total_failures(),
            discarded = metrics.discarded,
            "Stopped"
        );
    }

    /// Advance one render tick
    pub fn update(&mut self) {
        for event in self.input.drain() {
            self.handle_input(event);
        }

        if let Some(pose) = self.pose.as_ref().and_then(PoseDriver::take_latest) {
            for pool in &mut self.pools {
                self.mapper.assign_targets(pool.particles_mut(), Some(&pose));
            }
        }

        let step = self.config.transition_step;
        let mut committed = false;
        for channel in &self.channels {
            if let Some(key) = channel.handle.advance(step) {
                tracing::info!(channel = %channel.id, current = %key, "Transition complete");
                committed = true;
            }
        }
        if committed {
            self.summary = summarize(&self.channels);
            tracing::info!("{}", self.summary.text);
        }

        if let Some(pose) = &self.pose {
            pose.on_tick(self.frame_count, &self.runtime);
        }

        for pool in &mut self.pools {
            pool.update();
        }
        self.frame_count += 1;
    }

    fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::Key(key) => {
                manual_override(&self.channels, key);
            }
            InputEvent::PointerMoved { x, y } => {
                let position = Vec2::new(x, y);
                for pool in &mut self.pools {
                    pool.attract_leaders(position, POINTER_LEADERS);
                }
            }
        }
    }

    /// Draw the current frame
    pub fn render(&self, surface: &mut dyn RenderSurface) {
        fade_background(surface);

        for (channel, pool) in self.channels.iter().zip(&self.pools) {
            draw_particles(surface, pool, &channel.blended_theme());
        }

        hud::draw_text_lines(surface, &self.status_lines());

        let states = self.channels.each_ref().map(|c| c.handle.snapshot());
        if states.iter().any(|s| !s.is_stable()) {
            let bars: Vec<TransitionBar> = self
                .channels
                .iter()
                .zip(&states)
                .map(|(channel, state)| TransitionBar {
                    label: format!("{} Transition", capitalize(channel.id.as_str())),
                    progress: state.progress(),
                    color: bar_color(channel.id),
                })
                .collect();
            hud::draw_transition_bars(surface, &bars);
        }

        hud::draw_summary(surface, &self.summary.text, self.summary.color);
    }

    /// Overlay text: status, transitions, latest classifier readouts
    pub fn status_lines(&self) -> Vec<String> {
        let pose = if self.pose.is_some() && self.is_running() { "Ready" } else { "Off" };
        let mut lines = vec![format!("Status: {} | Pose: {}", self.status, pose)];

        let transitions: Vec<String> = self
            .channels
            .iter()
            .map(|channel| {
                let state = channel.handle.snapshot();
                format!(
                    "{}: {} -> {} ({:.0}%)",
                    capitalize(channel.id.as_str()),
                    channel.registry.lookup(state.current_key()).display_name,
                    channel.registry.lookup(state.target_key()).display_name,
                    state.progress() * 100.0
                )
            })
            .collect();
        lines.push(transitions.join("  |  "));

        for channel in &self.channels {
            let readout = crate::channel::gate::top_prediction(&channel.handle.last_predictions())
                .map(|p| p.readout())
                .unwrap_or_else(|| "-".to_string());
            lines.push(format!("{} prediction: {}", capitalize(channel.id.as_str()), readout));
        }
        lines
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn channel(&self, id: ChannelId) -> &Channel {
        &self.channels[id.index()]
    }

    pub fn particles(&self, id: ChannelId) -> &ParticleSystem {
        &self.pools[id.index()]
    }

    /// Queue for key and pointer events
    pub fn input(&self) -> &InputQueue {
        &self.input
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl Drop for CheeseApp {
    fn drop(&mut self) {
        self.stop();
    }
}

fn summarize(channels: &[Channel; 2]) -> Summary {
    let [color, hair] = channels.each_ref().map(|c| c.current_theme().clone());
    Summary {
        text: format!(
            "You are {} (color) + {} (hair)!",
            color.display_name, hair.display_name
        ),
        color: color.color.lerp(hair.color, 0.5),
    }
}

fn bar_color(id: ChannelId) -> Rgb {
    match id {
        ChannelId::Color => Rgb::new(255, 200, 0),
        ChannelId::Hair => Rgb::new(200, 255, 0),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelConfig;
    use crate::pose::{Keypoint, Pose};
    use crate::predict::Prediction;
    use crate::sim::{RecordingSurface, ScriptedPoseEstimator, ScriptedPredictor, SyntheticCamera};
    use futures_util::future::BoxFuture;
    use futures_util::FutureExt;

    /// Yields instead of sleeping so lanes cycle as fast as the test polls
    struct YieldClock;

    impl Clock for YieldClock {
        fn sleep(&self, _duration: Duration) -> BoxFuture<'static, ()> {
            tokio::task::yield_now().boxed()
        }
    }

    fn config(color_default: &str) -> AppConfig {
        AppConfig {
            color: ChannelConfig {
                default_key: Some(color_default.to_string()),
                ..ChannelConfig::default()
            },
            ..AppConfig::default()
        }
    }

    fn collaborators(camera: SyntheticCamera, color: Vec<Prediction>) -> Collaborators {
        Collaborators::new(Arc::new(camera), Arc::new(YieldClock))
            .with_predictor(ChannelId::Color, Arc::new(ScriptedPredictor::constant(color)))
            .with_predictor(
                ChannelId::Hair,
                Arc::new(ScriptedPredictor::constant(vec![Prediction::new("Curly", 0.2)])),
            )
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        for _ in 0..10_000 {
            if condition() {
                return true;
            }
            tokio::task::yield_now().await;
        }
        condition()
    }

    #[tokio::test]
    async fn test_accepted_prediction_commits_on_twentieth_tick() {
        let collaborators = collaborators(SyntheticCamera::new(8, 8), vec![Prediction::new("Red", 0.95)]);
        let mut app = CheeseApp::new(config("blue"), collaborators, tokio::runtime::Handle::current());
        app.start().expect("start");
        assert_eq!(app.status(), &Status::Running);

        let handle = app.channel(ChannelId::Color).handle.clone();
        assert!(wait_until(|| handle.snapshot().target_key() == "red").await);

        for _ in 0..19 {
            app.update();
        }
        assert_eq!(handle.snapshot().current_key(), "blue");
        assert!(app.summary().text.contains("Gorgonzola"));

        app.update();
        let state = handle.snapshot();
        assert_eq!(state.current_key(), "red");
        assert_eq!(state.progress(), 1.0);
        assert_eq!(app.summary().text, "You are Cheddar (color) + Roquefort (hair)!");
        app.stop();
    }

    #[tokio::test]
    async fn test_camera_failure_reports_and_allows_retry() {
        let collaborators = collaborators(SyntheticCamera::failing_times(1, "device busy"), Vec::new());
        let mut app = CheeseApp::new(AppConfig::default(), collaborators, tokio::runtime::Handle::current());

        let error = app.start().expect_err("first start fails");
        assert!(matches!(error, SetupError::Camera(_)));
        assert_eq!(app.status(), &Status::Error("camera setup failed: device busy".to_string()));
        assert!(!app.is_running());
        assert_eq!(app.metrics().snapshot().camera_failures, 1);

        app.start().expect("retry succeeds");
        assert!(app.is_running());
        assert!(matches!(app.start(), Err(SetupError::AlreadyRunning)));
        app.stop();
        assert_eq!(app.status(), &Status::Stopped);
    }

    #[tokio::test]
    async fn test_model_load_failure_keeps_app_stopped() {
        let collaborators = Collaborators::new(Arc::new(SyntheticCamera::new(8, 8)), Arc::new(YieldClock))
            .with_predictor(ChannelId::Color, Arc::new(ScriptedPredictor::constant(Vec::new())))
            .with_predictor(
                ChannelId::Hair,
                Arc::new(ScriptedPredictor::failing_load(ChannelId::Hair, "404")),
            );
        let mut app = CheeseApp::new(AppConfig::default(), collaborators, tokio::runtime::Handle::current());

        assert!(matches!(app.start(), Err(SetupError::Model { channel: ChannelId::Hair, .. })));
        assert!(!app.is_running());
        assert!(matches!(app.status(), Status::Error(_)));
    }

    #[tokio::test]
    async fn test_missing_predictor_is_a_setup_error() {
        let collaborators = Collaborators::new(Arc::new(SyntheticCamera::new(8, 8)), Arc::new(YieldClock))
            .with_predictor(ChannelId::Color, Arc::new(ScriptedPredictor::constant(Vec::new())));
        let mut app = CheeseApp::new(AppConfig::default(), collaborators, tokio::runtime::Handle::current());
        assert!(matches!(app.start(), Err(SetupError::MissingPredictor(ChannelId::Hair))));
    }

    #[tokio::test]
    async fn test_pose_failure_is_fatal_to_start() {
        let collaborators = collaborators(SyntheticCamera::new(8, 8), Vec::new())
            .with_pose(Arc::new(ScriptedPoseEstimator::failing_load("no weights")));
        let mut app = CheeseApp::new(AppConfig::default(), collaborators, tokio::runtime::Handle::current());
        assert!(matches!(app.start(), Err(SetupError::Pose(_))));
        assert!(!app.is_running());
    }

    #[tokio::test]
    async fn test_key_override_and_pointer() {
        let collaborators = collaborators(SyntheticCamera::new(8, 8), Vec::new());
        let mut app = CheeseApp::new(AppConfig::default(), collaborators, tokio::runtime::Handle::current());

        app.input().push(InputEvent::Key('4'));
        app.input().push(InputEvent::pointer(Vec2::new(12.0, 34.0)));
        app.update();

        let color = app.channel(ChannelId::Color).handle.snapshot();
        assert_eq!(color.target_key(), "green");
        assert!((color.progress() - 0.05).abs() < 1e-6);

        for id in ChannelId::ALL {
            let particles = app.particles(id).particles();
            assert!(particles[..3].iter().all(|p| p.target == Some(Vec2::new(12.0, 34.0))));
        }
    }

    #[tokio::test]
    async fn test_pose_retargets_every_pool() {
        let pose = Pose::new(vec![Keypoint::new("nose", 100.0, 100.0, 0.9)]);
        let estimator = Arc::new(ScriptedPoseEstimator::constant(Some(pose)));
        let collaborators = collaborators(SyntheticCamera::new(8, 8), Vec::new()).with_pose(estimator.clone());
        let mut config = AppConfig::default();
        config.pose.every_n_ticks = 1;
        let mut app = CheeseApp::new(config, collaborators, tokio::runtime::Handle::current());
        app.start().expect("start");

        // Tick 0 issues the estimate
        app.update();
        assert!(wait_until(|| estimator.calls() >= 1).await);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        app.update();

        let nose = Some(Vec2::new(400.0, 300.0));
        for id in ChannelId::ALL {
            let particles = app.particles(id).particles();
            assert_eq!(particles[0].target, nose);
            assert_eq!(particles[1].target, None);
        }
        app.stop();
    }

    #[tokio::test]
    async fn test_render_draws_particles_and_hud() {
        let collaborators = collaborators(SyntheticCamera::new(8, 8), Vec::new());
        let app = CheeseApp::new(AppConfig::default(), collaborators, tokio::runtime::Handle::current());
        let mut surface = RecordingSurface::new(800.0, 600.0);
        app.render(&mut surface);

        let texts = surface.texts();
        assert!(texts.iter().any(|t| t.starts_with("Status: Stopped")));
        assert_eq!(texts.last().copied(), Some("You are Cheddar (color) + Roquefort (hair)!"));
        // Stable channels draw no progress bars
        assert!(!texts.iter().any(|t| t.ends_with("Transition")));
        assert_eq!(
            app.summary().color,
            Rgb::new(255, 150, 0).lerp(Rgb::new(185, 210, 230), 0.5)
        );
    }

    #[tokio::test]
    async fn test_transition_bars_appear_while_moving() {
        let collaborators = collaborators(SyntheticCamera::new(8, 8), Vec::new());
        let mut app = CheeseApp::new(AppConfig::default(), collaborators, tokio::runtime::Handle::current());
        app.input().push(InputEvent::Key('w'));
        app.update();

        let mut surface = RecordingSurface::new(800.0, 600.0);
        app.render(&mut surface);
        let texts = surface.texts();
        assert!(texts.contains(&"Color Transition"));
        assert!(texts.contains(&"Hair Transition"));
    }

    #[tokio::test]
    async fn test_stop_halts_polling() {
        let predictor = Arc::new(ScriptedPredictor::constant(vec![Prediction::new("Red", 0.95)]));
        let collaborators = Collaborators::new(Arc::new(SyntheticCamera::new(8, 8)), Arc::new(YieldClock))
            .with_predictor(ChannelId::Color, predictor.clone())
            .with_predictor(ChannelId::Hair, Arc::new(ScriptedPredictor::constant(Vec::new())));
        let mut app = CheeseApp::new(AppConfig::default(), collaborators, tokio::runtime::Handle::current());
        app.start().expect("start");
        assert!(wait_until(|| predictor.calls() >= 2).await);

        app.stop();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        let calls = predictor.calls();
        for _ in 0..100 {
            tokio::task::yield_now().await;
        }
        assert_eq!(predictor.calls(), calls);
        assert_eq!(app.status(), &Status::Stopped);
    }
}
