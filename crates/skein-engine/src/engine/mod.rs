//! Frame scheduler: lifecycle, input dispatch, world updates and layered
//! rendering over a pluggable backend target.

pub mod workers;

use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use crate::camera::Camera;
use crate::error::{EngineError, Result};
use crate::graph::{GraphIndex, SelectionModel};
use crate::input::InputContext;
use crate::pipeline::{compose, InputListener, RenderContext, Renderer, WorldUpdater, ALL_LAYERS};
use crate::settings::{RenderingOptions, UpdaterExecutionMode};
use crate::target::RenderingTarget;

use workers::{BatchHandle, Job, UpdaterPool};

/// Grace period for worker threads to drain on destroy.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

const DEFAULT_BACKGROUND_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const DEFAULT_MAX_UPDATES_PER_SECOND: u32 = 60;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineState {
    /// Elements may be registered; the pipeline has not been built yet.
    Unconfigured,
    /// Pipeline built, not yet started.
    Ready,
    Running,
    Paused,
    /// Terminal; every lifecycle operation fails from here.
    Destroyed,
}

/// The engine: owns the backend target, the registered pipeline elements and
/// the shared world state, and drives them frame by frame from `display()`.
///
/// `E` is the embedder's input event type; [`crate::input::InputEvent`] is
/// the stock choice.
pub struct Engine<T: RenderingTarget, E> {
    target: T,
    state: EngineState,

    renderers: Vec<Box<dyn Renderer<T>>>,
    renderer_pipeline: Vec<usize>,
    updaters: Vec<Arc<dyn WorldUpdater>>,
    updater_pipeline: Vec<usize>,
    listeners: Vec<Box<dyn InputListener<E>>>,
    listener_pipeline: Vec<usize>,

    camera: Arc<RwLock<Camera>>,
    selection: Arc<RwLock<SelectionModel>>,
    options: Arc<RwLock<RenderingOptions>>,
    graph: Arc<dyn GraphIndex>,

    background_color: [f32; 4],
    max_updates_per_second: u32,
    execution_mode: UpdaterExecutionMode,
    shutdown_grace: Duration,

    events: Mutex<Vec<E>>,
    pool: Option<UpdaterPool>,
    in_flight: Option<BatchHandle>,
    last_update: Option<Instant>,
}

impl<T: RenderingTarget, E> Engine<T, E> {
    pub fn new(target: T, graph: Arc<dyn GraphIndex>) -> Self {
        Self {
            target,
            state: EngineState::Unconfigured,
            renderers: Vec::new(),
            renderer_pipeline: Vec::new(),
            updaters: Vec::new(),
            updater_pipeline: Vec::new(),
            listeners: Vec::new(),
            listener_pipeline: Vec::new(),
            camera: Arc::new(RwLock::new(Camera::new())),
            selection: Arc::new(RwLock::new(SelectionModel::new())),
            options: Arc::new(RwLock::new(RenderingOptions::default())),
            graph,
            background_color: DEFAULT_BACKGROUND_COLOR,
            max_updates_per_second: DEFAULT_MAX_UPDATES_PER_SECOND,
            execution_mode: UpdaterExecutionMode::default(),
            shutdown_grace: SHUTDOWN_GRACE,
            events: Mutex::new(Vec::new()),
            pool: None,
            in_flight: None,
            last_update: None,
        }
    }

    // ── registration ──────────────────────────────────────────────────────

    pub fn add_renderer(&mut self, renderer: Box<dyn Renderer<T>>) {
        self.renderers.push(renderer);
    }

    pub fn add_world_updater(&mut self, updater: Arc<dyn WorldUpdater>) {
        self.updaters.push(updater);
    }

    pub fn add_input_listener(&mut self, listener: Box<dyn InputListener<E>>) {
        self.listeners.push(listener);
    }

    /// Rebuilds all three pipelines from the registered candidates and the
    /// target's current capabilities, then initializes the winners in
    /// pipeline order.
    pub fn init_pipeline(&mut self) -> Result<()> {
        self.check_not_destroyed("init_pipeline")?;

        let capabilities = self.target.capabilities();

        let renderer_refs: Vec<&dyn Renderer<T>> =
            self.renderers.iter().map(|r| r.as_ref()).collect();
        self.renderer_pipeline = compose(&renderer_refs, &capabilities, "renderer");

        let updater_refs: Vec<&dyn WorldUpdater> =
            self.updaters.iter().map(|u| u.as_ref()).collect();
        self.updater_pipeline = compose(&updater_refs, &capabilities, "world updater");

        let listener_refs: Vec<&dyn InputListener<E>> =
            self.listeners.iter().map(|l| l.as_ref()).collect();
        self.listener_pipeline = compose(&listener_refs, &capabilities, "input listener");

        for &i in &self.renderer_pipeline {
            if let Err(e) = self.renderers[i].init(&mut self.target) {
                log::error!("renderer '{}' failed to init: {e:#}", self.renderers[i].name());
            }
        }
        for &i in &self.updater_pipeline {
            if let Err(e) = self.updaters[i].init() {
                log::error!(
                    "world updater '{}' failed to init: {e:#}",
                    self.updaters[i].name()
                );
            }
        }

        if self.state == EngineState::Unconfigured {
            self.state = EngineState::Ready;
        }
        Ok(())
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn start(&mut self) -> Result<()> {
        match self.state {
            EngineState::Ready => {
                self.target.setup();
                self.target.start();
                if self.execution_mode.is_concurrent() {
                    let size = workers::pool_size_for(self.updater_pipeline.len());
                    self.pool = Some(UpdaterPool::new(size));
                }
                self.state = EngineState::Running;
                log::info!("engine started ({:?} mode)", self.execution_mode);
                Ok(())
            }
            EngineState::Running => Ok(()),
            state => Err(EngineError::InvalidState(format!("start in state {state:?}"))),
        }
    }

    pub fn pause(&mut self) -> Result<()> {
        match self.state {
            EngineState::Running | EngineState::Paused => {
                self.state = EngineState::Paused;
                Ok(())
            }
            state => Err(EngineError::InvalidState(format!("pause in state {state:?}"))),
        }
    }

    pub fn resume(&mut self) -> Result<()> {
        match self.state {
            EngineState::Running | EngineState::Paused => {
                self.state = EngineState::Running;
                Ok(())
            }
            state => Err(EngineError::InvalidState(format!(
                "resume in state {state:?}"
            ))),
        }
    }

    /// Tears the engine down: drains the worker pool with a bounded grace
    /// period, disposes updaters then renderers in pipeline order, stops the
    /// target. Terminal.
    pub fn destroy(&mut self) -> Result<()> {
        self.check_not_destroyed("destroy")?;

        // Abandon any in-flight batch; the pool's grace period is the only
        // bound on teardown, a hung updater must not hang destroy.
        self.in_flight = None;
        if let Some(mut pool) = self.pool.take() {
            pool.shutdown(self.shutdown_grace);
        }

        for &i in &self.updater_pipeline {
            self.updaters[i].dispose();
        }
        for &i in &self.renderer_pipeline {
            self.renderers[i].dispose(&mut self.target);
        }

        self.state = EngineState::Destroyed;
        self.target.stop();
        log::info!("engine destroyed");
        Ok(())
    }

    // ── frame loop ────────────────────────────────────────────────────────

    /// Queues an input event for dispatch at the top of the next frame.
    pub fn queue_event(&self, event: E) {
        self.events.lock().unwrap().push(event);
    }

    /// Runs one frame: input dispatch, world update handoff, layered render.
    /// A no-op unless the engine is running; an error once destroyed.
    pub fn display(&mut self) -> Result<()> {
        self.check_not_destroyed("display")?;
        if self.state != EngineState::Running {
            return Ok(());
        }

        self.target.frame_start();
        self.process_input_events();
        self.update_world();
        self.render_layers();
        if self.execution_mode.is_concurrent() {
            self.schedule_update_batch();
        }
        self.target.frame_end();
        Ok(())
    }

    fn process_input_events(&mut self) {
        for &i in &self.listener_pipeline {
            self.listeners[i].frame_start();
        }

        let events = std::mem::take(&mut *self.events.lock().unwrap());
        let mut ctx = InputContext {
            camera: &self.camera,
            selection: &self.selection,
            options: &self.options,
            graph: self.graph.as_ref(),
        };
        for event in &events {
            // First consumer wins.
            for &i in &self.listener_pipeline {
                if self.listeners[i].process_event(event, &mut ctx) {
                    break;
                }
            }
        }

        for &i in &self.listener_pipeline {
            self.listeners[i].frame_end();
        }
    }

    fn update_world(&mut self) {
        match self.execution_mode {
            UpdaterExecutionMode::Synchronous => {
                if !self.update_due() {
                    return;
                }
                for &i in &self.updater_pipeline {
                    if let Err(e) = self.updaters[i].update_world() {
                        log::error!(
                            "world updater '{}' failed: {e:#}",
                            self.updaters[i].name()
                        );
                    }
                }
                self.last_update = Some(Instant::now());
                self.notify_world_updated();
            }
            UpdaterExecutionMode::ConcurrentSynchronous
            | UpdaterExecutionMode::ConcurrentAsynchronous => {
                let Some(handle) = &self.in_flight else {
                    return;
                };
                if self.execution_mode.is_blocking() {
                    handle.wait();
                }
                if handle.is_done() {
                    self.in_flight = None;
                    self.notify_world_updated();
                }
            }
        }
    }

    /// Submits the next update batch, keeping at most one in flight.
    fn schedule_update_batch(&mut self) {
        if self.in_flight.is_some() || !self.update_due() {
            return;
        }
        let Some(pool) = &self.pool else {
            return;
        };

        let jobs: Vec<Job> = self
            .updater_pipeline
            .iter()
            .map(|&i| {
                let updater = Arc::clone(&self.updaters[i]);
                Box::new(move || {
                    if let Err(e) = updater.update_world() {
                        log::error!("world updater '{}' failed: {e:#}", updater.name());
                    }
                }) as Job
            })
            .collect();

        self.last_update = Some(Instant::now());
        self.in_flight = Some(pool.submit(jobs));
    }

    fn update_due(&self) -> bool {
        if self.max_updates_per_second == 0 {
            return true;
        }
        let min_interval = Duration::from_millis(1000 / u64::from(self.max_updates_per_second));
        match self.last_update {
            None => true,
            Some(at) => at.elapsed() >= min_interval,
        }
    }

    fn notify_world_updated(&mut self) {
        for &i in &self.renderer_pipeline {
            self.renderers[i].world_updated(&mut self.target);
        }
    }

    fn render_layers(&mut self) {
        let ctx = self.render_context();
        for layer in ALL_LAYERS {
            for &i in &self.renderer_pipeline {
                if !self.renderers[i].layers().contains(layer) {
                    continue;
                }
                if let Err(e) = self.renderers[i].render(&mut self.target, layer, &ctx) {
                    log::error!(
                        "renderer '{}' failed on layer {layer:?}: {e:#}",
                        self.renderers[i].name()
                    );
                }
            }
        }
    }

    fn render_context(&self) -> RenderContext {
        let camera = self.camera.read().unwrap();
        RenderContext {
            mvp: camera.mvp(),
            mvp_floats: camera.mvp_floats(),
            view_boundaries: camera.view_boundaries(),
            width: camera.width(),
            height: camera.height(),
            zoom: camera.zoom(),
            background_color: self.background_color,
        }
    }

    fn check_not_destroyed(&self, operation: &str) -> Result<()> {
        if self.state == EngineState::Destroyed {
            return Err(EngineError::InvalidState(format!(
                "{operation} after destroy"
            )));
        }
        Ok(())
    }

    // ── shared state & settings ───────────────────────────────────────────

    pub fn camera(&self) -> Arc<RwLock<Camera>> {
        Arc::clone(&self.camera)
    }

    pub fn selection(&self) -> Arc<RwLock<SelectionModel>> {
        Arc::clone(&self.selection)
    }

    pub fn rendering_options(&self) -> Arc<RwLock<RenderingOptions>> {
        Arc::clone(&self.options)
    }

    pub fn graph(&self) -> Arc<dyn GraphIndex> {
        Arc::clone(&self.graph)
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn background_color(&self) -> [f32; 4] {
        self.background_color
    }

    /// Sets the clear color; rejects anything but exactly 4 components.
    pub fn set_background_color(&mut self, components: &[f32]) -> Result<()> {
        let color: [f32; 4] = components.try_into().map_err(|_| {
            EngineError::Configuration(format!(
                "background color needs exactly 4 components, got {}",
                components.len()
            ))
        })?;
        self.background_color = color;
        Ok(())
    }

    pub fn max_updates_per_second(&self) -> u32 {
        self.max_updates_per_second
    }

    /// 0 means unlimited.
    pub fn set_max_updates_per_second(&mut self, max: u32) {
        self.max_updates_per_second = max;
    }

    pub fn shutdown_grace(&self) -> Duration {
        self.shutdown_grace
    }

    /// Bounds how long `destroy()` waits for worker threads before detaching
    /// them. Defaults to 10 seconds.
    pub fn set_shutdown_grace(&mut self, grace: Duration) {
        self.shutdown_grace = grace;
    }

    pub fn execution_mode(&self) -> UpdaterExecutionMode {
        self.execution_mode
    }

    /// Switches the updater scheduling mode; only allowed before `start()`
    /// since the worker pool is sized and spawned there.
    pub fn set_execution_mode(&mut self, mode: UpdaterExecutionMode) -> Result<()> {
        match self.state {
            EngineState::Unconfigured | EngineState::Ready => {
                self.execution_mode = mode;
                Ok(())
            }
            state => Err(EngineError::InvalidState(format!(
                "set_execution_mode in state {state:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use crate::graph::MemoryGraph;
    use crate::input::InputEvent;
    use crate::pipeline::{category, LayerSet, PipelineElement, RenderingLayer};
    use crate::stream::InstanceCounter;
    use crate::target::{Capabilities, HeadlessTarget};

    use super::*;

    type TestEngine = Engine<HeadlessTarget, InputEvent>;

    fn engine() -> TestEngine {
        Engine::new(
            HeadlessTarget::new(Capabilities::default()),
            Arc::new(MemoryGraph::new()),
        )
    }

    struct CountingUpdater {
        ticks: Arc<AtomicUsize>,
        delay: Duration,
    }

    impl PipelineElement for CountingUpdater {
        fn name(&self) -> &str {
            "counting-updater"
        }

        fn category(&self) -> &str {
            category::NODE
        }
    }

    impl WorldUpdater for CountingUpdater {
        fn update_world(&self) -> anyhow::Result<()> {
            if !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
            self.ticks.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn start_requires_a_built_pipeline() {
        let mut engine = engine();
        assert!(engine.start().is_err());

        engine.init_pipeline().unwrap();
        assert_eq!(engine.state(), EngineState::Ready);
        engine.start().unwrap();
        assert_eq!(engine.state(), EngineState::Running);
        assert_eq!(engine.target().setup_calls, 1);
    }

    #[test]
    fn pause_skips_frames_resume_continues() {
        let mut engine = engine();
        engine.init_pipeline().unwrap();
        engine.start().unwrap();

        engine.display().unwrap();
        engine.pause().unwrap();
        engine.display().unwrap();
        assert_eq!(engine.target().frames, 1);

        engine.resume().unwrap();
        engine.display().unwrap();
        assert_eq!(engine.target().frames, 2);
    }

    #[test]
    fn everything_fails_after_destroy() {
        let mut engine = engine();
        engine.init_pipeline().unwrap();
        engine.start().unwrap();
        engine.destroy().unwrap();
        assert_eq!(engine.target().stop_calls, 1);

        assert!(matches!(engine.display(), Err(EngineError::InvalidState(_))));
        assert!(engine.start().is_err());
        assert!(engine.pause().is_err());
        assert!(engine.destroy().is_err());
    }

    // ── settings ──────────────────────────────────────────────────────────

    #[test]
    fn background_color_must_have_four_components() {
        let mut engine = engine();
        assert!(matches!(
            engine.set_background_color(&[0.1, 0.2, 0.3]),
            Err(EngineError::Configuration(_))
        ));
        engine.set_background_color(&[0.1, 0.2, 0.3, 1.0]).unwrap();
        assert_eq!(engine.background_color(), [0.1, 0.2, 0.3, 1.0]);
    }

    #[test]
    fn execution_mode_is_frozen_after_start() {
        let mut engine = engine();
        engine
            .set_execution_mode(UpdaterExecutionMode::Synchronous)
            .unwrap();
        engine.init_pipeline().unwrap();
        engine.start().unwrap();
        assert!(engine
            .set_execution_mode(UpdaterExecutionMode::ConcurrentAsynchronous)
            .is_err());
    }

    // ── scheduling ────────────────────────────────────────────────────────

    #[test]
    fn synchronous_updates_are_rate_limited() {
        let mut engine = engine();
        let ticks = Arc::new(AtomicUsize::new(0));
        engine.add_world_updater(Arc::new(CountingUpdater {
            ticks: ticks.clone(),
            delay: Duration::ZERO,
        }));
        engine
            .set_execution_mode(UpdaterExecutionMode::Synchronous)
            .unwrap();
        engine.set_max_updates_per_second(10);
        engine.init_pipeline().unwrap();
        engine.start().unwrap();

        // 100 frames well inside one 100 ms update interval.
        for _ in 0..100 {
            engine.display().unwrap();
        }
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unlimited_rate_updates_every_frame() {
        let mut engine = engine();
        let ticks = Arc::new(AtomicUsize::new(0));
        engine.add_world_updater(Arc::new(CountingUpdater {
            ticks: ticks.clone(),
            delay: Duration::ZERO,
        }));
        engine
            .set_execution_mode(UpdaterExecutionMode::Synchronous)
            .unwrap();
        engine.set_max_updates_per_second(0);
        engine.init_pipeline().unwrap();
        engine.start().unwrap();

        for _ in 0..5 {
            engine.display().unwrap();
        }
        assert_eq!(ticks.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn concurrent_mode_keeps_one_batch_in_flight() {
        let mut engine = engine();
        let ticks = Arc::new(AtomicUsize::new(0));
        engine.add_world_updater(Arc::new(CountingUpdater {
            ticks: ticks.clone(),
            delay: Duration::from_millis(30),
        }));
        engine
            .set_execution_mode(UpdaterExecutionMode::ConcurrentAsynchronous)
            .unwrap();
        engine.set_max_updates_per_second(0);
        engine.init_pipeline().unwrap();
        engine.start().unwrap();

        // Many fast frames against a 30 ms updater: the second batch may
        // only be scheduled once the first one finished.
        for _ in 0..10 {
            engine.display().unwrap();
        }
        assert!(ticks.load(Ordering::SeqCst) <= 1);

        engine.destroy().unwrap();
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    /// Updater that blocks until the test releases it (or never).
    struct StalledUpdater {
        gate: crossbeam_channel::Receiver<()>,
    }

    impl PipelineElement for StalledUpdater {
        fn name(&self) -> &str {
            "stalled-updater"
        }

        fn category(&self) -> &str {
            category::NODE
        }
    }

    impl WorldUpdater for StalledUpdater {
        fn update_world(&self) -> anyhow::Result<()> {
            let _ = self.gate.recv();
            Ok(())
        }
    }

    #[test]
    fn destroy_is_bounded_by_the_grace_period() {
        let (release, gate) = crossbeam_channel::bounded::<()>(0);

        let mut engine = engine();
        engine.add_world_updater(Arc::new(StalledUpdater { gate }));
        engine
            .set_execution_mode(UpdaterExecutionMode::ConcurrentAsynchronous)
            .unwrap();
        engine.set_max_updates_per_second(0);
        engine.set_shutdown_grace(Duration::from_millis(50));
        engine.init_pipeline().unwrap();
        engine.start().unwrap();

        // Schedule a batch whose updater never finishes on its own, then
        // give the worker a moment to pick it up.
        engine.display().unwrap();
        thread::sleep(Duration::from_millis(20));

        let started = Instant::now();
        engine.destroy().unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(engine.target().stop_calls, 1);

        drop(release);
    }

    // ── update/render handoff ─────────────────────────────────────────────

    /// Updater writes counts after a deliberate delay; the paired renderer
    /// promotes on `world_updated` and records what it would draw.
    struct SlowStreamUpdater {
        counter: Arc<Mutex<InstanceCounter>>,
    }

    impl PipelineElement for SlowStreamUpdater {
        fn name(&self) -> &str {
            "slow-stream-updater"
        }

        fn category(&self) -> &str {
            category::NODE
        }
    }

    impl WorldUpdater for SlowStreamUpdater {
        fn update_world(&self) -> anyhow::Result<()> {
            let mut counter = self.counter.lock().unwrap();
            thread::sleep(Duration::from_millis(20));
            counter.set_counts(2, 3);
            Ok(())
        }
    }

    struct PromotingRenderer {
        counter: Arc<Mutex<InstanceCounter>>,
        observed: Arc<Mutex<Vec<usize>>>,
    }

    impl PipelineElement for PromotingRenderer {
        fn name(&self) -> &str {
            "promoting-renderer"
        }

        fn category(&self) -> &str {
            category::NODE
        }
    }

    impl Renderer<HeadlessTarget> for PromotingRenderer {
        fn world_updated(&mut self, _target: &mut HeadlessTarget) {
            self.counter.lock().unwrap().promote();
        }

        fn layers(&self) -> LayerSet {
            LayerSet::of(&[RenderingLayer::Front1])
        }

        fn render(
            &mut self,
            _target: &mut HeadlessTarget,
            _layer: RenderingLayer,
            _ctx: &RenderContext,
        ) -> anyhow::Result<()> {
            let total = self.counter.lock().unwrap().total_to_draw();
            self.observed.lock().unwrap().push(total);
            Ok(())
        }
    }

    #[test]
    fn renderer_never_observes_unpromoted_counts() {
        let counter = Arc::new(Mutex::new(InstanceCounter::new()));
        let observed = Arc::new(Mutex::new(Vec::new()));

        let mut engine = engine();
        engine.add_world_updater(Arc::new(SlowStreamUpdater {
            counter: counter.clone(),
        }));
        engine.add_renderer(Box::new(PromotingRenderer {
            counter: counter.clone(),
            observed: observed.clone(),
        }));
        engine
            .set_execution_mode(UpdaterExecutionMode::ConcurrentAsynchronous)
            .unwrap();
        engine.set_max_updates_per_second(0);
        engine.init_pipeline().unwrap();
        engine.start().unwrap();

        let deadline = Instant::now() + Duration::from_millis(500);
        while Instant::now() < deadline {
            engine.display().unwrap();
            if observed.lock().unwrap().last() == Some(&5) {
                break;
            }
        }
        engine.destroy().unwrap();

        let observed = observed.lock().unwrap();
        // Either nothing yet, or the fully promoted counts; never torn.
        assert!(observed.iter().all(|&total| total == 0 || total == 5));
        assert_eq!(*observed.last().unwrap(), 5);
    }

    // ── input dispatch ────────────────────────────────────────────────────

    struct RecordingListener {
        name: &'static str,
        category: &'static str,
        consume: bool,
        seen: Arc<Mutex<Vec<(&'static str, InputEvent)>>>,
        frame_starts: Arc<AtomicUsize>,
    }

    impl PipelineElement for RecordingListener {
        fn name(&self) -> &str {
            self.name
        }

        fn category(&self) -> &str {
            self.category
        }
    }

    impl InputListener<InputEvent> for RecordingListener {
        fn frame_start(&mut self) {
            self.frame_starts.fetch_add(1, Ordering::SeqCst);
        }

        fn process_event(&mut self, event: &InputEvent, _ctx: &mut InputContext<'_>) -> bool {
            self.seen.lock().unwrap().push((self.name, *event));
            self.consume
        }
    }

    #[test]
    fn first_consumer_wins_and_queue_is_drained() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let frame_starts = Arc::new(AtomicUsize::new(0));

        let mut engine = engine();
        engine.add_input_listener(Box::new(RecordingListener {
            name: "first",
            category: "input-a",
            consume: true,
            seen: seen.clone(),
            frame_starts: frame_starts.clone(),
        }));
        engine.add_input_listener(Box::new(RecordingListener {
            name: "second",
            category: "input-b",
            consume: false,
            seen: seen.clone(),
            frame_starts: frame_starts.clone(),
        }));
        engine.init_pipeline().unwrap();
        engine.start().unwrap();

        let event = InputEvent::Resized {
            width: 100.0,
            height: 100.0,
        };
        engine.queue_event(event);
        engine.display().unwrap();

        // Consumed by the first listener; the second never sees it.
        assert_eq!(*seen.lock().unwrap(), vec![("first", event)]);
        seen.lock().unwrap().clear();

        engine.display().unwrap();
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(frame_starts.load(Ordering::SeqCst), 4);
    }
}
