//! Lookahead pipeline.
//!
//! A background producer keeps a bounded FIFO of precomputed
//! [`SimulationState`]s topped up while a consumer pulls them with
//! [`SimulationEngine::get_state`]. At most one production chain runs at a
//! time; the chain is a plain loop that exits once the queue is full or the
//! engine went idle, and `get_state` restarts it when it drains below
//! capacity.

use crate::settings::EngineSettings;
use crate::state::SimulationState;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, trace, warn};

const PRODUCER_THREAD_NAME: &str = "particle-producer";

/// Whether new production may be scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineStatus {
    #[default]
    Idle,
    Producing,
}

/// State shared between consumer and producer, guarded by one lock
#[derive(Default)]
struct Pipeline {
    queue: VecDeque<SimulationState>,
    status: PipelineStatus,
    /// Single-flight flag: a production chain is running
    chain_active: bool,
}

/// Owned by whichever chain is active
struct Producer {
    rng: StdRng,
    /// Most recently produced state; the next one is derived from it
    tip: Option<SimulationState>,
}

struct Shared {
    settings: EngineSettings,
    pipeline: Mutex<Pipeline>,
    producer: Mutex<Producer>,
}

impl Shared {
    /// Compute one state without holding the queue lock
    fn produce(&self) -> SimulationState {
        let mut producer = self.producer.lock();
        let Producer { rng, tip } = &mut *producer;
        let next = match tip {
            Some(previous) => previous.advance(&self.settings, rng),
            None => SimulationState::initial(&self.settings, rng),
        };
        *tip = Some(next.clone());
        next
    }
}

/// Particle simulation with a bounded queue of precomputed frames
pub struct SimulationEngine {
    shared: Arc<Shared>,
}

impl SimulationEngine {
    /// Build an engine; settings are sanitized and fixed from here on
    pub fn new(settings: EngineSettings) -> Self {
        let settings = settings.sanitized();
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            particles = settings.particle_count,
            max_states = settings.max_states,
            width = settings.width,
            height = settings.height,
            link_distance = settings.link_distance,
            "Simulation engine created"
        );
        if !settings.has_area() {
            warn!(
                width = settings.width,
                height = settings.height,
                "Simulation area is empty; the engine will not produce states"
            );
        }

        Self {
            shared: Arc::new(Shared {
                settings,
                pipeline: Mutex::new(Pipeline::default()),
                producer: Mutex::new(Producer { rng, tip: None }),
            }),
        }
    }

    /// Sanitized settings the engine runs with
    pub fn settings(&self) -> &EngineSettings {
        &self.shared.settings
    }

    /// Begin background production. Calling it while already producing does nothing.
    pub fn start(&self) {
        if !self.shared.settings.has_area() {
            warn!("Ignoring start on an engine without simulation area");
            return;
        }

        let mut pipeline = self.shared.pipeline.lock();
        if pipeline.status == PipelineStatus::Producing {
            return;
        }
        pipeline.status = PipelineStatus::Producing;
        info!(queued = pipeline.queue.len(), "State production started");
        schedule_chain(&self.shared, &mut pipeline);
    }

    /// Stop scheduling production. A unit already in progress still lands in the queue.
    pub fn stop(&self) {
        let mut pipeline = self.shared.pipeline.lock();
        if pipeline.status == PipelineStatus::Idle {
            return;
        }
        pipeline.status = PipelineStatus::Idle;
        info!(queued = pipeline.queue.len(), "State production stopped");
    }

    pub fn is_running(&self) -> bool {
        self.status() == PipelineStatus::Producing
    }

    pub fn status(&self) -> PipelineStatus {
        self.shared.pipeline.lock().status
    }

    /// Take the oldest queued state, or `None` when nothing is ready yet.
    ///
    /// Restarts production if the queue is below capacity while producing.
    pub fn get_state(&self) -> Option<SimulationState> {
        let mut pipeline = self.shared.pipeline.lock();
        let state = pipeline.queue.pop_front();
        if state.is_none() {
            trace!("No state ready");
        }
        if pipeline.status == PipelineStatus::Producing
            && pipeline.queue.len() < self.shared.settings.max_states
        {
            schedule_chain(&self.shared, &mut pipeline);
        }
        state
    }

    /// Number of states waiting in the queue
    pub fn queued_len(&self) -> usize {
        self.shared.pipeline.lock().queue.len()
    }

    /// True while a production chain is running
    pub fn is_busy(&self) -> bool {
        self.shared.pipeline.lock().chain_active
    }
}

impl Drop for SimulationEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start a production chain unless one is already active
fn schedule_chain(shared: &Arc<Shared>, pipeline: &mut Pipeline) {
    if pipeline.chain_active {
        return;
    }
    pipeline.chain_active = true;

    let worker = Arc::clone(shared);
    let spawned = thread::Builder::new()
        .name(PRODUCER_THREAD_NAME.to_string())
        .spawn(move || run_chain(&worker));

    match spawned {
        Ok(_) => trace!(queued = pipeline.queue.len(), "Production chain scheduled"),
        Err(err) => {
            // Release the flag so the next get_state can try again
            pipeline.chain_active = false;
            warn!(error = %err, "Failed to spawn producer thread");
        }
    }
}

/// Produce states until the queue is full or the engine goes idle
fn run_chain(shared: &Shared) {
    let max_states = shared.settings.max_states;

    loop {
        {
            let mut pipeline = shared.pipeline.lock();
            if pipeline.queue.len() >= max_states {
                pipeline.chain_active = false;
                return;
            }
        }

        let state = shared.produce();

        let mut pipeline = shared.pipeline.lock();
        debug!(
            generation = state.generation(),
            particles = state.particle_count(),
            lines = state.lines().len(),
            queued = pipeline.queue.len() + 1,
            "State produced"
        );
        pipeline.queue.push_back(state);

        if pipeline.status != PipelineStatus::Producing || pipeline.queue.len() >= max_states {
            pipeline.chain_active = false;
            trace!(queued = pipeline.queue.len(), "Production chain finished");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    const DEADLINE: Duration = Duration::from_secs(10);

    /// Poll `check` until it holds or the deadline passes
    fn wait_until(mut check: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < DEADLINE {
            if check() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        check()
    }

    /// Poll `get_state` until a state arrives
    fn next_state(engine: &SimulationEngine) -> SimulationState {
        let mut found = None;
        assert!(wait_until(|| {
            found = engine.get_state();
            found.is_some()
        }));
        match found {
            Some(state) => state,
            None => unreachable!(),
        }
    }

    fn small_settings() -> EngineSettings {
        EngineSettings {
            particle_count: 5,
            max_states: 3,
            width: 100.0,
            height: 100.0,
            link_distance: 20.0,
            seed: Some(99),
            ..Default::default()
        }
    }

    #[test]
    fn test_end_to_end_scenario() {
        let engine = SimulationEngine::new(small_settings());
        assert!(!engine.is_running());
        engine.start();
        assert!(engine.is_running());

        assert!(wait_until(|| engine.queued_len() == 3 && !engine.is_busy()));

        for _ in 0..3 {
            let state = match engine.get_state() {
                Some(state) => state,
                None => {
                    // Refill raced ahead of us; any queued state is fine
                    next_state(&engine)
                }
            };
            assert_eq!(state.particle_count(), 5);
            assert!(state.lines().iter().all(|line| line.distance < 20.0));
        }

        // Whether or not the fourth call is ready, production catches up
        let fourth = next_state(&engine);
        assert_eq!(fourth.particle_count(), 5);
        engine.stop();
    }

    #[test]
    fn test_queue_never_exceeds_capacity() {
        let settings = EngineSettings {
            particle_count: 30,
            max_states: 4,
            ..small_settings()
        };
        let engine = SimulationEngine::new(settings);
        engine.start();

        for _ in 0..200 {
            assert!(engine.queued_len() <= 4);
            let _ = engine.get_state();
            assert!(engine.queued_len() <= 4);
        }
        engine.stop();
        assert!(wait_until(|| !engine.is_busy()));
        assert!(engine.queued_len() <= 4);
    }

    #[test]
    fn test_states_arrive_in_production_order() {
        let engine = SimulationEngine::new(EngineSettings {
            particle_count: 20,
            max_states: 5,
            ..small_settings()
        });
        engine.start();

        let mut previous = next_state(&engine);
        assert_eq!(previous.generation(), 0);
        for _ in 0..40 {
            let state = next_state(&engine);
            assert_eq!(state.generation(), previous.generation() + 1);

            // Every particle is its predecessor moved one step, or recycled
            for p in state.particles() {
                let before = previous.particles().find(|q| q.id == p.id);
                let mut expected = match before {
                    Some(before) => *before,
                    None => panic!("particle {} vanished", p.id),
                };
                expected.step();
                if expected.validate(100.0, 100.0) {
                    assert_eq!((p.x, p.y), (expected.x, expected.y));
                }
            }
            previous = state;
        }
        engine.stop();
    }

    #[test]
    fn test_double_start_is_single_flight() {
        let engine = SimulationEngine::new(EngineSettings {
            max_states: 6,
            ..small_settings()
        });
        engine.start();
        engine.start();
        assert!(wait_until(|| engine.queued_len() == 6 && !engine.is_busy()));

        let generations: Vec<u64> = (0..6)
            .filter_map(|_| engine.get_state())
            .map(|s| s.generation())
            .collect();
        assert_eq!(generations.first(), Some(&0));
        for pair in generations.windows(2) {
            assert_eq!(pair[1], pair[0] + 1);
        }
        engine.stop();
    }

    #[test]
    fn test_stop_halts_refill() {
        let engine = SimulationEngine::new(small_settings());
        engine.start();
        assert!(wait_until(|| engine.queued_len() == 3 && !engine.is_busy()));

        engine.stop();
        assert!(!engine.is_running());
        while engine.get_state().is_some() {}

        thread::sleep(Duration::from_millis(50));
        assert_eq!(engine.queued_len(), 0);
        assert!(!engine.is_busy());
        assert!(engine.get_state().is_none());
    }

    #[test]
    fn test_restart_continues_sequence() {
        let engine = SimulationEngine::new(small_settings());
        engine.start();
        assert!(wait_until(|| engine.queued_len() == 3 && !engine.is_busy()));
        engine.stop();
        while engine.get_state().is_some() {}

        engine.start();
        let state = next_state(&engine);
        assert_eq!(state.generation(), 3);
    }

    #[test]
    fn test_empty_area_never_starts() {
        let engine = SimulationEngine::new(EngineSettings {
            width: 0.0,
            ..small_settings()
        });
        engine.start();
        assert!(!engine.is_running());
        assert_eq!(engine.status(), PipelineStatus::Idle);
        thread::sleep(Duration::from_millis(20));
        assert!(engine.get_state().is_none());
        assert_eq!(engine.queued_len(), 0);
    }

    #[test]
    fn test_seed_makes_production_reproducible() {
        let first = SimulationEngine::new(small_settings());
        let second = SimulationEngine::new(small_settings());
        first.start();
        second.start();

        for _ in 0..5 {
            let a = next_state(&first);
            let b = next_state(&second);
            let pa: Vec<(u32, f32, f32)> = a.particles().map(|p| (p.id, p.x, p.y)).collect();
            let pb: Vec<(u32, f32, f32)> = b.particles().map(|p| (p.id, p.x, p.y)).collect();
            assert_eq!(pa, pb);
            assert_eq!(a.lines().len(), b.lines().len());
        }
    }

    #[test]
    fn test_settings_are_sanitized() {
        let engine = SimulationEngine::new(EngineSettings {
            max_states: 0,
            alpha_min: Some(0.0),
            ..small_settings()
        });
        assert_eq!(engine.settings().max_states, 1);
        assert_eq!(engine.settings().alpha_min, None);
    }
}
