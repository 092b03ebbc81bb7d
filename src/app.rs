use crate::braille;
use particle_field::config::AppConfig;
use particle_field::presets::{Preset, PresetManager};
use particle_field::{SimulationEngine, SimulationState};
use std::time::Duration;
use tracing::{debug, info};

/// Frames between two draw-time log lines
const DRAW_LOG_INTERVAL: u64 = 120;

/// Bounds for the frame interval editor
const MIN_TICK_MS: u64 = 1;
const MAX_TICK_MS: u64 = 1000;

/// Focus state for parameter editing in the sidebar
/// Ordered as displayed in the parameters box
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Focus {
    #[default]
    None,
    Particles,
    MaxStates,
    LinkDistance,
    Radius,
    Variance,
    AlphaMin,
    LineStyle,
    MinSpeed,
    MaxSpeed,
    TickRate,
    // Controls box (not a param)
    Controls,
}

impl Focus {
    const PARAMS: [Focus; 10] = [
        Focus::Particles,
        Focus::MaxStates,
        Focus::LinkDistance,
        Focus::Radius,
        Focus::Variance,
        Focus::AlphaMin,
        Focus::LineStyle,
        Focus::MinSpeed,
        Focus::MaxSpeed,
        Focus::TickRate,
    ];

    /// Tab cycles through parameters top to bottom
    pub fn next(&self) -> Focus {
        match self.position() {
            Some(idx) => Self::PARAMS[(idx + 1) % Self::PARAMS.len()],
            None => Self::PARAMS[0],
        }
    }

    /// Shift+Tab cycles through parameters bottom to top
    pub fn prev(&self) -> Focus {
        match self.position() {
            Some(0) | None => Self::PARAMS[Self::PARAMS.len() - 1],
            Some(idx) => Self::PARAMS[idx - 1],
        }
    }

    /// Get the line index in the parameters box for this focus
    pub fn line_index(&self) -> u16 {
        self.position().unwrap_or(0) as u16
    }

    /// Check if focus is on a parameter (not Controls or None)
    pub fn is_param(&self) -> bool {
        !matches!(self, Focus::None | Focus::Controls)
    }

    fn position(&self) -> Option<usize> {
        Self::PARAMS.iter().position(|f| f == self)
    }
}

/// Draw statistics for the frames shown so far
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    /// Frames that showed a freshly pulled state
    pub drawn: u64,
    /// Frame requests where the queue had nothing ready
    pub missed: u64,
    /// Smoothed draw time in milliseconds
    pub avg_draw_ms: f64,
    frames: u64,
}

impl FrameStats {
    /// Fold one draw duration into the average, halving the weight of history each frame
    pub fn record_draw(&mut self, elapsed: Duration) {
        let ms = elapsed.as_secs_f64() * 1000.0;
        self.avg_draw_ms = if self.frames == 0 {
            ms
        } else {
            (self.avg_draw_ms + ms) / 2.0
        };
        self.frames += 1;

        if self.frames % DRAW_LOG_INTERVAL == 0 {
            debug!(
                avg_draw_ms = self.avg_draw_ms,
                elapsed_ms = ms,
                drawn = self.drawn,
                missed = self.missed,
                "Draw timing"
            );
        }
    }
}

/// Main application state
pub struct App {
    pub engine: SimulationEngine,
    pub config: AppConfig,
    pub presets: PresetManager,
    /// Index into `presets.all_presets()` of the last applied preset
    pub preset_idx: Option<usize>,
    /// Last state pulled from the engine; stays on screen while nothing new is ready
    pub latest: Option<SimulationState>,
    pub sim_width: f32,
    pub sim_height: f32,
    pub focus: Focus,
    pub fullscreen_mode: bool,
    pub show_help: bool,
    pub help_scroll: u16,
    pub controls_scroll: u16,
    pub stats: FrameStats,
}

impl App {
    pub fn new(
        canvas_width: u16,
        canvas_height: u16,
        config: AppConfig,
        presets: PresetManager,
    ) -> Self {
        let (sim_width, sim_height) = braille::calculate_simulation_size(canvas_width, canvas_height);
        let engine = SimulationEngine::new(config.settings.with_area(sim_width, sim_height));
        Self {
            engine,
            config,
            presets,
            preset_idx: None,
            latest: None,
            sim_width,
            sim_height,
            focus: Focus::Controls,
            fullscreen_mode: false,
            show_help: false,
            help_scroll: 0,
            controls_scroll: 0,
            stats: FrameStats::default(),
        }
    }

    /// Frame interval requested by the config
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.config.tick_ms)
    }

    /// Pull the next precomputed state while running
    pub fn tick(&mut self) {
        if !self.engine.is_running() {
            return;
        }
        match self.engine.get_state() {
            Some(state) => {
                self.latest = Some(state);
                self.stats.drawn += 1;
            }
            None => self.stats.missed += 1,
        }
    }

    /// Start or stop producing (Space)
    pub fn toggle_running(&mut self) {
        if self.engine.is_running() {
            self.engine.stop();
        } else {
            self.engine.start();
        }
    }

    /// Replace the engine with one built from the current config, keeping the run state
    fn rebuild_engine(&mut self) {
        let was_running = self.engine.is_running();
        self.engine = SimulationEngine::new(
            self.config
                .settings
                .with_area(self.sim_width, self.sim_height),
        );
        if was_running {
            self.engine.start();
        }
    }

    /// Fresh particles with the same settings
    pub fn reset(&mut self) {
        self.latest = None;
        self.rebuild_engine();
    }

    /// Handle adjusting the currently focused parameter
    pub fn adjust_focused_up(&mut self) {
        self.adjust_focused(1);
    }

    /// Handle adjusting the currently focused parameter
    pub fn adjust_focused_down(&mut self) {
        self.adjust_focused(-1);
    }

    fn adjust_focused(&mut self, direction: i32) {
        match self.focus {
            Focus::None | Focus::Controls => return,
            Focus::TickRate => {
                self.adjust_tick_ms(direction * 4);
                return;
            }
            _ => {}
        }

        let step = direction as f32;
        let settings = &mut self.config.settings;
        match self.focus {
            Focus::None | Focus::Controls | Focus::TickRate => {}
            Focus::Particles => settings.adjust_particle_count(direction * 10),
            Focus::MaxStates => settings.adjust_max_states(direction * 5),
            Focus::LinkDistance => settings.adjust_link_distance(step * 2.0),
            Focus::Radius => settings.adjust_radius(step * 0.5),
            Focus::Variance => settings.adjust_radius_variance(step * 0.1),
            Focus::AlphaMin => settings.adjust_alpha_min(step * 0.1),
            Focus::LineStyle => settings.cycle_line_style(),
            Focus::MinSpeed => settings.adjust_min_speed(step * 0.1),
            Focus::MaxSpeed => settings.adjust_max_speed(step * 0.1),
        }
        self.rebuild_engine();
    }

    /// Change the frame interval by `delta` milliseconds
    pub fn adjust_tick_ms(&mut self, delta: i32) {
        let tick = self.config.tick_ms as i64 + delta as i64;
        self.config.tick_ms = tick.clamp(MIN_TICK_MS as i64, MAX_TICK_MS as i64) as u64;
    }

    /// Apply the next preset in the list (P)
    pub fn cycle_preset(&mut self) {
        let count = self.presets.all_presets().count();
        if count == 0 {
            return;
        }
        let idx = self.preset_idx.map_or(0, |i| (i + 1) % count);
        let preset = self.presets.all_presets().nth(idx).cloned();
        if let Some(preset) = preset {
            self.preset_idx = Some(idx);
            self.apply_preset(&preset);
        }
    }

    /// Take over a preset's engine settings
    pub fn apply_preset(&mut self, preset: &Preset) {
        info!(name = %preset.name, "Applying preset");
        self.config.settings = preset.settings.clone();
        self.rebuild_engine();
    }

    /// Name of the last applied preset, if any
    pub fn preset_name(&self) -> Option<&str> {
        self.preset_idx
            .and_then(|i| self.presets.all_presets().nth(i))
            .map(|p| p.name.as_str())
    }

    /// Cycle to next focus
    pub fn next_focus(&mut self) {
        self.focus = self.focus.next();
    }

    /// Navigate to previous parameter (Shift+Tab)
    pub fn prev_focus(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Toggle fullscreen mode
    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen_mode = !self.fullscreen_mode;
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0;
        }
    }

    pub fn scroll_help_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(1);
    }

    pub fn scroll_help_down(&mut self, max_scroll: u16) {
        self.help_scroll = (self.help_scroll + 1).min(max_scroll);
    }

    pub fn scroll_controls_up(&mut self) {
        self.controls_scroll = self.controls_scroll.saturating_sub(1);
    }

    pub fn scroll_controls_down(&mut self, max_scroll: u16) {
        self.controls_scroll = (self.controls_scroll + 1).min(max_scroll);
    }

    /// Match the simulation area to a new canvas size
    pub fn resize(&mut self, canvas_width: u16, canvas_height: u16) {
        let (sim_width, sim_height) = braille::calculate_simulation_size(canvas_width, canvas_height);
        if sim_width == self.sim_width && sim_height == self.sim_height {
            return;
        }
        self.sim_width = sim_width;
        self.sim_height = sim_height;
        // Old coordinates no longer fit the canvas
        self.latest = None;
        self.rebuild_engine();
    }
}
