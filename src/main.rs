mod app;
mod braille;
mod ui;

use anyhow::{bail, Context};
use app::{App, Focus};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use particle_field::config::AppConfig;
use particle_field::presets::{Preset, PresetManager};
use particle_field::{EngineSettings, LineStyle, SimulationEngine};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "particle-field")]
#[command(about = "Drifting particles linked by proximity, precomputed on a background thread")]
struct Args {
    // === Population ===
    /// Number of particles (1-1000)
    #[arg(short = 'p', long)]
    particles: Option<usize>,

    /// Lookahead queue capacity (1-200)
    #[arg(long = "max-states")]
    max_states: Option<usize>,

    // === Area (headless only; the terminal decides it otherwise) ===
    /// Simulation width in headless mode
    #[arg(long)]
    width: Option<f32>,

    /// Simulation height in headless mode
    #[arg(long)]
    height: Option<f32>,

    // === Look ===
    /// Maximum distance for a connecting line (0 disables lines)
    #[arg(short = 'l', long = "link-distance")]
    link_distance: Option<f32>,

    /// Base particle radius
    #[arg(long)]
    radius: Option<f32>,

    /// Relative radius spread (0.0-1.0)
    #[arg(long = "radius-variance")]
    radius_variance: Option<f32>,

    /// Particle opacity floor (0.0-1.0, 0 = fully opaque)
    #[arg(long = "alpha-min")]
    alpha_min: Option<f32>,

    /// Draw every line fully opaque
    #[arg(long = "strong-lines")]
    strong_lines: bool,

    // === Motion ===
    /// Lowest speed multiplier
    #[arg(long = "min-speed")]
    min_speed: Option<f32>,

    /// Width of the speed range above the minimum
    #[arg(long = "max-speed")]
    max_speed: Option<f32>,

    /// Fixed RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    // === Host ===
    /// Milliseconds between frame requests
    #[arg(long = "tick-ms")]
    tick_ms: Option<u64>,

    /// Load settings from a JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the resolved settings to a JSON config file and exit
    #[arg(long = "save-config")]
    save_config: Option<PathBuf>,

    /// Start from a named preset
    #[arg(long)]
    preset: Option<String>,

    /// Print the available presets and exit
    #[arg(long = "list-presets")]
    list_presets: bool,

    /// Store the resolved settings as a user preset and exit
    #[arg(long = "save-preset")]
    save_preset: Option<String>,

    /// Pull this many frames without a terminal UI and report timings
    #[arg(long, value_name = "FRAMES")]
    headless: Option<u64>,

    /// Write logs to this file while the terminal UI is active
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

impl Args {
    /// Layer command line overrides on top of loaded settings
    fn apply_to(&self, settings: &mut EngineSettings) {
        if let Some(v) = self.particles {
            settings.particle_count = v.clamp(1, 1000);
        }
        if let Some(v) = self.max_states {
            settings.max_states = v.clamp(1, 200);
        }
        if let Some(v) = self.width {
            settings.width = v;
        }
        if let Some(v) = self.height {
            settings.height = v;
        }
        if let Some(v) = self.link_distance {
            settings.link_distance = v;
        }
        if let Some(v) = self.radius {
            settings.radius = v;
        }
        if let Some(v) = self.radius_variance {
            settings.radius_variance = v;
        }
        if let Some(v) = self.alpha_min {
            settings.alpha_min = Some(v);
        }
        if self.strong_lines {
            settings.line_style = LineStyle::Strong;
        }
        if let Some(v) = self.min_speed {
            settings.min_speed = v;
        }
        if let Some(v) = self.max_speed {
            settings.max_speed = v;
        }
        if self.seed.is_some() {
            settings.seed = self.seed;
        }
    }
}

/// Install the log subscriber; the terminal UI only logs when given a file
fn init_tracing(args: &Args) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if args.headless.is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    } else if let Some(path) = &args.log_file {
        let file = File::create(path)
            .with_context(|| format!("failed to create log file '{}'", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
    Ok(())
}

/// Config file, then preset, then command line flags
fn resolve_config(args: &Args, presets: &PresetManager) -> anyhow::Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::default(),
    };

    if let Some(name) = &args.preset {
        let Some(preset) = presets.find(name) else {
            bail!(
                "unknown preset '{}' (available: {})",
                name,
                presets.preset_names().join(", ")
            );
        };
        info!(name = %preset.name, "Using preset");
        config.settings = preset.settings.clone();
    }

    args.apply_to(&mut config.settings);
    if let Some(tick_ms) = args.tick_ms {
        config.tick_ms = tick_ms.max(1);
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args)?;

    let mut presets = PresetManager::new();

    if args.list_presets {
        for preset in presets.all_presets() {
            println!("{:<16} {}", preset.name, preset.description);
        }
        return Ok(());
    }

    let config = resolve_config(&args, &presets)?;

    if let Some(path) = &args.save_config {
        config.save_to_file(path)?;
        println!("Saved config to {}", path.display());
        return Ok(());
    }

    if let Some(name) = &args.save_preset {
        presets.save_preset(Preset::new(
            name.as_str(),
            "Saved from the command line",
            config.settings.clone(),
        ))?;
        println!("Saved preset '{}'", name);
        return Ok(());
    }

    if let Some(frames) = args.headless {
        return run_headless(&config, frames);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    let frame_rect = ratatui::layout::Rect {
        x: 0,
        y: 0,
        width: size.width,
        height: size.height,
    };
    let (canvas_width, canvas_height) = ui::get_canvas_size(frame_rect, false);
    let mut app = App::new(canvas_width, canvas_height, config, presets);
    app.toggle_running();

    let res = run_app(&mut terminal, &mut app);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.context("terminal UI failed")
}

/// Pull `frames` states at the configured tick rate and report what arrived
fn run_headless(config: &AppConfig, frames: u64) -> anyhow::Result<()> {
    let engine = SimulationEngine::new(config.settings.clone());
    if !engine.settings().has_area() {
        bail!("headless mode needs a non-zero --width and --height");
    }

    let tick = Duration::from_millis(config.tick_ms);
    let mut drawn = 0u64;
    let mut missed = 0u64;
    let mut total_lines = 0usize;
    let started = Instant::now();

    engine.start();
    for _ in 0..frames {
        std::thread::sleep(tick);
        match engine.get_state() {
            Some(state) => {
                drawn += 1;
                total_lines += state.lines().len();
            }
            None => missed += 1,
        }
    }
    engine.stop();

    let avg_lines = if drawn > 0 {
        total_lines as f64 / drawn as f64
    } else {
        0.0
    };
    if missed > 0 {
        warn!(missed, frames, "Producer fell behind the tick rate");
    }
    info!(
        particles = engine.settings().particle_count,
        drawn,
        missed,
        avg_lines,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Headless run finished"
    );
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    let mut last_tick = Instant::now();

    loop {
        let draw_start = Instant::now();
        terminal.draw(|frame| ui::render(frame, app))?;
        app.stats.record_draw(draw_start.elapsed());

        // Draw time counts against the frame interval
        let timeout = app.tick_interval().saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }

                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }

                    match key.code {
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char(' ') => app.toggle_running(),
                        KeyCode::Char('r') | KeyCode::Char('R') => app.reset(),
                        KeyCode::Char('p') | KeyCode::Char('P') => app.cycle_preset(),
                        KeyCode::Char('v') | KeyCode::Char('V') => {
                            app.toggle_fullscreen();
                            let size = terminal.size()?;
                            let (canvas_width, canvas_height) = ui::get_canvas_size(
                                ratatui::layout::Rect {
                                    x: 0,
                                    y: 0,
                                    width: size.width,
                                    height: size.height,
                                },
                                app.fullscreen_mode,
                            );
                            app.resize(canvas_width, canvas_height);
                        }
                        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => {
                            app.toggle_help()
                        }

                        // Navigation
                        KeyCode::Tab => app.next_focus(),
                        KeyCode::BackTab => app.prev_focus(),
                        KeyCode::Up => {
                            if !app.show_help {
                                if app.focus.is_param() {
                                    app.adjust_focused_up();
                                } else {
                                    app.scroll_controls_up();
                                }
                            }
                        }
                        KeyCode::Down => {
                            if !app.show_help {
                                if app.focus.is_param() {
                                    app.adjust_focused_down();
                                } else {
                                    let term_size = terminal.size()?;
                                    let visible = ui::get_controls_visible_lines(term_size.height);
                                    app.scroll_controls_down(
                                        ui::CONTROLS_CONTENT_LINES.saturating_sub(visible),
                                    );
                                }
                            }
                        }
                        KeyCode::Esc => {
                            if app.show_help {
                                app.toggle_help();
                            } else if app.focus.is_param() {
                                app.focus = Focus::Controls;
                            }
                        }
                        KeyCode::Char('j') | KeyCode::Char('J') => {
                            if app.show_help {
                                app.scroll_help_down(ui::HELP_CONTENT_LINES);
                            }
                        }
                        KeyCode::Char('k') | KeyCode::Char('K') => {
                            if app.show_help {
                                app.scroll_help_up();
                            }
                        }
                        _ => {}
                    }
                }
                Event::Resize(width, height) => {
                    let (canvas_width, canvas_height) = ui::get_canvas_size(
                        ratatui::layout::Rect {
                            x: 0,
                            y: 0,
                            width,
                            height,
                        },
                        app.fullscreen_mode,
                    );
                    app.resize(canvas_width, canvas_height);
                }
                _ => {}
            }
        }

        if last_tick.elapsed() >= app.tick_interval() {
            app.tick();
            last_tick = Instant::now();
        }
    }
}
