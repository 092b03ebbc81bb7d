use crate::app::{App, Focus};
use crate::braille;
use particle_field::PipelineStatus;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 24;

/// Max scroll for help content (generous to account for text wrapping on small screens)
pub const HELP_CONTENT_LINES: u16 = 40;

/// Number of lines in controls content
pub const CONTROLS_CONTENT_LINES: u16 = 9;

// UI color scheme
const BORDER_COLOR: Color = Color::Cyan;
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const TEXT_COLOR: Color = Color::White;
const DIM_TEXT_COLOR: Color = Color::Gray;

/// Creates a standard styled block with rounded borders
fn styled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(title)
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if app.fullscreen_mode {
        render_canvas(frame, area, app);
    } else {
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(area);

        render_sidebar(frame, layout[0], app);
        render_canvas(frame, layout[1], app);
    }

    if app.show_help {
        render_help_overlay(frame, area, app);
    }
}

/// Calculate the canvas size (excluding borders)
pub fn get_canvas_size(frame_area: Rect, fullscreen: bool) -> (u16, u16) {
    if fullscreen {
        (frame_area.width.saturating_sub(2), frame_area.height.saturating_sub(2))
    } else {
        let canvas_width = frame_area.width.saturating_sub(SIDEBAR_WIDTH + 2);
        let canvas_height = frame_area.height.saturating_sub(2);
        (canvas_width, canvas_height)
    }
}

/// Rows left for the controls box once status and params are laid out
pub fn get_controls_visible_lines(terminal_height: u16) -> u16 {
    terminal_height.saturating_sub(7 + 12 + 2)
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),  // Status
            Constraint::Length(12), // Parameters
            Constraint::Min(5),     // Controls
        ])
        .split(area);

    render_status_box(frame, sections[0], app);
    render_params_box(frame, sections[1], app);
    render_controls_box(frame, sections[2], app);
}

fn render_status_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Particle Field ");

    let (status_text, status_color) = match app.engine.status() {
        PipelineStatus::Producing => ("RUNNING", Color::Green),
        PipelineStatus::Idle => ("STOPPED", HIGHLIGHT_COLOR),
    };
    // Marks a production chain filling the queue right now
    let busy = if app.engine.is_busy() { " +" } else { "" };

    let settings = app.engine.settings();
    let (particles, lines, generation) = app
        .latest
        .as_ref()
        .map_or((0, 0, 0), |s| (s.particle_count(), s.lines().len(), s.generation()));

    let dim = Style::default().fg(DIM_TEXT_COLOR);
    let content = vec![
        Line::from(vec![
            Span::styled(status_text, Style::default().fg(status_color)),
            Span::styled(format!("  gen {}", generation), dim),
        ]),
        Line::from(Span::styled(
            format!("queue {}/{}{}", app.engine.queued_len(), settings.max_states, busy),
            Style::default().fg(TEXT_COLOR),
        )),
        Line::from(Span::styled(format!("{} pts  {} lines", particles, lines), dim)),
        Line::from(Span::styled(
            format!("draw {:.2}ms", app.stats.avg_draw_ms),
            dim,
        )),
        Line::from(Span::styled(
            format!("missed {}/{}", app.stats.missed, app.stats.missed + app.stats.drawn),
            dim,
        )),
    ];

    let paragraph = Paragraph::new(content).block(block);
    frame.render_widget(paragraph, area);
}

fn render_params_box(frame: &mut Frame, area: Rect, app: &App) {
    let title = match app.preset_name() {
        Some(name) => format!(" {} ", name),
        None => " Parameters ".to_string(),
    };
    let block = styled_block(&title);

    let make_line = |label: &str, value: String, focused: bool| {
        let prefix = if focused { "> " } else { "  " };
        let style = if focused {
            Style::default().fg(HIGHLIGHT_COLOR)
        } else {
            Style::default().fg(TEXT_COLOR)
        };
        Line::from(Span::styled(format!("{}{}: {}", prefix, label, value), style))
    };

    let settings = &app.config.settings;
    let alpha = settings
        .alpha_min
        .map_or("off".to_string(), |a| format!("{:.1}", a));

    let content = vec![
        make_line(
            "Particles",
            settings.particle_count.to_string(),
            app.focus == Focus::Particles,
        ),
        make_line(
            "Queue",
            settings.max_states.to_string(),
            app.focus == Focus::MaxStates,
        ),
        make_line(
            "Link",
            format!("{:.0}", settings.link_distance),
            app.focus == Focus::LinkDistance,
        ),
        make_line(
            "Radius",
            format!("{:.1}", settings.radius),
            app.focus == Focus::Radius,
        ),
        make_line(
            "Variance",
            format!("{:.1}", settings.radius_variance),
            app.focus == Focus::Variance,
        ),
        make_line("Alpha", alpha, app.focus == Focus::AlphaMin),
        make_line(
            "Lines",
            settings.line_style.name().to_string(),
            app.focus == Focus::LineStyle,
        ),
        make_line(
            "Min spd",
            format!("{:.1}", settings.min_speed),
            app.focus == Focus::MinSpeed,
        ),
        make_line(
            "Spd range",
            format!("{:.1}", settings.max_speed),
            app.focus == Focus::MaxSpeed,
        ),
        make_line(
            "Tick",
            format!("{}ms", app.config.tick_ms),
            app.focus == Focus::TickRate,
        ),
    ];

    // Calculate scroll to keep focused item visible based on actual area
    let focus_line = app.focus.line_index();
    let visible_height = area.height.saturating_sub(2);
    let content_height = content.len() as u16;

    let scroll = if visible_height == 0 || visible_height >= content_height {
        0
    } else if focus_line >= visible_height {
        focus_line.saturating_sub(visible_height - 1)
    } else {
        0
    };

    let paragraph = Paragraph::new(content)
        .block(block)
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_controls_box(frame: &mut Frame, area: Rect, app: &App) {
    let key_style = Style::default().fg(HIGHLIGHT_COLOR);
    let desc_style = Style::default().fg(DIM_TEXT_COLOR);

    let make_control = |key: &str, desc: &str| -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("{:>5}", key), key_style),
            Span::styled(format!(" {}", desc), desc_style),
        ])
    };

    let start_desc = if app.engine.is_running() { "stop" } else { "start" };
    let content = vec![
        make_control("Space", start_desc),
        make_control("Tab", "next param"),
        make_control("↑/↓", "adjust param"),
        make_control("R", "respawn"),
        make_control("P", "next preset"),
        make_control("V", "fullscreen"),
        make_control("H", "help"),
        make_control("Esc", "leave param"),
        make_control("Q", "quit"),
    ];

    let content_height = content.len() as u16;
    let visible_height = area.height.saturating_sub(2);
    let max_scroll = content_height.saturating_sub(visible_height);

    let title = if max_scroll > 0 {
        " Controls (↑↓) "
    } else {
        " Controls "
    };

    let paragraph = Paragraph::new(content)
        .block(styled_block(title))
        .scroll((app.controls_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_canvas(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block("");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(state) = &app.latest else {
        let hint = if app.engine.is_running() {
            "waiting for first frame..."
        } else {
            "press Space to start"
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(
            hint,
            Style::default().fg(DIM_TEXT_COLOR),
        )));
        frame.render_widget(paragraph, inner);
        return;
    };

    let cells = braille::render_to_braille(
        state,
        app.sim_width,
        app.sim_height,
        inner.width,
        inner.height,
        app.config.particle_color,
        app.config.line_color,
    );

    let buf = frame.buffer_mut();
    for cell in cells {
        let x = inner.x + cell.x;
        let y = inner.y + cell.y;

        if x < inner.x + inner.width && y < inner.y + inner.height {
            if let Some(target) = buf.cell_mut((x, y)) {
                target.set_char(cell.char).set_fg(cell.color);
            }
        }
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect, app: &App) {
    // Calculate the canvas area (exclude sidebar unless fullscreen)
    let canvas_x = if app.fullscreen_mode { 0 } else { SIDEBAR_WIDTH };
    let canvas_width = if app.fullscreen_mode {
        area.width
    } else {
        area.width.saturating_sub(SIDEBAR_WIDTH)
    };

    let help_width = 56.min(canvas_width.saturating_sub(4));
    let help_height = area.height.saturating_sub(4).min(30);
    let x = canvas_x + (canvas_width.saturating_sub(help_width)) / 2;
    let y = (area.height.saturating_sub(help_height)) / 2;

    let help_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: help_width,
        height: help_height,
    };

    frame.render_widget(Clear, help_area);

    let heading = Style::default().fg(HIGHLIGHT_COLOR);
    let topic = Style::default().fg(TEXT_COLOR);
    let content = vec![
        Line::from(""),
        Line::from(Span::styled("CONNECTED PARTICLE FIELD", Style::default().fg(BORDER_COLOR))),
        Line::from(""),
        Line::from("Particles drift across the canvas. Pairs closer than the link distance are joined by a line that fades with distance."),
        Line::from(""),
        Line::from(Span::styled("PIPELINE:", heading)),
        Line::from("Frames are computed ahead on a background thread. The queue shows how many are buffered; a missed frame keeps the last picture."),
        Line::from(""),
        Line::from(Span::styled("PARAMETERS:", heading)),
        Line::from(Span::styled("Link", topic)),
        Line::from("Maximum line length and grid cell size. 0 disables lines."),
        Line::from(Span::styled("Alpha", topic)),
        Line::from("Lowest particle opacity; off keeps every particle opaque."),
        Line::from(Span::styled("Lines", topic)),
        Line::from("Faded lines dim with distance, Strong lines are always bright."),
        Line::from(Span::styled("Min spd / Spd range", topic)),
        Line::from("Each particle gets a speed between min and min + range."),
        Line::from(""),
        Line::from(Span::styled("CONTROLS:", heading)),
        Line::from("Space=Start/Stop, R=Respawn, P=Preset, V=Fullscreen, Tab/Arrows=Adjust, Q=Quit"),
        Line::from(""),
    ];

    let content_height = content.len() as u16;
    let visible_height = help_height.saturating_sub(2);
    let max_scroll = content_height.saturating_sub(visible_height);

    let title = if max_scroll > 0 {
        " Help (J/K scroll, H to close) "
    } else {
        " Help (H to close) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(HIGHLIGHT_COLOR))
        .title(title);

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.help_scroll, 0));

    frame.render_widget(paragraph, help_area);
}
