use particle_field::SimulationState;
use ratatui::style::Color;

/// Braille character rendering for high-resolution terminal graphics.
/// Each Braille character represents a 2x4 grid of dots (8 dots total).
///
/// Dot positions and their bit values:
/// ```text
/// (0,0)=0x01  (1,0)=0x08
/// (0,1)=0x02  (1,1)=0x10
/// (0,2)=0x04  (1,2)=0x20
/// (0,3)=0x40  (1,3)=0x80
/// ```
///
/// Unicode Braille patterns: U+2800 to U+28FF (256 patterns)
const BRAILLE_BASE: u32 = 0x2800;

/// Dot position to bit mapping for Braille characters
const BRAILLE_DOTS: [[u8; 4]; 2] = [
    [0x01, 0x02, 0x04, 0x40], // Left column (x=0): rows 0,1,2,3
    [0x08, 0x10, 0x20, 0x80], // Right column (x=1): rows 0,1,2,3
];

/// A single rendered Braille cell with position and color
#[derive(Clone, Copy)]
pub struct BrailleCell {
    pub x: u16,
    pub y: u16,
    pub char: char,
    pub color: Color,
}

/// Strongest alpha that touched a dot, per layer
#[derive(Clone, Copy, Default)]
struct Dot {
    particle: u8,
    line: u8,
}

/// Dot-resolution raster of one frame
pub struct DotCanvas {
    width: usize,
    height: usize,
    dots: Vec<Dot>,
}

impl DotCanvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            dots: vec![Dot::default(); width * height],
        }
    }

    fn dot_mut(&mut self, x: i64, y: i64) -> Option<&mut Dot> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        self.dots.get_mut(y as usize * self.width + x as usize)
    }

    fn dot(&self, x: usize, y: usize) -> Dot {
        if x < self.width && y < self.height {
            self.dots[y * self.width + x]
        } else {
            Dot::default()
        }
    }

    /// Bresenham line between two dot positions
    pub fn draw_line(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, alpha: u8) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);

        loop {
            if let Some(dot) = self.dot_mut(x, y) {
                dot.line = dot.line.max(alpha);
            }
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Filled disc; always covers at least the center dot
    pub fn draw_disc(&mut self, cx: f32, cy: f32, radius: f32, alpha: u8) {
        let center_x = cx.floor() as i64;
        let center_y = cy.floor() as i64;
        let r = radius.max(0.0);
        let reach = r.ceil() as i64;

        for oy in -reach..=reach {
            for ox in -reach..=reach {
                if (ox * ox + oy * oy) as f32 <= r * r {
                    if let Some(dot) = self.dot_mut(center_x + ox, center_y + oy) {
                        dot.particle = dot.particle.max(alpha);
                    }
                }
            }
        }
    }
}

fn shade(color: [u8; 3], alpha: u8) -> Color {
    let scale = |c: u8| ((c as u16 * alpha as u16) / 255) as u8;
    Color::Rgb(scale(color[0]), scale(color[1]), scale(color[2]))
}

/// Rasterize a state (in `sim_width x sim_height` units) into Braille cells
pub fn render_to_braille(
    state: &SimulationState,
    sim_width: f32,
    sim_height: f32,
    canvas_width: u16,
    canvas_height: u16,
    particle_color: [u8; 3],
    line_color: [u8; 3],
) -> Vec<BrailleCell> {
    let braille_width = canvas_width as usize * 2;
    let braille_height = canvas_height as usize * 4;
    if braille_width == 0 || braille_height == 0 || sim_width <= 0.0 || sim_height <= 0.0 {
        return Vec::new();
    }

    // Scale factors (pre-calculated once)
    let scale_x = braille_width as f32 / sim_width;
    let scale_y = braille_height as f32 / sim_height;

    let mut canvas = DotCanvas::new(braille_width, braille_height);

    // Lines first so particles stay on top when both hit a dot
    for line in state.lines() {
        canvas.draw_line(
            (line.x1 * scale_x).floor() as i64,
            (line.y1 * scale_y).floor() as i64,
            (line.x2 * scale_x).floor() as i64,
            (line.y2 * scale_y).floor() as i64,
            line.alpha,
        );
    }
    for particle in state.particles() {
        canvas.draw_disc(
            particle.x * scale_x,
            particle.y * scale_y,
            particle.radius * scale_x.min(scale_y),
            particle.opacity.value(),
        );
    }

    let mut cells = Vec::with_capacity(canvas_width as usize * canvas_height as usize);

    for cy in 0..canvas_height {
        for cx in 0..canvas_width {
            let mut pattern: u8 = 0;
            let mut particle_alpha = 0u8;
            let mut line_alpha = 0u8;

            // Sample the 2x4 dots for this Braille character
            let base_bx = cx as usize * 2;
            let base_by = cy as usize * 4;

            for (dx, column) in BRAILLE_DOTS.iter().enumerate() {
                for (dy, bit) in column.iter().enumerate() {
                    let dot = canvas.dot(base_bx + dx, base_by + dy);
                    if dot.particle > 0 || dot.line > 0 {
                        pattern |= bit;
                        particle_alpha = particle_alpha.max(dot.particle);
                        line_alpha = line_alpha.max(dot.line);
                    }
                }
            }

            // Only emit cells that have at least one dot
            if pattern != 0 {
                let braille_char = char::from_u32(BRAILLE_BASE + pattern as u32).unwrap_or(' ');
                let color = if particle_alpha > 0 {
                    shade(particle_color, particle_alpha)
                } else {
                    shade(line_color, line_alpha)
                };

                cells.push(BrailleCell {
                    x: cx,
                    y: cy,
                    char: braille_char,
                    color,
                });
            }
        }
    }

    cells
}

/// Simulation area for a given canvas size, one unit per Braille dot
pub fn calculate_simulation_size(canvas_width: u16, canvas_height: u16) -> (f32, f32) {
    let width = (canvas_width as usize * 2).max(64);
    let height = (canvas_height as usize * 4).max(64);
    (width as f32, height as f32)
}
