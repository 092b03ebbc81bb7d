//! Uniform spatial grid used to find connection candidates.
//!
//! Cells are at least `link_distance` wide, so every particle closer than
//! the link distance to a particle in cell `(r, c)` lives in one of the
//! nine cells around it.

use crate::particle::Particle;

/// Row and column counts for an area partitioned by `link_distance`.
///
/// A non-positive link distance yields a single cell covering everything.
pub fn grid_shape(width: f32, height: f32, link_distance: f32) -> (usize, usize) {
    if link_distance > 0.0 && link_distance.is_finite() {
        let rows = (height / link_distance) as usize;
        let cols = (width / link_distance) as usize;
        (rows.max(1), cols.max(1))
    } else {
        (1, 1)
    }
}

/// Map a coordinate to a cell index along one axis, clamped into `0..count`.
///
/// Zero or non-finite spans place everything in cell 0.
pub fn axis_index(pos: f32, span: f32, count: usize) -> usize {
    if count <= 1 || !span.is_finite() || span <= 0.0 {
        return 0;
    }
    let raw = ((pos / span) * count as f32).floor();
    if raw.is_nan() || raw < 0.0 {
        0
    } else {
        (raw as usize).min(count - 1)
    }
}

/// Particles bucketed into `rows x cols` cells, row-major
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    rows: usize,
    cols: usize,
    cells: Vec<Vec<Particle>>,
}

impl SpatialGrid {
    /// An empty grid; zero dimensions are raised to one
    pub fn new(rows: usize, cols: usize) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        Self {
            rows,
            cols,
            cells: vec![Vec::new(); rows * cols],
        }
    }

    /// Full rebuild: place every particle by its position over `width x height`
    pub fn bucket<I>(particles: I, width: f32, height: f32, rows: usize, cols: usize) -> Self
    where
        I: IntoIterator<Item = Particle>,
    {
        let mut grid = Self::new(rows, cols);
        for particle in particles {
            grid.insert(particle, width, height);
        }
        grid
    }

    /// Insert a particle, using `span_x x span_y` as the divisor area
    pub fn insert(&mut self, particle: Particle, span_x: f32, span_y: f32) {
        let (row, col) = self.cell_of(particle.x, particle.y, span_x, span_y);
        self.cells[row * self.cols + col].push(particle);
    }

    /// Cell a position falls into over `span_x x span_y`
    pub fn cell_of(&self, x: f32, y: f32, span_x: f32, span_y: f32) -> (usize, usize) {
        (
            axis_index(y, span_y, self.rows),
            axis_index(x, span_x, self.cols),
        )
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Particles in one cell, in insertion order
    pub fn cell(&self, row: usize, col: usize) -> &[Particle] {
        if row < self.rows && col < self.cols {
            &self.cells[row * self.cols + col]
        } else {
            &[]
        }
    }

    /// Total number of particles
    pub fn len(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Vec::is_empty)
    }

    /// All particles as a flat sequence: row-major over cells, insertion order within a cell
    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.cells.iter().flatten()
    }

    /// Flat-sequence index of the first particle of every cell
    pub fn cell_offsets(&self) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.cells.len());
        let mut next = 0;
        for cell in &self.cells {
            offsets.push(next);
            next += cell.len();
        }
        offsets
    }

    /// Visit every particle in `(row, col)` and its existing 8 neighbors.
    ///
    /// `visit` receives the particle's flat-sequence index. Offsets outside
    /// the grid are skipped, never wrapped.
    pub fn for_each_neighbor<F>(&self, row: usize, col: usize, offsets: &[usize], mut visit: F)
    where
        F: FnMut(usize, &Particle),
    {
        for dr in -1i64..=1 {
            let r = row as i64 + dr;
            if r < 0 || r >= self.rows as i64 {
                continue;
            }
            for dc in -1i64..=1 {
                let c = col as i64 + dc;
                if c < 0 || c >= self.cols as i64 {
                    continue;
                }
                let idx = r as usize * self.cols + c as usize;
                let base = offsets[idx];
                for (i, particle) in self.cells[idx].iter().enumerate() {
                    visit(base + i, particle);
                }
            }
        }
    }
}
