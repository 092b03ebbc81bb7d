use crate::connections::{derive_lines, Line};
use crate::grid::{grid_shape, SpatialGrid};
use crate::particle::{Particle, OFF_BOUNDS_MARGIN};
use crate::settings::EngineSettings;
use rand::Rng;

/// Immutable snapshot of one animation frame
#[derive(Debug, Clone)]
pub struct SimulationState {
    generation: u64,
    grid: SpatialGrid,
    lines: Vec<Line>,
}

impl SimulationState {
    /// Spawn `particle_count` particles at random and link them.
    ///
    /// An area with a zero dimension places no particles.
    pub fn initial<R: Rng + ?Sized>(settings: &EngineSettings, rng: &mut R) -> Self {
        let (rows, cols) = grid_shape(settings.width, settings.height, settings.link_distance);
        if !settings.has_area() {
            return Self {
                generation: 0,
                grid: SpatialGrid::new(rows, cols),
                lines: Vec::new(),
            };
        }

        let particles =
            (0..settings.particle_count).map(|id| Particle::spawn(id as u32, settings, rng));
        let grid = SpatialGrid::bucket(particles, settings.width, settings.height, rows, cols);
        let lines = derive_lines(&grid, settings.link_distance, settings.line_style);

        Self {
            generation: 0,
            grid,
            lines,
        }
    }

    /// Derive the next frame: move copies of every particle, recycle the lost
    /// ones, re-bucket and re-link. `self` is left untouched.
    pub fn advance<R: Rng + ?Sized>(&self, settings: &EngineSettings, rng: &mut R) -> Self {
        if !settings.has_area() {
            return self.clone();
        }

        let (width, height) = (settings.width, settings.height);
        let mut grid = SpatialGrid::new(self.grid.rows(), self.grid.cols());

        // One span for the whole state, widened by the largest possible radius.
        // Particles bucketed over different spans would not share cell borders.
        let margin = OFF_BOUNDS_MARGIN * settings.max_radius();
        let (span_x, span_y) = (width + margin, height + margin);

        for particle in self.grid.particles() {
            let mut next = *particle;
            next.advance(width, height, rng);
            grid.insert(next, span_x, span_y);
        }

        let lines = derive_lines(&grid, settings.link_distance, settings.line_style);

        Self {
            generation: self.generation + 1,
            grid,
            lines,
        }
    }

    /// Position of this state in the production sequence, starting at 0
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Every particle as a flat sequence
    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.grid.particles()
    }

    pub fn particle_count(&self) -> usize {
        self.grid.len()
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn settings() -> EngineSettings {
        EngineSettings {
            particle_count: 40,
            width: 100.0,
            height: 80.0,
            link_distance: 20.0,
            radius: 2.0,
            min_speed: 0.5,
            max_speed: 2.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_initial_state() {
        let mut rng = StdRng::seed_from_u64(1);
        let state = SimulationState::initial(&settings(), &mut rng);
        assert_eq!(state.generation(), 0);
        assert_eq!(state.particle_count(), 40);
        assert_eq!(state.grid().rows(), 4);
        assert_eq!(state.grid().cols(), 5);
        assert!(state.lines().iter().all(|l| l.distance < 20.0));

        let mut ids: Vec<u32> = state.particles().map(|p| p.id).collect();
        ids.sort();
        assert_eq!(ids, (0..40).collect::<Vec<u32>>());
    }

    #[test]
    fn test_zero_area_places_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        let flat = EngineSettings {
            height: 0.0,
            ..settings()
        };
        let state = SimulationState::initial(&flat, &mut rng);
        assert_eq!(state.particle_count(), 0);
        assert!(state.lines().is_empty());

        let next = state.advance(&flat, &mut rng);
        assert_eq!(next.generation(), 0);
        assert_eq!(next.particle_count(), 0);
    }

    #[test]
    fn test_advance_is_one_step_mutation() {
        let settings = settings();
        let mut rng = StdRng::seed_from_u64(2);
        let mut state = SimulationState::initial(&settings, &mut rng);

        for _ in 0..200 {
            let next = state.advance(&settings, &mut rng);
            assert_eq!(next.generation(), state.generation() + 1);
            assert_eq!(next.particle_count(), state.particle_count());

            let previous: HashMap<u32, Particle> =
                state.particles().map(|p| (p.id, *p)).collect();
            for p in next.particles() {
                let mut expected = previous[&p.id];
                expected.step();
                if expected.validate(settings.width, settings.height) {
                    assert_eq!((p.x, p.y), (expected.x, expected.y));
                    assert_eq!((p.vx, p.vy), (expected.vx, expected.vy));
                } else {
                    // Recycled: sits just outside one edge and is valid again
                    assert!(p.validate(settings.width, settings.height));
                }
                assert_eq!(p.radius, expected.radius);
                assert_eq!(p.speed, expected.speed);
            }
            state = next;
        }
    }

    #[test]
    fn test_advance_keeps_cells_in_range() {
        let settings = EngineSettings {
            radius: 6.0,
            min_speed: 3.0,
            ..settings()
        };
        let mut rng = StdRng::seed_from_u64(5);
        let mut state = SimulationState::initial(&settings, &mut rng);
        for _ in 0..100 {
            state = state.advance(&settings, &mut rng);
            let grid = state.grid();
            let mut total = 0;
            for row in 0..grid.rows() {
                for col in 0..grid.cols() {
                    total += grid.cell(row, col).len();
                }
            }
            assert_eq!(total, settings.particle_count);
        }
    }

    fn assert_close_pairs_linked_once(state: &SimulationState, link: f32) {
        let mut counts: HashMap<(u32, u32), usize> = HashMap::new();
        for line in state.lines() {
            let key = (line.from.min(line.to), line.from.max(line.to));
            *counts.entry(key).or_default() += 1;
        }

        let particles: Vec<&Particle> = state.particles().collect();
        for a in &particles {
            for b in &particles {
                if a.id >= b.id {
                    continue;
                }
                let d = a.distance(b);
                let expected = usize::from(d > 0.0 && d < link);
                assert_eq!(
                    counts.get(&(a.id, b.id)).copied().unwrap_or(0),
                    expected,
                    "pair ({}, {}) at distance {} in generation {}",
                    a.id,
                    b.id,
                    d,
                    state.generation()
                );
            }
        }
    }

    #[test]
    fn test_mixed_radii_pair_is_linked_after_advance() {
        let settings = EngineSettings {
            particle_count: 2,
            width: 100.0,
            height: 100.0,
            link_distance: 20.0,
            radius: 4.0,
            radius_variance: 0.5,
            ..Default::default()
        };
        let mut small = Particle::spawn(0, &settings, &mut StdRng::seed_from_u64(1));
        small.x = 85.0;
        small.y = 50.0;
        small.radius = 2.0;
        small.speed = 0.0;
        let mut large = small;
        large.id = 1;
        large.x = 70.0;
        large.radius = 6.0;

        let (rows, cols) = grid_shape(100.0, 100.0, 20.0);
        let state = SimulationState {
            generation: 0,
            grid: SpatialGrid::bucket([small, large], 100.0, 100.0, rows, cols),
            lines: Vec::new(),
        };

        let next = state.advance(&settings, &mut StdRng::seed_from_u64(2));
        assert_eq!(next.lines().len(), 1);
        assert_eq!(next.lines()[0].distance, 15.0);
    }

    #[test]
    fn test_advanced_states_link_every_close_pair_once() {
        let settings = EngineSettings {
            particle_count: 80,
            width: 120.0,
            height: 90.0,
            link_distance: 15.0,
            radius: 3.0,
            radius_variance: 0.8,
            min_speed: 0.5,
            max_speed: 3.0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(21);
        let mut state = SimulationState::initial(&settings, &mut rng);
        assert_close_pairs_linked_once(&state, settings.link_distance);

        for _ in 0..150 {
            state = state.advance(&settings, &mut rng);
            assert_close_pairs_linked_once(&state, settings.link_distance);
        }
    }

    #[test]
    fn test_advance_does_not_touch_source() {
        let settings = settings();
        let mut rng = StdRng::seed_from_u64(8);
        let state = SimulationState::initial(&settings, &mut rng);
        let before: Vec<(f32, f32)> = state.particles().map(|p| (p.x, p.y)).collect();
        let _ = state.advance(&settings, &mut rng);
        let after: Vec<(f32, f32)> = state.particles().map(|p| (p.x, p.y)).collect();
        assert_eq!(before, after);
    }
}
