use crate::settings::EngineSettings;
use rand::Rng;

/// Labels handed out to particles; purely for diagnostics
const NAMES: &[&str] = &[
    "Ada", "Bolt", "Cinder", "Dot", "Ember", "Flick", "Glint", "Halo", "Iris", "Jolt", "Kite",
    "Lumen", "Mote", "Nova", "Orbit", "Pip", "Quark", "Ray", "Spark", "Twinkle", "Umbra",
    "Vega", "Wisp", "Xeno", "Yarrow", "Zephyr",
];

/// How far (in radii) a particle may drift past an edge before it is recycled
pub const OFF_BOUNDS_MARGIN: f32 = 3.0;

/// How far (in radii) outside an edge a recycled particle is placed
const RESPAWN_OFFSET: f32 = 1.0;

/// Along-edge clearance (in radii) from the corners for a recycled particle
const CORNER_CLEARANCE: f32 = 2.0;

/// Corner clearance floor in simulation units, for particles with no radius
const MIN_CORNER_CLEARANCE: f32 = 1.0;

/// Particle opacity; `Opaque` resolves to 255 when drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Opacity {
    #[default]
    Opaque,
    Translucent(u8),
}

impl Opacity {
    /// Concrete alpha byte for a renderer
    pub fn value(&self) -> u8 {
        match self {
            Opacity::Opaque => u8::MAX,
            Opacity::Translucent(alpha) => *alpha,
        }
    }
}

/// One side of the simulation rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Top, Edge::Bottom, Edge::Left, Edge::Right];

    fn random<R: Rng + ?Sized>(rng: &mut R) -> Edge {
        Edge::ALL[rng.gen_range(0..Edge::ALL.len())]
    }

    /// Distance from a point to this edge's line
    #[cfg(test)]
    fn distance(&self, x: f32, y: f32, width: f32, height: f32) -> f32 {
        match self {
            Edge::Top => y.abs(),
            Edge::Bottom => (y - height).abs(),
            Edge::Left => x.abs(),
            Edge::Right => (x - width).abs(),
        }
    }
}

/// A moving dot in simulation space
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    /// Stable index assigned at spawn
    pub id: u32,
    /// Diagnostic name, not part of identity
    pub label: &'static str,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Velocity multiplier, fixed at creation
    pub speed: f32,
    pub radius: f32,
    pub opacity: Opacity,
}

impl Particle {
    /// Create a particle with randomized look and motion at a random spot inside the area
    pub fn spawn<R: Rng + ?Sized>(id: u32, settings: &EngineSettings, rng: &mut R) -> Self {
        let variance = settings.radius * settings.radius_variance;
        let radius_min = settings.radius - variance;
        let radius_max = settings.radius + variance;
        let radius = radius_min + rng.gen::<f32>() * (radius_max - radius_min);

        let opacity = match settings.alpha_min {
            Some(alpha_min) => {
                let alpha = ((alpha_min + rng.gen::<f32>()) * 255.0).clamp(0.0, 255.0);
                Opacity::Translucent(alpha as u8)
            }
            None => Opacity::Opaque,
        };

        Self {
            id,
            label: NAMES[rng.gen_range(0..NAMES.len())],
            x: rng.gen::<f32>() * settings.width,
            y: rng.gen::<f32>() * settings.height,
            vx: rng.gen_range(-1.0..=1.0),
            vy: rng.gen_range(-1.0..=1.0),
            speed: settings.min_speed + rng.gen::<f32>() * settings.max_speed,
            radius,
            opacity,
        }
    }

    /// Advance one Euler step
    pub fn step(&mut self) {
        self.x += self.vx * self.speed;
        self.y += self.vy * self.speed;
    }

    /// False once the particle is more than three radii outside the area on any side
    pub fn validate(&self, width: f32, height: f32) -> bool {
        let margin = OFF_BOUNDS_MARGIN * self.radius;
        self.x >= -margin
            && self.x <= width + margin
            && self.y >= -margin
            && self.y <= height + margin
    }

    /// Respawn just outside a random edge, heading back into the area
    pub fn reset<R: Rng + ?Sized>(&mut self, width: f32, height: f32, rng: &mut R) -> Edge {
        let edge = Edge::random(rng);
        self.respawn_at(edge, width, height, rng);
        edge
    }

    fn respawn_at<R: Rng + ?Sized>(&mut self, edge: Edge, width: f32, height: f32, rng: &mut R) {
        let offset = RESPAWN_OFFSET * self.radius;
        let along = |rng: &mut R, span: f32, radius: f32| {
            let clearance = (CORNER_CLEARANCE * radius).max(MIN_CORNER_CLEARANCE);
            if span > 2.0 * clearance {
                clearance + rng.gen::<f32>() * (span - 2.0 * clearance)
            } else {
                span / 2.0
            }
        };

        match edge {
            Edge::Top => {
                self.x = along(rng, width, self.radius);
                self.y = -offset;
                self.vx = rng.gen_range(-1.0..=1.0);
                self.vy = rng.gen_range(0.0..=1.0);
            }
            Edge::Bottom => {
                self.x = along(rng, width, self.radius);
                self.y = height + offset;
                self.vx = rng.gen_range(-1.0..=1.0);
                self.vy = rng.gen_range(-1.0..=0.0);
            }
            Edge::Left => {
                self.x = -offset;
                self.y = along(rng, height, self.radius);
                self.vx = rng.gen_range(0.0..=1.0);
                self.vy = rng.gen_range(-1.0..=1.0);
            }
            Edge::Right => {
                self.x = width + offset;
                self.y = along(rng, height, self.radius);
                self.vx = rng.gen_range(-1.0..=0.0);
                self.vy = rng.gen_range(-1.0..=1.0);
            }
        }
    }

    /// Step, then recycle if the particle wandered too far. Returns true when it was reset.
    pub fn advance<R: Rng + ?Sized>(&mut self, width: f32, height: f32, rng: &mut R) -> bool {
        self.step();
        if self.validate(width, height) {
            false
        } else {
            self.reset(width, height, rng);
            true
        }
    }

    /// Euclidean distance to another particle
    pub fn distance(&self, other: &Particle) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn particle_at(x: f32, y: f32, radius: f32) -> Particle {
        Particle {
            id: 0,
            label: "test",
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            speed: 1.0,
            radius,
            opacity: Opacity::Opaque,
        }
    }

    #[test]
    fn test_spawn_attribute_ranges() {
        let settings = EngineSettings {
            width: 100.0,
            height: 50.0,
            radius: 4.0,
            radius_variance: 0.5,
            min_speed: 1.0,
            max_speed: 2.0,
            alpha_min: Some(0.5),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(7);

        for id in 0..500 {
            let p = Particle::spawn(id, &settings, &mut rng);
            assert!((0.0..100.0).contains(&p.x));
            assert!((0.0..50.0).contains(&p.y));
            assert!((-1.0..=1.0).contains(&p.vx));
            assert!((-1.0..=1.0).contains(&p.vy));
            assert!(p.speed >= 1.0 && p.speed < 3.0);
            assert!(p.radius >= 2.0 && p.radius <= 6.0);
            match p.opacity {
                Opacity::Translucent(alpha) => assert!(alpha >= 127),
                Opacity::Opaque => panic!("alpha floor configured, expected translucent"),
            }
        }
    }

    #[test]
    fn test_spawn_without_alpha_floor_is_opaque() {
        let mut rng = StdRng::seed_from_u64(1);
        let p = Particle::spawn(0, &EngineSettings::default(), &mut rng);
        assert_eq!(p.opacity, Opacity::Opaque);
        assert_eq!(p.opacity.value(), 255);
    }

    #[test]
    fn test_step_is_euler() {
        let mut p = particle_at(10.0, 10.0, 1.0);
        p.vx = 0.5;
        p.vy = -1.0;
        p.speed = 2.0;
        p.step();
        assert_eq!(p.x, 11.0);
        assert_eq!(p.y, 8.0);
    }

    #[test]
    fn test_validate_margin() {
        let (w, h) = (100.0, 100.0);
        assert!(particle_at(-6.0, 50.0, 2.0).validate(w, h));
        assert!(!particle_at(-6.1, 50.0, 2.0).validate(w, h));
        assert!(particle_at(50.0, 106.0, 2.0).validate(w, h));
        assert!(!particle_at(50.0, 106.1, 2.0).validate(w, h));
        assert!(!particle_at(106.5, 50.0, 2.0).validate(w, h));
        assert!(!particle_at(50.0, -7.0, 2.0).validate(w, h));
    }

    #[test]
    fn test_reset_lands_near_exactly_one_edge() {
        let (w, h) = (120.0, 80.0);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..1000 {
            let mut p = particle_at(500.0, 500.0, 3.0);
            let edge = p.reset(w, h, &mut rng);

            let near: Vec<Edge> = Edge::ALL
                .iter()
                .copied()
                .filter(|e| e.distance(p.x, p.y, w, h) <= p.radius * 1.5)
                .collect();
            assert_eq!(near, vec![edge]);
            assert!(p.validate(w, h));
        }
    }

    #[test]
    fn test_reset_without_radius_avoids_corners() {
        let (w, h) = (60.0, 40.0);
        let mut rng = StdRng::seed_from_u64(17);

        for _ in 0..1000 {
            let mut p = particle_at(-1.0, -1.0, 0.0);
            let edge = p.reset(w, h, &mut rng);

            let touching: Vec<Edge> = Edge::ALL
                .iter()
                .copied()
                .filter(|e| e.distance(p.x, p.y, w, h) <= 0.0)
                .collect();
            assert_eq!(touching, vec![edge]);
            assert!(p.validate(w, h));
        }
    }

    #[test]
    fn test_reset_heads_inward() {
        let (w, h) = (120.0, 80.0);
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..500 {
            let mut p = particle_at(-100.0, -100.0, 2.0);
            match p.reset(w, h, &mut rng) {
                Edge::Top => assert!(p.vy >= 0.0),
                Edge::Bottom => assert!(p.vy <= 0.0),
                Edge::Left => assert!(p.vx >= 0.0),
                Edge::Right => assert!(p.vx <= 0.0),
            }
        }
    }

    #[test]
    fn test_advance_recycles_lost_particle() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut p = particle_at(-5.0, 50.0, 1.0);
        p.vx = -1.0;
        assert!(p.advance(100.0, 100.0, &mut rng));
        assert!(p.validate(100.0, 100.0));

        let mut q = particle_at(50.0, 50.0, 1.0);
        q.vx = 1.0;
        assert!(!q.advance(100.0, 100.0, &mut rng));
        assert_eq!(q.x, 51.0);
    }

    #[test]
    fn test_distance() {
        let a = particle_at(0.0, 0.0, 1.0);
        let b = particle_at(3.0, 4.0, 1.0);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(b.distance(&a), 5.0);
        assert_eq!(a.distance(&a), 0.0);
    }
}
