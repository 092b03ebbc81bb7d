use serde::{Deserialize, Serialize};

/// How connecting lines are shaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineStyle {
    /// Line opacity fades out as the pair approaches the link distance
    #[default]
    Faded,
    /// Every line is drawn fully opaque
    Strong,
}

impl LineStyle {
    pub fn name(&self) -> &str {
        match self {
            LineStyle::Faded => "Faded",
            LineStyle::Strong => "Strong",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            LineStyle::Faded => LineStyle::Strong,
            LineStyle::Strong => LineStyle::Faded,
        }
    }

    pub fn prev(&self) -> Self {
        // Two variants, so cycling backward is the same as forward
        self.next()
    }
}

/// Engine configuration, fixed once an engine is constructed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    // === Population ===
    /// Number of particles in every state
    pub particle_count: usize,
    /// Capacity of the lookahead queue
    pub max_states: usize,

    // === Area ===
    /// Width of the simulation area in simulation units
    pub width: f32,
    /// Height of the simulation area in simulation units
    pub height: f32,
    /// Maximum distance for a connecting line; also the grid cell edge (<= 0 disables partitioning)
    pub link_distance: f32,

    // === Particle look ===
    /// Base particle radius
    pub radius: f32,
    /// Relative radius spread (0.0-1.0), radius is drawn from radius * (1 +/- variance)
    pub radius_variance: f32,
    /// Opacity floor (0.0-1.0]; None means particles are fully opaque
    pub alpha_min: Option<f32>,
    /// Line shading policy
    pub line_style: LineStyle,

    // === Motion ===
    /// Lowest speed multiplier a particle can get
    pub min_speed: f32,
    /// Width of the speed range above `min_speed`
    pub max_speed: f32,

    /// Fixed RNG seed for reproducible production
    pub seed: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            particle_count: 80,
            max_states: 50,

            width: 200.0,
            height: 120.0,
            link_distance: 30.0,

            radius: 1.5,
            radius_variance: 0.3,
            alpha_min: None,
            line_style: LineStyle::default(),

            min_speed: 0.2,
            max_speed: 0.8,

            seed: None,
        }
    }
}

fn finite_non_negative(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

impl EngineSettings {
    /// Copy of these settings with every field brought into its valid range
    pub fn sanitized(&self) -> Self {
        let alpha_min = self
            .alpha_min
            .filter(|a| a.is_finite() && *a > 0.0)
            .map(|a| a.min(1.0));

        let link_distance = if self.link_distance.is_finite() {
            self.link_distance
        } else {
            0.0
        };

        Self {
            particle_count: self.particle_count,
            max_states: self.max_states.max(1),
            width: finite_non_negative(self.width),
            height: finite_non_negative(self.height),
            link_distance,
            radius: finite_non_negative(self.radius),
            radius_variance: finite_non_negative(self.radius_variance).min(1.0),
            alpha_min,
            line_style: self.line_style,
            min_speed: finite_non_negative(self.min_speed),
            max_speed: finite_non_negative(self.max_speed),
            seed: self.seed,
        }
    }

    /// False when a zero dimension leaves no room to place particles
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Upper bound of the radius any spawned particle can get
    pub fn max_radius(&self) -> f32 {
        self.radius * (1.0 + self.radius_variance)
    }

    /// Same settings with a different area, used when the host surface resizes
    pub fn with_area(&self, width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..self.clone()
        }
    }

    /// Adjust particle count within bounds
    pub fn adjust_particle_count(&mut self, delta: i32) {
        let new_val = (self.particle_count as i64 + delta as i64).clamp(1, 1000);
        self.particle_count = new_val as usize;
    }

    /// Adjust queue capacity within bounds
    pub fn adjust_max_states(&mut self, delta: i32) {
        let new_val = (self.max_states as i64 + delta as i64).clamp(1, 200);
        self.max_states = new_val as usize;
    }

    /// Adjust link distance within bounds (0 disables partitioning)
    pub fn adjust_link_distance(&mut self, delta: f32) {
        self.link_distance = (self.link_distance + delta).clamp(0.0, 200.0);
    }

    /// Adjust base radius within bounds
    pub fn adjust_radius(&mut self, delta: f32) {
        self.radius = (self.radius + delta).clamp(0.5, 8.0);
    }

    /// Adjust radius variance within bounds
    pub fn adjust_radius_variance(&mut self, delta: f32) {
        self.radius_variance = (self.radius_variance + delta).clamp(0.0, 1.0);
    }

    /// Adjust opacity floor; dropping to zero switches back to fully opaque
    pub fn adjust_alpha_min(&mut self, delta: f32) {
        let current = self.alpha_min.unwrap_or(0.0);
        let new_val = (current + delta).clamp(0.0, 1.0);
        self.alpha_min = if new_val > 0.01 { Some(new_val) } else { None };
    }

    /// Adjust minimum speed within bounds
    pub fn adjust_min_speed(&mut self, delta: f32) {
        self.min_speed = (self.min_speed + delta).clamp(0.0, 5.0);
    }

    /// Adjust speed range within bounds
    pub fn adjust_max_speed(&mut self, delta: f32) {
        self.max_speed = (self.max_speed + delta).clamp(0.0, 10.0);
    }

    /// Cycle line shading
    pub fn cycle_line_style(&mut self) {
        self.line_style = self.line_style.next();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_alpha_floor() {
        let mut settings = EngineSettings {
            alpha_min: Some(-0.5),
            ..Default::default()
        };
        assert_eq!(settings.sanitized().alpha_min, None);

        settings.alpha_min = Some(3.0);
        assert_eq!(settings.sanitized().alpha_min, Some(1.0));

        settings.alpha_min = Some(0.4);
        assert_eq!(settings.sanitized().alpha_min, Some(0.4));
    }

    #[test]
    fn test_sanitize_degenerate_numbers() {
        let settings = EngineSettings {
            width: f32::NAN,
            height: -10.0,
            link_distance: f32::INFINITY,
            radius: -1.0,
            radius_variance: 4.0,
            max_states: 0,
            ..Default::default()
        }
        .sanitized();

        assert_eq!(settings.width, 0.0);
        assert_eq!(settings.height, 0.0);
        assert_eq!(settings.link_distance, 0.0);
        assert_eq!(settings.radius, 0.0);
        assert_eq!(settings.radius_variance, 1.0);
        assert_eq!(settings.max_states, 1);
        assert!(!settings.has_area());
    }

    #[test]
    fn test_negative_link_distance_is_kept() {
        // A non-positive link distance is a valid "no partitioning" request
        let settings = EngineSettings {
            link_distance: -5.0,
            ..Default::default()
        };
        assert_eq!(settings.sanitized().link_distance, -5.0);
    }

    #[test]
    fn test_adjust_alpha_min_round_trip_to_opaque() {
        let mut settings = EngineSettings::default();
        settings.adjust_alpha_min(0.2);
        assert_eq!(settings.alpha_min, Some(0.2));
        settings.adjust_alpha_min(-0.5);
        assert_eq!(settings.alpha_min, None);
    }

    #[test]
    fn test_adjusters_clamp() {
        let mut settings = EngineSettings::default();
        settings.adjust_particle_count(-10_000);
        assert_eq!(settings.particle_count, 1);
        settings.adjust_max_states(10_000);
        assert_eq!(settings.max_states, 200);
        settings.adjust_link_distance(-500.0);
        assert_eq!(settings.link_distance, 0.0);
    }

    #[test]
    fn test_max_radius_covers_variance() {
        let settings = EngineSettings {
            radius: 4.0,
            radius_variance: 0.5,
            ..Default::default()
        };
        assert_eq!(settings.max_radius(), 6.0);
    }

    #[test]
    fn test_line_style_cycles() {
        assert_eq!(LineStyle::Faded.next(), LineStyle::Strong);
        assert_eq!(LineStyle::Strong.prev(), LineStyle::Faded);
    }
}
