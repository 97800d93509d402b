use crate::color::{PaletteColors, Rgb};
use crate::pointer::PointerState;
use crate::settings::FieldSettings;
use crate::surface::Point;
use rand::Rng;

/// Distances below this count as "on top of the pointer"
const COINCIDENT_EPSILON: f32 = 1e-4;

/// A single drifting point in the field
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub base_radius: f32,
    pub radius: f32,
    /// Which of the two ambient palette colors this particle was born with
    pub tone: usize,
    pub base_color: Rgb,
    pub color: Rgb,
    /// Resistance-to-displacement factor, fixed at creation
    pub density: f32,
}

impl Particle {
    /// Spawn a particle with random position, drift, size, tone and density
    pub fn random<R: Rng>(
        rng: &mut R,
        width: f32,
        height: f32,
        settings: &FieldSettings,
        colors: &PaletteColors,
    ) -> Self {
        let mut uniform = |min: f32, max: f32| min + rng.gen::<f32>() * (max - min);

        let x = uniform(0.0, width);
        let y = uniform(0.0, height);
        let vx = uniform(-settings.max_drift, settings.max_drift);
        let vy = uniform(-settings.max_drift, settings.max_drift);
        let base_radius = uniform(settings.min_radius, settings.max_radius);
        let density = uniform(settings.min_density, settings.max_density);
        let tone = usize::from(rng.gen_bool(0.5));

        Self {
            x,
            y,
            vx,
            vy,
            base_radius,
            radius: base_radius,
            tone,
            base_color: colors.ambient[tone],
            color: colors.ambient[tone],
            density,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn is_energized(&self) -> bool {
        self.color != self.base_color || self.radius > self.base_radius
    }

    /// Re-tint after a palette change, keeping the energized state
    pub fn recolor(&mut self, colors: &PaletteColors) {
        let energized = self.color != self.base_color;
        self.base_color = colors.ambient[self.tone];
        self.color = if energized { colors.energized } else { self.base_color };
    }

    /// Displacement to subtract from the position, pointing from the
    /// particle toward the pointer, with magnitude
    /// `(1 - distance / radius) * density * strength`.
    ///
    /// A particle sitting exactly on the pointer gets the maximal push along
    /// its own heading (or +x when it is at rest).
    pub fn repulsion(&self, pointer: Point, distance: f32, radius: f32, strength: f32) -> (f32, f32) {
        let magnitude = (1.0 - distance / radius).max(0.0) * self.density * strength;
        let (dir_x, dir_y) = if distance > COINCIDENT_EPSILON {
            ((pointer.x - self.x) / distance, (pointer.y - self.y) / distance)
        } else {
            let speed = self.vx.hypot(self.vy);
            if speed > 0.0 {
                // Subtracting a vector opposite to the heading pushes forward
                (-self.vx / speed, -self.vy / speed)
            } else {
                (-1.0, 0.0)
            }
        };
        (dir_x * magnitude, dir_y * magnitude)
    }

    /// Advance one frame: drift, pointer response, radius decay, boundary reflection
    pub fn update(
        &mut self,
        pointer: &PointerState,
        settings: &FieldSettings,
        energized_color: Rgb,
        width: f32,
        height: f32,
    ) {
        self.x += self.vx;
        self.y += self.vy;

        if let Some((at, distance)) = pointer.reach(self.position()) {
            let (dx, dy) = self.repulsion(at, distance, pointer.radius, settings.repel_strength);
            self.x -= dx;
            self.y -= dy;
            self.color = energized_color;
            self.radius = self.base_radius * settings.energized_radius_scale;
        } else {
            self.color = self.base_color;
            if self.radius > self.base_radius {
                self.radius = (self.radius - settings.radius_decay).max(self.base_radius);
            }
        }

        // Reflect toward the inside; a particle already heading back keeps its velocity
        if self.x < 0.0 {
            self.vx = self.vx.abs();
        } else if self.x > width {
            self.vx = -self.vx.abs();
        }
        if self.y < 0.0 {
            self.vy = self.vy.abs();
        } else if self.y > height {
            self.vy = -self.vy.abs();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Palette;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn particle_at(x: f32, y: f32, density: f32) -> Particle {
        let colors = Palette::Neural.colors();
        Particle {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            base_radius: 2.0,
            radius: 2.0,
            tone: 0,
            base_color: colors.ambient[0],
            color: colors.ambient[0],
            density,
        }
    }

    #[test]
    fn test_random_particle_within_ranges() {
        let settings = FieldSettings::default();
        let colors = Palette::Neural.colors();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..500 {
            let p = Particle::random(&mut rng, 640.0, 480.0, &settings, &colors);
            assert!((0.0..=640.0).contains(&p.x));
            assert!((0.0..=480.0).contains(&p.y));
            assert!(p.vx.abs() <= settings.max_drift);
            assert!(p.vy.abs() <= settings.max_drift);
            assert!(p.base_radius >= settings.min_radius && p.base_radius <= settings.max_radius);
            assert!(p.density >= settings.min_density && p.density <= settings.max_density);
            assert_eq!(p.radius, p.base_radius);
            assert!(colors.ambient.contains(&p.base_color));
            assert!(!p.is_energized());
        }
    }

    #[test]
    fn test_pushed_away_from_pointer() {
        let settings = FieldSettings::default();
        let energized = Palette::Neural.colors().energized;
        let mut pointer = PointerState::new(250.0);
        pointer.move_to(150.0, 100.0);

        let mut p = particle_at(100.0, 100.0, 10.0);
        p.update(&pointer, &settings, energized, 1000.0, 800.0);

        assert!(p.x < 100.0);
        assert!((p.y - 100.0).abs() < 1e-4);
        assert_eq!(p.color, energized);
        assert_eq!(p.radius, 2.0 * settings.energized_radius_scale);
    }

    #[test]
    fn test_repulsion_magnitude_scaling() {
        let p = particle_at(0.0, 0.0, 10.0);
        let (dx, dy) = p.repulsion(Point::new(50.0, 0.0), 50.0, 250.0, 0.5);
        // (1 - 50/250) * 10 * 0.5
        assert!((dx - 4.0).abs() < 1e-4);
        assert_eq!(dy, 0.0);
    }

    #[test]
    fn test_repulsion_at_zero_distance_is_maximal_and_finite() {
        let mut p = particle_at(10.0, 10.0, 12.0);
        p.vx = 0.3;
        p.vy = -0.4;
        let (dx, dy) = p.repulsion(p.position(), 0.0, 150.0, 0.5);
        assert!(dx.is_finite() && dy.is_finite());
        assert!((dx.hypot(dy) - 12.0 * 0.5).abs() < 1e-4);

        // Approaching zero converges on the same magnitude
        let near = Point::new(10.0 + 1e-3, 10.0);
        let (nx, ny) = p.repulsion(near, p.position().distance(near), 150.0, 0.5);
        assert!((nx.hypot(ny) - 6.0).abs() < 1e-3);

        let resting = particle_at(5.0, 5.0, 4.0);
        let (rx, ry) = resting.repulsion(resting.position(), 0.0, 150.0, 1.0);
        assert_eq!((rx, ry), (-4.0, 0.0));
    }

    #[test]
    fn test_radius_decays_to_base_without_overshoot() {
        let settings = FieldSettings::default();
        let colors = Palette::Neural.colors();
        let pointer = PointerState::new(150.0);

        let mut p = particle_at(100.0, 100.0, 5.0);
        p.radius = p.base_radius + 0.25;
        p.color = colors.energized;

        p.update(&pointer, &settings, colors.energized, 1000.0, 800.0);
        assert_eq!(p.color, p.base_color);
        assert!((p.radius - (p.base_radius + 0.15)).abs() < 1e-5);

        for _ in 0..5 {
            p.update(&pointer, &settings, colors.energized, 1000.0, 800.0);
            assert!(p.radius >= p.base_radius);
        }
        assert_eq!(p.radius, p.base_radius);
    }

    #[test]
    fn test_boundary_reflects_velocity() {
        let settings = FieldSettings::default();
        let colors = Palette::Neural.colors();
        let pointer = PointerState::new(150.0);

        let mut p = particle_at(0.1, 50.0, 5.0);
        p.vx = -0.25;
        p.update(&pointer, &settings, colors.energized, 100.0, 100.0);
        assert!(p.x < 0.0, "no clamping");
        assert_eq!(p.vx, 0.25);

        let mut q = particle_at(50.0, 99.9, 5.0);
        q.vy = 0.25;
        q.update(&pointer, &settings, colors.energized, 100.0, 100.0);
        assert_eq!(q.vy, -0.25);
    }

    #[test]
    fn test_crossing_edge_from_inside_negates_velocity() {
        let settings = FieldSettings::default();
        let colors = Palette::Neural.colors();
        let pointer = PointerState::new(150.0);

        // (x, y, vx, vy) one step inside each edge, heading out
        let cases = [
            (0.1, 50.0, -0.17, 0.05),
            (99.9, 50.0, 0.23, -0.11),
            (50.0, 0.1, 0.07, -0.19),
            (50.0, 99.9, -0.13, 0.21),
        ];
        for (x, y, vx, vy) in cases {
            let mut p = particle_at(x, y, 5.0);
            p.vx = vx;
            p.vy = vy;
            p.update(&pointer, &settings, colors.energized, 100.0, 100.0);

            let crossed_x = !(0.0..=100.0).contains(&p.x);
            let crossed_y = !(0.0..=100.0).contains(&p.y);
            assert!(crossed_x || crossed_y);
            assert_eq!(p.vx, if crossed_x { -vx } else { vx });
            assert_eq!(p.vy, if crossed_y { -vy } else { vy });
        }
    }

    #[test]
    fn test_pushed_outside_keeps_heading_home() {
        let settings = FieldSettings::default();
        let colors = Palette::Neural.colors();
        let pointer = PointerState::new(150.0);

        // Already outside and moving inward: velocity must not flip back out
        let mut p = particle_at(-20.0, 50.0, 5.0);
        p.vx = 0.25;
        p.update(&pointer, &settings, colors.energized, 100.0, 100.0);
        assert_eq!(p.vx, 0.25);
    }

    #[test]
    fn test_recolor_keeps_energized_state() {
        let neural = Palette::Neural.colors();
        let ember = Palette::Ember.colors();

        let mut calm = particle_at(0.0, 0.0, 1.0);
        calm.recolor(&ember);
        assert_eq!(calm.color, ember.ambient[0]);

        let mut hot = particle_at(0.0, 0.0, 1.0);
        hot.color = neural.energized;
        hot.recolor(&ember);
        assert_eq!(hot.color, ember.energized);
        assert_eq!(hot.base_color, ember.ambient[0]);
    }
}
