use crate::color::{Palette, PaletteColors};
use crate::particle::Particle;
use crate::pointer::{PointerMarker, PointerState};
use crate::settings::FieldSettings;
use crate::surface::{DrawSurface, Glow, Point, Stroke};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Halo extent around energized particles, in surface pixels
const GLOW_BLUR: f32 = 10.0;

const MARKER_DOT_RADIUS: f32 = 4.0;
const MARKER_OUTLINE_RADIUS: f32 = 20.0;
const MARKER_OUTLINE_ALPHA: f32 = 0.5;

/// Opacity of a connection line at `distance`, falling off linearly to
/// exactly zero at `threshold`
pub fn link_opacity(distance: f32, threshold: f32, base_opacity: f32) -> f32 {
    if threshold <= 0.0 || distance >= threshold {
        return 0.0;
    }
    base_opacity * (1.0 - distance.max(0.0) / threshold)
}

/// Particle field state: the particle collection, the pointer, and the
/// per-frame update/draw/connect passes
pub struct ParticleField {
    pub width: f32,
    pub height: f32,
    pub settings: FieldSettings,
    particles: Vec<Particle>,
    pointer: PointerState,
    marker: PointerMarker,
    palette: Palette,
    colors: PaletteColors,
    frames: u64,
    rng: StdRng,
}

impl ParticleField {
    /// Create an empty field; call [`ParticleField::initialize`] to populate it.
    /// A seed makes the field reproducible.
    pub fn new(settings: FieldSettings, palette: Palette, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            width: 0.0,
            height: 0.0,
            pointer: PointerState::new(settings.pointer_radius),
            marker: PointerMarker::default(),
            settings,
            particles: Vec::new(),
            palette,
            colors: palette.colors(),
            frames: 0,
            rng,
        }
    }

    /// Discard every particle and spawn a fresh set sized for the viewport
    pub fn initialize(&mut self, width: f32, height: f32) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);

        let count = self.settings.particle_count(self.width);
        let mut particles = Vec::with_capacity(count);
        for _ in 0..count {
            particles.push(Particle::random(
                &mut self.rng,
                self.width,
                self.height,
                &self.settings,
                &self.colors,
            ));
        }
        self.particles = particles;

        tracing::debug!(
            width = self.width,
            height = self.height,
            count,
            "particle field initialized"
        );
    }

    /// Regenerate at the current size
    pub fn reset(&mut self) {
        self.initialize(self.width, self.height);
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[cfg(test)]
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.pointer.move_to(x, y);
    }

    pub fn pointer_left(&mut self) {
        self.pointer.clear();
        self.marker.follow(None);
    }

    #[cfg(test)]
    pub fn marker(&self) -> &PointerMarker {
        &self.marker
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
        self.colors = palette.colors();
        for particle in &mut self.particles {
            particle.recolor(&self.colors);
        }
    }

    pub fn colors(&self) -> &PaletteColors {
        &self.colors
    }

    /// Number of frames stepped since creation
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn energized_count(&self) -> usize {
        self.particles.iter().filter(|p| p.is_energized()).count()
    }

    /// One animation frame: clear, move, draw discs, then draw connections
    pub fn step<S: DrawSurface>(&mut self, surface: &mut S) {
        surface.clear();
        self.update();
        self.draw(surface);
    }

    /// Physics pass only
    pub fn update(&mut self) {
        self.pointer.radius = self.settings.pointer_radius;
        let energized = self.colors.energized;
        for particle in &mut self.particles {
            particle.update(&self.pointer, &self.settings, energized, self.width, self.height);
        }
        self.marker.follow(self.pointer.position);
        self.frames += 1;
    }

    /// Draw discs, pointer connections, ambient connections and finally the
    /// pointer marker on top
    pub fn draw<S: DrawSurface>(&self, surface: &mut S) {
        for particle in &self.particles {
            let glow = particle.is_energized().then_some(Glow {
                color: self.colors.energized,
                blur: GLOW_BLUR,
            });
            surface.fill_circle(particle.position(), particle.radius, particle.color, glow);
        }

        if let Some(pointer) = self.pointer.position {
            self.draw_pointer_links(surface, pointer);
        }

        self.draw_ambient_links(surface);

        if self.settings.show_pointer_marker {
            self.draw_marker(surface);
        }
    }

    fn draw_marker<S: DrawSurface>(&self, surface: &mut S) {
        let (Some(pointer), Some(outline)) = (self.pointer.position, self.marker.outline()) else {
            return;
        };
        surface.stroke_circle(
            outline,
            MARKER_OUTLINE_RADIUS,
            Stroke {
                color: self.colors.pointer_link,
                alpha: MARKER_OUTLINE_ALPHA,
                width: 1.0,
            },
        );
        surface.fill_circle(pointer, MARKER_DOT_RADIUS, self.colors.pointer_link, None);
    }

    fn draw_pointer_links<S: DrawSurface>(&self, surface: &mut S, pointer: Point) {
        let threshold = self.settings.pointer_link_distance;
        for particle in &self.particles {
            let position = particle.position();
            let distance = position.distance(pointer);
            if distance < threshold {
                surface.stroke_line(
                    pointer,
                    position,
                    Stroke {
                        color: self.colors.pointer_link,
                        alpha: link_opacity(distance, threshold, self.settings.pointer_link_opacity),
                        width: self.settings.pointer_link_width,
                    },
                );
            }
        }
    }

    /// Every unordered pair within range; O(n^2) over a capped population
    fn draw_ambient_links<S: DrawSurface>(&self, surface: &mut S) {
        let threshold = self.settings.ambient_link_distance;
        for (i, a) in self.particles.iter().enumerate() {
            let pa = a.position();
            for b in &self.particles[i + 1..] {
                let pb = b.position();
                let distance = pa.distance(pb);
                if distance < threshold {
                    surface.stroke_line(
                        pa,
                        pb,
                        Stroke {
                            color: self.colors.ambient_link,
                            alpha: link_opacity(distance, threshold, self.settings.ambient_link_opacity),
                            width: self.settings.ambient_link_width,
                        },
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::testing::{DrawCall, RecordingSurface};

    fn seeded_field() -> ParticleField {
        ParticleField::new(FieldSettings::default(), Palette::Neural, Some(42))
    }

    #[test]
    fn test_initialize_uses_width_tiers() {
        let mut field = seeded_field();
        let settings = FieldSettings::default();

        field.initialize(800.0, 600.0);
        assert_eq!(field.particles().len(), settings.narrow_count);

        field.initialize(1200.0, 800.0);
        assert_eq!(field.particles().len(), settings.wide_count);
        assert!(field
            .particles()
            .iter()
            .all(|p| p.x <= 1200.0 && p.y <= 800.0));
    }

    #[test]
    fn test_initialize_replaces_previous_particles() {
        let mut field = seeded_field();
        field.initialize(1200.0, 800.0);
        let before = field.particles().to_vec();

        field.initialize(1200.0, 800.0);
        assert_eq!(field.particles().len(), before.len());
        assert_ne!(field.particles(), &before[..]);

        field.initialize(500.0, 400.0);
        assert_eq!(field.particles().len(), FieldSettings::default().narrow_count);
        assert!(field.particles().iter().all(|p| p.x <= 500.0 && p.y <= 400.0));
    }

    #[test]
    fn test_step_without_pointer_drifts_only() {
        let mut field = seeded_field();
        field.initialize(1000.0, 800.0);
        let before = field.particles().to_vec();

        let mut surface = RecordingSurface::new(1000.0, 800.0);
        field.step(&mut surface);

        for (old, new) in before.iter().zip(field.particles()) {
            assert_eq!(new.x, old.x + old.vx);
            assert_eq!(new.y, old.y + old.vy);
            assert_eq!(new.color, new.base_color);
        }

        assert_eq!(surface.calls.first(), Some(&DrawCall::Clear));
        assert_eq!(surface.circles().count(), before.len());
        assert!(surface.circles().all(|c| matches!(c, DrawCall::Circle { glow: None, .. })));

        // Every line must be an ambient connection
        let ambient = field.colors().ambient_link;
        assert!(surface
            .lines()
            .all(|c| matches!(c, DrawCall::Line { stroke, .. } if stroke.color == ambient)));
    }

    #[test]
    fn test_pointer_energizes_and_links() {
        let mut field = seeded_field();
        field.initialize(1000.0, 800.0);
        {
            let particles = field.particles_mut();
            particles[0].x = 100.0;
            particles[0].y = 100.0;
            particles[0].vx = 0.0;
            particles[0].vy = 0.0;
            particles[0].density = 10.0;
        }
        field.settings.pointer_radius = 250.0;
        field.pointer_moved(150.0, 100.0);

        let mut surface = RecordingSurface::new(1000.0, 800.0);
        field.step(&mut surface);

        let p = &field.particles()[0];
        assert!(p.x < 100.0);
        assert_eq!(p.color, field.colors().energized);
        assert!(p.is_energized());

        let pointer = Point::new(150.0, 100.0);
        assert!(surface.lines_to(pointer) >= 1);
        assert!(surface.circles().any(|c| matches!(c, DrawCall::Circle { glow: Some(_), .. })));
    }

    #[test]
    fn test_pointer_links_heavier_than_ambient() {
        let mut field = seeded_field();
        field.initialize(300.0, 300.0);
        field.pointer_moved(150.0, 150.0);
        let mut surface = RecordingSurface::new(300.0, 300.0);
        field.step(&mut surface);

        let pointer = Point::new(150.0, 150.0);
        for call in surface.lines() {
            if let DrawCall::Line { from, stroke, .. } = call {
                if *from == pointer {
                    assert_eq!(stroke.width, field.settings.pointer_link_width);
                } else {
                    assert_eq!(stroke.width, field.settings.ambient_link_width);
                }
                assert!(stroke.width > 0.0);
            }
        }
        assert!(field.settings.pointer_link_width > field.settings.ambient_link_width);
    }

    #[test]
    fn test_ambient_links_cover_each_pair_once() {
        let mut field = seeded_field();
        field.initialize(1000.0, 800.0);
        {
            let particles = field.particles_mut();
            for (i, p) in particles.iter_mut().enumerate() {
                // Spread everything far apart, then cluster three
                p.x = (i % 10) as f32 * 300.0;
                p.y = (i / 10) as f32 * 300.0;
                p.vx = 0.0;
                p.vy = 0.0;
            }
            particles[0].x = 10.0;
            particles[0].y = 10.0;
            particles[1].x = 20.0;
            particles[1].y = 10.0;
            particles[2].x = 30.0;
            particles[2].y = 10.0;
        }
        let mut surface = RecordingSurface::new(1000.0, 800.0);
        field.draw(&mut surface);

        // 0-1, 0-2, 1-2 and nothing else
        assert_eq!(surface.lines().count(), 3);
    }

    #[test]
    fn test_link_opacity_falloff() {
        assert_eq!(link_opacity(0.0, 100.0, 0.15), 0.15);
        assert_eq!(link_opacity(100.0, 100.0, 0.15), 0.0);
        assert_eq!(link_opacity(150.0, 100.0, 0.15), 0.0);
        assert!((link_opacity(50.0, 100.0, 0.4) - 0.2).abs() < 1e-6);

        let mut previous = f32::INFINITY;
        for step in 0..=100 {
            let opacity = link_opacity(step as f32 * 1.5, 150.0, 0.4);
            assert!(opacity <= previous);
            previous = opacity;
        }
        assert_eq!(previous, 0.0);
    }

    #[test]
    fn test_positions_stay_bounded_without_pointer() {
        let mut field = seeded_field();
        field.initialize(200.0, 150.0);
        let eps = field.settings.max_drift_per_frame();
        let mut surface = RecordingSurface::new(200.0, 150.0);

        for _ in 0..5000 {
            field.step(&mut surface);
            for p in field.particles() {
                assert!(p.x >= -eps && p.x <= 200.0 + eps, "x = {}", p.x);
                assert!(p.y >= -eps && p.y <= 150.0 + eps, "y = {}", p.y);
            }
        }
    }

    #[test]
    fn test_radius_converges_after_pointer_leaves() {
        let mut field = seeded_field();
        field.initialize(400.0, 400.0);
        field.pointer_moved(200.0, 200.0);
        let mut surface = RecordingSurface::new(400.0, 400.0);

        for _ in 0..30 {
            field.step(&mut surface);
            assert!(field.particles().iter().all(|p| p.radius >= p.base_radius));
        }

        field.pointer_left();
        for _ in 0..field.settings.decay_frames() + 1 {
            field.step(&mut surface);
            assert!(field.particles().iter().all(|p| p.radius >= p.base_radius));
        }
        assert!(field.particles().iter().all(|p| p.radius == p.base_radius));
        assert_eq!(field.energized_count(), 0);
    }

    #[test]
    fn test_set_palette_recolors_particles() {
        let mut field = seeded_field();
        field.initialize(1000.0, 800.0);
        field.set_palette(Palette::Ember);
        let ember = Palette::Ember.colors();
        assert!(field.particles().iter().all(|p| ember.ambient.contains(&p.color)));
    }

    #[test]
    fn test_independent_instances() {
        let mut a = seeded_field();
        let mut b = seeded_field();
        a.initialize(1000.0, 800.0);
        b.initialize(1000.0, 800.0);
        a.pointer_moved(10.0, 10.0);
        assert!(!b.pointer().is_present());
        assert_eq!(a.particles(), b.particles());
    }

    #[test]
    fn test_marker_hidden_without_pointer() {
        let mut field = seeded_field();
        field.initialize(1000.0, 800.0);
        let mut surface = RecordingSurface::new(1000.0, 800.0);
        field.step(&mut surface);
        assert_eq!(surface.rings().count(), 0);
        assert!(field.marker().outline().is_none());
    }

    #[test]
    fn test_marker_drawn_last_at_pointer() {
        let mut field = seeded_field();
        field.initialize(1000.0, 800.0);
        field.pointer_moved(500.0, 400.0);
        let mut surface = RecordingSurface::new(1000.0, 800.0);
        field.step(&mut surface);

        let pointer = Point::new(500.0, 400.0);
        let n = surface.calls.len();
        assert!(matches!(
            &surface.calls[n - 2],
            DrawCall::Ring { center, radius, .. } if *center == pointer && *radius == MARKER_OUTLINE_RADIUS
        ));
        assert!(matches!(
            &surface.calls[n - 1],
            DrawCall::Circle { center, radius, glow: None, .. } if *center == pointer && *radius == MARKER_DOT_RADIUS
        ));
    }

    #[test]
    fn test_marker_outline_trails_then_settles() {
        let mut field = seeded_field();
        field.initialize(1000.0, 800.0);
        let mut surface = RecordingSurface::new(1000.0, 800.0);

        field.pointer_moved(100.0, 100.0);
        field.step(&mut surface);
        field.pointer_moved(300.0, 100.0);
        field.step(&mut surface);

        let outline = field.marker().outline().unwrap();
        assert!(outline.x > 100.0 && outline.x < 300.0);
        // The dot is already there
        assert!(surface
            .circles()
            .any(|c| matches!(c, DrawCall::Circle { center, .. } if *center == Point::new(300.0, 100.0))));

        for _ in 0..40 {
            field.step(&mut surface);
        }
        let outline = field.marker().outline().unwrap();
        assert!(outline.distance(Point::new(300.0, 100.0)) < 0.5);
    }

    #[test]
    fn test_marker_reappears_under_pointer() {
        let mut field = seeded_field();
        field.initialize(1000.0, 800.0);
        let mut surface = RecordingSurface::new(1000.0, 800.0);

        field.pointer_moved(100.0, 100.0);
        field.step(&mut surface);
        field.pointer_left();
        field.step(&mut surface);
        assert_eq!(surface.rings().count(), 0);

        field.pointer_moved(700.0, 500.0);
        field.step(&mut surface);
        assert_eq!(field.marker().outline(), Some(Point::new(700.0, 500.0)));
    }

    #[test]
    fn test_marker_can_be_disabled() {
        let mut field = seeded_field();
        field.settings.show_pointer_marker = false;
        field.initialize(1000.0, 800.0);
        field.pointer_moved(500.0, 400.0);
        let mut surface = RecordingSurface::new(1000.0, 800.0);
        field.step(&mut surface);
        assert_eq!(surface.rings().count(), 0);
    }

    #[test]
    fn test_nan_settings_are_repaired_before_stepping() {
        let settings = FieldSettings {
            repel_strength: f32::NAN,
            pointer_radius: f32::NAN,
            max_drift: f32::NAN,
            ..Default::default()
        }
        .sanitized();
        let mut field = ParticleField::new(settings, Palette::Neural, Some(5));
        field.initialize(1000.0, 800.0);
        field.pointer_moved(500.0, 400.0);
        let mut surface = RecordingSurface::new(1000.0, 800.0);

        for _ in 0..10 {
            field.step(&mut surface);
        }
        assert!(field
            .particles()
            .iter()
            .all(|p| p.x.is_finite() && p.y.is_finite() && p.radius.is_finite()));
    }
}
