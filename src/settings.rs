use serde::{Deserialize, Serialize};

/// Hard cap on particles per field; the ambient link pass is O(n^2)
pub const MAX_PARTICLES: usize = 110;

/// All field settings consolidated into one struct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSettings {
    // === Population ===
    /// Viewport widths below this use the narrow particle count
    pub narrow_width_threshold: f32,
    /// Particle count for narrow viewports (1-110)
    pub narrow_count: usize,
    /// Particle count for wide viewports (1-110)
    pub wide_count: usize,

    // === Particle Shape ===
    /// Velocity components are drawn from [-max_drift, max_drift)
    pub max_drift: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    /// Resistance-to-displacement factor range
    pub min_density: f32,
    pub max_density: f32,

    // === Pointer Interaction ===
    /// Interaction zone around the pointer (20-400)
    pub pointer_radius: f32,
    /// Multiplier applied to the repulsion displacement (0.0-2.0)
    pub repel_strength: f32,
    /// Radius multiplier while energized (> 1)
    pub energized_radius_scale: f32,
    /// Per-frame radius shrink once the pointer is gone
    pub radius_decay: f32,

    // === Connections ===
    pub pointer_link_distance: f32,
    pub pointer_link_opacity: f32,
    pub pointer_link_width: f32,
    pub ambient_link_distance: f32,
    pub ambient_link_opacity: f32,
    pub ambient_link_width: f32,

    // === Pointer Marker ===
    /// Draw a dot and trailing outline at the pointer
    pub show_pointer_marker: bool,

    // === Timing ===
    pub target_fps: u32,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            narrow_width_threshold: 900.0,
            narrow_count: 40,
            wide_count: 90,

            max_drift: 0.25,
            min_radius: 0.5,
            max_radius: 2.5,
            min_density: 1.0,
            max_density: 30.0,

            pointer_radius: 150.0,
            repel_strength: 0.5,
            energized_radius_scale: 2.0,
            radius_decay: 0.1,

            pointer_link_distance: 150.0,
            pointer_link_opacity: 0.4,
            pointer_link_width: 1.5,
            ambient_link_distance: 100.0,
            ambient_link_opacity: 0.15,
            ambient_link_width: 1.0,

            show_pointer_marker: true,

            target_fps: 60,
        }
    }
}

impl FieldSettings {
    /// Particle count for a viewport of the given width
    pub fn particle_count(&self, viewport_width: f32) -> usize {
        let count = if viewport_width < self.narrow_width_threshold {
            self.narrow_count
        } else {
            self.wide_count
        };
        count.min(MAX_PARTICLES)
    }

    #[cfg(test)]
    /// Largest distance a particle can travel in one frame without the pointer
    pub fn max_drift_per_frame(&self) -> f32 {
        self.max_drift * std::f32::consts::SQRT_2
    }

    #[cfg(test)]
    /// Frames needed for an energized radius to decay back to its base
    pub fn decay_frames(&self) -> usize {
        let excess = (self.energized_radius_scale - 1.0).max(0.0) * self.max_radius;
        if self.radius_decay <= 0.0 {
            return usize::MAX;
        }
        (excess / self.radius_decay).ceil() as usize
    }

    /// Bring every field back into a consistent range. Non-finite values
    /// (NaN from a hand-edited file or `--repel NaN`) fall back to defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        let finite_or = |value: f32, fallback: f32| if value.is_finite() { value } else { fallback };

        self.narrow_width_threshold = finite_or(self.narrow_width_threshold, defaults.narrow_width_threshold).max(0.0);
        self.narrow_count = self.narrow_count.clamp(1, MAX_PARTICLES);
        self.wide_count = self.wide_count.clamp(1, MAX_PARTICLES);
        self.max_drift = finite_or(self.max_drift, defaults.max_drift).clamp(0.0, 5.0);
        if !(self.min_radius.is_finite()
            && self.max_radius.is_finite()
            && self.min_radius > 0.0
            && self.min_radius < self.max_radius)
        {
            self.min_radius = defaults.min_radius;
            self.max_radius = defaults.max_radius;
        }
        if !(self.min_density.is_finite()
            && self.max_density.is_finite()
            && self.min_density > 0.0
            && self.min_density < self.max_density)
        {
            self.min_density = defaults.min_density;
            self.max_density = defaults.max_density;
        }
        self.pointer_radius = finite_or(self.pointer_radius, defaults.pointer_radius).clamp(20.0, 400.0);
        self.repel_strength = finite_or(self.repel_strength, defaults.repel_strength).clamp(0.0, 2.0);
        if !(self.energized_radius_scale.is_finite() && self.energized_radius_scale > 1.0) {
            self.energized_radius_scale = defaults.energized_radius_scale;
        }
        if !(self.radius_decay.is_finite() && self.radius_decay > 0.0) {
            self.radius_decay = defaults.radius_decay;
        }

        self.pointer_link_distance =
            finite_or(self.pointer_link_distance, defaults.pointer_link_distance).clamp(10.0, 400.0);
        self.ambient_link_distance =
            finite_or(self.ambient_link_distance, defaults.ambient_link_distance).clamp(10.0, 300.0);
        self.pointer_link_opacity = finite_or(self.pointer_link_opacity, defaults.pointer_link_opacity).clamp(0.0, 1.0);
        self.ambient_link_opacity = finite_or(self.ambient_link_opacity, defaults.ambient_link_opacity).clamp(0.0, 1.0);
        self.ambient_link_width = finite_or(self.ambient_link_width, defaults.ambient_link_width).clamp(0.5, 4.0);
        // Pointer links never draw thinner than ambient ones
        self.pointer_link_width = finite_or(self.pointer_link_width, defaults.pointer_link_width)
            .clamp(0.5, 4.0)
            .max(self.ambient_link_width);

        self.target_fps = self.target_fps.clamp(10, 120);
        self
    }

    /// Adjust the interaction radius within bounds
    pub fn adjust_pointer_radius(&mut self, delta: f32) {
        self.pointer_radius = (self.pointer_radius + delta).clamp(20.0, 400.0);
    }

    /// Adjust repulsion strength within bounds
    pub fn adjust_repel_strength(&mut self, delta: f32) {
        self.repel_strength = (self.repel_strength + delta).clamp(0.0, 2.0);
    }

    /// Adjust pointer link distance within bounds
    pub fn adjust_pointer_link_distance(&mut self, delta: f32) {
        self.pointer_link_distance = (self.pointer_link_distance + delta).clamp(10.0, 400.0);
    }

    /// Adjust ambient link distance within bounds
    pub fn adjust_ambient_link_distance(&mut self, delta: f32) {
        self.ambient_link_distance = (self.ambient_link_distance + delta).clamp(10.0, 300.0);
    }

    /// Adjust drift speed within bounds
    pub fn adjust_max_drift(&mut self, delta: f32) {
        self.max_drift = (self.max_drift + delta).clamp(0.0, 5.0);
    }

    /// Adjust narrow-tier particle count within bounds
    pub fn adjust_narrow_count(&mut self, delta: i32) {
        self.narrow_count = (self.narrow_count as i32 + delta).clamp(1, MAX_PARTICLES as i32) as usize;
    }

    /// Adjust wide-tier particle count within bounds
    pub fn adjust_wide_count(&mut self, delta: i32) {
        self.wide_count = (self.wide_count as i32 + delta).clamp(1, MAX_PARTICLES as i32) as usize;
    }

    /// Adjust target frame rate within bounds
    pub fn adjust_target_fps(&mut self, delta: i32) {
        self.target_fps = (self.target_fps as i32 + delta).clamp(10, 120) as u32;
    }
}
