use crate::color::Palette;
use crate::field::ParticleField;
use crate::settings::FieldSettings;
use crate::surface::DrawSurface;

/// Handle for one pending frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// Host primitive that calls back once before the next repaint
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameRequest;
    fn cancel_frame(&mut self, request: FrameRequest);
}

/// A particle field bound to its drawing surface, driven by a frame scheduler.
///
/// At most one frame request is outstanding at any time, so repeated
/// `start` calls (or resize storms) never spawn a second loop.
pub struct FieldEngine<S: DrawSurface> {
    field: ParticleField,
    surface: S,
    pending: Option<FrameRequest>,
}

impl<S: DrawSurface> FieldEngine<S> {
    /// Bind a field to `surface`. Returns `None` when there is no surface to
    /// draw on; the field is purely decorative so nothing else is reported.
    pub fn attach(
        surface: Option<S>,
        settings: FieldSettings,
        palette: Palette,
        seed: Option<u64>,
    ) -> Option<Self> {
        let Some(surface) = surface else {
            tracing::debug!("no drawing surface available, particle field disabled");
            return None;
        };

        let (width, height) = surface.size();
        let mut field = ParticleField::new(settings, palette, seed);
        field.initialize(width, height);

        Some(Self {
            field,
            surface,
            pending: None,
        })
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut ParticleField {
        &mut self.field
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    /// Begin the frame loop; a no-op while a frame is already pending
    pub fn start<F: FrameScheduler>(&mut self, scheduler: &mut F) {
        if self.pending.is_some() {
            return;
        }
        self.pending = Some(scheduler.request_frame());
        tracing::info!(particles = self.field.particles().len(), "particle field started");
    }

    /// Cancel the pending frame; the loop ends until the next `start`
    pub fn stop<F: FrameScheduler>(&mut self, scheduler: &mut F) {
        if let Some(request) = self.pending.take() {
            scheduler.cancel_frame(request);
            tracing::info!(frames = self.field.frames(), "particle field stopped");
        }
    }

    /// Frame callback. Stale or cancelled requests are ignored.
    /// Returns whether a step was taken.
    pub fn on_frame<F: FrameScheduler>(&mut self, scheduler: &mut F, request: FrameRequest) -> bool {
        if self.pending != Some(request) {
            return false;
        }
        self.field.step(&mut self.surface);
        self.pending = Some(scheduler.request_frame());
        true
    }

    /// Resize the surface and regenerate the particle collection.
    /// Never starts or duplicates the frame loop.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.surface.resize(width, height);
        let (width, height) = self.surface.size();
        self.field.initialize(width, height);
        tracing::info!(width, height, particles = self.field.particles().len(), "viewport resized");
    }

    /// Regenerate particles at the current size
    pub fn reset(&mut self) {
        self.field.reset();
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.field.pointer_moved(x, y);
    }

    pub fn pointer_left(&mut self) {
        self.field.pointer_left();
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Scheduler that only records requests; tests fire frames by hand
    #[derive(Debug, Default)]
    pub struct ManualScheduler {
        next_id: u64,
        pub requested: Vec<FrameRequest>,
        pub cancelled: Vec<FrameRequest>,
    }

    impl ManualScheduler {
        /// Latest request that has not been cancelled
        pub fn outstanding(&self) -> Vec<FrameRequest> {
            self.requested
                .iter()
                .copied()
                .filter(|r| !self.cancelled.contains(r))
                .collect()
        }

        pub fn last(&self) -> Option<FrameRequest> {
            self.requested.last().copied()
        }
    }

    impl FrameScheduler for ManualScheduler {
        fn request_frame(&mut self) -> FrameRequest {
            self.next_id += 1;
            let request = FrameRequest(self.next_id);
            self.requested.push(request);
            request
        }

        fn cancel_frame(&mut self, request: FrameRequest) {
            self.cancelled.push(request);
        }
    }
}
