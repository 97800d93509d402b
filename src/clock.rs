use crate::engine::{FrameRequest, FrameScheduler};
use std::time::{Duration, Instant};

/// Frame scheduler for the terminal loop: a request becomes due one frame
/// interval after it was made, and only the latest request is kept.
pub struct FrameClock {
    interval: Duration,
    next_id: u64,
    pending: Option<(FrameRequest, Instant)>,
    last_fired: Option<Instant>,
    /// Exponentially smoothed frames per second
    measured_fps: f32,
}

impl FrameClock {
    pub fn new(target_fps: u32) -> Self {
        Self {
            interval: Self::interval_for(target_fps),
            next_id: 0,
            pending: None,
            last_fired: None,
            measured_fps: 0.0,
        }
    }

    fn interval_for(target_fps: u32) -> Duration {
        Duration::from_secs_f64(1.0 / target_fps.max(1) as f64)
    }

    pub fn set_target_fps(&mut self, target_fps: u32) {
        self.interval = Self::interval_for(target_fps);
    }

    #[cfg(test)]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn measured_fps(&self) -> f32 {
        self.measured_fps
    }

    #[cfg(test)]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// How long the event loop may block before the next frame is due
    pub fn time_until_due(&self, now: Instant) -> Duration {
        match self.pending {
            Some((_, due)) => due.saturating_duration_since(now),
            None => self.interval,
        }
    }

    /// Hand out the pending request once it is due
    pub fn take_due(&mut self, now: Instant) -> Option<FrameRequest> {
        let (request, due) = self.pending?;
        if now < due {
            return None;
        }
        self.pending = None;

        if let Some(last) = self.last_fired {
            let elapsed = now.duration_since(last).as_secs_f32();
            if elapsed > 0.0 {
                let instant_fps = 1.0 / elapsed;
                self.measured_fps = if self.measured_fps == 0.0 {
                    instant_fps
                } else {
                    self.measured_fps * 0.9 + instant_fps * 0.1
                };
            }
        }
        self.last_fired = Some(now);

        Some(request)
    }

    fn request_at(&mut self, now: Instant) -> FrameRequest {
        self.next_id += 1;
        let request = FrameRequest(self.next_id);
        self.pending = Some((request, now + self.interval));
        request
    }
}

impl FrameScheduler for FrameClock {
    fn request_frame(&mut self) -> FrameRequest {
        self.request_at(Instant::now())
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if matches!(self.pending, Some((pending, _)) if pending == request) {
            self.pending = None;
        }
        self.last_fired = None;
        self.measured_fps = 0.0;
    }
}

/// Collapses bursts of resize notifications into one, applied after a quiet period
pub struct ResizeDebounce {
    quiet: Duration,
    pending: Option<((u16, u16), Instant)>,
}

impl ResizeDebounce {
    pub const DEFAULT_QUIET: Duration = Duration::from_millis(150);

    pub fn new(quiet: Duration) -> Self {
        Self { quiet, pending: None }
    }

    /// Record a new terminal size; restarts the quiet period
    pub fn notify(&mut self, size: (u16, u16), now: Instant) {
        self.pending = Some((size, now + self.quiet));
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn time_until_ready(&self, now: Instant) -> Option<Duration> {
        self.pending.map(|(_, ready)| ready.saturating_duration_since(now))
    }

    /// The last notified size, once things have been quiet long enough
    pub fn take_ready(&mut self, now: Instant) -> Option<(u16, u16)> {
        let (size, ready) = self.pending?;
        if now < ready {
            return None;
        }
        self.pending = None;
        Some(size)
    }
}

impl Default for ResizeDebounce {
    fn default() -> Self {
        Self::new(Self::DEFAULT_QUIET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_becomes_due_after_interval() {
        let mut clock = FrameClock::new(50);
        let start = Instant::now();
        let request = clock.request_at(start);

        assert_eq!(clock.take_due(start), None);
        assert_eq!(clock.time_until_due(start), Duration::from_millis(20));
        assert_eq!(clock.take_due(start + Duration::from_millis(20)), Some(request));
        assert!(!clock.has_pending());
        assert_eq!(clock.take_due(start + Duration::from_millis(40)), None);
    }

    #[test]
    fn test_cancel_only_matching_request() {
        let mut clock = FrameClock::new(60);
        let start = Instant::now();
        let old = clock.request_at(start);
        let current = clock.request_at(start);

        clock.cancel_frame(old);
        assert!(clock.has_pending());

        clock.cancel_frame(current);
        assert!(!clock.has_pending());
        assert_eq!(clock.take_due(start + Duration::from_secs(1)), None);
    }

    #[test]
    fn test_measured_fps_tracks_firing_rate() {
        let mut clock = FrameClock::new(50);
        let mut now = Instant::now();
        for _ in 0..20 {
            clock.request_at(now);
            now += clock.interval();
            assert!(clock.take_due(now).is_some());
        }
        assert!((clock.measured_fps() - 50.0).abs() < 1.0);
    }

    #[test]
    fn test_resize_burst_collapses_to_last_size() {
        let mut debounce = ResizeDebounce::new(Duration::from_millis(100));
        let start = Instant::now();

        debounce.notify((80, 24), start);
        debounce.notify((100, 30), start + Duration::from_millis(50));
        debounce.notify((120, 40), start + Duration::from_millis(90));

        // Quiet period restarts with each notification
        assert_eq!(debounce.take_ready(start + Duration::from_millis(150)), None);
        assert_eq!(
            debounce.take_ready(start + Duration::from_millis(190)),
            Some((120, 40))
        );
        assert!(!debounce.is_pending());
        assert_eq!(debounce.take_ready(start + Duration::from_secs(5)), None);
    }
}
