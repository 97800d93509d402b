use crate::color::Palette;
use crate::engine::{FieldEngine, FrameRequest, FrameScheduler};
use crate::error::{FieldError, Result};
use crate::raster::PixelSurface;
use crate::settings::FieldSettings;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

/// GIF frames are quantized with this speed (1 = best, 30 = fastest)
const GIF_QUANTIZE_SPEED: i32 = 10;

/// Options for a headless render
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub width: u32,
    pub height: u32,
    pub frames: usize,
    pub settings: FieldSettings,
    pub palette: Palette,
    pub seed: Option<u64>,
    /// Sweep a virtual pointer around the center so repulsion shows up
    pub orbit_pointer: bool,
    /// Write the final frame here
    pub png: Option<PathBuf>,
    /// Write an animated GIF here
    pub gif: Option<PathBuf>,
    /// Capture every Nth frame into the GIF
    pub gif_stride: usize,
}

impl Default for RenderJob {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            frames: 180,
            settings: FieldSettings::default(),
            palette: Palette::default(),
            seed: None,
            orbit_pointer: false,
            png: None,
            gif: None,
            gif_stride: 2,
        }
    }
}

/// Summary of a finished render
#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    pub frames: usize,
    pub gif_frames: usize,
    pub particles: usize,
}

/// Frame source for offline rendering: every request fires immediately
#[derive(Debug, Default)]
struct HeadlessClock {
    next_id: u64,
    pending: Option<FrameRequest>,
}

impl HeadlessClock {
    fn take(&mut self) -> Option<FrameRequest> {
        self.pending.take()
    }
}

impl FrameScheduler for HeadlessClock {
    fn request_frame(&mut self) -> FrameRequest {
        self.next_id += 1;
        let request = FrameRequest(self.next_id);
        self.pending = Some(request);
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if self.pending == Some(request) {
            self.pending = None;
        }
    }
}

/// Pointer position on a slow ellipse around the viewport center
pub fn orbit_position(frame: usize, total: usize, width: f32, height: f32) -> (f32, f32) {
    let turns = frame as f32 / total.max(1) as f32;
    let angle = turns * std::f32::consts::TAU;
    (
        width / 2.0 + width * 0.3 * angle.cos(),
        height / 2.0 + height * 0.3 * angle.sin(),
    )
}

/// Simulate the field offscreen and write the requested outputs
pub fn render(job: &RenderJob) -> Result<RenderReport> {
    if job.width == 0 || job.height == 0 || job.width > u16::MAX as u32 || job.height > u16::MAX as u32 {
        return Err(FieldError::InvalidDimensions {
            width: job.width,
            height: job.height,
        });
    }

    let surface = PixelSurface::new(job.width, job.height, job.palette.colors().background);
    let Some(mut engine) = FieldEngine::attach(Some(surface), job.settings.clone(), job.palette, job.seed) else {
        return Err(FieldError::InvalidDimensions {
            width: job.width,
            height: job.height,
        });
    };

    let mut encoder = match &job.gif {
        Some(path) => {
            let writer = BufWriter::new(File::create(path)?);
            let mut encoder = gif::Encoder::new(writer, job.width as u16, job.height as u16, &[])?;
            encoder.set_repeat(gif::Repeat::Infinite)?;
            Some(encoder)
        }
        None => None,
    };

    let stride = job.gif_stride.max(1);
    // GIF delays are in hundredths of a second
    let delay = ((100 * stride) as f32 / job.settings.target_fps.max(1) as f32).round() as u16;
    let mut gif_frames = 0;

    let mut clock = HeadlessClock::default();
    engine.start(&mut clock);

    for frame in 0..job.frames {
        if job.orbit_pointer {
            let (x, y) = orbit_position(frame, job.frames, job.width as f32, job.height as f32);
            engine.pointer_moved(x, y);
        }

        let Some(request) = clock.take() else { break };
        engine.on_frame(&mut clock, request);

        if let Some(encoder) = encoder.as_mut() {
            if frame % stride == 0 {
                let mut pixels = engine.surface().image().as_raw().clone();
                let mut gif_frame =
                    gif::Frame::from_rgba_speed(job.width as u16, job.height as u16, &mut pixels, GIF_QUANTIZE_SPEED);
                gif_frame.delay = delay.max(2);
                encoder.write_frame(&gif_frame)?;
                gif_frames += 1;
            }
        }
    }

    engine.stop(&mut clock);
    // Dropping the encoder writes the GIF trailer
    drop(encoder);

    if let Some(path) = &job.png {
        engine.surface().image().save(path)?;
        tracing::info!(path = %path.display(), "snapshot written");
    }
    if let Some(path) = &job.gif {
        tracing::info!(path = %path.display(), frames = gif_frames, "animation written");
    }

    Ok(RenderReport {
        frames: engine.field().frames() as usize,
        gif_frames,
        particles: engine.field().particles().len(),
    })
}
