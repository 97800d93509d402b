use crate::color::Rgb;

/// A position in surface (virtual pixel) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Halo drawn around an energized particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glow {
    pub color: Rgb,
    /// Extent of the halo beyond the disc edge
    pub blur: f32,
}

/// Line style for connections
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgb,
    /// Opacity in [0, 1]
    pub alpha: f32,
    pub width: f32,
}

/// Immediate-mode 2D drawing target the field renders into.
///
/// Implementations own their pixel dimensions; the field only asks for the
/// size when it (re)initializes.
pub trait DrawSurface {
    /// Current size in surface coordinates
    fn size(&self) -> (f32, f32);

    /// Change the surface dimensions, discarding its contents
    fn resize(&mut self, width: f32, height: f32);

    /// Wipe the whole surface
    fn clear(&mut self);

    fn fill_circle(&mut self, center: Point, radius: f32, color: Rgb, glow: Option<Glow>);

    fn stroke_line(&mut self, from: Point, to: Point, stroke: Stroke);

    /// Circle outline (the pointer marker)
    fn stroke_circle(&mut self, center: Point, radius: f32, stroke: Stroke);
}
