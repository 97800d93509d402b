use crate::surface::Point;

/// Where the pointer is, and how far its influence reaches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    /// None while the pointer is outside the surface
    pub position: Option<Point>,
    pub radius: f32,
}

impl PointerState {
    pub fn new(radius: f32) -> Self {
        Self {
            position: None,
            radius,
        }
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.position = Some(Point::new(x, y));
    }

    pub fn clear(&mut self) {
        self.position = None;
    }

    pub fn is_present(&self) -> bool {
        self.position.is_some()
    }

    /// Distance to the pointer when it is present and `point` lies inside the interaction zone
    pub fn reach(&self, point: Point) -> Option<(Point, f32)> {
        let pointer = self.position?;
        let distance = point.distance(pointer);
        (distance < self.radius).then_some((pointer, distance))
    }
}

/// Fraction of the remaining gap the marker outline closes each frame
const OUTLINE_EASE: f32 = 0.2;

/// On-canvas cursor: a dot pinned to the pointer and an outline that trails
/// behind it, easing in over a few frames.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerMarker {
    outline: Option<Point>,
}

impl PointerMarker {
    /// Advance the outline one frame toward the pointer. The outline vanishes
    /// with the pointer and reappears directly under it.
    pub fn follow(&mut self, pointer: Option<Point>) {
        self.outline = match (pointer, self.outline) {
            (None, _) => None,
            (Some(target), None) => Some(target),
            (Some(target), Some(current)) => Some(Point::new(
                current.x + (target.x - current.x) * OUTLINE_EASE,
                current.y + (target.y - current.y) * OUTLINE_EASE,
            )),
        };
    }

    pub fn outline(&self) -> Option<Point> {
        self.outline
    }
}
