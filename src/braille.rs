use crate::color::Rgb;
use crate::surface::{DrawSurface, Glow, Point, Stroke};
use ratatui::style::Color;

/// Braille character rendering for high-resolution terminal graphics.
/// Each Braille character represents a 2x4 grid of dots (8 dots total).
///
/// Dot positions and their bit values:
/// ```text
/// (0,0)=0x01  (1,0)=0x08
/// (0,1)=0x02  (1,1)=0x10
/// (0,2)=0x04  (1,2)=0x20
/// (0,3)=0x40  (1,3)=0x80
/// ```
///
/// Unicode Braille patterns: U+2800 to U+28FF (256 patterns)
const BRAILLE_BASE: u32 = 0x2800;

/// Dot position to bit mapping for Braille characters
const BRAILLE_DOTS: [[u8; 4]; 2] = [
    [0x01, 0x02, 0x04, 0x40], // Left column (x=0): rows 0,1,2,3
    [0x08, 0x10, 0x20, 0x80], // Right column (x=1): rows 0,1,2,3
];

/// Virtual pixels covered by one terminal cell. Roughly a real font cell,
/// so viewport-width tiers behave like they would on a screen.
pub const CELL_PIXEL_WIDTH: f32 = 8.0;
pub const CELL_PIXEL_HEIGHT: f32 = 16.0;

/// Virtual pixels per braille dot (square dots)
const DOT_PIXEL_WIDTH: f32 = CELL_PIXEL_WIDTH / 2.0;
const DOT_PIXEL_HEIGHT: f32 = CELL_PIXEL_HEIGHT / 4.0;

/// Lines fainter than this are not worth a dot
const MIN_LINE_SHADE: f32 = 0.05;
/// Terminal dots are coarse; boost line brightness so faint links stay visible
const LINE_GAIN: f32 = 3.0;
const GLOW_SHADE: f32 = 0.35;

/// A single rendered Braille cell with position and color
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrailleCell {
    pub x: u16,
    pub y: u16,
    pub char: char,
    pub color: Color,
}

#[derive(Clone, Copy, Debug)]
struct Dot {
    color: Rgb,
    weight: f32,
}

/// Drawing surface backed by a grid of braille dots
pub struct BrailleCanvas {
    columns: u16,
    rows: u16,
    dots: Vec<Option<Dot>>,
}

impl BrailleCanvas {
    pub fn new(columns: u16, rows: u16) -> Self {
        Self {
            columns,
            rows,
            dots: vec![None; columns as usize * 2 * rows as usize * 4],
        }
    }

    pub fn columns(&self) -> u16 {
        self.columns
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    fn dot_width(&self) -> usize {
        self.columns as usize * 2
    }

    fn dot_height(&self) -> usize {
        self.rows as usize * 4
    }

    /// Set a dot unless a brighter one is already there
    fn plot(&mut self, dx: i64, dy: i64, color: Rgb, weight: f32) {
        if dx < 0 || dy < 0 {
            return;
        }
        let (dx, dy) = (dx as usize, dy as usize);
        if dx >= self.dot_width() || dy >= self.dot_height() {
            return;
        }
        let idx = dy * self.dot_width() + dx;
        match self.dots[idx] {
            Some(existing) if existing.weight >= weight => {}
            _ => self.dots[idx] = Some(Dot { color, weight }),
        }
    }

    fn to_dot(point: Point) -> (f32, f32) {
        (point.x / DOT_PIXEL_WIDTH, point.y / DOT_PIXEL_HEIGHT)
    }

    /// Collapse the dot grid into braille characters; the brightest dot colors the cell
    pub fn cells(&self) -> Vec<BrailleCell> {
        let mut cells = Vec::with_capacity(self.columns as usize * self.rows as usize / 4);
        let width = self.dot_width();

        for cy in 0..self.rows {
            for cx in 0..self.columns {
                let mut pattern: u8 = 0;
                let mut brightest: Option<Dot> = None;

                let base_x = cx as usize * 2;
                let base_y = cy as usize * 4;

                for (dx, column) in BRAILLE_DOTS.iter().enumerate() {
                    for (dy, bit) in column.iter().enumerate() {
                        if let Some(dot) = self.dots[(base_y + dy) * width + base_x + dx] {
                            pattern |= bit;
                            if brightest.map_or(true, |b| dot.weight > b.weight) {
                                brightest = Some(dot);
                            }
                        }
                    }
                }

                // Only emit cells that have at least one dot
                if let Some(dot) = brightest {
                    let braille_char = char::from_u32(BRAILLE_BASE + pattern as u32).unwrap_or(' ');
                    cells.push(BrailleCell {
                        x: cx,
                        y: cy,
                        char: braille_char,
                        color: dot.color.to_ratatui(),
                    });
                }
            }
        }

        cells
    }
}

impl DrawSurface for BrailleCanvas {
    fn size(&self) -> (f32, f32) {
        viewport_size(self.columns, self.rows)
    }

    fn resize(&mut self, width: f32, height: f32) {
        let columns = (width.max(0.0) / CELL_PIXEL_WIDTH) as u16;
        let rows = (height.max(0.0) / CELL_PIXEL_HEIGHT) as u16;
        *self = BrailleCanvas::new(columns, rows);
    }

    fn clear(&mut self) {
        self.dots.fill(None);
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Rgb, glow: Option<Glow>) {
        let (cx, cy) = Self::to_dot(center);
        let r = radius / DOT_PIXEL_WIDTH;

        if let Some(glow) = glow {
            let halo = (radius + glow.blur) / DOT_PIXEL_WIDTH;
            let shade = Rgb::BLACK.lerp(glow.color, GLOW_SHADE);
            let reach = halo.ceil() as i64;
            for oy in -reach..=reach {
                for ox in -reach..=reach {
                    let (px, py) = (cx.floor() as i64 + ox, cy.floor() as i64 + oy);
                    let d = ((px as f32 + 0.5 - cx).powi(2) + (py as f32 + 0.5 - cy).powi(2)).sqrt();
                    if d <= halo {
                        self.plot(px, py, shade, GLOW_SHADE);
                    }
                }
            }
        }

        let reach = r.ceil() as i64;
        for oy in -reach..=reach {
            for ox in -reach..=reach {
                let (px, py) = (cx.floor() as i64 + ox, cy.floor() as i64 + oy);
                let d = ((px as f32 + 0.5 - cx).powi(2) + (py as f32 + 0.5 - cy).powi(2)).sqrt();
                if d <= r {
                    self.plot(px, py, color, 1.0);
                }
            }
        }
        // Sub-dot particles still light their own dot
        self.plot(cx.floor() as i64, cy.floor() as i64, color, 1.0);
    }

    fn stroke_line(&mut self, from: Point, to: Point, stroke: Stroke) {
        let shade = (stroke.alpha * LINE_GAIN * stroke.width).clamp(0.0, 1.0);
        if shade < MIN_LINE_SHADE {
            return;
        }
        let color = Rgb::BLACK.lerp(stroke.color, shade);

        let (x0, y0) = Self::to_dot(from);
        let (x1, y1) = Self::to_dot(to);
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = x0 + (x1 - x0) * t;
            let y = y0 + (y1 - y0) * t;
            // Lines sit under discs and glows of the same brightness
            self.plot(x.floor() as i64, y.floor() as i64, color, shade * 0.99);
        }
    }

    fn stroke_circle(&mut self, center: Point, radius: f32, stroke: Stroke) {
        let shade = (stroke.alpha * LINE_GAIN * stroke.width).clamp(0.0, 1.0);
        if shade < MIN_LINE_SHADE {
            return;
        }
        let color = Rgb::BLACK.lerp(stroke.color, shade);

        let (cx, cy) = Self::to_dot(center);
        let r = radius / DOT_PIXEL_WIDTH;
        // About two samples per dot of circumference
        let steps = (std::f32::consts::TAU * r * 2.0).ceil().max(8.0) as usize;
        for i in 0..steps {
            let angle = i as f32 / steps as f32 * std::f32::consts::TAU;
            let x = cx + r * angle.cos();
            let y = cy + r * angle.sin();
            self.plot(x.floor() as i64, y.floor() as i64, color, shade * 0.99);
        }
    }
}

/// Viewport size in virtual pixels for a canvas of `columns` x `rows` cells
pub fn viewport_size(columns: u16, rows: u16) -> (f32, f32) {
    (columns as f32 * CELL_PIXEL_WIDTH, rows as f32 * CELL_PIXEL_HEIGHT)
}

/// Center of a terminal cell in virtual pixels, relative to the canvas origin
pub fn cell_center(column: u16, row: u16) -> (f32, f32) {
    (
        (column as f32 + 0.5) * CELL_PIXEL_WIDTH,
        (row as f32 + 0.5) * CELL_PIXEL_HEIGHT,
    )
}
