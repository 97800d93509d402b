use crate::color::Rgb;
use crate::surface::{DrawSurface, Glow, Point, Stroke};
use image::{Rgba, RgbaImage};

/// Peak opacity of a glow halo at the disc edge
const GLOW_PEAK_ALPHA: f32 = 0.6;

/// Drawing surface backed by an RGBA image, used for headless export
pub struct PixelSurface {
    image: RgbaImage,
    background: Rgb,
}

impl PixelSurface {
    pub fn new(width: u32, height: u32, background: Rgb) -> Self {
        let mut surface = Self {
            image: RgbaImage::new(width, height),
            background,
        };
        surface.clear();
        surface
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        let Rgba([r, g, b, _]) = *self.image.get_pixel(x, y);
        Rgb::new(r, g, b)
    }

    /// Alpha-blend `color` over the pixel at (x, y)
    fn blend(&mut self, x: i64, y: i64, color: Rgb, alpha: f32) {
        if alpha <= 0.0 || x < 0 || y < 0 || x >= self.image.width() as i64 || y >= self.image.height() as i64 {
            return;
        }
        let pixel = self.image.get_pixel_mut(x as u32, y as u32);
        let Rgba([r, g, b, a]) = *pixel;
        let mixed = Rgb::new(r, g, b).lerp(color, alpha.min(1.0));
        *pixel = Rgba([mixed.r, mixed.g, mixed.b, a]);
    }

    /// Pixel bounds of a box around `center`, clipped to the image
    fn bounds(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> (i64, i64, i64, i64) {
        let w = self.image.width() as i64;
        let h = self.image.height() as i64;
        (
            (min_x.floor() as i64).max(0),
            (min_y.floor() as i64).max(0),
            (max_x.ceil() as i64).min(w - 1),
            (max_y.ceil() as i64).min(h - 1),
        )
    }
}

impl DrawSurface for PixelSurface {
    fn size(&self) -> (f32, f32) {
        (self.image.width() as f32, self.image.height() as f32)
    }

    fn resize(&mut self, width: f32, height: f32) {
        self.image = RgbaImage::new(width.max(0.0) as u32, height.max(0.0) as u32);
        self.clear();
    }

    fn clear(&mut self) {
        let Rgb { r, g, b } = self.background;
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba([r, g, b, 255]);
        }
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Rgb, glow: Option<Glow>) {
        if let Some(glow) = glow {
            let outer = radius + glow.blur;
            let (x0, y0, x1, y1) = self.bounds(center.x - outer, center.y - outer, center.x + outer, center.y + outer);
            for y in y0..=y1 {
                for x in x0..=x1 {
                    let d = Point::new(x as f32 + 0.5, y as f32 + 0.5).distance(center);
                    if d > radius && d < outer {
                        let falloff = 1.0 - (d - radius) / glow.blur;
                        self.blend(x, y, glow.color, GLOW_PEAK_ALPHA * falloff * falloff);
                    }
                }
            }
        }

        // Coverage falls off over the last pixel for a soft edge
        let (x0, y0, x1, y1) = self.bounds(
            center.x - radius - 1.0,
            center.y - radius - 1.0,
            center.x + radius + 1.0,
            center.y + radius + 1.0,
        );
        for y in y0..=y1 {
            for x in x0..=x1 {
                let d = Point::new(x as f32 + 0.5, y as f32 + 0.5).distance(center);
                let coverage = (radius + 0.5 - d).clamp(0.0, 1.0);
                self.blend(x, y, color, coverage);
            }
        }
    }

    fn stroke_line(&mut self, from: Point, to: Point, stroke: Stroke) {
        if stroke.alpha <= 0.0 {
            return;
        }
        let half = stroke.width / 2.0;
        let pad = half + 1.0;
        let (x0, y0, x1, y1) = self.bounds(
            from.x.min(to.x) - pad,
            from.y.min(to.y) - pad,
            from.x.max(to.x) + pad,
            from.y.max(to.y) + pad,
        );

        let (sx, sy) = (to.x - from.x, to.y - from.y);
        let length_sq = sx * sx + sy * sy;

        for y in y0..=y1 {
            for x in x0..=x1 {
                let p = Point::new(x as f32 + 0.5, y as f32 + 0.5);
                let t = if length_sq > 0.0 {
                    (((p.x - from.x) * sx + (p.y - from.y) * sy) / length_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let nearest = Point::new(from.x + sx * t, from.y + sy * t);
                let coverage = (half + 0.5 - p.distance(nearest)).clamp(0.0, 1.0);
                self.blend(x, y, stroke.color, coverage * stroke.alpha);
            }
        }
    }

    fn stroke_circle(&mut self, center: Point, radius: f32, stroke: Stroke) {
        if stroke.alpha <= 0.0 {
            return;
        }
        let half = stroke.width / 2.0;
        let outer = radius + half + 1.0;
        let (x0, y0, x1, y1) = self.bounds(center.x - outer, center.y - outer, center.x + outer, center.y + outer);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let d = Point::new(x as f32 + 0.5, y as f32 + 0.5).distance(center);
                let coverage = (half + 0.5 - (d - radius).abs()).clamp(0.0, 1.0);
                self.blend(x, y, stroke.color, coverage * stroke.alpha);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_fills_background() {
        let background = Rgb::new(5, 5, 16);
        let surface = PixelSurface::new(4, 3, background);
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(surface.pixel(x, y), background);
            }
        }
    }

    #[test]
    fn test_disc_center_takes_full_color() {
        let mut surface = PixelSurface::new(20, 20, Rgb::BLACK);
        surface.fill_circle(Point::new(10.0, 10.0), 3.0, Rgb::new(0, 240, 255), None);
        assert_eq!(surface.pixel(10, 10), Rgb::new(0, 240, 255));
        assert_eq!(surface.pixel(0, 0), Rgb::BLACK);
    }

    #[test]
    fn test_glow_brightens_surroundings() {
        let mut plain = PixelSurface::new(40, 40, Rgb::BLACK);
        let mut glowing = PixelSurface::new(40, 40, Rgb::BLACK);
        plain.fill_circle(Point::new(20.0, 20.0), 2.0, Rgb::WHITE, None);
        glowing.fill_circle(
            Point::new(20.0, 20.0),
            2.0,
            Rgb::WHITE,
            Some(Glow {
                color: Rgb::WHITE,
                blur: 10.0,
            }),
        );
        assert_eq!(plain.pixel(25, 20), Rgb::BLACK);
        assert!(glowing.pixel(25, 20).luminance() > 0.0);
    }

    #[test]
    fn test_line_alpha_blends() {
        let mut surface = PixelSurface::new(30, 10, Rgb::BLACK);
        let stroke = Stroke {
            color: Rgb::new(200, 200, 200),
            alpha: 0.5,
            width: 1.0,
        };
        surface.stroke_line(Point::new(0.0, 5.5), Point::new(30.0, 5.5), stroke);
        assert_eq!(surface.pixel(15, 5), Rgb::new(100, 100, 100));
        assert_eq!(surface.pixel(15, 0), Rgb::BLACK);
    }

    #[test]
    fn test_ring_outline_only() {
        let mut surface = PixelSurface::new(40, 40, Rgb::BLACK);
        let stroke = Stroke {
            color: Rgb::WHITE,
            alpha: 1.0,
            width: 1.0,
        };
        surface.stroke_circle(Point::new(20.0, 20.0), 10.0, stroke);
        assert_eq!(surface.pixel(20, 20), Rgb::BLACK);
        assert!(surface.pixel(30, 20).luminance() > 0.0);
        assert!(surface.pixel(20, 9).luminance() > 0.0);
        assert_eq!(surface.pixel(0, 0), Rgb::BLACK);
    }

    #[test]
    fn test_drawing_outside_is_clipped() {
        let mut surface = PixelSurface::new(10, 10, Rgb::BLACK);
        surface.fill_circle(Point::new(-50.0, -50.0), 3.0, Rgb::WHITE, None);
        let stroke = Stroke {
            color: Rgb::WHITE,
            alpha: 1.0,
            width: 1.0,
        };
        surface.stroke_line(Point::new(-20.0, -20.0), Point::new(-5.0, -5.0), stroke);
        assert!(surface.image().pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }
}
