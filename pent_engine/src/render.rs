use serde::Serialize;

use crate::geometry::Rect;
use crate::shapes::ShapeFrame;

/// Drawing target used by the gump paint passes.
///
/// All coordinates are relative to the current origin. The clipping rect is
/// reported and accepted in origin-relative coordinates, but it stays fixed
/// on the surface when the origin moves.
pub trait RenderSurface {
    fn width(&self) -> i32;
    fn height(&self) -> i32;

    fn origin(&self) -> (i32, i32);
    fn set_origin(&mut self, x: i32, y: i32);

    fn clip(&self) -> Rect;
    fn set_clip(&mut self, rect: Rect);

    /// Writes one pixel, honouring the clip rect.
    fn put_pixel(&mut self, x: i32, y: i32, color: u32);
    /// Reads one pixel, `0` outside the surface.
    fn read_pixel(&self, x: i32, y: i32) -> u32;

    /// Text is not rasterised; surfaces only record where it went.
    fn paint_text(&mut self, text: &str, x: i32, y: i32);

    fn fill32(&mut self, color: u32, rect: Rect) {
        let area = rect.intersect(&self.clip());
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                self.put_pixel(x, y, color);
            }
        }
    }

    /// Alpha-blends `color` (alpha in the top byte) over the rect.
    fn fill_blended(&mut self, color: u32, rect: Rect) {
        let alpha = color >> 24;
        let area = rect.intersect(&self.clip());
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let under = self.read_pixel(x, y);
                self.put_pixel(x, y, blend(color, under, alpha));
            }
        }
    }

    /// Paints a frame so its registration point lands on `(x, y)`.
    fn paint(&mut self, frame: &ShapeFrame, x: i32, y: i32) {
        let left = x - frame.xoff;
        let top = y - frame.yoff;
        for fy in 0..frame.height {
            for fx in 0..frame.width {
                if let Some(color) = frame.pixel(fx, fy) {
                    self.put_pixel(left + fx, top + fy, color);
                }
            }
        }
    }

    /// Nearest-neighbour copy of `src_rect` of `src` onto `dst_rect`.
    fn stretch_blit(&mut self, src: &dyn RenderSurface, src_rect: Rect, dst_rect: Rect) {
        if src_rect.is_empty() || dst_rect.is_empty() {
            return;
        }
        for dy in 0..dst_rect.h {
            let sy = src_rect.y + dy * src_rect.h / dst_rect.h;
            for dx in 0..dst_rect.w {
                let sx = src_rect.x + dx * src_rect.w / dst_rect.w;
                self.put_pixel(dst_rect.x + dx, dst_rect.y + dy, src.read_pixel(sx, sy));
            }
        }
    }
}

fn blend(over: u32, under: u32, alpha: u32) -> u32 {
    let channel = |shift: u32| {
        let o = (over >> shift) & 0xFF;
        let u = (under >> shift) & 0xFF;
        ((o * alpha + u * (255 - alpha)) / 255) << shift
    };
    channel(16) | channel(8) | channel(0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaintedText {
    pub text: String,
    pub x: i32,
    pub y: i32,
}

/// Software framebuffer of `0x00RRGGBB` pixels.
#[derive(Debug, Clone)]
pub struct SoftSurface {
    width: i32,
    height: i32,
    pixels: Vec<u32>,
    origin: (i32, i32),
    /// Absolute surface coordinates.
    clip: Rect,
    texts: Vec<PaintedText>,
}

impl SoftSurface {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        SoftSurface {
            width,
            height,
            pixels: vec![0; (width * height) as usize],
            origin: (0, 0),
            clip: Rect::new(0, 0, width, height),
            texts: Vec::new(),
        }
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn texts(&self) -> &[PaintedText] {
        &self.texts
    }

    /// Absolute pixel, ignoring origin and clip.
    pub fn pixel_at(&self, x: i32, y: i32) -> Option<u32> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    pub fn map_pixels(&mut self, mut f: impl FnMut(u32) -> u32) {
        for pixel in &mut self.pixels {
            *pixel = f(*pixel);
        }
    }

    pub fn reset(&mut self) {
        self.pixels.iter_mut().for_each(|p| *p = 0);
        self.texts.clear();
        self.origin = (0, 0);
        self.clip = Rect::new(0, 0, self.width, self.height);
    }
}

impl RenderSurface for SoftSurface {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn origin(&self) -> (i32, i32) {
        self.origin
    }

    fn set_origin(&mut self, x: i32, y: i32) {
        self.origin = (x, y);
    }

    fn clip(&self) -> Rect {
        self.clip.translated(-self.origin.0, -self.origin.1)
    }

    fn set_clip(&mut self, rect: Rect) {
        let bounds = Rect::new(0, 0, self.width, self.height);
        self.clip = rect
            .translated(self.origin.0, self.origin.1)
            .intersect(&bounds);
    }

    fn put_pixel(&mut self, x: i32, y: i32, color: u32) {
        let ax = x + self.origin.0;
        let ay = y + self.origin.1;
        if !self.clip.contains(ax, ay) {
            return;
        }
        self.pixels[(ay * self.width + ax) as usize] = color & 0x00FF_FFFF;
    }

    fn read_pixel(&self, x: i32, y: i32) -> u32 {
        self.pixel_at(x + self.origin.0, y + self.origin.1)
            .unwrap_or(0)
    }

    fn paint_text(&mut self, text: &str, x: i32, y: i32) {
        let ax = x + self.origin.0;
        let ay = y + self.origin.1;
        if !self.clip.contains(ax, ay) {
            return;
        }
        self.texts.push(PaintedText {
            text: text.to_string(),
            x: ax,
            y: ay,
        });
    }
}
