use std::collections::HashMap;

use serde::Serialize;

use crate::geometry::Rect;

/// Archive holding world item shapes.
pub const MAIN_SHAPES: u16 = 1;
/// Archive holding gump artwork.
pub const GUMP_SHAPES: u16 = 2;

/// Identity of a shape inside a flex archive. Flex 0 is never a valid archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ShapeRef {
    pub flex: u16,
    pub shape: u32,
}

impl ShapeRef {
    pub const fn new(flex: u16, shape: u32) -> Self {
        ShapeRef { flex, shape }
    }
}

/// One frame of a shape: ARGB pixels with `None` for transparent, positioned
/// so that `(xoff, yoff)` inside the frame lands on the paint point.
#[derive(Debug, Clone)]
pub struct ShapeFrame {
    pub width: i32,
    pub height: i32,
    pub xoff: i32,
    pub yoff: i32,
    pixels: Vec<Option<u32>>,
}

impl ShapeFrame {
    pub fn new(width: i32, height: i32, xoff: i32, yoff: i32, pixels: Vec<Option<u32>>) -> Self {
        assert_eq!(
            pixels.len(),
            (width.max(0) * height.max(0)) as usize,
            "frame pixel count must match its size"
        );
        ShapeFrame {
            width,
            height,
            xoff,
            yoff,
            pixels,
        }
    }

    pub fn solid(width: i32, height: i32, color: u32) -> Self {
        Self::new(
            width,
            height,
            0,
            0,
            vec![Some(color); (width.max(0) * height.max(0)) as usize],
        )
    }

    /// Frame with an opaque border and a transparent interior.
    pub fn outline(width: i32, height: i32, color: u32) -> Self {
        let mut pixels = Vec::with_capacity((width.max(0) * height.max(0)) as usize);
        for y in 0..height {
            for x in 0..width {
                let edge = x == 0 || y == 0 || x == width - 1 || y == height - 1;
                pixels.push(edge.then_some(color));
            }
        }
        Self::new(width, height, 0, 0, pixels)
    }

    pub fn with_offset(mut self, xoff: i32, yoff: i32) -> Self {
        self.xoff = xoff;
        self.yoff = yoff;
        self
    }

    /// Pixel at frame-local coordinates, `None` when transparent or outside.
    pub fn pixel(&self, fx: i32, fy: i32) -> Option<u32> {
        if fx < 0 || fy < 0 || fx >= self.width || fy >= self.height {
            return None;
        }
        self.pixels[(fy * self.width + fx) as usize]
    }

    /// Hit test relative to the paint point.
    pub fn has_point(&self, x: i32, y: i32) -> bool {
        self.pixel(x + self.xoff, y + self.yoff).is_some()
    }

    /// Area covered relative to the paint point.
    pub fn bounds(&self) -> Rect {
        Rect::new(-self.xoff, -self.yoff, self.width, self.height)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Shape {
    frames: Vec<ShapeFrame>,
}

impl Shape {
    pub fn new(frames: Vec<ShapeFrame>) -> Self {
        Shape { frames }
    }

    pub fn frame(&self, frame: u32) -> Option<&ShapeFrame> {
        self.frames.get(frame as usize)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

pub trait ShapeArchive {
    fn get_shape(&self, shape: ShapeRef) -> Option<&Shape>;

    fn get_frame(&self, shape: ShapeRef, frame: u32) -> Option<&ShapeFrame> {
        self.get_shape(shape)?.frame(frame)
    }
}

/// In-memory archive used by the demo session and by tests.
#[derive(Debug, Clone, Default)]
pub struct ShapeLibrary {
    shapes: HashMap<ShapeRef, Shape>,
}

impl ShapeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, shape: ShapeRef, data: Shape) {
        self.shapes.insert(shape, data);
    }

    pub fn with_shape(mut self, shape: ShapeRef, data: Shape) -> Self {
        self.insert(shape, data);
        self
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl ShapeArchive for ShapeLibrary {
    fn get_shape(&self, shape: ShapeRef) -> Option<&Shape> {
        self.shapes.get(&shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparent_pixels_do_not_hit() {
        let frame = ShapeFrame::outline(4, 4, 0xFFFFFF).with_offset(2, 2);
        assert!(frame.has_point(-2, -2));
        assert!(!frame.has_point(0, 0));
        assert!(frame.has_point(1, 1));
        assert!(!frame.has_point(2, 2));
        assert_eq!(frame.bounds(), Rect::new(-2, -2, 4, 4));
    }

    #[test]
    fn library_resolves_frames_by_reference() {
        let id = ShapeRef::new(GUMP_SHAPES, 7);
        let library = ShapeLibrary::new().with_shape(
            id,
            Shape::new(vec![ShapeFrame::solid(2, 2, 1), ShapeFrame::solid(3, 3, 2)]),
        );
        assert_eq!(library.get_frame(id, 1).map(|f| f.width), Some(3));
        assert!(library.get_frame(id, 2).is_none());
        assert!(library.get_shape(ShapeRef::new(MAIN_SHAPES, 7)).is_none());
    }
}
