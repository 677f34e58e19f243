use serde::Serialize;

/// Integer rectangle with an inclusive top-left and exclusive bottom-right edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Rect { x, y, w, h }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.right() && y < self.bottom()
    }

    /// Overlap of two rectangles; a disjoint pair yields a zero-sized rect.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return Rect::new(left, top, 0, 0);
        }
        Rect::new(left, top, right - left, bottom - top)
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }
}

/// Rounding applied when a point crosses a non-integral scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointRoundDir {
    TopLeft,
    BottomRight,
}

/// Rounding applied when a rectangle crosses a non-integral scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RectRoundDir {
    /// Shrink to the pixels fully covered.
    Inside,
    /// Grow to every pixel touched.
    Outside,
}

impl RectRoundDir {
    pub(crate) fn top_left(self) -> PointRoundDir {
        match self {
            RectRoundDir::Inside => PointRoundDir::BottomRight,
            RectRoundDir::Outside => PointRoundDir::TopLeft,
        }
    }

    pub(crate) fn bottom_right(self) -> PointRoundDir {
        match self {
            RectRoundDir::Inside => PointRoundDir::TopLeft,
            RectRoundDir::Outside => PointRoundDir::BottomRight,
        }
    }
}

/// `value * num / den`, floored or ceiled according to `dir`.
pub fn scale_rounded(value: i32, num: i32, den: i32, dir: PointRoundDir) -> i32 {
    debug_assert!(den > 0);
    let product = i64::from(value) * i64::from(num);
    let den = i64::from(den);
    let scaled = match dir {
        PointRoundDir::TopLeft => product.div_euclid(den),
        PointRoundDir::BottomRight => -(-product).div_euclid(den),
    };
    scaled as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_of_disjoint_rects_is_empty() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, 20, 5, 5);
        assert!(a.intersect(&b).is_empty());
        assert_eq!(a.intersect(&Rect::new(5, 5, 10, 10)), Rect::new(5, 5, 5, 5));
    }

    #[test]
    fn contains_excludes_far_edges() {
        let r = Rect::new(-2, -2, 4, 4);
        assert!(r.contains(-2, -2));
        assert!(r.contains(1, 1));
        assert!(!r.contains(2, 0));
    }

    #[test]
    fn scale_rounding_respects_direction_for_negatives() {
        assert_eq!(scale_rounded(3, 1, 2, PointRoundDir::TopLeft), 1);
        assert_eq!(scale_rounded(3, 1, 2, PointRoundDir::BottomRight), 2);
        assert_eq!(scale_rounded(-3, 1, 2, PointRoundDir::TopLeft), -2);
        assert_eq!(scale_rounded(-3, 1, 2, PointRoundDir::BottomRight), -1);
        assert_eq!(scale_rounded(4, 1, 2, PointRoundDir::BottomRight), 2);
    }
}
