use crate::geometry::{scale_rounded, PointRoundDir, Rect, RectRoundDir};
use crate::gump::{Gump, GumpKind};
use crate::object_manager::{ObjId, ObjectManager};

impl Gump {
    /// Offset added on top of `x`/`y`; non-zero only for gumps that follow
    /// an item.
    fn item_offset(&self) -> (i32, i32) {
        self.kind
            .item_relative()
            .map(|rel| (rel.ix, rel.iy))
            .unwrap_or((0, 0))
    }

    pub fn parent_to_gump(&self, px: i32, py: i32, dir: PointRoundDir) -> (i32, i32) {
        if let GumpKind::Scaler(scaler) = &self.kind {
            let gx = scale_rounded(px - self.x, self.dims.w, scaler.width, dir);
            let gy = scale_rounded(py - self.y, self.dims.h, scaler.height, dir);
            return (gx, gy);
        }
        let (ix, iy) = self.item_offset();
        (px - ix - self.x + self.dims.x, py - iy - self.y + self.dims.y)
    }

    pub fn gump_to_parent(&self, gx: i32, gy: i32, dir: PointRoundDir) -> (i32, i32) {
        if let GumpKind::Scaler(scaler) = &self.kind {
            let px = scale_rounded(gx, scaler.width, self.dims.w, dir) + self.x;
            let py = scale_rounded(gy, scaler.height, self.dims.h, dir) + self.y;
            return (px, py);
        }
        let (ix, iy) = self.item_offset();
        (gx - self.dims.x + self.x + ix, gy - self.dims.y + self.y + iy)
    }

    pub fn gump_rect_to_parent(&self, rect: Rect, dir: RectRoundDir) -> Rect {
        let (x1, y1) = self.gump_to_parent(rect.x, rect.y, dir.top_left());
        let (x2, y2) = self.gump_to_parent(rect.right(), rect.bottom(), dir.bottom_right());
        rect_from_corners(rect, x1, y1, x2, y2)
    }

    pub fn parent_rect_to_gump(&self, rect: Rect, dir: RectRoundDir) -> Rect {
        let (x1, y1) = self.parent_to_gump(rect.x, rect.y, dir.top_left());
        let (x2, y2) = self.parent_to_gump(rect.right(), rect.bottom(), dir.bottom_right());
        rect_from_corners(rect, x1, y1, x2, y2)
    }
}

/// Zero-width or zero-height rectangles stay degenerate after transforming.
fn rect_from_corners(original: Rect, x1: i32, y1: i32, x2: i32, y2: i32) -> Rect {
    let w = if original.w != 0 { x2 - x1 } else { 0 };
    let h = if original.h != 0 { y2 - y1 } else { 0 };
    Rect::new(x1, y1, w, h)
}

impl ObjectManager {
    pub fn parent_to_gump(&self, id: ObjId, px: i32, py: i32, dir: PointRoundDir) -> (i32, i32) {
        match self.gump(id) {
            Some(gump) => gump.parent_to_gump(px, py, dir),
            None => (px, py),
        }
    }

    pub fn gump_to_parent(&self, id: ObjId, gx: i32, gy: i32, dir: PointRoundDir) -> (i32, i32) {
        match self.gump(id) {
            Some(gump) => gump.gump_to_parent(gx, gy, dir),
            None => (gx, gy),
        }
    }

    /// Converts through every ancestor, outermost first.
    pub fn screen_space_to_gump(
        &self,
        id: ObjId,
        sx: i32,
        sy: i32,
        dir: PointRoundDir,
    ) -> (i32, i32) {
        let Some(gump) = self.gump(id) else {
            return (sx, sy);
        };
        let (px, py) = match gump.parent {
            Some(parent) => self.screen_space_to_gump(parent, sx, sy, dir),
            None => (sx, sy),
        };
        gump.parent_to_gump(px, py, dir)
    }

    pub fn gump_to_screen_space(
        &self,
        id: ObjId,
        gx: i32,
        gy: i32,
        dir: PointRoundDir,
    ) -> (i32, i32) {
        let Some(gump) = self.gump(id) else {
            return (gx, gy);
        };
        let (px, py) = gump.gump_to_parent(gx, gy, dir);
        match gump.parent {
            Some(parent) => self.gump_to_screen_space(parent, px, py, dir),
            None => (px, py),
        }
    }

    pub fn gump_rect_to_screen_space(&self, id: ObjId, rect: Rect, dir: RectRoundDir) -> Rect {
        let (x1, y1) = self.gump_to_screen_space(id, rect.x, rect.y, dir.top_left());
        let (x2, y2) =
            self.gump_to_screen_space(id, rect.right(), rect.bottom(), dir.bottom_right());
        rect_from_corners(rect, x1, y1, x2, y2)
    }

    pub fn screen_space_rect_to_gump(&self, id: ObjId, rect: Rect, dir: RectRoundDir) -> Rect {
        let (x1, y1) = self.screen_space_to_gump(id, rect.x, rect.y, dir.top_left());
        let (x2, y2) =
            self.screen_space_to_gump(id, rect.right(), rect.bottom(), dir.bottom_right());
        rect_from_corners(rect, x1, y1, x2, y2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gump::{GumpFlags, LAYER_NORMAL};
    use crate::gumps::{ItemRelativeGump, ScalerGump};
    use crate::object_manager::Object;

    const TL: PointRoundDir = PointRoundDir::TopLeft;

    fn add(om: &mut ObjectManager, gump: Gump, parent: Option<ObjId>) -> ObjId {
        let id = om.assign_obj_id(Object::Gump(gump), None);
        if let Some(parent) = parent {
            om.add_child(parent, id, true);
        }
        id
    }

    #[test]
    fn dims_origin_shifts_local_space() {
        let mut gump = Gump::new(10, 20, 40, 40, 0, GumpFlags::empty(), LAYER_NORMAL);
        gump.dims = Rect::new(-5, -8, 40, 40);
        assert_eq!(gump.parent_to_gump(10, 20, TL), (-5, -8));
        assert_eq!(gump.gump_to_parent(0, 0, TL), (15, 28));
    }

    #[test]
    fn item_relative_offset_round_trips_through_three_levels() {
        let mut om = ObjectManager::new();
        let root = add(
            &mut om,
            Gump::new(3, 4, 300, 300, 0, GumpFlags::empty(), LAYER_NORMAL),
            None,
        );
        let mut mid = Gump::new(17, -9, 100, 100, 0, GumpFlags::empty(), LAYER_NORMAL);
        mid.dims = Rect::new(-50, -50, 100, 100);
        let mid = add(&mut om, mid, Some(root));
        let leaf = Gump::new(2, 5, 20, 10, 0, GumpFlags::empty(), LAYER_NORMAL).with_kind(
            GumpKind::ItemRelative(ItemRelativeGump { ix: -31, iy: 12 }),
        );
        let leaf = add(&mut om, leaf, Some(mid));

        for (x, y) in [(0, 0), (-7, 13), (250, -40), (1, 1)] {
            let (gx, gy) = om.screen_space_to_gump(leaf, x, y, TL);
            assert_eq!(om.gump_to_screen_space(leaf, gx, gy, TL), (x, y));
            let (px, py) = om.parent_to_gump(leaf, x, y, TL);
            assert_eq!(om.gump_to_parent(leaf, px, py, TL), (x, y));
        }
    }

    #[test]
    fn scaler_maps_gump_points_back_exactly() {
        let scaler = Gump::new(0, 0, 320, 200, 0, GumpFlags::empty(), LAYER_NORMAL).with_kind(
            GumpKind::Scaler(ScalerGump {
                width: 640,
                height: 400,
            }),
        );
        for (x, y) in [(0, 0), (1, 1), (-3, 7), (319, 199)] {
            let (px, py) = scaler.gump_to_parent(x, y, TL);
            assert_eq!((px, py), (x * 2, y * 2));
            assert_eq!(scaler.parent_to_gump(px, py, TL), (x, y));
            let (bx, by) = scaler.gump_to_parent(x, y, PointRoundDir::BottomRight);
            assert_eq!(scaler.parent_to_gump(bx, by, PointRoundDir::BottomRight), (x, y));
        }
        assert_eq!(scaler.parent_to_gump(3, 3, TL), (1, 1));
        assert_eq!(scaler.parent_to_gump(3, 3, PointRoundDir::BottomRight), (2, 2));
    }

    #[test]
    fn rect_rounding_grows_outside_and_shrinks_inside() {
        let scaler = Gump::new(0, 0, 2, 2, 0, GumpFlags::empty(), LAYER_NORMAL).with_kind(
            GumpKind::Scaler(ScalerGump {
                width: 3,
                height: 3,
            }),
        );
        let parent = Rect::new(1, 1, 1, 1);
        assert_eq!(
            scaler.parent_rect_to_gump(parent, RectRoundDir::Outside),
            Rect::new(0, 0, 2, 2)
        );
        assert_eq!(
            scaler.parent_rect_to_gump(parent, RectRoundDir::Inside),
            Rect::new(1, 1, 0, 0)
        );
        let line = Rect::new(1, 1, 0, 1);
        assert_eq!(scaler.parent_rect_to_gump(line, RectRoundDir::Outside).w, 0);
    }
}
