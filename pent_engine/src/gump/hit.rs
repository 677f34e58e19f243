use crate::context::GameContext;
use crate::geometry::PointRoundDir;
use crate::gump::{GumpFlags, GumpKind};
use crate::object_manager::ObjId;

const TL: PointRoundDir = PointRoundDir::TopLeft;

impl GameContext {
    /// Hit test with a point in the gump's parent space.
    ///
    /// The point must fall inside `dims`. A shaped gump then needs an opaque
    /// pixel of its frame or a hit on one of its children. Modals claim every
    /// point, except a target gump while it traces its own click.
    pub fn point_on_gump(&self, id: ObjId, mx: i32, my: i32) -> bool {
        let Some(gump) = self.objects.gump(id) else {
            return false;
        };
        match &gump.kind {
            GumpKind::Target(target) => return !target.tracing,
            kind if kind.is_modal() => return true,
            _ => {}
        }

        let (gx, gy) = gump.parent_to_gump(mx, my, TL);
        if !gump.dims.contains(gx, gy) {
            return false;
        }
        let Some(shape) = gump.shape else {
            return true;
        };
        let on_frame = self
            .shapes
            .get_frame(shape, gump.frame)
            .map(|frame| frame.has_point(gx, gy))
            .unwrap_or(false);
        on_frame
            || gump
                .children
                .iter()
                .rev()
                .any(|child| self.point_on_gump(*child, gx, gy))
    }

    pub(crate) fn hit_candidates(&self, id: ObjId) -> Vec<ObjId> {
        let Some(gump) = self.objects.gump(id) else {
            return Vec::new();
        };
        gump.children
            .iter()
            .rev()
            .copied()
            .filter(|c| {
                self.objects
                    .gump(*c)
                    .map(|g| !g.is_closing() && !g.flags.contains(GumpFlags::HIDDEN))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Deepest gump under a point in `id`'s parent space, preferring the
    /// frontmost child. Modals answer for themselves when no child hits.
    pub fn find_gump(&self, id: ObjId, mx: i32, my: i32) -> Option<ObjId> {
        let gump = self.objects.gump(id)?;
        let (gx, gy) = gump.parent_to_gump(mx, my, TL);
        let hit = self
            .hit_candidates(id)
            .into_iter()
            .filter(|child| self.point_on_gump(*child, gx, gy))
            .find_map(|child| self.find_gump(child, gx, gy));
        if hit.is_some() {
            return hit;
        }
        if self.point_on_gump(id, mx, my) || gump.kind.is_modal() {
            return Some(id);
        }
        None
    }

    /// Object under a point in `id`'s parent space: a content item, a world
    /// item, or a gump. 0 when nothing is there.
    pub fn trace_obj_id(&self, id: ObjId, mx: i32, my: i32) -> ObjId {
        let Some(gump) = self.objects.gump(id) else {
            return 0;
        };
        let (gx, gy) = gump.parent_to_gump(mx, my, TL);
        for child in self.hit_candidates(id) {
            if self.point_on_gump(child, gx, gy) {
                let traced = self.trace_obj_id(child, gx, gy);
                if traced != 0 {
                    return traced;
                }
            }
        }

        match &gump.kind {
            GumpKind::Container(_) => {
                let content = self.trace_container_contents(id, gx, gy);
                if content != 0 {
                    return content;
                }
            }
            GumpKind::GameMap => return self.trace_game_map(gx, gy),
            GumpKind::Desktop(_) | GumpKind::Scaler(_) => return 0,
            _ => {}
        }
        if self.point_on_gump(id, mx, my) {
            id
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gump::{Gump, LAYER_NORMAL};
    use crate::gumps::ModalGump;
    use crate::shapes::{Shape, ShapeFrame, ShapeLibrary, ShapeRef, GUMP_SHAPES};

    const RING: ShapeRef = ShapeRef::new(GUMP_SHAPES, 7);

    fn ctx_with_ring() -> GameContext {
        let shapes = ShapeLibrary::new().with_shape(RING, Shape::new(vec![ShapeFrame::outline(10, 10, 0xFFFFFF)]));
        let mut ctx = GameContext::headless();
        ctx.shapes = Box::new(shapes);
        ctx
    }

    #[test]
    fn transparent_pixels_do_not_hit() {
        let mut ctx = ctx_with_ring();
        let gump = Gump::new(0, 0, 10, 10, 0, GumpFlags::empty(), LAYER_NORMAL).with_shape(RING, 0);
        let id = ctx.init_gump(gump, Some(ctx.core.desktop), true);
        assert!(ctx.point_on_gump(id, 0, 0));
        assert!(!ctx.point_on_gump(id, 5, 5));
        assert!(!ctx.point_on_gump(id, 10, 0));
    }

    #[test]
    fn frontmost_child_wins() {
        let mut ctx = GameContext::headless();
        let desktop = ctx.core.desktop;
        let back = ctx.init_gump(Gump::new(0, 0, 50, 50, 0, GumpFlags::empty(), LAYER_NORMAL), Some(desktop), true);
        let front = ctx.init_gump(Gump::new(20, 20, 50, 50, 0, GumpFlags::empty(), LAYER_NORMAL), Some(desktop), true);
        let inner = ctx.init_gump(Gump::new(5, 5, 5, 5, 0, GumpFlags::empty(), LAYER_NORMAL), Some(front), true);
        assert_eq!(ctx.find_gump(desktop, 10, 10), Some(back));
        assert_eq!(ctx.find_gump(desktop, 30, 30), Some(front));
        assert_eq!(ctx.find_gump(desktop, 26, 26), Some(inner));
        assert_eq!(ctx.trace_obj_id(desktop, 26, 26), inner);
    }

    #[test]
    fn modal_claims_points_outside_its_area() {
        let mut ctx = GameContext::headless();
        let modal = ctx.init_gump(ModalGump::gump(100, 100, 20, 20), None, true);
        assert!(ctx.point_on_gump(modal, 0, 0));
        assert_eq!(ctx.find_gump(ctx.core.desktop, 1, 1), Some(modal));
    }
}
