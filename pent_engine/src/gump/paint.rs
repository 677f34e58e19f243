use crate::context::GameContext;
use crate::geometry::{PointRoundDir, Rect, RectRoundDir};
use crate::gump::{Gump, GumpFlags, GumpKind};
use crate::object_manager::ObjId;
use crate::render::RenderSurface;

impl GameContext {
    /// Paints a gump and its subtree.
    ///
    /// The surface origin moves to the gump's local origin and the clip
    /// shrinks to its `dims` for the duration, so nothing below a gump can
    /// draw outside it. Both are restored before returning.
    pub fn paint_gump(&mut self, id: ObjId, surf: &mut dyn RenderSurface, scaled: bool) {
        let Some(gump) = self.objects.gump(id) else {
            return;
        };
        if gump.flags.contains(GumpFlags::HIDDEN) {
            return;
        }
        if matches!(gump.kind, GumpKind::Scaler(_)) {
            self.paint_scaler(id, surf);
            return;
        }

        let (ox, oy) = surf.origin();
        let old_clip = surf.clip();
        let (lx, ly) = gump.gump_to_parent(0, 0, PointRoundDir::TopLeft);
        surf.set_origin(ox + lx, oy + ly);
        let clip = gump.dims.intersect(&old_clip.translated(-lx, -ly));
        surf.set_clip(clip);

        self.paint_this(id, surf);
        self.paint_children(id, surf, scaled);

        surf.set_origin(ox, oy);
        surf.set_clip(old_clip);
    }

    fn paint_this(&mut self, id: ObjId, surf: &mut dyn RenderSurface) {
        let gump = self.objects.gump_at(id);
        match &gump.kind {
            GumpKind::Desktop(_) => {
                surf.fill32(0, gump.dims);
                return;
            }
            GumpKind::GameMap => {
                self.paint_game_map(surf);
                return;
            }
            _ => {}
        }
        if let Some(shape) = gump.shape {
            if let Some(frame) = self.shapes.get_frame(shape, gump.frame) {
                surf.paint(frame, 0, 0);
            }
        }
        if matches!(gump.kind, GumpKind::Container(_)) {
            self.paint_container_contents(id, surf);
        }
    }

    fn paint_children(&mut self, id: ObjId, surf: &mut dyn RenderSurface, scaled: bool) {
        if matches!(self.objects.gump_at(id).kind, GumpKind::Desktop(_)) {
            self.paint_desktop_children(id, surf, scaled);
            return;
        }
        for child in self.objects.gump_at(id).children.clone() {
            let closing = self.objects.gump(child).map(Gump::is_closing).unwrap_or(true);
            if !closing {
                self.paint_gump(child, surf, scaled);
            }
        }
    }

    /// Second pass for content painted at screen resolution over the
    /// scaled view. Children go first in reverse order, then the gump's own
    /// overlay.
    pub fn paint_compositing(&mut self, id: ObjId, surf: &mut dyn RenderSurface) {
        let Some(gump) = self.objects.gump(id) else {
            return;
        };
        if gump.flags.contains(GumpFlags::HIDDEN) {
            return;
        }
        let children = gump.children.clone();
        let dims = gump.dims;

        let origin = surf.origin();
        let old_clip = surf.clip();
        let screen = self
            .objects
            .gump_rect_to_screen_space(id, dims, RectRoundDir::Outside);
        let old_abs = old_clip.translated(origin.0, origin.1);
        surf.set_origin(0, 0);
        surf.set_clip(screen.intersect(&old_abs));

        for child in children.into_iter().rev() {
            let closing = self.objects.gump(child).map(Gump::is_closing).unwrap_or(true);
            if !closing {
                self.paint_compositing(child, surf);
            }
        }
        self.paint_composited(id, surf);

        surf.set_origin(origin.0, origin.1);
        surf.set_clip(old_clip);
    }

    fn paint_composited(&self, id: ObjId, surf: &mut dyn RenderSurface) {
        if matches!(self.objects.gump_at(id).kind, GumpKind::Bark(_)) {
            self.paint_bark_text(id, surf);
        }
    }

    /// Full frame: the scaled scene graph, then the compositing pass.
    pub fn paint_frame(&mut self, surf: &mut dyn RenderSurface) {
        let desktop = self.core.desktop;
        surf.set_origin(0, 0);
        surf.set_clip(Rect::new(0, 0, surf.width(), surf.height()));
        self.paint_gump(desktop, surf, false);
        self.paint_compositing(desktop, surf);
    }
}
