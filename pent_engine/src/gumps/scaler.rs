use crate::context::GameContext;
use crate::geometry::Rect;
use crate::gump::{Gump, GumpFlags, GumpKind, LAYER_NORMAL};
use crate::object_manager::ObjId;
use crate::render::{RenderSurface, SoftSurface};

/// Renders its children at the game-view resolution (`dims`) and stretches
/// the result to `width` x `height` in its parent.
#[derive(Debug, Clone)]
pub struct ScalerGump {
    pub width: i32,
    pub height: i32,
}

impl ScalerGump {
    pub fn gump(x: i32, y: i32, width: i32, height: i32, scaled_w: i32, scaled_h: i32) -> Gump {
        Gump::new(
            x,
            y,
            scaled_w,
            scaled_h,
            0,
            GumpFlags::DONT_SAVE | GumpFlags::CORE_GUMP,
            LAYER_NORMAL,
        )
        .with_kind(GumpKind::Scaler(ScalerGump { width, height }))
    }
}

impl GameContext {
    pub(crate) fn paint_scaler(&mut self, id: ObjId, surf: &mut dyn RenderSurface) {
        let gump = self.objects.gump_at(id);
        let GumpKind::Scaler(scaler) = &gump.kind else {
            return;
        };
        let target = Rect::new(gump.x, gump.y, scaler.width, scaler.height);
        let source = Rect::new(0, 0, gump.dims.w, gump.dims.h);
        let children = gump.children.clone();

        let mut buffer = SoftSurface::new(source.w, source.h);
        for child in children {
            let closing = self.objects.gump(child).map(Gump::is_closing).unwrap_or(true);
            if !closing {
                self.paint_gump(child, &mut buffer, true);
            }
        }
        surf.stretch_blit(&buffer, source, target);
    }
}
