use crate::context::GameContext;
use crate::geometry::Rect;
use crate::gump::{Gump, GumpFlags, GumpKind, LAYER_GAMEMAP};
use crate::object_manager::{ObjId, Object};
use crate::render::RenderSurface;

/// World view, centred on the camera: gump point (0, 0) is the camera.
pub fn game_map_gump(width: i32, height: i32) -> Gump {
    let mut gump = Gump::new(
        0,
        0,
        width,
        height,
        0,
        GumpFlags::DONT_SAVE | GumpFlags::CORE_GUMP,
        LAYER_GAMEMAP,
    )
    .with_kind(GumpKind::GameMap);
    gump.dims = Rect::new(-width / 2, -height / 2, width, height);
    gump
}

impl GameContext {
    /// Top-level world items in back-to-front order with their projected
    /// positions.
    fn world_display_list(&self) -> Vec<(ObjId, i32, i32)> {
        let mut items: Vec<_> = self
            .objects
            .iter()
            .filter_map(|(id, object)| match object {
                Object::Item(item) if item.parent.is_none() => Some((id, item)),
                _ => None,
            })
            .collect();
        items.sort_by_key(|(id, item)| (item.x + item.y, item.z, *id));
        items
            .into_iter()
            .map(|(id, item)| {
                let (sx, sy) = self.camera.project(item.x, item.y, item.z);
                (id, sx, sy)
            })
            .collect()
    }

    pub(crate) fn paint_game_map(&self, surf: &mut dyn RenderSurface) {
        for (id, sx, sy) in self.world_display_list() {
            let Some(item) = self.objects.item(id) else {
                continue;
            };
            if let Some(frame) = self.shapes.get_frame(item.shape, item.frame) {
                surf.paint(frame, sx, sy);
            }
        }
    }

    /// Frontmost world item whose frame covers the game-map point.
    pub(crate) fn trace_game_map(&self, gx: i32, gy: i32) -> ObjId {
        for (id, sx, sy) in self.world_display_list().into_iter().rev() {
            let Some(item) = self.objects.item(id) else {
                continue;
            };
            let hit = self
                .shapes
                .get_frame(item.shape, item.frame)
                .map(|frame| frame.has_point(gx - sx, gy - sy))
                .unwrap_or(false);
            if hit {
                return id;
            }
        }
        0
    }

    /// Game-map coordinates of an item, through its outermost container.
    pub(crate) fn game_map_location_of(&self, item: ObjId) -> Option<(i32, i32)> {
        let mut current = self.objects.item(item)?;
        while let Some(parent) = current.parent.and_then(|p| self.objects.item(p)) {
            current = parent;
        }
        Some(self.camera.project(current.x, current.y, current.z))
    }
}
