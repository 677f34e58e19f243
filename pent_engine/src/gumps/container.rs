use crate::context::GameContext;
use crate::geometry::Rect;
use crate::gump::{Gump, GumpFlags, GumpKind, LAYER_NORMAL};
use crate::gumps::ItemRelativeGump;
use crate::object_manager::ObjId;
use crate::render::RenderSurface;
use crate::shapes::ShapeRef;

/// Window showing the contents of a container item. Contents are painted
/// at their gump position offset by `item_area`.
#[derive(Debug, Clone)]
pub struct ContainerGump {
    pub rel: ItemRelativeGump,
    pub item_area: Rect,
}

impl ContainerGump {
    pub fn gump(owner: ObjId, shape: ShapeRef, frame: u32, item_area: Rect) -> Gump {
        Gump::new(
            0,
            0,
            item_area.w,
            item_area.h,
            owner,
            GumpFlags::DRAGGABLE | GumpFlags::ITEM_DEPENDENT,
            LAYER_NORMAL,
        )
        .with_shape(shape, frame)
        .with_kind(GumpKind::Container(ContainerGump {
            rel: ItemRelativeGump::default(),
            item_area,
        }))
    }
}

impl GameContext {
    /// Opens a gump for an item and records it on the item. Returns 0 if
    /// the item is missing.
    pub fn open_item_gump(&mut self, item: ObjId, gump: Gump, parent: Option<ObjId>) -> ObjId {
        if self.objects.item(item).is_none() {
            return 0;
        }
        let id = self.init_gump(gump, parent, true);
        if let Some(item) = self.objects.item_mut(item) {
            item.gump = Some(id);
        }
        id
    }

    fn item_area(&self, id: ObjId) -> Option<Rect> {
        match &self.objects.gump(id)?.kind {
            GumpKind::Container(container) => Some(container.item_area),
            _ => None,
        }
    }

    /// Where a content item sits inside an open container gump.
    pub(crate) fn container_location_of(&self, id: ObjId, item: ObjId) -> Option<(i32, i32)> {
        let area = self.item_area(id)?;
        let owner = self.objects.gump(id)?.owner;
        let item = self.objects.item(item)?;
        if item.parent != Some(owner) {
            return None;
        }
        Some((item.gump_x + area.x, item.gump_y + area.y))
    }

    pub(crate) fn paint_container_contents(&self, id: ObjId, surf: &mut dyn RenderSurface) {
        let Some(area) = self.item_area(id) else {
            return;
        };
        let owner = self.objects.gump_at(id).owner;
        let Some(container) = self.objects.item(owner) else {
            return;
        };
        for content in &container.contents {
            let Some(item) = self.objects.item(*content) else {
                continue;
            };
            if let Some(frame) = self.shapes.get_frame(item.shape, item.frame) {
                surf.paint(frame, item.gump_x + area.x, item.gump_y + area.y);
            }
        }
    }

    /// Frontmost content item under a point in the container gump's space.
    pub(crate) fn trace_container_contents(&self, id: ObjId, gx: i32, gy: i32) -> ObjId {
        let Some(area) = self.item_area(id) else {
            return 0;
        };
        let owner = self.objects.gump_at(id).owner;
        let Some(container) = self.objects.item(owner) else {
            return 0;
        };
        for content in container.contents.iter().rev() {
            let Some(item) = self.objects.item(*content) else {
                continue;
            };
            let hit = self
                .shapes
                .get_frame(item.shape, item.frame)
                .map(|f| f.has_point(gx - item.gump_x - area.x, gy - item.gump_y - area.y))
                .unwrap_or(false);
            if hit {
                return *content;
            }
        }
        0
    }

    /// Closing a container closes the gumps of its contents and unlinks the
    /// container item from this gump.
    pub(crate) fn close_container(&mut self, id: ObjId) {
        let owner = self.objects.gump_at(id).owner;
        let Some(container) = self.objects.item(owner) else {
            return;
        };
        let contents = container.contents.clone();
        for content in contents {
            let open = self.objects.item_mut(content).and_then(|item| item.gump.take());
            if let Some(gump) = open {
                self.close_gump(gump, false);
            }
        }
        if let Some(item) = self.objects.item_mut(owner) {
            if item.gump == Some(id) {
                item.gump = None;
            }
        }
    }
}
