use crate::context::GameContext;
use crate::geometry::PointRoundDir;
use crate::gump::{Gump, GumpFlags, GumpKind};
use crate::object_manager::ObjId;

/// Gump anchored above an item's on-screen position. `ix`/`iy` is the anchor
/// in parent coordinates, recomputed every tick; `x`/`y` then act as a
/// correction on top of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemRelativeGump {
    pub ix: i32,
    pub iy: i32,
}

impl ItemRelativeGump {
    pub fn gump(w: i32, h: i32, owner: ObjId, flags: GumpFlags, layer: i32) -> Gump {
        Gump::new(0, 0, w, h, owner, flags, layer)
            .with_kind(GumpKind::ItemRelative(ItemRelativeGump::default()))
    }
}

impl GameContext {
    /// Re-anchors an item-relative gump over its owner. The owner is looked
    /// up through its containers: the innermost one with an open gump
    /// provides the position, otherwise the game map does. A gump whose
    /// owner is gone closes itself.
    pub fn update_item_location(&mut self, id: ObjId) {
        let Some(gump) = self.objects.gump(id) else {
            return;
        };
        let owner = gump.owner;
        let parent = gump.parent;
        let (w, h) = (gump.dims.w, gump.dims.h);
        let keep_visible = gump.flags.contains(GumpFlags::KEEP_VISIBLE);

        if self.objects.item(owner).is_none() {
            log::debug!("gump {id} lost its item {owner}");
            self.close_gump(id, false);
            return;
        }

        let mut current = owner;
        let mut previous = owner;
        let mut open_gump = None;
        while let Some(next) = self.objects.item(current).and_then(|item| item.parent) {
            previous = current;
            current = next;
            let gump = self
                .objects
                .item(current)
                .and_then(|item| item.gump)
                .filter(|g| self.objects.gump(*g).is_some());
            if gump.is_some() {
                open_gump = gump;
                break;
            }
        }

        let located = match open_gump {
            Some(container) => self
                .container_location_of(container, previous)
                .map(|(x, y)| (container, x, y)),
            None => self
                .game_map_location_of(owner)
                .map(|(x, y)| (self.core.game_map, x, y)),
        };
        let Some((space, gx, gy)) = located else {
            return;
        };

        let dir = PointRoundDir::TopLeft;
        let (sx, sy) = self.objects.gump_to_screen_space(space, gx, gy, dir);
        let (px, py) = match parent {
            Some(parent) => self.objects.screen_space_to_gump(parent, sx, sy, dir),
            None => (sx, sy),
        };

        if let Some(rel) = self
            .objects
            .gump_mut(id)
            .and_then(|g| g.kind.item_relative_mut())
        {
            rel.ix = px - w / 2;
            rel.iy = py - h;
        }
        if keep_visible {
            self.objects.move_on_screen(id);
        }
    }
}
