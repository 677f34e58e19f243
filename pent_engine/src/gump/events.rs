//! Per-gump event handlers.
//!
//! Mouse coordinates are always given in the parent space of the gump
//! being asked. Keyboard and text events are not hit-tested; they follow
//! the focus chain.

use crate::context::GameContext;
use crate::geometry::PointRoundDir;
use crate::gump::{Gump, GumpKind};
use crate::input::{Key, MouseButton};
use crate::object_manager::ObjId;

const TL: PointRoundDir = PointRoundDir::TopLeft;

impl GameContext {
    /// Offers a press to the frontmost child under the point, then to the
    /// gump itself. Returns the gump that took it.
    pub fn on_mouse_down(
        &mut self,
        id: ObjId,
        button: MouseButton,
        mx: i32,
        my: i32,
    ) -> Option<ObjId> {
        let gump = self.objects.gump(id)?;
        let (gx, gy) = gump.parent_to_gump(mx, my, TL);
        for child in self.hit_candidates(id) {
            if !self.point_on_gump(child, gx, gy) {
                continue;
            }
            if let Some(handled) = self.on_mouse_down(child, button, gx, gy) {
                return Some(handled);
            }
        }

        match &self.objects.gump(id)?.kind {
            GumpKind::Button(_) => self.button_mouse_down(id, button),
            GumpKind::Bark(_) => {
                self.close_gump(id, false);
                Some(id)
            }
            GumpKind::Target(_) | GumpKind::SlidingWidget => Some(id),
            kind if kind.is_modal() => Some(id),
            _ => None,
        }
    }

    pub fn on_mouse_up(&mut self, id: ObjId, button: MouseButton, mx: i32, my: i32) {
        log::trace!("mouse up {button:?} on gump {id} at ({mx}, {my})");
        match self.objects.gump(id).map(|g| &g.kind) {
            Some(GumpKind::Button(_)) => self.button_mouse_up(id, button),
            Some(GumpKind::Target(_)) => self.target_mouse_up(id, mx, my),
            _ => {}
        }
    }

    pub fn on_mouse_click(&mut self, id: ObjId, button: MouseButton, mx: i32, my: i32) {
        log::trace!("click {button:?} on gump {id}");
        if let Some(GumpKind::Button(_)) = self.objects.gump(id).map(|g| &g.kind) {
            self.button_click(id, button, mx, my);
        }
    }

    pub fn on_mouse_double(&mut self, id: ObjId, button: MouseButton, mx: i32, my: i32) {
        log::trace!("double click {button:?} on gump {id}");
        if let Some(GumpKind::Button(_)) = self.objects.gump(id).map(|g| &g.kind) {
            self.button_double(id, button, mx, my);
        }
    }

    /// Gump the pointer is over. Every gump hit answers for itself when no
    /// child does, so hover can always be tracked.
    pub fn on_mouse_motion(&self, id: ObjId, mx: i32, my: i32) -> Option<ObjId> {
        let gump = self.objects.gump(id)?;
        let (gx, gy) = gump.parent_to_gump(mx, my, TL);
        self.hit_candidates(id)
            .into_iter()
            .filter(|child| self.point_on_gump(*child, gx, gy))
            .find_map(|child| self.on_mouse_motion(child, gx, gy))
            .or(Some(id))
    }

    pub fn on_mouse_over(&mut self, id: ObjId) {
        if let Some(GumpKind::Button(_)) = self.objects.gump(id).map(|g| &g.kind) {
            self.button_hover(id, true);
        }
    }

    pub fn on_mouse_left(&mut self, id: ObjId) {
        if let Some(GumpKind::Button(_)) = self.objects.gump(id).map(|g| &g.kind) {
            self.button_hover(id, false);
        }
    }

    fn live_focus_child(&self, id: ObjId) -> Option<ObjId> {
        let focus = self.objects.gump(id)?.focus_child?;
        let alive = self.objects.gump(focus).map(|g| !g.is_closing())?;
        alive.then_some(focus)
    }

    /// Key press through the focus chain. Returns whether anyone used it.
    pub fn gump_key_down(&mut self, id: ObjId, key: Key) -> bool {
        match self.objects.gump(id).map(|g| &g.kind) {
            Some(GumpKind::Paged(_)) => return self.paged_key_down(id, key),
            Some(GumpKind::Slider(_)) => return self.slider_key_down(id, key),
            Some(_) => {}
            None => return false,
        }
        match self.live_focus_child(id) {
            Some(focus) => self.gump_key_down(focus, key),
            None => false,
        }
    }

    pub fn gump_key_up(&mut self, id: ObjId, key: Key) -> bool {
        match self.live_focus_child(id) {
            Some(focus) => self.gump_key_up(focus, key),
            None => false,
        }
    }

    pub fn gump_text_input(&mut self, id: ObjId, text: &str) -> bool {
        match self.live_focus_child(id) {
            Some(focus) => self.gump_text_input(focus, text),
            None => false,
        }
    }

    /// A drag of `child` begins at a point in this gump's space. Returns
    /// false to refuse the drag.
    pub fn start_dragging_child(&mut self, id: ObjId, child: ObjId, px: i32, py: i32) -> bool {
        if matches!(self.objects.gump(id).map(|g| &g.kind), Some(GumpKind::Slider(_))) {
            return self.slider_start_dragging_child(child, px);
        }
        let Some(gump) = self.objects.gump(child) else {
            return false;
        };
        self.mouse.set_dragging_offset(px - gump.x, py - gump.y);
        self.objects.move_child_to_front(id, child);
        log::trace!("gump {id} started dragging child {child}");
        true
    }

    pub fn dragging_child(&mut self, id: ObjId, child: ObjId, px: i32, py: i32) {
        if matches!(self.objects.gump(id).map(|g| &g.kind), Some(GumpKind::Slider(_))) {
            self.slider_dragging_child(id, child, px);
            return;
        }
        let (dx, dy) = self.mouse.dragging_offset();
        if let Some(gump) = self.objects.gump_mut(child) {
            gump.move_to(px - dx, py - dy);
        }
    }

    pub fn stop_dragging_child(&mut self, id: ObjId, child: ObjId) {
        let at = self.objects.gump(child).map(|g| (g.x, g.y));
        log::trace!("gump {id} stopped dragging child {child} at {at:?}");
    }

    /// Ancestors of a gump from the root down, the gump included.
    pub(crate) fn gump_chain(&self, id: ObjId) -> Vec<ObjId> {
        let mut chain = Vec::new();
        let mut current = self.objects.gump(id);
        while let Some(gump) = current {
            chain.push(gump.id);
            current = gump.parent.and_then(|p| self.objects.gump(p));
        }
        chain.reverse();
        chain
    }

    pub(crate) fn is_live_gump(&self, id: ObjId) -> bool {
        self.objects.gump(id).map(|g: &Gump| !g.is_closing()).unwrap_or(false)
    }
}
