use crate::context::GameContext;
use crate::geometry::{PointRoundDir, Rect, RectRoundDir};
use crate::gump::{ChildMessage, Gump, GumpFlags, GumpKind, Position};
use crate::object_manager::{ObjId, Object, ObjectManager};
use crate::process::{ProcId, Process};
use crate::processes::GumpNotifyProcess;

impl ObjectManager {
    /// Places a gump at an anchor inside its parent's area.
    pub fn set_relative_position(&mut self, id: ObjId, position: Position, xoff: i32, yoff: i32) {
        let Some(parent) = self.gump(id).and_then(|g| g.parent) else {
            return;
        };
        let area = self.gump_at(parent).dims;
        let gump = self.gump_at_mut(id);
        let (w, h) = (gump.dims.w, gump.dims.h);
        let left = area.x;
        let top = area.y;
        let center_x = area.x + area.w / 2 - w / 2;
        let center_y = area.y + area.h / 2 - h / 2;
        let right = area.right() - w;
        let bottom = area.bottom() - h;
        let (x, y) = match position {
            Position::Center => (center_x, center_y),
            Position::TopLeft => (left, top),
            Position::TopRight => (right, top),
            Position::BottomLeft => (left, bottom),
            Position::BottomRight => (right, bottom),
            Position::TopCenter => (center_x, top),
            Position::BottomCenter => (center_x, bottom),
            Position::LeftCenter => (left, center_y),
            Position::RightCenter => (right, center_y),
        };
        gump.move_to(x + xoff, y + yoff);
    }

    /// Shifts a gump so its area lies inside the parent's. Item-relative
    /// gumps first drop any earlier correction.
    pub fn move_on_screen(&mut self, id: ObjId) {
        let Some(parent) = self.gump(id).and_then(|g| g.parent) else {
            return;
        };
        let bounds = self.gump_at(parent).dims;
        let gump = self.gump_at_mut(id);
        if gump.kind.item_relative().is_some() {
            gump.move_to(0, 0);
        }
        let area = gump.gump_rect_to_parent(gump.dims, RectRoundDir::Outside);

        let dx = if area.x < bounds.x {
            bounds.x - area.x
        } else if area.right() > bounds.right() {
            bounds.right() - area.right()
        } else {
            0
        };
        let dy = if area.y < bounds.y {
            bounds.y - area.y
        } else if area.bottom() > bounds.bottom() {
            bounds.bottom() - area.bottom()
        } else {
            0
        };
        gump.move_to(gump.x + dx, gump.y + dy);
    }
}

impl GameContext {
    /// Registers a gump and attaches it under `parent`, or wherever
    /// [`add_gump`](Self::add_gump) routes it. Kind-specific setup runs once
    /// the gump is in the tree; gumps owned by an item get a notifier.
    pub fn init_gump(&mut self, gump: Gump, parent: Option<ObjId>, take_focus: bool) -> ObjId {
        let class_name = gump.class_name();
        let id = self.objects.assign_obj_id(Object::Gump(gump), None);
        assert_ne!(id, 0, "object id pool exhausted while opening a {class_name}");

        match parent {
            Some(parent) => self.objects.add_child(parent, id, take_focus),
            None => self.add_gump(id, take_focus),
        }

        if self.objects.gump_at(id).kind.is_modal() {
            self.modal_pause(id);
        }
        match &self.objects.gump_at(id).kind {
            GumpKind::Paged(_) => self.init_paged(id),
            GumpKind::Slider(_) => self.init_slider(id),
            GumpKind::Target(_) => self.init_target(id),
            GumpKind::Button(_) => self.init_button(id),
            GumpKind::Container(_) => self.update_dims_from_shape(id),
            GumpKind::Bark(_) => self.init_bark(id),
            _ => {}
        }
        if self.objects.gump_at(id).kind.item_relative().is_some() {
            self.update_item_location(id);
            if parent.is_none() && self.objects.gump(id).is_some() {
                self.objects.move_on_screen(id);
            }
        }

        let Some(gump) = self.objects.gump(id) else {
            return id;
        };
        if gump.owner != 0 && gump.notifier == 0 && !gump.is_closing() {
            self.create_notifier(id);
        }
        log::debug!("gump {id} ({class_name}) opened");
        id
    }

    /// Resizes a gump to its shape's current frame, if the shape resolves.
    pub fn update_dims_from_shape(&mut self, id: ObjId) {
        let Some(gump) = self.objects.gump(id) else {
            return;
        };
        let Some(shape) = gump.shape else { return };
        if let Some(frame) = self.shapes.get_frame(shape, gump.frame) {
            self.objects.gump_at_mut(id).update_dims_from_frame(frame);
        }
    }

    /// Starts the process that reports this gump's closing. Panics if the
    /// gump already has one.
    pub fn create_notifier(&mut self, id: ObjId) -> ProcId {
        let gump = self.objects.gump_at(id);
        assert_eq!(gump.notifier, 0, "gump {id} already has a notifier");
        let process = Process::new(GumpNotifyProcess::new(id))
            .with_item(gump.owner)
            .with_type(GumpNotifyProcess::PROCESS_TYPE);
        let pid = self.kernel.add_process(process);
        self.objects.gump_at_mut(id).notifier = pid;
        pid
    }

    /// Attaches a parentless gump to the core gump matching its kind.
    pub fn add_gump(&mut self, id: ObjId, take_focus: bool) {
        let Some(gump) = self.objects.gump(id) else {
            return;
        };
        let target = match &gump.kind {
            GumpKind::Desktop(_) => return,
            GumpKind::Scaler(_) => self.core.desktop,
            kind if kind.is_modal() => self.core.desktop,
            GumpKind::GameMap => self.core.scaler,
            _ => self.core.scaler,
        };
        let target = if self.objects.gump(target).is_some() {
            target
        } else {
            self.core.desktop
        };
        if target != id {
            self.objects.add_child(target, id, take_focus);
        }
    }

    /// Closes a gump.
    ///
    /// The notifier (if any) terminates with the gump's process result. A
    /// parented gump is only flagged; its parent reaps it on the next run.
    /// A parentless gump is deleted at once unless `no_del` is set.
    pub fn close_gump(&mut self, id: ObjId, no_del: bool) {
        let Some(gump) = self.objects.gump(id) else {
            return;
        };
        if gump.is_closing() {
            return;
        }
        if gump.kind.is_modal() {
            self.modal_unpause(id);
        }
        match &self.objects.gump_at(id).kind {
            GumpKind::Paged(_) => self.close_paged(id),
            GumpKind::Slider(_) => self.close_slider(id),
            GumpKind::Target(_) => self.close_target(),
            GumpKind::Container(_) => self.close_container(id),
            _ => {}
        }

        let gump = self.objects.gump_at_mut(id);
        let notifier = std::mem::take(&mut gump.notifier);
        let result = gump.process_result;
        gump.flags |= GumpFlags::CLOSING;
        let parent = gump.parent;
        if notifier != 0 {
            GumpNotifyProcess::notify_closing(self, notifier, result);
        }
        log::debug!("gump {id} closing");

        match parent {
            None if !no_del => self.delete_gump(id),
            None => {}
            Some(parent) => {
                self.child_notify(parent, id, ChildMessage::Closing);
                if !no_del {
                    if let Some(gump) = self.objects.gump_mut(id) {
                        gump.flags |= GumpFlags::CLOSE_AND_DEL;
                    }
                }
            }
        }
    }

    /// Destroys a gump and its whole subtree, releasing held pauses.
    pub fn delete_gump(&mut self, id: ObjId) {
        let Some(gump) = self.objects.gump(id) else {
            return;
        };
        let children = gump.children.clone();
        let parent = gump.parent;
        for child in children {
            self.delete_gump(child);
        }
        if self.objects.gump_at(id).kind.is_modal() {
            self.modal_unpause(id);
        }
        if let Some(parent) = parent {
            self.objects.remove_child(parent, id);
        }
        let owner = self.objects.gump_at(id).owner;
        if let Some(item) = self.objects.item_mut(owner) {
            if item.gump == Some(id) {
                item.gump = None;
            }
        }
        self.objects.clear_obj_id(id);
        log::trace!("gump {id} deleted");
    }

    /// Upcall from a child. Only some kinds react.
    pub fn child_notify(&mut self, parent: ObjId, child: ObjId, message: ChildMessage) {
        log::trace!("gump {parent} notified by {child}: {message:?}");
        match self.objects.gump(parent).map(|g| &g.kind) {
            Some(GumpKind::Paged(_)) => self.paged_child_notify(parent, child, message),
            Some(GumpKind::Slider(_)) => self.slider_child_notify(parent, child, message),
            _ => {}
        }
    }

    /// One tick of a gump subtree.
    ///
    /// Each child runs unless it is closing; a child found closing after
    /// its turn is unlinked, focus moves to the new topmost child and the
    /// child is deleted if it asked for that. Closing a gump from inside an
    /// event handler therefore never disturbs this walk.
    pub fn run_gump(&mut self, id: ObjId) {
        let Some(gump) = self.objects.gump(id) else {
            return;
        };
        for child in gump.children.clone() {
            let Some(state) = self.objects.gump(child) else {
                continue;
            };
            if state.parent != Some(id) {
                continue;
            }
            if !state.is_closing() {
                self.run_gump(child);
            }
            let Some(state) = self.objects.gump(child) else {
                continue;
            };
            if state.is_closing() {
                let delete = state.flags.contains(GumpFlags::CLOSE_AND_DEL);
                if let Some(gump) = self.objects.gump_mut(id) {
                    gump.children.retain(|c| *c != child);
                }
                self.objects.find_new_focus_child(id);
                if delete {
                    self.objects.gump_at_mut(child).parent = None;
                    self.delete_gump(child);
                } else {
                    self.objects.gump_at_mut(child).parent = None;
                }
            }
        }

        let Some(gump) = self.objects.gump(id) else {
            return;
        };
        if gump.kind.item_relative().is_some() {
            self.update_item_location(id);
        }
        if matches!(self.objects.gump(id).map(|g| &g.kind), Some(GumpKind::Bark(_))) {
            self.run_bark(id);
        }
    }

    pub fn hide_gump(&mut self, id: ObjId) {
        if let Some(gump) = self.objects.gump_mut(id) {
            gump.hide();
        }
    }

    pub fn unhide_gump(&mut self, id: ObjId) {
        if let Some(gump) = self.objects.gump_mut(id) {
            gump.unhide();
        }
    }

    /// Screen-space bounds of a gump, rounded outwards.
    pub fn screen_bounds(&self, id: ObjId) -> Option<Rect> {
        let dims = self.objects.gump(id)?.dims;
        Some(
            self.objects
                .gump_rect_to_screen_space(id, dims, RectRoundDir::Outside),
        )
    }

    /// Screen position of a gump's local origin.
    pub fn screen_origin(&self, id: ObjId) -> (i32, i32) {
        self.objects
            .gump_to_screen_space(id, 0, 0, PointRoundDir::TopLeft)
    }
}
