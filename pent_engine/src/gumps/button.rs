use crate::context::GameContext;
use crate::gump::{ChildMessage, Gump, GumpFlags, GumpKind};
use crate::input::MouseButton;
use crate::object_manager::ObjId;
use crate::shapes::ShapeRef;

/// Clickable widget that reports to its parent through `child_notify`.
///
/// With `mouse_over` set the down frame doubles as the hover highlight.
#[derive(Debug, Clone)]
pub struct ButtonWidget {
    pub up: Option<(ShapeRef, u32)>,
    pub down: Option<(ShapeRef, u32)>,
    pub mouse_over: bool,
}

impl ButtonWidget {
    pub fn gump(
        x: i32,
        y: i32,
        up: Option<(ShapeRef, u32)>,
        down: Option<(ShapeRef, u32)>,
        mouse_over: bool,
        layer: i32,
    ) -> Gump {
        Gump::new(x, y, 5, 5, 0, GumpFlags::empty(), layer).with_kind(GumpKind::Button(
            ButtonWidget {
                up,
                down,
                mouse_over,
            },
        ))
    }
}

impl GameContext {
    pub(crate) fn init_button(&mut self, id: ObjId) {
        let up = match &self.objects.gump_at(id).kind {
            GumpKind::Button(button) => button.up,
            _ => return,
        };
        self.set_button_frame(id, up);
        let Some((shape, frame)) = up else { return };
        if let Some(frame) = self.shapes.get_frame(shape, frame) {
            self.objects.gump_at_mut(id).update_dims_from_frame(frame);
        }
    }

    fn set_button_frame(&mut self, id: ObjId, frame: Option<(ShapeRef, u32)>) {
        if let (Some(gump), Some((shape, frame))) = (self.objects.gump_mut(id), frame) {
            gump.shape = Some(shape);
            gump.frame = frame;
        }
    }

    fn button_frames(&self, id: ObjId) -> Option<&ButtonWidget> {
        match &self.objects.gump(id)?.kind {
            GumpKind::Button(button) => Some(button),
            _ => None,
        }
    }

    pub(crate) fn button_mouse_down(&mut self, id: ObjId, button: MouseButton) -> Option<ObjId> {
        if button != MouseButton::Left {
            return None;
        }
        let widget = self.button_frames(id)?;
        if !widget.mouse_over {
            let down = widget.down;
            self.set_button_frame(id, down);
        }
        Some(id)
    }

    pub(crate) fn button_mouse_up(&mut self, id: ObjId, button: MouseButton) {
        if button != MouseButton::Left {
            return;
        }
        let Some(widget) = self.button_frames(id) else {
            return;
        };
        if !widget.mouse_over {
            let up = widget.up;
            self.set_button_frame(id, up);
        }
        self.notify_parent(id, ChildMessage::ButtonUp);
    }

    pub(crate) fn button_click(&mut self, id: ObjId, button: MouseButton, mx: i32, my: i32) {
        if button == MouseButton::Left && self.point_on_gump(id, mx, my) {
            self.notify_parent(id, ChildMessage::ButtonClick);
        }
    }

    pub(crate) fn button_double(&mut self, id: ObjId, button: MouseButton, mx: i32, my: i32) {
        if button == MouseButton::Left && self.point_on_gump(id, mx, my) {
            self.notify_parent(id, ChildMessage::ButtonDouble);
        }
    }

    pub(crate) fn button_hover(&mut self, id: ObjId, over: bool) {
        let Some(widget) = self.button_frames(id) else {
            return;
        };
        if widget.mouse_over {
            let frame = if over { widget.down } else { widget.up };
            self.set_button_frame(id, frame);
        }
    }

    fn notify_parent(&mut self, id: ObjId, message: ChildMessage) {
        if let Some(parent) = self.objects.gump(id).and_then(|g| g.parent) {
            self.child_notify(parent, id, message);
        }
    }
}
