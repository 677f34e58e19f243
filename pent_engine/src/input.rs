//! Host input routed into the gump tree.
//!
//! Tracks which gump took each mouse button, turns releases into single or
//! double clicks, follows hover and runs the drag protocol. All positions
//! handed in are screen coordinates.

use serde::Serialize;

use crate::context::GameContext;
use crate::geometry::PointRoundDir;
use crate::object_manager::ObjId;

const TL: PointRoundDir = PointRoundDir::TopLeft;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl MouseButton {
    pub const ALL: [MouseButton; 3] = [MouseButton::Left, MouseButton::Middle, MouseButton::Right];

    fn index(self) -> usize {
        match self {
            MouseButton::Left => 0,
            MouseButton::Middle => 1,
            MouseButton::Right => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Backspace,
    Left,
    Right,
    Up,
    Down,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum MouseCursor {
    #[default]
    Pointer,
    Hand,
    Target,
    Wait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingClick {
    gump: ObjId,
    x: i32,
    y: i32,
    at_ms: u64,
}

#[derive(Debug, Clone, Copy, Default)]
struct ButtonState {
    held: bool,
    down_gump: Option<ObjId>,
    down_at: (i32, i32),
    pending: Option<PendingClick>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DragState {
    #[default]
    None,
    /// Left button held; a drag starts once the pointer moves far enough.
    Pending,
    Dragging(ObjId),
}

/// Mouse router state.
#[derive(Debug, Clone, Default)]
pub struct Mouse {
    position: (i32, i32),
    buttons: [ButtonState; 3],
    mouse_over: Option<ObjId>,
    drag: DragState,
    drag_offset: (i32, i32),
    cursors: Vec<MouseCursor>,
}

impl Mouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn position(&self) -> (i32, i32) {
        self.position
    }

    pub fn mouse_over(&self) -> Option<ObjId> {
        self.mouse_over
    }

    pub fn dragged_gump(&self) -> Option<ObjId> {
        match self.drag {
            DragState::Dragging(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragged_gump().is_some()
    }

    /// Grab point of the dragged gump relative to its position.
    pub fn dragging_offset(&self) -> (i32, i32) {
        self.drag_offset
    }

    pub fn set_dragging_offset(&mut self, dx: i32, dy: i32) {
        self.drag_offset = (dx, dy);
    }

    pub fn push_cursor(&mut self, cursor: MouseCursor) {
        self.cursors.push(cursor);
    }

    pub fn pop_cursor(&mut self) {
        if self.cursors.pop().is_none() {
            log::warn!("mouse cursor stack underflow");
        }
    }

    pub fn cursor(&self) -> MouseCursor {
        self.cursors.last().copied().unwrap_or_default()
    }
}

impl GameContext {
    /// Parent-space position of a screen point for `id`.
    fn to_parent_space(&self, id: ObjId, sx: i32, sy: i32) -> (i32, i32) {
        match self.objects.gump(id).and_then(|g| g.parent) {
            Some(parent) => self.objects.screen_space_to_gump(parent, sx, sy, TL),
            None => (sx, sy),
        }
    }

    pub fn mouse_down(&mut self, button: MouseButton, sx: i32, sy: i32) -> Option<ObjId> {
        self.mouse.position = (sx, sy);
        let desktop = self.core.desktop;
        let handler = self.on_mouse_down(desktop, button, sx, sy);
        log::trace!("mouse down {button:?} at ({sx}, {sy}) taken by {handler:?}");

        let state = &mut self.mouse.buttons[button.index()];
        state.held = true;
        state.down_gump = handler;
        state.down_at = (sx, sy);
        if button == MouseButton::Left && self.mouse.drag == DragState::None {
            self.mouse.drag = DragState::Pending;
        }
        handler
    }

    /// Release of a button. A release on the gump that took the press within
    /// the double-click window of an earlier one is a double click;
    /// otherwise a single click is queued for `handle_delayed_events`.
    pub fn mouse_up(&mut self, button: MouseButton, sx: i32, sy: i32, now_ms: u64) {
        self.mouse.position = (sx, sy);
        let index = button.index();
        self.mouse.buttons[index].held = false;

        if button == MouseButton::Left {
            let drag = std::mem::take(&mut self.mouse.drag);
            if let DragState::Dragging(gump) = drag {
                if let Some(parent) = self.objects.gump(gump).and_then(|g| g.parent) {
                    self.stop_dragging_child(parent, gump);
                }
                self.mouse.buttons[index].down_gump = None;
                return;
            }
        }

        let Some(gump) = self.mouse.buttons[index].down_gump.take() else {
            return;
        };
        if !self.is_live_gump(gump) {
            return;
        }
        let (px, py) = self.to_parent_space(gump, sx, sy);
        self.on_mouse_up(gump, button, px, py);

        let window = u64::from(self.config.double_click_ms);
        match self.mouse.buttons[index].pending.take() {
            Some(pending) if pending.gump == gump && now_ms.saturating_sub(pending.at_ms) <= window => {
                if self.is_live_gump(gump) {
                    self.on_mouse_double(gump, button, px, py);
                }
            }
            earlier => {
                if let Some(earlier) = earlier {
                    self.fire_click(button, earlier);
                }
                self.mouse.buttons[index].pending = Some(PendingClick {
                    gump,
                    x: sx,
                    y: sy,
                    at_ms: now_ms,
                });
            }
        }
    }

    fn fire_click(&mut self, button: MouseButton, click: PendingClick) {
        if !self.is_live_gump(click.gump) {
            return;
        }
        let (px, py) = self.to_parent_space(click.gump, click.x, click.y);
        self.on_mouse_click(click.gump, button, px, py);
    }

    /// Fires single clicks whose double-click window has run out.
    pub fn handle_delayed_events(&mut self, now_ms: u64) {
        let window = u64::from(self.config.double_click_ms);
        for button in MouseButton::ALL {
            let state = &mut self.mouse.buttons[button.index()];
            let due = match state.pending {
                Some(pending) if !state.held && now_ms.saturating_sub(pending.at_ms) > window => {
                    state.pending.take()
                }
                _ => None,
            };
            if let Some(click) = due {
                self.fire_click(button, click);
            }
        }
    }

    pub fn mouse_motion(&mut self, sx: i32, sy: i32) {
        self.mouse.position = (sx, sy);
        self.update_drag(sx, sy);
        self.update_mouse_over(sx, sy);
    }

    fn update_drag(&mut self, sx: i32, sy: i32) {
        match self.mouse.drag {
            DragState::None => {}
            DragState::Pending => {
                let state = self.mouse.buttons[MouseButton::Left.index()];
                let (dx, dy) = (sx - state.down_at.0, sy - state.down_at.1);
                let threshold = self.config.drag_threshold;
                if state.held && (dx.abs() > threshold || dy.abs() > threshold) {
                    self.start_dragging(state.down_at);
                }
                if let DragState::Dragging(gump) = self.mouse.drag {
                    self.drag_to(gump, sx, sy);
                }
            }
            DragState::Dragging(gump) => self.drag_to(gump, sx, sy),
        }
    }

    fn start_dragging(&mut self, (sx, sy): (i32, i32)) {
        self.mouse.drag = DragState::None;
        let traced = self.trace_obj_id(self.core.desktop, sx, sy);
        let Some(gump) = self.objects.gump(traced) else {
            if traced != 0 {
                log::trace!("object {traced} under the pointer is not a draggable gump");
            }
            return;
        };
        if !gump.is_draggable() {
            return;
        }
        let Some(parent) = gump.parent else { return };
        let (px, py) = self
            .objects
            .screen_space_to_gump(parent, sx, sy, TL);
        if self.start_dragging_child(parent, traced, px, py) {
            self.mouse.drag = DragState::Dragging(traced);
            // The press turned into a drag, not a click.
            self.mouse.buttons[MouseButton::Left.index()].down_gump = None;
            log::debug!("dragging gump {traced}");
        }
    }

    fn drag_to(&mut self, gump: ObjId, sx: i32, sy: i32) {
        let parent = self
            .objects
            .gump(gump)
            .filter(|g| !g.is_closing())
            .and_then(|g| g.parent);
        let Some(parent) = parent else {
            self.mouse.drag = DragState::None;
            return;
        };
        let (px, py) = self
            .objects
            .screen_space_to_gump(parent, sx, sy, TL);
        self.dragging_child(parent, gump, px, py);
    }

    /// Sends `on_mouse_left` down the part of the old hover chain that is
    /// no longer under the pointer, then `on_mouse_over` down the new part.
    fn update_mouse_over(&mut self, sx: i32, sy: i32) {
        let Some(over) = self.on_mouse_motion(self.core.desktop, sx, sy) else {
            return;
        };
        if self.mouse.mouse_over == Some(over) {
            return;
        }
        let old_chain = self
            .mouse
            .mouse_over
            .map(|old| self.gump_chain(old))
            .unwrap_or_default();
        let new_chain = self.gump_chain(over);
        let shared = old_chain
            .iter()
            .zip(&new_chain)
            .take_while(|(a, b)| a == b)
            .count();
        for left in &old_chain[shared..] {
            self.on_mouse_left(*left);
        }
        for entered in &new_chain[shared..] {
            self.on_mouse_over(*entered);
        }
        self.mouse.mouse_over = Some(over);
    }

    pub fn key_down(&mut self, key: Key) -> bool {
        let handled = self.gump_key_down(self.core.desktop, key);
        log::trace!("key down {key:?} handled: {handled}");
        handled
    }

    pub fn key_up(&mut self, key: Key) -> bool {
        self.gump_key_up(self.core.desktop, key)
    }

    pub fn text_input(&mut self, text: &str) -> bool {
        self.gump_text_input(self.core.desktop, text)
    }
}
