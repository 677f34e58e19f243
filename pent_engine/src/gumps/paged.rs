use crate::context::GameContext;
use crate::gump::{
    ChildMessage, Gump, GumpFlags, GumpKind, Position, LAYER_ABOVE_NORMAL, LAYER_MODAL,
};
use crate::gumps::{ButtonWidget, ModalGump};
use crate::input::{Key, MouseCursor};
use crate::object_manager::ObjId;
use crate::shapes::{ShapeRef, GUMP_SHAPES};

pub const PAGE_PREV_SHAPE: ShapeRef = ShapeRef::new(GUMP_SHAPES, 31);
pub const PAGE_NEXT_SHAPE: ShapeRef = ShapeRef::new(GUMP_SHAPES, 32);

const DEFAULT_WIDTH: i32 = 240;
const DEFAULT_HEIGHT: i32 = 160;

/// Modal book of pages with previous/next buttons; one page is visible at
/// a time and the buttons never wrap around.
#[derive(Debug, Clone)]
pub struct PagedGump {
    pub modal: ModalGump,
    pub left_off: i32,
    pub right_off: i32,
    pub top_off: i32,
    pub pages: Vec<ObjId>,
    pub current: usize,
    pub next_button: ObjId,
    pub prev_button: ObjId,
    pub buttons_enabled: bool,
}

impl PagedGump {
    /// Without a background shape the book keeps a default size.
    pub fn gump(left_off: i32, right_off: i32, top_off: i32, shape: Option<ShapeRef>) -> Gump {
        let mut gump = Gump::new(
            0,
            0,
            DEFAULT_WIDTH,
            DEFAULT_HEIGHT,
            0,
            GumpFlags::DONT_SAVE,
            LAYER_MODAL,
        )
        .with_kind(GumpKind::Paged(PagedGump {
            modal: ModalGump::default(),
            left_off,
            right_off,
            top_off,
            pages: Vec::new(),
            current: 0,
            next_button: 0,
            prev_button: 0,
            buttons_enabled: true,
        }));
        if let Some(shape) = shape {
            gump = gump.with_shape(shape, 0);
        }
        gump
    }
}

impl GameContext {
    fn paged(&self, id: ObjId) -> Option<&PagedGump> {
        match &self.objects.gump(id)?.kind {
            GumpKind::Paged(paged) => Some(paged),
            _ => None,
        }
    }

    fn paged_mut(&mut self, id: ObjId) -> Option<&mut PagedGump> {
        match &mut self.objects.gump_mut(id)?.kind {
            GumpKind::Paged(paged) => Some(paged),
            _ => None,
        }
    }

    pub(crate) fn init_paged(&mut self, id: ObjId) {
        self.update_dims_from_shape(id);
        let Some(paged) = self.paged(id) else { return };
        let (left, right, top) = (paged.left_off, paged.right_off, paged.top_off);

        let next = ButtonWidget::gump(
            0,
            0,
            Some((PAGE_NEXT_SHAPE, 0)),
            Some((PAGE_NEXT_SHAPE, 0)),
            false,
            LAYER_ABOVE_NORMAL,
        );
        let next = self.init_gump(next, Some(id), false);
        self.objects
            .set_relative_position(next, Position::TopRight, right, top);
        self.objects.gump_at_mut(next).hide();

        let prev = ButtonWidget::gump(
            0,
            0,
            Some((PAGE_PREV_SHAPE, 0)),
            Some((PAGE_PREV_SHAPE, 0)),
            false,
            LAYER_ABOVE_NORMAL,
        );
        let prev = self.init_gump(prev, Some(id), false);
        self.objects
            .set_relative_position(prev, Position::TopLeft, left, top);
        self.objects.gump_at_mut(prev).hide();

        if let Some(paged) = self.paged_mut(id) {
            paged.next_button = next;
            paged.prev_button = prev;
        }
        self.mouse.push_cursor(MouseCursor::Hand);
    }

    /// Appends a page and turns to it. The page is attached to the book if
    /// it is not a child already.
    pub fn add_page(&mut self, id: ObjId, page: ObjId) {
        let Some(paged) = self.paged(id) else {
            return;
        };
        let top = paged.top_off;
        let previous = paged.pages.get(paged.current).copied();
        let (next, prev) = (paged.next_button, paged.prev_button);

        if self.objects.gump(page).and_then(|g| g.parent) != Some(id) {
            self.objects.add_child(id, page, false);
        }
        self.objects
            .set_relative_position(page, Position::TopCenter, 0, 3 + top);
        if let Some(previous) = previous {
            self.objects.gump_at_mut(previous).hide();
        }

        let Some(paged) = self.paged_mut(id) else { return };
        paged.pages.push(page);
        paged.current = paged.pages.len() - 1;
        let current = paged.current;

        self.objects.gump_at_mut(page).unhide();
        if self.objects.gump_at(id).focus_child != Some(page) {
            self.objects.make_focus(page);
        }
        self.objects.gump_at_mut(next).hide();
        if current > 0 {
            self.objects.gump_at_mut(prev).unhide();
        }
    }

    /// Currently shown page, if any.
    pub fn current_page(&self, id: ObjId) -> Option<ObjId> {
        let paged = self.paged(id)?;
        paged.pages.get(paged.current).copied()
    }

    fn turn_page(&mut self, id: ObjId, forward: bool) {
        let Some(paged) = self.paged(id) else { return };
        let count = paged.pages.len();
        let from = paged.current;
        let to = match forward {
            true if from + 1 < count => from + 1,
            false if from > 0 => from - 1,
            _ => return,
        };
        let (old_page, new_page) = (paged.pages[from], paged.pages[to]);
        let (next, prev) = (paged.next_button, paged.prev_button);

        if let Some(paged) = self.paged_mut(id) {
            paged.current = to;
        }
        self.objects.gump_at_mut(old_page).hide();
        self.objects.gump_at_mut(new_page).unhide();
        self.objects.make_focus(new_page);

        if to + 1 == count {
            self.objects.gump_at_mut(next).hide();
        } else {
            self.objects.gump_at_mut(next).unhide();
        }
        if to == 0 {
            self.objects.gump_at_mut(prev).hide();
        } else {
            self.objects.gump_at_mut(prev).unhide();
        }
        log::trace!("paged gump {id} turned to page {to}");
    }

    pub(crate) fn paged_child_notify(&mut self, id: ObjId, child: ObjId, message: ChildMessage) {
        let Some(paged) = self.paged(id) else { return };
        if !paged.buttons_enabled || paged.pages.is_empty() || message != ChildMessage::ButtonClick {
            return;
        }
        let (next, prev) = (paged.next_button, paged.prev_button);
        if child == next {
            self.turn_page(id, true);
        } else if child == prev {
            self.turn_page(id, false);
        }
    }

    /// The current page sees keys first; Escape closes the book. Every key
    /// counts as handled.
    pub(crate) fn paged_key_down(&mut self, id: ObjId, key: Key) -> bool {
        if let Some(page) = self.current_page(id) {
            if self.gump_key_down(page, key) {
                return true;
            }
        }
        if key == Key::Escape {
            self.close_gump(id, false);
        }
        true
    }

    pub(crate) fn close_paged(&mut self, id: ObjId) {
        let pages = self.paged(id).map(|p| p.pages.clone()).unwrap_or_default();
        for page in pages {
            self.close_gump(page, false);
        }
        self.mouse.pop_cursor();
    }
}
