use crate::context::GameContext;
use crate::geometry::PointRoundDir;
use crate::gump::{Gump, GumpFlags, GumpKind, LAYER_MODAL};
use crate::gumps::ModalGump;
use crate::input::MouseCursor;
use crate::object_manager::ObjId;
use crate::process::ProcId;

/// Modal targeting cursor. The next mouse release picks the item under the
/// pointer; its id becomes the process result (0 for nothing).
#[derive(Debug, Clone, Default)]
pub struct TargetGump {
    pub modal: ModalGump,
    /// Set while tracing through the desktop so this gump does not catch
    /// its own trace.
    pub tracing: bool,
}

impl TargetGump {
    pub fn gump() -> Gump {
        Gump::new(0, 0, 0, 0, 0, GumpFlags::DONT_SAVE, LAYER_MODAL)
            .with_kind(GumpKind::Target(TargetGump::default()))
    }
}

impl GameContext {
    /// Opens a targeting cursor and returns the notifier a process can wait
    /// on for the picked item.
    pub fn open_target(&mut self) -> ProcId {
        let id = self.init_gump(TargetGump::gump(), None, true);
        self.objects.gump(id).map(|g| g.notifier).unwrap_or(0)
    }

    pub(crate) fn init_target(&mut self, id: ObjId) {
        if self.objects.gump_at(id).notifier == 0 {
            self.create_notifier(id);
        }
        self.mouse.push_cursor(MouseCursor::Target);
    }

    fn set_tracing(&mut self, id: ObjId, tracing: bool) {
        if let Some(GumpKind::Target(target)) = self.objects.gump_mut(id).map(|g| &mut g.kind) {
            target.tracing = tracing;
        }
    }

    pub(crate) fn target_mouse_up(&mut self, id: ObjId, mx: i32, my: i32) {
        let parent = self.objects.gump_at(id).parent;
        let (sx, sy) = match parent {
            Some(parent) => {
                self.objects
                    .gump_to_screen_space(parent, mx, my, PointRoundDir::TopLeft)
            }
            None => (mx, my),
        };

        self.set_tracing(id, true);
        let traced = self.trace_obj_id(self.core.desktop, sx, sy);
        self.set_tracing(id, false);

        if self.objects.item(traced).is_some() {
            self.objects.gump_at_mut(id).process_result = u32::from(traced);
            log::debug!("target gump {id} picked item {traced}");
        }
        self.close_gump(id, false);
    }

    pub(crate) fn close_target(&mut self) {
        self.mouse.pop_cursor();
    }
}
