use crate::context::GameContext;
use crate::gump::{Gump, GumpFlags, GumpKind, LAYER_MODAL};
use crate::object_manager::ObjId;

/// Shared state of every modal kind: whether this instance currently holds
/// one kernel pause and one audio pause.
#[derive(Debug, Clone, Default)]
pub struct ModalGump {
    pub pause_held: bool,
}

impl ModalGump {
    pub fn gump(x: i32, y: i32, w: i32, h: i32) -> Gump {
        Gump::new(x, y, w, h, 0, GumpFlags::DONT_SAVE, LAYER_MODAL)
            .with_kind(GumpKind::Modal(ModalGump::default()))
    }
}

impl GameContext {
    pub(crate) fn modal_pause(&mut self, id: ObjId) {
        let Some(modal) = self.objects.gump_mut(id).and_then(|g| g.kind.modal_mut()) else {
            return;
        };
        if modal.pause_held {
            return;
        }
        modal.pause_held = true;
        self.kernel.pause();
        self.audio.pause_all_samples();
        log::debug!("modal gump {id} paused the kernel");
    }

    pub(crate) fn modal_unpause(&mut self, id: ObjId) {
        let Some(modal) = self.objects.gump_mut(id).and_then(|g| g.kind.modal_mut()) else {
            return;
        };
        if !modal.pause_held {
            return;
        }
        modal.pause_held = false;
        self.kernel.unpause();
        self.audio.unpause_all_samples();
        log::debug!("modal gump {id} released its pause");
    }
}
