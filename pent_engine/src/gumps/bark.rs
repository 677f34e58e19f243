use crate::context::GameContext;
use crate::geometry::PointRoundDir;
use crate::gump::{Gump, GumpFlags, GumpKind, LAYER_ABOVE_NORMAL};
use crate::gumps::ItemRelativeGump;
use crate::object_manager::ObjId;
use crate::render::RenderSurface;

const CHAR_WIDTH: i32 = 8;
const LINE_HEIGHT: i32 = 12;
const MAX_WIDTH: i32 = 200;

/// Speech bubble over an item. Closes itself once `counter` runs out or
/// when clicked.
#[derive(Debug, Clone)]
pub struct BarkGump {
    pub rel: ItemRelativeGump,
    pub text: String,
    /// Remaining unpaused ticks; 0 before the gump is initialised.
    pub counter: u32,
}

impl BarkGump {
    pub fn gump(owner: ObjId, text: impl Into<String>) -> Gump {
        let text = text.into();
        let width = (text.chars().count() as i32 * CHAR_WIDTH).clamp(CHAR_WIDTH, MAX_WIDTH);
        Gump::new(
            0,
            0,
            width,
            LINE_HEIGHT,
            owner,
            GumpFlags::KEEP_VISIBLE,
            LAYER_ABOVE_NORMAL,
        )
        .with_kind(GumpKind::Bark(BarkGump {
            rel: ItemRelativeGump::default(),
            text,
            counter: 0,
        }))
    }
}

impl GameContext {
    /// Opens a speech bubble over an item without taking focus.
    pub fn bark(&mut self, item: ObjId, text: &str) -> ObjId {
        self.init_gump(BarkGump::gump(item, text), None, false)
    }

    pub(crate) fn init_bark(&mut self, id: ObjId) {
        let per_char = self.config.bark_ticks_per_char;
        if let Some(GumpKind::Bark(bark)) = self.objects.gump_mut(id).map(|g| &mut g.kind) {
            if bark.counter == 0 {
                let chars = bark.text.chars().count() as u32;
                bark.counter = (chars * per_char).max(1);
            }
        }
    }

    pub(crate) fn run_bark(&mut self, id: ObjId) {
        if self.kernel.is_paused() {
            return;
        }
        let expired = match self.objects.gump_mut(id).map(|g| &mut g.kind) {
            Some(GumpKind::Bark(bark)) => {
                bark.counter = bark.counter.saturating_sub(1);
                bark.counter == 0
            }
            _ => false,
        };
        if expired {
            log::debug!("bark {id} timed out");
            self.close_gump(id, false);
        }
    }

    /// Text goes through the unscaled pass so it stays crisp over the
    /// scaled game view.
    pub(crate) fn paint_bark_text(&self, id: ObjId, surf: &mut dyn RenderSurface) {
        let gump = self.objects.gump_at(id);
        let GumpKind::Bark(bark) = &gump.kind else {
            return;
        };
        let (sx, sy) =
            self.objects
                .gump_to_screen_space(id, gump.dims.x, gump.dims.y, PointRoundDir::TopLeft);
        surf.paint_text(&bark.text, sx, sy);
    }
}
