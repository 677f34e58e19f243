use crate::context::GameContext;
use crate::geometry::Rect;
use crate::gump::{Gump, GumpFlags, GumpKind, LAYER_DESKTOP};
use crate::object_manager::ObjId;
use crate::render::RenderSurface;

/// Colour and alpha of the scrim painted behind open modals.
const MODAL_SCRIM: u32 = 0x7F00_0000;

/// Root of the scene graph, sized to the screen.
#[derive(Debug, Clone)]
pub struct DesktopGump {
    pub faded_modal: bool,
}

impl DesktopGump {
    pub fn gump(width: i32, height: i32, faded_modal: bool) -> Gump {
        Gump::new(
            0,
            0,
            width,
            height,
            0,
            GumpFlags::DONT_SAVE | GumpFlags::CORE_GUMP,
            LAYER_DESKTOP,
        )
        .with_kind(GumpKind::Desktop(DesktopGump { faded_modal }))
    }
}

impl GameContext {
    /// Children in paint order, each visible modal (except targeting
    /// cursors) getting a translucent scrim over everything below it.
    pub(crate) fn paint_desktop_children(
        &mut self,
        id: ObjId,
        surf: &mut dyn RenderSurface,
        scaled: bool,
    ) {
        let desktop = self.objects.gump_at(id);
        let faded = matches!(&desktop.kind, GumpKind::Desktop(d) if d.faded_modal);
        let area = Rect::new(0, 0, desktop.dims.w, desktop.dims.h);
        for child in desktop.children.clone() {
            let Some(gump) = self.objects.gump(child) else {
                continue;
            };
            if gump.is_closing() {
                continue;
            }
            let scrim = faded
                && gump.kind.is_modal()
                && !matches!(gump.kind, GumpKind::Target(_))
                && !self.objects.is_hidden(child);
            if scrim {
                surf.fill_blended(MODAL_SCRIM, area);
            }
            self.paint_gump(child, surf, scaled);
        }
    }

    /// Follows a resize of the output surface: the desktop takes the new
    /// size, the scaler stretches to it and gumps marked KEEP_VISIBLE are
    /// pulled back on screen.
    pub fn render_surface_changed(&mut self, width: i32, height: i32) {
        let desktop = self.core.desktop;
        let Some(gump) = self.objects.gump_mut(desktop) else {
            return;
        };
        gump.dims.w = width;
        gump.dims.h = height;
        self.config.screen_width = width;
        self.config.screen_height = height;

        if let Some(GumpKind::Scaler(scaler)) =
            self.objects.gump_mut(self.core.scaler).map(|g| &mut g.kind)
        {
            scaler.width = width;
            scaler.height = height;
        }

        let mut keep: Vec<ObjId> = Vec::new();
        for parent in [desktop, self.core.scaler] {
            if let Some(gump) = self.objects.gump(parent) {
                keep.extend(gump.children.iter().copied().filter(|c| {
                    self.objects
                        .gump(*c)
                        .map(|g| g.flags.contains(GumpFlags::KEEP_VISIBLE))
                        .unwrap_or(false)
                }));
            }
        }
        for id in keep {
            self.objects.move_on_screen(id);
        }
        log::info!("render surface changed to {width}x{height}");
    }
}
