//! The game session: every subsystem the gumps and processes reach into.

use crate::audio::{AudioControl, SampleMixer};
use crate::config::EngineConfig;
use crate::gump::GumpKind;
use crate::gumps::{game_map_gump, DesktopGump, ScalerGump};
use crate::input::Mouse;
use crate::kernel::Kernel;
use crate::object_manager::{ObjId, ObjectManager};
use crate::palette::PaletteManager;
use crate::render::RenderSurface;
use crate::shapes::{ShapeArchive, ShapeLibrary};
use crate::world::Camera;

/// Ids held back after the core gumps for engine-owned objects.
const RESERVED_IDS: std::ops::RangeInclusive<ObjId> = 259..=384;

/// Handles of the gumps that always exist while a game is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoreGumps {
    pub desktop: ObjId,
    pub scaler: ObjId,
    pub game_map: ObjId,
}

pub struct GameContext {
    pub objects: ObjectManager,
    pub kernel: Kernel,
    pub shapes: Box<dyn ShapeArchive>,
    pub audio: Box<dyn AudioControl>,
    pub palette: PaletteManager,
    pub config: EngineConfig,
    pub core: CoreGumps,
    pub mouse: Mouse,
    pub camera: Camera,
}

impl GameContext {
    /// Builds a session with its core gumps in place.
    pub fn new(
        config: EngineConfig,
        shapes: Box<dyn ShapeArchive>,
        audio: Box<dyn AudioControl>,
    ) -> Self {
        let mut ctx = GameContext {
            objects: ObjectManager::new(),
            kernel: Kernel::new(),
            shapes,
            audio,
            palette: PaletteManager::default(),
            config,
            core: CoreGumps::default(),
            mouse: Mouse::new(),
            camera: Camera::default(),
        };
        ctx.setup_core_gumps();
        ctx
    }

    /// Default config, no artwork and a counting mixer.
    pub fn headless() -> Self {
        GameContext::new(
            EngineConfig::default(),
            Box::new(ShapeLibrary::new()),
            Box::new(SampleMixer::new()),
        )
    }

    /// Creates the desktop, the scaler under it and the game map inside the
    /// scaler, then reserves the block of ids that follows them.
    pub fn setup_core_gumps(&mut self) {
        let config = self.config.clone();
        let desktop = self.init_gump(
            DesktopGump::gump(config.screen_width, config.screen_height, config.faded_modal),
            None,
            true,
        );
        self.core.desktop = desktop;

        let scaler = self.init_gump(
            ScalerGump::gump(
                0,
                0,
                config.screen_width,
                config.screen_height,
                config.scaled_width,
                config.scaled_height,
            ),
            None,
            true,
        );
        self.core.scaler = scaler;

        let game_map = self.init_gump(
            game_map_gump(config.scaled_width, config.scaled_height),
            None,
            true,
        );
        self.core.game_map = game_map;

        for id in RESERVED_IDS {
            self.objects.reserve_obj_id(id);
        }
        log::info!("core gumps ready: desktop {desktop}, scaler {scaler}, game map {game_map}");
    }

    /// Tears the session down: the gump tree first so held pauses are
    /// released, then every object and every process.
    pub fn reset_engine(&mut self) {
        let desktop = self.core.desktop;
        if self.objects.gump(desktop).is_some() {
            self.delete_gump(desktop);
        }
        self.mouse.reset();
        self.objects.reset();
        self.kernel.reset();
        self.palette = PaletteManager::default();
        self.core = CoreGumps::default();
        log::info!("engine reset");
    }

    /// One frame of game time: queued clicks, the kernel pass, then the
    /// gump tree.
    pub fn tick(&mut self, now_ms: u64) {
        self.handle_delayed_events(now_ms);
        self.run_processes();
        let desktop = self.core.desktop;
        self.run_gump(desktop);
    }

    pub fn paint(&mut self, surf: &mut dyn RenderSurface) {
        self.paint_frame(surf);
    }

    /// Topmost open modal, if any.
    pub fn open_modal(&self) -> Option<ObjId> {
        let desktop = self.objects.gump(self.core.desktop)?;
        desktop.children.iter().rev().copied().find(|child| {
            self.objects
                .gump(*child)
                .map(|g| g.kind.is_modal() && !g.is_closing())
                .unwrap_or(false)
        })
    }

    pub fn is_modal_open(&self) -> bool {
        self.open_modal().is_some()
    }

    pub fn game_map(&self) -> Option<ObjId> {
        self.objects
            .gump(self.core.game_map)
            .filter(|g| matches!(g.kind, GumpKind::GameMap))
            .map(|g| g.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gumps::ModalGump;
    use crate::object_manager::FIRST_OBJ_ID;

    #[test]
    fn core_gumps_take_the_first_ids() {
        let ctx = GameContext::headless();
        assert_eq!(ctx.core.desktop, FIRST_OBJ_ID);
        assert_eq!(ctx.core.scaler, FIRST_OBJ_ID + 1);
        assert_eq!(ctx.core.game_map, FIRST_OBJ_ID + 2);
        assert_eq!(ctx.objects.gump_at(ctx.core.scaler).parent, Some(ctx.core.desktop));
        assert_eq!(ctx.objects.gump_at(ctx.core.game_map).parent, Some(ctx.core.scaler));
        assert!(ctx.objects.is_id_used(300));
        assert!(!ctx.objects.is_id_used(385));
        assert_eq!(ctx.game_map(), Some(ctx.core.game_map));
    }

    #[test]
    fn reset_releases_pauses_held_by_modals() {
        let mut ctx = GameContext::headless();
        ctx.init_gump(ModalGump::gump(0, 0, 10, 10), None, true);
        assert!(ctx.kernel.is_paused());
        assert!(ctx.audio.is_paused());
        assert!(ctx.is_modal_open());

        ctx.reset_engine();
        assert!(!ctx.kernel.is_paused());
        assert!(!ctx.audio.is_paused());
        assert_eq!(ctx.objects.object_count(), 0);

        ctx.setup_core_gumps();
        assert_eq!(ctx.core.desktop, FIRST_OBJ_ID);
        assert!(!ctx.is_modal_open());
    }
}
