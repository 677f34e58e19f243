//! Whole-session save and load.
//!
//! A savegame holds three sections: the kernel's processes, the object
//! registry, and a small block of session info. Loading replaces the
//! running session; a load that fails part way leaves an empty session
//! with fresh core gumps behind.

use pent_stream::{SaveReader, SaveWriter, Savegame, SavegameWriter};
use serde::Serialize;

use crate::context::GameContext;
use crate::error::{LoadError, SaveError};
use crate::object_manager::{LoadEnv, ObjId};
use crate::world::Camera;

pub const SECTION_KERNEL: &str = "KERNEL";
pub const SECTION_OBJECTS: &str = "OBJECTS";
pub const SECTION_INFO: &str = "INFO";

/// Summary of a loaded savegame.
#[derive(Debug, Clone, Serialize)]
pub struct SaveInfo {
    pub description: String,
    pub version: u32,
    pub frame_num: u32,
    pub camera: Camera,
    pub processes: usize,
    /// Gumps that came back without a parent and were reattached.
    pub gumps: Vec<ObjId>,
}

impl GameContext {
    /// Serializes the session. Refused while a modal gump is open unless
    /// `ignore_modals` is set.
    pub fn save_game(&self, description: &str, ignore_modals: bool) -> Result<Vec<u8>, SaveError> {
        if !ignore_modals && self.is_modal_open() {
            return Err(SaveError::ModalOpen);
        }

        let mut kernel = SaveWriter::new();
        self.kernel.save(&mut kernel)?;
        let mut objects = SaveWriter::new();
        self.objects.save(&mut objects)?;
        let mut info = SaveWriter::new();
        info.write_i32(self.camera.x);
        info.write_i32(self.camera.y);
        info.write_i32(self.camera.z);

        let mut file = SavegameWriter::new(description);
        file.write_section(SECTION_KERNEL, kernel.into_bytes());
        file.write_section(SECTION_OBJECTS, objects.into_bytes());
        file.write_section(SECTION_INFO, info.into_bytes());
        let bytes = file.finish()?;
        log::info!("saved game \"{description}\" ({} bytes)", bytes.len());
        Ok(bytes)
    }

    /// Replaces the session with a savegame's contents.
    pub fn load_game(&mut self, bytes: &[u8]) -> Result<SaveInfo, LoadError> {
        let save = Savegame::parse(bytes)?;
        let mut kernel = save.section(SECTION_KERNEL)?;
        let mut objects = save.section(SECTION_OBJECTS)?;
        let mut info = save.section(SECTION_INFO)?;

        self.reset_engine();
        self.setup_core_gumps();
        match self.restore(save.version(), &mut kernel, &mut objects, &mut info) {
            Ok((processes, gumps)) => {
                log::info!(
                    "loaded game \"{}\": {processes} processes, {} objects",
                    save.description(),
                    self.objects.object_count()
                );
                Ok(SaveInfo {
                    description: save.description().to_string(),
                    version: save.version(),
                    frame_num: self.kernel.frame_num(),
                    camera: self.camera,
                    processes,
                    gumps,
                })
            }
            Err(err) => {
                log::warn!("load of \"{}\" failed: {err}", save.description());
                self.reset_engine();
                self.setup_core_gumps();
                Err(err)
            }
        }
    }

    fn restore(
        &mut self,
        version: u32,
        kernel: &mut SaveReader<'_>,
        objects: &mut SaveReader<'_>,
        info: &mut SaveReader<'_>,
    ) -> Result<(usize, Vec<ObjId>), LoadError> {
        let pids = self.kernel.load(kernel, version)?;

        let env = LoadEnv {
            version,
            shapes: self.shapes.as_ref(),
        };
        // Core gumps stay in place; the restored pool still marks their ids.
        let top_level = self.objects.load(objects, &env)?;

        self.camera = Camera::new(info.read_i32()?, info.read_i32()?, info.read_i32()?);

        for id in &top_level {
            self.add_gump(*id, false);
        }
        for pid in &pids {
            self.call_after_load_hook(*pid);
        }
        Ok((pids.len(), top_level))
    }
}
