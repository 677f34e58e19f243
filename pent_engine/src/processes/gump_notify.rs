use pent_stream::{SaveReader, SaveWriter};

use crate::context::GameContext;
use crate::error::{LoadError, SaveError};
use crate::object_manager::ObjId;
use crate::process::{ProcId, ProcessLogic};

/// Stands for an open gump in the process table. It terminates with the
/// gump's process result when the gump closes, so other processes can wait
/// on a dialog. Terminating it from outside closes the gump.
#[derive(Debug, Clone)]
pub struct GumpNotifyProcess {
    gump: ObjId,
}

impl GumpNotifyProcess {
    pub const PROCESS_TYPE: u16 = 0x200;

    pub fn new(gump: ObjId) -> Self {
        GumpNotifyProcess { gump }
    }

    pub fn gump(&self) -> ObjId {
        self.gump
    }

    /// Called by a closing gump: hands its result to the waiters.
    pub fn notify_closing(ctx: &mut GameContext, pid: ProcId, result: u32) {
        let Some(process) = ctx.kernel.process_mut(pid) else {
            return;
        };
        if process.is_terminated() {
            return;
        }
        process.result = result;
        ctx.terminate_process(pid);
    }
}

impl ProcessLogic for GumpNotifyProcess {
    fn class_name(&self) -> &'static str {
        "GumpNotifyProcess"
    }

    fn run(&mut self, pid: ProcId, ctx: &mut GameContext) {
        if ctx.objects.gump(self.gump).is_none() {
            log::debug!("notifier {pid} outlived gump {}", self.gump);
            ctx.terminate_process(pid);
        }
    }

    fn on_terminate(&mut self, pid: ProcId, ctx: &mut GameContext) {
        let still_bound = ctx
            .objects
            .gump(self.gump)
            .map(|g| g.notifier == pid)
            .unwrap_or(false);
        if still_bound {
            ctx.close_gump(self.gump, false);
        }
    }

    fn save_data(&self, writer: &mut SaveWriter) -> Result<(), SaveError> {
        writer.write_u16(self.gump);
        Ok(())
    }
}

pub(super) fn load(reader: &mut SaveReader<'_>, _version: u32) -> Result<Box<dyn ProcessLogic>, LoadError> {
    Ok(Box::new(GumpNotifyProcess::new(reader.read_u16()?)))
}
