use pent_stream::{SaveReader, SaveWriter};

use crate::context::GameContext;
use crate::error::{LoadError, SaveError};
use crate::process::{ProcId, ProcessLogic};

/// Terminates after running a fixed number of ticks. Other processes wait
/// on it to sleep.
#[derive(Debug, Clone)]
pub struct DelayProcess {
    count: u32,
}

impl DelayProcess {
    pub fn new(ticks: u32) -> Self {
        DelayProcess { count: ticks }
    }

    pub fn remaining(&self) -> u32 {
        self.count
    }
}

impl ProcessLogic for DelayProcess {
    fn class_name(&self) -> &'static str {
        "DelayProcess"
    }

    fn run(&mut self, pid: ProcId, ctx: &mut GameContext) {
        self.count = self.count.saturating_sub(1);
        if self.count == 0 {
            ctx.terminate_process(pid);
        }
    }

    fn save_data(&self, writer: &mut SaveWriter) -> Result<(), SaveError> {
        writer.write_u32(self.count);
        Ok(())
    }
}

pub(super) fn load(reader: &mut SaveReader<'_>, _version: u32) -> Result<Box<dyn ProcessLogic>, LoadError> {
    Ok(Box::new(DelayProcess::new(reader.read_u32()?)))
}
