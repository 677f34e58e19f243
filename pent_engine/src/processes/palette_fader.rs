use pent_stream::{SaveReader, SaveWriter};

use crate::context::GameContext;
use crate::error::{LoadError, SaveError};
use crate::palette::ColorMatrix;
use crate::process::{ProcId, Process, ProcessLogic};

/// Blends the palette transform from one matrix to another over a number
/// of ticks. Only one fader drives the palette at a time.
#[derive(Debug, Clone)]
pub struct PaletteFaderProcess {
    priority: i32,
    counter: i32,
    max: i32,
    old: ColorMatrix,
    new: ColorMatrix,
}

impl PaletteFaderProcess {
    pub const PROCESS_TYPE: u16 = 0x23B;

    pub fn new(from: ColorMatrix, to: ColorMatrix, priority: i32, frames: i32) -> Self {
        let frames = frames.max(0);
        PaletteFaderProcess {
            priority,
            counter: frames,
            max: frames,
            old: from,
            new: to,
        }
    }

    /// From the current palette to solid `rgb`.
    pub fn to_color(ctx: &GameContext, rgb: u32, priority: i32, frames: i32) -> Self {
        Self::new(*ctx.palette.transform(), ColorMatrix::solid(rgb), priority, frames)
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }
}

impl ProcessLogic for PaletteFaderProcess {
    fn class_name(&self) -> &'static str {
        "PaletteFaderProcess"
    }

    fn run(&mut self, pid: ProcId, ctx: &mut GameContext) {
        let matrix = ColorMatrix::interpolate(&self.old, &self.new, self.counter, self.max);
        ctx.palette.transform_palette(matrix);
        if self.counter == 0 {
            ctx.terminate_process(pid);
        } else {
            self.counter -= 1;
        }
    }

    fn on_terminate(&mut self, pid: ProcId, ctx: &mut GameContext) {
        if ctx.palette.active_fader().map(|(active, _)| active) == Some(pid) {
            ctx.palette.set_active_fader(None);
        }
    }

    fn after_load(&mut self, pid: ProcId, ctx: &mut GameContext) {
        ctx.palette.set_active_fader(Some((pid, self.priority)));
    }

    fn save_data(&self, writer: &mut SaveWriter) -> Result<(), SaveError> {
        writer.write_i32(self.priority);
        writer.write_i32(self.counter);
        writer.write_i32(self.max);
        self.old.save(writer);
        self.new.save(writer);
        Ok(())
    }
}

pub(super) fn load(reader: &mut SaveReader<'_>, _version: u32) -> Result<Box<dyn ProcessLogic>, LoadError> {
    let priority = reader.read_i32()?;
    let counter = reader.read_i32()?;
    let max = reader.read_i32()?;
    if counter < 0 || counter > max {
        return Err(LoadError::InvalidField {
            class: "PaletteFaderProcess",
            field: "counter",
            value: counter as u32,
        });
    }
    Ok(Box::new(PaletteFaderProcess {
        priority,
        counter,
        max,
        old: ColorMatrix::load(reader)?,
        new: ColorMatrix::load(reader)?,
    }))
}

impl GameContext {
    /// Starts a fader unless a stronger one is active. An active fader of
    /// equal or lower priority is terminated first. Returns 0 when refused.
    pub fn add_palette_fader(&mut self, fader: PaletteFaderProcess, run_paused: bool) -> ProcId {
        if let Some((active, priority)) = self.palette.active_fader() {
            if priority > fader.priority {
                log::debug!("palette fader refused: {active} has priority {priority}");
                return 0;
            }
            self.terminate_process(active);
        }
        let priority = fader.priority;
        let mut process = Process::new(fader).with_type(PaletteFaderProcess::PROCESS_TYPE);
        if run_paused {
            process = process.run_paused();
        }
        let pid = self.kernel.add_process(process);
        if pid != 0 {
            self.palette.set_active_fader(Some((pid, priority)));
        }
        pid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_reaches_the_target_and_releases_the_palette() {
        let mut ctx = GameContext::headless();
        let fader = PaletteFaderProcess::to_color(&ctx, 0, 1, 2);
        let pid = ctx.add_palette_fader(fader, false);
        ctx.run_processes();
        assert_eq!(ctx.palette.transform(), &ColorMatrix::identity());
        ctx.run_processes();
        ctx.run_processes();
        assert_eq!(ctx.palette.transform(), &ColorMatrix::solid(0));
        assert!(ctx.kernel.process(pid).is_none());
        assert_eq!(ctx.palette.active_fader(), None);
    }

    #[test]
    fn weaker_fader_is_refused_and_stronger_one_preempts() {
        let mut ctx = GameContext::headless();
        let strong = ctx.add_palette_fader(PaletteFaderProcess::to_color(&ctx, 0, 5, 30), false);
        let weak = ctx.add_palette_fader(PaletteFaderProcess::to_color(&ctx, 0, 1, 30), false);
        assert_eq!(weak, 0);
        let stronger = ctx.add_palette_fader(PaletteFaderProcess::to_color(&ctx, 0, 9, 30), false);
        assert_ne!(stronger, 0);
        assert!(ctx.kernel.process(strong).map(Process::is_terminated).unwrap_or(false));
        assert_eq!(ctx.palette.active_fader(), Some((stronger, 9)));
    }
}
