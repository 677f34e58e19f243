use crate::context::GameContext;
use crate::gump::{Gump, Position};
use crate::palette::ColorMatrix;
use crate::process::{ProcId, Process, ProcessLogic};
use crate::processes::PaletteFaderProcess;

const FADE_FRAMES: i32 = 30;
const FADE_PRIORITY: i32 = 0x7FFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeState {
    OpenFadeOut,
    ShowGump,
    CloseFadeIn,
    Finished,
}

/// Fades to black, shows a modal gump, and fades back in once it closes.
/// Terminates with the modal's process result.
#[derive(Debug)]
pub struct FadeToModalProcess {
    state: FadeState,
    modal: Option<Gump>,
    fader: ProcId,
    modal_result: u32,
}

impl FadeToModalProcess {
    pub fn new(modal: Gump) -> Self {
        FadeToModalProcess {
            state: FadeState::OpenFadeOut,
            modal: Some(modal),
            fader: 0,
            modal_result: 0,
        }
    }

    pub fn state(&self) -> FadeState {
        self.state
    }

    fn wait_for_fader(&mut self, pid: ProcId, ctx: &mut GameContext) {
        if self.fader != 0 {
            ctx.wait_for(pid, self.fader);
        }
    }
}

impl ProcessLogic for FadeToModalProcess {
    fn class_name(&self) -> &'static str {
        "FadeToModalProcess"
    }

    fn run(&mut self, pid: ProcId, ctx: &mut GameContext) {
        match self.state {
            FadeState::OpenFadeOut => {
                let fader = PaletteFaderProcess::to_color(ctx, 0, FADE_PRIORITY, FADE_FRAMES);
                self.fader = ctx.add_palette_fader(fader, true);
                self.state = FadeState::ShowGump;
                self.wait_for_fader(pid, ctx);
            }
            FadeState::ShowGump => {
                let Some(modal) = self.modal.take() else {
                    ctx.terminate_process(pid);
                    return;
                };
                let id = ctx.init_gump(modal, None, true);
                ctx.objects.set_relative_position(id, Position::Center, 0, 0);
                let notifier = match ctx.objects.gump(id).map(|g| g.notifier) {
                    Some(0) => ctx.create_notifier(id),
                    Some(notifier) => notifier,
                    None => 0,
                };
                ctx.palette.untransform_palette();
                self.state = FadeState::CloseFadeIn;
                if notifier != 0 {
                    ctx.wait_for(pid, notifier);
                }
            }
            FadeState::CloseFadeIn => {
                self.state = FadeState::Finished;
                self.wait_for_fader(pid, ctx);
            }
            FadeState::Finished => {
                if let Some(process) = ctx.kernel.process_mut(pid) {
                    process.result = self.modal_result;
                }
                ctx.terminate_process(pid);
            }
        }
    }

    /// Woken by the modal's notifier: black out at once so the closing
    /// modal does not flash the unfaded scene, then fade back in.
    fn on_wake_up(&mut self, pid: ProcId, ctx: &mut GameContext) {
        if self.state != FadeState::CloseFadeIn {
            return;
        }
        self.modal_result = ctx.kernel.process(pid).map(|p| p.result).unwrap_or(0);
        let fader = PaletteFaderProcess::new(
            ColorMatrix::solid(0),
            ColorMatrix::identity(),
            FADE_PRIORITY,
            FADE_FRAMES,
        );
        self.fader = ctx.add_palette_fader(fader, true);
        if self.fader != 0 {
            ctx.run_process(self.fader);
        }
    }

    fn persistent(&self) -> bool {
        false
    }
}

impl GameContext {
    /// Shows `modal` behind a fade to black. Returns the pid to wait on
    /// for the modal's result.
    pub fn open_faded_modal(&mut self, modal: Gump) -> ProcId {
        let process = Process::new(FadeToModalProcess::new(modal)).run_paused();
        self.kernel.add_process(process)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gump::GumpKind;
    use crate::gumps::ModalGump;

    #[test]
    fn modal_opens_after_the_fade_and_result_comes_back() {
        let mut ctx = GameContext::headless();
        let pid = ctx.open_faded_modal(ModalGump::gump(0, 0, 100, 50));
        ctx.run_processes();
        assert!(!ctx.kernel.is_paused());
        for _ in 0..40 {
            ctx.run_processes();
        }
        let modal = ctx
            .objects
            .find_gump_by(ctx.core.desktop, &|g: &Gump| matches!(g.kind, GumpKind::Modal(_)))
            .expect("modal is open");
        assert!(ctx.kernel.is_paused());
        assert!(ctx.palette.transform().is_identity());
        let gump = ctx.objects.gump_at(modal);
        assert_eq!((gump.x, gump.y), (270, 175));

        ctx.objects.gump_at_mut(modal).process_result = 7;
        ctx.close_gump(modal, false);
        assert!(!ctx.kernel.is_paused());
        assert_eq!(ctx.palette.transform(), &ColorMatrix::solid(0));
        for _ in 0..40 {
            ctx.run_processes();
        }
        assert!(ctx.palette.transform().is_identity());
        assert!(ctx.kernel.process(pid).is_none());
    }
}
