//! Concrete processes run by the kernel.

mod delay;
mod fade_to_modal;
mod gump_notify;
mod palette_fader;

pub use delay::DelayProcess;
pub use fade_to_modal::{FadeState, FadeToModalProcess};
pub use gump_notify::GumpNotifyProcess;
pub use palette_fader::PaletteFaderProcess;

use crate::kernel::Kernel;

/// Loaders for every process class that can appear in a save.
pub(crate) fn register_loaders(kernel: &mut Kernel) {
    kernel.add_process_loader("DelayProcess", delay::load);
    kernel.add_process_loader("GumpNotifyProcess", gump_notify::load);
    kernel.add_process_loader("PaletteFaderProcess", palette_fader::load);
}
