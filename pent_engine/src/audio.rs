/// Narrow view of the audio system consumed by modal gumps.
pub trait AudioControl {
    fn pause_all_samples(&mut self);
    fn unpause_all_samples(&mut self);
    fn is_paused(&self) -> bool;
}

/// Sample mixer stand-in that only tracks nested pause requests.
#[derive(Debug, Default, Clone)]
pub struct SampleMixer {
    pause_depth: u32,
}

impl SampleMixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause_depth(&self) -> u32 {
        self.pause_depth
    }
}

impl AudioControl for SampleMixer {
    fn pause_all_samples(&mut self) {
        self.pause_depth += 1;
        log::trace!("samples paused (depth {})", self.pause_depth);
    }

    fn unpause_all_samples(&mut self) {
        self.pause_depth = self.pause_depth.saturating_sub(1);
        log::trace!("samples unpaused (depth {})", self.pause_depth);
    }

    fn is_paused(&self) -> bool {
        self.pause_depth > 0
    }
}
