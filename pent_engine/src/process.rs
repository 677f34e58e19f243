use std::collections::HashSet;

use bitflags::bitflags;
use pent_stream::{SaveReader, SaveWriter};

use crate::context::GameContext;
use crate::error::{LoadError, SaveError};
use crate::object_manager::ObjId;

/// Process handle. 0 never names a process.
pub type ProcId = u16;

bitflags! {
    pub struct ProcessFlags: u32 {
        const ACTIVE = 0x0001;
        const SUSPENDED = 0x0002;
        const TERMINATED = 0x0004;
        const TERM_DEFERRED = 0x0008;
        const FAILED = 0x0010;
        const RUNPAUSED = 0x0020;
    }
}

impl ProcessFlags {
    pub fn names(&self) -> Vec<&'static str> {
        let table = [
            (ProcessFlags::ACTIVE, "active"),
            (ProcessFlags::SUSPENDED, "suspended"),
            (ProcessFlags::TERMINATED, "terminated"),
            (ProcessFlags::TERM_DEFERRED, "term_deferred"),
            (ProcessFlags::FAILED, "failed"),
            (ProcessFlags::RUNPAUSED, "runpaused"),
        ];
        table
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

/// Behaviour of a scheduled process.
///
/// The kernel lends the logic out while one of these hooks runs, so a hook
/// sees the rest of the session through `ctx` and its own bookkeeping
/// (flags, result, waiters) through `ctx.kernel.process(pid)`.
pub trait ProcessLogic {
    fn class_name(&self) -> &'static str;

    fn run(&mut self, pid: ProcId, ctx: &mut GameContext);

    /// Called after the process was resumed by `wake_up`.
    fn on_wake_up(&mut self, _pid: ProcId, _ctx: &mut GameContext) {}

    /// Called once the process is terminated and its waiters were woken.
    fn on_terminate(&mut self, _pid: ProcId, _ctx: &mut GameContext) {}

    /// Called for every process restored from a savegame.
    fn after_load(&mut self, _pid: ProcId, _ctx: &mut GameContext) {}

    /// Processes returning false are skipped by the kernel when saving.
    fn persistent(&self) -> bool {
        true
    }

    fn save_data(&self, _writer: &mut SaveWriter) -> Result<(), SaveError> {
        Ok(())
    }
}

/// Restores the logic of one process class from its saved payload.
pub type ProcessLoader = fn(&mut SaveReader<'_>, u32) -> Result<Box<dyn ProcessLogic>, LoadError>;

pub struct Process {
    pub pid: ProcId,
    pub flags: ProcessFlags,
    pub item_num: ObjId,
    pub ty: u16,
    pub result: u32,
    /// Processes to wake when this one finishes, in registration order.
    pub waiting: Vec<ProcId>,
    class_name: &'static str,
    logic: Option<Box<dyn ProcessLogic>>,
    pending_wake_hook: bool,
    pending_terminate_hook: bool,
}

impl std::fmt::Debug for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Process")
            .field("pid", &self.pid)
            .field("class", &self.class_name)
            .field("flags", &self.flags)
            .field("item_num", &self.item_num)
            .field("ty", &self.ty)
            .field("result", &self.result)
            .field("waiting", &self.waiting)
            .finish()
    }
}

impl Process {
    pub fn new(logic: impl ProcessLogic + 'static) -> Self {
        Self::from_boxed(Box::new(logic))
    }

    pub fn from_boxed(logic: Box<dyn ProcessLogic>) -> Self {
        Process {
            pid: 0,
            flags: ProcessFlags::empty(),
            item_num: 0,
            ty: 0,
            result: 0,
            waiting: Vec::new(),
            class_name: logic.class_name(),
            logic: Some(logic),
            pending_wake_hook: false,
            pending_terminate_hook: false,
        }
    }

    pub fn with_item(mut self, item_num: ObjId) -> Self {
        self.item_num = item_num;
        self
    }

    pub fn with_type(mut self, ty: u16) -> Self {
        self.ty = ty;
        self
    }

    pub fn run_paused(mut self) -> Self {
        self.flags |= ProcessFlags::RUNPAUSED;
        self
    }

    pub fn class_name(&self) -> &'static str {
        self.class_name
    }

    pub fn is_terminated(&self) -> bool {
        self.flags.contains(ProcessFlags::TERMINATED)
    }

    pub fn is_suspended(&self) -> bool {
        self.flags.contains(ProcessFlags::SUSPENDED)
    }

    pub fn is_failed(&self) -> bool {
        self.flags.contains(ProcessFlags::FAILED)
    }

    pub fn is_persistent(&self) -> bool {
        self.logic.as_ref().map(|l| l.persistent()).unwrap_or(true)
    }

    pub(crate) fn take_logic(&mut self) -> Option<Box<dyn ProcessLogic>> {
        self.logic.take()
    }

    pub(crate) fn restore_logic(&mut self, logic: Box<dyn ProcessLogic>) {
        self.class_name = logic.class_name();
        self.logic = Some(logic);
    }

    pub(crate) fn logic(&self) -> Option<&dyn ProcessLogic> {
        self.logic.as_deref()
    }

    /// Writes the shared fields. Waiters outside `saved` are left out so a
    /// reused pid is never woken by a restored process.
    pub(crate) fn save_base(&self, writer: &mut SaveWriter, saved: &HashSet<ProcId>) {
        writer.write_u16(self.pid);
        writer.write_u32(self.flags.bits());
        writer.write_u16(self.item_num);
        writer.write_u16(self.ty);
        writer.write_u32(self.result);
        let waiting: Vec<ProcId> = self
            .waiting
            .iter()
            .copied()
            .filter(|pid| saved.contains(pid))
            .collect();
        writer.write_u32(waiting.len() as u32);
        for pid in waiting {
            writer.write_u16(pid);
        }
    }

    /// Reads the shared fields; the class logic is attached afterwards.
    pub(crate) fn load_base(reader: &mut SaveReader<'_>) -> Result<Self, LoadError> {
        let mut process = Process {
            pid: 0,
            flags: ProcessFlags::empty(),
            item_num: 0,
            ty: 0,
            result: 0,
            waiting: Vec::new(),
            class_name: "Process",
            logic: None,
            pending_wake_hook: false,
            pending_terminate_hook: false,
        };
        process.pid = reader.read_u16()?;
        let bits = reader.read_u32()?;
        process.flags = ProcessFlags::from_bits(bits).ok_or(LoadError::InvalidField {
            class: "Process",
            field: "flags",
            value: bits,
        })?;
        process.item_num = reader.read_u16()?;
        process.ty = reader.read_u16()?;
        process.result = reader.read_u32()?;
        let count = reader.read_u32()?;
        for _ in 0..count {
            process.waiting.push(reader.read_u16()?);
        }
        Ok(process)
    }
}

impl GameContext {
    /// Ends a process and wakes its waiters with its result.
    pub fn terminate_process(&mut self, pid: ProcId) {
        let Some(process) = self.kernel.process_mut(pid) else {
            return;
        };
        if process.is_terminated() {
            return;
        }
        process.flags |= ProcessFlags::TERMINATED;
        let waiting = std::mem::take(&mut process.waiting);
        let result = process.result;
        log::debug!(
            "process {pid} ({}) terminated with result {result}",
            process.class_name
        );

        for waiter in waiting {
            if self.kernel.process(waiter).is_some() {
                self.wake_up(waiter, result);
            }
        }
        self.call_terminate_hook(pid);
    }

    /// Ends a process abnormally. Every process waiting on it fails too.
    pub fn fail_process(&mut self, pid: ProcId) {
        let Some(process) = self.kernel.process_mut(pid) else {
            return;
        };
        if process.is_terminated() {
            return;
        }
        process.flags |= ProcessFlags::FAILED;
        let waiting = std::mem::take(&mut process.waiting);
        log::debug!("process {pid} ({}) failed", process.class_name);

        for waiter in waiting {
            let alive = self
                .kernel
                .process(waiter)
                .map(|p| !p.is_terminated())
                .unwrap_or(false);
            if alive {
                self.fail_process(waiter);
            }
        }
        self.terminate_process(pid);
    }

    /// Resumes a suspended process and schedules it right after the running one.
    pub fn wake_up(&mut self, pid: ProcId, result: u32) {
        let Some(process) = self.kernel.process_mut(pid) else {
            return;
        };
        process.result = result;
        process.flags.remove(ProcessFlags::SUSPENDED);
        self.kernel.set_next_process(pid);
        self.call_wake_hook(pid);
    }

    /// Suspends `pid` until `target` finishes. A target that is missing or
    /// already terminated leaves `pid` running. `target == 0` suspends until
    /// someone calls `wake_up` explicitly.
    pub fn wait_for(&mut self, pid: ProcId, target: ProcId) {
        assert_ne!(pid, target, "process {pid} cannot wait for itself");
        if target != 0 {
            let Some(other) = self.kernel.process_mut(target) else {
                log::debug!("process {pid} waits for missing process {target}");
                return;
            };
            if other.is_terminated() {
                return;
            }
            other.waiting.push(pid);
        }
        self.suspend_process(pid);
    }

    pub fn suspend_process(&mut self, pid: ProcId) {
        if let Some(process) = self.kernel.process_mut(pid) {
            process.flags |= ProcessFlags::SUSPENDED;
        }
    }

    /// Requests termination on the next scheduling pass.
    pub fn terminate_deferred(&mut self, pid: ProcId) {
        if let Some(process) = self.kernel.process_mut(pid) {
            process.flags |= ProcessFlags::TERM_DEFERRED;
        }
    }

    /// Terminates (or fails) every live process bound to an item. `item == 0`
    /// matches any item; processes without an item are never touched.
    pub fn kill_processes(&mut self, item: ObjId, ty: Option<u16>, fail: bool) -> usize {
        let victims: Vec<ProcId> = self
            .kernel
            .processes()
            .filter(|p| p.item_num != 0)
            .filter(|p| item == 0 || p.item_num == item)
            .filter(|p| ty.map(|t| t == p.ty).unwrap_or(true))
            .filter(|p| {
                !p.flags
                    .intersects(ProcessFlags::TERMINATED | ProcessFlags::TERM_DEFERRED)
            })
            .map(|p| p.pid)
            .collect();
        for pid in &victims {
            if fail {
                self.fail_process(*pid);
            } else {
                self.terminate_process(*pid);
            }
        }
        victims.len()
    }

    pub(crate) fn run_process(&mut self, pid: ProcId) {
        let Some(mut logic) = self.kernel.process_mut(pid).and_then(Process::take_logic) else {
            return;
        };
        logic.run(pid, self);
        self.return_logic(pid, logic);
        self.flush_pending_hooks(pid);
    }

    fn return_logic(&mut self, pid: ProcId, logic: Box<dyn ProcessLogic>) {
        match self.kernel.process_mut(pid) {
            Some(process) => process.restore_logic(logic),
            None => log::debug!("process {pid} vanished while its logic was running"),
        }
    }

    fn flush_pending_hooks(&mut self, pid: ProcId) {
        let Some(process) = self.kernel.process_mut(pid) else {
            return;
        };
        let wake = std::mem::take(&mut process.pending_wake_hook);
        let terminate = std::mem::take(&mut process.pending_terminate_hook);
        if wake {
            self.call_wake_hook(pid);
        }
        if terminate {
            self.call_terminate_hook(pid);
        }
    }

    fn call_wake_hook(&mut self, pid: ProcId) {
        let Some(process) = self.kernel.process_mut(pid) else {
            return;
        };
        match process.take_logic() {
            Some(mut logic) => {
                logic.on_wake_up(pid, self);
                self.return_logic(pid, logic);
            }
            None => process.pending_wake_hook = true,
        }
    }

    fn call_terminate_hook(&mut self, pid: ProcId) {
        let Some(process) = self.kernel.process_mut(pid) else {
            return;
        };
        match process.take_logic() {
            Some(mut logic) => {
                logic.on_terminate(pid, self);
                self.return_logic(pid, logic);
            }
            None => process.pending_terminate_hook = true,
        }
    }

    pub(crate) fn call_after_load_hook(&mut self, pid: ProcId) {
        let Some(mut logic) = self.kernel.process_mut(pid).and_then(Process::take_logic) else {
            return;
        };
        logic.after_load(pid, self);
        self.return_logic(pid, logic);
    }
}
