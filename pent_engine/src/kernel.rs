use std::collections::{BTreeMap, HashMap, HashSet};

use pent_stream::{SaveReader, SaveWriter};
use serde::Serialize;

use crate::context::GameContext;
use crate::error::{LoadError, SaveError};
use crate::idman::IdMan;
use crate::object_manager::ObjId;
use crate::process::{ProcId, Process, ProcessFlags, ProcessLoader};

pub const MAX_PROCESS_ID: u16 = 32766;

#[derive(Debug, Clone, Serialize)]
pub struct ProcessInfo {
    pub pid: ProcId,
    pub class: &'static str,
    pub item_num: ObjId,
    pub ty: u16,
    pub flags: Vec<&'static str>,
    pub result: u32,
    pub waiting: Vec<ProcId>,
}

/// Cooperative scheduler state: the process table, the run order, the pid
/// pool and the pause depth. Running processes needs the whole session, so
/// the pass itself lives on [`GameContext`].
pub struct Kernel {
    processes: HashMap<ProcId, Process>,
    run_list: Vec<ProcId>,
    current: Option<ProcId>,
    pids: IdMan,
    frame_num: u32,
    paused: u32,
    frame_by_frame: bool,
    loaders: BTreeMap<String, ProcessLoader>,
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel {
    pub fn new() -> Self {
        let mut kernel = Kernel {
            processes: HashMap::new(),
            run_list: Vec::new(),
            current: None,
            pids: IdMan::new(1, MAX_PROCESS_ID),
            frame_num: 0,
            paused: 0,
            frame_by_frame: false,
            loaders: BTreeMap::new(),
        };
        crate::processes::register_loaders(&mut kernel);
        kernel
    }

    /// Drops every process and clears the pid pool and pause state.
    pub fn reset(&mut self) {
        log::debug!("kernel reset ({} processes dropped)", self.processes.len());
        self.processes.clear();
        self.run_list.clear();
        self.current = None;
        self.pids.clear_all();
        self.paused = 0;
        self.frame_by_frame = false;
    }

    pub fn add_process_loader(&mut self, class_name: &str, loader: ProcessLoader) {
        self.loaders.insert(class_name.to_string(), loader);
    }

    /// Registers a process at the end of the run list. Returns 0 when the
    /// pid pool is exhausted.
    pub fn add_process(&mut self, mut process: Process) -> ProcId {
        let pid = self.pids.get_new_id();
        if pid == 0 {
            log::warn!("process pool exhausted; {} not started", process.class_name());
            return 0;
        }
        process.pid = pid;
        process.flags |= ProcessFlags::ACTIVE;
        log::debug!(
            "process {pid} ({}) added for item {}",
            process.class_name(),
            process.item_num
        );
        self.processes.insert(pid, process);
        self.run_list.push(pid);
        pid
    }

    pub fn process(&self, pid: ProcId) -> Option<&Process> {
        self.processes.get(&pid)
    }

    pub fn process_mut(&mut self, pid: ProcId) -> Option<&mut Process> {
        self.processes.get_mut(&pid)
    }

    /// Processes in run order.
    pub fn processes(&self) -> impl Iterator<Item = &Process> + '_ {
        self.run_list.iter().filter_map(|pid| self.processes.get(pid))
    }

    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    pub fn run_order(&self) -> &[ProcId] {
        &self.run_list
    }

    /// First live process matching an item (0 = any) and type (`None` = any).
    pub fn find_process(&self, item: ObjId, ty: Option<u16>) -> Option<ProcId> {
        self.processes()
            .filter(|p| !p.is_terminated())
            .find(|p| (item == 0 || p.item_num == item) && ty.map(|t| t == p.ty).unwrap_or(true))
            .map(|p| p.pid)
    }

    /// Moves `pid` directly behind the running process, or to the front when
    /// no pass is in progress.
    pub(crate) fn set_next_process(&mut self, pid: ProcId) {
        if self.current == Some(pid) {
            return;
        }
        match self.run_list.iter().position(|p| *p == pid) {
            Some(index) => {
                self.run_list.remove(index);
            }
            None => {
                if let Some(process) = self.processes.get_mut(&pid) {
                    process.flags |= ProcessFlags::ACTIVE;
                }
            }
        }
        let insert_at = self
            .current
            .and_then(|current| self.run_list.iter().position(|p| *p == current))
            .map(|index| index + 1)
            .unwrap_or(0);
        self.run_list.insert(insert_at, pid);
    }

    pub fn frame_num(&self) -> u32 {
        self.frame_num
    }

    pub fn pause(&mut self) {
        self.paused += 1;
        log::trace!("kernel paused (depth {})", self.paused);
    }

    pub fn unpause(&mut self) {
        self.paused = self.paused.saturating_sub(1);
        log::trace!("kernel unpaused (depth {})", self.paused);
    }

    pub fn is_paused(&self) -> bool {
        self.paused > 0
    }

    pub fn pause_depth(&self) -> u32 {
        self.paused
    }

    pub fn is_frame_by_frame(&self) -> bool {
        self.frame_by_frame
    }

    /// Switches single-step mode; entering it holds one pause.
    pub fn toggle_frame_by_frame(&mut self) {
        self.frame_by_frame = !self.frame_by_frame;
        if self.frame_by_frame {
            self.pause();
        } else {
            self.unpause();
        }
        log::info!("frame-by-frame stepping {}", if self.frame_by_frame { "on" } else { "off" });
    }

    /// Live process count per class name.
    pub fn process_types(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for process in self.processes() {
            *counts.entry(process.class_name().to_string()).or_insert(0) += 1;
        }
        counts
    }

    pub fn process_info(&self, pid: ProcId) -> Option<ProcessInfo> {
        let process = self.process(pid)?;
        Some(ProcessInfo {
            pid,
            class: process.class_name(),
            item_num: process.item_num,
            ty: process.ty,
            flags: process.flags.names(),
            result: process.result,
            waiting: process.waiting.clone(),
        })
    }

    /// Writes the frame counter, the pid pool and every persistent live
    /// process, ending with a terminator. Pids of skipped processes are
    /// released in the saved pool and dropped from saved waiter lists.
    pub fn save(&self, writer: &mut SaveWriter) -> Result<(), SaveError> {
        writer.write_u32(self.frame_num);
        let saved: Vec<&Process> = self
            .processes()
            .filter(|p| !p.is_terminated() && p.is_persistent())
            .collect();
        let saved_pids: HashSet<ProcId> = saved.iter().map(|p| p.pid).collect();

        let mut pool = self.pids.clone();
        for process in self.processes() {
            if !saved_pids.contains(&process.pid) {
                pool.clear_id(process.pid);
            }
        }
        pool.save(writer);

        for process in saved {
            let Some(logic) = process.logic() else {
                log::warn!("process {} is running during save; skipped", process.pid);
                continue;
            };
            writer.write_class_header(process.class_name())?;
            process.save_base(writer, &saved_pids);
            logic.save_data(writer)?;
        }
        writer.write_terminator();
        Ok(())
    }

    /// Replaces the process table with the saved one. Returns the restored
    /// pids in run order.
    pub fn load(
        &mut self,
        reader: &mut SaveReader<'_>,
        version: u32,
    ) -> Result<Vec<ProcId>, LoadError> {
        self.reset();
        self.frame_num = reader.read_u32()?;
        self.pids.load(reader)?;

        let mut restored = Vec::new();
        while let Some(class_name) = reader.read_class_name()? {
            let loader = *self
                .loaders
                .get(&class_name)
                .ok_or_else(|| LoadError::UnknownProcessClass(class_name.clone()))?;
            let mut process = Process::load_base(reader)?;
            let logic = loader(reader, version)?;
            process.restore_logic(logic);
            let pid = process.pid;
            if !self.pids.is_id_used(pid) {
                return Err(LoadError::PidNotReserved(pid));
            }
            if self.processes.insert(pid, process).is_some() {
                return Err(LoadError::DuplicateId(pid));
            }
            self.run_list.push(pid);
            restored.push(pid);
        }
        for process in self.processes.values_mut() {
            process.waiting.retain(|waiter| restored.contains(waiter));
        }
        log::debug!("restored {} processes", restored.len());
        Ok(restored)
    }

    fn reap(&mut self, index: usize, pid: ProcId) {
        self.run_list.remove(index);
        self.processes.remove(&pid);
        self.pids.clear_id(pid);
    }
}

impl GameContext {
    /// One scheduling pass over the run list.
    ///
    /// Processes added or woken during the pass run in the same pass.
    /// Terminated processes are reaped once their slot is visited, unless the
    /// kernel is paused.
    pub fn run_processes(&mut self) {
        if !self.kernel.is_paused() {
            self.kernel.frame_num = self.kernel.frame_num.wrapping_add(1);
        }

        let mut index = 0;
        while let Some(&pid) = self.kernel.run_list.get(index) {
            self.kernel.current = Some(pid);

            let deferred = self.kernel.process(pid).map(|p| {
                p.flags & (ProcessFlags::TERMINATED | ProcessFlags::TERM_DEFERRED)
                    == ProcessFlags::TERM_DEFERRED
            });
            if deferred == Some(true) && !self.kernel.is_paused() {
                self.terminate_process(pid);
            }

            let runnable = self.kernel.process(pid).map(|p| {
                !p.flags
                    .intersects(ProcessFlags::TERMINATED | ProcessFlags::SUSPENDED)
                    && (!self.kernel.is_paused() || p.flags.contains(ProcessFlags::RUNPAUSED))
            });
            if runnable == Some(true) {
                self.run_process(pid);
            }

            let position = self.kernel.run_list.iter().position(|p| *p == pid);
            let terminated = self
                .kernel
                .process(pid)
                .map(Process::is_terminated)
                .unwrap_or(true);
            match position {
                Some(at) if terminated && !self.kernel.is_paused() => {
                    self.kernel.reap(at, pid);
                    index = at;
                }
                Some(at) => index = at + 1,
                None => {}
            }
        }
        self.kernel.current = None;
    }

    /// Runs exactly one pass while stepping frame by frame.
    pub fn advance_frame(&mut self) {
        if !self.kernel.is_frame_by_frame() {
            return;
        }
        self.kernel.unpause();
        self.run_processes();
        self.kernel.pause();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessLogic;

    struct Counter {
        runs: u32,
        stop_after: u32,
    }

    impl ProcessLogic for Counter {
        fn class_name(&self) -> &'static str {
            "Counter"
        }

        fn run(&mut self, pid: ProcId, ctx: &mut GameContext) {
            self.runs += 1;
            if let Some(p) = ctx.kernel.process_mut(pid) {
                p.result = self.runs;
            }
            if self.runs >= self.stop_after {
                ctx.terminate_process(pid);
            }
        }
    }

    fn counter(stop_after: u32) -> Process {
        Process::new(Counter {
            runs: 0,
            stop_after,
        })
    }

    #[test]
    fn terminated_processes_are_reaped_and_pids_recycled_later() {
        let mut ctx = GameContext::headless();
        let a = ctx.kernel.add_process(counter(1));
        let b = ctx.kernel.add_process(counter(2));
        ctx.run_processes();
        assert!(ctx.kernel.process(a).is_none());
        assert!(ctx.kernel.process(b).is_some());
        ctx.run_processes();
        assert_eq!(ctx.kernel.process_count(), 0);
        assert_eq!(ctx.kernel.frame_num(), 2);
    }

    #[test]
    fn paused_kernel_only_runs_runpaused_processes() {
        let mut ctx = GameContext::headless();
        let normal = ctx.kernel.add_process(counter(100));
        let always = ctx.kernel.add_process(counter(100).run_paused());
        ctx.kernel.pause();
        ctx.run_processes();
        assert_eq!(ctx.kernel.frame_num(), 0);
        assert_eq!(ctx.kernel.process(normal).map(|p| p.result), Some(0));
        assert_eq!(ctx.kernel.process(always).map(|p| p.result), Some(1));
        ctx.kernel.unpause();
        ctx.kernel.unpause();
        assert!(!ctx.kernel.is_paused());
    }

    #[test]
    fn deferred_termination_happens_on_next_pass() {
        let mut ctx = GameContext::headless();
        let pid = ctx.kernel.add_process(counter(100));
        ctx.terminate_deferred(pid);
        assert!(!ctx.kernel.process(pid).map(Process::is_terminated).unwrap_or(true));
        ctx.run_processes();
        assert!(ctx.kernel.process(pid).is_none());
    }

    #[test]
    fn kill_processes_skips_itemless_processes() {
        let mut ctx = GameContext::headless();
        let bound = ctx.kernel.add_process(counter(100).with_item(300).with_type(7));
        let other_type = ctx.kernel.add_process(counter(100).with_item(300).with_type(8));
        let itemless = ctx.kernel.add_process(counter(100).with_type(7));
        assert_eq!(ctx.kill_processes(0, Some(7), true), 1);
        assert!(ctx.kernel.process(bound).map(Process::is_failed).unwrap_or(false));
        assert!(!ctx.kernel.process(other_type).map(Process::is_terminated).unwrap_or(true));
        assert!(!ctx.kernel.process(itemless).map(Process::is_terminated).unwrap_or(true));
        assert_eq!(ctx.kernel.find_process(300, None), Some(other_type));
    }

    #[test]
    fn frame_stepping_runs_one_pass_per_advance() {
        let mut ctx = GameContext::headless();
        let pid = ctx.kernel.add_process(counter(100));
        ctx.kernel.toggle_frame_by_frame();
        ctx.run_processes();
        assert_eq!(ctx.kernel.process(pid).map(|p| p.result), Some(0));
        ctx.advance_frame();
        assert_eq!(ctx.kernel.process(pid).map(|p| p.result), Some(1));
        assert!(ctx.kernel.is_paused());
        ctx.kernel.toggle_frame_by_frame();
        assert!(!ctx.kernel.is_paused());
    }

    #[test]
    fn process_types_count_live_classes() {
        let mut ctx = GameContext::headless();
        ctx.kernel.add_process(counter(5));
        ctx.kernel.add_process(counter(5));
        assert_eq!(ctx.kernel.process_types().get("Counter"), Some(&2));
        let info = ctx.kernel.process_info(1).expect("pid 1 exists");
        assert_eq!(info.flags, vec!["active"]);
    }
}
