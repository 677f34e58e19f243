use std::cell::RefCell;
use std::rc::Rc;

use pent_engine::processes::DelayProcess;
use pent_engine::{GameContext, ProcId, Process, ProcessLogic};

/// (name, result, failed) as seen from each terminate hook.
type Log = Rc<RefCell<Vec<(&'static str, u32, bool)>>>;

fn record(log: &Log, name: &'static str, pid: ProcId, ctx: &GameContext) {
    if let Some(process) = ctx.kernel.process(pid) {
        log.borrow_mut()
            .push((name, process.result, process.is_failed()));
    }
}

/// Finishes on its second run, either normally with `result` or by failing.
struct Finisher {
    name: &'static str,
    runs: u32,
    result: u32,
    fail: bool,
    log: Log,
}

impl ProcessLogic for Finisher {
    fn class_name(&self) -> &'static str {
        "Finisher"
    }

    fn run(&mut self, pid: ProcId, ctx: &mut GameContext) {
        self.runs += 1;
        if self.runs < 2 {
            return;
        }
        if self.fail {
            ctx.fail_process(pid);
        } else {
            if let Some(process) = ctx.kernel.process_mut(pid) {
                process.result = self.result;
            }
            ctx.terminate_process(pid);
        }
    }

    fn on_terminate(&mut self, pid: ProcId, ctx: &mut GameContext) {
        record(&self.log, self.name, pid, ctx);
    }
}

/// Waits on `target` during its first run and terminates the next time it
/// is scheduled, passing on whatever result woke it.
struct Waiter {
    name: &'static str,
    target: ProcId,
    waited: bool,
    log: Log,
}

impl ProcessLogic for Waiter {
    fn class_name(&self) -> &'static str {
        "Waiter"
    }

    fn run(&mut self, pid: ProcId, ctx: &mut GameContext) {
        if !self.waited {
            self.waited = true;
            ctx.wait_for(pid, self.target);
        } else {
            ctx.terminate_process(pid);
        }
    }

    fn on_terminate(&mut self, pid: ProcId, ctx: &mut GameContext) {
        record(&self.log, self.name, pid, ctx);
    }
}

struct Ticker;

impl ProcessLogic for Ticker {
    fn class_name(&self) -> &'static str {
        "Ticker"
    }

    fn run(&mut self, pid: ProcId, ctx: &mut GameContext) {
        if let Some(process) = ctx.kernel.process_mut(pid) {
            process.result += 1;
        }
    }
}

fn chain(ctx: &mut GameContext, fail: bool, log: &Log) -> [ProcId; 3] {
    let c = ctx.kernel.add_process(Process::new(Finisher {
        name: "c",
        runs: 0,
        result: 7,
        fail,
        log: log.clone(),
    }));
    let b = ctx.kernel.add_process(Process::new(Waiter {
        name: "b",
        target: c,
        waited: false,
        log: log.clone(),
    }));
    let a = ctx.kernel.add_process(Process::new(Waiter {
        name: "a",
        target: b,
        waited: false,
        log: log.clone(),
    }));
    [a, b, c]
}

#[test]
fn result_travels_up_a_wait_chain_in_one_pass() {
    let mut ctx = GameContext::headless();
    let log = Log::default();
    let [a, b, c] = chain(&mut ctx, false, &log);

    ctx.run_processes();
    assert!(ctx.kernel.process(a).map(Process::is_suspended).unwrap_or(false));
    assert!(ctx.kernel.process(b).map(Process::is_suspended).unwrap_or(false));
    assert!(ctx.kernel.process(c).is_some());
    assert!(log.borrow().is_empty());

    ctx.run_processes();
    assert_eq!(
        *log.borrow(),
        vec![("c", 7, false), ("b", 7, false), ("a", 7, false)]
    );
    assert_eq!(ctx.kernel.process_count(), 0);
}

#[test]
fn failure_propagates_to_every_waiter() {
    let mut ctx = GameContext::headless();
    let log = Log::default();
    chain(&mut ctx, true, &log);

    ctx.run_processes();
    ctx.run_processes();

    let log = log.borrow();
    assert_eq!(log.len(), 3);
    assert!(log.iter().all(|(_, _, failed)| *failed));
    let mut names: Vec<_> = log.iter().map(|(name, _, _)| *name).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert_eq!(ctx.kernel.process_count(), 0);
}

#[test]
fn waiting_on_a_delay_sleeps_for_its_ticks() {
    let mut ctx = GameContext::headless();
    let log = Log::default();
    let delay = ctx.kernel.add_process(Process::new(DelayProcess::new(3)));
    ctx.kernel.add_process(Process::new(Waiter {
        name: "sleeper",
        target: delay,
        waited: false,
        log: log.clone(),
    }));

    ctx.run_processes();
    ctx.run_processes();
    assert!(log.borrow().is_empty());
    ctx.run_processes();
    assert_eq!(*log.borrow(), vec![("sleeper", 0, false)]);
}

#[test]
fn waiting_on_a_missing_process_does_not_suspend() {
    let mut ctx = GameContext::headless();
    let log = Log::default();
    let pid = ctx.kernel.add_process(Process::new(Waiter {
        name: "orphan",
        target: 999,
        waited: false,
        log: log.clone(),
    }));

    ctx.run_processes();
    assert!(!ctx.kernel.process(pid).map(Process::is_suspended).unwrap_or(true));
    ctx.run_processes();
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn pause_holds_everything_but_runpaused_processes() {
    let mut ctx = GameContext::headless();
    let normal = ctx.kernel.add_process(Process::new(Ticker));
    let always = ctx.kernel.add_process(Process::new(Ticker).run_paused());

    ctx.kernel.pause();
    ctx.kernel.pause();
    for _ in 0..3 {
        ctx.run_processes();
    }
    assert_eq!(ctx.kernel.frame_num(), 0);
    assert_eq!(ctx.kernel.process(normal).map(|p| p.result), Some(0));
    assert_eq!(ctx.kernel.process(always).map(|p| p.result), Some(3));

    ctx.kernel.unpause();
    ctx.run_processes();
    assert_eq!(ctx.kernel.process(normal).map(|p| p.result), Some(0));

    ctx.kernel.unpause();
    ctx.run_processes();
    assert_eq!(ctx.kernel.frame_num(), 1);
    assert_eq!(ctx.kernel.process(normal).map(|p| p.result), Some(1));
}

#[test]
fn kill_processes_matches_item_and_type() {
    let mut ctx = GameContext::headless();
    let walk = ctx
        .kernel
        .add_process(Process::new(Ticker).with_item(5).with_type(1));
    let anim = ctx
        .kernel
        .add_process(Process::new(Ticker).with_item(5).with_type(2));
    let other = ctx
        .kernel
        .add_process(Process::new(Ticker).with_item(6).with_type(1));
    let free = ctx.kernel.add_process(Process::new(Ticker));

    assert_eq!(ctx.kill_processes(5, Some(1), false), 1);
    assert!(ctx.kernel.process(walk).map(Process::is_terminated).unwrap_or(false));
    assert_eq!(ctx.kill_processes(0, None, true), 2);
    assert!(ctx.kernel.process(anim).map(Process::is_failed).unwrap_or(false));
    assert!(ctx.kernel.process(other).map(Process::is_failed).unwrap_or(false));

    ctx.run_processes();
    assert_eq!(ctx.kernel.run_order(), &[free]);
}

#[test]
fn waiting_on_a_terminated_but_unreaped_process_does_not_suspend() {
    let mut ctx = GameContext::headless();
    let target = ctx.kernel.add_process(Process::new(Ticker));
    let waiter = ctx.kernel.add_process(Process::new(Ticker));

    ctx.terminate_process(target);
    assert!(ctx.kernel.process(target).is_some());
    ctx.wait_for(waiter, target);

    assert!(!ctx.kernel.process(waiter).map(Process::is_suspended).unwrap_or(true));
    assert!(ctx.kernel.process(target).map(|p| p.waiting.is_empty()).unwrap_or(false));
    ctx.run_processes();
    assert!(ctx.kernel.process(target).is_none());
    assert_eq!(ctx.kernel.process(waiter).map(|p| p.result), Some(1));
}

#[test]
fn waiting_on_nothing_sleeps_until_woken() {
    let mut ctx = GameContext::headless();
    let pid = ctx.kernel.add_process(Process::new(Ticker));
    ctx.wait_for(pid, 0);

    for _ in 0..5 {
        ctx.run_processes();
    }
    assert!(ctx.kernel.process(pid).map(Process::is_suspended).unwrap_or(false));
    assert_eq!(ctx.kernel.process(pid).map(|p| p.result), Some(0));

    ctx.wake_up(pid, 9);
    assert!(!ctx.kernel.process(pid).map(Process::is_suspended).unwrap_or(true));
    ctx.run_processes();
    assert_eq!(ctx.kernel.process(pid).map(|p| p.result), Some(10));
}
