//! End-to-end scenarios: await chains, yield/return interleavings, and a
//! root task driving a whole computation tree from one trampoline loop.

use std::cell::Cell;
use std::rc::Rc;

use strand::{run, Context, Coroutine, Runtime, Step, TaskHandle, TaskState};

use crate::support::{Const, Forward, YieldThenReturn};

#[test]
fn test_chain_of_awaits_returns_inner_constant() {
    let runtime = Runtime::new();
    let co0 = runtime.spawn(Const(123));
    let co1 = runtime.spawn(Forward::new(co0));
    let co2 = runtime.spawn(Forward::new(co1));

    assert_eq!(runtime.run_to_completion(&co2).unwrap(), 123);
}

/// Awaits the inner task twice, binding each observed value separately.
struct SumTwoBindings {
    inner: TaskHandle<i32>,
    phase: u8,
    first: i32,
}

impl Coroutine for SumTwoBindings {
    type Output = i32;

    fn resume(&mut self, cx: &mut Context<'_>) -> Step<i32> {
        match self.phase {
            0 => {
                self.phase = 1;
                Step::Await(self.inner.id())
            }
            1 => {
                self.first = cx.awaited();
                self.phase = 2;
                Step::Await(self.inner.id())
            }
            _ => {
                let second: i32 = cx.awaited();
                Step::Done(self.first + second)
            }
        }
    }
}

#[test]
fn test_yield_then_return_summed_across_two_bindings() {
    let runtime = Runtime::new();
    let inner = runtime.spawn(YieldThenReturn::new());
    let outer = runtime.spawn(SumTwoBindings {
        inner,
        phase: 0,
        first: 0,
    });

    assert_eq!(runtime.run_to_completion(&outer).unwrap(), 3);
}

/// Awaits the inner task twice, folding each value straight into a running
/// sum without naming it.
struct SumRunning {
    inner: TaskHandle<i32>,
    remaining: u8,
    sum: i32,
}

impl Coroutine for SumRunning {
    type Output = i32;

    fn resume(&mut self, cx: &mut Context<'_>) -> Step<i32> {
        if self.remaining < 2 {
            self.sum += cx.awaited::<i32>();
        }
        if self.remaining == 0 {
            return Step::Done(self.sum);
        }
        self.remaining -= 1;
        Step::Await(self.inner.id())
    }
}

#[test]
fn test_yield_then_return_summed_in_single_expression() {
    let runtime = Runtime::new();
    let inner = runtime.spawn(YieldThenReturn::new());
    let outer = runtime.spawn(SumRunning {
        inner,
        remaining: 2,
        sum: 0,
    });

    assert_eq!(runtime.run_to_completion(&outer).unwrap(), 3);
}

/// State captured at spawn time is returned when driven.
struct Captured {
    a: i32,
}

#[test]
fn test_captured_state_returned_when_driven() {
    impl Coroutine for Captured {
        type Output = i32;

        fn resume(&mut self, _cx: &mut Context<'_>) -> Step<i32> {
            Step::Done(self.a)
        }
    }

    assert_eq!(run(Captured { a: 10 }).unwrap(), 10);
}

/// Signals twice (one yield, one return) without carrying a payload.
struct UnitWork {
    yielded: bool,
}

/// Root task: awaits the unit worker through both of its suspensions and
/// counts what it observed.
struct Runner {
    inner: TaskHandle<()>,
    phase: u8,
    observed: Rc<Cell<u8>>,
}

#[test]
fn test_root_runner_drives_whole_chain() {
    impl Coroutine for UnitWork {
        type Output = ();

        fn resume(&mut self, _cx: &mut Context<'_>) -> Step<()> {
            if !self.yielded {
                self.yielded = true;
                Step::Yield(())
            } else {
                Step::Done(())
            }
        }
    }

    impl Coroutine for Runner {
        type Output = ();

        fn resume(&mut self, cx: &mut Context<'_>) -> Step<()> {
            match self.phase {
                0 => {
                    self.phase = 1;
                    Step::Await(self.inner.id())
                }
                1 => {
                    cx.awaited::<()>();
                    self.observed.set(self.observed.get() + 1);
                    self.phase = 2;
                    Step::Await(self.inner.id())
                }
                _ => {
                    cx.awaited::<()>();
                    self.observed.set(self.observed.get() + 1);
                    Step::Done(())
                }
            }
        }
    }

    let observed = Rc::new(Cell::new(0));
    let runtime = Runtime::new();
    let worker = runtime.spawn(UnitWork { yielded: false });
    let root = runtime.spawn(Runner {
        inner: worker,
        phase: 0,
        observed: observed.clone(),
    });

    // One external loop drives the root, the worker, and every hand-off
    // between them.
    runtime.run_to_completion(&root).unwrap();
    assert_eq!(observed.get(), 2);
    assert_eq!(root.state(), TaskState::Completed);
}

#[test]
fn test_deep_await_chain_resumes_iteratively() {
    let runtime = Runtime::new();
    let mut task = runtime.spawn(Const(123));
    for _ in 0..1000 {
        task = runtime.spawn(Forward::new(task));
    }

    // A chain this deep only completes if the trampoline unwinds each
    // completion by returning to the loop instead of recursing.
    assert_eq!(runtime.run_to_completion(&task).unwrap(), 123);
}

#[test]
fn test_spawn_inner_task_from_body() {
    struct SpawnInside {
        inner: Option<TaskHandle<i32>>,
    }

    impl Coroutine for SpawnInside {
        type Output = i32;

        fn resume(&mut self, cx: &mut Context<'_>) -> Step<i32> {
            match &self.inner {
                None => {
                    // keep the handle alive for the duration of the await
                    let inner = cx.spawn(Const(21));
                    let id = inner.id();
                    self.inner = Some(inner);
                    Step::Await(id)
                }
                Some(_) => Step::Done(cx.awaited::<i32>() * 2),
            }
        }
    }

    let runtime = Runtime::new();
    let task = runtime.spawn(SpawnInside { inner: None });
    assert_eq!(runtime.run_to_completion(&task).unwrap(), 42);
}
