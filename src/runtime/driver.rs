//! Trampoline driver
//!
//! The [`Runtime`] owns the record arena and resumes computations through an
//! explicit iterative loop: each resume step returns the next handle to run,
//! and the loop replaces its local "current" with that handle instead of
//! recursing. A chain of N nested completions therefore unwinds in O(1)
//! native stack. There is no process-wide mutable state; the current handle
//! lives in the loop that is driving.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use super::arena::{TaskArena, TaskId, TaskRecord, TaskState};
use super::error::RuntimeError;
use super::slot::ValueSlot;
use super::suspend::{ParkPoint, TaskAwait, YieldSuspend};
use super::task::{BodyAdapter, Context, Coroutine, TaskHandle, Transition};

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Number of computation records to preallocate.
    pub initial_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
        }
    }
}

/// Single-threaded cooperative runtime.
///
/// Spawns tasks into the record arena and drives them with the trampoline.
/// Exactly one computation is ever active; suspension is the only way
/// control transfers, and it is always explicit.
pub struct Runtime {
    arena: Rc<RefCell<TaskArena>>,
}

impl Runtime {
    /// Create a runtime with default configuration.
    #[inline]
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create a runtime with custom configuration.
    pub fn with_config(config: RuntimeConfig) -> Self {
        let arena = Rc::new(RefCell::new(TaskArena::with_capacity(
            config.initial_capacity,
        )));
        Self { arena }
    }

    /// Number of live tasks.
    #[inline]
    pub fn task_count(&self) -> usize {
        self.arena.borrow().len()
    }

    /// Spawn a coroutine.
    ///
    /// The record is created parked at its initial suspension point; none of
    /// the body runs until the task is driven or awaited.
    pub fn spawn<C>(&self, coroutine: C) -> TaskHandle<C::Output>
    where
        C: Coroutine + 'static,
    {
        let record = TaskRecord::new(
            Box::new(ValueSlot::<C::Output>::new()),
            Box::new(BodyAdapter::new(coroutine)),
        );
        let id = self.arena.borrow_mut().insert(record);
        debug!(task = %id, "task spawned");
        TaskHandle::new(Rc::clone(&self.arena), id)
    }

    /// Run the trampoline from `task` until the continuation chain is
    /// exhausted: the chain's tail parked with nothing pending, or every
    /// computation on it completed.
    pub fn drive<T>(&self, task: &TaskHandle<T>) -> Result<(), RuntimeError> {
        let root = task.id();
        debug!(task = %root, "trampoline start");
        let mut current = Some(root);
        while let Some(id) = current {
            current = self.resume_step(id)?;
        }
        debug!(task = %root, "trampoline exhausted");
        Ok(())
    }

    /// Drive `task` repeatedly until it completes, then take its final
    /// value. Interior values yielded with nobody awaiting are discarded.
    pub fn run_to_completion<T: 'static>(
        &self,
        task: &TaskHandle<T>,
    ) -> Result<T, RuntimeError> {
        while task.state() != TaskState::Completed {
            self.drive(task)?;
            if task.state() != TaskState::Completed {
                // interior yield with no awaiter: harvest and discard, or
                // error out if the task parked without producing anything
                task.take_value()?;
            }
        }
        task.take_value()
    }

    /// One trampoline step: resume the computation `id`, run its body to the
    /// next suspension point, park it there, and report who runs next.
    fn resume_step(&self, id: TaskId) -> Result<Option<TaskId>, RuntimeError> {
        // Detach the record so the body can reach the arena through the
        // runtime (spawning inner tasks) without a nested borrow.
        let mut record = self.arena.borrow_mut().detach(id)?;
        if record.state == TaskState::Completed {
            self.arena.borrow_mut().restore(id, record);
            return Err(RuntimeError::TaskCompleted { id });
        }

        let result = self.step_detached(id, &mut record);
        self.arena.borrow_mut().restore(id, record);
        result
    }

    fn step_detached(
        &self,
        id: TaskId,
        record: &mut TaskRecord,
    ) -> Result<Option<TaskId>, RuntimeError> {
        let mut resumed = {
            let mut arena = self.arena.borrow_mut();
            record.parked.as_point().on_resume(&mut arena)?
        };
        trace!(task = %id, state = ?record.state, "resuming");

        loop {
            let mut body = record
                .body
                .take()
                .expect("a live task always carries its body");
            let mut cx = Context::new(self, resumed);
            let transition = body.resume(&mut *record.slot, &mut cx);
            record.body = Some(body);

            let mut point = match transition {
                Transition::Yielded => {
                    record.state = TaskState::Suspended;
                    trace!(task = %id, "parked after yield");
                    ParkPoint::Yield(YieldSuspend)
                }
                Transition::Finished => {
                    record.state = TaskState::Completed;
                    trace!(task = %id, "completed");
                    ParkPoint::Yield(YieldSuspend)
                }
                Transition::Awaiting(inner) => {
                    record.state = TaskState::Suspended;
                    trace!(task = %id, awaiting = %inner, "parked awaiting");
                    ParkPoint::Await(TaskAwait::new(inner))
                }
            };

            if point.as_point().is_already_satisfied() {
                // Fast path: the point has nothing to wait for, so the task
                // never actually parks; deliver the payload and keep going.
                resumed = {
                    let mut arena = self.arena.borrow_mut();
                    point.as_point().on_resume(&mut arena)?
                };
                continue;
            }

            let next = {
                let mut arena = self.arena.borrow_mut();
                point.as_point().on_suspend(id, record, &mut arena)?
            };
            record.parked = point;
            return Ok(next);
        }
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("tasks", &self.task_count())
            .finish()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
