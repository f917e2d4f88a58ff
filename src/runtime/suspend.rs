//! Suspension points
//!
//! Every place a computation parks implements the same three-operation
//! protocol: a fast-path satisfaction check, a suspend action that decides
//! who runs next, and a resume action that produces what the parked code
//! receives. Three kinds exist: the initial park of every task, the park
//! after a yield or return, and the park while awaiting another task.

use std::any::Any;

use super::arena::{TaskArena, TaskId, TaskRecord};
use super::error::RuntimeError;

/// Payload delivered to a computation when it is resumed.
pub(crate) enum Resumed {
    /// Nothing to deliver (initial or post-yield resume).
    Nothing,
    /// Value extracted from an awaited task's slot.
    Value(Box<dyn Any>),
}

/// The three-operation suspension contract.
pub(crate) trait SuspendPoint {
    /// Fast path: a satisfied point never actually parks the computation.
    ///
    /// All three kinds in this runtime return `false`: every suspension
    /// point here truly suspends at least once.
    fn is_already_satisfied(&self) -> bool {
        false
    }

    /// Called once the computation is parked. `record` is the parked
    /// computation's own state; the return value is who the trampoline
    /// resumes next, or `None` when the chain is exhausted.
    fn on_suspend(
        &mut self,
        current: TaskId,
        record: &mut TaskRecord,
        arena: &mut TaskArena,
    ) -> Result<Option<TaskId>, RuntimeError>;

    /// Called when the trampoline resumes the parked computation; produces
    /// the payload the suspended code receives.
    fn on_resume(&mut self, arena: &mut TaskArena) -> Result<Resumed, RuntimeError>;
}

/// The very first suspension point of every task.
///
/// A spawned body never runs until explicitly driven or awaited; this point
/// parks it with nothing further to resume. The creator decides when to
/// start it.
#[derive(Debug, Default)]
pub(crate) struct InitialSuspend;

impl SuspendPoint for InitialSuspend {
    fn on_suspend(
        &mut self,
        _current: TaskId,
        _record: &mut TaskRecord,
        _arena: &mut TaskArena,
    ) -> Result<Option<TaskId>, RuntimeError> {
        Ok(None)
    }

    fn on_resume(&mut self, _arena: &mut TaskArena) -> Result<Resumed, RuntimeError> {
        Ok(Resumed::Nothing)
    }
}

/// Park after a yield or a return.
///
/// Hands control to whoever is recorded in the parked task's own
/// continuation link: the awaiter, once this task finishes or yields, or
/// nobody at all for an interior yield with no current awaiter.
#[derive(Debug, Default)]
pub(crate) struct YieldSuspend;

impl SuspendPoint for YieldSuspend {
    fn on_suspend(
        &mut self,
        _current: TaskId,
        record: &mut TaskRecord,
        _arena: &mut TaskArena,
    ) -> Result<Option<TaskId>, RuntimeError> {
        Ok(record.link.take())
    }

    fn on_resume(&mut self, _arena: &mut TaskArena) -> Result<Resumed, RuntimeError> {
        Ok(Resumed::Nothing)
    }
}

/// Park while awaiting another task.
///
/// Suspending wires the awaiter into the inner task's continuation link and
/// transfers control to the inner task; resuming reads the inner task's
/// value slot and delivers the value to the awaiting body.
#[derive(Debug)]
pub(crate) struct TaskAwait {
    inner: TaskId,
}

impl TaskAwait {
    pub(crate) fn new(inner: TaskId) -> Self {
        Self { inner }
    }
}

impl SuspendPoint for TaskAwait {
    fn on_suspend(
        &mut self,
        current: TaskId,
        _record: &mut TaskRecord,
        arena: &mut TaskArena,
    ) -> Result<Option<TaskId>, RuntimeError> {
        let previous = arena.get_mut(self.inner)?.link.replace(current);
        debug_assert!(
            previous.is_none(),
            "a task can have at most one pending awaiter"
        );
        Ok(Some(self.inner))
    }

    fn on_resume(&mut self, arena: &mut TaskArena) -> Result<Resumed, RuntimeError> {
        let record = arena.get_mut(self.inner)?;
        match record.slot.take_boxed() {
            Some(value) => Ok(Resumed::Value(value)),
            None => Err(RuntimeError::NoValue { id: self.inner }),
        }
    }
}

/// Whichever suspension point a task is currently parked at.
pub(crate) enum ParkPoint {
    Initial(InitialSuspend),
    Yield(YieldSuspend),
    Await(TaskAwait),
}

impl ParkPoint {
    #[inline]
    pub(crate) fn as_point(&mut self) -> &mut dyn SuspendPoint {
        match self {
            ParkPoint::Initial(point) => point,
            ParkPoint::Yield(point) => point,
            ParkPoint::Await(point) => point,
        }
    }
}
