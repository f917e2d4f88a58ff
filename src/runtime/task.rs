//! Coroutine bodies and task handles
//!
//! A computation is written as an explicit state machine: each call to
//! [`Coroutine::resume`] runs it from its last suspension point to the next
//! one and reports what to do there via [`Step`]. A [`TaskHandle`] is the
//! owning reference to one spawned computation; dropping the handle destroys
//! the underlying record exactly once, without resuming the body.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::rc::Rc;

use super::arena::{TaskArena, TaskId, TaskState};
use super::driver::Runtime;
use super::error::RuntimeError;
use super::slot::{ErasedSlot, ValueSlot};
use super::suspend::Resumed;

/// A suspension request reported by a computation body.
pub enum Step<T> {
    /// Produce an intermediate value and park.
    Yield(T),
    /// Park until the named task completes or yields, then receive its
    /// value through [`Context::awaited`].
    Await(TaskId),
    /// Produce the final value; the body will not run again.
    Done(T),
}

/// A suspendable computation written as an explicit state machine.
///
/// `resume` runs the computation from its last suspension point to the next
/// one. Spawning a coroutine never calls `resume`; only the trampoline does,
/// once the task is driven or awaited. Ordinary code between suspension
/// points runs to completion without interruption.
pub trait Coroutine {
    /// Value type this computation yields and returns.
    type Output: 'static;

    /// Run to the next suspension point.
    fn resume(&mut self, cx: &mut Context<'_>) -> Step<Self::Output>;
}

/// Execution context handed to a body at every resume.
pub struct Context<'rt> {
    runtime: &'rt Runtime,
    resumed: Resumed,
}

impl<'rt> Context<'rt> {
    pub(crate) fn new(runtime: &'rt Runtime, resumed: Resumed) -> Self {
        Self { runtime, resumed }
    }

    /// Spawn a new task; its body does not run until driven or awaited.
    pub fn spawn<C>(&self, coroutine: C) -> TaskHandle<C::Output>
    where
        C: Coroutine + 'static,
    {
        self.runtime.spawn(coroutine)
    }

    /// Take the value delivered by the await this body just resumed from.
    ///
    /// # Panics
    ///
    /// Panics if the body was not resumed from an await, or if `T` is not
    /// the awaited task's output type. Either is a bug in the body.
    pub fn awaited<T: 'static>(&mut self) -> T {
        match mem::replace(&mut self.resumed, Resumed::Nothing) {
            Resumed::Value(value) => *value
                .downcast::<T>()
                .expect("awaited value has a different type"),
            Resumed::Nothing => panic!("no awaited value was delivered"),
        }
    }
}

/// What a body reported, with any produced value already moved into the
/// record's slot.
pub(crate) enum Transition {
    Yielded,
    Awaiting(TaskId),
    Finished,
}

/// Object-safe adapter over a typed coroutine: runs one step and routes the
/// produced value into the record's slot.
pub(crate) trait ErasedBody {
    fn resume(&mut self, slot: &mut dyn ErasedSlot, cx: &mut Context<'_>) -> Transition;
}

pub(crate) struct BodyAdapter<C> {
    coroutine: C,
}

impl<C: Coroutine> BodyAdapter<C> {
    pub(crate) fn new(coroutine: C) -> Self {
        Self { coroutine }
    }
}

impl<C: Coroutine> ErasedBody for BodyAdapter<C> {
    fn resume(&mut self, slot: &mut dyn ErasedSlot, cx: &mut Context<'_>) -> Transition {
        let step = self.coroutine.resume(cx);
        let slot = slot
            .as_any_mut()
            .downcast_mut::<ValueSlot<C::Output>>()
            .expect("slot type always matches the coroutine that owns it");
        match step {
            Step::Yield(value) => {
                slot.set(value);
                Transition::Yielded
            }
            Step::Done(value) => {
                slot.set(value);
                Transition::Finished
            }
            Step::Await(inner) => Transition::Awaiting(inner),
        }
    }
}

/// Owning reference to one suspended computation.
///
/// Exactly one handle owns a given record, and the type is deliberately not
/// `Clone`: resuming the same computation state from two owners is
/// undefined. Dropping the handle destroys the record exactly once,
/// releasing any unconsumed slot value without resuming the body. Dropping
/// or reassigning mid-suspension is the supported way to abandon a
/// computation early.
pub struct TaskHandle<T> {
    arena: Rc<RefCell<TaskArena>>,
    id: TaskId,
    _output: PhantomData<T>,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(arena: Rc<RefCell<TaskArena>>, id: TaskId) -> Self {
        Self {
            arena,
            id,
            _output: PhantomData,
        }
    }

    /// Raw id of the owned computation, as needed by [`Step::Await`].
    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TaskState {
        self.arena
            .borrow()
            .get(self.id)
            .map(|record| record.state)
            .expect("a live handle always names a live record")
    }

    /// Whether an unconsumed yielded or returned value is live.
    pub fn has_value(&self) -> bool {
        self.arena
            .borrow()
            .get(self.id)
            .map(|record| record.slot.has_value())
            .expect("a live handle always names a live record")
    }
}

impl<T: 'static> TaskHandle<T> {
    /// Take the task's most recent yielded or returned value.
    pub fn take_value(&self) -> Result<T, RuntimeError> {
        let mut arena = self.arena.borrow_mut();
        let record = arena.get_mut(self.id)?;
        let slot = record
            .slot
            .as_any_mut()
            .downcast_mut::<ValueSlot<T>>()
            .expect("slot type always matches the handle's type parameter");
        slot.try_take().ok_or(RuntimeError::NoValue { id: self.id })
    }
}

impl<T> fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle").field("id", &self.id).finish()
    }
}

impl<T> Drop for TaskHandle<T> {
    fn drop(&mut self) {
        // Take the record out before dropping it: the drop can cascade into
        // inner handles owned by the body, which re-borrow the arena.
        let record = self.arena.borrow_mut().remove(self.id);
        drop(record);
    }
}
