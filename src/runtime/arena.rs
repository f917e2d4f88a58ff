//! Task arena
//!
//! Computation-state records live in a generational arena. A [`TaskId`] is
//! an index plus a generation, never a reinterpreted address: a reused index
//! bumps the generation, so a stale id held after its record died resolves
//! to [`RuntimeError::UnknownTask`] instead of aliasing a newer record.

use std::fmt;

use tracing::trace;

use super::error::RuntimeError;
use super::link::ContinuationLink;
use super::slot::ErasedSlot;
use super::suspend::{InitialSuspend, ParkPoint};
use super::task::ErasedBody;

/// Unique identifier for a live computation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    index: u32,
    generation: u32,
}

impl TaskId {
    #[inline]
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena index of this id.
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task({})", self.index)
    }
}

/// Lifecycle of a computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Spawned and parked at its initial suspension point; the body has
    /// never run.
    Created,
    /// Parked at an interior suspension point.
    Suspended,
    /// Ran to completion; resuming it again is an error.
    Completed,
}

/// One live computation: value slot, continuation link, body state machine,
/// the suspension point it is parked at, and its lifecycle state.
pub(crate) struct TaskRecord {
    pub(crate) state: TaskState,
    pub(crate) slot: Box<dyn ErasedSlot>,
    pub(crate) link: ContinuationLink,
    pub(crate) body: Option<Box<dyn ErasedBody>>,
    pub(crate) parked: ParkPoint,
}

impl TaskRecord {
    pub(crate) fn new(slot: Box<dyn ErasedSlot>, body: Box<dyn ErasedBody>) -> Self {
        Self {
            state: TaskState::Created,
            slot,
            link: ContinuationLink::new(),
            body: Some(body),
            parked: ParkPoint::Initial(InitialSuspend),
        }
    }
}

struct Entry {
    generation: u32,
    record: Option<TaskRecord>,
}

/// Generational storage for computation records.
pub(crate) struct TaskArena {
    entries: Vec<Entry>,
    free: Vec<u32>,
    live: usize,
}

impl TaskArena {
    pub(crate) fn new() -> Self {
        Self::with_capacity(0)
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Insert a record, minting its id.
    pub(crate) fn insert(&mut self, record: TaskRecord) -> TaskId {
        self.live += 1;
        let id = if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            debug_assert!(entry.record.is_none());
            entry.record = Some(record);
            TaskId::new(index, entry.generation)
        } else {
            let index = self.entries.len() as u32;
            self.entries.push(Entry {
                generation: 0,
                record: Some(record),
            });
            TaskId::new(index, 0)
        };
        trace!(task = %id, "record inserted");
        id
    }

    /// Remove a record, returning it so the caller can drop it outside any
    /// arena borrow (record drops can cascade into further removals).
    ///
    /// Removing an id twice is a no-op returning `None`.
    pub(crate) fn remove(&mut self, id: TaskId) -> Option<TaskRecord> {
        let entry = self.entries.get_mut(id.index())?;
        if entry.generation != id.generation || entry.record.is_none() {
            return None;
        }
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        trace!(task = %id, "record removed");
        entry.record.take()
    }

    pub(crate) fn get(&self, id: TaskId) -> Result<&TaskRecord, RuntimeError> {
        self.entries
            .get(id.index())
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.record.as_ref())
            .ok_or(RuntimeError::UnknownTask { id })
    }

    pub(crate) fn get_mut(&mut self, id: TaskId) -> Result<&mut TaskRecord, RuntimeError> {
        self.entries
            .get_mut(id.index())
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.record.as_mut())
            .ok_or(RuntimeError::UnknownTask { id })
    }

    /// Detach a record while its body runs, so body code can reach the
    /// arena through the runtime without a nested borrow. [`restore`]
    /// puts it back under the same id.
    ///
    /// [`restore`]: TaskArena::restore
    pub(crate) fn detach(&mut self, id: TaskId) -> Result<TaskRecord, RuntimeError> {
        self.entries
            .get_mut(id.index())
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.record.take())
            .ok_or(RuntimeError::UnknownTask { id })
    }

    /// Put a detached record back.
    pub(crate) fn restore(&mut self, id: TaskId, record: TaskRecord) {
        let entry = &mut self.entries[id.index()];
        debug_assert_eq!(entry.generation, id.generation);
        debug_assert!(entry.record.is_none());
        entry.record = Some(record);
    }

    /// Number of live records.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.live == 0
    }
}

impl Default for TaskArena {
    fn default() -> Self {
        Self::new()
    }
}
