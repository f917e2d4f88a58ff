//! Handle lifecycle: abandoning, moving, and mixed output types.

use std::cell::Cell;
use std::rc::Rc;

use strand::{Context, Coroutine, Runtime, Step, TaskState};

use crate::support::{Const, YieldThenReturn};

#[test]
fn test_abandoned_task_never_runs() {
    struct Flagged {
        entered: Rc<Cell<bool>>,
    }

    impl Coroutine for Flagged {
        type Output = i32;

        fn resume(&mut self, _cx: &mut Context<'_>) -> Step<i32> {
            self.entered.set(true);
            Step::Done(0)
        }
    }

    let entered = Rc::new(Cell::new(false));
    let runtime = Runtime::new();
    let task = runtime.spawn(Flagged {
        entered: entered.clone(),
    });
    assert_eq!(runtime.task_count(), 1);

    drop(task);
    assert!(!entered.get());
    assert_eq!(runtime.task_count(), 0);
}

#[test]
fn test_partially_driven_task_can_be_abandoned() {
    let runtime = Runtime::new();
    let task = runtime.spawn(YieldThenReturn::new());

    runtime.drive(&task).unwrap();
    assert_eq!(task.state(), TaskState::Suspended);
    assert!(task.has_value());

    drop(task);
    assert_eq!(runtime.task_count(), 0);
}

#[test]
fn test_handle_moves_between_bindings() {
    let runtime = Runtime::new();
    let task = runtime.spawn(Const(3));

    // Ownership transfers; the record is destroyed once, at the end.
    let moved = task;
    assert_eq!(runtime.run_to_completion(&moved).unwrap(), 3);
    assert_eq!(runtime.task_count(), 1);

    drop(moved);
    assert_eq!(runtime.task_count(), 0);
}

#[test]
fn test_non_copy_output_type() {
    struct Greeting;

    impl Coroutine for Greeting {
        type Output = String;

        fn resume(&mut self, _cx: &mut Context<'_>) -> Step<String> {
            Step::Done(String::from("hello"))
        }
    }

    let runtime = Runtime::new();
    let task = runtime.spawn(Greeting);
    assert_eq!(runtime.run_to_completion(&task).unwrap(), "hello");
}

#[test]
fn test_tasks_of_mixed_output_types_coexist() {
    struct Unit;

    impl Coroutine for Unit {
        type Output = ();

        fn resume(&mut self, _cx: &mut Context<'_>) -> Step<()> {
            Step::Done(())
        }
    }

    let runtime = Runtime::new();
    let numbers = runtime.spawn(Const(7));
    let unit = runtime.spawn(Unit);
    assert_eq!(runtime.task_count(), 2);

    runtime.run_to_completion(&unit).unwrap();
    assert_eq!(runtime.run_to_completion(&numbers).unwrap(), 7);
}
