//! Strand
//!
//! A minimal single-threaded cooperative task runtime: computations suspend
//! at explicit points, hand control back to a caller, carry a typed value
//! across each suspension, and resume from exactly where they stopped. An
//! iterative trampoline drives chained suspensions, so an await chain of any
//! depth resumes in constant native stack.
//!
//! # Example
//!
//! ```
//! use strand::{run, Context, Coroutine, Step};
//!
//! struct Countdown(u32);
//!
//! impl Coroutine for Countdown {
//!     type Output = u32;
//!
//!     fn resume(&mut self, _cx: &mut Context<'_>) -> Step<u32> {
//!         if self.0 > 1 {
//!             self.0 -= 1;
//!             Step::Yield(self.0)
//!         } else {
//!             Step::Done(0)
//!         }
//!     }
//! }
//!
//! assert_eq!(run(Countdown(3)).unwrap(), 0);
//! ```

#![warn(rust_2018_idioms)]
#![allow(dead_code)]

// Public modules
pub mod runtime;

// Utility modules
pub mod util;

// Re-exports
pub use runtime::{
    Context, Coroutine, Runtime, RuntimeConfig, RuntimeError, Step, TaskHandle, TaskId, TaskState,
    ValueSlot,
};

use tracing::debug;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = "Strand";

/// Spawn `coroutine` on a fresh runtime and drive it to completion,
/// returning its final value.
///
/// Intermediate values the coroutine yields with nobody awaiting it are
/// discarded. For finer control (harvesting yields, composing tasks), use
/// [`Runtime`] directly.
pub fn run<C>(coroutine: C) -> Result<C::Output, RuntimeError>
where
    C: Coroutine + 'static,
{
    let runtime = Runtime::new();
    let task = runtime.spawn(coroutine);
    debug!(task = %task.id(), "driving task to completion");
    runtime.run_to_completion(&task)
}
