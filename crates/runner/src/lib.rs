//! Runner abstraction: how the queue talks to acquisition backends.
//!
//! Each backend integration target ("runner") implements the
//! [`GameRunner`] capability set. The queue never branches on runner
//! identity at call sites: it selects an implementation from a
//! [`RunnerSet`] and a concrete call from the [`dispatch_target`] table,
//! with a defined failure default for unmapped pairs.

pub mod dispatch;
pub mod error;

pub use dispatch::{DispatchTarget, GameRunner, RunOutcome, RunnerFuture, RunnerSet, dispatch_target};
pub use error::RunnerError;
