//! Type erasure and ownership primitives.
//!
//! This crate provides three building blocks that hide a value's concrete type
//! behind a narrow runtime interface while keeping its ownership exact:
//!
//! - [`Any`], a clonable value of arbitrary type, recoverable by exact type;
//! - [`Function`], a clonable callable of a fixed signature;
//! - [`UniquePtr`], [`SharedPtr`] and [`WeakPtr`], owning and observing
//!   pointers whose pointee is released by a caller-supplied [`Destroyer`].
//!
//! `SharedPtr` counts are atomic, so clones may be created, dropped and
//! upgraded from any number of threads. The pointee itself gets no
//! synchronization.
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use ownkit::{Destroyer, Function, SharedPtr};
//!
//! let log = Arc::new(Mutex::new(Vec::new()));
//! let sink = log.clone();
//! let destroyer: Destroyer<String> = Function::new(move |s: Option<Box<String>>| {
//!     sink.lock().unwrap().push(format!("destroyed {:?}", s));
//! });
//!
//! let first = SharedPtr::with_destroyer(Box::new("hello".to_string()), destroyer);
//! let second = first.clone();
//! assert_eq!(first.use_count(), 2);
//! drop(first);
//! drop(second);
//! assert_eq!(log.lock().unwrap().len(), 1);
//! ```
//!
//! With the default `global` feature the crate also keeps a process-wide
//! allocation ledger ([`stats`]) and a shared diagnostic [`console`]. The
//! `trace` feature logs every destruction to that console.

#[macro_use]
mod debug;

mod any;
#[cfg(feature = "global")]
pub mod console;
pub(crate) mod counter;
mod error;
mod function;
pub mod pointers;
mod stats;

#[cfg(test)]
mod tests;

pub use any::Any;
pub use error::{Error, Result};
pub use function::{Function, Invoke};
pub use pointers::{make_shared, make_unique, make_weak, Destroyer, SharedPtr, UniquePtr, WeakPtr};
#[cfg(feature = "global")]
pub use stats::{stats, Stats};
