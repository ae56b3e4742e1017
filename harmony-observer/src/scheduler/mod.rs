//! Scheduler layer
//!
//! Cancellable periodic tasks and the two poll streams built on them.

pub mod periodic;
pub mod poller;

pub use periodic::{TaskHandle, spawn_periodic};
pub use poller::{Poller, Stream};
