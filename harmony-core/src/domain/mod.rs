//! Core domain types
//!
//! These types describe the server-side analysis job as the client sees it:
//! which channel it belongs to, what can be asked of it, and what has been
//! observed about it.

pub mod channel;
pub mod error;
pub mod job;
pub mod observation;
