//! Service layer
//!
//! State owned by an observer session: the observation store that the poll
//! streams write into, the reconciler that derives job state from it, and
//! the command issuer that talks to the server on the user's behalf.

pub mod commands;
pub mod intent;
pub mod reconciler;
pub mod store;

pub use commands::CommandIssuer;
pub use intent::IntentLog;
pub use reconciler::Reconciler;
pub use store::{ObservationStore, Ticket};
