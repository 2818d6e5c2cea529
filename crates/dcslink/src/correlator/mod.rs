//! Request/response correlation.
//!
//! The export script answers one command at a time and in order, so the
//! [`CommandQueue`] keeps a single command in flight. Callers that need the
//! result of a specific command register a [`QueryKey`] in
//! [`PendingQueries`] and wait for the response to resolve it.

mod errors;
mod pending;
mod queue;

pub use self::errors::CorrelationError;
pub use self::pending::{PendingQueries, QueryKey, QueryOutcome, QueryStatus};
pub use self::queue::{CommandQueue, InFlight, SendOutcome};

const CORRELATOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::correlator");
