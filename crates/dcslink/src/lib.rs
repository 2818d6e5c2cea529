//! Client for the DCS World export-script socket.
//!
//! The export script listens on a TCP port, accepts one JSON command per
//! line, and answers each with a JSON envelope whose `result` field usually
//! carries telemetry in an indentation-delimited text format. This crate
//! provides the pieces needed to talk to it:
//!
//! - [`tree`] parses that text format into [`ParsedObject`] values.
//! - [`frame`] splits the incoming byte stream into JSON frames.
//! - [`command`] and [`catalog`] build outbound commands.
//! - [`correlator`] keeps one command in flight and matches responses to
//!   waiting queries.
//! - [`Client`] ties these to a [`transport::Connection`] and a receive
//!   thread, reporting events through one observer per event kind.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use dcslink::{Client, catalog};
//! use dcslink_config::Config;
//!
//! # fn main() -> Result<(), dcslink::ClientError> {
//! let client = Client::new(Config::default());
//! client.on_response(|response| {
//!     println!("{} -> {:?}", response.envelope.api_syntax, response.payload);
//! });
//! client.connect()?;
//! let own = client.query(catalog::SELF_DATA, &[], Duration::from_secs(2))?;
//! println!("{own:?}");
//! client.disconnect();
//! # Ok(())
//! # }
//! ```

pub mod catalog;
mod client;
pub mod command;
pub mod correlator;
pub mod dispatch;
mod errors;
pub mod frame;
pub mod monitor;
pub mod response;
pub mod snapshot;
pub mod telemetry;
pub mod transport;
pub mod tree;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use client::Client;
pub use command::{Command, CommandError, ParamKind, ParamValue};
pub use correlator::{CorrelationError, QueryKey};
pub use errors::ClientError;
pub use frame::{FrameError, ResponseEnvelope};
pub use monitor::Monitor;
pub use response::{Payload, Response};
pub use transport::{ConnectionError, ConnectionState};
pub use tree::{ParsedObject, TreeDiagnostic, Value, parse_tree};

#[cfg(test)]
mod tests;
