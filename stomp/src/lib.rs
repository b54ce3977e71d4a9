//! STOMP 1.2 frame model and strict text codec.
//!
//! This crate owns the wire representation spoken over the feed's WebSocket
//! transport. It never performs I/O: callers hand it the payload of one
//! WebSocket text message and get back either a fully validated [`Frame`]
//! or a classified [`StompError`].
//!
//! DESIGN
//! ======
//! - Commands and header names are closed enums backed by static tables.
//!   Unknown header keys are rejected, not carried through.
//! - Serialization re-runs the parser over the bytes it produced, so an
//!   invalid frame can never be emitted.
//! - Header order carries no meaning; the first occurrence of a key wins.

mod command;
mod error;
mod frame;
mod header;

pub use command::Command;
pub use error::StompError;
pub use frame::{Frame, serialize};
pub use header::{HeaderName, Headers};
