//! Connection core for the media remote control.
//!
//! [`connection::ConnectionManager`] owns the lifecycle of a single
//! WebSocket link to the server: establishing it, detecting loss,
//! retrying on a fixed delay, and broadcasting [`connection::StatusUpdate`]s
//! that the front end renders as status text and control enablement.
//! [`dispatcher::CommandDispatcher`] turns user gestures into wire
//! commands and hands them to the manager, which drops them with a
//! visible status message while disconnected.

pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod surface;
pub mod transport;

pub use connection::{ConnectionManager, ConnectionState, StatusUpdate, RETRY_DELAY};
pub use dispatcher::CommandDispatcher;
pub use error::TransportError;
pub use transport::{endpoint_from_origin, Transport, TransportEvent, TransportHandle, WsTransport};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/ws_tests.rs"]
mod ws_tests;
