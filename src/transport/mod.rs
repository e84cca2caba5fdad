//! Client-facing transports

pub mod unix_socket;

pub use unix_socket::UnixSocketServer;
