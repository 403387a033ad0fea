//! TCP listener and per-connection task spawning.

pub mod listener;

pub use listener::{BindError, DefaultSocketFactory, RunningServer, Server, SocketFactory};
