//! nanoserve - Embedded HTTP/1.0 server
//!
//! Core library for the protocol engine and the static file handler.

pub mod config;
pub mod files;
pub mod http;
pub mod server;
