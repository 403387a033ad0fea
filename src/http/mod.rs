//! HTTP/1.0 protocol implementation.
//!
//! One request per connection: the session reads a request, hands it to a
//! [`Handler`](handler::Handler), writes the response and closes the stream.
//!
//! # Architecture
//!
//! - **`connection`**: The session state machine owning one accepted stream
//! - **`parser`**: Request line, URI and header line parsing
//! - **`params`**: Percent-decoding of query strings and form bodies
//! - **`request`**: The parsed request handed to handlers
//! - **`response`**: Response representation with builder pattern
//! - **`writer`**: Serializes responses onto the stream
//! - **`handler`**: The trait applications implement
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Session State Machine
//!
//! ```text
//!   AwaitingRequestLine ──(no version)──────────────┐
//!          │                                        │
//!          ▼                                        ▼
//!   AwaitingHeaders ──(GET etc.)──────────────► Dispatch
//!          │                                        ▲
//!          └──(POST)──► AwaitingBody ───────────────┘
//!                              │                    │
//!   any parse failure ──► SendError                 ▼
//!                              │               Responding
//!                              ▼                    │
//!                            Closed ◄───────────────┘
//! ```
//!
//! A POST body that ends early goes straight to `Closed` without a response.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use nanoserve::http::connection::{Session, SessionConfig};
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     let handler = Arc::new(my_handler());
//!
//!     loop {
//!         let (socket, peer) = listener.accept().await?;
//!         let session = Session::new(socket, peer, handler.clone(), SessionConfig::default());
//!         tokio::spawn(session.run());
//!     }
//! }
//! ```

pub mod connection;
pub mod handler;
pub mod mime;
pub mod params;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
