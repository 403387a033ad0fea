use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::http::handler::Handler;
use crate::http::params::{self, Parameters};
use crate::http::parser::{self, ParseError};
use crate::http::request::{self, Request};
use crate::http::response::{Response, StatusCode};
use crate::http::writer::ResponseWriter;

/// Largest accepted POST body unless configured otherwise.
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 1024 * 1024;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub max_upload_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }
}

/// Request data gathered before dispatch.
#[derive(Debug)]
pub struct PartialRequest {
    method: String,
    uri: String,
    version: Option<String>,
    headers: HashMap<String, String>,
    params: Parameters,
}

impl PartialRequest {
    fn into_request(self, peer: SocketAddr, upload: Option<Bytes>) -> Request {
        Request {
            peer,
            method: self.method,
            uri: self.uri,
            version: self.version,
            headers: self.headers,
            params: self.params,
            upload,
        }
    }

    fn is_post(&self) -> bool {
        self.method.eq_ignore_ascii_case("POST")
    }
}

pub enum SessionState {
    AwaitingRequestLine,
    AwaitingHeaders(PartialRequest),
    AwaitingBody(PartialRequest),
    Dispatch(Request),
    Responding(Response),
    SendError(ParseError),
    Closed,
}

/// Owns one accepted connection for a single request/response exchange.
pub struct Session<S, H> {
    reader: BufReader<S>,
    peer: SocketAddr,
    handler: Arc<H>,
    config: SessionConfig,
    state: SessionState,
}

impl<S, H> Session<S, H>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
    H: Handler,
{
    pub fn new(stream: S, peer: SocketAddr, handler: Arc<H>, config: SessionConfig) -> Self {
        Self {
            reader: BufReader::new(stream),
            peer,
            handler,
            config,
            state: SessionState::AwaitingRequestLine,
        }
    }

    /// Runs the exchange to completion. The stream is shut down on every
    /// path, including I/O errors.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let result = self.drive().await;
        close_quietly(self.reader.get_mut()).await;
        result
    }

    async fn drive(&mut self) -> anyhow::Result<()> {
        loop {
            let state = std::mem::replace(&mut self.state, SessionState::Closed);
            self.state = match state {
                SessionState::AwaitingRequestLine => match self.read_request_line().await? {
                    Ok(partial) if partial.version.is_some() => {
                        SessionState::AwaitingHeaders(partial)
                    }
                    Ok(partial) => self.after_headers(partial),
                    Err(e) => SessionState::SendError(e),
                },

                SessionState::AwaitingHeaders(mut partial) => {
                    match self.read_headers(&mut partial.headers).await? {
                        Ok(()) => self.after_headers(partial),
                        Err(e) => SessionState::SendError(e),
                    }
                }

                SessionState::AwaitingBody(partial) => self.read_body(partial).await?,

                SessionState::Dispatch(request) => {
                    let response = match self.handler.serve(&request).await {
                        Some(response) => response,
                        None => Response::plain(
                            StatusCode::InternalServerError,
                            "SERVER INTERNAL ERROR: Serve() returned a null response.",
                        ),
                    };
                    info!(
                        peer = %self.peer,
                        method = %request.method,
                        uri = %request.uri,
                        status = response.status.as_u16(),
                        "Request served"
                    );
                    SessionState::Responding(response)
                }

                SessionState::Responding(response) => {
                    self.respond(response).await?;
                    SessionState::Closed
                }

                SessionState::SendError(e) => {
                    debug!(peer = %self.peer, status = e.status().as_u16(), error = %e, "Rejecting request");
                    self.respond(Response::plain(e.status(), e.to_string())).await?;
                    SessionState::Closed
                }

                SessionState::Closed => break,
            };
        }

        Ok(())
    }

    /// Reads one line including its terminator. `None` at end of stream.
    async fn read_line(&mut self) -> anyhow::Result<Option<String>> {
        let mut line = Vec::new();
        let n = self.reader.read_until(b'\n', &mut line).await?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(parser::trim_line_ending(&line)))
    }

    async fn read_request_line(&mut self) -> anyhow::Result<Result<PartialRequest, ParseError>> {
        let Some(line) = self.read_line().await? else {
            return Ok(Err(ParseError::NoRequest));
        };

        let parsed = parser::parse_request_line(&line).and_then(|line| {
            let (uri, params) = parser::decode_uri(&line.raw_uri)?;
            Ok(PartialRequest {
                method: line.method,
                uri,
                version: line.version,
                headers: HashMap::new(),
                params,
            })
        });
        Ok(parsed)
    }

    async fn read_headers(
        &mut self,
        headers: &mut HashMap<String, String>,
    ) -> anyhow::Result<Result<(), ParseError>> {
        loop {
            let Some(line) = self.read_line().await? else {
                return Ok(Err(ParseError::UnterminatedHeaders));
            };
            if line.trim().is_empty() {
                return Ok(Ok(()));
            }
            // Later duplicates replace earlier values.
            if let Some((key, value)) = parser::parse_header_line(&line) {
                headers.insert(key, value);
            }
        }
    }

    fn after_headers(&self, partial: PartialRequest) -> SessionState {
        if partial.is_post() {
            SessionState::AwaitingBody(partial)
        } else {
            SessionState::Dispatch(partial.into_request(self.peer, None))
        }
    }

    async fn read_body(&mut self, mut partial: PartialRequest) -> anyhow::Result<SessionState> {
        let expected = request::content_length(&partial.headers);
        let max = self.config.max_upload_size;
        if expected > max {
            return Ok(SessionState::SendError(ParseError::UploadTooLarge {
                declared: expected,
                max,
            }));
        }

        let mut buf = BytesMut::with_capacity(expected);
        while buf.len() < expected {
            let remaining = (expected - buf.len()) as u64;
            let n = (&mut self.reader).take(remaining).read_buf(&mut buf).await?;
            if n == 0 {
                // Dropped without a response.
                warn!(
                    peer = %self.peer,
                    received = buf.len(),
                    expected,
                    "Connection closed before the request body was complete"
                );
                return Ok(SessionState::Closed);
            }
        }
        let upload = buf.freeze();

        if is_form(&partial.headers) {
            match std::str::from_utf8(&upload).map(params::decode) {
                Ok(Ok(form)) => partial.params.extend(form),
                Ok(Err(e)) => debug!(peer = %self.peer, error = %e, "Form body not decoded"),
                Err(_) => debug!(peer = %self.peer, "Form body is not UTF-8"),
            }
        }

        Ok(SessionState::Dispatch(partial.into_request(self.peer, Some(upload))))
    }

    async fn respond(&mut self, mut response: Response) -> anyhow::Result<()> {
        if response.status != StatusCode::Ok {
            if response.body.is_none() {
                response = Response::plain(response.status, response.status.to_string());
            } else if response.mime.is_none() {
                response.mime = Some(crate::http::mime::TEXT_PLAIN.to_string());
            }
        }

        let sent = ResponseWriter::new(response)
            .write_to_stream(self.reader.get_mut())
            .await?;
        debug!(peer = %self.peer, bytes = sent, "Response written");
        Ok(())
    }
}

fn is_form(headers: &HashMap<String, String>) -> bool {
    match headers.get("content-type") {
        None => true,
        Some(ct) => ct.to_ascii_lowercase().starts_with(FORM_URLENCODED),
    }
}

/// Shuts the stream down, ignoring any error.
pub async fn close_quietly<S: AsyncWrite + Unpin>(stream: &mut S) {
    if let Err(e) = stream.shutdown().await {
        debug!(error = %e, "Ignoring error while closing stream");
    }
}
