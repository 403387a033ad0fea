use std::collections::HashMap;
use std::net::SocketAddr;

use bytes::Bytes;

use crate::http::params::Parameters;

/// A parsed HTTP request as handed to a [`Handler`](crate::http::handler::Handler).
///
/// Header keys are always lower-case. The URI is percent-decoded and never
/// carries the query string; query parameters (and form-encoded POST
/// bodies) live in `params`.
#[derive(Debug, Clone)]
pub struct Request {
    /// Address of the connected client
    pub peer: SocketAddr,
    /// The method token exactly as sent (e.g. "GET")
    pub method: String,
    /// Decoded request path (e.g. "/docs/index.html")
    pub uri: String,
    /// Protocol token, absent for bare `METHOD URI` requests
    pub version: Option<String>,
    /// Request headers keyed by lower-cased name
    pub headers: HashMap<String, String>,
    /// Query string merged with the decoded form body
    pub params: Parameters,
    /// Raw body bytes, only present for POST
    pub upload: Option<Bytes>,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    peer: SocketAddr,
    method: Option<String>,
    uri: Option<String>,
    version: Option<String>,
    headers: HashMap<String, String>,
    params: Parameters,
    upload: Option<Bytes>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            peer: SocketAddr::from(([127, 0, 0, 1], 0)),
            method: None,
            uri: None,
            version: Some("HTTP/1.0".to_string()),
            headers: HashMap::new(),
            params: Parameters::new(),
            upload: None,
        }
    }

    pub fn peer(mut self, peer: SocketAddr) -> Self {
        self.peer = peer;
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    /// Adds a header; the name is lower-cased like the parser does.
    pub fn header(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(key.as_ref().trim().to_ascii_lowercase(), value.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key, value);
        self
    }

    pub fn upload(mut self, upload: impl Into<Bytes>) -> Self {
        self.upload = Some(upload.into());
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        Ok(Request {
            peer: self.peer,
            method: self.method.ok_or("method missing")?,
            uri: self.uri.ok_or("uri missing")?,
            version: self.version,
            headers: self.headers,
            params: self.params,
            upload: self.upload,
        })
    }
}

impl Request {
    /// Retrieves a header value by name, ignoring case.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&key.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    /// Parses `Content-Length`, returning 0 when missing or not a number.
    pub fn content_length(&self) -> usize {
        content_length(&self.headers)
    }

    pub fn is_post(&self) -> bool {
        self.method.eq_ignore_ascii_case("POST")
    }
}

/// `content-length` from a lower-cased header map; 0 when missing or unparsable.
pub(crate) fn content_length(headers: &HashMap<String, String>) -> usize {
    headers
        .get("content-length")
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}
