use std::fmt;
use std::io::Cursor;
use std::pin::Pin;

use tokio::io::AsyncRead;

/// Streamed response body.
pub type Body = Pin<Box<dyn AsyncRead + Send>>;

/// HTTP status codes produced by the server.
///
/// - `Ok` (200): Request successful
/// - `MovedPermanently` (301): Directory requested without a trailing slash
/// - `BadRequest` (400): Malformed request
/// - `Forbidden` (403): Traversal attempt, listing disabled or unreadable file
/// - `NotFound` (404): Resource not found
/// - `InternalServerError` (500): Handler produced no response
/// - `NotImplemented` (501): Upload larger than the configured maximum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 301 Moved Permanently
    MovedPermanently,
    /// 400 Bad Request
    BadRequest,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 500 Internal Server Error
    InternalServerError,
    /// 501 Not Implemented
    NotImplemented,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use nanoserve::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotImplemented.as_u16(), 501);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::MovedPermanently => 301,
            StatusCode::BadRequest => 400,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
            StatusCode::NotImplemented => 501,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::MovedPermanently => "Moved Permanently",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
        }
    }
}

/// Renders the status-line token, e.g. `404 Not Found`.
impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

/// A response produced by a handler.
///
/// Headers keep insertion order. `Content-Type` comes from `mime` and `Date`
/// is filled in by the writer unless the handler set one.
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// Value of the `Content-Type` header, if any
    pub mime: Option<String>,
    /// Additional headers in the order they were added
    pub headers: Vec<(String, String)>,
    /// Body stream; `None` means no body
    pub body: Option<Body>,
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("mime", &self.mime)
            .field("headers", &self.headers)
            .field("body", &self.body.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .mime("text/plain")
///     .header("Cache-Control", "no-cache")
///     .text("hello")
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    mime: Option<String>,
    headers: Vec<(String, String)>,
    body: Option<Body>,
}

impl ResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            mime: None,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Appends a header. Repeated names are all written.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Uses `reader` as the body stream.
    pub fn stream(mut self, reader: impl AsyncRead + Send + 'static) -> Self {
        self.body = Some(Box::pin(reader));
        self
    }

    /// Uses an in-memory buffer as the body.
    pub fn body(self, body: impl Into<Vec<u8>>) -> Self {
        self.stream(Cursor::new(body.into()))
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.body(text.into().into_bytes())
    }

    pub fn build(self) -> Response {
        Response {
            status: self.status,
            mime: self.mime,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    /// A response with an in-memory body of the given MIME type.
    pub fn new(status: StatusCode, mime: &str, body: impl Into<Vec<u8>>) -> Self {
        ResponseBuilder::new(status).mime(mime).body(body).build()
    }

    /// A `text/plain` response.
    pub fn plain(status: StatusCode, text: impl Into<String>) -> Self {
        ResponseBuilder::new(status)
            .mime(crate::http::mime::TEXT_PLAIN)
            .text(text)
            .build()
    }

    pub fn ok(mime: &str, body: impl Into<Vec<u8>>) -> Self {
        Self::new(StatusCode::Ok, mime, body)
    }

    pub fn not_found() -> Self {
        Self::plain(StatusCode::NotFound, "Error 404, file not found.")
    }

    pub fn forbidden(reason: &str) -> Self {
        Self::plain(StatusCode::Forbidden, format!("FORBIDDEN: {reason}"))
    }

    /// Value of the first header named `key`, ignoring case.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.push((key.into(), value.into()));
    }
}
