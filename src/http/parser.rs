use thiserror::Error;

use crate::http::params::{self, DecodeError, Parameters};
use crate::http::response::StatusCode;

/// Failures that end a session before dispatch. Each carries the status and
/// message sent back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("BAD REQUEST: No request")]
    NoRequest,
    #[error("BAD REQUEST: Syntax error. Usage: GET /example/file.html")]
    MissingMethod,
    #[error("BAD REQUEST: Missing URI. Usage: GET /example/file.html")]
    MissingUri,
    #[error("BAD REQUEST: Malformed URI: {0}")]
    MalformedUri(DecodeError),
    #[error("BAD REQUEST: Headers not terminated by a blank line")]
    UnterminatedHeaders,
    #[error("NOT IMPLEMENTED: Upload of {declared} bytes exceeds the {max} byte limit")]
    UploadTooLarge { declared: usize, max: usize },
}

impl ParseError {
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::UploadTooLarge { .. } => StatusCode::NotImplemented,
            _ => StatusCode::BadRequest,
        }
    }
}

/// `METHOD SP URI [SP VERSION]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub raw_uri: String,
    pub version: Option<String>,
}

/// Strips the trailing `\n` and an optional preceding `\r`.
pub fn trim_line_ending(line: &[u8]) -> String {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

pub fn parse_request_line(line: &str) -> Result<RequestLine, ParseError> {
    let mut parts = line.split_whitespace();

    let method = parts.next().ok_or(ParseError::MissingMethod)?;
    let raw_uri = parts.next().ok_or(ParseError::MissingUri)?;
    let version = parts.next();

    Ok(RequestLine {
        method: method.to_string(),
        raw_uri: raw_uri.to_string(),
        version: version.map(str::to_string),
    })
}

/// Splits the raw URI at the first `?`, returning the decoded path and the
/// decoded query parameters.
pub fn decode_uri(raw_uri: &str) -> Result<(String, Parameters), ParseError> {
    let (path, query) = match raw_uri.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (raw_uri, None),
    };

    let uri = params::percent_decode(path).map_err(ParseError::MalformedUri)?;
    let params = match query {
        Some(query) => params::decode(query).map_err(ParseError::MalformedUri)?,
        None => Parameters::new(),
    };

    Ok((uri, params))
}

/// `Name: value` → `("name", "value")`. Lines without a colon yield `None`.
pub fn parse_header_line(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once(':')?;
    Some((key.trim().to_ascii_lowercase(), value.trim().to_string()))
}
