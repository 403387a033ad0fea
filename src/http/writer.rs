use chrono::{DateTime, Utc};
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::response::{Body, Response};

const HTTP_VERSION: &str = "HTTP/1.0";

/// Body bytes are copied to the socket this many at a time.
pub const CHUNK_SIZE: usize = 2048;

/// RFC 1123 date in GMT, as used by the `Date` header.
pub fn http_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn serialize_head(resp: &Response, now: DateTime<Utc>) -> Vec<u8> {
    let mut buf = Vec::new();

    buf.extend_from_slice(format!("{} {}\r\n", HTTP_VERSION, resp.status).as_bytes());

    if let Some(mime) = &resp.mime {
        buf.extend_from_slice(format!("Content-Type: {}\r\n", mime).as_bytes());
    }

    if resp.header("Date").is_none() {
        buf.extend_from_slice(format!("Date: {}\r\n", http_date(now)).as_bytes());
    }

    for (k, v) in &resp.headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    buf.extend_from_slice(b"\r\n");
    buf
}

/// Frames one response onto a stream: status line, headers, blank line,
/// then the body in [`CHUNK_SIZE`] pieces.
pub struct ResponseWriter {
    head: Vec<u8>,
    body: Option<Body>,
}

impl ResponseWriter {
    pub fn new(response: Response) -> Self {
        Self::at(response, Utc::now())
    }

    /// Like [`ResponseWriter::new`] with a fixed clock for the `Date` header.
    pub fn at(mut response: Response, now: DateTime<Utc>) -> Self {
        Self {
            head: serialize_head(&response, now),
            body: response.body.take(),
        }
    }

    /// Writes the response and returns the number of body bytes sent.
    pub async fn write_to_stream<W>(self, stream: &mut W) -> anyhow::Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        stream.write_all(&self.head).await?;

        let mut sent = 0u64;
        if let Some(mut body) = self.body {
            let mut chunk = [0u8; CHUNK_SIZE];
            loop {
                let n = body.read(&mut chunk).await?;
                if n == 0 {
                    break;
                }
                stream.write_all(&chunk[..n]).await?;
                sent += n as u64;
            }
        }

        stream.flush().await?;
        Ok(sent)
    }
}
