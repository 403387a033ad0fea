//! Static file serving
//!
//! [`FileServer`] is the built-in [`Handler`]: it maps request URIs onto a
//! root directory, serving files (optionally from a `Range` start offset),
//! index pages, redirects and directory listings.

pub mod listing;

use std::collections::HashMap;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::AsyncSeekExt;

use crate::http::handler::Handler;
use crate::http::mime;
use crate::http::request::Request;
use crate::http::response::{Response, ResponseBuilder, StatusCode};

const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// Construction-time settings; never changed afterwards.
#[derive(Debug, Clone)]
pub struct FileServerConfig {
    /// Directory URIs are resolved against
    pub root: PathBuf,
    /// Render an HTML listing for directories without an index file
    pub listing: bool,
}

#[derive(Debug, Clone)]
pub struct FileServer {
    root: PathBuf,
    listing: bool,
}

impl FileServer {
    pub fn new(config: FileServerConfig) -> Self {
        Self {
            root: config.root,
            listing: config.listing,
        }
    }

    /// Answers `uri` from the root directory. Every response carries
    /// `Accept-Ranges: bytes`.
    pub async fn serve_uri(&self, uri: &str, headers: &HashMap<String, String>) -> Response {
        let mut response = match self.resolve(uri, headers).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(uri, error = %e, "Failed to read from document root");
                Response::forbidden("Reading file failed.")
            }
        };
        response.add_header("Accept-Ranges", "bytes");
        response
    }

    async fn resolve(&self, uri: &str, headers: &HashMap<String, String>) -> io::Result<Response> {
        let root_is_dir = fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !root_is_dir {
            return Ok(Response::forbidden("No root directory."));
        }

        let mut uri = uri.trim().replace('\\', "/");
        if let Some(q) = uri.find('?') {
            uri.truncate(q);
        }
        if is_traversal(&uri) {
            return Ok(Response::forbidden("Won't serve ../ for security reasons."));
        }

        let path = self.root.join(uri.trim_start_matches('/'));
        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Response::not_found()),
            Err(e) => return Err(e),
        };

        if !metadata.is_dir() {
            return serve_file(&path, metadata.len(), headers).await;
        }

        if !uri.ends_with('/') {
            return Ok(redirect(&format!("{uri}/")));
        }

        for name in INDEX_FILES {
            let index = path.join(name);
            if let Ok(metadata) = fs::metadata(&index).await {
                if metadata.is_file() {
                    return serve_file(&index, metadata.len(), headers).await;
                }
            }
        }

        if self.listing {
            let html = listing::render(&uri, &path).await?;
            Ok(Response::ok(mime::TEXT_HTML, html))
        } else {
            Ok(Response::forbidden("No directory listing."))
        }
    }
}

impl Handler for FileServer {
    async fn serve(&self, request: &Request) -> Option<Response> {
        Some(self.serve_uri(&request.uri, &request.headers).await)
    }
}

/// Literal check for `..` segments.
///
/// This is a substring test on the decoded URI, not a comparison of
/// canonical paths; symlinks inside the root are followed.
pub fn is_traversal(uri: &str) -> bool {
    uri.starts_with("..") || uri.ends_with("..") || uri.contains("../")
}

/// Start offset of a `Range: bytes=N-...` header. The end of the range is
/// ignored; anything unparsable starts at 0.
pub fn range_start(range: Option<&str>) -> u64 {
    let Some(spec) = range.and_then(|r| r.trim().strip_prefix("bytes=")) else {
        return 0;
    };
    let start = match spec.find('-') {
        Some(minus) => &spec[..minus],
        None => spec,
    };
    start.trim().parse().unwrap_or(0)
}

async fn serve_file(path: &Path, len: u64, headers: &HashMap<String, String>) -> io::Result<Response> {
    let start = range_start(headers.get("range").map(String::as_str)).min(len);

    let mut file = File::open(path).await?;
    file.seek(SeekFrom::Start(start)).await?;

    // Range requests are answered with 200 and a Content-range header.
    Ok(ResponseBuilder::new(StatusCode::Ok)
        .mime(mime::for_path(path))
        .header("Content-length", (len - start).to_string())
        .header(
            "Content-range",
            format!("{}-{}/{}", start, len.saturating_sub(1), len),
        )
        .stream(file)
        .build())
}

fn redirect(location: &str) -> Response {
    ResponseBuilder::new(StatusCode::MovedPermanently)
        .mime(mime::TEXT_HTML)
        .header("Location", location)
        .text(format!(
            "<html><body>Redirected: <a href=\"{0}\">{0}</a></body></html>",
            listing::escape_html(location)
        ))
        .build()
}
