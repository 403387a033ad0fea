//! File extension to MIME type lookup.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

/// Served when the extension is unknown.
pub const DEFAULT_BINARY: &str = "application/octet-stream";
pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_HTML: &str = "text/html";

const SEED: &[(&str, &str)] = &[
    ("css", "text/css"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("xml", "text/xml"),
    ("txt", "text/plain"),
    ("asc", "text/plain"),
    ("gif", "image/gif"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("mp3", "audio/mpeg"),
    ("m3u", "audio/mpeg-url"),
    ("mp4", "video/mp4"),
    ("ogv", "video/ogg"),
    ("flv", "video/x-flv"),
    ("mov", "video/quicktime"),
    ("swf", "application/x-shockwave-flash"),
    ("js", "application/javascript"),
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    ("ogg", "application/x-ogg"),
    ("zip", "application/octet-stream"),
    ("exe", "application/octet-stream"),
    ("class", "application/octet-stream"),
];

static TABLE: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| SEED.iter().copied().collect());

/// Looks up the MIME type for a bare extension, ignoring case.
pub fn from_extension(ext: &str) -> Option<&'static str> {
    TABLE.get(ext.to_ascii_lowercase().as_str()).copied()
}

/// MIME type for `path`, falling back to [`DEFAULT_BINARY`].
pub fn for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(from_extension)
        .unwrap_or(DEFAULT_BINARY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(from_extension("HTML"), Some("text/html"));
        assert_eq!(from_extension("Jpg"), Some("image/jpeg"));
    }

    #[test]
    fn unknown_extension_is_binary() {
        assert_eq!(for_path(Path::new("archive.tar.xz")), DEFAULT_BINARY);
        assert_eq!(for_path(Path::new("README")), DEFAULT_BINARY);
        assert_eq!(for_path(Path::new("docs/notes.txt")), "text/plain");
    }
}
