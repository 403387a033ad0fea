//! HTML directory listings.

use std::io;
use std::path::Path;

use tokio::fs;

use crate::http::params::encode_path;

struct Entry {
    name: String,
    is_dir: bool,
    size: Option<u64>,
}

/// Renders the listing page for `dir`, which is served at `uri` (ending in `/`).
///
/// Entries are sorted by name. Directories are bold with a trailing `/`;
/// files show their size.
pub async fn render(uri: &str, dir: &Path) -> io::Result<String> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        // Follows symlinks; dangling ones are skipped.
        let Ok(metadata) = fs::metadata(entry.path()).await else {
            continue;
        };
        entries.push(Entry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir: metadata.is_dir(),
            size: metadata.is_file().then(|| metadata.len()),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    let mut html = format!("<html><body><h1>Directory {}</h1><br/>", escape_html(uri));

    if let Some(parent) = parent_uri(uri) {
        html.push_str(&format!(
            "<b><a href=\"{}\">..</a></b><br/>",
            encode_path(parent)
        ));
    }

    for entry in entries {
        let mut name = entry.name;
        if entry.is_dir {
            html.push_str("<b>");
            name.push('/');
        }
        html.push_str(&format!(
            "<a href=\"{}\">{}</a>",
            encode_path(&format!("{uri}{name}")),
            escape_html(&name)
        ));
        if let Some(size) = entry.size {
            html.push_str(&format!(" &nbsp;<font size=2>({})</font>", format_size(size)));
        }
        html.push_str("<br/>");
        if entry.is_dir {
            html.push_str("</b>");
        }
    }

    html.push_str("</body></html>");
    Ok(html)
}

/// `/a/b/` → `/a/`; the root has no parent.
fn parent_uri(uri: &str) -> Option<&str> {
    if uri.len() <= 1 {
        return None;
    }
    let trimmed = &uri[..uri.len() - 1];
    trimmed.rfind('/').map(|slash| &uri[..slash + 1])
}

/// Human readable size with 1024 divisors, e.g. `512 bytes`, `1.51 KB`.
pub fn format_size(len: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if len < KB {
        format!("{len} bytes")
    } else if len < MB {
        format!("{}.{} KB", len / KB, len % KB / 10 % 100)
    } else {
        format!("{}.{} MB", len / MB, len % MB / 10 % 100)
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
