//! Page table and maintenance banner.
//!
//! Pages are pre-built HTML files. The server only maps routes to files and,
//! while maintenance is on, inserts the notice banner.

use std::path::{Path, PathBuf};

/// A public page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub route: &'static str,
    pub file: &'static str,
    /// Listed in sitemap.xml.
    pub indexed: bool,
}

pub const PAGES: &[Page] = &[
    Page { route: "/", file: "index.html", indexed: true },
    Page { route: "/upload", file: "upload.html", indexed: true },
    Page { route: "/pricing", file: "pricing.html", indexed: true },
    Page { route: "/contact", file: "contact.html", indexed: true },
    Page { route: "/policy", file: "policy.html", indexed: true },
    Page { route: "/updates", file: "updates.html", indexed: true },
    Page { route: "/success", file: "success.html", indexed: false },
    Page { route: "/cancel", file: "cancel.html", indexed: false },
];

pub const MAINTENANCE_NOTICE: &str =
    "We\u{2019}re improving things. Some actions may be slow. Thanks for your patience.";

/// Look up the page for a request path. A single trailing slash is ignored.
pub fn find(path: &str) -> Option<&'static Page> {
    let path = if path.len() > 1 { path.trim_end_matches('/') } else { path };
    let path = if path.is_empty() { "/" } else { path };
    PAGES.iter().find(|p| p.route == path)
}

pub fn file_path(pages_dir: &Path, page: &Page) -> PathBuf {
    pages_dir.join(page.file)
}

pub fn banner_html() -> String {
    format!(
        "<div role=\"status\" class=\"maintenance-banner\">{}</div>",
        MAINTENANCE_NOTICE
    )
}

/// Insert the maintenance banner right after the opening `<body>` tag.
/// Documents without a body tag get the banner prepended.
pub fn with_banner(html: &str) -> String {
    let banner = banner_html();
    let lower = html.to_ascii_lowercase();
    let insert_at = lower
        .find("<body")
        .and_then(|start| lower[start..].find('>').map(|end| start + end + 1));

    match insert_at {
        Some(at) => {
            let mut out = String::with_capacity(html.len() + banner.len());
            out.push_str(&html[..at]);
            out.push_str(&banner);
            out.push_str(&html[at..]);
            out
        }
        None => format!("{banner}{html}"),
    }
}
