//! sitemap.xml and robots.txt rendering.

use crate::site::pages::PAGES;

fn trimmed(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

/// Render the sitemap for every indexed page. `lastmod` is a `YYYY-MM-DD` date.
pub fn render_sitemap(base_url: &str, lastmod: &str) -> String {
    let base = trimmed(base_url);
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for page in PAGES.iter().filter(|p| p.indexed) {
        xml.push_str(&format!(
            "  <url>\n    <loc>{}{}</loc>\n    <lastmod>{}</lastmod>\n  </url>\n",
            escape(base),
            page.route,
            lastmod
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}

pub fn render_robots(base_url: &str) -> String {
    format!(
        "User-agent: *\nAllow: /\nSitemap: {}/sitemap.xml\n",
        trimmed(base_url)
    )
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sitemap_lists_indexed_pages() {
        let xml = render_sitemap("https://kaltrium.test/", "2026-10-16");
        for route in ["/", "/upload", "/pricing", "/contact", "/policy", "/updates"] {
            assert!(
                xml.contains(&format!("<loc>https://kaltrium.test{route}</loc>")),
                "missing {route}"
            );
        }
        assert!(!xml.contains("/success"));
        assert!(!xml.contains("/cancel"));
        assert_eq!(xml.matches("<lastmod>2026-10-16</lastmod>").count(), 6);
    }

    #[test]
    fn test_robots() {
        assert_eq!(
            render_robots("http://localhost:3000"),
            "User-agent: *\nAllow: /\nSitemap: http://localhost:3000/sitemap.xml\n"
        );
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("https://a.test/?a=1&b=2"), "https://a.test/?a=1&amp;b=2");
    }
}
