//! Page rendering.
//!
//! Pages are small enough to build with `format!`. Every piece of
//! publisher-supplied text goes through [`escape`].

use simplepypi_registry::ReleaseRecord;

/// Escape text for use in HTML content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}

/// Percent-encode the one URL-unsafe character valid names may contain.
fn url_segment(name: &str) -> String {
    name.replace(' ', "%20")
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{body}</body>\n</html>\n",
        escape(title)
    )
}

/// `GET /`: every package with a link to its detail page.
pub fn index_page(packages: &[String]) -> String {
    let mut body = String::from("<h1>Packages</h1>\n<ul>\n");
    for package in packages {
        body.push_str(&format!(
            "<li><a href=\"/pypi/{}/\">{}</a></li>\n",
            url_segment(package),
            escape(package)
        ));
    }
    body.push_str("</ul>\n");
    page("Private package index", &body)
}

/// `GET /simple/`: one anchor per package.
pub fn simple_index(packages: &[String]) -> String {
    let mut body = String::new();
    for package in packages {
        body.push_str(&format!(
            "<a href=\"/simple/{}/\">{}</a><br/>\n",
            url_segment(package),
            escape(package)
        ));
    }
    page("Simple index", &body)
}

/// `GET /simple/{package}/`: one download anchor per release, with its digest
/// in the URL fragment.
pub fn simple_package(package: &str, releases: &[ReleaseRecord]) -> String {
    let mut body = format!("<h1>Links for {}</h1>\n", escape(package));
    for release in releases {
        body.push_str(&format!(
            "<a href=\"{}#sha256={}\">{}</a><br/>\n",
            download_href(package, &release.filename),
            escape(&release.checksum),
            escape(&release.filename)
        ));
    }
    page(&format!("Links for {package}"), &body)
}

/// `GET /pypi/{package}/`: human-readable release list.
pub fn package_page(package: &str, releases: &[ReleaseRecord]) -> String {
    let mut body = format!("<h1>{}</h1>\n", escape(package));
    if let Some(latest) = releases.iter().max_by_key(|r| r.created_at) {
        if !latest.summary.is_empty() {
            body.push_str(&format!("<p>{}</p>\n", escape(&latest.summary)));
        }
        if !latest.description.is_empty() {
            body.push_str(&format!("<pre>{}</pre>\n", escape(&latest.description)));
        }
    }

    body.push_str("<table>\n<tr><th>Version</th><th>File</th><th>Author</th><th>Uploaded</th></tr>\n");
    for release in releases {
        let author = if release.author_email.is_empty() {
            escape(&release.author)
        } else {
            format!(
                "{} &lt;{}&gt;",
                escape(&release.author),
                escape(&release.author_email)
            )
        };
        body.push_str(&format!(
            "<tr><td>{}</td><td><a href=\"{}\">{}</a></td><td>{}</td><td>{}</td></tr>\n",
            escape(&release.version),
            download_href(package, &release.filename),
            escape(&release.filename),
            author,
            release.created_at.format("%Y-%m-%d %H:%M UTC")
        ));
    }
    body.push_str("</table>\n");
    page(package, &body)
}

fn download_href(package: &str, filename: &str) -> String {
    format!("/package/{}/{}", url_segment(package), url_segment(filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(version: &str) -> ReleaseRecord {
        let mut record = ReleaseRecord::new("demo", version, format!("demo-{version}.zip"), "abc123");
        record.summary = "Tools & <things>".to_string();
        record.author = "Ada".to_string();
        record.author_email = "ada@example.com".to_string();
        record
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn simple_index_links_packages() {
        let html = simple_index(&["demo".to_string(), "my pkg".to_string()]);
        assert!(html.contains("<a href=\"/simple/demo/\">demo</a>"));
        assert!(html.contains("<a href=\"/simple/my%20pkg/\">my pkg</a>"));
    }

    #[test]
    fn simple_package_links_downloads_with_digest() {
        let html = simple_package("demo", &[release("1.0")]);
        assert!(html.contains("<a href=\"/package/demo/demo-1.0.zip#sha256=abc123\">demo-1.0.zip</a>"));
    }

    #[test]
    fn package_page_escapes_free_text() {
        let html = package_page("demo", &[release("1.0"), release("1.1")]);
        assert!(html.contains("Tools &amp; &lt;things&gt;"));
        assert!(!html.contains("<things>"));
        assert!(html.contains("Ada &lt;ada@example.com&gt;"));
        assert!(html.contains("demo-1.1.zip"));
    }

    #[test]
    fn index_links_detail_pages() {
        let html = index_page(&["demo".to_string()]);
        assert!(html.contains("<a href=\"/pypi/demo/\">demo</a>"));
    }
}
