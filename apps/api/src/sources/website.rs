//! Company website fetch — GET the page, keep only the visible text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use scraper::{ElementRef, Html, Node};
use tracing::{debug, instrument};

use super::{FetchError, WebsiteFetcher};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Subtrees that never contribute visible content.
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "noscript", "template", "svg", "head",
];

/// Elements that start a new line in the extracted text.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "main", "aside", "li", "ul", "ol", "tr", "table", "br",
    "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre", "dt", "dd",
];

pub struct HttpWebsiteFetcher {
    client: Client,
}

impl HttpWebsiteFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder()
                .timeout(timeout)
                .user_agent(USER_AGENT)
                .build()?,
        })
    }
}

#[async_trait]
impl WebsiteFetcher for HttpWebsiteFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let url = normalize_url(url)?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let html = response.text().await?;
        let text = html_to_text(&html);
        debug!(html_len = html.len(), text_len = text.len(), "Website fetched");

        if text.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(text)
    }
}

/// Accepts bare domains ("acme.com.au") by assuming https.
pub fn normalize_url(raw: &str) -> Result<Url, FetchError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FetchError::InvalidUrl(raw.to_string()));
    }
    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    Url::parse(&candidate).map_err(|_| FetchError::InvalidUrl(raw.to_string()))
}

/// Visible text of an HTML page: chrome and scripts removed, one line per block,
/// runs of whitespace collapsed, blank lines dropped.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::new();
    collect_visible_text(document.root_element(), &mut raw);

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&text.text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }
                let is_block = BLOCK_TAGS.contains(&name);
                if is_block {
                    out.push('\n');
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_visible_text(child_element, out);
                }
                if is_block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<!DOCTYPE html>
        <html>
          <head><title>Acme</title><style>body { color: red; }</style></head>
          <body>
            <header><a href="/">Home</a></header>
            <nav><ul><li>About</li><li>Contact</li></ul></nav>
            <main>
              <h1>Acme   Consulting</h1>
              <p>We deliver   cloud migrations
                 for government.</p>
              <script>var tracking = "secret";</script>
              <p>ABN 12 345 678 901</p>
            </main>
            <footer>Copyright 2024</footer>
          </body>
        </html>"#;

    #[test]
    fn test_html_to_text_strips_chrome_and_scripts() {
        let text = html_to_text(PAGE);
        assert_eq!(
            text,
            "Acme Consulting\nWe deliver cloud migrations\nfor government.\nABN 12 345 678 901"
        );
        assert!(!text.contains("tracking"));
        assert!(!text.contains("Copyright"));
        assert!(!text.contains("Contact"));
    }

    #[test]
    fn test_normalize_url_adds_scheme() {
        assert_eq!(
            normalize_url("acme.com.au").unwrap().as_str(),
            "https://acme.com.au/"
        );
        assert_eq!(
            normalize_url(" http://acme.test/about ").unwrap().as_str(),
            "http://acme.test/about"
        );
        assert!(matches!(normalize_url("   "), Err(FetchError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_returns_visible_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let fetcher = HttpWebsiteFetcher::new(Duration::from_secs(5)).unwrap();
        let text = fetcher.fetch(&server.uri()).await.unwrap();
        assert!(text.starts_with("Acme Consulting"));
    }

    #[tokio::test]
    async fn test_fetch_surfaces_status_as_typed_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpWebsiteFetcher::new(Duration::from_secs(5)).unwrap();
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(404)));
    }
}
