//! Web Search Client
//!
//! Text search used by the stateless-chat adapter's manual research loop.
//! DuckDuckGo's HTML endpoint is scraped with compiled regexes; extraction
//! is kept in pure functions so it can be tested against fixtures without
//! any network access.

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

use super::http_client::build_http_client;
use super::types::{LlmError, LlmResult};

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Result title.
    pub title: String,
    /// Body snippet.
    pub snippet: String,
    /// Source URL.
    pub url: String,
}

/// Text search by query string.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run a text search, returning at most `max_results` hits.
    async fn search(&self, query: &str, max_results: usize) -> LlmResult<Vec<SearchHit>>;
}

/// DuckDuckGo HTML search endpoint
const DDG_HTML_URL: &str = "https://html.duckduckgo.com/html/";

fn result_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<a[^>]*class="result__a"[^>]*href="([^"]+)"[^>]*>(.*?)</a>"#).unwrap()
    })
}

fn result_snippet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?s)<a[^>]*class="result__snippet"[^>]*>(.*?)</a>"#).unwrap())
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

/// Search client backed by DuckDuckGo's HTML endpoint.
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
}

impl DuckDuckGoSearch {
    pub fn new() -> Self {
        Self {
            client: build_http_client(),
        }
    }
}

impl Default for DuckDuckGoSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchClient for DuckDuckGoSearch {
    async fn search(&self, query: &str, max_results: usize) -> LlmResult<Vec<SearchHit>> {
        let response = self
            .client
            .post(DDG_HTML_URL)
            .form(&[("q", query)])
            .send()
            .await
            .map_err(|e| LlmError::SearchError {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| LlmError::SearchError {
            message: e.to_string(),
        })?;

        if status != 200 {
            return Err(LlmError::SearchError {
                message: format!("search returned HTTP {}", status),
            });
        }

        Ok(parse_search_results(&body, max_results))
    }
}

/// Extract result hits from a DuckDuckGo HTML page.
///
/// Links and snippets are paired positionally; the endpoint renders one
/// snippet anchor per result anchor.
pub fn parse_search_results(html: &str, max_results: usize) -> Vec<SearchHit> {
    let snippets: Vec<String> = result_snippet_re()
        .captures_iter(html)
        .map(|caps| clean_fragment(&caps[1]))
        .collect();

    let mut hits = Vec::new();
    for (idx, caps) in result_link_re().captures_iter(html).enumerate() {
        if hits.len() >= max_results {
            break;
        }
        let url = unwrap_redirect(&caps[1]);
        let title = clean_fragment(&caps[2]);
        if title.is_empty() || url.is_empty() {
            continue;
        }
        let snippet = snippets.get(idx).cloned().unwrap_or_default();
        hits.push(SearchHit {
            title,
            snippet,
            url,
        });
    }
    hits
}

/// DuckDuckGo links point at a redirect endpoint carrying the target in the
/// `uddg` query parameter; unwrap it back to the real URL.
fn unwrap_redirect(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };
    if let Ok(url) = url::Url::parse(&absolute) {
        if let Some((_, target)) = url.query_pairs().find(|(key, _)| key == "uddg") {
            return target.into_owned();
        }
    }
    absolute
}

/// Strip markup and decode the entities DuckDuckGo actually emits.
fn clean_fragment(fragment: &str) -> String {
    let stripped = tag_re().replace_all(fragment, "");
    decode_entities(stripped.trim())
}

fn decode_entities(text: &str) -> String {
    // `&amp;` last so already-decoded entities are not decoded twice.
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
<div class="result results_links results_links_deep web-result">
  <h2 class="result__title">
    <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fhr%2Dsaas&amp;rut=abc">German <b>HR SaaS</b> Market</a>
  </h2>
  <a class="result__snippet" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fhr%2Dsaas">The market for <b>HR</b> software &amp; services is growing.</a>
</div>
<div class="result">
  <h2 class="result__title">
    <a rel="nofollow" class="result__a" href="https://example.org/report">Industry Report 2025</a>
  </h2>
  <a class="result__snippet" href="https://example.org/report">Key figures &#x27;at a glance&#x27;.</a>
</div>
"#;

    #[test]
    fn test_parse_results_from_fixture() {
        let hits = parse_search_results(FIXTURE, 3);
        assert_eq!(hits.len(), 2);

        assert_eq!(hits[0].title, "German HR SaaS Market");
        assert_eq!(hits[0].url, "https://example.com/hr-saas");
        assert_eq!(
            hits[0].snippet,
            "The market for HR software & services is growing."
        );

        assert_eq!(hits[1].title, "Industry Report 2025");
        assert_eq!(hits[1].url, "https://example.org/report");
        assert_eq!(hits[1].snippet, "Key figures 'at a glance'.");
    }

    #[test]
    fn test_max_results_cap() {
        let hits = parse_search_results(FIXTURE, 1);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_empty_page_yields_no_hits() {
        assert!(parse_search_results("<html><body></body></html>", 3).is_empty());
    }

    #[test]
    fn test_unwrap_redirect_passthrough() {
        assert_eq!(
            unwrap_redirect("https://example.org/direct"),
            "https://example.org/direct"
        );
    }

    #[test]
    fn test_unwrap_redirect_decodes_uddg() {
        let href = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fa%20b&rut=xyz";
        assert_eq!(unwrap_redirect(href), "https://example.com/a b");
    }

    #[test]
    fn test_entity_decoding_order() {
        // `&amp;lt;` is the literal text "&lt;", not a less-than sign.
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }
}
