//! Remote metadata for workshop items.
//!
//! Each mod's item page is fetched once and three independent facts are
//! scraped from it: the title, the most recent posted/updated stamp (used as
//! the freshness token), and the "Required Items" block.
//!
//! The token is the stamp's epoch `data-timestamp` when the page carries one.
//! The rendered date text drops the year for current-year dates and follows
//! the request's timezone, so it is only a fallback.
//!
//! Fetching is best effort. Network and parse failures come back as
//! [`FetchOutcome::Unreachable`] rather than an error; callers decide what to
//! substitute.

use crate::config::SyncConfig;
use crate::error::SyncError;
use async_trait::async_trait;
use modsync_schema::{Dependency, ModId, ModMetadata, UNKNOWN_UPDATE};
use regex::Regex;
use reqwest::Client;
use std::sync::LazyLock;
use thiserror::Error;

static TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<div class="workshopItemTitle">(.*?)</div>"#).expect("valid regex")
});

static STAT_RIGHT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<div class="detailsStatRight"[^>]*>(.*?)</div>"#).expect("valid regex")
});

static DATA_TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-timestamp="(\d+)""#).expect("valid regex"));

static REQUIRED_ITEMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)id="RequiredItems">(.*?)</div>\s*</div>"#).expect("valid regex")
});

static REQUIRED_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)href="[^"]*?id=(\d+)"[^>]*>(.*?)</a>"#).expect("valid regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// Result of a single metadata fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The item page was fetched and parsed.
    Fetched(ModMetadata),
    /// The item page could not be fetched or did not look like an item page.
    Unreachable { id: ModId, reason: String },
}

impl FetchOutcome {
    /// The id this outcome is about.
    pub fn id(&self) -> &ModId {
        match self {
            Self::Fetched(meta) => &meta.id,
            Self::Unreachable { id, .. } => id,
        }
    }

    /// The fetched metadata, if any.
    pub fn metadata(self) -> Option<ModMetadata> {
        match self {
            Self::Fetched(meta) => Some(meta),
            Self::Unreachable { .. } => None,
        }
    }
}

/// Anything that can look up metadata for a mod id.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch metadata for `id`. Never fails; failures are an outcome.
    async fn fetch(&self, id: &ModId) -> FetchOutcome;
}

/// Why an item page could not be turned into metadata.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PageError {
    #[error("page has no workshop item title")]
    MissingTitle,
}

/// Item-page scraper backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct WorkshopClient {
    client: Client,
    item_url: String,
}

impl WorkshopClient {
    /// Build a client with the configured per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Http`] if the HTTP client cannot be constructed.
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(crate::USER_AGENT)
            .build()?;
        Ok(Self::with_client(client, &config.item_url))
    }

    /// Use an existing client against `item_url`.
    pub fn with_client(client: Client, item_url: &str) -> Self {
        Self {
            client,
            item_url: item_url.to_string(),
        }
    }

    async fn fetch_page(&self, id: &ModId) -> Result<String, reqwest::Error> {
        self.client
            .get(&self.item_url)
            .query(&[("id", id.as_str())])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[async_trait]
impl MetadataSource for WorkshopClient {
    async fn fetch(&self, id: &ModId) -> FetchOutcome {
        tracing::debug!("Fetching item page for {id}");
        let page = match self.fetch_page(id).await {
            Ok(page) => page,
            Err(e) => {
                return FetchOutcome::Unreachable {
                    id: id.clone(),
                    reason: e.to_string(),
                };
            }
        };

        match parse_item_page(id, &page) {
            Ok(meta) => FetchOutcome::Fetched(meta),
            Err(e) => FetchOutcome::Unreachable {
                id: id.clone(),
                reason: e.to_string(),
            },
        }
    }
}

/// Scrape metadata out of an item page.
///
/// # Errors
///
/// Returns [`PageError::MissingTitle`] when the page carries no item title,
/// which is what the service serves for unknown or hidden items.
pub fn parse_item_page(id: &ModId, page: &str) -> Result<ModMetadata, PageError> {
    let name = TITLE
        .captures(page)
        .map(|c| unescape_html(c[1].trim()))
        .filter(|n| !n.is_empty())
        .ok_or(PageError::MissingTitle)?;

    let updated = update_token(page);

    let mut dependencies: Vec<Dependency> = Vec::new();
    if let Some(section) = REQUIRED_ITEMS.captures(page) {
        for link in REQUIRED_LINK.captures_iter(&section[1]) {
            let Ok(dep_id) = ModId::parse(&link[1]) else {
                continue;
            };
            if &dep_id == id || dependencies.iter().any(|d| d.id == dep_id) {
                continue;
            }
            let dep_name = unescape_html(TAG.replace_all(&link[2], "").trim());
            dependencies.push(Dependency {
                id: dep_id,
                name: dep_name,
            });
        }
    }

    Ok(ModMetadata {
        id: id.clone(),
        name,
        updated,
        dependencies,
    })
}

/// Freshness token from the stats block.
///
/// Stats read "size, posted[, updated]"; the last one is the freshest. The
/// last epoch stamp wins, then the last rendered date, then unknown.
fn update_token(page: &str) -> String {
    let stats: Vec<regex::Captures<'_>> = STAT_RIGHT.captures_iter(page).collect();

    if let Some(ts) = stats
        .iter()
        .rev()
        .find_map(|c| DATA_TIMESTAMP.captures(&c[0]))
    {
        return ts[1].to_string();
    }

    if stats.len() >= 2 {
        let text = TAG.replace_all(&stats[stats.len() - 1][1], "");
        return unescape_html(text.trim());
    }
    UNKNOWN_UPDATE.to_string()
}

/// Decode the HTML entities that show up in item titles.
fn unescape_html(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail.find(';').filter(|&end| end <= 10).and_then(|end| {
            let entity = &tail[1..end];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, end))
        });

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use std::time::Duration;

    const PAGE: &str = r#"
<html><body>
<div class="workshopItemTitle">CBA &amp; Friends</div>
<div class="detailsStatsContainerRight">
    <div class="detailsStatRight">12.5 MB</div>
    <div class="detailsStatRight">3 Mar, 2016 @ 9:00am</div>
    <div class="detailsStatRight">5 Jan @ 3:12pm</div>
</div>
<div class="requiredItemsContainer" id="RequiredItems">
    <a href="https://steamcommunity.com/workshop/filedetails/?id=450814997" target="_blank">
        <div class="requiredItem">
            CBA_A3
        </div>
    </a>
    <a href="https://steamcommunity.com/workshop/filedetails/?id=463939057" target="_blank">
        <div class="requiredItem">ace &quot;core&quot;</div>
    </a>
</div>
</div>
</body></html>
"#;

    fn id(s: &str) -> ModId {
        ModId::parse(s).unwrap()
    }

    #[test]
    fn test_parse_item_page() {
        let meta = parse_item_page(&id("12345678"), PAGE).unwrap();
        assert_eq!(meta.name, "CBA & Friends");
        assert_eq!(meta.updated, "5 Jan @ 3:12pm");
        assert_eq!(
            meta.dependencies,
            vec![
                Dependency {
                    id: id("450814997"),
                    name: "CBA_A3".into()
                },
                Dependency {
                    id: id("463939057"),
                    name: "ace \"core\"".into()
                },
            ]
        );
    }

    #[test]
    fn test_never_updated_uses_posted_stamp() {
        let page = r#"<div class="workshopItemTitle">Lib</div>
            <div class="detailsStatRight">1 MB</div>
            <div class="detailsStatRight">1 Feb @ 1:00am</div>"#;
        let meta = parse_item_page(&id("12345678"), page).unwrap();
        assert_eq!(meta.updated, "1 Feb @ 1:00am");
        assert!(meta.dependencies.is_empty());
    }

    #[test]
    fn test_epoch_timestamp_is_preferred_over_date_text() {
        let this_year = r#"<div class="workshopItemTitle">Lib</div>
            <div class="detailsStatRight">1 MB</div>
            <div class="detailsStatRight" data-timestamp="1420070400">1 Jan, 2015 @ 12:00am</div>
            <div class="detailsStatRight" data-timestamp="1736089920">5 Jan @ 3:12pm</div>"#;
        let next_year = this_year.replace("5 Jan @ 3:12pm", "5 Jan, 2025 @ 3:12pm");

        let before = parse_item_page(&id("12345678"), this_year).unwrap();
        let after = parse_item_page(&id("12345678"), &next_year).unwrap();
        assert_eq!(before.updated, "1736089920");
        assert_eq!(before.updated, after.updated);
    }

    #[test]
    fn test_nested_timestamp_is_found() {
        let page = r#"<div class="workshopItemTitle">Lib</div>
            <div class="detailsStatRight">1 MB</div>
            <div class="detailsStatRight"><span data-timestamp="1700000000">14 Nov, 2023</span></div>"#;
        let meta = parse_item_page(&id("12345678"), page).unwrap();
        assert_eq!(meta.updated, "1700000000");
    }

    #[test]
    fn test_missing_stats_is_unknown_update() {
        let page = r#"<div class="workshopItemTitle">Lib</div>"#;
        let meta = parse_item_page(&id("12345678"), page).unwrap();
        assert_eq!(meta.updated, UNKNOWN_UPDATE);
    }

    #[test]
    fn test_error_page_is_parse_error() {
        let page = "<html><div class=\"error_ctn\">There was a problem</div></html>";
        assert_eq!(
            parse_item_page(&id("12345678"), page),
            Err(PageError::MissingTitle)
        );
    }

    #[test]
    fn test_unescape_html() {
        assert_eq!(unescape_html("a &amp; b"), "a & b");
        assert_eq!(unescape_html("&#39;x&#x27;"), "'x'");
        assert_eq!(unescape_html("AT&T"), "AT&T");
        assert_eq!(unescape_html("&bogus; &lt;"), "&bogus; <");
    }

    #[tokio::test]
    async fn test_fetch_parses_served_page() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/sharedfiles/filedetails/")
            .match_query(mockito::Matcher::UrlEncoded(
                "id".into(),
                "12345678".into(),
            ))
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(PAGE)
            .create_async()
            .await;

        let client = WorkshopClient::with_client(
            Client::new(),
            &format!("{}/sharedfiles/filedetails/", server.url()),
        );
        let outcome = client.fetch(&id("12345678")).await;

        let meta = outcome.metadata().expect("page should parse");
        assert_eq!(meta.id, id("12345678"));
        assert_eq!(meta.dependencies.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_http_error_is_unreachable() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/sharedfiles/filedetails/")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let client = WorkshopClient::with_client(
            Client::new(),
            &format!("{}/sharedfiles/filedetails/", server.url()),
        );
        let outcome = client.fetch(&id("12345678")).await;

        assert!(matches!(outcome, FetchOutcome::Unreachable { .. }));
        assert_eq!(outcome.id(), &id("12345678"));
    }

    #[tokio::test]
    async fn test_fetch_connection_failure_is_unreachable() {
        let mut config = SyncConfig::new(".");
        // Nothing listens on the discard port.
        config.item_url = "http://127.0.0.1:9/sharedfiles/filedetails/".into();
        config.request_timeout = Duration::from_secs(2);

        let client = WorkshopClient::new(&config).unwrap();
        let outcome = client.fetch(&id("12345678")).await;
        assert!(matches!(outcome, FetchOutcome::Unreachable { .. }));
    }
}
