//! Channel readers.
//!
//! [`TelegramWebReader`] reads public channels through the web preview at
//! `https://t.me/s/<channel>`, which needs no account or session:
//! - Uses reqwest for HTTP requests
//! - Uses scraper for HTML parsing
//! - Pages backwards with `?before=<id>` until `limit` posts are collected
//!
//! Limitations: only channels with the public preview enabled are readable.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use super::models::ChannelPost;

pub const DEFAULT_PREVIEW_BASE: &str = "https://t.me/s";

/// Upper bound on preview pages fetched per channel per call
const MAX_PAGES: usize = 10;

#[async_trait]
pub trait ChannelReader: Send + Sync {
    /// Up to `limit` of the newest posts with non-empty text, oldest first.
    async fn fetch_new_posts(&self, channel: &str, limit: usize) -> Result<Vec<ChannelPost>>;
}

pub struct TelegramWebReader {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramWebReader {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (compatible; event-scout/0.1)")
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_page(&self, channel: &str, before: Option<i64>) -> Result<String> {
        let mut request = self.client.get(format!("{}/{}", self.base_url, channel));
        if let Some(before) = before {
            request = request.query(&[("before", before)]);
        }

        let response = request.send().await.context("HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {} for channel {}", status, channel);
        }

        response.text().await.context("Failed to read response body")
    }
}

#[async_trait]
impl ChannelReader for TelegramWebReader {
    async fn fetch_new_posts(&self, channel: &str, limit: usize) -> Result<Vec<ChannelPost>> {
        let mut collected: BTreeMap<i64, ChannelPost> = BTreeMap::new();
        let mut before: Option<i64> = None;

        for _ in 0..MAX_PAGES {
            let html = self.fetch_page(channel, before).await?;
            let page = parse_preview_page(&html);

            debug!(
                channel,
                posts = page.posts.len(),
                oldest_id = ?page.oldest_id,
                "Parsed channel preview page"
            );

            for post in page.posts {
                collected.insert(post.id, post);
            }

            match page.oldest_id {
                Some(oldest) if collected.len() < limit && before != Some(oldest) && oldest > 1 => {
                    before = Some(oldest);
                }
                _ => break,
            }
        }

        let mut newest: Vec<ChannelPost> = collected.into_values().rev().take(limit).collect();
        newest.reverse();
        Ok(newest)
    }
}

/// Posts found on one preview page.
#[derive(Debug, Default)]
pub struct PreviewPage {
    /// Posts with non-empty text, in page order
    pub posts: Vec<ChannelPost>,
    /// Smallest post id on the page, text or not; the cursor for the next page
    pub oldest_id: Option<i64>,
}

pub fn parse_preview_page(html: &str) -> PreviewPage {
    let document = Html::parse_document(html);

    // Selectors are static strings; a parse failure would be a programming error
    let (Ok(message_sel), Ok(text_sel), Ok(time_sel)) = (
        Selector::parse(".tgme_widget_message[data-post]"),
        Selector::parse(".tgme_widget_message_text.js-message_text"),
        Selector::parse(".tgme_widget_message_date time[datetime]"),
    ) else {
        return PreviewPage::default();
    };

    let mut page = PreviewPage::default();

    for message in document.select(&message_sel) {
        let Some(id) = message
            .value()
            .attr("data-post")
            .and_then(|data| data.rsplit('/').next())
            .and_then(|id| id.parse::<i64>().ok())
        else {
            continue;
        };

        page.oldest_id = Some(page.oldest_id.map_or(id, |current| current.min(id)));

        let text = message
            .select(&text_sel)
            .next()
            .map(element_text)
            .unwrap_or_default();
        if text.is_empty() {
            continue;
        }

        let timestamp = message
            .select(&time_sel)
            .next()
            .and_then(|time| time.value().attr("datetime"))
            .unwrap_or_default()
            .to_string();

        page.posts.push(ChannelPost { id, text, timestamp });
    }

    page
}

/// Visible text of an element with `<br>` turned into newlines.
fn element_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            _ => {}
        }
    }
    out.trim().to_string()
}
