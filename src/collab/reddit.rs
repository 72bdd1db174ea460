//! Reddit comment source over the public JSON endpoints (no OAuth):
//! a search for review threads, then the comment listing of each hit.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{CommentSource, RawComment};

const DEFAULT_BASE: &str = "https://www.reddit.com";
/// How many search hits get their comment trees pulled.
const POSTS_PER_QUERY: usize = 5;

pub struct RedditSource {
    http: reqwest::Client,
    base: String,
}

impl RedditSource {
    pub fn new() -> Self {
        Self::with_base(DEFAULT_BASE)
    }

    /// Base override for local stub servers.
    pub fn with_base(base: impl Into<String>) -> Self {
        // Reddit throttles default library user agents hard.
        let http = reqwest::Client::builder()
            .user_agent("review-radar/0.1 (product review aggregator)")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()
            .expect("reqwest client");
        Self {
            http,
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    async fn search_posts(&self, subject: &str, limit: usize) -> anyhow::Result<Vec<PostData>> {
        let url = format!("{}/search.json", self.base);
        let query = format!("{subject} review");
        let listing: Listing<PostData> = self
            .http
            .get(url)
            .query(&[
                ("q", query.as_str()),
                ("sort", "relevance"),
                ("t", "year"),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(listing.data.children.into_iter().map(|c| c.data).collect())
    }

    async fn fetch_comments(&self, post: &PostData) -> anyhow::Result<Vec<RawComment>> {
        let url = format!("{}{}.json", self.base, post.permalink);
        // The comments endpoint returns two listings: [post, comment tree].
        let listings: Vec<serde_json::Value> = self
            .http
            .get(url)
            .query(&[("limit", "50"), ("depth", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let Some(tree) = listings.into_iter().nth(1) else {
            return Ok(Vec::new());
        };
        let tree: Listing<CommentData> = serde_json::from_value(tree)?;

        let now = Utc::now().timestamp() as f64;
        let mut out = Vec::new();
        for child in tree.data.children {
            if child.kind != "t1" {
                continue; // "more" stubs and the like
            }
            let c = child.data;
            let (Some(body), Some(permalink)) = (c.body, c.permalink) else {
                continue;
            };
            if body == "[deleted]" || body == "[removed]" {
                continue;
            }
            // Post age in months; the logistic decay midpoint (60) was tuned
            // for these units.
            let age_months = ((now - post.created_utc).max(0.0)) / (86_400.0 * 30.0);
            out.push(RawComment {
                text: body,
                url: format!("{DEFAULT_BASE}{permalink}"),
                // Commenter karma would need a per-author profile call; we
                // skip that and let the log term stay neutral at 0.
                weight_factors: Some(vec![c.score as f64, post.score as f64, 0.0, age_months]),
            });
        }
        Ok(out)
    }
}

impl Default for RedditSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommentSource for RedditSource {
    async fn fetch(&self, subject: &str, limit: usize) -> anyhow::Result<Vec<RawComment>> {
        let posts = self.search_posts(subject, POSTS_PER_QUERY).await?;
        debug!(subject, posts = posts.len(), "reddit search finished");

        let mut comments = Vec::new();
        for post in posts.iter().take(POSTS_PER_QUERY) {
            match self.fetch_comments(post).await {
                Ok(mut batch) => comments.append(&mut batch),
                // One bad thread must not sink the whole fetch.
                Err(e) => warn!(permalink = %post.permalink, error = %e, "skipping thread"),
            }
            if comments.len() >= limit {
                break;
            }
        }
        comments.truncate(limit);
        debug!(subject, comments = comments.len(), "reddit fetch finished");
        Ok(comments)
    }
}

#[derive(Deserialize)]
struct Listing<T> {
    data: ListingData<T>,
}

#[derive(Deserialize)]
struct ListingData<T> {
    #[serde(default = "Vec::new")]
    children: Vec<Child<T>>,
}

#[derive(Deserialize)]
struct Child<T> {
    #[serde(default)]
    kind: String,
    data: T,
}

#[derive(Deserialize)]
struct PostData {
    permalink: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    created_utc: f64,
}

#[derive(Deserialize)]
struct CommentData {
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    permalink: Option<String>,
    #[serde(default)]
    score: i64,
}
