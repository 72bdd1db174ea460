//! OpenAI-compatible chat client implementing the classifier and summarizer
//! collaborators. One small hand-rolled request/response shape, shared by
//! every prompt; no SDK crate needed beyond reqwest/serde.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::parse::{parse_ratings, strip_code_fences};
use super::{Classifier, ClassifierRatings, ProsCons, Summarizer, NOT_A_PRODUCT_MARKER};
use crate::config::LlmConfig;

pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(cfg: &LlmConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("review-radar/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("reqwest client");
        Self {
            http,
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
        }
    }

    /// Single-prompt chat completion; returns the first choice's content.
    async fn chat(&self, prompt: &str, max_tokens: u32) -> anyhow::Result<String> {
        if self.api_key.is_empty() {
            anyhow::bail!("no API key configured for the LLM collaborator");
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            max_completion_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: Option<String>,
        }

        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            max_completion_tokens: max_tokens,
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?
            .error_for_status()?;

        let body: Resp = resp.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            anyhow::bail!("LLM returned empty content");
        }
        Ok(content)
    }
}

#[async_trait]
impl Classifier for OpenAiClient {
    async fn rate_comments(&self, texts: &[String]) -> anyhow::Result<ClassifierRatings> {
        let reviews = serde_json::to_string(texts)?;
        let prompt = format!(
            "Given is a JSON list of Reddit comments reviewing a product. \
             Analyze each review and rate it from 0-5 for: quality, cost, \
             availability, utility, credibility. If the review doesn't relate \
             to a metric, rate it -1. If it's not related to any of the \
             metrics, rate its credibility -1.\n\n\
             Return ONLY a JSON object mapping each review's 0-based position \
             in the input list to its ratings, like:\n\
             {{\"0\": [quality, cost, availability, utility, credibility], \
             \"1\": [...]}}\n\n\
             Reviews: {reviews}"
        );
        let raw = self.chat(&prompt, 5000).await?;
        match parse_ratings(&raw) {
            Ok(ratings) => {
                debug!(rated = ratings.len(), sent = texts.len(), "classifier batch rated");
                Ok(ratings)
            }
            Err(e) => {
                warn!(error = %e, "classifier output unparsable, treating as empty");
                Ok(ClassifierRatings::empty())
            }
        }
    }

    async fn extract_pros_cons(&self, texts: &[String]) -> anyhow::Result<ProsCons> {
        let reviews = serde_json::to_string(texts)?;
        let prompt = format!(
            "Given is a JSON list of Reddit comments reviewing a product. \
             Extract the most important pros and cons a potential buyer should \
             know, each phrased as a short bullet. For each one, include the \
             0-based index of the comment it came from.\n\n\
             Reply ONLY in strict JSON using this schema:\n\
             {{\"pros\": [{{\"text\": \"...\", \"comment_index\": 0}}], \
             \"cons\": [{{\"text\": \"...\", \"comment_index\": 0}}]}}\n\n\
             Reviews: {reviews}"
        );
        let raw = self.chat(&prompt, 2000).await?;
        match serde_json::from_str::<ProsCons>(strip_code_fences(&raw)) {
            Ok(pc) => Ok(pc),
            Err(e) => {
                warn!(error = %e, "pros/cons output unparsable, treating as empty");
                Ok(ProsCons::default())
            }
        }
    }
}

#[async_trait]
impl Summarizer for OpenAiClient {
    async fn summarize_reviews(&self, texts: &[String]) -> anyhow::Result<String> {
        let reviews = serde_json::to_string(texts)?;
        let prompt = format!(
            "Given is a list of 5 Reddit comments reviewing a product, \
             give a quick summary for a potential buyer.\n\
             Reviews: {reviews}"
        );
        self.chat(&prompt, 5000).await
    }

    async fn describe_subject(&self, subject: &str) -> anyhow::Result<String> {
        let prompt = format!(
            "No user reviews were found for \"{subject}\". If it is a \
             purchasable consumer product, write a short buyer-oriented \
             overview of its strengths and weaknesses based on general \
             knowledge. If it is NOT a reviewable product (a person, a place, \
             an abstract concept, ...), reply with the exact word \
             {NOT_A_PRODUCT_MARKER} and nothing else."
        );
        self.chat(&prompt, 2000).await
    }

    async fn similar_products(&self, subject: &str) -> anyhow::Result<Vec<String>> {
        let prompt = format!(
            "You are a helpful retail assistant. The user is considering the \
             product \"{subject}\". Recommend exactly three similar consumer \
             products that they might also like.\n\
             Reply ONLY in strict JSON using this schema:\n\
             {{\"similar_products\": [\"name 1\", \"name 2\", \"name 3\"]}}"
        );
        let raw = self.chat(&prompt, 1000).await?;
        Ok(parse_similar_products(&raw))
    }
}

#[derive(Deserialize)]
struct SimilarPayload {
    similar_products: Vec<String>,
}

/// Parse the similar-products reply, aiming for the JSON schema but falling
/// back to line splitting when the model ignores the instruction.
fn parse_similar_products(raw: &str) -> Vec<String> {
    let cleaned = strip_code_fences(raw);
    if let Ok(payload) = serde_json::from_str::<SimilarPayload>(cleaned) {
        return payload
            .similar_products
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .take(3)
            .collect();
    }
    cleaned
        .lines()
        .map(|line| line.trim_start_matches(['-', '*', ' ']).trim().to_string())
        .filter(|line| !line.is_empty())
        .take(3)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similar_products_prefers_json_schema() {
        let raw = r#"{"similar_products": ["iPad Air", "Galaxy Tab S9", "Surface Go"]}"#;
        assert_eq!(
            parse_similar_products(raw),
            vec!["iPad Air", "Galaxy Tab S9", "Surface Go"]
        );
    }

    #[test]
    fn similar_products_falls_back_to_lines() {
        let raw = "- iPad Air\n- Galaxy Tab S9\n- Surface Go\n- Extra one";
        let parsed = parse_similar_products(raw);
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0], "iPad Air");
    }

    #[test]
    fn similar_products_handles_fenced_json() {
        let raw = "```json\n{\"similar_products\": [\" Kindle \"]}\n```";
        assert_eq!(parse_similar_products(raw), vec!["Kindle"]);
    }
}
