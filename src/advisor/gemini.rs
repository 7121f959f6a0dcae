use crate::advisor::TextGenerator;
use crate::error::Res;
use anyhow::{bail, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::trace;

const API: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// A `TextGenerator` backed by the Gemini `generateContent` endpoint.
pub(crate) struct Gemini {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl Gemini {
    pub(crate) fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// The text parts of the first candidate, concatenated. Empty when there are none.
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default()
    }
}

fn request(prompt: &str, thinking: bool) -> GenerateRequest<'_> {
    GenerateRequest {
        contents: vec![Content {
            parts: vec![Part { text: prompt }],
        }],
        generation_config: (!thinking).then(|| GenerationConfig {
            thinking_config: ThinkingConfig { thinking_budget: 0 },
        }),
    }
}

#[async_trait]
impl TextGenerator for Gemini {
    async fn generate(&self, prompt: &str, thinking: bool) -> Res<String> {
        trace!("Calling {} with a {} byte prompt", self.model, prompt.len());
        let url = format!("{API}/{}:generateContent", self.model);
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request(prompt, thinking))
            .send()
            .await
            .context("Unable to reach the Gemini API")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("The Gemini API responded with {status}: {body}");
        }
        let response: GenerateResponse = response
            .json()
            .await
            .context("Unable to parse the Gemini response")?;
        Ok(response.text())
    }
}

#[test]
fn test_request_body() {
    let body = serde_json::to_value(request("hi", false)).unwrap();
    assert_eq!(body["contents"][0]["parts"][0]["text"], "hi");
    assert_eq!(
        body["generationConfig"]["thinkingConfig"]["thinkingBudget"],
        0
    );
    let body = serde_json::to_value(request("hi", true)).unwrap();
    assert!(body.get("generationConfig").is_none());
}

#[test]
fn test_response_text() {
    let json = r#"{
        "candidates": [
            {"content": {"parts": [{"text": "food"}, {"text": "\n"}], "role": "model"}},
            {"content": {"parts": [{"text": "ignored"}]}}
        ]
    }"#;
    let response: GenerateResponse = serde_json::from_str(json).unwrap();
    assert_eq!(response.text(), "food\n");
    let empty: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
    assert_eq!(empty.text(), "");
}
