//! Chat-completions authenticity scorer.
//!
//! The model is prompted to reply with a JSON object carrying an
//! `authenticity_score`. Replies are often wrapped in Markdown code fences,
//! which are stripped before decoding. A reply that still cannot be decoded
//! scores [`UNPARSEABLE_REPLY_SCORE`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use super::dto::{
    AuthenticityVerdictDto, ChatCompletionRequestDto, ChatCompletionResponseDto, ChatMessageDto,
};
use crate::domain::ports::{AuthenticityRequest, AuthenticityScorer, AuthenticityScorerError};
use crate::domain::AuthenticityScore;

/// Model requested when none is configured.
pub const DEFAULT_SCORER_MODEL: &str = "llama-3.3-70b-versatile";

/// Score given when the model answers without a readable verdict.
pub const UNPARSEABLE_REPLY_SCORE: i64 = 50;

const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 500;

/// Authenticity scorer that calls an OpenAI-compatible chat endpoint.
pub struct HttpAuthenticityScorer {
    client: Client,
    endpoint: Url,
    model: String,
    api_key: Option<String>,
}

impl HttpAuthenticityScorer {
    /// Build a scorer using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            model: model.into(),
            api_key,
        })
    }
}

#[async_trait]
impl AuthenticityScorer for HttpAuthenticityScorer {
    async fn score(
        &self,
        request: &AuthenticityRequest,
    ) -> Result<AuthenticityScore, AuthenticityScorerError> {
        let prompt = build_prompt(request);
        let body = ChatCompletionRequestDto {
            model: &self.model,
            messages: [ChatMessageDto {
                role: "user",
                content: &prompt,
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let mut call = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }
        let response = call
            .send()
            .await
            .map_err(|err| AuthenticityScorerError::transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthenticityScorerError::status(status.as_u16()));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| AuthenticityScorerError::transport(err.to_string()))?;
        parse_reply(bytes.as_ref())
    }
}

fn build_prompt(request: &AuthenticityRequest) -> String {
    let photo = request
        .photo_url
        .as_ref()
        .map_or_else(|| "no photo supplied".to_owned(), Url::to_string);
    format!(
        "Assess whether this {kind} record of a {species} tree is authentic \
         (a real, unedited photo of a tree). Photo: {photo}.\n\
         Respond ONLY with JSON: {{\"authenticity_score\": <0-100>}}",
        kind = request.kind,
        species = request.species,
    )
}

fn parse_reply(body: &[u8]) -> Result<AuthenticityScore, AuthenticityScorerError> {
    let envelope: ChatCompletionResponseDto = serde_json::from_slice(body).map_err(|err| {
        AuthenticityScorerError::decode(format!("invalid chat completion payload: {err}"))
    })?;
    let content = envelope
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| AuthenticityScorerError::decode("chat completion has no reply"))?;

    Ok(score_from_reply(&content))
}

fn score_from_reply(content: &str) -> AuthenticityScore {
    let raw = serde_json::from_str::<AuthenticityVerdictDto>(strip_code_fence(content))
        .map_or(UNPARSEABLE_REPLY_SCORE, |verdict| verdict.authenticity_score);
    AuthenticityScore::clamped(raw)
}

fn strip_code_fence(content: &str) -> &str {
    let fenced = content
        .split_once("```json")
        .or_else(|| content.split_once("```"))
        .map(|(_, rest)| rest.split_once("```").map_or(rest, |(inner, _)| inner));
    fenced.unwrap_or(content).trim()
}
