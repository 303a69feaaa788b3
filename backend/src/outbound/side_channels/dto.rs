//! Wire formats for the side-channel endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::ports::AnchorRequest;

/// Chat-completions request body.
#[derive(Debug, Serialize)]
pub(super) struct ChatCompletionRequestDto<'a> {
    pub model: &'a str,
    pub messages: [ChatMessageDto<'a>; 1],
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
pub(super) struct ChatMessageDto<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

/// The subset of a chat-completions response the scorer reads.
#[derive(Debug, Deserialize)]
pub(super) struct ChatCompletionResponseDto {
    pub choices: Vec<ChatChoiceDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatChoiceDto {
    pub message: ChatReplyDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatReplyDto {
    #[serde(default)]
    pub content: Option<String>,
}

/// JSON object the model is asked to reply with.
#[derive(Debug, Deserialize)]
pub(super) struct AuthenticityVerdictDto {
    pub authenticity_score: i64,
}

/// Anchor request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AnchorRequestDto<'a> {
    pub user_id: &'a str,
    pub certification_id: String,
    pub certification_name: &'a str,
    pub points_earned: i64,
    pub tree_count: u64,
}

impl<'a> From<&'a AnchorRequest> for AnchorRequestDto<'a> {
    fn from(request: &'a AnchorRequest) -> Self {
        Self {
            user_id: request.user_id.as_ref(),
            certification_id: request.certification_id.as_uuid().to_string(),
            certification_name: &request.certification_name,
            points_earned: request.points_earned,
            tree_count: request.tree_count,
        }
    }
}

/// Anchor response body. Bridges that queue the write omit the hash.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AnchorResponseDto {
    #[serde(default)]
    pub transaction_hash: Option<String>,
}
