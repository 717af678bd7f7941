//! Scripted chat model for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{ModelError, Result};
use crate::types::{ChatModel, ChatRequest, ChatResponse};

enum Reply {
    Response(ChatResponse),
    Failure(String),
}

/// A [`ChatModel`] that replays queued replies and records every request.
///
/// When the queue is empty it falls back to the default reply, if one was set
/// with [`with_default_text`](MockChatModel::with_default_text); otherwise the
/// call fails.
#[derive(Default)]
pub struct MockChatModel {
    replies: Mutex<VecDeque<Reply>>,
    default_text: Option<String>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every unscripted call with a single candidate containing `text`.
    pub fn with_default_text(mut self, text: impl Into<String>) -> Self {
        self.default_text = Some(text.into());
        self
    }

    /// Queue a full response.
    pub fn push_response(&self, response: ChatResponse) {
        self.lock_replies().push_back(Reply::Response(response));
    }

    /// Queue a response with one candidate per text.
    pub fn push_texts<I, S>(&self, texts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_response(ChatResponse::from_texts(texts));
    }

    /// Queue a failed call.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.lock_replies().push_back(Reply::Failure(message.into()));
    }

    /// All requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<Reply>> {
        self.replies.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).push(request);

        let next = self.lock_replies().pop_front();
        match next {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Failure(message)) => Err(ModelError::Mock(message)),
            None => match &self.default_text {
                Some(text) => Ok(ChatResponse::from_texts([text.clone()])),
                None => Err(ModelError::Mock("no scripted response left".into())),
            },
        }
    }
}
