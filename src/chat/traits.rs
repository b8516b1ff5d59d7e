use async_trait::async_trait;

use crate::error::EvalError;

use super::message::ChatMessage;

pub trait ChatResponse: std::fmt::Debug + Send + Sync {
    fn text(&self) -> Option<String>;
}

impl ChatResponse for String {
    fn text(&self) -> Option<String> {
        Some(self.clone())
    }
}

/// Chat model used by judge metrics.
#[async_trait]
pub trait ChatProvider: Sync + Send {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, EvalError>;

    /// Sends `messages` and returns the reply text.
    async fn chat_text(&self, messages: &[ChatMessage]) -> Result<String, EvalError> {
        let response = self.chat(messages).await?;
        response
            .text()
            .ok_or_else(|| EvalError::Provider("no text in chat response".into()))
    }
}
