use asistan_core::error::Result;
use asistan_core::types::{ChatRequest, ChatResponse};
use tokio::sync::mpsc;

/// A generative-language backend that answers free-form chat.
pub trait LlmProvider: Send + Sync {
    fn chat(&self, request: ChatRequest) -> impl std::future::Future<Output = Result<ChatResponse>> + Send;

    /// Stream the answer through `tx` as it arrives and return the full response.
    ///
    /// Providers without streaming send the whole answer as one chunk.
    fn chat_stream(
        &self,
        request: ChatRequest,
        tx: mpsc::UnboundedSender<String>,
    ) -> impl std::future::Future<Output = Result<ChatResponse>> + Send {
        async move {
            let response = self.chat(request).await?;
            let _ = tx.send(response.content.clone());
            Ok(response)
        }
    }

    fn name(&self) -> &str;
}
