pub mod google;
pub mod http;

use async_trait::async_trait;
use asistan_core::error::Result;

/// Key/value persistence for OAuth tokens.
/// The brain implements this over its `config` table.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}
