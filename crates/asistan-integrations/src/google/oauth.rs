use std::sync::Arc;

use asistan_core::error::{AsistanError, Result};
use asistan_core::time::now_unix;
use reqwest::Url;
use serde::Deserialize;
use tracing::info;

use crate::TokenStore;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar.events";

const ACCESS_TOKEN_KEY: &str = "google_access_token";
const REFRESH_TOKEN_KEY: &str = "google_refresh_token";
const EXPIRY_KEY: &str = "google_token_expiry";

/// Refresh this many seconds before the token actually expires.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
    refresh_token: Option<String>,
}

fn default_expires_in() -> i64 {
    3600
}

/// Google OAuth tokens (access + refresh), persisted through a [`TokenStore`].
pub struct GoogleAuth {
    client_id: String,
    client_secret: String,
    callback_url: String,
    store: Arc<dyn TokenStore>,
    http: reqwest::Client,
}

impl GoogleAuth {
    pub fn new(
        client_id: String,
        client_secret: String,
        callback_url: String,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            callback_url,
            store,
            http: reqwest::Client::new(),
        }
    }

    /// Consent page the user opens to connect their calendar.
    pub fn auth_url(&self) -> String {
        Url::parse_with_params(
            AUTH_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.callback_url.as_str()),
                ("response_type", "code"),
                ("scope", CALENDAR_SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map(String::from)
        .unwrap_or_else(|_| AUTH_URL.to_string())
    }

    /// Exchange the authorization code from the callback for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<()> {
        let tokens = self
            .token_request(&[
                ("code", code),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
                ("redirect_uri", &self.callback_url),
                ("grant_type", "authorization_code"),
            ])
            .await?;

        self.save(&tokens).await?;
        if let Some(refresh) = &tokens.refresh_token {
            self.store.set(REFRESH_TOKEN_KEY, refresh).await?;
        }
        info!("[google] account connected");
        Ok(())
    }

    /// A valid access token, refreshed when close to expiry.
    pub async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.cached_token().await? {
            return Ok(token);
        }
        self.refresh().await
    }

    async fn cached_token(&self) -> Result<Option<String>> {
        let Some(token) = self.store.get(ACCESS_TOKEN_KEY).await? else {
            return Ok(None);
        };
        let expiry = self
            .store
            .get(EXPIRY_KEY)
            .await?
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0);

        Ok((now_unix() < expiry - EXPIRY_MARGIN_SECS).then_some(token))
    }

    async fn refresh(&self) -> Result<String> {
        let refresh_token = self.store.get(REFRESH_TOKEN_KEY).await?.ok_or_else(|| {
            AsistanError::Integration("google account not connected".to_string())
        })?;

        let tokens = self
            .token_request(&[
                ("refresh_token", refresh_token.as_str()),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
                ("grant_type", "refresh_token"),
            ])
            .await?;

        self.save(&tokens).await?;
        Ok(tokens.access_token)
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let resp = self
            .http
            .post(TOKEN_URL)
            .form(params)
            .send()
            .await
            .map_err(|e| AsistanError::Integration(format!("google token request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| AsistanError::Integration(format!("google token read failed: {e}")))?;

        if !status.is_success() {
            return Err(AsistanError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| AsistanError::Integration(format!("google token parse failed: {e}")))
    }

    async fn save(&self, tokens: &TokenResponse) -> Result<()> {
        let expiry = now_unix() + tokens.expires_in;
        self.store.set(ACCESS_TOKEN_KEY, &tokens.access_token).await?;
        self.store.set(EXPIRY_KEY, &expiry.to_string()).await
    }

    /// Connected means a refresh token has been stored.
    pub async fn is_connected(&self) -> bool {
        matches!(self.store.get(REFRESH_TOKEN_KEY).await, Ok(Some(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryTokenStore;

    fn auth(store: Arc<MemoryTokenStore>) -> GoogleAuth {
        GoogleAuth::new(
            "client id".to_string(),
            "secret".to_string(),
            "http://localhost:8080/oauth/callback".to_string(),
            store,
        )
    }

    #[test]
    fn test_auth_url_encodes_params() {
        let url = auth(Arc::new(MemoryTokenStore::default())).auth_url();
        assert!(url.starts_with(AUTH_URL));
        assert!(url.contains("client_id=client+id"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Foauth%2Fcallback"));
        assert!(url.contains("access_type=offline"));
    }

    #[tokio::test]
    async fn test_cached_token_used_until_margin() {
        let store = Arc::new(MemoryTokenStore::default());
        store.set(ACCESS_TOKEN_KEY, "cached").await.unwrap();
        store
            .set(EXPIRY_KEY, &(now_unix() + 600).to_string())
            .await
            .unwrap();
        let auth = auth(store.clone());
        assert_eq!(auth.access_token().await.unwrap(), "cached");

        store
            .set(EXPIRY_KEY, &(now_unix() + 30).to_string())
            .await
            .unwrap();
        assert!(auth.cached_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_not_connected_without_refresh_token() {
        let store = Arc::new(MemoryTokenStore::default());
        let auth = auth(store.clone());
        assert!(!auth.is_connected().await);
        let err = auth.access_token().await.unwrap_err();
        assert!(matches!(err, AsistanError::Integration(_)));

        store.set(REFRESH_TOKEN_KEY, "r").await.unwrap();
        assert!(auth.is_connected().await);
    }
}
