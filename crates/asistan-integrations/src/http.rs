use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use asistan_core::error::{AsistanError, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::google::GoogleAuth;

#[derive(Deserialize)]
pub struct OAuthCallback {
    code: Option<String>,
    error: Option<String>,
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html><meta charset=\"utf-8\"><h1>{}</h1><p>{}</p>",
        html_escape(title),
        html_escape(body),
    ))
}

async fn oauth_callback(
    State(auth): State<Arc<GoogleAuth>>,
    Query(params): Query<OAuthCallback>,
) -> Html<String> {
    if let Some(error) = params.error {
        warn!(%error, "[oauth] authorization denied");
        return page("Yetkilendirme başarısız", &error);
    }

    let Some(code) = params.code else {
        return page("Hata", "Yetkilendirme kodu alınamadı.");
    };

    match auth.exchange_code(&code).await {
        Ok(()) => page(
            "Bağlandı!",
            "Google Takvim asistana bağlandı. Bu sekmeyi kapatabilirsiniz.",
        ),
        Err(e) => {
            warn!(error = %e, "[oauth] code exchange failed");
            page("Hata", "Bağlantı kurulamadı, lütfen tekrar deneyin.")
        }
    }
}

pub fn router(auth: Arc<GoogleAuth>) -> Router {
    Router::new()
        .route("/oauth/callback", get(oauth_callback))
        .with_state(auth)
}

/// Serve the OAuth callback until the process exits.
pub async fn start_oauth_server(port: u16, auth: Arc<GoogleAuth>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| AsistanError::Integration(format!("failed to bind port {port}: {e}")))?;

    info!(port, "[oauth] callback server listening");
    axum::serve(listener, router(auth))
        .await
        .map_err(|e| AsistanError::Integration(format!("oauth server error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryTokenStore;

    async fn serve() -> String {
        let auth = Arc::new(GoogleAuth::new(
            "client".to_string(),
            "secret".to_string(),
            "http://localhost/oauth/callback".to_string(),
            Arc::new(MemoryTokenStore::default()),
        ));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(auth)).await.ok();
        });
        format!("http://{addr}/oauth/callback")
    }

    #[test]
    fn test_page_escapes_markup() {
        let Html(body) = page("<b>", "a & \"b\" <script>");
        assert!(body.contains("<h1>&lt;b&gt;</h1>"));
        assert!(body.contains("<p>a &amp; &quot;b&quot; &lt;script&gt;</p>"));
    }

    #[tokio::test]
    async fn test_error_param_is_not_reflected_as_html() {
        let url = serve().await;
        let body = reqwest::Client::new()
            .get(&url)
            .query(&[("error", "<script>alert(1)</script>")])
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();

        assert!(!body.contains("<script>"));
        assert!(body.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[tokio::test]
    async fn test_missing_code() {
        let body = reqwest::get(serve().await).await.unwrap().text().await.unwrap();
        assert!(body.contains("Yetkilendirme kodu alınamadı."));
    }
}
