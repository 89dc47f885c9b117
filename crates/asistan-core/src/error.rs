use thiserror::Error;

#[derive(Debug, Error)]
pub enum AsistanError {
    #[error("telegram error: {0}")]
    Telegram(String),
    #[error("llm error ({provider}): {message}")]
    Llm { provider: String, message: String },
    #[error("database error: {0}")]
    Database(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("http error ({status}): {body}")]
    Http { status: u16, body: String },
    #[error("integration error: {0}")]
    Integration(String),
}

pub type Result<T> = std::result::Result<T, AsistanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AsistanError::Llm {
            provider: "gemini".to_string(),
            message: "quota".to_string(),
        };
        assert_eq!(err.to_string(), "llm error (gemini): quota");

        let err = AsistanError::Http {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert!(err.to_string().contains("503"));

        let err = AsistanError::Database("locked".to_string());
        assert!(err.to_string().starts_with("database error"));
    }
}
