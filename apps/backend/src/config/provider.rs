use std::env;

use crate::error::AppError;

/// Connection settings for the chat-completions decision provider. Absent
/// configuration is not an error; the server falls back to the random
/// provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl ProviderConfig {
    /// Reads `LLM_BASE_URL` / `LLM_API_KEY` / `LLM_MODEL`. Returns `None`
    /// when no base URL is configured.
    pub fn from_env() -> Result<Option<Self>, AppError> {
        let base_url = match env::var("LLM_BASE_URL") {
            Ok(url) if !url.is_empty() => url,
            _ => return Ok(None),
        };
        let api_key = must_var("LLM_API_KEY")?;
        let model = env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        Ok(Some(Self {
            base_url,
            api_key,
            model,
        }))
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

fn must_var(name: &str) -> Result<String, AppError> {
    env::var(name)
        .map_err(|_| AppError::config(format!("Required environment variable '{name}' is not set")))
}

#[cfg(test)]
mod tests {
    use super::ProviderConfig;

    #[test]
    fn completions_url_normalizes_trailing_slash() {
        let cfg = ProviderConfig {
            base_url: "https://api.example.com/v1/".to_string(),
            api_key: "k".to_string(),
            model: "m".to_string(),
        };
        assert_eq!(
            cfg.completions_url(),
            "https://api.example.com/v1/chat/completions"
        );
    }
}
