use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;

use super::{AnalysisBackend, AnalysisPayload, ApiError, ChatReply, ChatRequest, ErrorBody};

pub const BASE_URL_ENV: &str = "LEASEGUARD_API_URL";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

// Analysis runs OCR plus a model pass and can take a while; chat is one
// completion.
const ANALYZE_TIMEOUT: Duration = Duration::from_secs(120);
const CHAT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Service address from the environment, falling back to the local
    /// development default.
    pub fn from_env() -> Self {
        let base_url = std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(&base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn rejection(resp: reqwest::Response) -> ApiError {
        let status = resp.status().as_u16();
        let message = resp.json::<ErrorBody>().await.ok().and_then(|b| b.error);
        ApiError::Api { status, message }
    }
}

#[async_trait]
impl AnalysisBackend for HttpBackend {
    async fn analyze(
        &self,
        file_name: String,
        mime_type: String,
        bytes: Vec<u8>,
    ) -> Result<AnalysisPayload, ApiError> {
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(&mime_type)?;
        let form = Form::new().part("file", part);

        let resp = self
            .client
            .post(format!("{}/analyze", self.base_url))
            .multipart(form)
            .timeout(ANALYZE_TIMEOUT)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::rejection(resp).await);
        }

        Ok(resp.json().await?)
    }

    async fn ask(&self, question: String, context: String) -> Result<String, ApiError> {
        let body = ChatRequest { question, context };

        let resp = self
            .client
            .post(format!("{}/chat", self.base_url))
            .json(&body)
            .timeout(CHAT_TIMEOUT)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::rejection(resp).await);
        }

        let reply: ChatReply = resp.json().await?;
        Ok(reply.answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_loses_trailing_slash() {
        let backend = HttpBackend::new("http://10.0.0.2:5000/");
        assert_eq!(backend.base_url(), "http://10.0.0.2:5000");
    }

    #[test]
    fn base_url_resolution_prefers_env() {
        std::env::remove_var(BASE_URL_ENV);
        assert_eq!(HttpBackend::from_env().base_url(), DEFAULT_BASE_URL);

        std::env::set_var(BASE_URL_ENV, "http://lease-api.internal:8080");
        assert_eq!(
            HttpBackend::from_env().base_url(),
            "http://lease-api.internal:8080"
        );

        std::env::set_var(BASE_URL_ENV, "  ");
        assert_eq!(HttpBackend::from_env().base_url(), DEFAULT_BASE_URL);

        std::env::remove_var(BASE_URL_ENV);
    }
}
