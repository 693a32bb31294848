//! Generation client for the Google Generative Language API.
//!
//! One call is one `generateContent` round trip: no retries, no streaming.

use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Remote text generation: send a prompt, receive text, or fail.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generates text for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredential`] before any network activity if no
    /// credential is available, and [`Error::Generation`] for any remote failure.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Where the API key comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Read the named environment variable at call time
    Env(String),
    /// Use a fixed key
    Fixed(String),
}

impl CredentialSource {
    /// Resolves the key; absent or empty keys are a configuration error.
    fn resolve(&self) -> Result<String> {
        match self {
            Self::Env(var) => std::env::var(var)
                .ok()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| Error::missing_credential(var)),
            Self::Fixed(key) if key.trim().is_empty() => {
                Err(Error::missing_credential("API key"))
            }
            Self::Fixed(key) => Ok(key.clone()),
        }
    }
}

impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Env(var) => f.debug_tuple("Env").field(var).finish(),
            Self::Fixed(_) => f.debug_tuple("Fixed").field(&"[REDACTED]").finish(),
        }
    }
}

/// HTTP client for Gemini models.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    url: String,
    credential: CredentialSource,
}

impl GeminiClient {
    /// Creates a client from configuration, reading the key from `config.api_key_var`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_credential(config, CredentialSource::Env(config.api_key_var.clone()))
    }

    /// Creates a client with an explicit credential source.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn with_credential(config: &Config, credential: CredentialSource) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.generate_url(),
            credential,
        })
    }

    async fn send(&self, api_key: &str, prompt: &str) -> std::result::Result<String, String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&self.url)
            .header(API_KEY_HEADER, api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("HTTP request failed: {e}"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read response body: {e}"))?;

        if !status.is_success() {
            let message = extract_error_message(&body).unwrap_or(body);
            return Err(format!("status {}: {}", status.as_u16(), message));
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| format!("Failed to parse response: {e}"))?;

        parsed
            .text()
            .ok_or_else(|| "response contained no text".to_string())
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self.credential.resolve()?;

        debug!("Sending {} byte prompt to {}", prompt.len(), self.url);

        self.send(&api_key, prompt).await.map_err(|cause| {
            error!("Error generating documentation: {}", cause);
            Error::Generation
        })
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok()?;
    parsed
        .get("error")
        .and_then(|error| error.get("message"))
        .and_then(|message| message.as_str())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn config_for(server: &mockito::Server) -> Config {
        Config::builder()
            .endpoint(format!("{}/v1beta", server.url()))
            .model("gemini-test")
            .build()
            .unwrap()
    }

    const PATH: &str = "/v1beta/models/gemini-test:generateContent";

    #[tokio::test]
    async fn test_generate_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .match_header(API_KEY_HEADER, "secret")
            .match_body(Matcher::Json(serde_json::json!({
                "contents": [{ "parts": [{ "text": "document this" }] }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r##"{"candidates":[{"content":{"parts":[{"text":"# Title\n"},{"text":"Body"}],"role":"model"}}]}"##,
            )
            .create_async()
            .await;

        let client = GeminiClient::with_credential(
            &config_for(&server),
            CredentialSource::Fixed("secret".to_string()),
        )
        .unwrap();

        let text = client.generate("document this").await.unwrap();
        assert_eq!(text, "# Title\nBody");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .expect(0)
            .create_async()
            .await;

        let client = GeminiClient::with_credential(
            &config_for(&server),
            CredentialSource::Env("LLM_DOCGEN_TEST_UNSET_KEY_3F9A".to_string()),
        )
        .unwrap();

        let err = client.generate("prompt").await.unwrap_err();
        assert!(err.is_config());
        assert_eq!(
            err.to_string(),
            "LLM_DOCGEN_TEST_UNSET_KEY_3F9A environment variable not set."
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_generic() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .with_status(400)
            .with_body(r#"{"error":{"code":400,"message":"API key not valid"}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = GeminiClient::with_credential(
            &config_for(&server),
            CredentialSource::Fixed("bad".to_string()),
        )
        .unwrap();

        let err = client.generate("prompt").await.unwrap_err();
        assert!(matches!(err, Error::Generation));
        assert!(!err.to_string().contains("API key not valid"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_response_without_text_fails() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(r#"{"candidates":[],"promptFeedback":{"blockReason":"SAFETY"}}"#)
            .create_async()
            .await;

        let client = GeminiClient::with_credential(
            &config_for(&server),
            CredentialSource::Fixed("key".to_string()),
        )
        .unwrap();

        assert!(matches!(
            client.generate("prompt").await,
            Err(Error::Generation)
        ));
    }

    #[tokio::test]
    async fn test_malformed_body_fails() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_body("<html>proxy error</html>")
            .create_async()
            .await;

        let client = GeminiClient::with_credential(
            &config_for(&server),
            CredentialSource::Fixed("key".to_string()),
        )
        .unwrap();

        assert!(matches!(
            client.generate("prompt").await,
            Err(Error::Generation)
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let source = CredentialSource::Fixed("super-secret".to_string());
        let rendered = format!("{source:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn test_empty_fixed_key_is_missing() {
        let err = CredentialSource::Fixed(String::new()).resolve().unwrap_err();
        assert!(matches!(err, Error::MissingCredential { .. }));
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(
            extract_error_message(r#"{"error":{"message":"quota"}}"#),
            Some("quota".to_string())
        );
        assert_eq!(extract_error_message("plain text"), None);
    }
}
