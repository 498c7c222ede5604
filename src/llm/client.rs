use super::prompts::{system_prompt, user_prompt};
use super::{GenerationError, Generator, GeneratorSource};
use crate::config::{LlmConfig, ProviderConfig};
use crate::preprocessing::Methodology;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ChatMessage,
}

/// One provider/model pair behind an OpenAI-compatible `chat/completions` API.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    provider: String,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    max_retries: u32,
    retry_delay: Duration,
}

impl ChatClient {
    pub fn new(
        http: Client,
        provider: &str,
        settings: &ProviderConfig,
        llm: &LlmConfig,
    ) -> Self {
        Self {
            http,
            provider: provider.to_string(),
            endpoint: format!("{}/chat/completions", settings.api_url.trim_end_matches('/')),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            max_tokens: llm.max_tokens,
            temperature: llm.temperature,
            max_retries: llm.max_retries.max(1),
            retry_delay: Duration::from_millis(llm.retry_delay_ms),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends the conversation, retrying transient failures with linear backoff.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, GenerationError> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let mut attempt = 1;
        loop {
            match self.send_once(&body).await {
                Ok(content) => return Ok(content),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempt >= self.max_retries => {
                    return Err(GenerationError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    warn!(
                        provider = %self.provider,
                        attempt,
                        max_retries = self.max_retries,
                        error = %e,
                        "Generation attempt failed"
                    );
                    tokio::time::sleep(self.retry_delay * attempt).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn send_once(&self, body: &ChatRequest<'_>) -> Result<String, GenerationError> {
        let mut request = self.http.post(&self.endpoint).json(body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout
            } else if e.is_connect() {
                GenerationError::Connect
            } else {
                GenerationError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error(status.as_u16(), error_text));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Parse(e.to_string()))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(GenerationError::EmptyResponse)?;
        if choice.message.content.trim().is_empty() {
            return Err(GenerationError::EmptyContent);
        }
        Ok(choice.message.content)
    }
}

fn status_error(status: u16, body: String) -> GenerationError {
    match status {
        401 => GenerationError::Unauthorized,
        403 => GenerationError::Forbidden,
        429 => GenerationError::RateLimited,
        500..=599 => GenerationError::Server { status, body },
        _ => GenerationError::Http { status, body },
    }
}

#[async_trait]
impl Generator for ChatClient {
    #[instrument(skip(self, query, context), fields(provider = %self.provider, model = %self.model))]
    async fn generate(
        &self,
        query: &str,
        context: Option<&str>,
        methodology: Methodology,
    ) -> Result<String, GenerationError> {
        let query = query.trim();
        if query.chars().count() < 3 {
            return Err(GenerationError::InvalidInput(
                "pergunta não pode estar vazia".to_string(),
            ));
        }

        let messages = [
            ChatMessage {
                role: "system".to_string(),
                content: system_prompt(methodology),
            },
            ChatMessage {
                role: "user".to_string(),
                content: user_prompt(methodology, query, context),
            },
        ];
        debug!(methodology = %methodology, "Sending generation request");

        let answer = self.complete(&messages).await?;
        info!(chars = answer.len(), "Generator returned answer");
        Ok(answer.trim().to_string())
    }
}

/// Resolves `(provider, model_id)` overrides against the configured table.
pub struct ProviderRegistry {
    http: Client,
    config: LlmConfig,
}

impl ProviderRegistry {
    pub fn new(config: LlmConfig) -> Result<Self, GenerationError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| GenerationError::Client(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn client(
        &self,
        provider: Option<&str>,
        model_id: Option<&str>,
    ) -> Result<ChatClient, GenerationError> {
        let name = provider
            .filter(|p| !p.is_empty())
            .unwrap_or(&self.config.default_provider);
        let settings = self
            .config
            .providers
            .get(name)
            .ok_or_else(|| GenerationError::UnknownProvider(name.to_string()))?;

        let client = ChatClient::new(self.http.clone(), name, settings, &self.config);
        Ok(match model_id.filter(|m| !m.is_empty()) {
            Some(model) => client.with_model(model),
            None => client,
        })
    }
}

impl GeneratorSource for ProviderRegistry {
    fn resolve(
        &self,
        provider: Option<&str>,
        model_id: Option<&str>,
    ) -> Result<Arc<dyn Generator>, GenerationError> {
        Ok(Arc::new(self.client(provider, model_id)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves `chat/completions`, failing the first `failures` calls with 503.
    async fn fake_backend(failures: usize, reply: &'static str) -> (String, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/v1/chat/completions",
                post(
                    move |State(calls): State<Arc<AtomicUsize>>, Json(body): Json<Value>| async move {
                        let n = calls.fetch_add(1, Ordering::SeqCst);
                        assert_eq!(body["messages"][0]["role"], "system");
                        if n < failures {
                            return Err((StatusCode::SERVICE_UNAVAILABLE, "busy".to_string()));
                        }
                        Ok(Json(json!({
                            "choices": [{"message": {"role": "assistant", "content": reply}}]
                        })))
                    },
                ),
            )
            .with_state(calls.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/v1", addr), calls)
    }

    fn config_for(url: &str) -> LlmConfig {
        let mut config = LlmConfig {
            retry_delay_ms: 1,
            ..LlmConfig::default()
        };
        config.providers.insert(
            "local".to_string(),
            ProviderConfig {
                api_url: url.to_string(),
                api_key: "k".to_string(),
                model: "tiny".to_string(),
            },
        );
        config.default_provider = "local".to_string();
        config
    }

    #[test]
    fn status_codes_map_to_errors() {
        assert!(matches!(status_error(401, String::new()), GenerationError::Unauthorized));
        assert!(matches!(status_error(403, String::new()), GenerationError::Forbidden));
        assert!(matches!(status_error(429, String::new()), GenerationError::RateLimited));
        assert!(matches!(status_error(503, String::new()), GenerationError::Server { status: 503, .. }));
        assert!(matches!(status_error(404, String::new()), GenerationError::Http { status: 404, .. }));
    }

    #[test]
    fn registry_applies_overrides() {
        let registry = ProviderRegistry::new(LlmConfig::default()).unwrap();

        let default = registry.client(None, None).unwrap();
        assert_eq!(default.provider(), "claude");
        assert_eq!(default.endpoint(), "https://api.anthropic.com/v1/chat/completions");

        let openai = registry.client(Some("openai"), Some("gpt-4o-mini")).unwrap();
        assert_eq!(openai.model(), "gpt-4o-mini");

        let err = registry.client(Some("nope"), None).unwrap_err();
        assert!(matches!(err, GenerationError::UnknownProvider(p) if p == "nope"));
    }

    #[tokio::test]
    async fn retries_transient_failures() {
        let (url, calls) = fake_backend(2, "  ## Resposta  ").await;
        let registry = ProviderRegistry::new(config_for(&url)).unwrap();
        let generator = registry.resolve(None, None).unwrap();

        let answer = generator
            .generate("Explique laços", None, Methodology::Default)
            .await
            .unwrap();
        assert_eq!(answer, "## Resposta");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let (url, calls) = fake_backend(10, "never").await;
        let registry = ProviderRegistry::new(config_for(&url)).unwrap();
        let client = registry.client(None, None).unwrap();

        let err = client
            .generate("Explique laços", None, Methodology::Default)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::RetriesExhausted { attempts: 3, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn short_query_is_rejected_before_sending() {
        let registry = ProviderRegistry::new(LlmConfig::default()).unwrap();
        let client = registry.client(None, None).unwrap();
        let err = client.generate(" a ", None, Methodology::Default).await.unwrap_err();
        assert!(err.is_client_error());
    }
}
