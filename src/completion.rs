//! Completion-service client with model fallback.
//!
//! The completion service is an opaque collaborator: it takes one composed
//! prompt and returns generated text, or a failure we classify as either
//! rate-limited or anything else. The [`FallbackPolicy`] walks an ordered
//! model list: a rate-limited response waits a fixed delay and moves to the
//! next model; any other failure propagates immediately; exhausting the list
//! is the terminal "unavailable" condition for the request.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::CompletionConfig;

/// Failure classification for one completion attempt.
#[derive(Debug)]
pub enum CompletionError {
    /// The service reported rate limiting; the caller may fall back.
    RateLimited(String),
    /// Any other failure; propagated without fallback.
    Service(String),
}

impl std::fmt::Display for CompletionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionError::RateLimited(msg) => write!(f, "rate limited: {}", msg),
            CompletionError::Service(msg) => write!(f, "completion failed: {}", msg),
        }
    }
}

impl std::error::Error for CompletionError {}

/// Trait for completion providers.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider label used in CLI output.
    fn name(&self) -> &str;

    /// Generate a completion for `prompt` with `model`.
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, CompletionError>;
}

/// Ordered model fallback with a fixed inter-attempt delay.
#[derive(Debug, Clone)]
pub struct FallbackPolicy {
    pub models: Vec<String>,
    pub retry_delay: Duration,
}

impl FallbackPolicy {
    pub fn from_config(config: &CompletionConfig) -> Self {
        Self {
            models: config.models.clone(),
            retry_delay: Duration::from_secs(config.retry_delay_secs),
        }
    }
}

/// Walk the policy's model list until one attempt succeeds.
///
/// Returns the generated text and the model that produced it.
pub async fn complete_with_fallback(
    provider: &dyn CompletionProvider,
    policy: &FallbackPolicy,
    prompt: &str,
) -> Result<(String, String)> {
    if policy.models.is_empty() {
        bail!("completion fallback policy has no models");
    }

    for (attempt, model) in policy.models.iter().enumerate() {
        if attempt > 0 && !policy.retry_delay.is_zero() {
            tokio::time::sleep(policy.retry_delay).await;
        }

        match provider.complete(model, prompt).await {
            Ok(text) => return Ok((text, model.clone())),
            Err(CompletionError::RateLimited(msg)) => {
                eprintln!("model {} rate limited: {}", model, msg);
                continue;
            }
            Err(CompletionError::Service(msg)) => {
                bail!("completion failed on model {}: {}", model, msg);
            }
        }
    }

    bail!("completion service unavailable, retry later");
}

// ============ OpenAI-compatible provider ============

/// Completion provider for any OpenAI-compatible chat completions API.
pub struct OpenAiCompatProvider {
    api_base: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key environment variable named in the
    /// config is not set.
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| anyhow::anyhow!("{} environment variable not set", config.api_key_env))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }
}

/// Map an HTTP status to the fallback classification. 429 is the rate-limit
/// signal; everything else non-success propagates.
fn classify_status(status: u16, body: String) -> CompletionError {
    if status == 429 {
        CompletionError::RateLimited(body)
    } else {
        CompletionError::Service(format!("HTTP {}: {}", status, body))
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn complete(&self, model: &str, prompt: &str) -> Result<String, CompletionError> {
        let body = serde_json::json!({
            "model": model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Service(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), text));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| CompletionError::Service(e.to_string()))?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                CompletionError::Service("malformed completion response: missing content".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted provider: each call consumes the next outcome.
    struct ScriptedProvider {
        outcomes: Vec<Result<String, CompletionError>>,
        calls: AtomicUsize,
        seen_models: std::sync::Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(outcomes: Vec<Result<String, CompletionError>>) -> Self {
            Self {
                outcomes,
                calls: AtomicUsize::new(0),
                seen_models: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, model: &str, _prompt: &str) -> Result<String, CompletionError> {
            self.seen_models.lock().unwrap().push(model.to_string());
            let i = self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcomes[i] {
                Ok(s) => Ok(s.clone()),
                Err(CompletionError::RateLimited(m)) => {
                    Err(CompletionError::RateLimited(m.clone()))
                }
                Err(CompletionError::Service(m)) => Err(CompletionError::Service(m.clone())),
            }
        }
    }

    fn policy(models: &[&str]) -> FallbackPolicy {
        FallbackPolicy {
            models: models.iter().map(|m| m.to_string()).collect(),
            retry_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn first_model_success_is_returned() {
        let provider = ScriptedProvider::new(vec![Ok("answer".to_string())]);
        let (text, model) = complete_with_fallback(&provider, &policy(&["m1", "m2"]), "q")
            .await
            .unwrap();
        assert_eq!(text, "answer");
        assert_eq!(model, "m1");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rate_limit_falls_back_to_next_model() {
        let provider = ScriptedProvider::new(vec![
            Err(CompletionError::RateLimited("slow down".to_string())),
            Ok("answer".to_string()),
        ]);
        let (text, model) = complete_with_fallback(&provider, &policy(&["m1", "m2"]), "q")
            .await
            .unwrap();
        assert_eq!(text, "answer");
        assert_eq!(model, "m2");
        assert_eq!(
            *provider.seen_models.lock().unwrap(),
            vec!["m1".to_string(), "m2".to_string()]
        );
    }

    #[tokio::test]
    async fn non_rate_limit_failure_propagates_immediately() {
        let provider = ScriptedProvider::new(vec![Err(CompletionError::Service(
            "bad key".to_string(),
        ))]);
        let err = complete_with_fallback(&provider, &policy(&["m1", "m2"]), "q")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("bad key"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausting_all_models_is_terminal_unavailability() {
        let provider = ScriptedProvider::new(vec![
            Err(CompletionError::RateLimited("1".to_string())),
            Err(CompletionError::RateLimited("2".to_string())),
            Err(CompletionError::RateLimited("3".to_string())),
        ]);
        let err = complete_with_fallback(&provider, &policy(&["m1", "m2", "m3"]), "q")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unavailable"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn empty_policy_is_rejected() {
        let provider = ScriptedProvider::new(vec![]);
        assert!(complete_with_fallback(&provider, &policy(&[]), "q")
            .await
            .is_err());
    }

    #[test]
    fn status_classification() {
        assert!(matches!(
            classify_status(429, String::new()),
            CompletionError::RateLimited(_)
        ));
        assert!(matches!(
            classify_status(500, String::new()),
            CompletionError::Service(_)
        ));
        assert!(matches!(
            classify_status(401, String::new()),
            CompletionError::Service(_)
        ));
    }
}
