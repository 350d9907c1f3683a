//! Request and response types exchanged with governor callers.

// Author: kelexine (https://github.com/kelexine)

use crate::error::{GovernorError, Result};
use crate::limiter::LimiterStats;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::time::Duration;

/// One assist request as submitted by an application handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistRequest {
    /// Preferred provider; the best configured one is used when omitted.
    #[serde(default)]
    pub provider: Option<String>,

    /// Provider-bound request body: `model` + ordered `messages`, or
    /// `prompt` + optional `context` and `language`. Also the cache fingerprint input.
    pub descriptor: Value,

    /// Degrade to other providers and finally a local response instead of failing.
    #[serde(default)]
    pub allow_fallback: bool,
}

impl AssistRequest {
    pub fn new(descriptor: Value) -> Self {
        Self {
            provider: None,
            descriptor,
            allow_fallback: false,
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_fallback(mut self) -> Self {
        self.allow_fallback = true;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let object = self
            .descriptor
            .as_object()
            .ok_or_else(|| GovernorError::InvalidRequest("descriptor must be a JSON object".to_string()))?;

        let has_prompt = object.get("prompt").map_or(false, Value::is_string);
        let has_messages = object.get("messages").map_or(false, Value::is_array);
        if !has_prompt && !has_messages {
            return Err(GovernorError::InvalidRequest(
                "descriptor needs a 'prompt' string or a 'messages' array".to_string(),
            ));
        }
        Ok(())
    }

    /// Text used for fallback generation: the prompt, else the last message's content.
    pub fn prompt_text(&self) -> String {
        if let Some(prompt) = self.descriptor.get("prompt").and_then(Value::as_str) {
            return prompt.to_string();
        }
        self.descriptor
            .get("messages")
            .and_then(Value::as_array)
            .and_then(|messages| messages.last())
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    pub fn language(&self) -> Option<&str> {
        self.descriptor.get("language").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_header(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// Generated content plus the metadata handlers surface as response headers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistResponse {
    pub provider: String,
    pub content: Value,
    pub cache: CacheStatus,
    #[serde(rename = "elapsedMs", serialize_with = "as_millis")]
    pub elapsed: Duration,
    /// Limiter snapshot of the provider that answered; absent for fallbacks.
    pub limiter: Option<LimiterStats>,
    pub fallback: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<&'static str>,
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_accepts_prompt_or_messages() {
        assert!(AssistRequest::new(json!({"prompt": "hi"})).validate().is_ok());
        assert!(AssistRequest::new(json!({"model": "m", "messages": []})).validate().is_ok());
        assert!(AssistRequest::new(json!({"model": "m"})).validate().is_err());
        assert!(AssistRequest::new(json!("just text")).validate().is_err());
    }

    #[test]
    fn test_prompt_text_from_messages() {
        let request = AssistRequest::new(json!({
            "model": "m",
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "write hello world"}
            ]
        }));
        assert_eq!(request.prompt_text(), "write hello world");
        assert_eq!(request.language(), None);
    }
}
