//! Chat-completions generation backend (Azure OpenAI or OpenAI).
//!
//! Operations are exposed as function tools. Tool calls are executed
//! through the turn's [`OperationInvoker`] and their results fed back until
//! the model produces a message without tool calls, bounded by
//! `max_tool_rounds`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ChatProvider, ChatTurn, GenerationConfig, Role};
use crate::domain::ports::{GenerationBackend, OperationInvoker, OperationSpec};
use crate::infrastructure::logging::scrub_secrets;

/// A message on the wire, both directions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl WireMessage {
    fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            ..Self::default()
        }
    }

    fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content.into()),
            tool_call_id: Some(tool_call_id.into()),
            ..Self::default()
        }
    }
}

impl From<&ChatTurn> for WireMessage {
    fn from(turn: &ChatTurn) -> Self {
        let role = match turn.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        Self::text(role, turn.text.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: WireFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireFunctionCall {
    pub name: String,
    /// JSON-encoded argument object.
    #[serde(default)]
    pub arguments: String,
}

/// Some compatible servers send `"tool_calls": null` on plain replies.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<WireToolCall>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<WireToolCall>>::deserialize(deserializer)?.unwrap_or_default())
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunctionDef,
}

#[derive(Debug, Clone, Serialize)]
struct WireFunctionDef {
    name: &'static str,
    description: &'static str,
    parameters: Value,
}

impl From<OperationSpec> for WireTool {
    fn from(spec: OperationSpec) -> Self {
        Self {
            kind: "function",
            function: WireFunctionDef {
                name: spec.name,
                description: spec.description,
                parameters: spec.parameters,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: &'a [WireMessage],
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [WireTool],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn no_tools(tools: &&[WireTool]) -> bool {
    tools.is_empty()
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Chat-completions backend.
pub struct ChatCompletionsBackend {
    config: GenerationConfig,
    api_key: String,
    client: Client,
}

impl ChatCompletionsBackend {
    /// Create a backend; fails when no API key is configured or exported.
    pub fn new(config: GenerationConfig) -> DomainResult<Self> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            DomainError::GenerationFailed(format!(
                "no API key configured; set generation.api_key or {}",
                config.provider.api_key_env()
            ))
        })?;

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::GenerationFailed(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    fn completions_url(&self) -> String {
        let endpoint = self.config.endpoint.trim_end_matches('/');
        match self.config.provider {
            ChatProvider::AzureOpenAi => format!(
                "{endpoint}/openai/deployments/{}/chat/completions?api-version={}",
                self.config.deployment, self.config.api_version
            ),
            ChatProvider::OpenAi => format!("{endpoint}/chat/completions"),
        }
    }

    fn build_request<'a>(
        &'a self,
        messages: &'a [WireMessage],
        tools: &'a [WireTool],
    ) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            // Azure selects the model through the deployment in the URL
            model: match self.config.provider {
                ChatProvider::AzureOpenAi => None,
                ChatProvider::OpenAi => Some(self.config.deployment.as_str()),
            },
            messages,
            tools,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            response_format: self
                .config
                .json_mode
                .then(|| json!({ "type": "json_object" })),
        }
    }

    async fn complete(&self, request: &ChatCompletionRequest<'_>) -> DomainResult<WireMessage> {
        let builder = self
            .client
            .post(self.completions_url())
            .header(header::CONTENT_TYPE, "application/json");
        let builder = match self.config.provider {
            ChatProvider::AzureOpenAi => builder.header("api-key", &self.api_key),
            ChatProvider::OpenAi => builder.bearer_auth(&self.api_key),
        };

        let response = builder
            .json(request)
            .send()
            .await
            .map_err(|e| DomainError::Transport(scrub_secrets(&format!("chat request failed: {e}"))))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &body));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| DomainError::GenerationFailed(format!("Failed to parse response: {e}")))?;

        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            DomainError::GenerationFailed("chat completions returned no choices".to_string())
        })?;
        debug!(finish_reason = ?choice.finish_reason, "completion received");
        Ok(choice.message)
    }
}

fn map_http_error(status: StatusCode, body: &str) -> DomainError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map_or_else(|_| body.to_string(), |wrapper| wrapper.error.message);
    DomainError::GenerationFailed(format!(
        "chat completions returned {status}: {}",
        scrub_secrets(&message)
    ))
}

/// Run one tool call, turning any failure into an `{"error": ...}` payload.
async fn run_tool_call(operations: &dyn OperationInvoker, call: &WireToolCall) -> String {
    let arguments = if call.function.arguments.trim().is_empty() {
        Ok(json!({}))
    } else {
        serde_json::from_str::<Value>(&call.function.arguments)
    };

    let result = match arguments {
        Ok(arguments) => operations.invoke(&call.function.name, arguments).await,
        Err(e) => Err(DomainError::operation_failed(
            call.function.name.clone(),
            DomainError::InvalidArgument(format!("arguments are not valid JSON: {e}")),
        )),
    };

    match result {
        Ok(value) => value.to_string(),
        Err(e) => {
            warn!(operation = %call.function.name, error = %e, "operation failed");
            json!({ "error": e.to_string() }).to_string()
        }
    }
}

#[async_trait]
impl GenerationBackend for ChatCompletionsBackend {
    fn backend_id(&self) -> &'static str {
        match self.config.provider {
            ChatProvider::AzureOpenAi => "azure-openai",
            ChatProvider::OpenAi => "openai",
        }
    }

    async fn generate(
        &self,
        instructions: &str,
        history: &[ChatTurn],
        operations: &dyn OperationInvoker,
    ) -> DomainResult<Vec<String>> {
        let tools: Vec<WireTool> = operations.operations().into_iter().map(WireTool::from).collect();

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(WireMessage::text("system", instructions));
        messages.extend(history.iter().map(WireMessage::from));

        let mut fragments = Vec::new();
        let mut round = 0;
        loop {
            let reply = self.complete(&self.build_request(&messages, &tools)).await?;

            if let Some(content) = reply.content.as_deref().filter(|c| !c.is_empty()) {
                fragments.push(content.to_string());
            }

            if reply.tool_calls.is_empty() {
                info!(
                    backend = self.backend_id(),
                    tool_rounds = round,
                    fragments = fragments.len(),
                    "generation complete"
                );
                return Ok(fragments);
            }

            if round >= self.config.max_tool_rounds {
                return Err(DomainError::GenerationFailed(format!(
                    "model kept calling tools after {round} rounds"
                )));
            }
            round += 1;

            debug!(round, calls = reply.tool_calls.len(), "executing tool calls");
            let calls = reply.tool_calls.clone();
            messages.push(reply);
            for call in &calls {
                let content = run_tool_call(operations, call).await;
                messages.push(WireMessage::tool_result(call.id.clone(), content));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: ChatProvider) -> GenerationConfig {
        GenerationConfig {
            provider,
            endpoint: "https://contoso.openai.azure.com/".to_string(),
            deployment: "gpt-4o".to_string(),
            api_key: Some("test-key".to_string()),
            ..GenerationConfig::default()
        }
    }

    #[test]
    fn test_azure_url_uses_deployment_and_version() {
        let backend = ChatCompletionsBackend::new(config(ChatProvider::AzureOpenAi)).unwrap();
        assert_eq!(
            backend.completions_url(),
            "https://contoso.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-06-01"
        );
    }

    #[test]
    fn test_openai_request_names_model_and_json_mode() {
        let mut cfg = config(ChatProvider::OpenAi);
        cfg.endpoint = "https://api.openai.com/v1".to_string();
        let backend = ChatCompletionsBackend::new(cfg).unwrap();
        assert_eq!(backend.completions_url(), "https://api.openai.com/v1/chat/completions");

        let messages = [WireMessage::text("user", "hi")];
        let body = serde_json::to_value(backend.build_request(&messages, &[])).unwrap();
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let mut cfg = config(ChatProvider::OpenAi);
        cfg.api_key = None;
        temp_env::with_var_unset("OPENAI_API_KEY", || {
            assert!(matches!(
                ChatCompletionsBackend::new(cfg),
                Err(DomainError::GenerationFailed(_))
            ));
        });
    }

    #[test]
    fn test_error_body_message_is_extracted() {
        let err = map_http_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#,
        );
        assert!(err.to_string().contains("Rate limit reached"));
        assert!(err.to_string().contains("429"));
    }

    #[test]
    fn test_null_tool_calls_decode_as_empty() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"{}","tool_calls":null},"finish_reason":"stop"}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.choices[0].message.tool_calls.is_empty());
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("{}"));
    }
}
