use serde_json::json;
use wiremock::matchers::*;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock server utilities for testing LLM API clients
pub struct LlmMockServer {
    server: MockServer,
}

impl LlmMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Mock successful OpenAI-compatible response
    pub async fn mock_openai_success(&self, response_content: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-api-key"))
            .and(body_partial_json(json!({"model": "gpt-4o"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl_test123",
                "object": "chat.completion",
                "model": "gpt-4o",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": response_content},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30}
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock an OpenAI-compatible response that requests a tool call
    pub async fn mock_openai_tool_call(&self, tool_name: &str, arguments: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({"tool_choice": "auto"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {"name": tool_name, "arguments": arguments}
                        }]
                    }
                }]
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_openai_status(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_openai_no_choices(&self) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&self.server)
            .await;
    }

    /// Mock successful Anthropic API response
    pub async fn mock_anthropic_success(&self, response_content: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-api-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({"system": "You are terse."})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_test123",
                "type": "message",
                "role": "assistant",
                "content": [{"type": "text", "text": response_content}],
                "stop_reason": "end_turn",
                "usage": {"input_tokens": 10, "output_tokens": 20}
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock Anthropic API rate limit error
    pub async fn mock_anthropic_rate_limit(&self) {
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(json!({
                        "type": "error",
                        "error": {"type": "rate_limit_error", "message": "Rate limit exceeded"}
                    }))
                    .insert_header("Retry-After", "60"),
            )
            .mount(&self.server)
            .await;
    }
}
