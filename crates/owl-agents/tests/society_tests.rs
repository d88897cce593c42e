use std::collections::HashMap;
use std::sync::Arc;

use owl_agents::{run_society, RolePlaying, SharedLogger};
use owl_llm_api::mock::ScriptedLlmClient;
use owl_logging::ConversationLogger;
use owl_toolcore::{ParameterDefinition, Tool, ToolContext, ToolParameters, ToolRegistry, ToolResult};
use pretty_assertions::assert_eq;
use serde_json::json;

struct CapitalLookup;

#[async_trait::async_trait]
impl Tool for CapitalLookup {
    fn name(&self) -> &str {
        "lookup_capital"
    }

    fn description(&self) -> &str {
        "Look up the capital of a country"
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        let mut params = HashMap::new();
        params.insert(
            "country".to_string(),
            ParameterDefinition {
                param_type: "string".to_string(),
                description: "Country name".to_string(),
                required: true,
                default: None,
            },
        );
        params
    }

    async fn execute(&self, params: ToolParameters, _context: &ToolContext) -> ToolResult {
        match params.get_required::<String>("country") {
            Ok(country) if country == "France" => ToolResult::success("Paris".to_string()),
            Ok(country) => ToolResult::error(format!("unknown country {}", country)),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

fn registry() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(CapitalLookup);
    Arc::new(registry)
}

fn society(user: &Arc<ScriptedLlmClient>, assistant: &Arc<ScriptedLlmClient>) -> RolePlaying {
    RolePlaying::builder("What is the capital of France?", user.clone(), assistant.clone())
        .tools(registry(), ToolContext::default())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_stops_when_user_says_task_done() {
    let user = Arc::new(ScriptedLlmClient::new());
    user.push_text("Instruction: look up the capital of France");
    user.push_text("<TASK_DONE>");

    let assistant = Arc::new(ScriptedLlmClient::new());
    assistant.push_tool_call("call_1", "lookup_capital", json!({"country": "France"}));
    assistant.push_text("Solution: the capital is Paris");
    assistant.push_text("The capital of France is Paris.");

    let mut society = society(&user, &assistant);
    let result = run_society(&mut society, 15).await.unwrap();

    assert_eq!(result.chat_history.len(), 2);
    assert_eq!(result.answer, "The capital of France is Paris.");

    let first = &result.chat_history.rounds()[0];
    assert_eq!(first.user, "Instruction: look up the capital of France");
    assert_eq!(first.assistant, "Solution: the capital is Paris");
    assert_eq!(first.tool_calls.len(), 1);
    assert_eq!(first.tool_calls[0].tool_name, "lookup_capital");
    assert_eq!(first.tool_calls[0].result, "Paris");
    assert_eq!(first.tool_calls[0].args, json!({"country": "France"}));
    assert!(result.chat_history.rounds()[1].tool_calls.is_empty());
    assert_eq!(user.remaining(), 0);
    assert_eq!(assistant.remaining(), 0);
}

#[tokio::test]
async fn test_messages_between_agents_carry_hints() {
    let user = Arc::new(ScriptedLlmClient::new());
    user.push_text("Instruction: find it");
    user.push_text("TASK_DONE");

    let assistant = Arc::new(ScriptedLlmClient::new());
    assistant.push_text("Solution: Paris");
    assistant.push_text("Paris");

    let mut society = society(&user, &assistant);
    run_society(&mut society, 5).await.unwrap();

    let assistant_calls = assistant.calls();
    let first_instruction = &assistant_calls[0].messages.last().unwrap().content;
    assert!(first_instruction.starts_with("Instruction: find it"));
    assert!(first_instruction.contains("<auxiliary_information>"));
    assert_eq!(assistant_calls[0].tools.len(), 1);

    let closing = &assistant_calls[1].messages.last().unwrap().content;
    assert!(closing.starts_with("TASK_DONE"));
    assert!(closing.contains("make a final answer"));

    let user_calls = user.calls();
    assert!(user_calls[0].tools.is_empty());
    let forwarded = &user_calls[1].messages.last().unwrap().content;
    assert!(forwarded.starts_with("Solution: Paris"));
    assert!(forwarded.contains("reply with `TASK_DONE`"));
}

#[tokio::test]
async fn test_round_limit() {
    let user = Arc::new(ScriptedLlmClient::new());
    let assistant = Arc::new(ScriptedLlmClient::new());
    for i in 0..3 {
        user.push_text(format!("Instruction: step {}", i));
        assistant.push_text(format!("Solution: step {}", i));
    }

    let mut society = society(&user, &assistant);
    let result = run_society(&mut society, 3).await.unwrap();
    assert_eq!(result.chat_history.len(), 3);
    assert_eq!(result.answer, "Solution: step 2");
}

#[tokio::test]
async fn test_token_accounting() {
    let user = Arc::new(ScriptedLlmClient::new());
    user.push_text_with_usage("Instruction: go", 5, 2);
    let assistant = Arc::new(ScriptedLlmClient::new());
    assistant.push_text_with_usage("Solution: done", 10, 4);

    let mut society = society(&user, &assistant);
    let result = run_society(&mut society, 1).await.unwrap();

    assert_eq!(result.token_info.completion_token_count, 4);
    assert_eq!(result.token_info.prompt_token_count, 15);
}

#[tokio::test]
async fn test_unknown_tool_is_reported_to_model() {
    let user = Arc::new(ScriptedLlmClient::new());
    user.push_text("Instruction: use the browser");
    let assistant = Arc::new(ScriptedLlmClient::new());
    assistant.push_tool_call("call_x", "browse_web", json!({"url": "https://example.com"}));
    assistant.push_text("Solution: that tool does not exist");

    let mut society = society(&user, &assistant);
    let result = run_society(&mut society, 1).await.unwrap();

    let record = &result.chat_history.rounds()[0].tool_calls[0];
    assert_eq!(record.tool_name, "browse_web");
    assert!(record.result.contains("not found"));

    let second_call = &assistant.calls()[1].messages;
    let tool_message = second_call.last().unwrap();
    assert_eq!(tool_message.role, "tool");
    assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_x"));
}

#[tokio::test]
async fn test_user_termination_records_nothing() {
    let user = Arc::new(ScriptedLlmClient::new());
    user.push_text("");
    let assistant = Arc::new(ScriptedLlmClient::new());

    let mut society = society(&user, &assistant);
    let result = run_society(&mut society, 5).await.unwrap();
    assert!(result.chat_history.is_empty());
    assert_eq!(result.answer, "");
    assert!(assistant.calls().is_empty());
}

#[tokio::test]
async fn test_tool_loop_bound_terminates_assistant() {
    let user = Arc::new(ScriptedLlmClient::new());
    user.push_text("Instruction: loop forever");
    let assistant = Arc::new(ScriptedLlmClient::new());
    assistant.push_tool_call("c1", "lookup_capital", json!({"country": "France"}));
    assistant.push_tool_call("c2", "lookup_capital", json!({"country": "France"}));

    let mut society = RolePlaying::builder("task", user.clone(), assistant.clone())
        .tools(registry(), ToolContext::default())
        .max_tool_iterations(2)
        .build()
        .unwrap();

    let input = society.init_chat(None);
    let round = society.step(&input).await.unwrap();
    assert!(round.assistant.terminated);
    assert_eq!(
        round.assistant.info.termination_reasons,
        vec!["max_tool_iterations".to_string()]
    );
    assert_eq!(round.assistant.info.tool_calls.len(), 2);
    assert_eq!(round.user.content(), "Instruction: loop forever");
    assert!(round.next_message.is_none());
}

#[tokio::test]
async fn test_model_error_propagates() {
    let user = Arc::new(ScriptedLlmClient::new());
    user.push_error("rate limited");
    let assistant = Arc::new(ScriptedLlmClient::new());

    let mut society = society(&user, &assistant);
    let err = run_society(&mut society, 3).await.unwrap_err();
    assert!(err.to_string().contains("rate limited"));
}

#[tokio::test]
async fn test_empty_task_is_rejected() {
    let client = Arc::new(ScriptedLlmClient::new());
    assert!(RolePlaying::builder("  ", client.clone(), client).build().is_err());
}

#[tokio::test]
async fn test_output_language_reaches_both_agents() {
    let client = Arc::new(ScriptedLlmClient::new());
    let society = RolePlaying::builder("task", client.clone(), client)
        .output_language(Some("Japanese".to_string()))
        .build()
        .unwrap();
    for agent in [society.user_agent(), society.assistant_agent()] {
        assert!(agent
            .system_message()
            .content
            .contains("Regardless of the input language, you must output text in Japanese."));
    }
}

#[tokio::test]
async fn test_conversation_log_written() {
    let dir = tempfile::tempdir().unwrap();
    let logger: SharedLogger = Arc::new(tokio::sync::Mutex::new(
        ConversationLogger::new(dir.path(), "owl").await.unwrap(),
    ));

    let user = Arc::new(ScriptedLlmClient::new());
    user.push_text("Instruction: look up");
    let assistant = Arc::new(ScriptedLlmClient::new());
    assistant.push_tool_call("call_1", "lookup_capital", json!({"country": "France"}));
    assistant.push_text("Solution: Paris");

    let mut society = RolePlaying::builder("task", user.clone(), assistant.clone())
        .tools(registry(), ToolContext::default())
        .logger(logger.clone())
        .build()
        .unwrap();
    run_society(&mut society, 1).await.unwrap();

    let mut guard = logger.lock().await;
    guard.shutdown().await;
    let content = std::fs::read_to_string(guard.path()).unwrap();
    // tool request, tool result, user, assistant
    assert_eq!(content.lines().count(), 4);
}
