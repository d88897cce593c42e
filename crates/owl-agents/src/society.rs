use anyhow::Result;
use owl_logging::safe_truncate;
use owl_types::{ChatHistory, RoundRecord, TokenInfo, TASK_DONE};
use serde::{Deserialize, Serialize};

use crate::role_playing::RolePlaying;

/// Everything a finished society run produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocietyResult {
    pub answer: String,
    pub chat_history: ChatHistory,
    pub token_info: TokenInfo,
}

/// Drive `society` for at most `round_limit` rounds.
///
/// A round is recorded once both agents have replied. The run stops early
/// when either agent terminates or the user agent says `TASK_DONE`. The
/// answer is the assistant's reply from the last recorded round.
pub async fn run_society(society: &mut RolePlaying, round_limit: usize) -> Result<SocietyResult> {
    let mut chat_history = ChatHistory::new();
    let mut token_info = TokenInfo::default();

    let mut input_msg = society.init_chat(None);

    for round in 0..round_limit {
        let response = society.step(&input_msg).await?;

        let assistant_usage = response.assistant.info.usage;
        let user_usage = response.user.info.usage;
        token_info.completion_token_count += u64::from(assistant_usage.completion_tokens);
        token_info.prompt_token_count +=
            u64::from(assistant_usage.prompt_tokens) + u64::from(user_usage.prompt_tokens);

        let (Some(user_msg), Some(assistant_msg)) = (response.user.msg(), response.assistant.msg()) else {
            log::info!(
                "Round #{} ended early (user terminated: {}, assistant terminated: {})",
                round,
                response.user.terminated,
                response.assistant.terminated
            );
            break;
        };

        log::info!("Round #{} user_response:\n {}", round, safe_truncate(&user_msg.content, 2000));
        log::info!(
            "Round #{} assistant_response:\n {}",
            round,
            safe_truncate(&assistant_msg.content, 2000)
        );
        if let Some(logger) = society.logger() {
            let mut logger = logger.lock().await;
            logger
                .log("user", &user_msg.content, Some(round), Some(society.user_role_name()))
                .await;
            logger
                .log(
                    "assistant",
                    &assistant_msg.content,
                    Some(round),
                    Some(society.assistant_role_name()),
                )
                .await;
        }

        chat_history.push(RoundRecord {
            user: user_msg.content.clone(),
            assistant: assistant_msg.content.clone(),
            tool_calls: response.assistant.info.tool_calls.clone(),
        });

        if response.assistant.terminated || response.user.terminated || user_msg.content.contains(TASK_DONE) {
            break;
        }

        match response.next_message {
            Some(next) => input_msg = next,
            None => break,
        }
    }

    let answer = chat_history
        .last()
        .map(|round| round.assistant.clone())
        .unwrap_or_default();

    Ok(SocietyResult {
        answer,
        chat_history,
        token_info,
    })
}
