//! 工具调用循环 - 带工具的Agent以多轮对话方式执行

use rig::completion::{AssistantContent, Message, PromptError};
use tracing::{debug, warn};

use super::providers::ProviderAgent;
use super::utils::classify_error;
use crate::error::InvocationError;

pub struct ToolLoop;

impl ToolLoop {
    /// 多轮执行；达到最大轮数时取最后一段助手回复作为结果
    pub async fn execute(
        agent: &ProviderAgent,
        user_prompt: &str,
        max_iterations: usize,
    ) -> Result<String, InvocationError> {
        debug!("   ♻️ 激活工具调用模式，最大迭代次数: {}", max_iterations);

        match agent.multi_turn(user_prompt, max_iterations).await {
            Ok(response) => Ok(response),
            Err(PromptError::MaxDepthError {
                max_depth,
                chat_history,
                prompt: _,
            }) => {
                let (content, tool_calls) = Self::extract_partial_result(&chat_history);
                warn!(
                    max_depth,
                    tool_calls = tool_calls.len(),
                    "   ⚠️ 达到最大迭代次数，使用已有的部分结果"
                );
                content.ok_or_else(|| {
                    InvocationError::MalformedResponse(format!(
                        "达到最大工具调用轮数({})且没有可用的回复",
                        max_depth
                    ))
                })
            }
            Err(e) => Err(classify_error(&e.to_string())),
        }
    }

    /// 从聊天历史中提取最后的助手文本以及调用过的工具
    fn extract_partial_result(chat_history: &[Message]) -> (Option<String>, Vec<String>) {
        let last_assistant_message = chat_history.iter().rev().find_map(|msg| {
            if let Message::Assistant { content, .. } = msg {
                let text_content = content
                    .iter()
                    .filter_map(|c| {
                        if let AssistantContent::Text(text) = c {
                            Some(text.text.clone())
                        } else {
                            None
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n");

                if !text_content.trim().is_empty() {
                    Some(text_content)
                } else {
                    None
                }
            } else {
                None
            }
        });

        let mut tool_calls = Vec::new();
        for msg in chat_history {
            if let Message::Assistant { content, .. } = msg {
                for c in content.iter() {
                    if let AssistantContent::ToolCall(tool_call) = c {
                        tool_calls.push(tool_call.function.name.clone());
                    }
                }
            }
        }

        (last_assistant_message, tool_calls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_result_prefers_latest_text() {
        let history = vec![
            Message::user("research soil health"),
            Message::assistant("first draft"),
            Message::user("tool result"),
            Message::assistant("final notes"),
        ];
        let (content, tool_calls) = ToolLoop::extract_partial_result(&history);
        assert_eq!(content.as_deref(), Some("final notes"));
        assert!(tool_calls.is_empty());

        let (content, _) = ToolLoop::extract_partial_result(&[Message::user("only user")]);
        assert!(content.is_none());
    }
}
