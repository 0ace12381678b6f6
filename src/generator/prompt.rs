use crate::generator::capability::Capability;
use crate::generator::invoker::InvocationRequest;
use crate::i18n::TargetLanguage;

const CLOSING_INSTRUCTION: &str = "Return the actual complete content as your final answer, not a summary of it.";

/// 提示词构建器 - 把一次调用请求拆成系统提示词与用户提示词
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    target_language: TargetLanguage,
}

impl PromptBuilder {
    pub fn new(target_language: TargetLanguage) -> Self {
        Self { target_language }
    }

    pub fn build(&self, request: &InvocationRequest<'_>) -> (String, String) {
        (
            self.system_prompt(request),
            Self::user_prompt(request),
        )
    }

    /// 角色、目标、背景，以及可用工具和输出语言要求
    pub fn system_prompt(&self, request: &InvocationRequest<'_>) -> String {
        let agent = request.agent;
        let mut prompt = format!("You are {}.\n\n## Goal\n{}\n", agent.role(), agent.goal());

        if !agent.backstory().is_empty() {
            prompt.push_str("\n## Background\n");
            prompt.push_str(agent.backstory());
            prompt.push('\n');
        }

        if !request.capabilities.is_empty() {
            prompt.push_str("\n## Tools\n");
            for capability in request.capabilities.iter() {
                let line = match capability {
                    Capability::WebSearch(_) => {
                        "- web_search: search the internet for current information. Cite the sources you rely on."
                    }
                    Capability::Clock => "- time: get the current date and time.",
                };
                prompt.push_str(line);
                prompt.push('\n');
            }
        }

        prompt.push('\n');
        prompt.push_str(self.target_language.prompt_instruction());
        prompt
    }

    /// 任务描述、期望输出和上游上下文
    pub fn user_prompt(request: &InvocationRequest<'_>) -> String {
        let mut prompt = String::new();
        prompt.push_str(request.description.trim());
        prompt.push_str("\n\n## Expected output\n");
        prompt.push_str(request.expected_output.trim());
        prompt.push('\n');

        if !request.context.is_empty() {
            prompt.push_str("\n## Context from upstream tasks\n");
            prompt.push_str(request.context);
            prompt.push('\n');
        }

        prompt.push('\n');
        prompt.push_str(CLOSING_INSTRUCTION);
        prompt
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::*;
    use crate::generator::agent::AgentDefinition;
    use crate::generator::agent::tests::test_model;
    use crate::generator::capability::CapabilityKind;
    use crate::generator::task::TaskDefinition;

    fn researcher(with_key: bool) -> Arc<AgentDefinition> {
        let mut env = HashMap::new();
        if with_key {
            env.insert("SERPER_API_KEY".to_string(), "k".to_string());
        }
        Arc::new(
            AgentDefinition::builder("Senior Research Specialist")
                .goal("Find facts")
                .backstory("Decades of fieldwork")
                .capability(CapabilityKind::WebSearch)
                .capability(CapabilityKind::Clock)
                .build(test_model(), &env)
                .unwrap(),
        )
    }

    #[test]
    fn test_system_prompt_lists_resolved_tools_only() {
        let task = TaskDefinition::new("research", researcher(false), "Research", "Notes").unwrap();
        let request = InvocationRequest::for_task(&task, "");
        let system = PromptBuilder::default().system_prompt(&request);

        assert!(system.starts_with("You are Senior Research Specialist."));
        assert!(system.contains("## Background\nDecades of fieldwork"));
        assert!(system.contains("- time:"));
        assert!(!system.contains("web_search"));

        let task = TaskDefinition::new("research", researcher(true), "Research", "Notes").unwrap();
        let request = InvocationRequest::for_task(&task, "");
        assert!(PromptBuilder::default().system_prompt(&request).contains("- web_search:"));
    }

    #[test]
    fn test_user_prompt_includes_context_when_present() {
        let task = TaskDefinition::new("analysis", researcher(false), "Analyze it  ", "Table").unwrap();

        let request = InvocationRequest::for_task(&task, "");
        let user = PromptBuilder::user_prompt(&request);
        assert!(user.starts_with("Analyze it\n\n## Expected output\nTable\n"));
        assert!(!user.contains("## Context"));
        assert!(user.ends_with(CLOSING_INSTRUCTION));

        let request = InvocationRequest::for_task(&task, "### R (research)\nfacts");
        let user = PromptBuilder::user_prompt(&request);
        assert!(user.contains("## Context from upstream tasks\n### R (research)\nfacts\n"));
    }

    #[test]
    fn test_language_instruction_appended() {
        let task = TaskDefinition::new("t", researcher(false), "d", "e").unwrap();
        let request = InvocationRequest::for_task(&task, "");
        let (system, _) = PromptBuilder::new(TargetLanguage::Chinese).build(&request);
        assert!(system.ends_with(TargetLanguage::Chinese.prompt_instruction()));
    }
}
