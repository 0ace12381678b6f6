//! LLM Provider支持模块

use anyhow::Result;
use rig::{
    agent::{Agent, AgentBuilder},
    client::CompletionClient,
    completion::{CompletionModel, Prompt, PromptError},
    providers::gemini::completion::gemini_api_types::{AdditionalParameters, GenerationConfig},
};

use crate::config::{LLMConfig, LLMProvider};
use crate::generator::agent::ModelSettings;
use crate::llm::tools::{AgentToolTime, AgentToolWebSearch};

/// 单次调用挂载的工具
#[derive(Debug, Clone, Default)]
pub struct AgentTools {
    pub time: Option<AgentToolTime>,
    pub web_search: Option<AgentToolWebSearch>,
}

impl AgentTools {
    pub fn is_empty(&self) -> bool {
        self.time.is_none() && self.web_search.is_none()
    }
}

/// 统一的Provider客户端枚举
#[derive(Clone)]
pub enum ProviderClient {
    OpenAI(rig::providers::openai::Client),
    DeepSeek(rig::providers::deepseek::Client),
    Anthropic(rig::providers::anthropic::Client),
    Gemini(rig::providers::gemini::Client),
    Ollama(rig::providers::ollama::Client),
}

impl ProviderClient {
    /// 根据配置创建相应的provider客户端
    pub fn new(config: &LLMConfig) -> Result<Self> {
        let base_url = config.api_base_url.as_deref();
        match config.provider {
            LLMProvider::OpenAI => {
                let mut builder = rig::providers::openai::Client::builder(&config.api_key);
                if let Some(url) = base_url {
                    builder = builder.base_url(url);
                }
                Ok(ProviderClient::OpenAI(builder.build()))
            }
            LLMProvider::DeepSeek => {
                let mut builder = rig::providers::deepseek::Client::builder(&config.api_key);
                if let Some(url) = base_url {
                    builder = builder.base_url(url);
                }
                Ok(ProviderClient::DeepSeek(builder.build()))
            }
            LLMProvider::Anthropic => {
                let client =
                    rig::providers::anthropic::ClientBuilder::new(&config.api_key).build()?;
                Ok(ProviderClient::Anthropic(client))
            }
            LLMProvider::Gemini => {
                let client = rig::providers::gemini::Client::builder(&config.api_key).build()?;
                Ok(ProviderClient::Gemini(client))
            }
            LLMProvider::Ollama => {
                let mut builder = rig::providers::ollama::Client::builder();
                if let Some(url) = base_url {
                    builder = builder.base_url(url);
                }
                Ok(ProviderClient::Ollama(builder.build()))
            }
        }
    }

    /// 按模型配置与工具创建Agent
    pub fn create_agent(
        &self,
        settings: &ModelSettings,
        system_prompt: &str,
        tools: &AgentTools,
    ) -> Result<ProviderAgent> {
        let model = settings.model();
        let agent = match self {
            ProviderClient::OpenAI(client) => ProviderAgent::OpenAI(configure(
                client
                    .completion_model(model)
                    .completions_api()
                    .into_agent_builder(),
                settings,
                system_prompt,
                tools,
            )),
            ProviderClient::DeepSeek(client) => ProviderAgent::DeepSeek(configure(
                client.agent(model),
                settings,
                system_prompt,
                tools,
            )),
            ProviderClient::Anthropic(client) => ProviderAgent::Anthropic(configure(
                client.agent(model),
                settings,
                system_prompt,
                tools,
            )),
            ProviderClient::Gemini(client) => {
                let gen_cfg = GenerationConfig::default();
                let cfg = AdditionalParameters::default().with_config(gen_cfg);
                let builder = client
                    .agent(model)
                    .additional_params(serde_json::to_value(cfg)?);
                ProviderAgent::Gemini(configure(builder, settings, system_prompt, tools))
            }
            ProviderClient::Ollama(client) => ProviderAgent::Ollama(configure(
                client.agent(model),
                settings,
                system_prompt,
                tools,
            )),
        };
        Ok(agent)
    }
}

/// 所有 Provider 共用的 Agent 装配：提示词、采样参数与可选工具
fn configure<M: CompletionModel>(
    builder: AgentBuilder<M>,
    settings: &ModelSettings,
    system_prompt: &str,
    tools: &AgentTools,
) -> Agent<M> {
    let builder = builder
        .preamble(system_prompt)
        .max_tokens(settings.max_tokens().into())
        .temperature(settings.temperature());
    // .tool() 会把 AgentBuilder 转成另一个构建器类型，只能按组合链式调用
    match (&tools.web_search, &tools.time) {
        (Some(web_search), Some(time)) => builder
            .tool(web_search.clone())
            .tool(time.clone())
            .build(),
        (Some(web_search), None) => builder.tool(web_search.clone()).build(),
        (None, Some(time)) => builder.tool(time.clone()).build(),
        (None, None) => builder.build(),
    }
}

/// 统一的Agent枚举
pub enum ProviderAgent {
    OpenAI(Agent<rig::providers::openai::CompletionModel>),
    DeepSeek(Agent<rig::providers::deepseek::CompletionModel>),
    Anthropic(Agent<rig::providers::anthropic::completion::CompletionModel>),
    Gemini(Agent<rig::providers::gemini::completion::CompletionModel>),
    Ollama(Agent<rig::providers::ollama::CompletionModel<reqwest::Client>>),
}

impl ProviderAgent {
    /// 执行prompt
    pub async fn prompt(&self, prompt: &str) -> Result<String, PromptError> {
        match self {
            ProviderAgent::OpenAI(agent) => agent.prompt(prompt).await,
            ProviderAgent::DeepSeek(agent) => agent.prompt(prompt).await,
            ProviderAgent::Anthropic(agent) => agent.prompt(prompt).await,
            ProviderAgent::Gemini(agent) => agent.prompt(prompt).await,
            ProviderAgent::Ollama(agent) => agent.prompt(prompt).await,
        }
    }

    /// 执行多轮对话
    pub async fn multi_turn(
        &self,
        prompt: &str,
        max_iterations: usize,
    ) -> Result<String, PromptError> {
        match self {
            ProviderAgent::OpenAI(agent) => agent.prompt(prompt).multi_turn(max_iterations).await,
            ProviderAgent::DeepSeek(agent) => agent.prompt(prompt).multi_turn(max_iterations).await,
            ProviderAgent::Anthropic(agent) => {
                agent.prompt(prompt).multi_turn(max_iterations).await
            }
            ProviderAgent::Gemini(agent) => agent.prompt(prompt).multi_turn(max_iterations).await,
            ProviderAgent::Ollama(agent) => agent.prompt(prompt).multi_turn(max_iterations).await,
        }
    }
}
