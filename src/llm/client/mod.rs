//! LLM客户端 - 提供统一的LLM服务接口

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::future::Future;
use tracing::{debug, info, warn};

use crate::config::{Config, LLMConfig};
use crate::error::InvocationError;
use crate::generator::agent::ModelSettings;
use crate::generator::capability::{Capability, CapabilitySet, WebSearchSettings};
use crate::generator::invoker::{InvocationRequest, Invoker};
use crate::generator::prompt::PromptBuilder;
use crate::llm::tools::web_search::http_client;
use crate::llm::tools::{AgentToolTime, AgentToolWebSearch};

mod providers;
mod tool_loop;
pub mod utils;

use providers::{AgentTools, ProviderClient};
use tool_loop::ToolLoop;
use utils::{backoff_delay, classify_error};

/// LLM客户端 - 基于 rig 的模型调用器
#[derive(Clone)]
pub struct LLMClient {
    llm: LLMConfig,
    search_max_results: usize,
    prompts: PromptBuilder,
    client: ProviderClient,
    http: reqwest::Client,
    /// 按配置预先构建的搜索工具，各次调用共用
    web_search: Option<AgentToolWebSearch>,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: &Config) -> Result<Self> {
        let client = ProviderClient::new(&config.llm)?;
        let http = http_client().context("Failed to build HTTP client for web search")?;
        let web_search = WebSearchSettings::from_source(config).map(|settings| {
            AgentToolWebSearch::new(settings, config.search.max_results, http.clone())
        });
        Ok(Self {
            llm: config.llm.clone(),
            search_max_results: config.search.max_results,
            prompts: PromptBuilder::new(config.target_language),
            client,
            http,
            web_search,
        })
    }

    /// 检查模型连接和功能是否正常
    pub async fn check_connection(&self) -> Result<()> {
        info!("🔄 正在检查模型连接...");
        let settings = ModelSettings::from_llm_config(&self.llm)?;
        let agent = self.client.create_agent(
            &settings,
            "You are a helpful assistant.",
            &AgentTools::default(),
        )?;

        match self
            .retry_with_backoff(|| async {
                agent
                    .prompt("Hello")
                    .await
                    .map_err(|e| classify_error(&e.to_string()))
            })
            .await
        {
            Ok(_) => {
                info!("✅ 模型连接正常");
                Ok(())
            }
            Err(e) => {
                warn!("❌ 模型连接失败: {}", e);
                Err(e.into())
            }
        }
    }

    /// 通用重试逻辑：指数退避，凭证错误不重试
    async fn retry_with_backoff<T, F, Fut>(&self, operation: F) -> Result<T, InvocationError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, InvocationError>>,
    {
        let max_retries = self.llm.retry_attempts.max(1);
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    attempt += 1;
                    if !err.is_retryable() || attempt >= max_retries {
                        return Err(err);
                    }
                    let delay = backoff_delay(self.llm.retry_delay_ms, attempt);
                    warn!(
                        "❌ 调用模型服务出错，{}ms 后重试 (第 {} / {}次尝试): {}",
                        delay.as_millis(),
                        attempt,
                        max_retries,
                        err
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// 把已解析的能力转换成 rig 工具
    fn tools_for(&self, capabilities: &CapabilitySet) -> AgentTools {
        let mut tools = AgentTools::default();
        for capability in capabilities.iter() {
            match capability {
                Capability::WebSearch(settings) => {
                    let tool = match &self.web_search {
                        Some(tool) if tool.settings() == settings => tool.clone(),
                        _ => AgentToolWebSearch::new(
                            settings.clone(),
                            self.search_max_results,
                            self.http.clone(),
                        ),
                    };
                    tools.web_search = Some(tool);
                }
                Capability::Clock => tools.time = Some(AgentToolTime::new()),
            }
        }
        tools
    }
}

#[async_trait]
impl Invoker for LLMClient {
    async fn invoke(&self, request: &InvocationRequest<'_>) -> Result<String, InvocationError> {
        let (system_prompt, user_prompt) = self.prompts.build(request);
        let tools = self.tools_for(request.capabilities);
        let use_tools = !tools.is_empty();

        let agent = self
            .client
            .create_agent(request.agent.model(), &system_prompt, &tools)
            .map_err(|e| InvocationError::Provider(e.to_string()))?;

        debug!(
            task = %request.task_id,
            model = request.agent.model().model(),
            tools = use_tools,
            prompt_chars = system_prompt.len() + user_prompt.len(),
            "发送模型请求"
        );

        self.retry_with_backoff(|| async {
            if use_tools {
                ToolLoop::execute(&agent, &user_prompt, self.llm.max_tool_iterations).await
            } else {
                agent
                    .prompt(&user_prompt)
                    .await
                    .map_err(|e| classify_error(&e.to_string()))
            }
        })
        .await
    }
}
