use crate::config::{Config, LLMProvider};
use crate::generator::crews::CrewKind;
use crate::i18n::TargetLanguage;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// 未显式指定配置文件时，在当前目录查找的文件名
pub const DEFAULT_CONFIG_FILE: &str = "crew.toml";

/// Proposal Crew - 由多个 AI Agent 协作撰写研究项目申请书
#[derive(Parser, Debug)]
#[command(name = "proposal-crew")]
#[command(
    about = "Multi-agent research proposal writer. A researcher, an analyst and a writer collaborate in dependency order to turn a topic into a Markdown proposal."
)]
#[command(version)]
pub struct Args {
    /// 研究主题，不填时从标准输入读取
    #[arg(short, long)]
    pub topic: Option<String>,

    /// 输出目录
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Crew 蓝图
    #[arg(long, value_enum)]
    pub crew: Option<CrewKind>,

    /// LLM Provider (openai, deepseek, anthropic, gemini, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// 模型名称
    #[arg(long)]
    pub model: Option<String>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Serper API KEY，提供后研究员可联网搜索
    #[arg(long)]
    pub serper_api_key: Option<String>,

    /// 单个任务的超时时间（秒）
    #[arg(long)]
    pub task_timeout: Option<u64>,

    /// 并发执行互不依赖的任务
    #[arg(long)]
    pub concurrent: bool,

    /// 并发上限
    #[arg(long)]
    pub max_parallels: Option<usize>,

    /// 目标语言 (en, zh, ja, de, fr)
    #[arg(long)]
    pub target_language: Option<String>,

    /// 同时保存每个任务的中间产物
    #[arg(long)]
    pub history: bool,

    /// 不调用模型，使用离线回显走完整个流程
    #[arg(long)]
    pub dry_run: bool,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// 将CLI参数转换为配置
    pub fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(config_path) => Config::from_file(config_path)?,
            None => {
                let default_config_path = std::env::current_dir()
                    .unwrap_or_else(|_| PathBuf::from("."))
                    .join(DEFAULT_CONFIG_FILE);
                if default_config_path.exists() {
                    Config::from_file(&default_config_path)?
                } else {
                    Config::default()
                }
            }
        };

        if let Some(topic) = self.topic {
            config.topic = Some(topic);
        }
        if let Some(output_path) = self.output_path {
            config.output_path = output_path;
        }
        if let Some(crew) = self.crew {
            config.crew = crew;
        }

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            match provider_str.parse::<LLMProvider>() {
                Ok(provider) => config.llm.provider = provider,
                Err(_) => tracing::warn!(
                    "⚠️ 未知的provider: {}，使用 {}",
                    provider_str,
                    config.llm.provider
                ),
            }
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = Some(llm_api_base_url);
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(model) = self.model {
            config.llm.model = model;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }

        if let Some(serper_api_key) = self.serper_api_key {
            config.search.api_key = Some(serper_api_key);
        }

        // 调度配置
        if let Some(task_timeout) = self.task_timeout {
            config.scheduler.task_timeout_seconds = task_timeout;
        }
        if self.concurrent {
            config.scheduler.concurrent = true;
        }
        if let Some(max_parallels) = self.max_parallels {
            config.scheduler.max_parallels = max_parallels;
        }

        // 目标语言配置
        if let Some(target_language_str) = self.target_language {
            match target_language_str.parse::<TargetLanguage>() {
                Ok(target_language) => config.target_language = target_language,
                Err(_) => tracing::warn!(
                    "⚠️ 未知的目标语言: {}，使用 {}",
                    target_language_str,
                    config.target_language.display_name()
                ),
            }
        }

        if self.history {
            config.write_history = true;
        }
        if self.verbose {
            config.verbose = true;
        }

        Ok(config)
    }
}
