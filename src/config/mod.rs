use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::generator::capability::{
    DEFAULT_WEB_SEARCH_ENDPOINT, PrerequisiteSource, WEB_SEARCH_ENDPOINT_KEY,
    WEB_SEARCH_PREREQUISITE,
};
use crate::generator::crews::CrewKind;
use crate::i18n::TargetLanguage;

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "gemini")]
    #[default]
    Gemini,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::Gemini => write!(f, "gemini"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "gemini" => Ok(LLMProvider::Gemini),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// 研究主题，未配置时由命令行交互输入
    pub topic: Option<String>,

    /// 使用的 Crew 蓝图
    pub crew: CrewKind,

    /// 输出目录
    pub output_path: PathBuf,

    /// 目标语言
    pub target_language: TargetLanguage,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// 联网搜索配置
    pub search: SearchConfig,

    /// 调度配置
    pub scheduler: SchedulerConfig,

    /// 是否同时保存每个任务的中间产物
    pub write_history: bool,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址，不填时使用 Provider 的官方地址
    pub api_base_url: Option<String>,

    /// 所有 Agent 共用的模型
    pub model: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 温度
    pub temperature: f64,

    /// 重试次数
    pub retry_attempts: u32,

    /// 重试间隔（毫秒），每次重试翻倍
    pub retry_delay_ms: u64,

    /// 工具调用的最大轮数
    pub max_tool_iterations: usize,
}

/// 联网搜索配置（Serper）
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub api_key: Option<String>,

    pub endpoint: String,

    /// 每次搜索返回的条目数
    pub max_results: usize,
}

/// 调度配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SchedulerConfig {
    /// 单个任务的超时时间（秒）
    pub task_timeout_seconds: u64,

    /// 是否并发执行互不依赖的任务
    pub concurrent: bool,

    pub max_parallels: usize,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {:?}", path))?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}

impl PrerequisiteSource for Config {
    fn lookup(&self, key: &str) -> Option<String> {
        match key {
            WEB_SEARCH_PREREQUISITE => self
                .search
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            WEB_SEARCH_ENDPOINT_KEY => Some(self.search.endpoint.clone()),
            _ => None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            topic: None,
            crew: CrewKind::default(),
            output_path: PathBuf::from("."),
            target_language: TargetLanguage::default(),
            llm: LLMConfig::default(),
            search: SearchConfig::default(),
            scheduler: SchedulerConfig::default(),
            write_history: false,
            verbose: false,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: std::env::var("CREW_LLM_API_KEY")
                .or_else(|_| std::env::var("GEMINI_API_KEY"))
                .unwrap_or_default(),
            api_base_url: None,
            model: String::from("gemini-2.0-flash-exp"),
            max_tokens: 4000,
            temperature: 0.5,
            retry_attempts: 3,
            retry_delay_ms: 2000,
            max_tool_iterations: 8,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var(WEB_SEARCH_PREREQUISITE).ok(),
            endpoint: std::env::var(WEB_SEARCH_ENDPOINT_KEY)
                .unwrap_or_else(|_| DEFAULT_WEB_SEARCH_ENDPOINT.to_string()),
            max_results: 5,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            task_timeout_seconds: 300,
            concurrent: false,
            max_parallels: 3,
        }
    }
}
