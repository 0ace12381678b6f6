//! Agent 能力集合（外部工具），在构建Agent时一次性解析

use std::collections::HashMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Serper 搜索凭证对应的配置键
pub const WEB_SEARCH_PREREQUISITE: &str = "SERPER_API_KEY";
/// Serper 搜索端点覆盖（可选）
pub const WEB_SEARCH_ENDPOINT_KEY: &str = "SERPER_ENDPOINT";

pub const DEFAULT_WEB_SEARCH_ENDPOINT: &str = "https://google.serper.dev/search";

/// 能力前置条件来源 - 简单的键值查询
pub trait PrerequisiteSource {
    fn lookup(&self, key: &str) -> Option<String>;
}

impl PrerequisiteSource for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Agent 声明需要的能力种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    WebSearch,
    Clock,
}

impl CapabilityKind {
    /// 该能力依赖的配置键，None 表示无前置条件
    pub fn prerequisite(&self) -> Option<&'static str> {
        match self {
            CapabilityKind::WebSearch => Some(WEB_SEARCH_PREREQUISITE),
            CapabilityKind::Clock => None,
        }
    }
}

impl Display for CapabilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapabilityKind::WebSearch => write!(f, "web_search"),
            CapabilityKind::Clock => write!(f, "time"),
        }
    }
}

/// Serper 搜索参数
#[derive(Clone, PartialEq, Eq)]
pub struct WebSearchSettings {
    pub api_key: String,
    pub endpoint: String,
}

impl WebSearchSettings {
    /// 读取搜索凭据，凭据缺失或为空白时返回 None
    pub fn from_source(source: &dyn PrerequisiteSource) -> Option<Self> {
        let api_key = source
            .lookup(WEB_SEARCH_PREREQUISITE)
            .filter(|key| !key.trim().is_empty())?;
        let endpoint = source
            .lookup(WEB_SEARCH_ENDPOINT_KEY)
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_WEB_SEARCH_ENDPOINT.to_string());
        Some(Self { api_key, endpoint })
    }
}

// api_key 不出现在日志里
impl std::fmt::Debug for WebSearchSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSearchSettings")
            .field("api_key", &"***")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// 已解析的能力
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    WebSearch(WebSearchSettings),
    Clock,
}

impl Capability {
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Capability::WebSearch(_) => CapabilityKind::WebSearch,
            Capability::Clock => CapabilityKind::Clock,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    capabilities: Vec<Capability>,
}

impl CapabilitySet {
    /// 按请求顺序解析能力：前置配置存在才挂载，缺失时静默降级
    pub fn resolve(requested: &[CapabilityKind], source: &dyn PrerequisiteSource) -> Self {
        let mut capabilities = Vec::new();

        for kind in requested {
            if capabilities.iter().any(|c: &Capability| c.kind() == *kind) {
                continue;
            }
            match kind {
                CapabilityKind::WebSearch => {
                    match WebSearchSettings::from_source(source) {
                        Some(settings) => capabilities.push(Capability::WebSearch(settings)),
                        None => {
                            tracing::warn!(
                                "⚠️ 未配置 {}，Agent 将在没有网络搜索能力的情况下运行",
                                WEB_SEARCH_PREREQUISITE
                            );
                        }
                    }
                }
                CapabilityKind::Clock => capabilities.push(Capability::Clock),
            }
        }

        Self { capabilities }
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn contains(&self, kind: CapabilityKind) -> bool {
        self.capabilities.iter().any(|c| c.kind() == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.capabilities.iter()
    }

    pub fn kinds(&self) -> Vec<CapabilityKind> {
        self.capabilities.iter().map(Capability::kind).collect()
    }
}
