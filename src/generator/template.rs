//! `{placeholder}` 模板渲染，用于把本次运行的主题绑定到Agent目标与任务描述中

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::ConstructionError;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_][a-z0-9_]*)\}").expect("valid placeholder regex"));

/// 模板输入参数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateInputs {
    values: BTreeMap<String, String>,
}

impl TemplateInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topic(topic: &str) -> Self {
        Self::new().with("topic", topic)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// 渲染模板，遇到未绑定的占位符直接失败
    pub fn render(&self, owner: &str, template: &str) -> Result<String, ConstructionError> {
        if let Some(missing) = PLACEHOLDER
            .captures_iter(template)
            .map(|caps| caps[1].to_string())
            .find(|name| !self.values.contains_key(name))
        {
            return Err(ConstructionError::UnboundPlaceholder {
                owner: owner.to_string(),
                placeholder: missing,
            });
        }

        let rendered = PLACEHOLDER.replace_all(template, |caps: &Captures| {
            self.values
                .get(&caps[1])
                .cloned()
                .unwrap_or_default()
        });
        Ok(rendered.into_owned())
    }
}
