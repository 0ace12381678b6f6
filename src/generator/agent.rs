use std::sync::Arc;

use serde::Serialize;

use crate::config::LLMConfig;
use crate::error::ConstructionError;
use crate::generator::capability::{CapabilityKind, CapabilitySet, PrerequisiteSource};

/// 模型调用配置，同一次运行内的Agent共享
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSettings {
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl ModelSettings {
    pub fn new(
        model: impl Into<String>,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<Self, ConstructionError> {
        let settings = Self {
            model: model.into(),
            temperature,
            max_tokens,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_llm_config(config: &LLMConfig) -> Result<Self, ConstructionError> {
        Self::new(config.model.clone(), config.temperature, config.max_tokens)
    }

    pub fn validate(&self) -> Result<(), ConstructionError> {
        if self.model.trim().is_empty() {
            return Err(ConstructionError::EmptyModel);
        }
        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConstructionError::InvalidTemperature(self.temperature));
        }
        if self.max_tokens == 0 {
            return Err(ConstructionError::InvalidTokenBudget);
        }
        Ok(())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

/// Agent定义 - 构建后不可变
#[derive(Debug, Clone)]
pub struct AgentDefinition {
    role: String,
    goal: String,
    backstory: String,
    capabilities: CapabilitySet,
    model: Arc<ModelSettings>,
}

impl AgentDefinition {
    pub fn builder(role: impl Into<String>) -> AgentBuilder {
        AgentBuilder {
            role: role.into(),
            goal: String::new(),
            backstory: String::new(),
            requested: Vec::new(),
        }
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn backstory(&self) -> &str {
        &self.backstory
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn model(&self) -> &ModelSettings {
        &self.model
    }
}

pub struct AgentBuilder {
    role: String,
    goal: String,
    backstory: String,
    requested: Vec<CapabilityKind>,
}

impl AgentBuilder {
    pub fn goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    pub fn backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = backstory.into();
        self
    }

    /// 申请一项能力，是否真正挂载取决于构建时的前置配置
    pub fn capability(mut self, kind: CapabilityKind) -> Self {
        self.requested.push(kind);
        self
    }

    pub fn build(
        self,
        model: Arc<ModelSettings>,
        prerequisites: &dyn PrerequisiteSource,
    ) -> Result<AgentDefinition, ConstructionError> {
        model.validate()?;

        let owner = format!("agent `{}`", self.role);
        if self.role.trim().is_empty() {
            return Err(ConstructionError::EmptyField {
                owner,
                field: "role",
            });
        }
        if self.goal.trim().is_empty() {
            return Err(ConstructionError::EmptyField {
                owner,
                field: "goal",
            });
        }

        let capabilities = CapabilitySet::resolve(&self.requested, prerequisites);
        tracing::debug!(
            agent = %self.role,
            capabilities = ?capabilities.kinds(),
            "Agent 构建完成"
        );

        Ok(AgentDefinition {
            role: self.role,
            goal: self.goal,
            backstory: self.backstory,
            capabilities,
            model,
        })
    }
}
