use std::fmt::Display;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ConstructionError;
use crate::generator::agent::AgentDefinition;

/// 任务标识，在同一个任务图内唯一
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// 任务定义：绑定一个Agent，声明所需的上游任务输出
#[derive(Debug, Clone)]
pub struct TaskDefinition {
    id: TaskId,
    description: String,
    expected_output: String,
    agent: Arc<AgentDefinition>,
    /// 上游依赖，顺序即上下文拼接顺序
    context: Vec<TaskId>,
}

impl TaskDefinition {
    pub fn new(
        id: impl Into<TaskId>,
        agent: Arc<AgentDefinition>,
        description: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Result<Self, ConstructionError> {
        let id = id.into();
        let description = description.into();
        let expected_output = expected_output.into();

        let owner = format!("task `{}`", id);
        if id.as_str().trim().is_empty() {
            return Err(ConstructionError::EmptyField {
                owner,
                field: "id",
            });
        }
        if description.trim().is_empty() {
            return Err(ConstructionError::EmptyField {
                owner,
                field: "description",
            });
        }
        if expected_output.trim().is_empty() {
            return Err(ConstructionError::EmptyField {
                owner,
                field: "expected_output",
            });
        }

        Ok(Self {
            id,
            description,
            expected_output,
            agent,
            context: Vec::new(),
        })
    }

    /// 声明上游依赖
    pub fn with_context<I, T>(mut self, upstream: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TaskId>,
    {
        self.context = upstream.into_iter().map(Into::into).collect();
        self
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }

    pub fn agent(&self) -> &AgentDefinition {
        &self.agent
    }

    pub fn context(&self) -> &[TaskId] {
        &self.context
    }
}
