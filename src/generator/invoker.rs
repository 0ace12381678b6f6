use async_trait::async_trait;

use crate::error::InvocationError;
use crate::generator::agent::AgentDefinition;
use crate::generator::capability::CapabilitySet;
use crate::generator::task::{TaskDefinition, TaskId};

/// 一次模型调用所需的全部输入
#[derive(Debug, Clone, Copy)]
pub struct InvocationRequest<'a> {
    pub task_id: &'a TaskId,
    pub agent: &'a AgentDefinition,
    pub description: &'a str,
    pub expected_output: &'a str,
    /// 已拼接好的上游输出，无依赖时为空串
    pub context: &'a str,
    pub capabilities: &'a CapabilitySet,
}

impl<'a> InvocationRequest<'a> {
    pub fn for_task(task: &'a TaskDefinition, context: &'a str) -> Self {
        Self {
            task_id: task.id(),
            agent: task.agent(),
            description: task.description(),
            expected_output: task.expected_output(),
            context,
            capabilities: task.agent().capabilities(),
        }
    }
}

/// 模型调用协作方，重试策略由实现自行负责
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn invoke(&self, request: &InvocationRequest<'_>) -> Result<String, InvocationError>;
}

/// 离线调用器：不访问模型，按输入确定性地生成输出
///
/// 用于 `--dry-run` 与测试，输出里带上上游上下文，便于检查依赖传递。
#[derive(Debug, Clone, Default)]
pub struct EchoInvoker;

#[async_trait]
impl Invoker for EchoInvoker {
    async fn invoke(&self, request: &InvocationRequest<'_>) -> Result<String, InvocationError> {
        let mut out = format!(
            "[{}] {}\nExpected: {}",
            request.agent.role(),
            request.description.lines().next().unwrap_or_default().trim(),
            request.expected_output
        );
        if !request.capabilities.is_empty() {
            let tools: Vec<String> = request
                .capabilities
                .kinds()
                .iter()
                .map(|k| k.to_string())
                .collect();
            out.push_str(&format!("\nTools: {}", tools.join(", ")));
        }
        if !request.context.is_empty() {
            out.push_str("\nContext:\n");
            out.push_str(request.context);
        }
        Ok(out)
    }
}
