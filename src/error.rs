use std::time::Duration;

use thiserror::Error;

use crate::generator::task::TaskId;

/// Agent / Task 构建期错误，在任何任务执行之前抛出
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstructionError {
    #[error("{owner} 的字段 `{field}` 不能为空")]
    EmptyField { owner: String, field: &'static str },

    #[error("模型标识不能为空")]
    EmptyModel,

    #[error("温度参数 {0} 超出有效范围 [0.0, 2.0]")]
    InvalidTemperature(f64),

    #[error("token 预算必须大于 0")]
    InvalidTokenBudget,

    #[error("{owner} 的模板引用了未绑定的占位符 `{{{placeholder}}}`")]
    UnboundPlaceholder { owner: String, placeholder: String },
}

/// 任务依赖图校验错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("任务图为空")]
    Empty,

    #[error("任务 `{0}` 重复声明")]
    DuplicateTask(TaskId),

    #[error("任务 `{task}` 依赖的上游任务 `{missing}` 不在任务图中")]
    UnresolvedDependency { task: TaskId, missing: TaskId },

    #[error("检测到循环依赖: {}", format_cycle(.cycle))]
    CycleDetected { cycle: Vec<TaskId> },
}

fn format_cycle(cycle: &[TaskId]) -> String {
    cycle
        .iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// 单次模型调用失败
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvocationError {
    #[error("调用超时 ({0:?})")]
    Timeout(Duration),

    #[error("模型返回内容无法使用: {0}")]
    MalformedResponse(String),

    #[error("鉴权失败: {0}")]
    AuthFailure(String),

    #[error("配额或速率限制: {0}")]
    QuotaExceeded(String),

    #[error("模型服务错误: {0}")]
    Provider(String),
}

impl InvocationError {
    /// 是否值得由调用方（LLM客户端）重试
    pub fn is_retryable(&self) -> bool {
        !matches!(self, InvocationError::AuthFailure(_))
    }
}

/// Pipeline 运行期对外暴露的错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("研究主题不能为空")]
    EmptyTopic,

    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("任务 `{task}` 执行失败: {source}")]
    Invocation {
        task: TaskId,
        #[source]
        source: InvocationError,
    },

    #[error("任务 `{task}` 执行期间运行被取消")]
    Cancelled { task: TaskId },

    #[error("任务 `{0}` 的输出已记录，不允许覆盖")]
    OutputAlreadyRecorded(TaskId),
}

impl PipelineError {
    /// 出错任务（仅执行期错误携带）
    pub fn failed_task(&self) -> Option<&TaskId> {
        match self {
            PipelineError::Invocation { task, .. } | PipelineError::Cancelled { task } => {
                Some(task)
            }
            PipelineError::OutputAlreadyRecorded(task) => Some(task),
            _ => None,
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            PipelineError::Invocation {
                source: InvocationError::AuthFailure(_),
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
